//! navigator - browse a chapter/sub-chapter/question manual in the terminal
//!
//! Answers are typed out a character at a time; annexure references in
//! them become links that open the referenced document.

mod activation;
mod app;
mod config;
mod display;
mod error;
mod input;
mod links;
mod reveal;
mod scanner;
mod selection;
mod store;
mod style;
mod terminal;
mod view;

use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use activation::{ActivationHandler, SystemOpener};
use app::{App, Controller};
use config::Config;
use error::{NavigatorError, Result};
use selection::Selection;
use store::DataStore;
use terminal::Terminal;

/// Parsed command line
#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    data: Option<PathBuf>,
    help: bool,
    version: bool,
}

fn main() {
    if let Err(e) = run() {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    if args.help {
        print_usage();
        return Ok(());
    }
    if args.version {
        print_version();
        return Ok(());
    }

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(data) = args.data {
        config.data_path = data;
    }
    init_logging(&config)?;

    let links = Arc::new(config.link_dictionary()?);
    let store = Arc::new(DataStore::load(&config.data_path)?);
    if store.is_empty() {
        log::warn!("{} contains no chapters", config.data_path.display());
    }
    log::info!(
        "loaded {} with {} link keywords",
        config.data_path.display(),
        links.len()
    );

    let selection = Selection::new(store, links.clone(), config.tick);
    let activation = ActivationHandler::new(links, config.resource_dir.clone(), Box::new(SystemOpener));

    // Terminal last so load errors print on a normal screen
    let terminal = Terminal::new()?;
    let mut app = App::new(terminal, Controller::new(selection, activation));
    app.run()
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => parsed.help = true,
            "--version" | "-V" => parsed.version = true,
            "--config" | "-c" => parsed.config = Some(PathBuf::from(value_for(&arg, args.next())?)),
            "--data" | "-d" => parsed.data = Some(PathBuf::from(value_for(&arg, args.next())?)),
            s if s.starts_with('-') => {
                return Err(NavigatorError::Message(format!("Unknown option: {}", s)));
            }
            _ if parsed.data.is_none() => parsed.data = Some(PathBuf::from(&arg)),
            _ => {
                return Err(NavigatorError::Message(format!("Unexpected argument: {}", arg)));
            }
        }
    }

    Ok(parsed)
}

fn value_for(flag: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| NavigatorError::Message(format!("{} needs a value", flag)))
}

/// Send log output to the configured file
///
/// The screen belongs to the navigator, so without a log file nothing is
/// logged unless RUST_LOG asks for it.
fn init_logging(config: &Config) -> Result<()> {
    let env = env_logger::Env::default().default_filter_or(config.log_level.as_str());

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            env_logger::Builder::from_env(env)
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        None if env::var_os("RUST_LOG").is_some() => env_logger::Builder::from_env(env).init(),
        None => {}
    }
    Ok(())
}

fn print_usage() {
    println!("navigator {} - purchase manual navigator", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: navigator [OPTIONS] [DATA]");
    println!();
    println!("Options:");
    println!("  -h, --help           Show this help message");
    println!("  -V, --version        Show version information");
    println!("  -c, --config PATH    Read configuration from PATH");
    println!("  -d, --data PATH      Question data file (default questions.json)");
    println!();
    println!("Keys:");
    println!("  Tab, S-Tab           Next / previous selector");
    println!("  Up, Down             Browse the focused selector");
    println!("  Enter, Space         Choose");
    println!("  PageUp, PageDown     Scroll the answer");
    println!("  C-r, F5              Reset");
    println!("  C-l                  Redraw screen");
    println!("  Esc, q, C-c          Quit");
    println!();
    println!("Click a highlighted annexure reference to open it.");
}

fn print_version() {
    println!("navigator {}", env!("CARGO_PKG_VERSION"));
}
