//! Configuration file support
//!
//! Loads settings from ~/.navigator.toml (or %USERPROFILE%\.navigator.toml
//! on Windows), or from the path given with `--config`.
//!
//! Example:
//! ```text
//! # navigator configuration
//! data = "questions.json"
//! resources = "annexures"
//! tick-ms = 3
//! log-file = "navigator.log"
//! log-level = "info"
//!
//! [links]
//! "Annexure-4" = "Annexure 4.pdf"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{NavigatorError, Result};
use crate::links::{LinkDictionary, LinkEntry};

/// Longest allowed delay between revealed runs
const MAX_TICK_MS: u64 = 1000;

/// File layout; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ConfigFile {
    data: Option<PathBuf>,
    resources: Option<PathBuf>,
    tick_ms: Option<u64>,
    log_file: Option<PathBuf>,
    log_level: Option<String>,
    links: Option<BTreeMap<String, String>>,
}

/// Configuration settings
#[derive(Debug, Clone)]
pub struct Config {
    /// Question store (JSON)
    pub data_path: PathBuf,
    /// Directory link resources are resolved against
    pub resource_dir: PathBuf,
    /// Delay between revealed runs
    pub tick: Duration,
    /// Where log output goes; logging is off without it unless RUST_LOG is set
    pub log_file: Option<PathBuf>,
    /// Default log filter
    pub log_level: String,
    /// Link table from the config file; None means the built-in table
    pub links: Option<Vec<LinkEntry>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("questions.json"),
            resource_dir: PathBuf::from("."),
            tick: Duration::from_millis(3),
            log_file: None,
            log_level: "info".to_string(),
            links: None,
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            std::env::var("USERPROFILE")
                .ok()
                .map(|home| PathBuf::from(home).join(".navigator.toml"))
        }

        #[cfg(not(windows))]
        {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".navigator.toml"))
        }
    }

    /// Load configuration
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_file(path),
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::load_file(&path),
                _ => Ok(Config::default()),
            },
        }
    }

    /// Load and parse one config file
    pub fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| NavigatorError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&contents).map_err(|reason| NavigatorError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse config file contents over the defaults
    fn parse(contents: &str) -> std::result::Result<Self, String> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| e.message().to_string())?;
        let mut config = Config::default();
        config.apply(file);
        Ok(config)
    }

    /// Apply settings from a parsed file
    fn apply(&mut self, file: ConfigFile) {
        if let Some(data) = file.data {
            self.data_path = data;
        }
        if let Some(dir) = file.resources {
            self.resource_dir = dir;
        }
        if let Some(ms) = file.tick_ms {
            self.tick = Duration::from_millis(ms.min(MAX_TICK_MS));
        }
        if file.log_file.is_some() {
            self.log_file = file.log_file;
        }
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
        if let Some(links) = file.links {
            self.links = Some(
                links
                    .into_iter()
                    .map(|(keyword, resource)| LinkEntry::new(keyword, resource))
                    .collect(),
            );
        }
    }

    /// Build the link dictionary this config describes
    pub fn link_dictionary(&self) -> Result<LinkDictionary> {
        match &self.links {
            Some(entries) => LinkDictionary::new(entries.clone()),
            None => Ok(LinkDictionary::builtin()),
        }
    }
}
