//! Terminal session on top of crossterm
//!
//! Creating a `Terminal` switches to raw mode on the alternate screen with
//! mouse capture; dropping it puts everything back. Drawing calls are
//! queued and only reach the screen on `flush`.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute, queue,
    style::{Attribute, Color as TermColor, Print, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, ClearType},
};

use crate::error::Result;
use crate::style::{Color, Style};

pub struct Terminal {
    out: Box<dyn Write>,
    cols: u16,
    rows: u16,
    /// Whether raw mode and the alternate screen need restoring on drop
    raw: bool,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(out, terminal::EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;
        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out: Box::new(out),
            cols,
            rows,
            raw: true,
        })
    }

    /// Draw into `out` with a fixed size, leaving the real terminal alone
    #[cfg(test)]
    pub fn with_writer(out: Box<dyn Write>, cols: u16, rows: u16) -> Self {
        Self {
            out,
            cols,
            rows,
            raw: false,
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn clear_screen(&mut self) -> Result<()> {
        queue!(self.out, terminal::Clear(ClearType::All))?;
        Ok(())
    }

    /// Blank the rest of the current row
    pub fn clear_to_eol(&mut self) -> Result<()> {
        queue!(self.out, terminal::Clear(ClearType::UntilNewLine))?;
        Ok(())
    }

    /// Move to a 0-based screen cell
    pub fn move_cursor(&mut self, row: u16, col: u16) -> Result<()> {
        queue!(self.out, cursor::MoveTo(col, row))?;
        Ok(())
    }

    pub fn write_str(&mut self, s: &str) -> Result<()> {
        queue!(self.out, Print(s))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Wait up to `timeout` for an input event
    ///
    /// A resize updates `cols`/`rows` before the event is handed back.
    pub fn poll_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        let ev = event::read()?;
        if let Event::Resize(cols, rows) = ev {
            self.cols = cols;
            self.rows = rows;
        }
        Ok(Some(ev))
    }

    /// Replace the current attributes with `style`
    pub fn apply_style(&mut self, style: &Style) -> Result<()> {
        queue!(self.out, SetAttribute(Attribute::Reset))?;
        if let Some(fg) = term_color(style.fg) {
            queue!(self.out, SetForegroundColor(fg))?;
        }
        if let Some(bg) = term_color(style.bg) {
            queue!(self.out, SetBackgroundColor(bg))?;
        }

        let attributes = [
            (style.bold, Attribute::Bold),
            (style.underline, Attribute::Underlined),
            (style.reverse, Attribute::Reverse),
            (style.dim, Attribute::Dim),
        ];
        for (_, attribute) in attributes.iter().filter(|(on, _)| *on) {
            queue!(self.out, SetAttribute(*attribute))?;
        }
        Ok(())
    }

    pub fn reset_attributes(&mut self) -> Result<()> {
        queue!(self.out, SetAttribute(Attribute::Reset))?;
        Ok(())
    }
}

/// Crossterm color, or None to leave the terminal default
fn term_color(color: Color) -> Option<TermColor> {
    match color {
        Color::Default => None,
        Color::Blue => Some(TermColor::DarkBlue),
        Color::BrightBlue => Some(TermColor::Blue),
        Color::BrightWhite => Some(TermColor::White),
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if !self.raw {
            return;
        }
        let _ = execute!(
            self.out,
            SetAttribute(Attribute::Reset),
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Writer whose bytes stay readable after the terminal owns it
    #[derive(Clone, Default)]
    pub struct Capture(Rc<RefCell<Vec<u8>>>);

    impl Capture {
        pub fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }

        pub fn clear(&self) {
            self.0.borrow_mut().clear();
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    pub fn capture_terminal(cols: u16, rows: u16) -> (Terminal, Capture) {
        let capture = Capture::default();
        (Terminal::with_writer(Box::new(capture.clone()), cols, rows), capture)
    }

    #[test]
    fn test_plain_style_resets_attributes() {
        let (mut term, out) = capture_terminal(80, 24);
        term.apply_style(&Style::link()).unwrap();
        term.write_str("x").unwrap();
        out.clear();
        term.apply_style(&Style::plain()).unwrap();
        assert_eq!(out.text(), "\x1b[0m");
    }
}
