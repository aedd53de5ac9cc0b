//! Display rendering

use crate::error::Result;
use crate::reveal::ActivationRegion;
use crate::style::{style_at, Span, Style};
use crate::terminal::Terminal;
use crate::view::{self, AnswerView, VisualLine};

/// Title shown on the top line
pub const TITLE: &str = "Purchase Manual Navigator";

const RESET_LABEL: &str = "[ Reset ]";

/// Width of the selector label column
const LABEL_WIDTH: usize = 14;

/// Screen geometry for a terminal size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub cols: u16,
    /// First selector row; the other two follow
    pub selector_top: u16,
    pub reset_row: u16,
    pub answer_label_row: u16,
    pub answer_top: u16,
    pub answer_height: u16,
    pub message_row: u16,
}

impl Layout {
    pub fn new(cols: u16, rows: u16) -> Self {
        let selector_top = 2;
        let reset_row = selector_top + 3;
        let answer_label_row = reset_row + 2;
        let answer_top = answer_label_row + 1;
        let message_row = rows.saturating_sub(1).max(answer_top);
        Self {
            cols,
            selector_top,
            reset_row,
            answer_label_row,
            answer_top,
            answer_height: message_row.saturating_sub(answer_top),
            message_row,
        }
    }

    /// Which selector (0..3) a screen row belongs to
    pub fn selector_at(&self, row: u16) -> Option<usize> {
        if row >= self.selector_top && row < self.selector_top + 3 {
            Some((row - self.selector_top) as usize)
        } else {
            None
        }
    }

    /// Whether a cell is on the reset control
    pub fn is_reset(&self, row: u16, col: u16) -> bool {
        let start = LABEL_WIDTH as u16;
        row == self.reset_row && col >= start && col < start + RESET_LABEL.len() as u16
    }

    /// Row within the answer area for a screen row
    pub fn answer_row(&self, row: u16) -> Option<usize> {
        if row >= self.answer_top && row < self.answer_top + self.answer_height {
            Some((row - self.answer_top) as usize)
        } else {
            None
        }
    }
}

/// What one selector row shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorLine {
    pub label: &'static str,
    /// Committed value
    pub value: Option<String>,
    /// Option being browsed
    pub candidate: Option<String>,
    /// Position of the browsed or committed option
    pub index: Option<usize>,
    /// Number of options
    pub total: usize,
    pub focused: bool,
}

/// Display state
pub struct Display {
    /// Whether anything on screen is stale
    needs_redraw: bool,
    /// Whether the screen must be cleared before the next render
    needs_clear: bool,
    /// Message to show in the message line (bottom)
    message: Option<String>,
    /// Wrapped answer lines from the last render
    lines: Vec<VisualLine>,
    /// First answer line shown by the last render
    top: usize,
}

impl Display {
    pub fn new() -> Self {
        Self {
            needs_redraw: true,
            needs_clear: true,
            message: None,
            lines: Vec::new(),
            top: 0,
        }
    }

    /// Clear and repaint the whole screen on the next render
    pub fn force_redraw(&mut self) {
        self.needs_redraw = true;
        self.needs_clear = true;
    }

    /// Repaint on the next render; every row is rewritten in place
    pub fn invalidate(&mut self) {
        self.needs_redraw = true;
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Set a message to display
    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.needs_redraw = true;
    }

    /// Clear the message
    pub fn clear_message(&mut self) {
        if self.message.take().is_some() {
            self.needs_redraw = true;
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Wrap the answer for the current width and work out the visible window
    pub fn relayout(&mut self, layout: &Layout, answer: &mut AnswerView) {
        let chars: Vec<char> = answer.text().chars().collect();
        self.lines = view::wrap(&chars, layout.cols as usize);
        self.top = answer.visible_top(self.lines.len(), layout.answer_height as usize);
    }

    /// Number of wrapped answer lines from the last layout
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Char offset of the answer text under a screen cell
    pub fn answer_offset_at(&self, layout: &Layout, answer: &AnswerView, row: u16, col: u16) -> Option<usize> {
        let line = *self.lines.get(self.top + layout.answer_row(row)?)?;
        let chars: Vec<char> = answer.text().chars().collect();
        if line.end > chars.len() {
            return None;
        }
        view::offset_at_column(&chars, line, col as usize)
    }

    /// Render the whole screen
    pub fn render(
        &mut self,
        terminal: &mut Terminal,
        selectors: &[SelectorLine],
        answer: &mut AnswerView,
        hover: Option<&ActivationRegion>,
    ) -> Result<()> {
        let layout = Layout::new(terminal.cols(), terminal.rows());
        let cols = layout.cols as usize;

        if self.needs_clear {
            terminal.clear_screen()?;
        }

        // Title bar
        terminal.move_cursor(0, 0)?;
        terminal.apply_style(&Style::title())?;
        terminal.write_str(&pad_to_width(&format!(" {}", TITLE), cols))?;
        terminal.reset_attributes()?;

        for (i, selector) in selectors.iter().enumerate() {
            self.render_selector(terminal, layout.selector_top + i as u16, cols, selector)?;
        }

        terminal.move_cursor(layout.reset_row, LABEL_WIDTH as u16)?;
        terminal.apply_style(&Style::focused())?;
        terminal.write_str(RESET_LABEL)?;
        terminal.reset_attributes()?;

        terminal.move_cursor(layout.answer_label_row, 0)?;
        terminal.apply_style(&Style::label())?;
        terminal.write_str("Answer")?;
        terminal.reset_attributes()?;

        self.relayout(&layout, answer);
        self.render_answer(terminal, &layout, answer, hover)?;
        self.render_message(terminal, layout.message_row, cols)?;

        terminal.flush()?;
        self.needs_redraw = false;
        self.needs_clear = false;
        Ok(())
    }

    fn render_selector(
        &self,
        terminal: &mut Terminal,
        row: u16,
        cols: usize,
        selector: &SelectorLine,
    ) -> Result<()> {
        terminal.move_cursor(row, 0)?;

        let marker = if selector.focused { '>' } else { ' ' };
        let label = format!("{} {:<width$}", marker, format!("{}:", selector.label), width = LABEL_WIDTH - 2);
        terminal.apply_style(&Style::label())?;
        terminal.write_str(&truncate_to_width(&label, cols))?;
        terminal.reset_attributes()?;

        let remaining = cols.saturating_sub(LABEL_WIDTH);
        let shown = selector.candidate.as_deref().or(selector.value.as_deref());
        let text = match (shown, selector.index) {
            (Some(value), Some(idx)) => format!("< {} >  ({}/{})", value, idx + 1, selector.total),
            (Some(value), None) => value.to_string(),
            (None, _) if selector.total > 0 => format!("-- {} options --", selector.total),
            _ => "--".to_string(),
        };

        let style = if selector.candidate.is_some() && selector.candidate != selector.value {
            Style::browsing()
        } else if selector.focused {
            Style::focused()
        } else {
            Style::plain()
        };
        terminal.apply_style(&style)?;
        terminal.write_str(&truncate_to_width(&text, remaining))?;
        terminal.reset_attributes()?;
        terminal.clear_to_eol()?;
        Ok(())
    }

    fn render_answer(
        &self,
        terminal: &mut Terminal,
        layout: &Layout,
        answer: &AnswerView,
        hover: Option<&ActivationRegion>,
    ) -> Result<()> {
        let chars: Vec<char> = answer.text().chars().collect();
        let spans: Vec<Span> = answer
            .regions()
            .iter()
            .map(|r| {
                let style = if hover == Some(r) {
                    Style::link_hover()
                } else {
                    Style::link()
                };
                Span::new(r.start, r.end, style)
            })
            .collect();

        for row in 0..layout.answer_height {
            terminal.move_cursor(layout.answer_top + row, 0)?;
            if let Some(line) = self.lines.get(self.top + row as usize) {
                self.render_line(terminal, &chars, *line, &spans)?;
            }
            terminal.clear_to_eol()?;
        }
        Ok(())
    }

    /// Render one wrapped line, switching style at span boundaries
    fn render_line(&self, terminal: &mut Terminal, chars: &[char], line: VisualLine, spans: &[Span]) -> Result<()> {
        let end = line.end.min(chars.len());
        let mut run = String::new();
        let mut run_style = Style::plain();

        for offset in line.start..end {
            let style = style_at(spans, offset);
            if style != run_style && !run.is_empty() {
                terminal.apply_style(&run_style)?;
                terminal.write_str(&run)?;
                run.clear();
            }
            run_style = style;
            run.push(chars[offset]);
        }
        if !run.is_empty() {
            terminal.apply_style(&run_style)?;
            terminal.write_str(&run)?;
        }
        terminal.reset_attributes()?;
        Ok(())
    }

    /// Render the message line
    fn render_message(&self, terminal: &mut Terminal, row: u16, cols: usize) -> Result<()> {
        terminal.move_cursor(row, 0)?;

        if let Some(ref msg) = self.message {
            terminal.write_str(&truncate_to_width(msg, cols))?;
        }

        terminal.clear_to_eol()?;
        Ok(())
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncate a string to fit within a display width
fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut width = 0;

    for ch in s.chars() {
        let ch_width = view::char_width(ch);
        if width + ch_width > max_width {
            break;
        }
        result.push(ch);
        width += ch_width;
    }

    result
}

/// Truncate or pad with spaces to exactly `width` columns
fn pad_to_width(s: &str, width: usize) -> String {
    let mut result = truncate_to_width(s, width);
    let used: usize = result.chars().map(view::char_width).sum();
    result.push_str(&" ".repeat(width.saturating_sub(used)));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reveal::RevealUpdate;
    use crate::terminal::tests::capture_terminal;

    /// ESC [ 2 J, as queued by `Terminal::clear_screen`
    const CLEAR_ALL: &str = "\x1b[2J";

    fn answer_with_link(text: &str, start: usize, end: usize) -> AnswerView {
        let mut answer = AnswerView::new();
        answer.attach(1);
        let chars: Vec<char> = text.chars().collect();
        let piece = |a: usize, b: usize| chars[a..b].iter().collect::<String>();
        answer.apply(RevealUpdate::Append {
            session: 1,
            text: piece(0, start),
            region: None,
        });
        answer.apply(RevealUpdate::Append {
            session: 1,
            text: piece(start, end),
            region: Some(ActivationRegion {
                start,
                end,
                keyword: piece(start, end),
            }),
        });
        answer.apply(RevealUpdate::Append {
            session: 1,
            text: piece(end, chars.len()),
            region: None,
        });
        answer
    }

    #[test]
    fn test_text_after_link_is_plain() {
        let (mut term, out) = capture_terminal(80, 24);
        let chars: Vec<char> = "See Annexure-4.".chars().collect();
        let spans = vec![Span::new(4, 14, Style::link())];
        let line = VisualLine { start: 0, end: chars.len() };

        Display::new().render_line(&mut term, &chars, line, &spans).unwrap();

        let output = out.text();
        assert!(
            output.contains("Annexure-4\x1b[0m."),
            "link attributes leak past the link: {:?}",
            output
        );
        assert!(output.contains("\x1b[0mSee "));
    }

    #[test]
    fn test_invalidate_repaints_without_clearing() {
        let (mut term, out) = capture_terminal(80, 24);
        let mut answer = answer_with_link("See Annexure-4 for details.", 4, 14);
        let mut display = Display::new();

        display.render(&mut term, &[], &mut answer, None).unwrap();
        assert!(out.text().contains(CLEAR_ALL));

        out.clear();
        let hover = answer.regions()[0].clone();
        display.invalidate();
        assert!(display.needs_redraw());
        display.render(&mut term, &[], &mut answer, Some(&hover)).unwrap();
        assert!(!out.text().contains(CLEAR_ALL));
        assert!(out.text().contains("Annexure-4"));

        out.clear();
        display.force_redraw();
        display.render(&mut term, &[], &mut answer, None).unwrap();
        assert!(out.text().contains(CLEAR_ALL));
    }

    #[test]
    fn test_layout_regions() {
        let layout = Layout::new(80, 24);
        assert_eq!(layout.selector_at(2), Some(0));
        assert_eq!(layout.selector_at(4), Some(2));
        assert_eq!(layout.selector_at(5), None);
        assert!(layout.is_reset(layout.reset_row, LABEL_WIDTH as u16));
        assert!(!layout.is_reset(layout.reset_row, 0));
        assert_eq!(layout.message_row, 23);
        assert_eq!(layout.answer_row(layout.answer_top), Some(0));
        assert_eq!(layout.answer_row(layout.message_row), None);
    }

    #[test]
    fn test_tiny_terminal_layout() {
        let layout = Layout::new(10, 3);
        assert_eq!(layout.answer_height, 0);
        assert_eq!(layout.answer_row(layout.answer_top), None);
    }

    #[test]
    fn test_answer_hit_testing() {
        let mut answer = AnswerView::new();
        answer.attach(1);
        answer.apply(RevealUpdate::Append {
            session: 1,
            text: "See ".to_string(),
            region: None,
        });
        answer.apply(RevealUpdate::Append {
            session: 1,
            text: "Annexure-4".to_string(),
            region: Some(ActivationRegion {
                start: 4,
                end: 14,
                keyword: "Annexure-4".to_string(),
            }),
        });

        let layout = Layout::new(80, 24);
        let mut display = Display::new();
        display.relayout(&layout, &mut answer);

        let row = layout.answer_top;
        assert_eq!(display.answer_offset_at(&layout, &answer, row, 0), Some(0));
        let offset = display.answer_offset_at(&layout, &answer, row, 6).unwrap();
        assert_eq!(answer.region_at(offset).map(|r| r.keyword.as_str()), Some("Annexure-4"));
        assert_eq!(display.answer_offset_at(&layout, &answer, row, 20), None);
        assert_eq!(display.answer_offset_at(&layout, &answer, row + 1, 0), None);
    }

    #[test]
    fn test_truncate_and_pad() {
        assert_eq!(truncate_to_width("hello", 3), "hel");
        assert_eq!(truncate_to_width("漢字", 3), "漢");
        assert_eq!(pad_to_width("ab", 4), "ab  ");
    }

    #[test]
    fn test_message() {
        let mut display = Display::new();
        display.set_message("Cannot open 'Annexure-4': missing");
        assert_eq!(display.message(), Some("Cannot open 'Annexure-4': missing"));
        display.clear_message();
        assert_eq!(display.message(), None);
    }
}
