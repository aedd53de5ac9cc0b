//! Answer view - the display buffer the reveal engine writes into
//!
//! Owned by the interactive thread. Reveal workers only produce
//! `RevealUpdate`s; they are applied here, and only the active session's
//! updates are accepted. Updates from a superseded session are dropped.

use unicode_width::UnicodeWidthChar;

use crate::reveal::{ActivationRegion, RevealUpdate, SessionId};

/// Text and link regions shown in the answer area
#[derive(Debug, Default)]
pub struct AnswerView {
    /// Current text
    text: String,
    /// Length of `text` in chars
    char_len: usize,
    /// Regions of revealed links, in reveal order
    regions: Vec<ActivationRegion>,
    /// Session allowed to write, if any
    active: Option<SessionId>,
    /// Set whenever the content changes; cleared by the renderer
    dirty: bool,
    /// First visible wrapped line
    scroll: usize,
    /// Keep the end of the text visible while revealing
    follow: bool,
}

impl AnswerView {
    pub fn new() -> Self {
        Self {
            follow: true,
            ..Default::default()
        }
    }

    /// Replace the content with a prompt or message; no session may write
    pub fn show_message(&mut self, msg: &str) {
        self.active = None;
        self.set_text(msg);
    }

    /// Accept updates from `session` only
    pub fn attach(&mut self, session: SessionId) {
        self.active = Some(session);
    }

    /// Stop accepting updates
    pub fn detach(&mut self) {
        self.active = None;
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.active
    }

    /// Apply one update; returns false if it came from an inactive session
    pub fn apply(&mut self, update: RevealUpdate) -> bool {
        if self.active != Some(update.session()) {
            return false;
        }

        match update {
            RevealUpdate::Clear { .. } => {
                self.set_text("");
            }
            RevealUpdate::Append { text, region, .. } => {
                self.char_len += text.chars().count();
                self.text.push_str(&text);
                if let Some(region) = region {
                    self.regions.push(region);
                }
                self.dirty = true;
            }
            RevealUpdate::Finished { .. } => {}
        }
        true
    }

    fn set_text(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
        self.char_len = text.chars().count();
        self.regions.clear();
        self.scroll = 0;
        self.follow = true;
        self.dirty = true;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn char_len(&self) -> usize {
        self.char_len
    }

    pub fn regions(&self) -> &[ActivationRegion] {
        &self.regions
    }

    /// Region covering a char offset
    pub fn region_at(&self, offset: usize) -> Option<&ActivationRegion> {
        self.regions.iter().find(|r| r.contains(offset))
    }

    /// Take the dirty flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    /// Scroll by `delta` lines, clamped to the wrapped line count
    ///
    /// Scrolling to the bottom resumes following the end of the text.
    pub fn scroll_by(&mut self, delta: isize, total_lines: usize, height: usize) {
        let max = total_lines.saturating_sub(height);
        let current = self.scroll.min(max);
        self.scroll = if delta < 0 {
            current.saturating_sub(delta.unsigned_abs())
        } else {
            (current + delta as usize).min(max)
        };
        self.follow = self.scroll >= max;
        self.dirty = true;
    }

    /// First visible line for a viewport of `height` rows
    pub fn visible_top(&mut self, total_lines: usize, height: usize) -> usize {
        let max = total_lines.saturating_sub(height);
        if self.follow {
            self.scroll = max;
        } else {
            self.scroll = self.scroll.min(max);
        }
        self.scroll
    }
}

/// A wrapped display line, as char offsets into the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualLine {
    pub start: usize,
    /// Exclusive; never includes the newline
    pub end: usize,
}

/// Display width of a char (control chars count as one column)
pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(1)
}

/// Word-wrap `chars` to `width` columns
///
/// Lines break after the last space that fits, or mid-word when a word is
/// wider than the line.
pub fn wrap(chars: &[char], width: usize) -> Vec<VisualLine> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut start = 0;
    let mut col = 0;
    let mut last_space: Option<usize> = None;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch == '\n' {
            lines.push(VisualLine { start, end: i });
            start = i + 1;
            col = 0;
            last_space = None;
            i += 1;
            continue;
        }

        let w = char_width(ch);
        if col + w > width && i > start {
            match last_space {
                Some(sp) if sp >= start => {
                    lines.push(VisualLine { start, end: sp + 1 });
                    start = sp + 1;
                }
                _ => {
                    lines.push(VisualLine { start, end: i });
                    start = i;
                }
            }
            col = chars[start..i].iter().map(|c| char_width(*c)).sum();
            last_space = None;
            // Re-examine chars[i] on the new line
            continue;
        }

        if ch == ' ' {
            last_space = Some(i);
        }
        col += w;
        i += 1;
    }

    lines.push(VisualLine {
        start,
        end: chars.len(),
    });
    lines
}

/// Char offset under a display column of a wrapped line
pub fn offset_at_column(chars: &[char], line: VisualLine, column: usize) -> Option<usize> {
    let mut col = 0;
    for offset in line.start..line.end {
        let w = char_width(chars[offset]);
        if column < col + w {
            return Some(offset);
        }
        col += w;
    }
    None
}
