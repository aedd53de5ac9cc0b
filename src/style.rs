//! Screen styles
//!
//! Every styled thing on screen has a named style here; the renderer asks
//! for a role and `Terminal::apply_style` turns it into attributes.

/// Colors used by the navigator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    /// Terminal default
    #[default]
    Default,
    Blue,
    BrightBlue,
    BrightWhite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: Color,
    pub bg: Color,
    pub bold: bool,
    pub underline: bool,
    pub reverse: bool,
    pub dim: bool,
}

impl Style {
    /// Unstyled text
    pub fn plain() -> Self {
        Self::default()
    }

    /// Title bar across the top line
    pub fn title() -> Self {
        Self {
            fg: Color::BrightWhite,
            bg: Color::Blue,
            bold: true,
            ..Self::default()
        }
    }

    /// Selector labels and the answer heading
    pub fn label() -> Self {
        Self {
            bold: true,
            ..Self::default()
        }
    }

    /// Focused selector and the reset control
    pub fn focused() -> Self {
        Self {
            reverse: true,
            ..Self::default()
        }
    }

    /// An option being browsed but not yet chosen
    pub fn browsing() -> Self {
        Self {
            dim: true,
            ..Self::default()
        }
    }

    /// A revealed link
    pub fn link() -> Self {
        Self {
            fg: Color::Blue,
            underline: true,
            ..Self::default()
        }
    }

    /// The link under the pointer
    pub fn link_hover() -> Self {
        Self {
            fg: Color::BrightBlue,
            reverse: true,
            ..Self::link()
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::plain()
    }
}

/// A styled char range `[start, end)` of the answer text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub style: Style,
}

impl Span {
    pub fn new(start: usize, end: usize, style: Style) -> Self {
        Self { start, end, style }
    }
}

/// Style of the char at `offset`; plain outside every span
pub fn style_at(spans: &[Span], offset: usize) -> Style {
    spans
        .iter()
        .find(|s| (s.start..s.end).contains(&offset))
        .map_or_else(Style::plain, |s| s.style)
}
