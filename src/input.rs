//! Input handling - translate terminal events into navigator actions

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

/// Lines scrolled per mouse wheel step
const WHEEL_LINES: isize = 3;

/// Something the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Move focus to the next selector
    FocusNext,
    /// Move focus to the previous selector
    FocusPrev,
    /// Show the next candidate in the focused selector
    CycleNext,
    /// Show the previous candidate in the focused selector
    CyclePrev,
    /// Choose the focused selector's candidate
    Commit,
    /// Back to the initial prompt
    Reset,
    /// Scroll the answer area by lines (negative is up)
    Scroll(isize),
    /// Scroll the answer area by pages (negative is up)
    Page(isize),
    /// Left click at a screen cell
    Click { row: u16, col: u16 },
    /// Pointer moved to a screen cell
    Hover { row: u16, col: u16 },
    Help,
    Redraw,
    Quit,
}

/// Translate a crossterm event
///
/// Returns None for events with no meaning here (key releases, focus
/// changes, unbound keys).
pub fn translate(event: Event) -> Option<Action> {
    match event {
        Event::Key(key) => translate_key(key),
        Event::Mouse(mouse) => translate_mouse(mouse),
        Event::Resize(..) => Some(Action::Redraw),
        _ => None,
    }
}

fn translate_key(event: KeyEvent) -> Option<Action> {
    let KeyEvent {
        code, modifiers, kind, ..
    } = event;

    // Only process key press events, ignore release and repeat
    // This is critical on Windows where crossterm sends all event types
    if kind != KeyEventKind::Press {
        return None;
    }

    let ctrl = modifiers.contains(KeyModifiers::CONTROL);

    match code {
        KeyCode::Char('c') | KeyCode::Char('q') if ctrl => Some(Action::Quit),
        KeyCode::Char('r') if ctrl => Some(Action::Reset),
        KeyCode::Char('l') if ctrl => Some(Action::Redraw),
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Esc => Some(Action::Quit),
        KeyCode::Tab => Some(Action::FocusNext),
        KeyCode::BackTab => Some(Action::FocusPrev),
        KeyCode::Up if ctrl => Some(Action::FocusPrev),
        KeyCode::Down if ctrl => Some(Action::FocusNext),
        KeyCode::Up | KeyCode::Left => Some(Action::CyclePrev),
        KeyCode::Down | KeyCode::Right => Some(Action::CycleNext),
        KeyCode::Enter | KeyCode::Char(' ') => Some(Action::Commit),
        KeyCode::PageUp => Some(Action::Page(-1)),
        KeyCode::PageDown => Some(Action::Page(1)),
        KeyCode::F(1) => Some(Action::Help),
        KeyCode::F(5) => Some(Action::Reset),
        _ => None,
    }
}

fn translate_mouse(event: MouseEvent) -> Option<Action> {
    let (row, col) = (event.row, event.column);
    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(Action::Click { row, col }),
        MouseEventKind::Moved | MouseEventKind::Drag(_) => Some(Action::Hover { row, col }),
        MouseEventKind::ScrollUp => Some(Action::Scroll(-WHEEL_LINES)),
        MouseEventKind::ScrollDown => Some(Action::Scroll(WHEEL_LINES)),
        _ => None,
    }
}
