//! Navigator state and main loop

use std::time::Duration;

use crate::activation::ActivationHandler;
use crate::display::{Display, Layout, SelectorLine};
use crate::error::{NavigatorError, Result};
use crate::input::{self, Action};
use crate::reveal::ActivationRegion;
use crate::selection::{Selection, SelectionState};
use crate::terminal::Terminal;

/// Event poll timeout while an answer is being revealed
const REVEAL_FRAME: Duration = Duration::from_millis(16);
/// Event poll timeout when idle
const IDLE_FRAME: Duration = Duration::from_millis(250);

const LABELS: [&str; 3] = ["Chapter", "Sub-Chapter", "Question"];

const HELP: &str =
    "Tab: next field  Up/Down: browse  Enter: choose  PgUp/PgDn: scroll  C-r: reset  Esc: quit  Click a link to open it";

/// Everything the interactive thread tracks, independent of the terminal
pub struct Controller {
    pub selection: Selection,
    pub display: Display,
    activation: ActivationHandler,
    /// Focused selector (0 = chapter, 1 = sub-chapter, 2 = question)
    focus: usize,
    /// Option index being browsed in each selector
    candidates: [Option<usize>; 3],
    /// Link under the pointer
    hover: Option<ActivationRegion>,
    /// Whether the hover message is on the message line
    hover_message: bool,
    running: bool,
}

impl Controller {
    pub fn new(selection: Selection, activation: ActivationHandler) -> Self {
        Self {
            selection,
            display: Display::new(),
            activation,
            focus: 0,
            candidates: [None; 3],
            hover: None,
            hover_message: false,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn hover(&self) -> Option<&ActivationRegion> {
        self.hover.as_ref()
    }

    /// Options of a selector given the choices above it
    pub fn options(&self, level: usize) -> Vec<String> {
        let store = self.selection.store();
        let owned = |names: Vec<&str>| names.into_iter().map(str::to_string).collect();
        match level {
            0 => owned(store.list_topics()),
            1 => self
                .selection
                .topic()
                .map(|t| owned(store.list_subtopics(t)))
                .unwrap_or_default(),
            2 => match (self.selection.topic(), self.selection.subtopic()) {
                (Some(t), Some(s)) => owned(store.list_items(t, s)),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Committed value of a selector
    fn value(&self, level: usize) -> Option<&str> {
        match level {
            0 => self.selection.topic(),
            1 => self.selection.subtopic(),
            _ => self.selection.item(),
        }
    }

    /// Rows for the three selectors
    pub fn selector_lines(&self) -> Vec<SelectorLine> {
        (0..3)
            .map(|level| {
                let options = self.options(level);
                let value = self.value(level).map(str::to_string);
                let candidate = self.candidates[level].and_then(|i| options.get(i).cloned());
                let index = self.candidates[level].or_else(|| {
                    value
                        .as_ref()
                        .and_then(|v| options.iter().position(|o| o == v))
                });
                SelectorLine {
                    label: LABELS[level],
                    value,
                    candidate,
                    index,
                    total: options.len(),
                    focused: level == self.focus,
                }
            })
            .collect()
    }

    /// Handle one user action
    ///
    /// Per-interaction errors are shown on the message line and never
    /// returned.
    pub fn handle(&mut self, action: Action, layout: &Layout) {
        if let Err(err) = self.dispatch(action, layout) {
            self.report(&err);
        }
    }

    fn dispatch(&mut self, action: Action, layout: &Layout) -> Result<()> {
        match action {
            Action::Quit => self.running = false,
            Action::Redraw => self.display.force_redraw(),
            Action::Help => self.display.set_message(HELP),
            Action::FocusNext => self.set_focus((self.focus + 1) % 3),
            Action::FocusPrev => self.set_focus((self.focus + 2) % 3),
            Action::CycleNext => self.cycle(1)?,
            Action::CyclePrev => self.cycle(-1)?,
            Action::Commit => self.commit()?,
            Action::Reset => self.reset(),
            Action::Scroll(lines) => self.scroll(lines, layout),
            Action::Page(pages) => {
                let page = (layout.answer_height as isize - 1).max(1);
                self.scroll(pages * page, layout);
            }
            Action::Click { row, col } => self.click(row, col, layout)?,
            Action::Hover { row, col } => self.update_hover(row, col, layout),
        }
        Ok(())
    }

    fn set_focus(&mut self, level: usize) {
        self.focus = level;
        self.display.invalidate();
    }

    /// Browse the focused selector's options
    fn cycle(&mut self, delta: isize) -> Result<()> {
        let options = self.options(self.focus);
        if options.is_empty() {
            return Err(NavigatorError::Message(format!(
                "No {} to choose from",
                LABELS[self.focus].to_lowercase()
            )));
        }

        let len = options.len() as isize;
        let current = self.candidates[self.focus]
            .or_else(|| {
                self.value(self.focus)
                    .and_then(|v| options.iter().position(|o| o == v))
            })
            .map(|i| i as isize);
        let next = match current {
            Some(i) => (i + delta).rem_euclid(len),
            None if delta < 0 => len - 1,
            None => 0,
        };
        self.candidates[self.focus] = Some(next as usize);
        self.display.invalidate();
        Ok(())
    }

    /// Choose the focused selector's candidate
    fn commit(&mut self) -> Result<()> {
        let level = self.focus;
        let options = self.options(level);
        let chosen = match self.candidates[level].and_then(|i| options.get(i)) {
            Some(c) => c.clone(),
            None => match (self.value(level), options.first()) {
                (None, Some(first)) => first.clone(),
                // Choosing the same question again replays its answer
                (Some(current), _) if level == 2 => current.to_string(),
                (Some(_), _) => return Ok(()),
                (None, None) => {
                    return Err(NavigatorError::Message(format!(
                        "No {} to choose from",
                        LABELS[level].to_lowercase()
                    )))
                }
            },
        };

        match level {
            0 => self.selection.choose_topic(&chosen)?,
            1 => self.selection.choose_subtopic(&chosen)?,
            _ => {
                self.selection.choose_item(&chosen)?;
            }
        }

        for candidate in &mut self.candidates[level..] {
            *candidate = None;
        }
        self.hover = None;
        self.display.clear_message();
        // Step the user on to the next selector
        self.focus = (level + 1).min(2);
        self.display.invalidate();
        Ok(())
    }

    fn reset(&mut self) {
        self.selection.reset();
        self.candidates = [None; 3];
        self.focus = 0;
        self.hover = None;
        self.display.clear_message();
        self.display.invalidate();
    }

    fn scroll(&mut self, lines: isize, layout: &Layout) {
        let total = self.display.line_count();
        self.selection
            .view_mut()
            .scroll_by(lines, total, layout.answer_height as usize);
        self.hover = None;
    }

    /// Region of the answer under a screen cell
    fn region_at(&self, row: u16, col: u16, layout: &Layout) -> Option<&ActivationRegion> {
        let view = self.selection.view();
        let offset = self.display.answer_offset_at(layout, view, row, col)?;
        view.region_at(offset)
    }

    fn click(&mut self, row: u16, col: u16, layout: &Layout) -> Result<()> {
        if let Some(level) = layout.selector_at(row) {
            self.set_focus(level);
            return Ok(());
        }
        if layout.is_reset(row, col) {
            self.reset();
            return Ok(());
        }

        let keyword = match self.region_at(row, col, layout) {
            Some(region) => region.keyword.clone(),
            None => return Ok(()),
        };
        let path = self.activation.activate(&keyword)?;
        self.display.set_message(format!("Opening {}", path.display()));
        self.hover_message = false;
        Ok(())
    }

    /// Highlight the link under the pointer
    fn update_hover(&mut self, row: u16, col: u16, layout: &Layout) {
        let region = self.region_at(row, col, layout).cloned();
        if region == self.hover {
            return;
        }

        match &region {
            Some(r) => {
                let target = self
                    .activation
                    .resolve(&r.keyword)
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| r.keyword.clone());
                self.display.set_message(format!("Click to open {}", target));
                self.hover_message = true;
            }
            None if self.hover_message => {
                self.display.clear_message();
                self.hover_message = false;
            }
            None => {}
        }
        self.hover = region;
        self.display.invalidate();
    }

    /// Show a non-fatal error
    fn report(&mut self, err: &NavigatorError) {
        if err.is_fatal() {
            log::error!("{}", err);
        } else {
            log::warn!("{}", err);
        }
        self.display.set_message(err.to_string());
        self.hover_message = false;
    }
}

/// Terminal front end
pub struct App {
    terminal: Terminal,
    controller: Controller,
}

impl App {
    pub fn new(terminal: Terminal, controller: Controller) -> Self {
        Self {
            terminal,
            controller,
        }
    }

    /// Run the main loop until the user quits
    pub fn run(&mut self) -> Result<()> {
        self.controller.display.force_redraw();
        self.controller.display.set_message("F1 for help");

        while self.controller.is_running() {
            // Reveal updates are applied here, on the interactive thread
            self.controller.selection.pump();
            let view_changed = self.controller.selection.view_mut().take_dirty();
            if view_changed || self.controller.display.needs_redraw() {
                self.render()?;
            }

            let rendering = matches!(
                self.controller.selection.state(),
                SelectionState::ItemChosen { rendering: true }
            );
            let timeout = if rendering { REVEAL_FRAME } else { IDLE_FRAME };

            if let Some(event) = self.terminal.poll_event(timeout)? {
                if let Some(action) = input::translate(event) {
                    let layout = Layout::new(self.terminal.cols(), self.terminal.rows());
                    self.controller.handle(action, &layout);
                }
            }
        }

        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let selectors = self.controller.selector_lines();
        let Controller {
            selection,
            display,
            hover,
            ..
        } = &mut self.controller;
        display.render(&mut self.terminal, &selectors, selection.view_mut(), hover.as_ref())
    }
}
