//! Selection state machine - chapter -> sub-chapter -> question
//!
//! Owns the answer view and the render session writing into it. Choosing a
//! question starts a new session only after the previous one has been
//! cancelled and its worker joined, so at most one worker is ever revealing.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{NavigatorError, Result};
use crate::links::LinkDictionary;
use crate::reveal::{RenderSession, RevealEngine, RevealUpdate, SessionId};
use crate::store::DataStore;
use crate::view::AnswerView;

pub const PROMPT_TOPIC: &str = "Start by selecting a chapter.";
pub const PROMPT_SUBTOPIC: &str = "Please select a sub-chapter.";
pub const PROMPT_ITEM: &str = "Please select a question.";

/// Where the user is in the cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Empty,
    TopicChosen,
    SubtopicChosen,
    ItemChosen { rendering: bool },
}

pub struct Selection {
    store: Arc<DataStore>,
    links: Arc<LinkDictionary>,
    engine: RevealEngine,
    updates: Receiver<RevealUpdate>,
    view: AnswerView,
    topic: Option<String>,
    subtopic: Option<String>,
    item: Option<String>,
    /// Session allowed to write to the view
    session: Option<RenderSession>,
    /// Cancelled sessions whose workers may still be winding down
    retired: Vec<RenderSession>,
    rendering: bool,
}

impl Selection {
    pub fn new(store: Arc<DataStore>, links: Arc<LinkDictionary>, tick: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        Self::with_engine(store, links, RevealEngine::new(tick, tx), rx)
    }

    /// Use a prepared engine; `updates` must receive what the engine sends
    pub fn with_engine(
        store: Arc<DataStore>,
        links: Arc<LinkDictionary>,
        engine: RevealEngine,
        updates: Receiver<RevealUpdate>,
    ) -> Self {
        let mut selection = Self {
            store,
            links,
            engine,
            updates,
            view: AnswerView::new(),
            topic: None,
            subtopic: None,
            item: None,
            session: None,
            retired: Vec::new(),
            rendering: false,
        };
        selection.view.show_message(PROMPT_TOPIC);
        selection
    }

    pub fn state(&self) -> SelectionState {
        match (&self.topic, &self.subtopic, &self.item) {
            (None, _, _) => SelectionState::Empty,
            (Some(_), None, _) => SelectionState::TopicChosen,
            (Some(_), Some(_), None) => SelectionState::SubtopicChosen,
            (Some(_), Some(_), Some(_)) => SelectionState::ItemChosen {
                rendering: self.rendering,
            },
        }
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn subtopic(&self) -> Option<&str> {
        self.subtopic.as_deref()
    }

    pub fn item(&self) -> Option<&str> {
        self.item.as_deref()
    }

    pub fn view(&self) -> &AnswerView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut AnswerView {
        &mut self.view
    }

    /// Id of the session currently allowed to write
    pub fn active_session(&self) -> Option<SessionId> {
        self.session.as_ref().map(RenderSession::id)
    }

    /// Pick a chapter; clears the sub-chapter and question
    pub fn choose_topic(&mut self, topic: &str) -> Result<()> {
        if !self.store.list_topics().contains(&topic) {
            return Err(NavigatorError::LookupMiss(topic.to_string()));
        }

        self.cancel_session();
        self.topic = Some(topic.to_string());
        self.subtopic = None;
        self.item = None;
        self.view.show_message(PROMPT_SUBTOPIC);
        Ok(())
    }

    /// Pick a sub-chapter of the current chapter; clears the question
    pub fn choose_subtopic(&mut self, subtopic: &str) -> Result<()> {
        let topic = self
            .topic
            .as_deref()
            .ok_or_else(|| NavigatorError::Message("Select a chapter first".to_string()))?;
        if !self.store.list_subtopics(topic).contains(&subtopic) {
            return Err(NavigatorError::LookupMiss(format!("{} / {}", topic, subtopic)));
        }

        self.cancel_session();
        self.subtopic = Some(subtopic.to_string());
        self.item = None;
        self.view.show_message(PROMPT_ITEM);
        Ok(())
    }

    /// Pick a question and start revealing its answer
    pub fn choose_item(&mut self, item: &str) -> Result<SessionId> {
        let (topic, subtopic) = match (self.topic.as_deref(), self.subtopic.as_deref()) {
            (Some(t), Some(s)) => (t, s),
            _ => {
                return Err(NavigatorError::Message(
                    "Select a chapter and sub-chapter first".to_string(),
                ))
            }
        };
        if !self.store.list_items(topic, subtopic).contains(&item) {
            return Err(NavigatorError::LookupMiss(format!("{} / {} / {}", topic, subtopic, item)));
        }
        let text = self.store.get_text(topic, subtopic, item).to_string();
        let label = format!("{} / {} / {}", topic, subtopic, item);

        // Single writer: the old worker must be gone before the new one starts
        self.join_sessions();

        let session = self.engine.start(&text, &self.links)?;
        let id = session.id();
        log::info!("session {} started: {}", id, label);

        self.item = Some(item.to_string());
        self.view.attach(id);
        self.session = Some(session);
        self.rendering = true;
        Ok(id)
    }

    /// Back to the initial prompt
    pub fn reset(&mut self) {
        self.cancel_session();
        self.topic = None;
        self.subtopic = None;
        self.item = None;
        self.view.show_message(PROMPT_TOPIC);
    }

    /// Apply queued reveal updates to the view
    ///
    /// Returns the number of updates that changed the view.
    pub fn pump(&mut self) -> usize {
        self.pump_with(|_| {})
    }

    /// Like `pump`, showing every received update to `observe` first
    pub fn pump_with(&mut self, mut observe: impl FnMut(&RevealUpdate)) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.updates.try_recv() {
            observe(&update);
            if let RevealUpdate::Finished { session } = update {
                if self.active_session() == Some(session) {
                    self.rendering = false;
                    log::debug!("session {} finished", session);
                }
            }
            if self.view.apply(update) {
                applied += 1;
            }
        }
        self.retired.retain(|s| !s.is_finished());
        applied
    }

    /// Stop the current session without waiting for its worker
    fn cancel_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel();
            log::debug!(
                "session {} cancelled after {}/{} runs",
                session.id(),
                session.revealed(),
                session.run_count()
            );
            self.retired.push(session);
        }
        self.view.detach();
        self.rendering = false;
    }

    /// Cancel every session and wait for their workers
    fn join_sessions(&mut self) {
        self.cancel_session();
        for session in self.retired.drain(..) {
            session.cancel_and_join();
        }
    }
}

impl Drop for Selection {
    fn drop(&mut self) {
        self.join_sessions();
    }
}
