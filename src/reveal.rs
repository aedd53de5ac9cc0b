//! Reveal engine - types an answer into the answer view, one run per tick
//!
//! Each render session runs on its own worker thread. The worker never
//! touches the view directly: it sends `RevealUpdate`s over a channel and
//! the interactive thread applies them (see `view::AnswerView`).
//!
//! Cancellation is cooperative. The flag is checked before each run and
//! after each pause, and the pause itself wakes as soon as the flag is set,
//! so a cancelled session appends at most the run it is currently on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::Result;
use crate::links::LinkDictionary;
use crate::scanner::{self, Run};

/// Identifies one render session; increases with every new session
pub type SessionId = u64;

/// A revealed linked run, in char offsets of the answer text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationRegion {
    /// First char offset (inclusive)
    pub start: usize,
    /// Last char offset (exclusive)
    pub end: usize,
    /// Dictionary keyword
    pub keyword: String,
}

impl ActivationRegion {
    /// Check if this region covers a char offset
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

/// A display mutation produced by a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealUpdate {
    /// Start of a session: empty the view
    Clear { session: SessionId },
    /// One run's text, with its region when the run is linked
    Append {
        session: SessionId,
        text: String,
        region: Option<ActivationRegion>,
    },
    /// The session revealed every run
    Finished { session: SessionId },
}

impl RevealUpdate {
    pub fn session(&self) -> SessionId {
        match self {
            RevealUpdate::Clear { session }
            | RevealUpdate::Append { session, .. }
            | RevealUpdate::Finished { session } => *session,
        }
    }
}

/// How a reveal ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Completed,
    /// Stopped early after revealing this many runs
    Cancelled(usize),
}

/// Shared cancellation flag that can wake a pausing worker
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation and wake any pause in progress
    pub fn cancel(&self) {
        let (flag, cvar) = &*self.inner;
        let mut cancelled = flag.lock().unwrap_or_else(|e| e.into_inner());
        *cancelled = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        let (flag, _) = &*self.inner;
        *flag.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wait up to `timeout`, returning early on cancellation
    ///
    /// Returns true if the token is cancelled. The mutex is released while
    /// waiting.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(|e| e.into_inner());
        let (cancelled, _) = cvar
            .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(|e| e.into_inner());
        *cancelled
    }
}

/// Scheduling substrate for the delay between runs
pub trait Pacer: Send + Sync {
    /// Resume after `delay`, or sooner if `cancel` fires
    fn pause(&self, delay: Duration, cancel: &CancelToken);
}

/// Real-time pacing
#[derive(Debug, Default)]
pub struct TimedPacer;

impl Pacer for TimedPacer {
    fn pause(&self, delay: Duration, cancel: &CancelToken) {
        if !delay.is_zero() {
            cancel.wait_timeout(delay);
        }
    }
}

/// Reveal `runs` in order, sending one update per run
///
/// `cursor` is advanced after every append so the owner can observe
/// progress. Stops early if `cancel` fires or the receiver is gone.
pub fn reveal(
    session: SessionId,
    runs: &[Run],
    cancel: &CancelToken,
    tick: Duration,
    pacer: &dyn Pacer,
    out: &Sender<RevealUpdate>,
    cursor: &AtomicUsize,
) -> RevealOutcome {
    if cancel.is_cancelled() || out.send(RevealUpdate::Clear { session }).is_err() {
        return RevealOutcome::Cancelled(0);
    }

    let mut offset = 0;
    for (i, run) in runs.iter().enumerate() {
        if cancel.is_cancelled() {
            return RevealOutcome::Cancelled(i);
        }

        let len = run.char_len();
        let region = run.keyword().map(|keyword| ActivationRegion {
            start: offset,
            end: offset + len,
            keyword: keyword.to_string(),
        });
        let mut text = String::new();
        run.push_to(&mut text);

        if out
            .send(RevealUpdate::Append {
                session,
                text,
                region,
            })
            .is_err()
        {
            return RevealOutcome::Cancelled(i);
        }
        offset += len;
        cursor.store(i + 1, Ordering::Release);

        pacer.pause(tick, cancel);
        if cancel.is_cancelled() {
            return RevealOutcome::Cancelled(i + 1);
        }
    }

    let _ = out.send(RevealUpdate::Finished { session });
    RevealOutcome::Completed
}

/// One in-flight reveal of one answer
pub struct RenderSession {
    id: SessionId,
    run_count: usize,
    cursor: Arc<AtomicUsize>,
    cancel: CancelToken,
    worker: Option<JoinHandle<RevealOutcome>>,
}

impl RenderSession {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn run_count(&self) -> usize {
        self.run_count
    }

    /// Number of runs appended so far
    pub fn revealed(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Ask the worker to stop; does not wait
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the worker has exited
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, |w| w.is_finished())
    }

    /// Cancel and wait for the worker to exit
    ///
    /// The wait is bounded by one run: the worker wakes from its pause as
    /// soon as the token fires.
    pub fn cancel_and_join(mut self) -> Option<RevealOutcome> {
        self.cancel.cancel();
        self.worker.take().and_then(|w| w.join().ok())
    }

    /// Wait for the worker to finish on its own
    pub fn join(mut self) -> Option<RevealOutcome> {
        self.worker.take().and_then(|w| w.join().ok())
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Starts render sessions and hands their updates to one channel
pub struct RevealEngine {
    tick: Duration,
    pacer: Arc<dyn Pacer>,
    updates: Sender<RevealUpdate>,
    next_id: SessionId,
}

impl RevealEngine {
    pub fn new(tick: Duration, updates: Sender<RevealUpdate>) -> Self {
        Self::with_pacer(tick, Arc::new(TimedPacer), updates)
    }

    pub fn with_pacer(tick: Duration, pacer: Arc<dyn Pacer>, updates: Sender<RevealUpdate>) -> Self {
        Self {
            tick,
            pacer,
            updates,
            next_id: 1,
        }
    }

    /// Scan `text` and reveal it on a new worker thread
    pub fn start(&mut self, text: &str, dict: &LinkDictionary) -> Result<RenderSession> {
        let id = self.next_id;
        self.next_id += 1;

        let runs = scanner::scan(text, dict);
        let run_count = runs.len();
        let cursor = Arc::new(AtomicUsize::new(0));
        let cancel = CancelToken::new();

        let worker = {
            let cursor = Arc::clone(&cursor);
            let cancel = cancel.clone();
            let pacer = Arc::clone(&self.pacer);
            let out = self.updates.clone();
            let tick = self.tick;
            thread::Builder::new()
                .name(format!("reveal-{}", id))
                .spawn(move || {
                    let outcome = reveal(id, &runs, &cancel, tick, pacer.as_ref(), &out, &cursor);
                    log::debug!("session {} ended: {:?}", id, outcome);
                    outcome
                })?
        };

        Ok(RenderSession {
            id,
            run_count,
            cursor,
            cancel,
            worker: Some(worker),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::LinkEntry;
    use std::sync::mpsc::{self, Receiver};

    /// Never sleeps
    struct NoDelay;

    impl Pacer for NoDelay {
        fn pause(&self, _delay: Duration, _cancel: &CancelToken) {}
    }

    /// Cancels the token during the pause that follows run `after`
    struct CancelDuringPause {
        after: usize,
        pauses: AtomicUsize,
    }

    impl Pacer for CancelDuringPause {
        fn pause(&self, _delay: Duration, cancel: &CancelToken) {
            if self.pauses.fetch_add(1, Ordering::SeqCst) == self.after {
                cancel.cancel();
            }
        }
    }

    fn annexure_dict() -> LinkDictionary {
        LinkDictionary::new(vec![LinkEntry::new("Annexure-4", "Annexure 4.pdf")]).unwrap()
    }

    fn run_direct(text: &str, pacer: &dyn Pacer, cancel: &CancelToken) -> (RevealOutcome, Vec<RevealUpdate>) {
        let (tx, rx) = mpsc::channel();
        let runs = scanner::scan(text, &annexure_dict());
        let cursor = AtomicUsize::new(0);
        let outcome = reveal(7, &runs, cancel, Duration::ZERO, pacer, &tx, &cursor);
        drop(tx);
        (outcome, rx.iter().collect())
    }

    fn appended_text(updates: &[RevealUpdate]) -> String {
        updates
            .iter()
            .filter_map(|u| match u {
                RevealUpdate::Append { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_full_reveal() {
        let text = "See Annexure-4 for details.";
        let (outcome, updates) = run_direct(text, &NoDelay, &CancelToken::new());

        assert_eq!(outcome, RevealOutcome::Completed);
        assert_eq!(updates.first(), Some(&RevealUpdate::Clear { session: 7 }));
        assert_eq!(updates.last(), Some(&RevealUpdate::Finished { session: 7 }));
        assert_eq!(appended_text(&updates), text);

        let regions: Vec<_> = updates
            .iter()
            .filter_map(|u| match u {
                RevealUpdate::Append { region: Some(r), .. } => Some(r.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            regions,
            vec![ActivationRegion {
                start: 4,
                end: 14,
                keyword: "Annexure-4".to_string(),
            }]
        );
    }

    #[test]
    fn test_linked_run_is_one_append() {
        let (_, updates) = run_direct("Annexure-4", &NoDelay, &CancelToken::new());
        let appends: Vec<_> = updates
            .iter()
            .filter(|u| matches!(u, RevealUpdate::Append { .. }))
            .collect();
        assert_eq!(appends.len(), 1);
    }

    #[test]
    fn test_cancellation_latency_is_one_run() {
        // Cancelled while pausing after run 2: runs 0, 1 and 2 are revealed
        let pacer = CancelDuringPause {
            after: 2,
            pauses: AtomicUsize::new(0),
        };
        let (outcome, updates) = run_direct("abcdef", &pacer, &CancelToken::new());

        assert_eq!(outcome, RevealOutcome::Cancelled(3));
        assert_eq!(appended_text(&updates), "abc");
        assert!(!updates.iter().any(|u| matches!(u, RevealUpdate::Finished { .. })));
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let (outcome, updates) = run_direct("abc", &NoDelay, &cancel);
        assert_eq!(outcome, RevealOutcome::Cancelled(0));
        assert!(updates.is_empty());
    }

    #[test]
    fn test_stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let runs = scanner::scan("abc", &annexure_dict());
        let cursor = AtomicUsize::new(0);
        let outcome = reveal(1, &runs, &CancelToken::new(), Duration::ZERO, &NoDelay, &tx, &cursor);
        assert_eq!(outcome, RevealOutcome::Cancelled(0));
    }

    #[test]
    fn test_cancel_wakes_pause() {
        let cancel = CancelToken::new();
        let waiter = {
            let cancel = cancel.clone();
            thread::spawn(move || cancel.wait_timeout(Duration::from_secs(30)))
        };
        thread::sleep(Duration::from_millis(20));
        cancel.cancel();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_wait_timeout_expires() {
        let cancel = CancelToken::new();
        assert!(!cancel.wait_timeout(Duration::from_millis(5)));
    }

    fn drain(rx: &Receiver<RevealUpdate>) -> Vec<RevealUpdate> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_engine_session_runs_to_completion() {
        let (tx, rx) = mpsc::channel();
        let mut engine = RevealEngine::with_pacer(Duration::ZERO, Arc::new(NoDelay), tx);

        let session = engine.start("See Annexure-4 for details.", &annexure_dict()).unwrap();
        assert_eq!(session.id(), 1);
        assert_eq!(session.run_count(), 4 + 1 + 13);
        let run_count = session.run_count();
        let cursor = Arc::clone(&session.cursor);
        assert_eq!(session.join(), Some(RevealOutcome::Completed));
        assert_eq!(cursor.load(Ordering::Acquire), run_count);

        let updates = drain(&rx);
        assert_eq!(appended_text(&updates), "See Annexure-4 for details.");
        assert!(updates.iter().all(|u| u.session() == 1));
    }

    #[test]
    fn test_engine_cancel_and_join_with_timed_pacer() {
        let (tx, rx) = mpsc::channel();
        let mut engine = RevealEngine::new(Duration::from_secs(10), tx);

        let session = engine.start("abcdef", &annexure_dict()).unwrap();
        // Wait for the first append, then cancel in the middle of the pause
        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first, RevealUpdate::Clear { session: 1 });
        let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(second, RevealUpdate::Append { .. }));

        assert_eq!(session.cancel_and_join(), Some(RevealOutcome::Cancelled(1)));
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_session_ids_increase() {
        let (tx, _rx) = mpsc::channel();
        let mut engine = RevealEngine::with_pacer(Duration::ZERO, Arc::new(NoDelay), tx);
        let a = engine.start("x", &annexure_dict()).unwrap();
        let b = engine.start("y", &annexure_dict()).unwrap();
        assert!(b.id() > a.id());
        a.join();
        b.join();
    }
}
