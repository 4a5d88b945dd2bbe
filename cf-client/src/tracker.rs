//! Submission verdict tracking
//!
//! [`TrackerState`] holds the diffing logic and is pure; [`SubmissionTracker`]
//! runs it on a fixed interval in a dedicated thread and delivers
//! [`TrackerEvent`]s over a channel. Polls never overlap: the next poll is not
//! started before the previous one's events have been sent.

use crate::client::CfClient;
use crate::error::{CfError, StateError};
use crate::model::{Submission, Verdict};
use crate::session::Session;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Supplies the most recent submissions of a handle
pub trait SubmissionSource: Send + Sync + 'static {
    fn recent_submissions(&self, handle: &str, count: usize) -> Result<Vec<Submission>, CfError>;
}

/// Reads submissions from `/api/user.status` with a fixed session
#[derive(Debug, Clone)]
pub struct UserStatusFeed {
    client: CfClient,
    session: Session,
}

impl UserStatusFeed {
    pub fn new(client: CfClient, session: Session) -> Self {
        Self { client, session }
    }
}

impl SubmissionSource for UserStatusFeed {
    fn recent_submissions(&self, handle: &str, count: usize) -> Result<Vec<Submission>, CfError> {
        self.client.user_status(handle, 1, count, &self.session)
    }
}

/// A verdict transition of one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerdictEvent {
    /// Still testing; `test` is the test currently executing
    Running { submission: Submission, test: u32 },
    /// Resolved with `OK`
    Accepted { submission: Submission },
    /// Resolved with any other verdict on test `test`
    Failed { submission: Submission, test: u32 },
}

impl VerdictEvent {
    fn from_submission(submission: Submission) -> Self {
        let test = submission.passed_test_count + 1;
        match submission.verdict {
            Verdict::Testing => VerdictEvent::Running { submission, test },
            Verdict::Ok => VerdictEvent::Accepted { submission },
            _ => VerdictEvent::Failed { submission, test },
        }
    }

    pub fn submission(&self) -> &Submission {
        match self {
            VerdictEvent::Running { submission, .. }
            | VerdictEvent::Accepted { submission }
            | VerdictEvent::Failed { submission, .. } => submission,
        }
    }

    /// Link to the submission page on `host`
    pub fn submission_url(&self, host: &str) -> Option<String> {
        let submission = self.submission();
        let contest_id = submission
            .contest_id
            .or(submission.problem.contest_id)?;
        Some(format!(
            "{}/contest/{}/submission/{}",
            host.trim_end_matches('/'),
            contest_id,
            submission.id
        ))
    }
}

impl fmt::Display for VerdictEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerdictEvent::Running { submission, test } => {
                write!(f, "{}: running on test #{}", submission.problem.name, test)
            }
            VerdictEvent::Accepted { submission } => {
                write!(f, "{}: ACCEPTED", submission.problem.name)
            }
            VerdictEvent::Failed { submission, test } => write!(
                f,
                "{}: {} on test {}",
                submission.problem.name, submission.verdict, test
            ),
        }
    }
}

/// Per-tracking-run memory of what has been announced
///
/// `last_submission_id == None` stands for the +∞ sentinel: until the first
/// poll completes, no submission counts as new.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerState {
    last_submission_id: Option<u64>,
    pending_testing: BTreeSet<u64>,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_submission_id(&self) -> Option<u64> {
        self.last_submission_id
    }

    /// Ids last observed in `TESTING`
    pub fn pending_testing(&self) -> &BTreeSet<u64> {
        &self.pending_testing
    }

    /// Diff one poll against the state and return the transitions to announce
    ///
    /// A submission is announced iff it is newer than the high-water mark or
    /// was pending. Order of `submissions` does not matter.
    pub fn observe(&mut self, submissions: &[Submission]) -> Vec<VerdictEvent> {
        let mut events = Vec::new();
        for submission in submissions {
            let is_new = self
                .last_submission_id
                .is_some_and(|last| submission.id > last);
            if is_new || self.pending_testing.contains(&submission.id) {
                self.record(submission);
                events.push(VerdictEvent::from_submission(submission.clone()));
            }
        }
        self.advance(submissions);
        events
    }

    /// Seed the state from the first poll of a run without announcing anything
    ///
    /// Submissions already testing are adopted so their resolution is
    /// announced later. The high-water mark is always set afterwards, to 0
    /// for an empty poll, so every later submission counts as new.
    pub fn seed(&mut self, submissions: &[Submission]) {
        for submission in submissions {
            if !submission.verdict.is_terminal() {
                self.pending_testing.insert(submission.id);
            }
        }
        self.advance(submissions);
        self.last_submission_id.get_or_insert(0);
    }

    fn record(&mut self, submission: &Submission) {
        if submission.verdict.is_terminal() {
            self.pending_testing.remove(&submission.id);
        } else {
            self.pending_testing.insert(submission.id);
        }
    }

    fn advance(&mut self, submissions: &[Submission]) {
        let Some(max_id) = submissions.iter().map(|s| s.id).max() else {
            return;
        };
        self.last_submission_id = Some(match self.last_submission_id {
            Some(last) => last.max(max_id),
            None => max_id,
        });
    }
}

/// Polling configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Delay between two polls
    pub interval: Duration,
    /// Number of most recent submissions fetched per poll
    pub count: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(10_000),
            count: 10,
        }
    }
}

/// Message delivered by a running tracker
#[derive(Debug)]
pub enum TrackerEvent {
    Verdict(VerdictEvent),
    /// A poll failed; the schedule and the state are unaffected
    PollFailed(CfError),
}

struct Worker {
    stop: Sender<()>,
    thread: JoinHandle<TrackerState>,
}

/// Polls a [`SubmissionSource`] and announces verdict transitions
///
/// # Example
///
/// ```no_run
/// use cf_client::{CfClient, Session, SubmissionTracker, TrackerConfig, TrackerEvent, UserStatusFeed};
/// use std::sync::mpsc;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let feed = UserStatusFeed::new(CfClient::new()?, Session::anonymous());
/// let mut tracker = SubmissionTracker::new(feed, "tourist", TrackerConfig::default());
///
/// let (tx, rx) = mpsc::channel();
/// tracker.start(tx)?;
/// for event in rx {
///     if let TrackerEvent::Verdict(verdict) = event {
///         println!("{}", verdict);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct SubmissionTracker<S: SubmissionSource> {
    source: Arc<S>,
    handle: String,
    config: TrackerConfig,
    state: TrackerState,
    worker: Option<Worker>,
}

impl<S: SubmissionSource> SubmissionTracker<S> {
    pub fn new(source: S, handle: impl Into<String>, config: TrackerConfig) -> Self {
        Self {
            source: Arc::new(source),
            handle: handle.into(),
            config,
            state: TrackerState::new(),
            worker: None,
        }
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Track another handle from the next `start` on
    pub fn set_handle(&mut self, handle: impl Into<String>) -> Result<(), StateError> {
        if self.is_running() {
            return Err(StateError::AlreadyRunning);
        }
        self.handle = handle.into();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// State as of the last `start` or `stop`
    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Reset the state, poll once synchronously, then arm the repeating timer
    ///
    /// # Errors
    ///
    /// * `StateError::AlreadyRunning` - The tracker is already running
    /// * Any error of the seeding poll; the timer is not armed in that case
    pub fn start(&mut self, events: Sender<TrackerEvent>) -> Result<(), CfError> {
        if self.is_running() {
            return Err(StateError::AlreadyRunning.into());
        }

        self.state = TrackerState::new();
        let submissions = self
            .source
            .recent_submissions(&self.handle, self.config.count)?;
        self.state.seed(&submissions);

        let (stop, stop_rx) = mpsc::channel();
        let mut state = self.state.clone();
        let source = Arc::clone(&self.source);
        let handle = self.handle.clone();
        let config = self.config;

        let thread = std::thread::spawn(move || {
            let mut next_tick = Instant::now() + config.interval;
            loop {
                let wait = next_tick.saturating_duration_since(Instant::now());
                match stop_rx.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }

                if !poll(source.as_ref(), &handle, config.count, &mut state, &events) {
                    debug!("Event receiver dropped, stopping monitor");
                    break;
                }

                let now = Instant::now();
                while next_tick <= now {
                    next_tick += config.interval;
                }
            }
            state
        });

        info!(handle = %self.handle, interval = ?self.config.interval, "Monitor started");
        self.worker = Some(Worker { stop, thread });
        Ok(())
    }

    /// Disarm the timer
    ///
    /// A poll already in flight completes and its events are still delivered.
    pub fn stop(&mut self) -> Result<(), StateError> {
        let worker = self.worker.take().ok_or(StateError::NotRunning)?;
        // The worker may already have exited on its own
        let _ = worker.stop.send(());
        self.state = worker
            .thread
            .join()
            .map_err(|_| StateError::WorkerPanicked)?;
        info!(handle = %self.handle, "Monitor stopped");
        Ok(())
    }
}

impl<S: SubmissionSource> Drop for SubmissionTracker<S> {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}

/// Run one poll cycle; returns `false` once nobody listens anymore
fn poll<S: SubmissionSource + ?Sized>(
    source: &S,
    handle: &str,
    count: usize,
    state: &mut TrackerState,
    events: &Sender<TrackerEvent>,
) -> bool {
    match source.recent_submissions(handle, count) {
        Ok(submissions) => state
            .observe(&submissions)
            .into_iter()
            .all(|event| events.send(TrackerEvent::Verdict(event)).is_ok()),
        Err(error) => {
            warn!(%error, "Polling submissions failed");
            events.send(TrackerEvent::PollFailed(error)).is_ok()
        }
    }
}
