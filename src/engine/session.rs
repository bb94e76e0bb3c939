//! Session lifecycle control.
//!
//! [`SessionController`] is the pure state machine: it owns the detector,
//! the feature aggregator, the tumbling probability window, and the
//! full-session probability history, and it gates every transition.
//! [`spawn_session`] wraps it in a tokio task that owns all of that state
//! exclusively, processing samples, window ticks, classifier results, and
//! UI resolutions strictly in arrival order.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior, Sleep};
use uuid::Uuid;

use crate::engine::aggregator::WindowAggregator;
use crate::engine::config::EngineConfig;
use crate::engine::detector::EventDetector;
use crate::engine::scorer;
use crate::engine::tracker::GazeTracker;
use crate::engine::types::{
    Decision, FeatureVector, GazeSample, ProbabilityVector, SessionPhase, SessionSummary,
};
use crate::engine::window::ProbabilityWindow;
use crate::services::classifier::{ClassifierError, EmotionClassifier};

pub struct SessionController {
    id: Uuid,
    config: EngineConfig,
    detector: EventDetector,
    aggregator: WindowAggregator,
    window: ProbabilityWindow,
    /// Every classifier output of the session, kept for effectiveness
    /// scoring even after the tumbling window discards its entries.
    history: Vec<ProbabilityVector>,
    phase: SessionPhase,
    pending_decision: bool,
    started_at: Option<DateTime<Utc>>,
}

/// What the caller must do after a UI resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Resume collection immediately.
    Resume,
    /// Hold collection for a timed break, then resume.
    Break(Duration),
}

impl SessionController {
    pub fn new(config: EngineConfig) -> Self {
        let detector = EventDetector::new(&config.detection);
        let aggregator = WindowAggregator::new(&config.detection);
        let window = ProbabilityWindow::new(config.windowing.probability_window_capacity);
        Self {
            id: Uuid::new_v4(),
            config,
            detector,
            aggregator,
            window,
            history: Vec::new(),
            phase: SessionPhase::NotStarted,
            pending_decision: false,
            started_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pending_decision(&self) -> bool {
        self.pending_decision
    }

    pub fn probability_window_len(&self) -> usize {
        self.window.len()
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.phase != SessionPhase::NotStarted {
            tracing::warn!(session_id = %self.id, phase = ?self.phase, "Redundant start ignored");
            return false;
        }
        self.started_at = Some(now);
        self.phase = SessionPhase::Collecting;
        true
    }

    /// Samples are ingested only while collecting; anything arriving while
    /// paused or ended is dropped.
    pub fn handle_sample(&mut self, sample: GazeSample) {
        if self.phase != SessionPhase::Collecting {
            return;
        }
        for event in self.detector.ingest(sample) {
            self.aggregator.record(&event);
        }
    }

    /// Drains the feature window. A tick outside `Collecting` is a state
    /// machine bug, not an environmental condition.
    pub fn handle_tick(&mut self) -> Option<FeatureVector> {
        if self.phase != SessionPhase::Collecting {
            debug_assert!(false, "tick fired outside Collecting");
            tracing::error!(session_id = %self.id, phase = ?self.phase, "Tick fired outside Collecting; dropped");
            return None;
        }
        Some(self.aggregator.drain())
    }

    /// Records one classifier output into both the tumbling window and the
    /// full-session history. Late results that land after collection paused
    /// or ended are dropped.
    pub fn record_probabilities(&mut self, probs: ProbabilityVector) -> Option<Decision> {
        if self.phase != SessionPhase::Collecting {
            tracing::debug!(session_id = %self.id, phase = ?self.phase, "Dropping late classifier result");
            return None;
        }

        self.history.push(probs);
        let decision = self.window.push(probs)?;

        debug_assert!(!self.pending_decision, "decision emitted while one is pending");
        self.pending_decision = true;
        self.phase = SessionPhase::PausedForIntervention;
        Some(decision)
    }

    /// UI resolution of the pending intervention, optionally with a timed
    /// break. Redundant resolutions are no-ops.
    pub fn resolve(&mut self, break_secs: Option<u64>) -> Option<ResolveOutcome> {
        if self.phase != SessionPhase::PausedForIntervention {
            tracing::warn!(session_id = %self.id, phase = ?self.phase, "Resolve with no pending intervention ignored");
            return None;
        }

        self.pending_decision = false;
        // The window cleared itself when it decided; clear again in case a
        // stray push landed in between.
        self.window.clear();

        match break_secs {
            Some(secs) => {
                self.phase = SessionPhase::PausedForBreak;
                Some(ResolveOutcome::Break(Duration::from_secs(secs)))
            }
            None => {
                self.phase = SessionPhase::Collecting;
                Some(ResolveOutcome::Resume)
            }
        }
    }

    /// Break timer elapsed; returns true when collection actually resumes.
    pub fn break_elapsed(&mut self) -> bool {
        if self.phase != SessionPhase::PausedForBreak {
            tracing::warn!(session_id = %self.id, phase = ?self.phase, "Break elapsed outside PausedForBreak ignored");
            return false;
        }
        self.phase = SessionPhase::Collecting;
        true
    }

    /// Ends the session from any phase and produces the record handed to
    /// the persistence boundary.
    pub fn end(&mut self, now: DateTime<Utc>) -> SessionSummary {
        self.phase = SessionPhase::Ended;
        self.pending_decision = false;

        SessionSummary {
            id: self.id,
            started_at: self.started_at.unwrap_or(now),
            ended_at: now,
            final_mean_vector: ProbabilityVector::mean(&self.history),
            effectiveness_score: scorer::score(&self.history, &self.config.score_weights),
        }
    }
}

#[derive(Debug)]
pub enum SessionCommand {
    Sample(GazeSample),
    ClassifierResult(Result<ProbabilityVector, ClassifierError>),
    Resolve { break_secs: Option<u64> },
    End { reply: oneshot::Sender<SessionSummary> },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session task is no longer running")]
    Closed,
}

/// Cheap-to-clone sender half of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub async fn submit_sample(&self, sample: GazeSample) -> Result<(), SessionError> {
        self.cmd_tx
            .send(SessionCommand::Sample(sample))
            .await
            .map_err(|_| SessionError::Closed)
    }

    pub async fn resolve(&self, break_secs: Option<u64>) -> Result<(), SessionError> {
        self.cmd_tx
            .send(SessionCommand::Resolve { break_secs })
            .await
            .map_err(|_| SessionError::Closed)
    }

    pub async fn end(&self) -> Result<SessionSummary, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(SessionCommand::End { reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }
}

/// Starts a session: begins the tracker, arms the window tick, and spawns
/// the actor task. Decisions arrive on the returned receiver; the UI
/// boundary answers them through [`SessionHandle::resolve`].
pub fn spawn_session<C, T>(
    config: EngineConfig,
    classifier: C,
    tracker: T,
) -> (SessionHandle, mpsc::Receiver<Decision>)
where
    C: EmotionClassifier + Send + Sync + 'static,
    T: GazeTracker + Send + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel(256);
    let (decision_tx, decision_rx) = mpsc::channel(4);

    let actor = SessionActor {
        controller: SessionController::new(config),
        classifier: Arc::new(classifier),
        tracker,
        cmd_tx: cmd_tx.clone(),
        cmd_rx,
        decision_tx,
        classification_in_flight: false,
    };
    tokio::spawn(actor.run());

    (SessionHandle { cmd_tx }, decision_rx)
}

struct SessionActor<C, T> {
    controller: SessionController,
    classifier: Arc<C>,
    tracker: T,
    /// Kept so spawned classification round trips can post back results.
    cmd_tx: mpsc::Sender<SessionCommand>,
    cmd_rx: mpsc::Receiver<SessionCommand>,
    decision_tx: mpsc::Sender<Decision>,
    classification_in_flight: bool,
}

impl<C, T> SessionActor<C, T>
where
    C: EmotionClassifier + Send + Sync + 'static,
    T: GazeTracker + Send + 'static,
{
    async fn run(mut self) {
        self.controller.start(Utc::now());
        self.tracker.begin();
        tracing::info!(session_id = %self.controller.id(), "Session started");

        let period = self.controller.config().tick_interval();
        let mut tick = interval_at(Instant::now() + period, period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut break_timer: Option<Pin<Box<Sleep>>> = None;

        loop {
            tokio::select! {
                // The tick only exists while collecting; pausing disables
                // this branch in the same loop iteration, so no stale tick
                // can fire against a paused session. A tick is also skipped
                // while a classification is in flight rather than
                // double-firing (latency is assumed well under the period).
                _ = tick.tick(), if self.controller.phase() == SessionPhase::Collecting
                    && !self.classification_in_flight =>
                {
                    if let Some(features) = self.controller.handle_tick() {
                        self.classification_in_flight = true;
                        let classifier = self.classifier.clone();
                        let cmd_tx = self.cmd_tx.clone();
                        tokio::spawn(async move {
                            let result = classifier.classify(features).await;
                            // The session may end while the round trip is in
                            // flight; a closed mailbox is fine.
                            let _ = cmd_tx.send(SessionCommand::ClassifierResult(result)).await;
                        });
                    }
                }

                _ = async {
                    match break_timer.as_mut() {
                        Some(timer) => timer.await,
                        None => std::future::pending().await,
                    }
                }, if break_timer.is_some() => {
                    break_timer = None;
                    if self.controller.break_elapsed() {
                        self.tracker.resume();
                        tick.reset();
                        tracing::info!(session_id = %self.controller.id(), "Break over, collection resumed");
                    }
                }

                cmd = self.cmd_rx.recv() => {
                    let Some(cmd) = cmd else {
                        // Every handle dropped without an explicit end.
                        self.tracker.end();
                        tracing::warn!(session_id = %self.controller.id(), "Session handle dropped, stopping");
                        break;
                    };
                    if self.handle_command(cmd, &mut tick, &mut break_timer).await {
                        break;
                    }
                }
            }
        }
    }

    /// Returns true when the session is finished and the actor should stop.
    async fn handle_command(
        &mut self,
        cmd: SessionCommand,
        tick: &mut tokio::time::Interval,
        break_timer: &mut Option<Pin<Box<Sleep>>>,
    ) -> bool {
        match cmd {
            SessionCommand::Sample(sample) => {
                self.controller.handle_sample(sample);
            }
            SessionCommand::ClassifierResult(result) => {
                self.classification_in_flight = false;
                match result {
                    Ok(probs) => {
                        if let Some(decision) = self.controller.record_probabilities(probs) {
                            self.tracker.pause();
                            tracing::info!(
                                session_id = %self.controller.id(),
                                emotion = decision.emotion.as_str(),
                                "Dominant emotion detected, pausing for intervention"
                            );
                            if self.decision_tx.send(decision).await.is_err() {
                                // Nobody is listening; resume rather than
                                // leaving the session stuck in a pause.
                                tracing::warn!(session_id = %self.controller.id(), "Decision receiver dropped, resuming");
                                if self.controller.resolve(None).is_some() {
                                    self.tracker.resume();
                                    tick.reset();
                                }
                            }
                        }
                    }
                    Err(error) => {
                        tracing::warn!(session_id = %self.controller.id(), %error, "Classification failed, window skipped");
                    }
                }
            }
            SessionCommand::Resolve { break_secs } => match self.controller.resolve(break_secs) {
                Some(ResolveOutcome::Resume) => {
                    self.tracker.resume();
                    tick.reset();
                    tracing::info!(session_id = %self.controller.id(), "Intervention resolved, collection resumed");
                }
                Some(ResolveOutcome::Break(duration)) => {
                    *break_timer = Some(Box::pin(sleep(duration)));
                    tracing::info!(
                        session_id = %self.controller.id(),
                        secs = duration.as_secs(),
                        "Intervention resolved with a timed break"
                    );
                }
                None => {}
            },
            SessionCommand::End { reply } => {
                *break_timer = None;
                self.tracker.end();
                let summary = self.controller.end(Utc::now());
                tracing::info!(
                    session_id = %summary.id,
                    score = summary.effectiveness_score,
                    "Session ended"
                );
                let _ = reply.send(summary);
                return true;
            }
        }
        false
    }
}
