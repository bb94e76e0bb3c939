//! End-to-end session actor tests on paused tokio time.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::DateTime;

use gaze_backend::engine::config::EngineConfig;
use gaze_backend::engine::session::spawn_session;
use gaze_backend::engine::tracker::GazeTracker;
use gaze_backend::engine::types::{Emotion, FeatureVector, GazeSample, ProbabilityVector};
use gaze_backend::services::classifier::{ClassifierError, EmotionClassifier};

#[derive(Clone)]
enum Script {
    Constant(ProbabilityVector),
    Delayed(ProbabilityVector, Duration),
    Fail,
}

/// Classifier double that replays a script and records every feature
/// vector it was asked about.
#[derive(Clone)]
struct ScriptedClassifier {
    script: Script,
    captured: Arc<Mutex<Vec<FeatureVector>>>,
}

impl ScriptedClassifier {
    fn new(script: Script) -> (Self, Arc<Mutex<Vec<FeatureVector>>>) {
        let captured = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                script,
                captured: captured.clone(),
            },
            captured,
        )
    }
}

impl EmotionClassifier for ScriptedClassifier {
    fn classify(
        &self,
        features: FeatureVector,
    ) -> impl std::future::Future<Output = Result<ProbabilityVector, ClassifierError>> + Send {
        self.captured.lock().unwrap().push(features);
        let script = self.script.clone();
        async move {
            match script {
                Script::Constant(probs) => Ok(probs),
                Script::Delayed(probs, delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(probs)
                }
                Script::Fail => Err(ClassifierError::Unavailable("scripted outage".into())),
            }
        }
    }
}

#[derive(Clone)]
struct RecordingTracker {
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingTracker {
    fn new() -> (Self, Arc<Mutex<Vec<&'static str>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl GazeTracker for RecordingTracker {
    fn begin(&mut self) {
        self.calls.lock().unwrap().push("begin");
    }
    fn pause(&mut self) {
        self.calls.lock().unwrap().push("pause");
    }
    fn resume(&mut self) {
        self.calls.lock().unwrap().push("resume");
    }
    fn end(&mut self) {
        self.calls.lock().unwrap().push("end");
    }
}

fn sample(x: f64, y: f64, t_ms: i64) -> GazeSample {
    GazeSample {
        x,
        y,
        t: DateTime::from_timestamp_millis(t_ms).unwrap(),
        confidence: None,
    }
}

#[tokio::test(start_paused = true)]
async fn decision_emitted_after_twelve_windows() {
    let (classifier, _) = ScriptedClassifier::new(Script::Constant(ProbabilityVector([
        0.0, 0.0, 0.0, 1.0,
    ])));
    let (tracker, calls) = RecordingTracker::new();
    let (session, mut decisions) =
        spawn_session(EngineConfig::default(), classifier, tracker);

    let decision = decisions.recv().await.expect("a decision after 12 windows");
    assert_eq!(decision.emotion, Emotion::Focus);
    assert_eq!(decision.mean_vector, ProbabilityVector([0.0, 0.0, 0.0, 1.0]));

    session.resolve(None).await.unwrap();
    let summary = session.end().await.unwrap();
    assert_eq!(summary.effectiveness_score, 100);
    assert_eq!(
        summary.final_mean_vector,
        ProbabilityVector([0.0, 0.0, 0.0, 1.0])
    );

    assert_eq!(*calls.lock().unwrap(), vec!["begin", "pause", "resume", "end"]);
}

#[tokio::test(start_paused = true)]
async fn timed_break_rearms_collection() {
    let (classifier, _) = ScriptedClassifier::new(Script::Constant(ProbabilityVector([
        1.0, 0.0, 0.0, 0.0,
    ])));
    let (tracker, calls) = RecordingTracker::new();
    let (session, mut decisions) =
        spawn_session(EngineConfig::default(), classifier, tracker);

    let first = decisions.recv().await.expect("first decision");
    assert_eq!(first.emotion, Emotion::Boredom);

    session.resolve(Some(300)).await.unwrap();

    // The break elapses under paused time and collection re-arms: a second
    // full window of results produces a second decision.
    let second = decisions.recv().await.expect("second decision after break");
    assert_eq!(second.emotion, Emotion::Boredom);

    session.resolve(None).await.unwrap();
    session.end().await.unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        vec!["begin", "pause", "resume", "pause", "resume", "end"]
    );
}

#[tokio::test(start_paused = true)]
async fn classifier_failures_skip_windows_without_stalling() {
    let (classifier, captured) = ScriptedClassifier::new(Script::Fail);
    let (tracker, _) = RecordingTracker::new();
    let (session, mut decisions) =
        spawn_session(EngineConfig::default(), classifier, tracker);

    // Twelve tick periods plus slack; every window fails, so no decision.
    tokio::time::sleep(Duration::from_secs(125)).await;
    assert!(decisions.try_recv().is_err());
    assert_eq!(captured.lock().unwrap().len(), 12);

    let summary = session.end().await.unwrap();
    assert_eq!(summary.effectiveness_score, 0);
    assert_eq!(summary.final_mean_vector, ProbabilityVector::ZERO);
}

#[tokio::test(start_paused = true)]
async fn slow_classifications_never_overlap() {
    // Each round trip outlasts the 10s tick period, so every other tick
    // lands while a classification is in flight and must be skipped, not
    // stacked into a concurrent request.
    let (classifier, captured) = ScriptedClassifier::new(Script::Delayed(
        ProbabilityVector([0.0, 0.0, 0.0, 1.0]),
        Duration::from_secs(15),
    ));
    let (tracker, _) = RecordingTracker::new();
    let (session, mut decisions) =
        spawn_session(EngineConfig::default(), classifier, tracker);

    // Windows close at 10s, 25s, and 40s: the ticks due at 20s and 35s
    // fire only once the previous round trip lands. Five naive ticks fit
    // in 50s; serialized collection produces exactly three.
    tokio::time::sleep(Duration::from_secs(50)).await;
    assert_eq!(captured.lock().unwrap().len(), 3);
    assert!(decisions.try_recv().is_err());

    session.end().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn samples_feed_the_next_window() {
    let (classifier, captured) = ScriptedClassifier::new(Script::Constant(ProbabilityVector([
        0.0, 0.0, 0.0, 1.0,
    ])));
    let (tracker, _) = RecordingTracker::new();
    let (session, _decisions) =
        spawn_session(EngineConfig::default(), classifier, tracker);

    // Two 141-unit jumps, both saccades, neither within fixation radius.
    session.submit_sample(sample(0.0, 0.0, 0)).await.unwrap();
    session.submit_sample(sample(100.0, 100.0, 50)).await.unwrap();
    session.submit_sample(sample(200.0, 200.0, 100)).await.unwrap();

    // Let the first window close and reach the classifier.
    tokio::time::sleep(Duration::from_secs(11)).await;

    let captured = captured.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].saccade_count, 2);
    assert_eq!(captured[0].fixation_count, 0);

    session.end().await.unwrap();
}
