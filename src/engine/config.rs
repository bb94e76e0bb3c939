use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::EngineEnvConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub detection: DetectionConfig,
    pub windowing: WindowingConfig,
    pub score_weights: ScoreWeights,
}

/// Thresholds for turning raw gaze samples into ocular events.
/// Distances are in gaze-plane units (screen pixels for the webcam tracker).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionConfig {
    /// Consecutive samples closer than this keep a fixation run alive.
    pub fixation_radius: f64,
    /// A stable run must outlast this before a fixation event is emitted.
    pub fixation_min_duration_ms: f64,
    /// Consecutive samples further apart than this register a saccade.
    pub saccade_min_distance: f64,
    /// Saccades below this amplitude are additionally tallied as microsaccades.
    pub microsaccade_max_amplitude: f64,
    /// Tracker confidence below this opens a blink interval.
    pub blink_confidence_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowingConfig {
    /// Feature window width; one feature vector is produced per tick.
    pub tick_interval_secs: u64,
    /// Classifier outputs accumulated before a decision (12 x 10s = 2 min).
    pub probability_window_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreWeights {
    pub focus: f64,
    pub boredom: f64,
    pub confusion: f64,
    pub fatigue: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            fixation_radius: 50.0,
            fixation_min_duration_ms: 200.0,
            saccade_min_distance: 15.0,
            microsaccade_max_amplitude: 30.0,
            blink_confidence_threshold: 0.2,
        }
    }
}

impl Default for WindowingConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 10,
            probability_window_capacity: 12,
        }
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            focus: 100.0,
            boredom: 50.0,
            confusion: 70.0,
            fatigue: 80.0,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            windowing: WindowingConfig::default(),
            score_weights: ScoreWeights::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env(env: &EngineEnvConfig) -> Self {
        let mut config = Self::default();
        config.windowing.tick_interval_secs = env.tick_interval_secs;
        config.windowing.probability_window_capacity = env.probability_window_capacity;
        config.detection.fixation_radius = env.fixation_radius;
        config.detection.fixation_min_duration_ms = env.fixation_min_duration_ms;
        config.detection.saccade_min_distance = env.saccade_min_distance;
        config.detection.microsaccade_max_amplitude = env.microsaccade_max_amplitude;
        config.detection.blink_confidence_threshold = env.blink_confidence_threshold;
        config
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.windowing.tick_interval_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        let d = &self.detection;
        if !(d.fixation_radius > 0.0) {
            return Err("fixation_radius must be positive".to_string());
        }
        if !(d.fixation_min_duration_ms > 0.0) {
            return Err("fixation_min_duration_ms must be positive".to_string());
        }
        if !(d.saccade_min_distance > 0.0) {
            return Err("saccade_min_distance must be positive".to_string());
        }
        if !(d.microsaccade_max_amplitude > d.saccade_min_distance) {
            return Err(
                "microsaccade_max_amplitude must exceed saccade_min_distance".to_string(),
            );
        }
        if !(0.0..=1.0).contains(&d.blink_confidence_threshold) {
            return Err("blink_confidence_threshold must be within [0, 1]".to_string());
        }
        if self.windowing.tick_interval_secs == 0 {
            return Err("tick_interval_secs must be at least 1".to_string());
        }
        if self.windowing.probability_window_capacity == 0 {
            return Err("probability_window_capacity must be at least 1".to_string());
        }
        Ok(())
    }
}
