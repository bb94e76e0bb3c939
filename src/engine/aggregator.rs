//! Fixed-width feature window accumulation.
//!
//! Ocular events are buffered per kind; on each tick the buffers are
//! snapshotted into a nine-feature vector and cleared as one unit. The
//! aggregator is owned by the session controller, so event recording and
//! draining are serialized by construction.

use crate::engine::config::DetectionConfig;
use crate::engine::types::{FeatureVector, OcularEvent};

#[derive(Debug)]
pub struct WindowAggregator {
    microsaccade_max_amplitude: f64,
    fixation_durations_ms: Vec<f64>,
    saccade_durations_ms: Vec<f64>,
    saccade_amplitudes: Vec<f64>,
    blink_durations_ms: Vec<f64>,
    microsaccade_count: u32,
}

impl WindowAggregator {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            microsaccade_max_amplitude: config.microsaccade_max_amplitude,
            fixation_durations_ms: Vec::new(),
            saccade_durations_ms: Vec::new(),
            saccade_amplitudes: Vec::new(),
            blink_durations_ms: Vec::new(),
            microsaccade_count: 0,
        }
    }

    pub fn record(&mut self, event: &OcularEvent) {
        match *event {
            OcularEvent::Fixation { duration_ms } => {
                self.fixation_durations_ms.push(duration_ms);
            }
            OcularEvent::Saccade {
                duration_ms,
                amplitude,
            } => {
                self.saccade_durations_ms.push(duration_ms);
                self.saccade_amplitudes.push(amplitude);
                if amplitude < self.microsaccade_max_amplitude {
                    self.microsaccade_count += 1;
                }
            }
            OcularEvent::Blink { duration_ms } => {
                self.blink_durations_ms.push(duration_ms);
            }
        }
    }

    /// Snapshot the current window into a feature vector and reset all
    /// buffers. Means are rounded to two decimals, matching the wire format
    /// the classifier was trained on.
    pub fn drain(&mut self) -> FeatureVector {
        let features = FeatureVector {
            fixation_count: self.fixation_durations_ms.len() as u32,
            mean_fixation_duration_ms: round2(mean(&self.fixation_durations_ms)),
            stddev_fixation_duration_ms: round2(population_stddev(&self.fixation_durations_ms)),
            saccade_count: self.saccade_durations_ms.len() as u32,
            mean_saccade_duration_ms: round2(mean(&self.saccade_durations_ms)),
            mean_saccade_amplitude: round2(mean(&self.saccade_amplitudes)),
            blink_count: self.blink_durations_ms.len() as u32,
            mean_blink_duration_ms: round2(mean(&self.blink_durations_ms)),
            microsaccade_count: self.microsaccade_count,
        };

        self.fixation_durations_ms.clear();
        self.saccade_durations_ms.clear();
        self.saccade_amplitudes.clear();
        self.blink_durations_ms.clear();
        self.microsaccade_count = 0;

        features
    }
}

/// 0 for an empty slice, never NaN.
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 for an empty slice.
fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
