//! Streaming ocular event detection.
//!
//! Consumes one gaze sample at a time with O(1) state: the previous sample,
//! the fixation run state, and an open blink interval. Emits zero or more
//! events per sample; never errors on malformed input.

use crate::engine::config::DetectionConfig;
use crate::engine::types::{GazeSample, OcularEvent};

#[derive(Debug, Clone, Copy, PartialEq)]
enum FixationRun {
    /// No stable run in progress.
    Idle,
    /// Stable run anchored at the timestamp of its first sample.
    Tracking { anchor_ms: i64 },
    /// Event already emitted for this run; latched until the run breaks.
    Emitted,
}

#[derive(Debug)]
pub struct EventDetector {
    config: DetectionConfig,
    last: Option<GazeSample>,
    fixation: FixationRun,
    blink_start_ms: Option<i64>,
}

impl EventDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            config: config.clone(),
            last: None,
            fixation: FixationRun::Idle,
            blink_start_ms: None,
        }
    }

    /// Evaluates, in order: saccade/microsaccade, fixation, blink. The
    /// saccade and fixation checks both compare against the immediately
    /// previous sample; the blink check is driven solely by confidence.
    pub fn ingest(&mut self, sample: GazeSample) -> Vec<OcularEvent> {
        let mut events = Vec::new();

        if !sample.x.is_finite() || !sample.y.is_finite() {
            tracing::debug!("Ignoring gaze sample with non-finite coordinates");
            return events;
        }

        let now_ms = sample.t.timestamp_millis();

        if let Some(last) = &self.last {
            let distance = euclidean(last, &sample);
            let dt_ms = (now_ms - last.t.timestamp_millis()) as f64;

            if distance > self.config.saccade_min_distance {
                events.push(OcularEvent::Saccade {
                    duration_ms: dt_ms,
                    amplitude: distance,
                });
            }

            if distance < self.config.fixation_radius {
                match self.fixation {
                    FixationRun::Idle => {
                        self.fixation = FixationRun::Tracking {
                            anchor_ms: last.t.timestamp_millis(),
                        };
                    }
                    FixationRun::Tracking { anchor_ms } => {
                        let elapsed_ms = (now_ms - anchor_ms) as f64;
                        if elapsed_ms > self.config.fixation_min_duration_ms {
                            events.push(OcularEvent::Fixation {
                                duration_ms: elapsed_ms,
                            });
                            self.fixation = FixationRun::Emitted;
                        }
                    }
                    FixationRun::Emitted => {}
                }
            } else {
                // Anchor resets immediately once the radius is exceeded.
                self.fixation = FixationRun::Idle;
            }
        }

        if let Some(confidence) = sample.confidence {
            match self.blink_start_ms {
                None if confidence < self.config.blink_confidence_threshold => {
                    self.blink_start_ms = Some(now_ms);
                }
                Some(start_ms) if confidence >= self.config.blink_confidence_threshold => {
                    events.push(OcularEvent::Blink {
                        duration_ms: (now_ms - start_ms) as f64,
                    });
                    self.blink_start_ms = None;
                }
                _ => {}
            }
        }

        self.last = Some(sample);
        events
    }
}

fn euclidean(a: &GazeSample, b: &GazeSample) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}
