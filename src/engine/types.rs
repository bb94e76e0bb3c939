use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One raw gaze estimate from the tracker. Consumed exactly once by the
/// event detector; only the most recent sample is retained as state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GazeSample {
    pub x: f64,
    pub y: f64,
    pub t: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// A discrete ocular event recognized from the sample stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OcularEvent {
    Fixation { duration_ms: f64 },
    Saccade { duration_ms: f64, amplitude: f64 },
    Blink { duration_ms: f64 },
}

/// Classifier label set, in wire order. The discriminant order is part of
/// the contract: ties in a probability vector resolve to the lowest index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Boredom,
    Confusion,
    Fatigue,
    Focus,
}

impl Emotion {
    pub const ALL: [Emotion; 4] = [
        Emotion::Boredom,
        Emotion::Confusion,
        Emotion::Fatigue,
        Emotion::Focus,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boredom => "boredom",
            Self::Confusion => "confusion",
            Self::Fatigue => "fatigue",
            Self::Focus => "focus",
        }
    }
}

/// The nine features produced per 10-second window, in the order the
/// classifier was trained on. Empty windows yield all zeros.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    pub fixation_count: u32,
    pub mean_fixation_duration_ms: f64,
    pub stddev_fixation_duration_ms: f64,
    pub saccade_count: u32,
    pub mean_saccade_duration_ms: f64,
    pub mean_saccade_amplitude: f64,
    pub blink_count: u32,
    pub mean_blink_duration_ms: f64,
    pub microsaccade_count: u32,
}

impl FeatureVector {
    pub fn to_array(&self) -> [f64; 9] {
        [
            f64::from(self.fixation_count),
            self.mean_fixation_duration_ms,
            self.stddev_fixation_duration_ms,
            f64::from(self.saccade_count),
            self.mean_saccade_duration_ms,
            self.mean_saccade_amplitude,
            f64::from(self.blink_count),
            self.mean_blink_duration_ms,
            f64::from(self.microsaccade_count),
        ]
    }
}

/// Non-negative class scores in [`Emotion::ALL`] order. The external
/// classifier gives no guarantee they sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbabilityVector(pub [f64; 4]);

impl ProbabilityVector {
    pub const ZERO: Self = Self([0.0; 4]);

    pub fn get(&self, emotion: Emotion) -> f64 {
        self.0[emotion.index()]
    }

    /// Coordinate-wise arithmetic mean; the zero vector for empty input.
    pub fn mean(vectors: &[Self]) -> Self {
        if vectors.is_empty() {
            return Self::ZERO;
        }
        let mut sum = [0.0_f64; 4];
        for vector in vectors {
            for (acc, p) in sum.iter_mut().zip(vector.0) {
                *acc += p;
            }
        }
        let n = vectors.len() as f64;
        Self(sum.map(|s| s / n))
    }

    /// Argmax over the four labels; ties go to the lowest label index.
    pub fn dominant(&self) -> Emotion {
        let mut best = Emotion::Boredom;
        for emotion in Emotion::ALL {
            if self.0[emotion.index()] > self.0[best.index()] {
                best = emotion;
            }
        }
        best
    }
}

/// The "dominant emotion detected" signal surfaced to the UI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub emotion: Emotion,
    pub mean_vector: ProbabilityVector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    NotStarted,
    Collecting,
    PausedForIntervention,
    PausedForBreak,
    Ended,
}

/// Handed to the persistence boundary when a session ends. The core never
/// stores this itself.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub final_mean_vector: ProbabilityVector,
    pub effectiveness_score: u8,
}
