//! Session effectiveness scoring.

use crate::engine::config::ScoreWeights;
use crate::engine::types::{Emotion, ProbabilityVector};

/// Scores a whole session from every classifier output observed, including
/// vectors whose tumbling windows were discarded mid-session. Focus adds,
/// the negative states subtract; the result is clamped to [0, 100] and
/// rounded. An empty history scores 0.
pub fn score(history: &[ProbabilityVector], weights: &ScoreWeights) -> u8 {
    if history.is_empty() {
        return 0;
    }

    let mean = ProbabilityVector::mean(history);
    let raw = mean.get(Emotion::Focus) * weights.focus
        - mean.get(Emotion::Boredom) * weights.boredom
        - mean.get(Emotion::Confusion) * weights.confusion
        - mean.get(Emotion::Fatigue) * weights.fatigue;

    raw.clamp(0.0, 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> ScoreWeights {
        ScoreWeights::default()
    }

    #[test]
    fn pure_focus_scores_one_hundred() {
        let history = [ProbabilityVector([0.0, 0.0, 0.0, 1.0])];
        assert_eq!(score(&history, &weights()), 100);
    }

    #[test]
    fn pure_fatigue_clamps_to_zero() {
        let history = [ProbabilityVector([0.0, 0.0, 1.0, 0.0])];
        assert_eq!(score(&history, &weights()), 0);
    }

    #[test]
    fn mixed_session_scores_thirty_five() {
        // 60 - 10 - 7 - 8 = 35
        let history = [ProbabilityVector([0.2, 0.1, 0.1, 0.6])];
        assert_eq!(score(&history, &weights()), 35);
    }

    #[test]
    fn empty_history_scores_zero() {
        assert_eq!(score(&[], &weights()), 0);
    }

    #[test]
    fn score_averages_over_the_full_history() {
        let history = [
            ProbabilityVector([0.0, 0.0, 0.0, 1.0]),
            ProbabilityVector([0.0, 0.0, 1.0, 0.0]),
        ];
        // Mean is [0, 0, 0.5, 0.5]: 50 - 40 = 10.
        assert_eq!(score(&history, &weights()), 10);
    }
}
