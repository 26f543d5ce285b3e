//! The signing-activity classifier capability.
//!
//! The classifier itself is an external collaborator: a pure batched
//! function from feature vectors to signing probabilities. Nothing about
//! its representation leaks into trimming or concatenation, so it can be
//! swapped or mocked freely.

use crate::features::FrameFeatureVector;

/// Probability at or above which a frame counts as signing.
pub const SIGNING_THRESHOLD: f32 = 0.5;

/// Binary per-frame activity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLabel {
    /// Idle or rest pose between signs.
    Waiting,
    /// Actively signing.
    Signing,
}

/// External classifier capability: one signing probability in `[0, 1]` per
/// input vector, vectorized over the batch. Called once per clip per trim.
pub trait SignActivityScorer {
    fn score_batch(&self, frames: &[FrameFeatureVector]) -> Vec<f32>;
}

/// Thresholds classifier probabilities into frame labels.
pub fn labels_from_scores(scores: &[f32]) -> Vec<FrameLabel> {
    scores
        .iter()
        .map(|&p| {
            if p >= SIGNING_THRESHOLD {
                FrameLabel::Signing
            } else {
                FrameLabel::Waiting
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_inclusive_at_half() {
        let labels = labels_from_scores(&[0.0, 0.49, 0.5, 0.51, 1.0]);
        assert_eq!(
            labels,
            vec![
                FrameLabel::Waiting,
                FrameLabel::Waiting,
                FrameLabel::Signing,
                FrameLabel::Signing,
                FrameLabel::Signing,
            ]
        );
    }
}
