use signstitch_core::classifier::SignActivityScorer;
use signstitch_core::features::FrameFeatureVector;

/// Wrist-y slots in the feature vector (left and right).
const LEFT_WRIST_Y: usize = 2 * 3 + 1;
const RIGHT_WRIST_Y: usize = 3 * 3 + 1;

/// Default activity scorer: hands raised above the rest line count as
/// signing.
///
/// Clips reach the scorer in shoulder-relative space, y growing downward
/// with the shoulder line at zero. A resting signer drops both wrists
/// roughly one and a half shoulder-widths below that line; signing happens
/// near or above it. The trained classifier replaces this heuristic behind
/// the same trait in deployments that ship the model.
#[derive(Debug, Clone)]
pub struct RestPoseScorer {
    /// Wrist height (in shoulder-widths below the shoulder line) at which a
    /// frame is as likely waiting as signing.
    pub rest_line: f32,
    /// Steepness of the probability falloff around the rest line.
    pub steepness: f32,
}

impl Default for RestPoseScorer {
    fn default() -> Self {
        Self {
            rest_line: 1.0,
            steepness: 8.0,
        }
    }
}

impl SignActivityScorer for RestPoseScorer {
    fn score_batch(&self, frames: &[FrameFeatureVector]) -> Vec<f32> {
        frames
            .iter()
            .map(|features| {
                let wrist_y = features[LEFT_WRIST_Y].min(features[RIGHT_WRIST_Y]);
                logistic(self.steepness * (self.rest_line - wrist_y))
            })
            .collect()
    }
}

fn logistic(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
