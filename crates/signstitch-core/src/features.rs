//! Per-frame feature vectors for the signing-activity classifier.
//!
//! The vector layout matches the classifier's training data exactly: elbows
//! and wrists first, then every tracked finger joint of the left hand, then
//! the right, each point contributing x, y, z in order.

use thiserror::Error;

use crate::pose::{Frame, LandmarkComponent, LandmarkSet, PoseSequence};

/// Values per frame feature vector: 4 arm points plus 18 joints per hand,
/// three coordinates each.
pub const FRAME_FEATURE_LEN: usize = (4 + 2 * 18) * 3;

/// A fixed-length feature vector derived from one frame.
pub type FrameFeatureVector = [f32; FRAME_FEATURE_LEN];

/// Arm points feeding the head of the vector.
const ARM_POINTS: [(LandmarkComponent, &str); 4] = [
    (LandmarkComponent::Body, "LEFT_ELBOW"),
    (LandmarkComponent::Body, "RIGHT_ELBOW"),
    (LandmarkComponent::Body, "LEFT_WRIST"),
    (LandmarkComponent::Body, "RIGHT_WRIST"),
];

/// Finger joints per hand, in vector order.
const HAND_JOINTS: [&str; 18] = [
    "THUMB_CMC",
    "THUMB_MCP",
    "INDEX_FINGER_MCP",
    "INDEX_FINGER_PIP",
    "INDEX_FINGER_DIP",
    "INDEX_FINGER_TIP",
    "MIDDLE_FINGER_MCP",
    "MIDDLE_FINGER_PIP",
    "MIDDLE_FINGER_DIP",
    "MIDDLE_FINGER_TIP",
    "RING_FINGER_MCP",
    "RING_FINGER_PIP",
    "RING_FINGER_DIP",
    "RING_FINGER_TIP",
    "PINKY_MCP",
    "PINKY_PIP",
    "PINKY_DIP",
    "PINKY_TIP",
];

/// Errors that can occur while building feature vectors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeatureError {
    #[error("landmark {name} missing from {component} component")]
    MissingLandmark {
        component: &'static str,
        name: &'static str,
    },
}

/// Extracts one feature vector per frame. Point indices are resolved once at
/// construction, so extraction itself is a pure index walk.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    indices: [usize; FRAME_FEATURE_LEN / 3],
}

impl FeatureExtractor {
    /// Resolves every named point against `set`. Fails when a point is
    /// absent, typically because an upstream reduction removed the hands.
    pub fn new(set: &LandmarkSet) -> Result<Self, FeatureError> {
        let mut indices = [0usize; FRAME_FEATURE_LEN / 3];
        let mut next = 0;

        for (component, name) in ARM_POINTS {
            indices[next] = resolve(set, component, name)?;
            next += 1;
        }
        for component in [LandmarkComponent::LeftHand, LandmarkComponent::RightHand] {
            for name in HAND_JOINTS {
                indices[next] = resolve(set, component, name)?;
                next += 1;
            }
        }

        Ok(Self { indices })
    }

    /// The feature vector for a single frame.
    pub fn features(&self, frame: &Frame) -> FrameFeatureVector {
        let mut out = [0.0f32; FRAME_FEATURE_LEN];
        for (slot, &point) in self.indices.iter().enumerate() {
            let position = frame.points[point].position;
            out[slot * 3] = position.x;
            out[slot * 3 + 1] = position.y;
            out[slot * 3 + 2] = position.z;
        }
        out
    }

    /// Feature vectors for every frame of a sequence, in frame order.
    pub fn sequence_features(&self, seq: &PoseSequence) -> Vec<FrameFeatureVector> {
        seq.frames.iter().map(|frame| self.features(frame)).collect()
    }
}

fn resolve(
    set: &LandmarkSet,
    component: LandmarkComponent,
    name: &'static str,
) -> Result<usize, FeatureError> {
    set.index_of(component, name)
        .ok_or(FeatureError::MissingLandmark {
            component: component.name(),
            name,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Landmark, PoseHeader, PoseSequence};

    fn indexed_frame(set: &LandmarkSet) -> Frame {
        Frame::new(
            (0..set.len())
                .map(|i| Landmark::new(i as f32, i as f32 + 0.25, i as f32 + 0.5, 1.0))
                .collect(),
        )
    }

    #[test]
    fn vector_is_120_values_in_declared_order() {
        let set = crate::pose::LandmarkSet::holistic();
        let extractor = FeatureExtractor::new(&set).unwrap();
        let frame = indexed_frame(&set);
        let features = extractor.features(&frame);

        assert_eq!(features.len(), 120);
        // Head of the vector is the left elbow (body point 13).
        assert_eq!(features[0], 13.0);
        assert_eq!(features[1], 13.25);
        assert_eq!(features[2], 13.5);
        // First hand slot is the left thumb CMC (body 33 + hand point 1).
        assert_eq!(features[12], 34.0);
        // Right-hand block starts at slot 22 with the right thumb CMC.
        assert_eq!(features[22 * 3], 55.0);
    }

    #[test]
    fn missing_hands_are_reported() {
        let set = crate::pose::LandmarkSet::body();
        assert_eq!(
            FeatureExtractor::new(&set).unwrap_err(),
            FeatureError::MissingLandmark {
                component: "LEFT_HAND",
                name: "THUMB_CMC",
            }
        );
    }

    #[test]
    fn sequence_features_cover_every_frame() {
        let set = crate::pose::LandmarkSet::holistic();
        let extractor = FeatureExtractor::new(&set).unwrap();
        let frame = indexed_frame(&set);
        let seq = PoseSequence::new(PoseHeader::new(set), vec![frame; 7]);
        assert_eq!(extractor.sequence_features(&seq).len(), 7);
    }
}
