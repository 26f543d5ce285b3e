pub mod codec;
pub mod layout;

use std::sync::Arc;

use nalgebra::{Point3, Vector3};

/// Default playback rate assumed for sequences that carry no rate of their own.
pub const DEFAULT_FPS: f32 = 24.0;

/// Named group a tracked point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandmarkComponent {
    Body,
    LeftHand,
    RightHand,
}

impl LandmarkComponent {
    pub fn name(&self) -> &'static str {
        match self {
            LandmarkComponent::Body => "BODY",
            LandmarkComponent::LeftHand => "LEFT_HAND",
            LandmarkComponent::RightHand => "RIGHT_HAND",
        }
    }
}

/// MediaPipe-style body point names, in wire order.
const BODY_POINTS: [&str; 33] = [
    "NOSE",
    "LEFT_EYE_INNER",
    "LEFT_EYE",
    "LEFT_EYE_OUTER",
    "RIGHT_EYE_INNER",
    "RIGHT_EYE",
    "RIGHT_EYE_OUTER",
    "LEFT_EAR",
    "RIGHT_EAR",
    "MOUTH_LEFT",
    "MOUTH_RIGHT",
    "LEFT_SHOULDER",
    "RIGHT_SHOULDER",
    "LEFT_ELBOW",
    "RIGHT_ELBOW",
    "LEFT_WRIST",
    "RIGHT_WRIST",
    "LEFT_PINKY",
    "RIGHT_PINKY",
    "LEFT_INDEX",
    "RIGHT_INDEX",
    "LEFT_THUMB",
    "RIGHT_THUMB",
    "LEFT_HIP",
    "RIGHT_HIP",
    "LEFT_KNEE",
    "RIGHT_KNEE",
    "LEFT_ANKLE",
    "RIGHT_ANKLE",
    "LEFT_HEEL",
    "RIGHT_HEEL",
    "LEFT_FOOT_INDEX",
    "RIGHT_FOOT_INDEX",
];

/// Hand point names, in wire order. Shared by both hands.
const HAND_POINTS: [&str; 21] = [
    "WRIST",
    "THUMB_CMC",
    "THUMB_MCP",
    "THUMB_IP",
    "THUMB_TIP",
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

/// Body points retained by [`crate::concat::reduce_holistic`]: everything
/// above the hips. Legs and feet carry no signing information.
const UPPER_BODY_POINTS: [&str; 23] = [
    "NOSE",
    "LEFT_EYE_INNER",
    "LEFT_EYE",
    "LEFT_EYE_OUTER",
    "RIGHT_EYE_INNER",
    "RIGHT_EYE",
    "RIGHT_EYE_OUTER",
    "LEFT_EAR",
    "RIGHT_EAR",
    "MOUTH_LEFT",
    "MOUTH_RIGHT",
    "LEFT_SHOULDER",
    "RIGHT_SHOULDER",
    "LEFT_ELBOW",
    "RIGHT_ELBOW",
    "LEFT_WRIST",
    "RIGHT_WRIST",
    "LEFT_PINKY",
    "RIGHT_PINKY",
    "LEFT_INDEX",
    "RIGHT_INDEX",
    "LEFT_THUMB",
    "RIGHT_THUMB",
];

/// The named, ordered collection of tracked points shared read-only by every
/// frame of a sequence. Fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandmarkSet {
    points: Vec<(LandmarkComponent, &'static str)>,
}

impl LandmarkSet {
    /// The 33 body points alone.
    pub fn body() -> Arc<Self> {
        Arc::new(Self {
            points: BODY_POINTS
                .iter()
                .map(|&name| (LandmarkComponent::Body, name))
                .collect(),
        })
    }

    /// Body plus both hands (75 points). This is the capture layout the raw
    /// clip files are recorded in.
    pub fn holistic() -> Arc<Self> {
        let mut points: Vec<(LandmarkComponent, &'static str)> = BODY_POINTS
            .iter()
            .map(|&name| (LandmarkComponent::Body, name))
            .collect();
        points.extend(
            HAND_POINTS
                .iter()
                .map(|&name| (LandmarkComponent::LeftHand, name)),
        );
        points.extend(
            HAND_POINTS
                .iter()
                .map(|&name| (LandmarkComponent::RightHand, name)),
        );
        Arc::new(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of a named point, or `None` if the set does not carry it.
    pub fn index_of(&self, component: LandmarkComponent, name: &str) -> Option<usize> {
        self.points
            .iter()
            .position(|&(c, n)| c == component && n == name)
    }

    /// Contiguous index range covered by a component, or `None` when the set
    /// carries no points of that component. Built-in sets keep components
    /// contiguous and subsetting preserves order.
    pub fn component_range(&self, component: LandmarkComponent) -> Option<std::ops::Range<usize>> {
        let start = self.points.iter().position(|&(c, _)| c == component)?;
        let end = start
            + self.points[start..]
                .iter()
                .take_while(|&&(c, _)| c == component)
                .count();
        Some(start..end)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LandmarkComponent, &'static str)> + '_ {
        self.points.iter().copied()
    }

    /// True when the point belongs to the signing subset kept by reduction.
    fn is_signing_point(component: LandmarkComponent, name: &str) -> bool {
        match component {
            LandmarkComponent::Body => UPPER_BODY_POINTS.contains(&name),
            LandmarkComponent::LeftHand | LandmarkComponent::RightHand => true,
        }
    }
}

/// A single tracked point: 3D position plus tracker confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub position: Point3<f32>,
    pub confidence: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32, confidence: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            confidence,
        }
    }

    /// Linear interpolation between two landmarks.
    pub fn lerp(&self, other: &Landmark, t: f32) -> Landmark {
        Landmark {
            position: Point3::from(
                self.position.coords + (other.position.coords - self.position.coords) * t,
            ),
            confidence: self.confidence + (other.confidence - self.confidence) * t,
        }
    }
}

/// One captured frame: a landmark per entry of the owning sequence's set.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub points: Vec<Landmark>,
}

impl Frame {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// Interpolated frame between `self` and `other` at parameter `t` in
    /// `[0, 1]`. Both frames must share a landmark set.
    pub fn lerp(&self, other: &Frame, t: f32) -> Frame {
        debug_assert_eq!(self.points.len(), other.points.len());
        Frame {
            points: self
                .points
                .iter()
                .zip(other.points.iter())
                .map(|(a, b)| a.lerp(b, t))
                .collect(),
        }
    }
}

/// Declared canvas dimensions and playback rate for a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseHeader {
    pub width: u16,
    pub height: u16,
    pub fps: f32,
    pub landmark_set: Arc<LandmarkSet>,
}

impl PoseHeader {
    pub fn new(landmark_set: Arc<LandmarkSet>) -> Self {
        Self {
            width: 0,
            height: 0,
            fps: DEFAULT_FPS,
            landmark_set,
        }
    }

    pub fn with_dimensions(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// An ordered sequence of frames over a fixed landmark set.
///
/// Sequences are created by decoding a file or by slicing/joining other
/// sequences, mutated in place by trimming and global coordinate transforms,
/// and lose their identity once joined into a larger sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSequence {
    pub header: PoseHeader,
    pub frames: Vec<Frame>,
}

impl PoseSequence {
    pub fn new(header: PoseHeader, frames: Vec<Frame>) -> Self {
        debug_assert!(frames
            .iter()
            .all(|f| f.points.len() == header.landmark_set.len()));
        Self { header, frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn landmark_set(&self) -> &Arc<LandmarkSet> {
        &self.header.landmark_set
    }

    /// Keeps only the frames in `range`, discarding the rest.
    pub fn retain_frames(&mut self, range: std::ops::Range<usize>) {
        let end = range.end.min(self.frames.len());
        let start = range.start.min(end);
        self.frames.truncate(end);
        self.frames.drain(..start);
    }

    /// Shifts every coordinate by `shift` and multiplies by `scale`.
    pub fn shift_scale(&mut self, shift: f32, scale: f32) {
        let offset = Vector3::new(shift, shift, shift);
        for frame in &mut self.frames {
            for landmark in &mut frame.points {
                landmark.position = Point3::from((landmark.position.coords + offset) * scale);
            }
        }
    }

    /// Divides every coordinate by `factor`. Confidence is untouched.
    pub fn divide_coords(&mut self, factor: f32) {
        for frame in &mut self.frames {
            for landmark in &mut frame.points {
                landmark.position /= factor;
            }
        }
    }

    /// New sequence keeping only the points selected by `keep`, in order.
    pub fn retain_points<F>(&self, keep: F) -> PoseSequence
    where
        F: Fn(LandmarkComponent, &str) -> bool,
    {
        let kept: Vec<usize> = self
            .header
            .landmark_set
            .iter()
            .enumerate()
            .filter(|&(_, (c, n))| keep(c, n))
            .map(|(i, _)| i)
            .collect();
        let set = Arc::new(LandmarkSet {
            points: kept
                .iter()
                .map(|&i| self.header.landmark_set.points[i])
                .collect(),
        });
        let frames = self
            .frames
            .iter()
            .map(|frame| Frame {
                points: kept.iter().map(|&i| frame.points[i]).collect(),
            })
            .collect();
        let mut header = self.header.clone();
        header.landmark_set = set;
        PoseSequence { header, frames }
    }

    /// New sequence keeping only the signing subset (upper body plus hands).
    pub fn retain_signing_points(&self) -> PoseSequence {
        self.retain_points(LandmarkSet::is_signing_point)
    }
}
