//! Joining trimmed clips into one continuous sequence.
//!
//! Each request walks a fixed stage order over the whole clip list: reduce,
//! normalize, trim, join, wrist correction, rescale. A failure at any stage
//! aborts the request; no partial output is ever returned.

use log::{debug, info};
use nalgebra::Vector3;
use thiserror::Error;

use crate::classifier::SignActivityScorer;
use crate::features::FeatureError;
use crate::pose::{Frame, LandmarkComponent, PoseSequence};
use crate::trim::{trim_sequence, TrimOptions, DEFAULT_FRAME_PADDING};

/// Errors that can occur while concatenating clips
#[derive(Debug, Error)]
pub enum ConcatError {
    #[error("cannot concatenate an empty clip list")]
    EmptyInput,

    #[error(transparent)]
    Feature(#[from] FeatureError),
}

/// Tuning for one concatenation request.
#[derive(Debug, Clone)]
pub struct ConcatOptions {
    /// Waiting frames kept at each trimmed clip boundary.
    pub frame_padding: usize,
    /// Interpolated frames inserted at every clip join.
    pub transition_frames: usize,
    /// Coordinate shift applied before the output rescale.
    pub shift: f32,
    /// Target canvas width the shifted coordinates are scaled by.
    pub target_width: u32,
}

impl Default for ConcatOptions {
    fn default() -> Self {
        Self {
            frame_padding: DEFAULT_FRAME_PADDING,
            transition_frames: 8,
            shift: 1.25,
            target_width: 500,
        }
    }
}

/// Joins an ordered list of clips into one continuous sequence.
///
/// The first clip keeps its start and the last keeps its end: those are the
/// sentence's true beginning and end, not inter-word transitions. Input
/// sequences are consumed and must not be reused.
pub fn concatenate(
    clips: Vec<PoseSequence>,
    scorer: &dyn SignActivityScorer,
    opts: &ConcatOptions,
) -> Result<PoseSequence, ConcatError> {
    if clips.is_empty() {
        return Err(ConcatError::EmptyInput);
    }
    let clip_count = clips.len();
    debug!(target: "signstitch_core::concat", "Received {} clips", clip_count);

    let mut clips: Vec<PoseSequence> = clips
        .into_iter()
        .map(|clip| reduce_holistic(&clip))
        .collect();
    debug!(target: "signstitch_core::concat", "Reduced {} clips", clip_count);

    for clip in &mut clips {
        normalize_sequence(clip)?;
    }
    debug!(target: "signstitch_core::concat", "Normalized {} clips", clip_count);

    for (index, clip) in clips.iter_mut().enumerate() {
        let trim_opts = TrimOptions {
            trim_start: index > 0,
            trim_end: index < clip_count - 1,
            frame_padding: opts.frame_padding,
        };
        trim_sequence(clip, scorer, &trim_opts)?;
    }
    debug!(target: "signstitch_core::concat", "Trimmed {} clips", clip_count);

    let mut joined = smooth_join(clips, opts.transition_frames);
    debug!(target: "signstitch_core::concat", "Joined into {} frames", joined.len());

    correct_wrists(&mut joined)?;
    debug!(target: "signstitch_core::concat", "Corrected wrists");

    joined.shift_scale(opts.shift, opts.target_width as f32);
    let side = (opts.target_width as f32 * opts.shift * 2.0) as u16;
    joined.header.width = side;
    joined.header.height = side;
    debug!(target: "signstitch_core::concat", "Scaled to {}x{}", side, side);

    info!(
        target: "signstitch_core::concat",
        "Concatenated {} clips into {} frames",
        clip_count,
        joined.len()
    );
    Ok(joined)
}

/// Drops every point outside the signing subset (upper body plus hands).
pub fn reduce_holistic(seq: &PoseSequence) -> PoseSequence {
    seq.retain_signing_points()
}

/// Normalizes a clip into shoulder-relative space: the mean shoulder
/// midpoint moves to the origin and the mean shoulder span becomes the unit
/// length. One uniform transform per clip, so in-clip motion is preserved.
pub fn normalize_sequence(seq: &mut PoseSequence) -> Result<(), FeatureError> {
    if seq.is_empty() {
        return Ok(());
    }

    let set = seq.landmark_set();
    let left = require(set, LandmarkComponent::Body, "LEFT_SHOULDER")?;
    let right = require(set, LandmarkComponent::Body, "RIGHT_SHOULDER")?;

    let mut mid_sum = Vector3::zeros();
    let mut span_sum = 0.0f32;
    for frame in &seq.frames {
        let l = frame.points[left].position.coords;
        let r = frame.points[right].position.coords;
        mid_sum += (l + r) * 0.5;
        span_sum += (l - r).norm();
    }
    let count = seq.len() as f32;
    let mid = mid_sum / count;
    let span = span_sum / count;
    let scale = if span > f32::EPSILON { 1.0 / span } else { 1.0 };

    for frame in &mut seq.frames {
        for landmark in &mut frame.points {
            landmark.position = ((landmark.position.coords - mid) * scale).into();
        }
    }
    Ok(())
}

/// Joins clips in order, interpolating `transition_frames` frames at every
/// boundary instead of cutting hard.
///
/// Panics when `clips` is empty; [`concatenate`] rejects that case before
/// reaching this stage.
pub fn smooth_join(clips: Vec<PoseSequence>, transition_frames: usize) -> PoseSequence {
    let mut iter = clips.into_iter();
    let mut joined = match iter.next() {
        Some(first) => first,
        None => panic!("smooth_join requires at least one clip"),
    };

    for clip in iter {
        if clip.is_empty() {
            continue;
        }
        if let (Some(prev), Some(next)) = (joined.frames.last(), clip.frames.first()) {
            let steps = transition_frames + 1;
            let transition: Vec<Frame> = (1..=transition_frames)
                .map(|step| prev.lerp(next, step as f32 / steps as f32))
                .collect();
            joined.frames.extend(transition);
        }
        joined.frames.extend(clip.frames);
    }
    joined
}

/// Snaps each hand component onto the body's wrist track. Runs after
/// smoothing: blending would drift the hands off the corrected positions
/// again.
pub fn correct_wrists(seq: &mut PoseSequence) -> Result<(), FeatureError> {
    let set = seq.landmark_set().clone();
    for (component, body_wrist) in [
        (LandmarkComponent::LeftHand, "LEFT_WRIST"),
        (LandmarkComponent::RightHand, "RIGHT_WRIST"),
    ] {
        let range = match set.component_range(component) {
            Some(range) => range,
            None => continue,
        };
        let body_index = require(&set, LandmarkComponent::Body, body_wrist)?;
        let hand_index = require(&set, component, "WRIST")?;

        for frame in &mut seq.frames {
            if frame.points[hand_index].confidence <= 0.0 {
                continue;
            }
            let delta =
                frame.points[body_index].position - frame.points[hand_index].position;
            for landmark in &mut frame.points[range.clone()] {
                landmark.position += delta;
            }
        }
    }
    Ok(())
}

fn require(
    set: &crate::pose::LandmarkSet,
    component: LandmarkComponent,
    name: &'static str,
) -> Result<usize, FeatureError> {
    set.index_of(component, name)
        .ok_or(FeatureError::MissingLandmark {
            component: component.name(),
            name,
        })
}
