//! Boundary trimming of waiting frames.
//!
//! Classifier labels for one clip are run-length encoded; the waiting runs
//! touching a trimmed boundary decide how much lead-in and tail-out to drop,
//! keeping `frame_padding` waiting frames as a natural transition. A trim
//! that would remove almost nothing is treated as classifier noise and
//! handed to the confidence-driven fallback instead.

use log::debug;

use crate::classifier::{labels_from_scores, FrameLabel, SignActivityScorer};
use crate::features::{FeatureError, FeatureExtractor};
use crate::pose::{LandmarkComponent, PoseSequence};

/// Waiting frames kept at a trimmed boundary as lead-in/tail-out.
pub const DEFAULT_FRAME_PADDING: usize = 5;

/// Retained spans above this fraction of the clip mean the trim removed
/// almost nothing and is likely spurious.
const MAX_RETAINED_FRACTION: f32 = 0.95;

/// A maximal run of equal labels, with inclusive frame indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelRun {
    pub label: FrameLabel,
    pub first: usize,
    pub last: usize,
}

impl LabelRun {
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }
}

/// Run-length encodes consecutive equal labels.
pub fn label_runs(labels: &[FrameLabel]) -> Vec<LabelRun> {
    let mut runs: Vec<LabelRun> = Vec::new();
    for (index, &label) in labels.iter().enumerate() {
        match runs.last_mut() {
            Some(run) if run.label == label => run.last = index,
            _ => runs.push(LabelRun {
                label,
                first: index,
                last: index,
            }),
        }
    }
    runs
}

/// Which frames of a clip to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimDecision {
    /// Keep the clip untouched.
    Keep,
    /// Retain frames `start..=end`.
    Window { start: usize, end: usize },
    /// The label trim was implausibly small; use the confidence fallback.
    Fallback,
}

/// Decides the trim window for one clip's labels.
///
/// The waiting run at a trimmed boundary is dropped up to `frame_padding`
/// frames; no waiting run at all means no trim. A window retaining more
/// than 95% of the clip is rejected as noise (`Fallback`), and a window
/// that inverts or collapses keeps the clip untouched.
pub fn trim_decision(
    labels: &[FrameLabel],
    trim_start: bool,
    trim_end: bool,
    frame_padding: usize,
) -> TrimDecision {
    let len = labels.len();
    if len <= 1 {
        return TrimDecision::Keep;
    }

    let runs = label_runs(labels);
    if !runs.iter().any(|run| run.label == FrameLabel::Waiting) {
        return TrimDecision::Keep;
    }

    let mut start = 0usize;
    let mut end = len - 1;

    if trim_start {
        if let Some(run) = runs.first().filter(|run| run.label == FrameLabel::Waiting) {
            start = (run.last + 1).saturating_sub(frame_padding);
        }
    }
    if trim_end {
        if let Some(run) = runs.last().filter(|run| run.label == FrameLabel::Waiting) {
            end = (run.first + frame_padding).saturating_sub(1).min(len - 1);
        }
    }

    if end <= start {
        return TrimDecision::Keep;
    }

    let max_retained = (MAX_RETAINED_FRACTION * len as f32).floor() as usize;
    if end - start > max_retained {
        return TrimDecision::Fallback;
    }

    TrimDecision::Window { start, end }
}

/// Options for one clip's trim.
#[derive(Debug, Clone, Copy)]
pub struct TrimOptions {
    pub trim_start: bool,
    pub trim_end: bool,
    pub frame_padding: usize,
}

impl Default for TrimOptions {
    fn default() -> Self {
        Self {
            trim_start: true,
            trim_end: true,
            frame_padding: DEFAULT_FRAME_PADDING,
        }
    }
}

/// Classifies every frame of `seq` and trims its boundaries in place.
pub fn trim_sequence(
    seq: &mut PoseSequence,
    scorer: &dyn SignActivityScorer,
    opts: &TrimOptions,
) -> Result<(), FeatureError> {
    if seq.len() <= 1 {
        return Ok(());
    }

    let extractor = FeatureExtractor::new(seq.landmark_set())?;
    let features = extractor.sequence_features(seq);
    let scores = scorer.score_batch(&features);
    let labels = labels_from_scores(&scores);

    match trim_decision(&labels, opts.trim_start, opts.trim_end, opts.frame_padding) {
        TrimDecision::Keep => {
            debug!(target: "signstitch_core::trim", "Keeping all {} frames", seq.len());
        }
        TrimDecision::Window { start, end } => {
            debug!(
                target: "signstitch_core::trim",
                "Trimming {} frames to window {}..={}",
                seq.len(),
                start,
                end
            );
            seq.retain_frames(start..end + 1);
        }
        TrimDecision::Fallback => {
            debug!(
                target: "signstitch_core::trim",
                "Label trim retained over {}% of {} frames; using confidence fallback",
                (MAX_RETAINED_FRACTION * 100.0) as u32,
                seq.len()
            );
            boundary_trim(seq, opts.trim_start, opts.trim_end);
        }
    }

    Ok(())
}

/// Simple confidence-driven boundary trim: drops leading/trailing frames in
/// which no hand is tracked at all. Used as the fallback when label trimming
/// looks spurious.
pub fn boundary_trim(seq: &mut PoseSequence, trim_start: bool, trim_end: bool) {
    let len = seq.len();
    if len <= 1 {
        return;
    }

    let set = seq.landmark_set().clone();
    let hand_ranges: Vec<std::ops::Range<usize>> =
        [LandmarkComponent::LeftHand, LandmarkComponent::RightHand]
            .iter()
            .filter_map(|&component| set.component_range(component))
            .collect();

    let active = |frame: &crate::pose::Frame| -> bool {
        if hand_ranges.is_empty() {
            frame.points.iter().any(|p| p.confidence > 0.0)
        } else {
            hand_ranges
                .iter()
                .any(|range| frame.points[range.clone()].iter().any(|p| p.confidence > 0.0))
        }
    };

    let first = seq.frames.iter().position(&active);
    let last = seq.frames.iter().rposition(&active);
    let (first, last) = match (first, last) {
        (Some(first), Some(last)) => (first, last),
        _ => return,
    };

    let start = if trim_start { first } else { 0 };
    let end = if trim_end { last } else { len - 1 };
    if end < start {
        return;
    }
    seq.retain_frames(start..end + 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::FrameLabel::{Signing as S, Waiting as W};
    use crate::pose::{Frame, Landmark, LandmarkSet, PoseHeader};

    fn labels(bits: &[u8]) -> Vec<FrameLabel> {
        bits.iter().map(|&b| if b == 1 { S } else { W }).collect()
    }

    #[test]
    fn runs_encode_consecutive_labels() {
        let runs = label_runs(&labels(&[0, 0, 1, 1, 1, 0]));
        assert_eq!(
            runs,
            vec![
                LabelRun { label: W, first: 0, last: 1 },
                LabelRun { label: S, first: 2, last: 4 },
                LabelRun { label: W, first: 5, last: 5 },
            ]
        );
    }

    #[test]
    fn all_signing_is_kept_untouched() {
        let decision = trim_decision(&labels(&[1; 40]), true, true, 0);
        assert_eq!(decision, TrimDecision::Keep);
    }

    #[test]
    fn boundary_runs_define_the_window() {
        let decision = trim_decision(&labels(&[0, 0, 0, 1, 1, 1, 1, 0, 0, 0]), true, true, 0);
        assert_eq!(decision, TrimDecision::Window { start: 3, end: 6 });
    }

    #[test]
    fn padding_keeps_waiting_frames_as_lead_in() {
        let mut bits = vec![0u8; 10];
        bits.extend_from_slice(&[1; 20]);
        let decision = trim_decision(&labels(&bits), true, false, 5);
        assert_eq!(decision, TrimDecision::Window { start: 5, end: 29 });
    }

    #[test]
    fn untrimmed_boundaries_are_left_alone() {
        // Waiting tail exists, but only the start may be trimmed.
        let mut bits = vec![0u8; 10];
        bits.extend_from_slice(&[1; 20]);
        bits.extend_from_slice(&[0; 10]);
        let decision = trim_decision(&labels(&bits), true, false, 0);
        assert_eq!(decision, TrimDecision::Window { start: 10, end: 39 });
    }

    #[test]
    fn lone_mid_clip_waiting_frame_triggers_fallback() {
        // 100 frames whose only waiting run is one frame long: the direct
        // trim would be a near-no-op, so the fallback path must run.
        let mut bits = vec![1u8; 100];
        bits[50] = 0;
        let decision = trim_decision(&labels(&bits), true, true, DEFAULT_FRAME_PADDING);
        assert_eq!(decision, TrimDecision::Fallback);
    }

    #[test]
    fn all_waiting_collapses_to_keep() {
        let decision = trim_decision(&labels(&[0; 30]), true, true, 5);
        assert_eq!(decision, TrimDecision::Keep);
    }

    #[test]
    fn single_frame_clip_is_never_trimmed() {
        assert_eq!(trim_decision(&labels(&[0]), true, true, 0), TrimDecision::Keep);
    }

    fn handed_sequence(confidences: &[f32]) -> PoseSequence {
        let set = LandmarkSet::holistic();
        let frames = confidences
            .iter()
            .map(|&c| {
                let mut points = vec![Landmark::new(0.5, 0.5, 0.0, 1.0); set.len()];
                for range in [
                    set.component_range(LandmarkComponent::LeftHand).unwrap(),
                    set.component_range(LandmarkComponent::RightHand).unwrap(),
                ] {
                    for point in &mut points[range] {
                        point.confidence = c;
                    }
                }
                Frame::new(points)
            })
            .collect();
        PoseSequence::new(PoseHeader::new(set), frames)
    }

    #[test]
    fn fallback_trim_drops_untracked_hand_frames() {
        let mut confidences = vec![0.0; 4];
        confidences.extend_from_slice(&[0.9; 10]);
        confidences.extend_from_slice(&[0.0; 3]);
        let mut seq = handed_sequence(&confidences);
        boundary_trim(&mut seq, true, true);
        assert_eq!(seq.len(), 10);
    }

    #[test]
    fn fallback_trim_respects_boundary_flags() {
        let mut confidences = vec![0.0; 4];
        confidences.extend_from_slice(&[0.9; 10]);
        confidences.extend_from_slice(&[0.0; 3]);
        let mut seq = handed_sequence(&confidences);
        boundary_trim(&mut seq, false, true);
        assert_eq!(seq.len(), 14);
    }
}
