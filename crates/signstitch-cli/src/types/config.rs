use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use signstitch_core::concat::ConcatOptions;
use signstitch_core::pose::layout::ScanParams;

use crate::errors::Result;

/// Configuration for sentence rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Directory holding the per-word pose clip files
    #[serde(default = "default_pose_dir")]
    pub pose_dir: PathBuf,
    /// Directory rendered artifacts are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Optional CSV lexicon mapping words to pose filenames
    #[serde(default)]
    pub lexicon: Option<PathBuf>,
    /// Playback rate for exported video
    #[serde(default = "default_fps")]
    pub fps: f32,
    /// Offset scan tuning
    #[serde(default)]
    pub scan: ScanConfig,
    /// Concatenation tuning
    #[serde(default)]
    pub concat: ConcatConfig,
}

fn default_pose_dir() -> PathBuf {
    PathBuf::from("./poses")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./signstitch-output")
}

fn default_fps() -> f32 {
    24.0
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pose_dir: default_pose_dir(),
            output_dir: default_output_dir(),
            lexicon: None,
            fps: default_fps(),
            scan: ScanConfig::default(),
            concat: ConcatConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Loads a YAML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: RenderConfig = serde_yaml::from_str(&contents)?;
        Ok(config)
    }
}

/// Offset-scan parameters for raw clip buffers.
///
/// The reference offset is an empirical fit to one capture pipeline; files
/// from a different pipeline should override it here rather than trust the
/// default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_landmarks")]
    pub landmarks: usize,
    #[serde(default = "default_reference_offset")]
    pub reference_offset: usize,
    #[serde(default = "default_max_header_bytes")]
    pub max_header_bytes: usize,
    #[serde(default = "default_min_frames")]
    pub min_frames: usize,
}

fn default_landmarks() -> usize {
    75
}

fn default_reference_offset() -> usize {
    ScanParams::DEFAULT_REFERENCE_OFFSET
}

fn default_max_header_bytes() -> usize {
    ScanParams::DEFAULT_MAX_HEADER_BYTES
}

fn default_min_frames() -> usize {
    ScanParams::DEFAULT_MIN_FRAMES
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            landmarks: default_landmarks(),
            reference_offset: default_reference_offset(),
            max_header_bytes: default_max_header_bytes(),
            min_frames: default_min_frames(),
        }
    }
}

impl ScanConfig {
    pub fn params(&self) -> ScanParams {
        ScanParams {
            landmarks: self.landmarks,
            reference_offset: self.reference_offset,
            max_header_bytes: self.max_header_bytes,
            min_frames: self.min_frames,
        }
    }
}

/// Concatenation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcatConfig {
    #[serde(default = "default_frame_padding")]
    pub frame_padding: usize,
    #[serde(default = "default_transition_frames")]
    pub transition_frames: usize,
    #[serde(default = "default_shift")]
    pub shift: f32,
    #[serde(default = "default_target_width")]
    pub target_width: u32,
}

fn default_frame_padding() -> usize {
    ConcatOptions::default().frame_padding
}

fn default_transition_frames() -> usize {
    ConcatOptions::default().transition_frames
}

fn default_shift() -> f32 {
    ConcatOptions::default().shift
}

fn default_target_width() -> u32 {
    ConcatOptions::default().target_width
}

impl Default for ConcatConfig {
    fn default() -> Self {
        let opts = ConcatOptions::default();
        Self {
            frame_padding: opts.frame_padding,
            transition_frames: opts.transition_frames,
            shift: opts.shift,
            target_width: opts.target_width,
        }
    }
}

impl ConcatConfig {
    pub fn options(&self) -> ConcatOptions {
        ConcatOptions {
            frame_padding: self.frame_padding,
            transition_frames: self.transition_frames,
            shift: self.shift,
            target_width: self.target_width,
        }
    }
}
