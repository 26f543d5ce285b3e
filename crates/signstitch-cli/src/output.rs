use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use signstitch_core::pose::PoseSequence;
use uuid::Uuid;

use crate::errors::{RenderError, Result};
use crate::store::validate_filename;

/// External video-encoding capability: rasterizes a sequence and writes an
/// encoded video file. Rendering internals stay behind this seam.
pub trait VideoEncoder {
    fn encode(&self, seq: &PoseSequence, path: &Path, fps: f32) -> Result<()>;
}

/// Resolved output paths for one render request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    /// Encoded video destination.
    pub video_path: PathBuf,
    /// Concatenated pose artifact written alongside the video.
    pub pose_path: PathBuf,
}

impl ExportTarget {
    /// Resolves a requested output name under the output directory,
    /// generating a collision-free name when none was given.
    ///
    /// Requested names are validated like store filenames; anything that
    /// would escape the output directory is rejected.
    pub fn resolve(output_dir: &Path, requested: Option<&str>) -> Result<ExportTarget> {
        let name = match requested {
            Some(name) => {
                validate_filename(name)
                    .map_err(|_| RenderError::InvalidOutputTarget(name.to_string()))?;
                name.trim().to_string()
            }
            None => format!("{}.mp4", Uuid::new_v4()),
        };

        std::fs::create_dir_all(output_dir)?;
        let video_path = output_dir.join(&name);
        let pose_path = video_path.with_extension("pose");
        debug!(
            target: "signstitch_cli::output",
            "Export target: {}",
            video_path.display()
        );
        Ok(ExportTarget {
            video_path,
            pose_path,
        })
    }
}

/// One rendered clip's contribution to the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipReport {
    pub word: String,
    pub pose_filename: String,
    pub frames: usize,
}

/// Complete render output in JSON format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderReport {
    pub words: Vec<String>,
    pub clips: Vec<ClipReport>,
    pub output_frames: usize,
    pub output_width: u16,
    pub output_height: u16,
    pub pose_path: String,
    pub video_path: Option<String>,
    pub rendered_at: String,
}

/// Word-resolution output for the `resolve` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveReport {
    pub found: bool,
    pub source: Option<String>,
    pub files: Vec<ResolvedFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedFile {
    pub word: String,
    pub category: Option<String>,
    pub pose_filename: String,
    pub file_exists_on_disk: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_are_unique_videos() {
        let dir = tempfile::tempdir().unwrap();
        let a = ExportTarget::resolve(dir.path(), None).unwrap();
        let b = ExportTarget::resolve(dir.path(), None).unwrap();
        assert_ne!(a.video_path, b.video_path);
        assert_eq!(a.video_path.extension().unwrap(), "mp4");
        assert_eq!(a.pose_path.extension().unwrap(), "pose");
    }

    #[test]
    fn requested_names_stay_under_the_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = ExportTarget::resolve(dir.path(), Some("sentence.mp4")).unwrap();
        assert_eq!(target.video_path, dir.path().join("sentence.mp4"));

        for name in ["../escape.mp4", "/abs.mp4", ""] {
            assert!(
                matches!(
                    ExportTarget::resolve(dir.path(), Some(name)),
                    Err(RenderError::InvalidOutputTarget(_))
                ),
                "expected rejection for {name:?}"
            );
        }
    }
}
