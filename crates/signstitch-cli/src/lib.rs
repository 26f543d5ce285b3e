pub mod errors;
pub mod lexicon;
pub mod output;
pub mod scorer;
pub mod store;
pub mod types;

use std::sync::Arc;

use log::info;
use signstitch_core::classifier::SignActivityScorer;
use signstitch_core::concat::concatenate;
use signstitch_core::pose::codec;
use signstitch_core::pose::layout::{LayoutCache, RawFileLayout};
use signstitch_core::pose::{LandmarkSet, PoseSequence};

use crate::errors::{RenderError, Result};
use crate::lexicon::{CsvLexicon, GlossEntry, GlossLookup};
use crate::output::{
    ClipReport, ExportTarget, RenderReport, ResolveReport, ResolvedFile, VideoEncoder,
};
use crate::scorer::RestPoseScorer;
use crate::store::PoseStore;
use crate::types::RenderConfig;

/// Canvas width sequences are rescaled back to before export.
const DISPLAY_WIDTH: f32 = 256.0;

/// Sentence renderer that turns an ordered word list into one continuous
/// pose sequence and its exported artifacts.
pub struct SentenceRenderer {
    config: RenderConfig,
    store: PoseStore,
    lexicon: Option<CsvLexicon>,
    layout_cache: LayoutCache,
    landmark_set: Arc<LandmarkSet>,
    scorer: Box<dyn SignActivityScorer>,
    encoder: Option<Box<dyn VideoEncoder>>,
}

impl SentenceRenderer {
    pub fn new(config: RenderConfig) -> Result<Self> {
        let store = PoseStore::new(&config.pose_dir);
        let lexicon = match &config.lexicon {
            Some(path) => Some(CsvLexicon::load(path)?),
            None => None,
        };
        Ok(Self {
            store,
            lexicon,
            layout_cache: LayoutCache::new(),
            landmark_set: LandmarkSet::holistic(),
            scorer: Box::new(RestPoseScorer::default()),
            encoder: None,
            config,
        })
    }

    /// Replaces the default activity scorer with an external classifier.
    pub fn with_scorer(mut self, scorer: Box<dyn SignActivityScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Attaches a video encoder; without one only the pose artifact is
    /// written.
    pub fn with_encoder(mut self, encoder: Box<dyn VideoEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Resolves a word to its clip entries: lexicon first, then the disk
    /// fallback probing for a file literally named `"{word}.pose"`.
    pub fn resolve_word(&self, word: &str) -> Result<(&'static str, Vec<GlossEntry>)> {
        let word = word.trim();
        if word.is_empty() {
            return Err(RenderError::WordNotFound(word.to_string()));
        }

        if let Some(lexicon) = &self.lexicon {
            let entries = lexicon.lookup(word)?;
            if !entries.is_empty() {
                return Ok(("lexicon", entries));
            }
        }

        let fallback = format!("{word}.pose");
        if self.store.exists(&fallback) {
            return Ok((
                "disk_fallback",
                vec![GlossEntry {
                    word: word.to_string(),
                    category: None,
                    pose_filename: fallback,
                }],
            ));
        }

        Err(RenderError::WordNotFound(word.to_string()))
    }

    /// Resolution report for the `resolve` command; a missing word is a
    /// `found: false` report, not an error.
    pub fn resolve_report(&self, word: &str) -> Result<ResolveReport> {
        match self.resolve_word(word) {
            Ok((source, entries)) => Ok(ResolveReport {
                found: true,
                source: Some(source.to_string()),
                files: entries
                    .into_iter()
                    .map(|entry| ResolvedFile {
                        file_exists_on_disk: self.store.exists(&entry.pose_filename),
                        word: entry.word,
                        category: entry.category,
                        pose_filename: entry.pose_filename,
                    })
                    .collect(),
            }),
            Err(RenderError::WordNotFound(_)) => Ok(ResolveReport {
                found: false,
                source: None,
                files: Vec::new(),
            }),
            Err(other) => Err(other),
        }
    }

    /// Recovered byte layout for a clip file, cached by file identity.
    pub fn clip_layout(&self, filename: &str) -> Result<RawFileLayout> {
        let identity = self.store.identity(filename)?;
        Ok(self
            .layout_cache
            .scan_cached(identity, &self.config.scan.params())?)
    }

    /// Loads and decodes one clip. Native containers decode through their
    /// recorded header; foreign buffers go through the cached offset scan.
    pub fn load_clip(&self, filename: &str) -> Result<PoseSequence> {
        let bytes = self.store.read(filename)?;
        if codec::is_native(&bytes) {
            return Ok(codec::decode_native(&bytes, &self.landmark_set)?);
        }
        let identity = self.store.identity(filename)?;
        let layout = self
            .layout_cache
            .scan_cached(identity, &self.config.scan.params())?;
        Ok(codec::decode_frames(&bytes, &layout, &self.landmark_set)?)
    }

    /// Renders a sentence: resolves every word in order, concatenates the
    /// clips, and writes the artifacts. Any single failure aborts the whole
    /// request.
    pub fn render_sentence(
        &self,
        words: &[String],
        output_name: Option<&str>,
    ) -> Result<RenderReport> {
        info!(
            target: "signstitch_cli",
            "Rendering sentence of {} words",
            words.len()
        );

        let mut clips = Vec::with_capacity(words.len());
        let mut clip_reports = Vec::with_capacity(words.len());
        for word in words {
            let (_, entries) = self.resolve_word(word)?;
            let entry = &entries[0];
            let clip = self.load_clip(&entry.pose_filename)?;
            info!(
                target: "signstitch_cli",
                "Loaded clip '{}' ({} frames)",
                entry.pose_filename,
                clip.len()
            );
            clip_reports.push(ClipReport {
                word: entry.word.clone(),
                pose_filename: entry.pose_filename.clone(),
                frames: clip.len(),
            });
            clips.push(clip);
        }

        let mut sentence =
            concatenate(clips, self.scorer.as_ref(), &self.config.concat.options())?;
        sentence.header.fps = self.config.fps;
        rescale_display(&mut sentence);

        let target = ExportTarget::resolve(&self.config.output_dir, output_name)?;
        std::fs::write(&target.pose_path, codec::encode(&sentence))?;
        info!(
            target: "signstitch_cli",
            "Wrote pose artifact {} ({} frames)",
            target.pose_path.display(),
            sentence.len()
        );

        let video_path = match &self.encoder {
            Some(encoder) => {
                encoder.encode(&sentence, &target.video_path, self.config.fps)?;
                Some(target.video_path.display().to_string())
            }
            None => None,
        };

        Ok(RenderReport {
            words: words.to_vec(),
            clips: clip_reports,
            output_frames: sentence.len(),
            output_width: sentence.header.width,
            output_height: sentence.header.height,
            pose_path: target.pose_path.display().to_string(),
            video_path,
            rendered_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

/// Scales the concatenated sequence back to the display canvas the export
/// collaborators expect.
fn rescale_display(seq: &mut PoseSequence) {
    let factor = seq.header.width as f32 / DISPLAY_WIDTH;
    if factor > 0.0 {
        seq.header.width = (seq.header.width as f32 / factor) as u16;
        seq.header.height = (seq.header.height as f32 / factor) as u16;
        seq.divide_coords(factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use signstitch_core::features::FrameFeatureVector;
    use signstitch_core::pose::{Frame, Landmark, PoseHeader};

    struct AlwaysSigning;

    impl SignActivityScorer for AlwaysSigning {
        fn score_batch(&self, frames: &[FrameFeatureVector]) -> Vec<f32> {
            vec![1.0; frames.len()]
        }
    }

    struct RecordingEncoder {
        calls: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl VideoEncoder for RecordingEncoder {
        fn encode(&self, _seq: &PoseSequence, path: &Path, _fps: f32) -> Result<()> {
            self.calls.lock().unwrap().push(path.to_path_buf());
            std::fs::write(path, b"video")?;
            Ok(())
        }
    }

    fn write_native_clip(dir: &Path, name: &str, frames: usize) {
        let set = LandmarkSet::holistic();
        let frame = Frame::new(
            (0..set.len())
                .map(|i| Landmark::new(0.4 + i as f32 * 0.001, 0.5, 0.0, 1.0))
                .collect(),
        );
        let seq = PoseSequence::new(PoseHeader::new(set), vec![frame; frames]);
        std::fs::write(dir.join(name), codec::encode(&seq)).unwrap();
    }

    fn test_config(pose_dir: &Path, output_dir: &Path) -> RenderConfig {
        RenderConfig {
            pose_dir: pose_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            ..RenderConfig::default()
        }
    }

    #[test]
    fn disk_fallback_resolves_word_named_files() {
        let dir = tempfile::tempdir().unwrap();
        write_native_clip(dir.path(), "hello.pose", 12);

        let renderer =
            SentenceRenderer::new(test_config(dir.path(), dir.path())).unwrap();
        let (source, entries) = renderer.resolve_word("hello").unwrap();
        assert_eq!(source, "disk_fallback");
        assert_eq!(entries[0].pose_filename, "hello.pose");

        assert!(matches!(
            renderer.resolve_word("unknown"),
            Err(RenderError::WordNotFound(_))
        ));
    }

    #[test]
    fn resolve_report_marks_missing_words_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let renderer =
            SentenceRenderer::new(test_config(dir.path(), dir.path())).unwrap();
        let report = renderer.resolve_report("unknown").unwrap();
        assert!(!report.found);
        assert!(report.files.is_empty());
    }

    #[test]
    fn renders_a_two_word_sentence_to_artifacts() {
        let poses = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_native_clip(poses.path(), "hello.pose", 15);
        write_native_clip(poses.path(), "world.pose", 15);

        let calls = Arc::new(Mutex::new(Vec::new()));
        let renderer = SentenceRenderer::new(test_config(poses.path(), out.path()))
            .unwrap()
            .with_scorer(Box::new(AlwaysSigning))
            .with_encoder(Box::new(RecordingEncoder {
                calls: calls.clone(),
            }));

        let words = vec!["hello".to_string(), "world".to_string()];
        let report = renderer
            .render_sentence(&words, Some("sentence.mp4"))
            .unwrap();

        assert_eq!(report.clips.len(), 2);
        assert_eq!(report.clips[0].frames, 15);
        // All frames signing: nothing trimmed, one smoothed transition.
        assert_eq!(report.output_frames, 15 + 8 + 15);
        assert_eq!(report.output_width, 256);

        let pose_path = PathBuf::from(&report.pose_path);
        assert!(pose_path.is_file());
        assert_eq!(calls.lock().unwrap().len(), 1);
        assert_eq!(report.video_path.as_deref(), Some(
            out.path().join("sentence.mp4").display().to_string().as_str()
        ));
    }

    #[test]
    fn render_aborts_when_any_word_is_missing() {
        let poses = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_native_clip(poses.path(), "hello.pose", 15);

        let renderer = SentenceRenderer::new(test_config(poses.path(), out.path()))
            .unwrap()
            .with_scorer(Box::new(AlwaysSigning));

        let words = vec!["hello".to_string(), "missing".to_string()];
        assert!(matches!(
            renderer.render_sentence(&words, None),
            Err(RenderError::WordNotFound(_))
        ));
        // No partial artifacts appear in the output directory.
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }
}
