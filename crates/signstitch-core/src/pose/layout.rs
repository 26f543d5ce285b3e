use std::sync::Mutex;
use std::time::SystemTime;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coordinates stored per landmark (x, y, z, confidence).
pub const COORDS_PER_LANDMARK: usize = 4;
/// Little-endian f32 per coordinate.
pub const BYTES_PER_COORD: usize = 4;

/// Buffers smaller than this cannot hold a header plus a useful frame run.
const MIN_BUFFER_BYTES: usize = 1024;

/// Errors that can occur while recovering a raw file layout
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("buffer too small to hold frame data ({0} bytes)")]
    BufferTooSmall(usize),

    #[error("no header offset yields whole float32 frames")]
    NotFound,
}

/// How to slice a raw byte buffer into frames. Computed once per file,
/// immutable once found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFileLayout {
    /// Byte offset where frame data begins.
    pub offset: usize,
    /// Number of whole frames past the offset.
    pub frame_count: usize,
    /// Landmarks per frame.
    pub landmark_count: usize,
    /// Trailing pad bytes after the last frame.
    pub pad: usize,
    /// Total buffer size the layout was recovered from.
    pub size: usize,
    /// Bytes occupied by one frame.
    pub frame_bytes: usize,
}

/// Search parameters for the offset scan.
///
/// The reference offset is an empirical fit to one capture pipeline's header
/// size, not a property of the format; confirm it against representative
/// files before trusting scans from a different pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanParams {
    /// Landmarks per frame in the buffer being scanned.
    pub landmarks: usize,
    /// Preferred header offset; the candidate closest to it wins.
    pub reference_offset: usize,
    /// Upper bound on the header size considered by the scan.
    pub max_header_bytes: usize,
    /// Minimum frame count for a candidate layout to be plausible.
    pub min_frames: usize,
}

impl ScanParams {
    pub const DEFAULT_REFERENCE_OFFSET: usize = 14_652;
    pub const DEFAULT_MAX_HEADER_BYTES: usize = 200_000;
    pub const DEFAULT_MIN_FRAMES: usize = 10;

    pub fn new(landmarks: usize) -> Self {
        Self {
            landmarks,
            reference_offset: Self::DEFAULT_REFERENCE_OFFSET,
            max_header_bytes: Self::DEFAULT_MAX_HEADER_BYTES,
            min_frames: Self::DEFAULT_MIN_FRAMES,
        }
    }

    pub fn with_reference_offset(mut self, reference_offset: usize) -> Self {
        self.reference_offset = reference_offset;
        self
    }

    pub fn frame_bytes(&self) -> usize {
        self.landmarks * COORDS_PER_LANDMARK * BYTES_PER_COORD
    }
}

impl RawFileLayout {
    /// Recovers the byte layout of an undocumented pose buffer purely from
    /// its size.
    ///
    /// Candidate header offsets in `[0, min(size, max_header_bytes))` are
    /// tried against trailing pads of 0 to 3 bytes; a candidate is valid
    /// when the remainder divides into whole frames and yields at least
    /// `min_frames` of them. Among valid candidates the offset closest to
    /// `reference_offset` wins, first found breaking ties, and the search
    /// stops at the first pad value that produced any candidate.
    pub fn scan(size: usize, params: &ScanParams) -> Result<RawFileLayout, LayoutError> {
        if size < MIN_BUFFER_BYTES {
            return Err(LayoutError::BufferTooSmall(size));
        }

        let frame_bytes = params.frame_bytes();
        let scan_end = size.min(params.max_header_bytes);

        let mut best: Option<RawFileLayout> = None;
        let mut best_score = usize::MAX;

        for pad in 0..=3usize {
            for off in 0..scan_end {
                if off + pad >= size {
                    break;
                }
                let remain = size - off - pad;
                if remain % frame_bytes != 0 {
                    continue;
                }
                let frame_count = remain / frame_bytes;
                if frame_count < params.min_frames {
                    continue;
                }
                let score = off.abs_diff(params.reference_offset);
                if score < best_score {
                    best_score = score;
                    best = Some(RawFileLayout {
                        offset: off,
                        frame_count,
                        landmark_count: params.landmarks,
                        pad,
                        size,
                        frame_bytes,
                    });
                }
            }
            if best.is_some() {
                break;
            }
        }

        match best {
            Some(layout) => {
                debug!(
                    target: "signstitch_core::layout",
                    "Recovered layout: offset={} frames={} pad={} ({} bytes)",
                    layout.offset, layout.frame_count, layout.pad, layout.size
                );
                Ok(layout)
            }
            None => Err(LayoutError::NotFound),
        }
    }
}

/// Identity of a file on disk, used to key the layout cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIdentity {
    pub len: u64,
    pub modified: SystemTime,
}

/// Single-entry cache of recovered layouts.
///
/// Holds at most one entry; scanning a different file replaces it. The
/// read-check-insert sequence is serialized so workers sharing one cache
/// instance never observe a half-updated entry.
#[derive(Debug, Default)]
pub struct LayoutCache {
    entry: Mutex<Option<(FileIdentity, RawFileLayout)>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached layout for `identity`, scanning and replacing the
    /// cache entry on a miss.
    pub fn scan_cached(
        &self,
        identity: FileIdentity,
        params: &ScanParams,
    ) -> Result<RawFileLayout, LayoutError> {
        let mut entry = self.entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((cached_id, layout)) = entry.as_ref() {
            if *cached_id == identity && layout.landmark_count == params.landmarks {
                debug!(target: "signstitch_core::layout", "Layout cache hit ({} bytes)", identity.len);
                return Ok(layout.clone());
            }
        }

        let layout = RawFileLayout::scan(identity.len as usize, params)?;
        *entry = Some((identity, layout.clone()));
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn params(landmarks: usize, reference: usize) -> ScanParams {
        ScanParams::new(landmarks).with_reference_offset(reference)
    }

    #[test]
    fn recovers_header_length_preferred_by_reference() {
        // 100-byte header + 12 frames of 5 landmarks (80 bytes each).
        let size = 100 + 12 * 80;
        let layout = RawFileLayout::scan(size, &params(5, 100)).unwrap();
        assert_eq!(layout.offset, 100);
        assert_eq!(layout.frame_count, 12);
        assert_eq!(layout.pad, 0);
        assert_eq!(layout.frame_bytes, 80);
    }

    #[test]
    fn tie_break_prefers_first_candidate() {
        // Candidates sit at offsets 20, 100, 180, ...; reference 60 is
        // equidistant from 20 and 100, so the earlier offset wins.
        let size = 100 + 12 * 80;
        let layout = RawFileLayout::scan(size, &params(5, 60)).unwrap();
        assert_eq!(layout.offset, 20);
        assert_eq!(layout.frame_count, 13);
    }

    #[test]
    fn rejects_small_buffers() {
        assert_eq!(
            RawFileLayout::scan(1023, &params(5, 0)),
            Err(LayoutError::BufferTooSmall(1023))
        );
    }

    #[test]
    fn fails_when_no_candidate_reaches_minimum_frames() {
        // 50 landmarks need 800 bytes per frame; 1500 bytes cannot hold the
        // 10-frame plausibility floor at any offset.
        assert_eq!(
            RawFileLayout::scan(1500, &params(50, 0)),
            Err(LayoutError::NotFound)
        );
    }

    #[test]
    fn cache_hits_for_unmodified_identity_and_replaces_on_change() {
        let cache = LayoutCache::new();
        let p = params(5, 100);
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let id_a = FileIdentity {
            len: (100 + 12 * 80) as u64,
            modified: now,
        };

        let first = cache.scan_cached(id_a, &p).unwrap();
        let second = cache.scan_cached(id_a, &p).unwrap();
        assert_eq!(first, second);

        // Touching the file invalidates the single entry.
        let id_b = FileIdentity {
            len: id_a.len,
            modified: now + Duration::from_secs(5),
        };
        let third = cache.scan_cached(id_b, &p).unwrap();
        assert_eq!(first, third);
        {
            let entry = cache.entry.lock().unwrap();
            let (cached_id, _) = entry.as_ref().unwrap();
            assert_eq!(*cached_id, id_b);
        }
    }
}
