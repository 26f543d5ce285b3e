//! Encoding and decoding of pose sequences.
//!
//! Native files carry an explicit header recording the layout, so decoding
//! them never depends on the offset scan. Foreign buffers (capture pipelines
//! that never recorded their layout) go through [`RawFileLayout::scan`]
//! instead.

use std::sync::Arc;

use log::debug;
use thiserror::Error;

use crate::pose::layout::{LayoutError, RawFileLayout, ScanParams};
use crate::pose::{Frame, Landmark, LandmarkSet, PoseHeader, PoseSequence};

const POSE_MAGIC: &[u8; 8] = b"SGSTPOSE";
const POSE_VERSION: u16 = 1;
const NATIVE_HEADER_LEN: usize = 24;

/// Errors that can occur while encoding or decoding pose buffers
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("pose container header is invalid")]
    InvalidHeader,

    #[error("unsupported pose container version {0}")]
    UnsupportedVersion(u16),

    #[error("layout carries {layout} landmarks but the set has {set}")]
    LandmarkCountMismatch { layout: usize, set: usize },

    #[error("buffer ends inside frame data (need {needed} bytes, have {have})")]
    Truncated { needed: usize, have: usize },

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Decodes the frame region described by `layout` from a raw buffer.
///
/// Frames are stored back-to-back past the header as `landmarks × 4` little
/// endian f32 values (x, y, z, confidence per landmark).
pub fn decode_frames(
    buf: &[u8],
    layout: &RawFileLayout,
    set: &Arc<LandmarkSet>,
) -> Result<PoseSequence, CodecError> {
    if layout.landmark_count != set.len() {
        return Err(CodecError::LandmarkCountMismatch {
            layout: layout.landmark_count,
            set: set.len(),
        });
    }

    let needed = layout.offset + layout.frame_count * layout.frame_bytes;
    if buf.len() < needed {
        return Err(CodecError::Truncated {
            needed,
            have: buf.len(),
        });
    }

    let mut frames = Vec::with_capacity(layout.frame_count);
    let mut cursor = layout.offset;
    for _ in 0..layout.frame_count {
        let mut points = Vec::with_capacity(set.len());
        for _ in 0..set.len() {
            let x = read_f32(buf, cursor);
            let y = read_f32(buf, cursor + 4);
            let z = read_f32(buf, cursor + 8);
            let confidence = read_f32(buf, cursor + 12);
            points.push(Landmark::new(x, y, z, confidence));
            cursor += 16;
        }
        frames.push(Frame::new(points));
    }

    debug!(
        target: "signstitch_core::codec",
        "Decoded {} frames of {} landmarks at offset {}",
        layout.frame_count, layout.landmark_count, layout.offset
    );

    Ok(PoseSequence::new(PoseHeader::new(set.clone()), frames))
}

/// True when the buffer starts with the native container header.
pub fn is_native(buf: &[u8]) -> bool {
    buf.len() >= NATIVE_HEADER_LEN && &buf[..POSE_MAGIC.len()] == POSE_MAGIC
}

/// Decodes a pose buffer, trying the native container header first and
/// falling back to the offset scan for foreign buffers.
pub fn decode(
    buf: &[u8],
    set: &Arc<LandmarkSet>,
    params: &ScanParams,
) -> Result<PoseSequence, CodecError> {
    if is_native(buf) {
        return decode_native(buf, set);
    }
    let layout = RawFileLayout::scan(buf.len(), params)?;
    decode_frames(buf, &layout, set)
}

/// Decodes a native container produced by [`encode`].
pub fn decode_native(buf: &[u8], set: &Arc<LandmarkSet>) -> Result<PoseSequence, CodecError> {
    if buf.len() < NATIVE_HEADER_LEN || &buf[..POSE_MAGIC.len()] != POSE_MAGIC {
        return Err(CodecError::InvalidHeader);
    }

    let version = read_u16(buf, 8);
    if version != POSE_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let width = read_u16(buf, 10);
    let height = read_u16(buf, 12);
    let landmark_count = read_u16(buf, 14) as usize;
    let frame_count = read_u32(buf, 16) as usize;
    let fps = read_f32(buf, 20);

    let frame_bytes = landmark_count * 16;
    let layout = RawFileLayout {
        offset: NATIVE_HEADER_LEN,
        frame_count,
        landmark_count,
        pad: 0,
        size: buf.len(),
        frame_bytes,
    };

    let mut seq = decode_frames(buf, &layout, set)?;
    seq.header.width = width;
    seq.header.height = height;
    seq.header.fps = fps;
    Ok(seq)
}

/// Encodes a sequence into the native container: a fixed header followed by
/// the same raw frame layout the offset scanner understands.
pub fn encode(seq: &PoseSequence) -> Vec<u8> {
    let set = seq.landmark_set();
    let mut buf = Vec::with_capacity(NATIVE_HEADER_LEN + seq.len() * set.len() * 16);

    buf.extend_from_slice(POSE_MAGIC);
    buf.extend_from_slice(&POSE_VERSION.to_le_bytes());
    buf.extend_from_slice(&seq.header.width.to_le_bytes());
    buf.extend_from_slice(&seq.header.height.to_le_bytes());
    buf.extend_from_slice(&(set.len() as u16).to_le_bytes());
    buf.extend_from_slice(&(seq.len() as u32).to_le_bytes());
    buf.extend_from_slice(&seq.header.fps.to_le_bytes());

    for frame in &seq.frames {
        for landmark in &frame.points {
            buf.extend_from_slice(&landmark.position.x.to_le_bytes());
            buf.extend_from_slice(&landmark.position.y.to_le_bytes());
            buf.extend_from_slice(&landmark.position.z.to_le_bytes());
            buf.extend_from_slice(&landmark.confidence.to_le_bytes());
        }
    }

    buf
}

fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn read_f32(buf: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sequence(frames: usize) -> PoseSequence {
        let set = LandmarkSet::body();
        let frames = (0..frames)
            .map(|i| {
                Frame::new(
                    (0..set.len())
                        .map(|p| {
                            Landmark::new(
                                i as f32 + p as f32 * 0.001,
                                0.5 - p as f32 * 0.002,
                                -0.1 * i as f32,
                                0.9,
                            )
                        })
                        .collect(),
                )
            })
            .collect();
        let header = PoseHeader::new(set).with_dimensions(640, 480);
        PoseSequence::new(header, frames)
    }

    #[test]
    fn native_round_trip_is_bit_exact() {
        let seq = sample_sequence(12);
        let bytes = encode(&seq);
        let decoded = decode_native(&bytes, seq.landmark_set()).unwrap();
        assert_eq!(decoded, seq);
        assert_eq!(decoded.header.width, 640);
        assert_eq!(decoded.header.height, 480);
    }

    #[test]
    fn decode_uses_native_header_without_scanning() {
        let seq = sample_sequence(12);
        let bytes = encode(&seq);
        // Scan parameters that could never describe this buffer; the native
        // header must win before the scanner runs.
        let params = ScanParams::new(999);
        let decoded = decode(&bytes, seq.landmark_set(), &params).unwrap();
        assert_eq!(decoded.len(), 12);
    }

    #[test]
    fn decode_falls_back_to_scan_for_headerless_buffers() {
        let seq = sample_sequence(12);
        let native = encode(&seq);
        // Strip the native header, leaving bare frames.
        let bare = &native[NATIVE_HEADER_LEN..];
        assert!(bare.len() >= 1024);

        let params = ScanParams::new(33).with_reference_offset(0);
        let decoded = decode(bare, seq.landmark_set(), &params).unwrap();
        assert_eq!(decoded.len(), 12);
        assert_eq!(decoded.frames, seq.frames);
    }

    #[test]
    fn rejects_unknown_version() {
        let seq = sample_sequence(10);
        let mut bytes = encode(&seq);
        bytes[8] = 9;
        assert!(matches!(
            decode_native(&bytes, seq.landmark_set()),
            Err(CodecError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn rejects_landmark_set_mismatch() {
        let seq = sample_sequence(10);
        let bytes = encode(&seq);
        let holistic = LandmarkSet::holistic();
        assert!(matches!(
            decode_native(&bytes, &holistic),
            Err(CodecError::LandmarkCountMismatch { layout: 33, set: 75 })
        ));
    }

    #[test]
    fn rejects_truncated_frame_data() {
        let seq = sample_sequence(10);
        let mut bytes = encode(&seq);
        bytes.truncate(bytes.len() - 8);
        assert!(matches!(
            decode_native(&bytes, seq.landmark_set()),
            Err(CodecError::Truncated { .. })
        ));
    }
}
