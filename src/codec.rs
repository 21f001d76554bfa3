//! codec — raw-deflate (без zlib-заголовка и трейлера) поверх flate2.
//!
//! - compress: DeflateEncoder с заданным уровнем (0..=9).
//! - decompress: низкоуровневый `Decompress` (raw), чтобы отличать полный поток
//!   (StreamEnd) от обрезанного — read-обёртки flate2 молча возвращают EOF на обрезанном входе.

use flate2::write::DeflateEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use std::io::Write;
use thiserror::Error;

/// Верхняя граница распакованного размера (защита от "deflate-бомб" в мусорных дампах).
pub const MAX_INFLATE_LEN: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DecompressionError(pub String);

/// Compress `bytes` as a raw-deflate stream.
pub fn compress(bytes: &[u8], level: u8) -> std::io::Result<Vec<u8>> {
    let level = Compression::new(u32::from(level.min(9)));
    let mut enc = DeflateEncoder::new(Vec::with_capacity(bytes.len() / 2 + 64), level);
    enc.write_all(bytes)?;
    enc.finish()
}

/// Decompress a raw-deflate stream.
///
/// `expected_raw_len` is only a capacity hint: a length mismatch is the caller's concern
/// (reported, non-fatal). Malformed or truncated streams fail.
pub fn decompress(bytes: &[u8], expected_raw_len: usize) -> Result<Vec<u8>, DecompressionError> {
    let mut d = Decompress::new(false);
    let mut out = Vec::with_capacity(expected_raw_len.clamp(64, MAX_INFLATE_LEN));

    loop {
        if out.len() == out.capacity() {
            if out.len() >= MAX_INFLATE_LEN {
                return Err(DecompressionError(format!(
                    "inflated output exceeds {} bytes",
                    MAX_INFLATE_LEN
                )));
            }
            let grow = out.len().max(4096).min(MAX_INFLATE_LEN - out.len());
            out.reserve_exact(grow);
        }

        let in_before = d.total_in();
        let out_before = d.total_out();
        let consumed = in_before as usize;

        let status = d
            .decompress_vec(&bytes[consumed..], &mut out, FlushDecompress::Finish)
            .map_err(|e| DecompressionError(e.to_string()))?;

        match status {
            Status::StreamEnd => return Ok(out),
            Status::Ok | Status::BufError => {
                let input_done = d.total_in() as usize >= bytes.len();
                let has_room = out.len() < out.capacity();
                if input_done && has_room {
                    return Err(DecompressionError("truncated deflate stream".into()));
                }
                if d.total_in() == in_before && d.total_out() == out_before && has_room {
                    return Err(DecompressionError("deflate stream stalled".into()));
                }
            }
        }
    }
}
