//! chunk/encode — писатель чанков.
//!
//! Что здесь:
//! - encode_chunk: решение raw/deflate + CRC по сохранённым байтам + заголовок.
//! - write_chunk: записать [header][stored] в writer по текущей позиции (без seek).
//!
//! Правило компрессии:
//! - payload короче compress_threshold — всегда raw;
//! - сжатый вариант принимается только если
//!   `compressed + CHUNK_HDR_SIZE < raw - raw / min_savings_div` (div=20 -> ~5%);
//! - сбой компрессора — не ошибка, пишем raw.

use log::{debug, warn};
use std::borrow::Cow;
use std::io::Write;

use crate::checksum::crc32;
use crate::codec;
use crate::config::LogConfig;
use crate::consts::{DEFAULT_COMPRESS_LEVEL, DEFAULT_COMPRESS_THRESHOLD, DEFAULT_MIN_SAVINGS_DIV};
use crate::error::ChunkError;
use crate::metrics::record_chunk_written;

use super::{ChunkHeader, ALGO_DEFLATE, ALGO_RAW, CHUNK_HDR_SIZE};

#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// Payloads shorter than this are never compressed.
    pub compress_threshold: usize,
    /// Required saving is `raw_len / min_savings_div` bytes (20 => 5%).
    pub min_savings_div: usize,
    pub level: u8,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compress_threshold: DEFAULT_COMPRESS_THRESHOLD,
            min_savings_div: DEFAULT_MIN_SAVINGS_DIV,
            level: DEFAULT_COMPRESS_LEVEL,
        }
    }
}

impl From<&LogConfig> for WriteOptions {
    fn from(cfg: &LogConfig) -> Self {
        Self {
            compress_threshold: cfg.compress_threshold,
            min_savings_div: cfg.min_savings_div,
            level: cfg.compress_level,
        }
    }
}

impl WriteOptions {
    /// Never compress (firmware flush path with compression disabled).
    pub fn raw_only() -> Self {
        Self {
            compress_threshold: usize::MAX,
            ..Self::default()
        }
    }
}

/// Чанк, готовый к записи: заголовок + сохранённые байты (raw — без копии).
#[derive(Debug, Clone)]
pub struct EncodedChunk<'a> {
    pub header: ChunkHeader,
    pub stored: Cow<'a, [u8]>,
}

impl EncodedChunk<'_> {
    pub fn total_len(&self) -> usize {
        CHUNK_HDR_SIZE + self.stored.len()
    }

    /// Header and payload as one contiguous buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.total_len());
        out.extend_from_slice(&self.header.encode());
        out.extend_from_slice(&self.stored);
        out
    }
}

/// Окупается ли сжатие: compressed + header < raw - raw/div.
#[inline]
pub fn compression_pays_off(raw_len: usize, compressed_len: usize, min_savings_div: usize) -> bool {
    let div = min_savings_div.max(1);
    compressed_len + CHUNK_HDR_SIZE < raw_len - raw_len / div
}

/// Построить чанк для payload. Ошибка только если payload не влезает в поле u32.
pub fn encode_chunk<'a>(
    payload: &'a [u8],
    node_id: u64,
    timestamp: u32,
    opts: &WriteOptions,
) -> Result<EncodedChunk<'a>, ChunkError> {
    if payload.len() > u32::MAX as usize {
        return Err(ChunkError::PayloadTooLarge {
            len: payload.len(),
            max: u64::from(u32::MAX),
        });
    }
    let raw_len = payload.len() as u32;

    let mut compressed: Option<Vec<u8>> = None;
    if payload.len() >= opts.compress_threshold {
        match codec::compress(payload, opts.level) {
            Ok(c) if compression_pays_off(payload.len(), c.len(), opts.min_savings_div) => {
                compressed = Some(c);
            }
            Ok(c) => {
                debug!(
                    "encode_chunk: deflate {} -> {} bytes does not pay off, storing raw",
                    payload.len(),
                    c.len()
                );
            }
            Err(e) => {
                warn!("encode_chunk: deflate failed ({}), storing raw", e);
            }
        }
    }

    let (algo, level, stored) = match compressed {
        Some(c) => (ALGO_DEFLATE, opts.level.min(9), Cow::Owned(c)),
        None => (ALGO_RAW, 0, Cow::Borrowed(payload)),
    };

    let header = ChunkHeader::new(
        algo,
        level,
        raw_len,
        stored.len() as u32,
        crc32(&stored),
        node_id,
        timestamp,
    );
    Ok(EncodedChunk { header, stored })
}

/// Записать один чанк [header][stored] в текущую позицию writer'а.
/// Ошибки writer'а возвращаются как есть (ChunkError::Io).
pub fn write_chunk<W: Write>(
    writer: &mut W,
    payload: &[u8],
    node_id: u64,
    timestamp: u32,
    opts: &WriteOptions,
) -> Result<ChunkHeader, ChunkError> {
    let chunk = encode_chunk(payload, node_id, timestamp, opts)?;
    writer.write_all(&chunk.header.encode())?;
    if !chunk.stored.is_empty() {
        writer.write_all(&chunk.stored)?;
    }
    record_chunk_written(chunk.total_len());

    if chunk.header.is_compressed() {
        debug!(
            "chunk written: {} {} -> {} bytes ({:.1}%) | CRC32=0x{:08X}",
            chunk.header.compression_label(),
            chunk.header.raw_len,
            chunk.header.data_len,
            100.0 * chunk.header.data_len as f64 / chunk.header.raw_len.max(1) as f64,
            chunk.header.crc32
        );
    } else {
        debug!(
            "chunk written: RAW {} bytes | CRC32=0x{:08X}",
            chunk.header.raw_len, chunk.header.crc32
        );
    }
    Ok(chunk.header)
}
