//! Error taxonomy of the chunk codec.
//!
//! - framing errors (`MalformedHeader`, `TruncatedHeader`, `InvalidMagic`, `TruncatedPayload`)
//!   end a sequential pass;
//! - integrity errors (`CrcMismatch`, `Decompression`) skip one chunk;
//! - plausibility errors (`Implausible`, `UnsupportedVersion`) mean "no chunk here" for the scanner;
//! - `Io` is passed through unchanged.

use thiserror::Error;

use crate::codec::DecompressionError;

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("malformed header: need {need} bytes, got {got}")]
    MalformedHeader { need: usize, got: usize },

    #[error("truncated header at offset {offset} ({got}/{need} bytes)")]
    TruncatedHeader { offset: u64, got: usize, need: usize },

    #[error("invalid magic 0x{found:08X} at offset {offset}, expected 0x{expected:08X}")]
    InvalidMagic { offset: u64, found: u32, expected: u32 },

    #[error("truncated payload at offset {offset} ({got}/{need} bytes)")]
    TruncatedPayload { offset: u64, got: usize, need: usize },

    #[error("CRC32 mismatch at offset {offset}: expected 0x{expected:08X}, computed 0x{computed:08X}")]
    CrcMismatch { offset: u64, expected: u32, computed: u32 },

    #[error("decompression failed at offset {offset}: {source}")]
    Decompression {
        offset: u64,
        #[source]
        source: DecompressionError,
    },

    #[error("implausible {field}={value} at offset {offset}")]
    Implausible { offset: u64, field: &'static str, value: u32 },

    #[error("unsupported version {found} at offset {offset} (supported {supported})")]
    UnsupportedVersion { offset: u64, found: u16, supported: u16 },

    #[error("payload too large for a chunk: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ChunkError {
    /// Ошибка кадрирования: дальнейший последовательный разбор потока невозможен.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            ChunkError::MalformedHeader { .. }
                | ChunkError::TruncatedHeader { .. }
                | ChunkError::InvalidMagic { .. }
                | ChunkError::TruncatedPayload { .. }
        )
    }

    /// Ошибка целостности одного чанка: чанк пропускается, разбор продолжается.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            ChunkError::CrcMismatch { .. } | ChunkError::Decompression { .. }
        )
    }

    pub fn is_plausibility(&self) -> bool {
        matches!(
            self,
            ChunkError::Implausible { .. } | ChunkError::UnsupportedVersion { .. }
        )
    }

    /// Byte offset the error refers to, if any.
    pub fn offset(&self) -> Option<u64> {
        match self {
            ChunkError::TruncatedHeader { offset, .. }
            | ChunkError::InvalidMagic { offset, .. }
            | ChunkError::TruncatedPayload { offset, .. }
            | ChunkError::CrcMismatch { offset, .. }
            | ChunkError::Decompression { offset, .. }
            | ChunkError::Implausible { offset, .. }
            | ChunkError::UnsupportedVersion { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}
