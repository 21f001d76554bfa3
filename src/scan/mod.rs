//! scan — best-effort восстановление чанков из произвольного буфера (сырой дамп раздела).
//!
//! Разделение:
//! - mod.rs     — курсорный поиск magic, проверка кандидата, приём/отклонение.
//! - flash.rs   — склейка payload через заголовки физических страниц flash.
//! - salvage.rs — построчное извлечение JSON-записей из восстановленных байтов.
//!
//! Алгоритм (на каждой итерации курсор строго растёт):
//! 1. найти `MSLG` начиная с курсора; не нашли — конец;
//! 2. разобрать заголовок; magic/версия/размеры вне (0, max_len] — отклонить, курсор = pos + 1;
//! 3. прочитать payload (напрямую или через flash de-interleave); не хватает байт — отклонить;
//! 4. CRC: несовпадение без force — отклонить; с force — принять с crc_valid=false;
//! 5. распаковать; сбой — отклонить даже с force;
//! 6. принять, курсор = pos + data_len (приближение: соседний чанк может быть пропущен).
//!
//! Сканер не завершается на ошибках данных — только по исчерпанию буфера.

use log::{debug, info, warn};
use std::borrow::Cow;

use crate::checksum::{crc32, is_inverted_crc};
use crate::chunk::{ChunkHeader, DecodedChunk, CHUNK_HDR_SIZE, CHUNK_MAGIC_BYTES, MAX_PLAUSIBLE_LEN};
use crate::codec;
use crate::config::LogConfig;
use crate::error::ChunkError;
use crate::metrics::{
    record_chunk_decoded, record_crc_failure, record_decompress_failure, record_scan_candidate,
    record_scan_rejected,
};

pub mod flash;
pub mod salvage;

pub use flash::{deinterleave, interleave, FlashLayout};
pub use salvage::{salvage_buffer, salvage_chunks, salvage_text, SalvageReport, SalvagedLine};

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// Compare stored CRC with the recomputed one.
    pub verify_crc: bool,
    /// Accept CRC-invalid chunks (marked `crc_valid = false`).
    pub force: bool,
    /// De-interleave payloads through flash page headers.
    pub flash: Option<FlashLayout>,
    /// Upper bound for raw_len / data_len.
    pub max_len: u32,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            verify_crc: true,
            force: false,
            flash: None,
            max_len: MAX_PLAUSIBLE_LEN,
        }
    }
}

impl ScanOptions {
    /// Options from config; `flash` selects de-interleaving with the configured page geometry.
    pub fn from_config(cfg: &LogConfig, flash: bool) -> Result<Self, String> {
        Ok(Self {
            verify_crc: cfg.verify_crc,
            force: cfg.force,
            flash: if flash {
                Some(FlashLayout::from_config(cfg)?)
            } else {
                None
            },
            max_len: cfg.max_plausible_len,
        })
    }

    pub fn with_force(mut self, on: bool) -> Self {
        self.force = on;
        self
    }

    pub fn with_flash(mut self, layout: Option<FlashLayout>) -> Self {
        self.flash = layout;
        self
    }
}

/// Счётчики одного прохода сканера.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ScanStats {
    /// Позиции, где найден magic.
    pub candidates: usize,
    pub accepted: usize,
    pub rejected_implausible: usize,
    pub rejected_truncated: usize,
    pub rejected_crc: usize,
    pub rejected_decompress: usize,
    /// Принято в force-режиме несмотря на CRC.
    pub crc_invalid_accepted: usize,
}

impl ScanStats {
    pub fn rejected(&self) -> usize {
        self.rejected_implausible
            + self.rejected_truncated
            + self.rejected_crc
            + self.rejected_decompress
    }
}

/// Cursor-based scanner over an in-memory buffer. Yields accepted chunks in buffer order.
pub struct Scanner<'a> {
    buf: &'a [u8],
    opts: ScanOptions,
    cursor: usize,
    stats: ScanStats,
}

impl<'a> Scanner<'a> {
    pub fn new(buf: &'a [u8], opts: ScanOptions) -> Self {
        Self {
            buf,
            opts,
            cursor: 0,
            stats: ScanStats::default(),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Проверить кандидата на позиции `pos` (magic уже найден).
    fn try_candidate(&self, pos: usize) -> Result<DecodedChunk, ChunkError> {
        let offset = pos as u64;
        let h = ChunkHeader::decode(&self.buf[pos..])?;
        h.check_plausible(offset, self.opts.max_len)?;

        let start = pos + CHUNK_HDR_SIZE;
        let need = h.data_len as usize;
        let stored: Cow<'_, [u8]> = match self.opts.flash {
            Some(layout) => Cow::Owned(deinterleave(self.buf, start, need, layout)),
            None => {
                let end = (start + need).min(self.buf.len());
                Cow::Borrowed(&self.buf[start.min(end)..end])
            }
        };
        if stored.len() < need {
            return Err(ChunkError::TruncatedPayload {
                offset,
                got: stored.len(),
                need,
            });
        }

        let computed = crc32(&stored);
        let crc_valid = computed == h.crc32;
        if !crc_valid {
            record_crc_failure();
            debug!(
                "scan: CRC FAIL at 0x{:08X}: expected=0x{:08X}, computed=0x{:08X}, data_len={}, algo={}",
                pos, h.crc32, computed, h.data_len, h.algo
            );
            if is_inverted_crc(h.crc32, computed) {
                debug!("scan: (matches inverted CRC32) at 0x{:08X}", pos);
            }
            if self.opts.verify_crc && !self.opts.force {
                return Err(ChunkError::CrcMismatch {
                    offset,
                    expected: h.crc32,
                    computed,
                });
            }
        }

        let payload = if h.is_compressed() {
            let p = codec::decompress(&stored, h.raw_len as usize).map_err(|e| {
                record_decompress_failure();
                ChunkError::Decompression { offset, source: e }
            })?;
            if p.len() != h.raw_len as usize {
                warn!(
                    "scan: decompressed size mismatch at 0x{:08X} ({}/{})",
                    pos,
                    p.len(),
                    h.raw_len
                );
            }
            p
        } else {
            stored.into_owned()
        };

        if !crc_valid && self.opts.verify_crc {
            warn!(
                "scan: accepting CRC-invalid chunk at 0x{:08X} (force), {} bytes",
                pos,
                payload.len()
            );
        }

        Ok(DecodedChunk {
            index: 0,
            offset,
            header: h,
            crc_valid,
            payload,
        })
    }

    fn note_rejection(&mut self, e: &ChunkError) {
        record_scan_rejected();
        match e {
            ChunkError::CrcMismatch { .. } => self.stats.rejected_crc += 1,
            ChunkError::Decompression { .. } => self.stats.rejected_decompress += 1,
            e if e.is_plausibility() || matches!(e, ChunkError::InvalidMagic { .. }) => {
                self.stats.rejected_implausible += 1
            }
            _ => self.stats.rejected_truncated += 1,
        }
        debug!("scan: reject candidate: {}", e);
    }
}

impl Iterator for Scanner<'_> {
    type Item = DecodedChunk;

    fn next(&mut self) -> Option<DecodedChunk> {
        loop {
            if self.cursor + CHUNK_HDR_SIZE > self.buf.len() {
                self.cursor = self.cursor.max(self.buf.len());
                return None;
            }
            let pos = match find_magic(self.buf, self.cursor) {
                Some(p) if p + CHUNK_HDR_SIZE <= self.buf.len() => p,
                _ => {
                    self.cursor = self.buf.len();
                    return None;
                }
            };

            self.stats.candidates += 1;
            record_scan_candidate();

            match self.try_candidate(pos) {
                Ok(mut chunk) => {
                    self.stats.accepted += 1;
                    if !chunk.crc_valid {
                        self.stats.crc_invalid_accepted += 1;
                    }
                    chunk.index = self.stats.accepted;
                    record_chunk_decoded(chunk.payload.len());
                    debug!(
                        "scan: chunk {} at offset 0x{:08X}: {} bytes | CRC32: {}",
                        chunk.index,
                        pos,
                        chunk.payload.len(),
                        if chunk.crc_valid { "PASS" } else { "FAIL" }
                    );
                    // data_len > 0 (проверено), значит курсор строго растёт
                    self.cursor = pos + chunk.header.data_len as usize;
                    return Some(chunk);
                }
                Err(e) => {
                    self.note_rejection(&e);
                    self.cursor = pos + 1;
                }
            }
        }
    }
}

/// Найти следующую сигнатуру MSLG начиная с `from`.
pub fn find_magic(buf: &[u8], from: usize) -> Option<usize> {
    if from >= buf.len() {
        return None;
    }
    buf[from..]
        .windows(CHUNK_MAGIC_BYTES.len())
        .position(|w| w == CHUNK_MAGIC_BYTES)
        .map(|i| i + from)
}

/// Итог полного прохода сканера.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub chunks: Vec<DecodedChunk>,
    pub stats: ScanStats,
    pub scanned_bytes: usize,
}

/// Scan the whole buffer eagerly.
pub fn scan(buf: &[u8], opts: ScanOptions) -> ScanReport {
    let mut sc = Scanner::new(buf, opts);
    let chunks: Vec<DecodedChunk> = sc.by_ref().collect();
    let stats = sc.stats().clone();
    info!(
        "scan: {} bytes, {} candidates, {} chunks recovered ({} rejected)",
        buf.len(),
        stats.candidates,
        chunks.len(),
        stats.rejected()
    );
    ScanReport {
        chunks,
        stats,
        scanned_bytes: buf.len(),
    }
}
