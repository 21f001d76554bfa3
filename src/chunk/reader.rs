//! chunk/reader — строгое последовательное чтение чанков из потока.
//!
//! Шаги на каждый чанк:
//!   ReadHeader -> ValidateMagic -> ValidateVersion -> ReadPayload -> VerifyCRC -> Decompress -> Emit
//!
//! Поведение:
//! - 0 байт на месте заголовка — чистый EOF;
//! - неполный заголовок / неверный magic / неполный payload — терминальная ошибка кадрирования
//!   (дальше поток не доверяем);
//! - несовпадение версии — только warn;
//! - CRC mismatch (если проверка включена) и сбой распаковки — чанк пропускается,
//!   чтение продолжается со следующего заголовка.
//!
//! Использование:
//!   let mut rd = ChunkReader::new(file);
//!   for chunk in rd.by_ref() { /* ... */ }
//!   match rd.end() { Some(StreamEnd::Clean) => .., Some(StreamEnd::Fault(e)) => .., None => .. }
//!
//! Последовательность ленивая, конечная и не перезапускаемая.

use log::{debug, error, warn};
use std::io::{ErrorKind, Read};

use crate::checksum::{crc32, is_inverted_crc};
use crate::codec;
use crate::config::LogConfig;
use crate::error::ChunkError;
use crate::metrics::{record_chunk_decoded, record_crc_failure, record_decompress_failure};

use super::{ChunkHeader, DecodedChunk, CHUNK_HDR_SIZE, CHUNK_MAGIC, CHUNK_VERSION, MAX_PLAUSIBLE_LEN};

/// How a sequential pass ended.
#[derive(Debug)]
pub enum StreamEnd {
    /// End of stream exactly on a chunk boundary.
    Clean,
    /// Framing error or I/O error; nothing after this point was parsed.
    Fault(ChunkError),
}

impl StreamEnd {
    pub fn is_clean(&self) -> bool {
        matches!(self, StreamEnd::Clean)
    }

    pub fn error(&self) -> Option<&ChunkError> {
        match self {
            StreamEnd::Clean => None,
            StreamEnd::Fault(e) => Some(e),
        }
    }

    /// I/O failure of the underlying source, as opposed to a format fault.
    pub fn io_error(&self) -> Option<&std::io::Error> {
        match self {
            StreamEnd::Fault(ChunkError::Io(e)) => Some(e),
            _ => None,
        }
    }
}

enum Step {
    Chunk(DecodedChunk),
    Skip(ChunkError),
    End(StreamEnd),
}

pub struct ChunkReader<R> {
    inner: R,
    pos: u64,
    seen: usize,
    verify_crc: bool,
    skipped: Vec<ChunkError>,
    end: Option<StreamEnd>,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pos: 0,
            seen: 0,
            verify_crc: true,
            skipped: Vec::new(),
            end: None,
        }
    }

    pub fn from_config(inner: R, cfg: &LogConfig) -> Self {
        Self::new(inner).with_verify(cfg.verify_crc)
    }

    /// Disable to emit CRC-invalid chunks (marked `crc_valid = false`) instead of skipping them.
    pub fn with_verify(mut self, on: bool) -> Self {
        self.verify_crc = on;
        self
    }

    /// Bytes consumed from the source so far.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Terminal state; `None` while the sequence is not exhausted.
    pub fn end(&self) -> Option<&StreamEnd> {
        self.end.as_ref()
    }

    /// Integrity errors of skipped chunks, in stream order.
    pub fn skipped(&self) -> &[ChunkError] {
        &self.skipped
    }

    fn step(&mut self) -> Step {
        let offset = self.pos;

        // ReadHeader
        let mut hdr = [0u8; CHUNK_HDR_SIZE];
        let got = match read_full(&mut self.inner, &mut hdr) {
            Ok(n) => n,
            Err(e) => return Step::End(StreamEnd::Fault(e.into())),
        };
        self.pos += got as u64;
        if got == 0 {
            debug!("chunk_reader: clean EOF at off={}", offset);
            return Step::End(StreamEnd::Clean);
        }
        if got < CHUNK_HDR_SIZE {
            warn!(
                "chunk_reader: incomplete header at off={} ({}/{} bytes), truncated file?",
                offset, got, CHUNK_HDR_SIZE
            );
            return Step::End(StreamEnd::Fault(ChunkError::TruncatedHeader {
                offset,
                got,
                need: CHUNK_HDR_SIZE,
            }));
        }
        let h = match ChunkHeader::decode(&hdr) {
            Ok(h) => h,
            Err(e) => return Step::End(StreamEnd::Fault(e)),
        };
        self.seen += 1;

        // ValidateMagic
        if !h.magic_ok() {
            error!(
                "chunk_reader: invalid magic 0x{:08X} at chunk {} (off={}), expected 0x{:08X}",
                h.magic, self.seen, offset, CHUNK_MAGIC
            );
            return Step::End(StreamEnd::Fault(ChunkError::InvalidMagic {
                offset,
                found: h.magic,
                expected: CHUNK_MAGIC,
            }));
        }

        // ValidateVersion
        if !h.version_ok() {
            warn!(
                "chunk_reader: chunk {} version {} != expected {}",
                self.seen, h.version, CHUNK_VERSION
            );
        }

        // ReadPayload (через take: битый data_len не должен приводить к гигантской аллокации)
        let need = h.data_len as usize;
        let mut stored = Vec::with_capacity(need.min(MAX_PLAUSIBLE_LEN as usize));
        let got = match read_up_to(&mut self.inner, u64::from(h.data_len), &mut stored) {
            Ok(n) => n,
            Err(e) => return Step::End(StreamEnd::Fault(e.into())),
        };
        self.pos += got as u64;
        if got < need {
            error!(
                "chunk_reader: chunk {} truncated payload ({}/{} bytes) at off={}",
                self.seen, got, need, offset
            );
            return Step::End(StreamEnd::Fault(ChunkError::TruncatedPayload {
                offset,
                got,
                need,
            }));
        }

        // VerifyCRC
        let computed = crc32(&stored);
        let crc_valid = computed == h.crc32;
        if !crc_valid {
            record_crc_failure();
            if is_inverted_crc(h.crc32, computed) {
                debug!("chunk_reader: chunk {} stored CRC matches inverted CRC32", self.seen);
            }
            if self.verify_crc {
                warn!(
                    "chunk_reader: chunk {} CRC32 mismatch at off={}: expected 0x{:08X}, got 0x{:08X}, skipping",
                    self.seen, offset, h.crc32, computed
                );
                return Step::Skip(ChunkError::CrcMismatch {
                    offset,
                    expected: h.crc32,
                    computed,
                });
            }
            debug!(
                "chunk_reader: chunk {} CRC32 mismatch ignored (verification disabled)",
                self.seen
            );
        }

        // Decompress
        let payload = if h.is_compressed() {
            match codec::decompress(&stored, h.raw_len as usize) {
                Ok(p) => {
                    if p.len() != h.raw_len as usize {
                        warn!(
                            "chunk_reader: chunk {} decompressed size mismatch ({}/{})",
                            self.seen,
                            p.len(),
                            h.raw_len
                        );
                    }
                    p
                }
                Err(e) => {
                    record_decompress_failure();
                    warn!(
                        "chunk_reader: chunk {} decompression failed at off={}: {}",
                        self.seen, offset, e
                    );
                    return Step::Skip(ChunkError::Decompression { offset, source: e });
                }
            }
        } else {
            stored
        };

        record_chunk_decoded(payload.len());
        Step::Chunk(DecodedChunk {
            index: self.seen,
            offset,
            header: h,
            crc_valid,
            payload,
        })
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = DecodedChunk;

    fn next(&mut self) -> Option<DecodedChunk> {
        if self.end.is_some() {
            return None;
        }
        loop {
            match self.step() {
                Step::Chunk(c) => return Some(c),
                Step::Skip(e) => self.skipped.push(e),
                Step::End(end) => {
                    self.end = Some(end);
                    return None;
                }
            }
        }
    }
}

/// Итог полного последовательного прохода.
#[derive(Debug)]
pub struct SequentialOutcome {
    pub chunks: Vec<DecodedChunk>,
    pub skipped: Vec<ChunkError>,
    pub end: StreamEnd,
    pub bytes_read: u64,
}

/// Decode a whole stream eagerly.
pub fn read_all<R: Read>(inner: R, verify_crc: bool) -> SequentialOutcome {
    let mut rd = ChunkReader::new(inner).with_verify(verify_crc);
    let chunks: Vec<DecodedChunk> = rd.by_ref().collect();
    SequentialOutcome {
        chunks,
        skipped: std::mem::take(&mut rd.skipped),
        end: rd.end.take().unwrap_or(StreamEnd::Clean),
        bytes_read: rd.pos,
    }
}

// ----------- helpers -----------

/// Читать до заполнения buf или EOF; возвращает число прочитанных байт.
fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut n = 0;
    while n < buf.len() {
        match r.read(&mut buf[n..]) {
            Ok(0) => break,
            Ok(k) => n += k,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(n)
}

fn read_up_to<R: Read>(r: &mut R, limit: u64, out: &mut Vec<u8>) -> std::io::Result<usize> {
    r.by_ref().take(limit).read_to_end(out)
}
