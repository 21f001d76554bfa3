//! Lightweight global metrics for mslog.
//!
//! Потокобезопасные атомарные счётчики для подсистем:
//! - Writer (чанки/байты, ротации файла)
//! - Reader / Scanner (декодировано, CRC/распаковка, отклонённые кандидаты)
//! - Salvage (восстановленные строки)

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

// ----- Writer -----
static CHUNKS_WRITTEN: AtomicU64 = AtomicU64::new(0);
static BYTES_WRITTEN: AtomicU64 = AtomicU64::new(0);
static LOG_ROTATIONS: AtomicU64 = AtomicU64::new(0);

// ----- Decode -----
static CHUNKS_DECODED: AtomicU64 = AtomicU64::new(0);
static BYTES_DECODED: AtomicU64 = AtomicU64::new(0);
static CRC_FAILURES: AtomicU64 = AtomicU64::new(0);
static DECOMPRESS_FAILURES: AtomicU64 = AtomicU64::new(0);

// ----- Scanner -----
static SCAN_CANDIDATES: AtomicU64 = AtomicU64::new(0);
static SCAN_REJECTED: AtomicU64 = AtomicU64::new(0);

// ----- Salvage -----
static LINES_SALVAGED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub chunks_written: u64,
    pub bytes_written: u64,
    pub log_rotations: u64,

    pub chunks_decoded: u64,
    pub bytes_decoded: u64,
    pub crc_failures: u64,
    pub decompress_failures: u64,

    pub scan_candidates: u64,
    pub scan_rejected: u64,

    pub lines_salvaged: u64,
}

impl MetricsSnapshot {
    /// Доля кандидатов (позиций с magic), отвергнутых сканером.
    pub fn scan_reject_ratio(&self) -> f64 {
        if self.scan_candidates == 0 {
            0.0
        } else {
            self.scan_rejected as f64 / self.scan_candidates as f64
        }
    }
}

// ----- Recorders (Writer) -----
pub fn record_chunk_written(total_len: usize) {
    CHUNKS_WRITTEN.fetch_add(1, Ordering::Relaxed);
    BYTES_WRITTEN.fetch_add(total_len as u64, Ordering::Relaxed);
}

pub fn record_log_rotation() {
    LOG_ROTATIONS.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Decode) -----
pub fn record_chunk_decoded(payload_len: usize) {
    CHUNKS_DECODED.fetch_add(1, Ordering::Relaxed);
    BYTES_DECODED.fetch_add(payload_len as u64, Ordering::Relaxed);
}

pub fn record_crc_failure() {
    CRC_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_decompress_failure() {
    DECOMPRESS_FAILURES.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Scanner) -----
pub fn record_scan_candidate() {
    SCAN_CANDIDATES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_scan_rejected() {
    SCAN_REJECTED.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Salvage) -----
pub fn record_lines_salvaged(n: usize) {
    LINES_SALVAGED.fetch_add(n as u64, Ordering::Relaxed);
}

// ----- Snapshot / Reset -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        chunks_written: CHUNKS_WRITTEN.load(Ordering::Relaxed),
        bytes_written: BYTES_WRITTEN.load(Ordering::Relaxed),
        log_rotations: LOG_ROTATIONS.load(Ordering::Relaxed),

        chunks_decoded: CHUNKS_DECODED.load(Ordering::Relaxed),
        bytes_decoded: BYTES_DECODED.load(Ordering::Relaxed),
        crc_failures: CRC_FAILURES.load(Ordering::Relaxed),
        decompress_failures: DECOMPRESS_FAILURES.load(Ordering::Relaxed),

        scan_candidates: SCAN_CANDIDATES.load(Ordering::Relaxed),
        scan_rejected: SCAN_REJECTED.load(Ordering::Relaxed),

        lines_salvaged: LINES_SALVAGED.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    CHUNKS_WRITTEN.store(0, Ordering::Relaxed);
    BYTES_WRITTEN.store(0, Ordering::Relaxed);
    LOG_ROTATIONS.store(0, Ordering::Relaxed);

    CHUNKS_DECODED.store(0, Ordering::Relaxed);
    BYTES_DECODED.store(0, Ordering::Relaxed);
    CRC_FAILURES.store(0, Ordering::Relaxed);
    DECOMPRESS_FAILURES.store(0, Ordering::Relaxed);

    SCAN_CANDIDATES.store(0, Ordering::Relaxed);
    SCAN_REJECTED.store(0, Ordering::Relaxed);

    LINES_SALVAGED.store(0, Ordering::Relaxed);
}
