//! scan/salvage — построчное извлечение JSON-записей, когда кадрирование чанков не спасти.
//!
//! Кандидат — строка (разделитель '\n'), которая после trim начинается с '{' и кончается '}'.
//! Каждый кандидат валидируется serde_json независимо; невалидные молча отбрасываются.

use log::{debug, info};
use serde::Serialize;
use serde_json::Value;

use crate::chunk::DecodedChunk;
use crate::metrics::record_lines_salvaged;

use super::{scan, ScanOptions};

/// One recovered record with its provenance.
#[derive(Debug, Clone, Serialize)]
pub struct SalvagedLine {
    /// Index of the chunk it came from; `None` for the raw-buffer fallback.
    pub chunk: Option<usize>,
    pub offset: Option<u64>,
    pub crc_valid: Option<bool>,
    pub value: Value,
}

#[derive(Debug, Clone, Default)]
pub struct SalvageReport {
    pub lines: Vec<SalvagedLine>,
    pub chunks_examined: usize,
    /// Nothing chunk-shaped was found; lines come from the whole buffer.
    pub raw_fallback: bool,
}

/// Extract parseable `{...}` lines from arbitrary bytes (invalid UTF-8 is replaced).
pub fn salvage_text(bytes: &[u8]) -> Vec<Value> {
    let text = String::from_utf8_lossy(bytes);
    let mut out = Vec::new();
    for line in text.split('\n') {
        let line = line.trim();
        if line.len() < 2 || !line.starts_with('{') || !line.ends_with('}') {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(v) => out.push(v),
            Err(e) => debug!("salvage: drop candidate line ({} B): {}", line.len(), e),
        }
    }
    out
}

/// Salvage lines from already decoded chunks, CRC-invalid ones included.
pub fn salvage_chunks(chunks: &[DecodedChunk]) -> Vec<SalvagedLine> {
    let mut out = Vec::new();
    for c in chunks {
        for value in salvage_text(&c.payload) {
            out.push(SalvagedLine {
                chunk: Some(c.index),
                offset: Some(c.offset),
                crc_valid: Some(c.crc_valid),
                value,
            });
        }
    }
    record_lines_salvaged(out.len());
    out
}

/// Scan `buf` in force mode and salvage lines from every recovered chunk.
/// Falls back to the whole buffer as text when no chunk is recovered.
pub fn salvage_buffer(buf: &[u8], opts: ScanOptions) -> SalvageReport {
    let report = scan(buf, opts.with_force(true));
    if !report.chunks.is_empty() {
        let lines = salvage_chunks(&report.chunks);
        info!(
            "salvage: {} lines from {} chunks",
            lines.len(),
            report.chunks.len()
        );
        return SalvageReport {
            lines,
            chunks_examined: report.chunks.len(),
            raw_fallback: false,
        };
    }

    let lines: Vec<SalvagedLine> = salvage_text(buf)
        .into_iter()
        .map(|value| SalvagedLine {
            chunk: None,
            offset: None,
            crc_valid: None,
            value,
        })
        .collect();
    record_lines_salvaged(lines.len());
    info!("salvage: no chunks recovered, {} lines from raw buffer", lines.len());
    SalvageReport {
        lines,
        chunks_examined: 0,
        raw_fallback: true,
    }
}
