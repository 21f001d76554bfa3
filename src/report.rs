//! report — сводка по декодированным чанкам и JSON-представление показаний.

use serde::Serialize;
use serde_json::Value;

use crate::chunk::DecodedChunk;

/// Totals over a set of decoded chunks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChunkSummary {
    pub total_chunks: usize,
    pub raw_bytes: u64,
    /// Sum of data_len over compressed chunks only.
    pub compressed_bytes: u64,
    pub compressed_chunks: usize,
    pub crc_pass: usize,
    pub crc_fail: usize,
    /// Chunks dropped by the reader (CRC/decompress) or rejected by the scanner.
    pub skipped: usize,
    pub verified: bool,
}

impl ChunkSummary {
    pub fn from_chunks(chunks: &[DecodedChunk], skipped: usize, verified: bool) -> Self {
        let mut s = ChunkSummary {
            skipped,
            verified,
            ..Default::default()
        };
        for c in chunks {
            s.total_chunks += 1;
            s.raw_bytes += u64::from(c.header.raw_len);
            if c.header.is_compressed() {
                s.compressed_chunks += 1;
                s.compressed_bytes += u64::from(c.header.data_len);
            }
            if c.crc_valid {
                s.crc_pass += 1;
            } else {
                s.crc_fail += 1;
            }
        }
        s
    }

    /// compressed / raw in percent; `None` if nothing was compressed.
    pub fn compressed_pct(&self) -> Option<f64> {
        if self.compressed_bytes == 0 || self.raw_bytes == 0 {
            None
        } else {
            Some(self.compressed_bytes as f64 * 100.0 / self.raw_bytes as f64)
        }
    }

    /// Человекочитаемые строки сводки.
    pub fn lines(&self) -> Vec<String> {
        let mut out = vec![
            "=== Summary ===".to_string(),
            format!("Total chunks: {}", self.total_chunks),
            format!("Total raw data: {} bytes", self.raw_bytes),
        ];
        if let Some(pct) = self.compressed_pct() {
            out.push(format!(
                "Total compressed: {} bytes ({:.1}%)",
                self.compressed_bytes, pct
            ));
        }
        if self.verified {
            out.push(format!(
                "CRC32 validation: {}/{} PASS",
                self.crc_pass, self.total_chunks
            ));
        }
        if self.skipped > 0 {
            out.push(format!("Skipped: {}", self.skipped));
        }
        out
    }

    pub fn print(&self) {
        for l in self.lines() {
            eprintln!("{}", l);
        }
    }
}

/// Payload of one chunk parsed as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct SensorView {
    pub chunk: usize,
    pub node_id: String,
    pub timestamp: Option<String>,
    pub sensors: Value,
}

impl SensorView {
    /// `None` if the payload is not UTF-8 JSON.
    pub fn from_chunk(c: &DecodedChunk) -> Option<Self> {
        let text = std::str::from_utf8(&c.payload).ok()?;
        let sensors: Value = serde_json::from_str(text).ok()?;
        Some(Self {
            chunk: c.index,
            node_id: c.node_id(),
            timestamp: c.timestamp_iso(),
            sensors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkHeader, ALGO_DEFLATE, ALGO_RAW};

    fn chunk(index: usize, algo: u8, raw: u32, data: u32, ok: bool, payload: &[u8]) -> DecodedChunk {
        DecodedChunk {
            index,
            offset: 0,
            header: ChunkHeader::new(algo, 0, raw, data, 0, 0x1020_BA4D_F03C, 1_700_000_000),
            crc_valid: ok,
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn totals() {
        let cs = vec![
            chunk(1, ALGO_RAW, 100, 100, true, b"x"),
            chunk(2, ALGO_DEFLATE, 1000, 250, true, b"x"),
            chunk(3, ALGO_RAW, 10, 10, false, b"x"),
        ];
        let s = ChunkSummary::from_chunks(&cs, 2, true);
        assert_eq!(s.total_chunks, 3);
        assert_eq!(s.raw_bytes, 1110);
        assert_eq!(s.compressed_bytes, 250);
        assert_eq!((s.crc_pass, s.crc_fail), (2, 1));
        assert!(s.lines().iter().any(|l| l == "CRC32 validation: 2/3 PASS"));
        assert!(ChunkSummary::default().compressed_pct().is_none());
    }

    #[test]
    fn sensor_view_only_for_json() {
        let v = SensorView::from_chunk(&chunk(4, ALGO_RAW, 7, 7, true, b"{\"a\":1}")).unwrap();
        assert_eq!(v.chunk, 4);
        assert_eq!(v.sensors["a"], 1);
        assert_eq!(v.timestamp.as_deref(), Some("2023-11-14T22:13:20Z"));
        assert!(SensorView::from_chunk(&chunk(5, ALGO_RAW, 2, 2, true, &[0xFF, 0x00])).is_none());
    }
}
