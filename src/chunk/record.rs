//! chunk/record — декодированный чанк (результат reader/scanner) и его JSON-представление.

use serde::Serialize;

use crate::util::{format_node_id, timestamp_iso};

use super::ChunkHeader;

/// One decoded chunk. Transient: owned by whoever requested decoding.
#[derive(Debug, Clone)]
pub struct DecodedChunk {
    /// 1-based ordinal among emitted chunks.
    pub index: usize,
    /// Byte offset of the chunk header in the source.
    pub offset: u64,
    pub header: ChunkHeader,
    /// Recomputed CRC over the stored payload equals `header.crc32`.
    pub crc_valid: bool,
    /// Decoded (decompressed) payload bytes.
    pub payload: Vec<u8>,
}

impl DecodedChunk {
    pub fn node_id(&self) -> String {
        format_node_id(self.header.node_id)
    }

    pub fn timestamp_iso(&self) -> Option<String> {
        timestamp_iso(self.header.timestamp)
    }

    /// Decoded length differs from the recorded `raw_len`.
    pub fn raw_len_mismatch(&self) -> bool {
        self.payload.len() != self.header.raw_len as usize
    }

    pub fn meta(&self) -> ChunkMeta {
        let h = &self.header;
        ChunkMeta {
            chunk: self.index,
            offset: self.offset,
            node_id: self.node_id(),
            timestamp: h.timestamp,
            timestamp_iso: self.timestamp_iso(),
            compression: h.compression_label(),
            level: h.level,
            raw_len: h.raw_len,
            compressed_len: if h.is_compressed() { Some(h.data_len) } else { None },
            crc32: format!("0x{:08X}", h.crc32),
            crc_valid: self.crc_valid,
        }
    }
}

/// Метаданные чанка для вывода (--json / отчёт).
#[derive(Debug, Clone, Serialize)]
pub struct ChunkMeta {
    pub chunk: usize,
    pub offset: u64,
    pub node_id: String,
    pub timestamp: u32,
    pub timestamp_iso: Option<String>,
    pub compression: String,
    pub level: u8,
    pub raw_len: u32,
    pub compressed_len: Option<u32>,
    pub crc32: String,
    pub crc_valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ALGO_DEFLATE, ALGO_RAW};

    #[test]
    fn meta_fields() {
        let c = DecodedChunk {
            index: 3,
            offset: 120,
            header: ChunkHeader::new(ALGO_DEFLATE, 3, 10, 8, 0xAB, 0x1020_BA4D_F03C, 0),
            crc_valid: true,
            payload: b"0123456789".to_vec(),
        };
        let m = c.meta();
        assert_eq!(m.chunk, 3);
        assert_eq!(m.node_id, "10:20:BA:4D:F0:3C");
        assert_eq!(m.compression, "DEFLATE-3");
        assert_eq!(m.compressed_len, Some(8));
        assert_eq!(m.crc32, "0x000000AB");
        assert!(m.timestamp_iso.is_none());
        assert!(!c.raw_len_mismatch());

        let raw = DecodedChunk {
            header: ChunkHeader::new(ALGO_RAW, 0, 11, 10, 0, 0, 0),
            ..c
        };
        assert_eq!(raw.meta().compressed_len, None);
        assert!(raw.raw_len_mismatch());
    }
}
