use byteorder::{ByteOrder, LittleEndian};

use crate::error::ChunkError;

use super::{
    ALGO_DEFLATE, ALGO_RAW, CHUNK_HDR_SIZE, CHUNK_MAGIC, CHUNK_VERSION,
    OFF_ALGO, OFF_CRC32, OFF_DATA_LEN, OFF_LEVEL, OFF_MAGIC, OFF_NODE_ID, OFF_RAW_LEN,
    OFF_RESERVED, OFF_TIMESTAMP, OFF_VERSION,
};

/// Заголовок чанка MSLG (36 байт на диске).
///
/// decode() не валидирует поля: проверки magic/версии/размеров делают
/// reader и scanner, каждый со своей политикой.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub magic: u32,
    pub version: u16,
    pub algo: u8,  // 0=raw, 1=raw-deflate
    pub level: u8, // информативно
    pub raw_len: u32,
    pub data_len: u32,
    pub crc32: u32,
    pub node_id: u64,
    pub timestamp: u32, // 0 = нет времени
    pub reserved: u32,
}

impl ChunkHeader {
    /// Header for a freshly written chunk (current magic/version, reserved = 0).
    pub fn new(
        algo: u8,
        level: u8,
        raw_len: u32,
        data_len: u32,
        crc32: u32,
        node_id: u64,
        timestamp: u32,
    ) -> Self {
        Self {
            magic: CHUNK_MAGIC,
            version: CHUNK_VERSION,
            algo,
            level,
            raw_len,
            data_len,
            crc32,
            node_id,
            timestamp,
            reserved: 0,
        }
    }

    pub fn encode(&self) -> [u8; CHUNK_HDR_SIZE] {
        let mut hdr = [0u8; CHUNK_HDR_SIZE];
        LittleEndian::write_u32(&mut hdr[OFF_MAGIC..OFF_MAGIC + 4], self.magic);
        LittleEndian::write_u16(&mut hdr[OFF_VERSION..OFF_VERSION + 2], self.version);
        hdr[OFF_ALGO] = self.algo;
        hdr[OFF_LEVEL] = self.level;
        LittleEndian::write_u32(&mut hdr[OFF_RAW_LEN..OFF_RAW_LEN + 4], self.raw_len);
        LittleEndian::write_u32(&mut hdr[OFF_DATA_LEN..OFF_DATA_LEN + 4], self.data_len);
        LittleEndian::write_u32(&mut hdr[OFF_CRC32..OFF_CRC32 + 4], self.crc32);
        LittleEndian::write_u64(&mut hdr[OFF_NODE_ID..OFF_NODE_ID + 8], self.node_id);
        LittleEndian::write_u32(&mut hdr[OFF_TIMESTAMP..OFF_TIMESTAMP + 4], self.timestamp);
        LittleEndian::write_u32(&mut hdr[OFF_RESERVED..OFF_RESERVED + 4], self.reserved);
        hdr
    }

    /// Разобрать первые CHUNK_HDR_SIZE байт буфера. Короче — MalformedHeader.
    pub fn decode(buf: &[u8]) -> Result<Self, ChunkError> {
        if buf.len() < CHUNK_HDR_SIZE {
            return Err(ChunkError::MalformedHeader {
                need: CHUNK_HDR_SIZE,
                got: buf.len(),
            });
        }
        Ok(Self {
            magic: LittleEndian::read_u32(&buf[OFF_MAGIC..OFF_MAGIC + 4]),
            version: LittleEndian::read_u16(&buf[OFF_VERSION..OFF_VERSION + 2]),
            algo: buf[OFF_ALGO],
            level: buf[OFF_LEVEL],
            raw_len: LittleEndian::read_u32(&buf[OFF_RAW_LEN..OFF_RAW_LEN + 4]),
            data_len: LittleEndian::read_u32(&buf[OFF_DATA_LEN..OFF_DATA_LEN + 4]),
            crc32: LittleEndian::read_u32(&buf[OFF_CRC32..OFF_CRC32 + 4]),
            node_id: LittleEndian::read_u64(&buf[OFF_NODE_ID..OFF_NODE_ID + 8]),
            timestamp: LittleEndian::read_u32(&buf[OFF_TIMESTAMP..OFF_TIMESTAMP + 4]),
            reserved: LittleEndian::read_u32(&buf[OFF_RESERVED..OFF_RESERVED + 4]),
        })
    }

    #[inline]
    pub fn magic_ok(&self) -> bool {
        self.magic == CHUNK_MAGIC
    }

    #[inline]
    pub fn version_ok(&self) -> bool {
        self.version == CHUNK_VERSION
    }

    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.algo == ALGO_DEFLATE
    }

    /// Full on-disk size of the chunk (header + stored payload).
    #[inline]
    pub fn total_len(&self) -> u64 {
        CHUNK_HDR_SIZE as u64 + u64::from(self.data_len)
    }

    /// "RAW" или "DEFLATE-<level>"; неизвестный algo — "ALGO-<n>".
    pub fn compression_label(&self) -> String {
        match self.algo {
            ALGO_RAW => "RAW".to_string(),
            ALGO_DEFLATE => format!("DEFLATE-{}", self.level),
            other => format!("ALGO-{}", other),
        }
    }

    /// Проверка правдоподобия для сканера: magic, версия, размеры в (0, max_len].
    /// `offset` — позиция кандидата (только для отчёта об ошибке).
    pub fn check_plausible(&self, offset: u64, max_len: u32) -> Result<(), ChunkError> {
        if !self.magic_ok() {
            return Err(ChunkError::InvalidMagic {
                offset,
                found: self.magic,
                expected: CHUNK_MAGIC,
            });
        }
        if !self.version_ok() {
            return Err(ChunkError::UnsupportedVersion {
                offset,
                found: self.version,
                supported: CHUNK_VERSION,
            });
        }
        if self.data_len == 0 || self.data_len > max_len {
            return Err(ChunkError::Implausible {
                offset,
                field: "data_len",
                value: self.data_len,
            });
        }
        if self.raw_len == 0 || self.raw_len > max_len {
            return Err(ChunkError::Implausible {
                offset,
                field: "raw_len",
                value: self.raw_len,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::MAX_PLAUSIBLE_LEN;

    fn sample() -> ChunkHeader {
        ChunkHeader {
            magic: CHUNK_MAGIC,
            version: CHUNK_VERSION,
            algo: ALGO_DEFLATE,
            level: 3,
            raw_len: 0x0102_0304,
            data_len: 0x0A0B_0C0D,
            crc32: 0xDEAD_BEEF,
            node_id: 0x1020_BA4D_F03C,
            timestamp: 1_700_000_000,
            reserved: 0x5555_AAAA,
        }
    }

    #[test]
    fn literal_layout() {
        let h = sample();
        let b = h.encode();
        assert_eq!(&b[0..4], b"GLSM"); // 0x4D534C47 LE
        assert_eq!(&b[4..6], &[2, 0]);
        assert_eq!(b[6], 1);
        assert_eq!(b[7], 3);
        assert_eq!(&b[8..12], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&b[12..16], &[0x0D, 0x0C, 0x0B, 0x0A]);
        assert_eq!(&b[16..20], &[0xEF, 0xBE, 0xAD, 0xDE]);
        assert_eq!(&b[20..28], &[0x3C, 0xF0, 0x4D, 0xBA, 0x20, 0x10, 0, 0]);
        assert_eq!(&b[32..36], &[0xAA, 0xAA, 0x55, 0x55]);
    }

    #[test]
    fn decode_inverts_encode() {
        let h = sample();
        assert_eq!(ChunkHeader::decode(&h.encode()).unwrap(), h);

        // лишние байты после заголовка игнорируются
        let mut long = h.encode().to_vec();
        long.extend_from_slice(b"payload");
        assert_eq!(ChunkHeader::decode(&long).unwrap(), h);
    }

    #[test]
    fn short_buffer_is_malformed() {
        let h = sample().encode();
        match ChunkHeader::decode(&h[..35]) {
            Err(ChunkError::MalformedHeader { need, got }) => {
                assert_eq!(need, 36);
                assert_eq!(got, 35);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn plausibility_bounds() {
        let mut h = ChunkHeader::new(ALGO_RAW, 0, 10, 10, 0, 0, 0);
        assert!(h.check_plausible(0, MAX_PLAUSIBLE_LEN).is_ok());

        h.data_len = 0;
        assert!(h.check_plausible(0, MAX_PLAUSIBLE_LEN).is_err());

        h.data_len = MAX_PLAUSIBLE_LEN;
        h.raw_len = MAX_PLAUSIBLE_LEN;
        assert!(h.check_plausible(0, MAX_PLAUSIBLE_LEN).is_ok());

        h.raw_len = MAX_PLAUSIBLE_LEN + 1;
        assert!(matches!(
            h.check_plausible(5, MAX_PLAUSIBLE_LEN),
            Err(ChunkError::Implausible { field: "raw_len", offset: 5, .. })
        ));

        let mut v = ChunkHeader::new(ALGO_RAW, 0, 10, 10, 0, 0, 0);
        v.version = 1;
        assert!(matches!(
            v.check_plausible(0, MAX_PLAUSIBLE_LEN),
            Err(ChunkError::UnsupportedVersion { found: 1, .. })
        ));
    }

    #[test]
    fn labels() {
        assert_eq!(ChunkHeader::new(ALGO_RAW, 0, 1, 1, 0, 0, 0).compression_label(), "RAW");
        assert_eq!(
            ChunkHeader::new(ALGO_DEFLATE, 3, 1, 1, 0, 0, 0).compression_label(),
            "DEFLATE-3"
        );
    }
}
