//! Формат чанка лога MSLG v2 — модульная версия.
//!
//! Разделение:
//! - header.rs — фиксированный 36-байтовый заголовок (pack/unpack, проверки правдоподобия).
//! - encode.rs — писатель: решение raw/deflate, CRC по сохранённым байтам, запись кадра.
//! - reader.rs — строгий последовательный разбор потока (fail-fast на кадрировании).
//! - record.rs — декодированный чанк и его JSON-представление.
//!
//! Лог — конкатенация кадров [header][payload] без разделителей и без индекса.
//!
//! Раскладка заголовка (LE):
//! ```text
//! 0  u32 magic = 0x4D534C47 ('MSLG')
//! 4  u16 version = 2
//! 6  u8  algo (0=raw, 1=raw-deflate)
//! 7  u8  level
//! 8  u32 raw_len
//! 12 u32 data_len
//! 16 u32 crc32 (stored payload)
//! 20 u64 node_id
//! 28 u32 timestamp
//! 32 u32 reserved
//! ```

// -------------------- Публичные константы формата --------------------

pub const CHUNK_MAGIC: u32 = 0x4D53_4C47;
pub const CHUNK_MAGIC_BYTES: [u8; 4] = CHUNK_MAGIC.to_le_bytes();
pub const CHUNK_VERSION: u16 = 2;
pub const CHUNK_HDR_SIZE: usize = 36;

// Offsets внутри заголовка
pub const OFF_MAGIC: usize = 0;
pub const OFF_VERSION: usize = 4;
pub const OFF_ALGO: usize = 6;
pub const OFF_LEVEL: usize = 7;
pub const OFF_RAW_LEN: usize = 8;
pub const OFF_DATA_LEN: usize = 12;
pub const OFF_CRC32: usize = 16;
pub const OFF_NODE_ID: usize = 20;
pub const OFF_TIMESTAMP: usize = 28;
pub const OFF_RESERVED: usize = 32;

// Кодирование payload
pub const ALGO_RAW: u8 = 0;
pub const ALGO_DEFLATE: u8 = 1;

// raw_len/data_len вне (0, 1 MiB] — "здесь не чанк" для сканера
pub const MAX_PLAUSIBLE_LEN: u32 = 1024 * 1024;

// -------------------- Подмодули и re-export --------------------

pub mod header;
pub mod encode;
pub mod reader;
pub mod record;

pub use encode::{encode_chunk, write_chunk, EncodedChunk, WriteOptions};
pub use header::ChunkHeader;
pub use reader::{read_all, ChunkReader, SequentialOutcome, StreamEnd};
pub use record::{ChunkMeta, DecodedChunk};
