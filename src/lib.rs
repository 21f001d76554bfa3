// Базовые модули
pub mod consts;
pub mod error;
pub mod config;
pub mod metrics;
pub mod util;

// Кодек: CRC, raw-deflate, формат чанка
pub mod checksum;
pub mod codec;
pub mod chunk; // src/chunk/{mod,header,encode,reader,record}.rs

// Восстановление из повреждённых дампов
pub mod scan; // src/scan/{mod,flash,salvage}.rs

// Запись лога узла (ротация + блочный буфер строк)
pub mod lock;
pub mod logger;

// Вывод и тестовые данные
pub mod report;
pub mod fixture;

// Удобные реэкспорты
pub use chunk::{
    read_all, write_chunk, ChunkHeader, ChunkReader, DecodedChunk, StreamEnd, WriteOptions,
};
pub use config::{LogConfig, LogConfigBuilder};
pub use error::ChunkError;
pub use logger::{LineLogger, RotatingLog};
pub use scan::{salvage_buffer, scan, FlashLayout, ScanOptions, ScanReport, Scanner};
