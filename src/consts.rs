//! Общие константы (имена файлов лога, ротация, дефолты писателя и flash-раскладки).
//!
//! Константы самого формата чанка (magic, версия, смещения заголовка) живут в
//! `chunk/mod.rs` и импортируются снаружи как `crate::chunk::*`.

// -------- Log files --------
pub const LOG_FILE: &str = "samples.lz";
pub const LOG_OLD_FILE: &str = "samples_old.lz";
pub const LOG_BACKUP_FILE: &str = "samples_backup.lz";
pub const LOCK_FILE: &str = "LOCK";

// Порог ротации: текущий размер + входящий чанк >= MAX_FILE_SIZE -> rotate
pub const MAX_FILE_SIZE: u64 = 1024 * 1024;

// -------- Writer --------
pub const DEFAULT_COMPRESS_THRESHOLD: usize = 1024;
// Минимальная экономия 1/20 (~5%), иначе храним raw
pub const DEFAULT_MIN_SAVINGS_DIV: usize = 20;
pub const DEFAULT_COMPRESS_LEVEL: u8 = 3;

// -------- Line logger (block buffer) --------
pub const DEFAULT_BLOCK_CAP: usize = 16 * 1024;
pub const DEFAULT_FLUSH_THRESHOLD: usize = 16 * 1024;

// -------- Flash pages (SPIFFS-like) --------
pub const FLASH_PAGE_SIZE: usize = 256;
pub const FLASH_PAGE_HDR_SIZE: usize = 12;

// -------- Node identity --------
// Используется, если MAC недоступен
pub const FALLBACK_NODE_ID: u64 = 0xFFFF_FFFF_FFFF;
