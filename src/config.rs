//! Centralized configuration and builder for mslog.
//!
//! Goals:
//! - Single place to collect tunables of the writer, reader, scanner and line logger.
//! - `LogConfig::from_env()` reads `MSLOG_*` variables; CLI flags override on top.
//! - `LogConfigBuilder` starts from env (or from clean defaults) and returns a `LogConfig`.
//!
//! Defaults follow the node firmware:
//! - compress_threshold = 1024, min_savings_div = 20 (~5%), compress_level = 3
//! - flash pages: 256 bytes with a 12-byte page header
//! - max_file_size = 1 MiB before rotation, block buffer 16 KiB

use std::fmt;

use crate::chunk::MAX_PLAUSIBLE_LEN;
use crate::consts::{
    DEFAULT_BLOCK_CAP, DEFAULT_COMPRESS_LEVEL, DEFAULT_COMPRESS_THRESHOLD, DEFAULT_FLUSH_THRESHOLD,
    DEFAULT_MIN_SAVINGS_DIV, FALLBACK_NODE_ID, FLASH_PAGE_HDR_SIZE, FLASH_PAGE_SIZE, MAX_FILE_SIZE,
};

#[derive(Clone, Debug)]
pub struct LogConfig {
    /// Verify CRC32 of stored payloads.
    /// Env: MSLOG_VERIFY_CRC (default true; "0|false|off|no" => false)
    pub verify_crc: bool,

    /// Scanner: keep CRC-invalid chunks (marked invalid) instead of rejecting them.
    /// Env: MSLOG_FORCE (default false)
    pub force: bool,

    /// Payloads shorter than this are stored raw.
    /// Env: MSLOG_COMPRESS_THRESHOLD (default 1024)
    pub compress_threshold: usize,

    /// Required saving is raw_len / min_savings_div.
    /// Env: MSLOG_MIN_SAVINGS_DIV (default 20)
    pub min_savings_div: usize,

    /// Deflate level 0..=9.
    /// Env: MSLOG_COMPRESS_LEVEL (default 3)
    pub compress_level: u8,

    /// Physical flash page size used by the scanner's de-interleave.
    /// Env: MSLOG_FLASH_PAGE_SIZE (default 256)
    pub flash_page_size: usize,

    /// Physical page header size skipped at the start of every page.
    /// Env: MSLOG_FLASH_PAGE_HEADER (default 12)
    pub flash_page_header: usize,

    /// Upper bound for raw_len/data_len accepted by the scanner.
    pub max_plausible_len: u32,

    /// Rotate the log file once size + incoming chunk reaches this.
    /// Env: MSLOG_MAX_FILE_SIZE (default 1 MiB)
    pub max_file_size: u64,

    /// Line logger block capacity.
    pub block_cap: usize,

    /// Line logger flushes once the block holds this many bytes.
    pub flush_threshold: usize,

    /// Node identity written into chunk headers.
    /// Env: MSLOG_NODE_ID (MAC or hex; default FF:FF:FF:FF:FF:FF)
    pub node_id: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            verify_crc: true,
            force: false,
            compress_threshold: DEFAULT_COMPRESS_THRESHOLD,
            min_savings_div: DEFAULT_MIN_SAVINGS_DIV,
            compress_level: DEFAULT_COMPRESS_LEVEL,
            flash_page_size: FLASH_PAGE_SIZE,
            flash_page_header: FLASH_PAGE_HDR_SIZE,
            max_plausible_len: MAX_PLAUSIBLE_LEN,
            max_file_size: MAX_FILE_SIZE,
            block_cap: DEFAULT_BLOCK_CAP,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            node_id: FALLBACK_NODE_ID,
        }
    }
}

#[inline]
fn env_truthy(s: &str) -> bool {
    let s = s.trim().to_ascii_lowercase();
    s == "1" || s == "true" || s == "yes" || s == "on"
}

#[inline]
fn env_falsy(s: &str) -> bool {
    let s = s.trim().to_ascii_lowercase();
    s == "0" || s == "false" || s == "no" || s == "off"
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl LogConfig {
    /// Load configuration from environment variables on top of the defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("MSLOG_VERIFY_CRC") {
            cfg.verify_crc = !env_falsy(&v);
        }
        if let Ok(v) = std::env::var("MSLOG_FORCE") {
            cfg.force = env_truthy(&v);
        }
        if let Some(n) = env_parse::<usize>("MSLOG_COMPRESS_THRESHOLD") {
            cfg.compress_threshold = n;
        }
        if let Some(n) = env_parse::<usize>("MSLOG_MIN_SAVINGS_DIV") {
            cfg.min_savings_div = n;
        }
        if let Some(n) = env_parse::<u8>("MSLOG_COMPRESS_LEVEL") {
            cfg.compress_level = n;
        }
        if let Some(n) = env_parse::<usize>("MSLOG_FLASH_PAGE_SIZE") {
            cfg.flash_page_size = n;
        }
        if let Some(n) = env_parse::<usize>("MSLOG_FLASH_PAGE_HEADER") {
            cfg.flash_page_header = n;
        }
        if let Some(n) = env_parse::<u64>("MSLOG_MAX_FILE_SIZE") {
            cfg.max_file_size = n;
        }
        if let Ok(v) = std::env::var("MSLOG_NODE_ID") {
            if let Ok(id) = crate::util::parse_node_id(&v) {
                cfg.node_id = id;
            }
        }

        cfg
    }

    /// Reject combinations the codec cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if self.flash_page_header >= self.flash_page_size {
            return Err(format!(
                "flash page header ({}) must be smaller than page size ({})",
                self.flash_page_header, self.flash_page_size
            ));
        }
        if self.min_savings_div == 0 {
            return Err("min_savings_div must be > 0".into());
        }
        if self.compress_level > 9 {
            return Err(format!("compress_level must be 0..=9, got {}", self.compress_level));
        }
        if self.max_plausible_len == 0 {
            return Err("max_plausible_len must be > 0".into());
        }
        if self.flush_threshold > self.block_cap {
            return Err(format!(
                "flush_threshold ({}) exceeds block_cap ({})",
                self.flush_threshold, self.block_cap
            ));
        }
        Ok(())
    }
}

impl fmt::Display for LogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LogConfig {{ \
             verify_crc: {}, \
             force: {}, \
             compress_threshold: {}, \
             min_savings_div: {}, \
             compress_level: {}, \
             flash_page: {}/{}, \
             max_plausible_len: {}, \
             max_file_size: {}, \
             block_cap: {}, \
             flush_threshold: {}, \
             node_id: {} \
             }}",
            self.verify_crc,
            self.force,
            self.compress_threshold,
            self.min_savings_div,
            self.compress_level,
            self.flash_page_size,
            self.flash_page_header,
            self.max_plausible_len,
            self.max_file_size,
            self.block_cap,
            self.flush_threshold,
            crate::util::format_node_id(self.node_id),
        )
    }
}

/// Lightweight builder that produces a LogConfig.
#[derive(Clone, Debug)]
pub struct LogConfigBuilder {
    cfg: LogConfig,
}

impl Default for LogConfigBuilder {
    fn default() -> Self {
        // Start from env, then allow overrides.
        Self {
            cfg: LogConfig::from_env(),
        }
    }
}

impl LogConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: LogConfig::default(),
        }
    }

    pub fn verify_crc(mut self, on: bool) -> Self {
        self.cfg.verify_crc = on;
        self
    }

    pub fn force(mut self, on: bool) -> Self {
        self.cfg.force = on;
        self
    }

    pub fn compress_threshold(mut self, bytes: usize) -> Self {
        self.cfg.compress_threshold = bytes;
        self
    }

    pub fn min_savings_div(mut self, div: usize) -> Self {
        self.cfg.min_savings_div = div;
        self
    }

    pub fn compress_level(mut self, level: u8) -> Self {
        self.cfg.compress_level = level;
        self
    }

    pub fn flash_page(mut self, page_size: usize, header_size: usize) -> Self {
        self.cfg.flash_page_size = page_size;
        self.cfg.flash_page_header = header_size;
        self
    }

    pub fn max_plausible_len(mut self, len: u32) -> Self {
        self.cfg.max_plausible_len = len;
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.cfg.max_file_size = bytes;
        self
    }

    pub fn block(mut self, cap: usize, flush_threshold: usize) -> Self {
        self.cfg.block_cap = cap;
        self.cfg.flush_threshold = flush_threshold;
        self
    }

    pub fn node_id(mut self, id: u64) -> Self {
        self.cfg.node_id = id;
        self
    }

    /// Finish the builder and obtain the configuration.
    pub fn build(self) -> LogConfig {
        self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = LogConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.compress_threshold, 1024);
        assert_eq!(cfg.flash_page_size, 256);
        assert_eq!(cfg.flash_page_header, 12);
    }

    #[test]
    fn validate_rejects_bad_layouts() {
        let cfg = LogConfigBuilder::from_default().flash_page(12, 12).build();
        assert!(cfg.validate().is_err());

        let cfg = LogConfigBuilder::from_default().min_savings_div(0).build();
        assert!(cfg.validate().is_err());

        let cfg = LogConfigBuilder::from_default().compress_level(10).build();
        assert!(cfg.validate().is_err());

        let cfg = LogConfigBuilder::from_default().block(100, 200).build();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn builder_overrides() {
        let cfg = LogConfigBuilder::from_default()
            .verify_crc(false)
            .force(true)
            .node_id(0x1020_BA4D_F03C)
            .build();
        assert!(!cfg.verify_crc);
        assert!(cfg.force);
        assert!(cfg.to_string().contains("10:20:BA:4D:F0:3C"));
    }
}
