//! logger — запись лога узла: ротируемый файл чанков + построчный логгер с блочным буфером.
//!
//! RotatingLog:
//! - файл `<dir>/samples.lz`, дописывается только в конец;
//! - перед записью чанка: если size + incoming >= max_file_size — ротация
//!   samples_old.lz -> samples_backup.lz (старый backup удаляется), samples.lz -> samples_old.lz;
//! - каждый append под эксклюзивным `<dir>/LOCK` (fs2).
//!
//! LineLogger:
//! - строки копятся в блоке (`line + '\n'`) ёмкостью block_cap;
//! - не влезает — сначала flush; строка больше блока — flush, затем отдельный чанк;
//! - блок достиг flush_threshold — flush;
//! - flush = один чанк через писатель; Drop делает best-effort flush.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::chunk::{encode_chunk, ChunkHeader, WriteOptions};
use crate::config::LogConfig;
use crate::consts::{LOG_BACKUP_FILE, LOG_FILE, LOG_OLD_FILE};
use crate::lock::DirLock;
use crate::metrics::{record_chunk_written, record_log_rotation};
use crate::util::now_secs;

/// Append-only chunk log with size-based rotation.
#[derive(Debug, Clone)]
pub struct RotatingLog {
    dir: PathBuf,
    max_file_size: u64,
    node_id: u64,
    opts: WriteOptions,
}

impl RotatingLog {
    /// Create the directory if needed. Nothing is written until the first append.
    pub fn open(dir: &Path, cfg: &LogConfig) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("create log dir {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            max_file_size: cfg.max_file_size,
            node_id: cfg.node_id,
            opts: WriteOptions::from(cfg),
        })
    }

    pub fn with_write_options(mut self, opts: WriteOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    pub fn old_path(&self) -> PathBuf {
        self.dir.join(LOG_OLD_FILE)
    }

    pub fn backup_path(&self) -> PathBuf {
        self.dir.join(LOG_BACKUP_FILE)
    }

    /// Current size of the active file (0 if absent).
    pub fn file_size(&self) -> u64 {
        fs::metadata(self.path()).map(|m| m.len()).unwrap_or(0)
    }

    /// Encode `payload` and append it as one chunk, rotating first if needed.
    pub fn append_chunk(&self, payload: &[u8], timestamp: u32) -> Result<ChunkHeader> {
        let _lock = DirLock::acquire(&self.dir)?;

        let chunk = encode_chunk(payload, self.node_id, timestamp, &self.opts)
            .context("encode chunk")?;
        self.rotate_if_needed(chunk.total_len() as u64)?;

        let path = self.path();
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open {} for append", path.display()))?;
        // один write_all: заголовок и payload уходят одним буфером
        f.write_all(&chunk.to_bytes())
            .with_context(|| format!("append chunk to {}", path.display()))?;
        record_chunk_written(chunk.total_len());

        debug!(
            "logger: chunk appended: {} {} bytes | CRC32=0x{:08X} | file size {}",
            chunk.header.compression_label(),
            chunk.header.raw_len,
            chunk.header.crc32,
            self.file_size()
        );
        Ok(chunk.header)
    }

    /// Returns true if the active file was rotated.
    fn rotate_if_needed(&self, incoming: u64) -> Result<bool> {
        let size = match fs::metadata(self.path()) {
            Ok(m) => m.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e).context("stat active log"),
        };
        if size + incoming < self.max_file_size {
            return Ok(false);
        }

        info!("logger: rotating log file ({} bytes)", size);
        remove_if_exists(&self.backup_path())?;
        match fs::rename(self.old_path(), self.backup_path()) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e).context("rotate old -> backup"),
        }
        fs::rename(self.path(), self.old_path()).context("rotate active -> old")?;
        record_log_rotation();
        Ok(true)
    }

    /// Remove the active file (old/backup generations are kept).
    pub fn clear(&self) -> Result<()> {
        let _lock = DirLock::acquire(&self.dir)?;
        remove_if_exists(&self.path())
    }
}

fn remove_if_exists(p: &Path) -> Result<()> {
    match fs::remove_file(p) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("remove {}", p.display())),
    }
}

type Clock = Box<dyn Fn() -> u32 + Send>;

/// Line-oriented logger that batches lines into chunks.
pub struct LineLogger {
    sink: RotatingLog,
    block: Vec<u8>,
    cap: usize,
    flush_threshold: usize,
    clock: Clock,
}

impl LineLogger {
    pub fn new(sink: RotatingLog, cfg: &LogConfig) -> Self {
        Self {
            sink,
            block: Vec::with_capacity(cfg.block_cap),
            cap: cfg.block_cap,
            flush_threshold: cfg.flush_threshold,
            clock: Box::new(now_secs),
        }
    }

    /// Open `<dir>` as a rotating log and wrap it.
    pub fn open(dir: &Path, cfg: &LogConfig) -> Result<Self> {
        Ok(Self::new(RotatingLog::open(dir, cfg)?, cfg))
    }

    /// Replace the timestamp source (Unix seconds).
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> u32 + Send + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    pub fn sink(&self) -> &RotatingLog {
        &self.sink
    }

    /// Bytes buffered and not yet written.
    pub fn pending(&self) -> usize {
        self.block.len()
    }

    pub fn append_line(&mut self, line: &str) -> Result<()> {
        let need = line.len() + 1;

        if need > self.cap {
            self.flush()?;
            let mut own = Vec::with_capacity(need);
            own.extend_from_slice(line.as_bytes());
            own.push(b'\n');
            self.sink.append_chunk(&own, (self.clock)())?;
            return Ok(());
        }

        if self.block.len() + need > self.cap {
            self.flush()?;
        }
        self.block.extend_from_slice(line.as_bytes());
        self.block.push(b'\n');

        if self.block.len() >= self.flush_threshold {
            self.flush()?;
        }
        Ok(())
    }

    /// Write the buffered block as one chunk. The block is kept on failure.
    pub fn flush(&mut self) -> Result<()> {
        if self.block.is_empty() {
            return Ok(());
        }
        debug!("logger: flush start: {} bytes", self.block.len());
        self.sink.append_chunk(&self.block, (self.clock)())?;
        self.block.clear();
        Ok(())
    }

    /// Flush, then drop the active log file.
    pub fn clear(&mut self) -> Result<()> {
        if let Err(e) = self.flush() {
            warn!("logger: flush before clear failed: {:#}", e);
        }
        self.sink.clear()
    }
}

impl Drop for LineLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!("logger: flush on drop failed: {:#}", e);
        }
    }
}
