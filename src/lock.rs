//! Advisory lock of a log directory (fs2).
//!
//! Формат не допускает чередования записей разных писателей, поэтому каждый append
//! берёт эксклюзивную блокировку `<dir>/LOCK` на время записи одного чанка.
//! Снимается в Drop.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::consts::LOCK_FILE;

pub struct DirLock {
    file: File,
    path: PathBuf,
}

impl DirLock {
    /// Block until the exclusive lock on `<dir>/LOCK` is held.
    pub fn acquire(dir: &Path) -> Result<Self> {
        let (file, path) = open_lock_file(dir)?;
        file.lock_exclusive()
            .with_context(|| format!("lock_exclusive {}", path.display()))?;
        Ok(Self { file, path })
    }

    /// Fail immediately if another writer holds the lock.
    pub fn try_acquire(dir: &Path) -> Result<Self> {
        let (file, path) = open_lock_file(dir)?;
        file.try_lock_exclusive()
            .with_context(|| format!("log directory is locked: {}", path.display()))?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn open_lock_file(dir: &Path) -> Result<(File, PathBuf)> {
    let path = dir.join(LOCK_FILE);
    let f = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&path)
        .with_context(|| format!("open lock file {}", path.display()))?;
    Ok((f, path))
}
