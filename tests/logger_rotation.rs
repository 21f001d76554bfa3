use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use mslog::chunk::{read_all, WriteOptions, CHUNK_HDR_SIZE};
use mslog::config::LogConfigBuilder;
use mslog::lock::DirLock;
use mslog::logger::{LineLogger, RotatingLog};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("mslog-rot-{prefix}-{pid}-{t}-{id}"))
}

fn decode_count(path: &PathBuf) -> Result<usize> {
    let out = read_all(fs::File::open(path)?, true);
    assert!(out.end.is_clean(), "{} must decode cleanly", path.display());
    Ok(out.chunks.len())
}

#[test]
fn rotates_through_old_and_backup() -> Result<()> {
    let root = unique_root("gens");
    // 100 байт payload + 36 заголовок = 136; порог 300 -> два чанка на файл
    let cfg = LogConfigBuilder::from_default().max_file_size(300).node_id(0x42).build();
    let log = RotatingLog::open(&root, &cfg)?.with_write_options(WriteOptions::raw_only());
    let payload = vec![b'p'; 100];
    let chunk_len = (CHUNK_HDR_SIZE + payload.len()) as u64;

    log.append_chunk(&payload, 1)?;
    log.append_chunk(&payload, 2)?;
    assert_eq!(log.file_size(), 2 * chunk_len);
    assert!(!log.old_path().exists());

    // 272 + 136 >= 300 -> ротация
    log.append_chunk(&payload, 3)?;
    assert_eq!(log.file_size(), chunk_len);
    assert_eq!(decode_count(&log.old_path())?, 2);
    assert!(!log.backup_path().exists());

    log.append_chunk(&payload, 4)?;
    log.append_chunk(&payload, 5)?;
    assert_eq!(decode_count(&log.backup_path())?, 2);
    assert_eq!(decode_count(&log.old_path())?, 2);
    assert_eq!(decode_count(&log.path())?, 1);

    // самый старый backup вытесняется
    log.append_chunk(&payload, 6)?;
    log.append_chunk(&payload, 7)?;
    let backup = read_all(fs::File::open(log.backup_path())?, true);
    assert_eq!(backup.chunks[0].header.timestamp, 3);
    assert_eq!(backup.chunks[0].header.node_id, 0x42);
    Ok(())
}

#[test]
fn line_logger_lines_are_recoverable() -> Result<()> {
    let root = unique_root("lines");
    let cfg = LogConfigBuilder::from_default().block(256, 200).build();
    {
        let mut lg = LineLogger::open(&root, &cfg)?.with_clock(|| 1_700_000_000);
        for i in 0..40 {
            lg.append_line(&format!("{{\"i\":{}}}", i))?;
        }
    }

    let path = root.join("samples.lz");
    let out = read_all(fs::File::open(&path)?, true);
    assert!(out.end.is_clean());
    assert!(out.chunks.len() > 1);
    let text: String = out
        .chunks
        .iter()
        .map(|c| String::from_utf8_lossy(&c.payload).into_owned())
        .collect();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 40);
    assert_eq!(lines[39], "{\"i\":39}");
    assert!(out.chunks.iter().all(|c| c.payload.len() <= 256));
    Ok(())
}

#[test]
fn lock_is_exclusive_and_released_on_drop() -> Result<()> {
    let root = unique_root("lock");
    fs::create_dir_all(&root)?;
    {
        let held = DirLock::try_acquire(&root)?;
        assert!(held.path().ends_with("LOCK"));
        assert!(DirLock::try_acquire(&root).is_err());
    }
    let again = DirLock::try_acquire(&root);
    assert!(again.is_ok());
    Ok(())
}
