use anyhow::Result;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use mslog::chunk::{read_all, write_chunk, ChunkReader, StreamEnd, WriteOptions, CHUNK_HDR_SIZE, OFF_VERSION};
use mslog::error::ChunkError;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_file(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("mslog-seq-{prefix}-{pid}-{t}-{id}.lz"))
}

/// Лог из n чанков; возвращает поток и границы (offset начала каждого чанка + конец).
fn build_log(n: usize) -> Result<(Vec<u8>, Vec<usize>)> {
    let mut stream = Vec::new();
    let mut bounds = vec![0usize];
    for i in 0..n {
        let line = format!("{{\"seq\":{},\"pad\":\"{}\"}}\n", i, "z".repeat(i * 37 % 300));
        // каждый третий — крупный и сжимаемый
        let payload = if i % 3 == 2 { line.repeat(40) } else { line };
        write_chunk(&mut stream, payload.as_bytes(), 0xABCDEF, 1_700_000_000 + i as u32, &WriteOptions::default())?;
        bounds.push(stream.len());
    }
    Ok((stream, bounds))
}

#[test]
fn truncation_after_n_chunks() -> Result<()> {
    let (stream, bounds) = build_log(6)?;

    for n in 0..=6 {
        // ровно на границе -> n чанков и чистый EOF
        let cut = &stream[..bounds[n]];
        let out = read_all(cut, true);
        assert_eq!(out.chunks.len(), n);
        assert!(out.end.is_clean(), "cut at boundary {} must be clean", n);

        if n == 6 {
            break;
        }
        // внутри заголовка следующего чанка
        let cut = &stream[..bounds[n] + 10];
        let out = read_all(cut, true);
        assert_eq!(out.chunks.len(), n);
        assert!(matches!(
            out.end.error(),
            Some(ChunkError::TruncatedHeader { got: 10, need: CHUNK_HDR_SIZE, .. })
        ));

        // внутри payload следующего чанка
        let cut = &stream[..bounds[n] + CHUNK_HDR_SIZE + 1];
        let out = read_all(cut, true);
        assert_eq!(out.chunks.len(), n);
        match out.end.error() {
            Some(ChunkError::TruncatedPayload { offset, got, .. }) => {
                assert_eq!(*offset, bounds[n] as u64);
                assert_eq!(*got, 1);
            }
            other => panic!("expected TruncatedPayload, got {:?}", other),
        }
    }
    Ok(())
}

#[test]
fn single_bit_flip_is_isolated() -> Result<()> {
    let (stream, bounds) = build_log(5)?;
    let mut rng = oorandom::Rand32::new(0x5EED);

    for victim in 0..5 {
        let start = bounds[victim] + CHUNK_HDR_SIZE;
        let end = bounds[victim + 1];
        let pos = start + rng.rand_range(0..(end - start) as u32) as usize;
        let bit = rng.rand_range(0..8) as u8;

        let mut damaged = stream.clone();
        damaged[pos] ^= 1 << bit;

        let out = read_all(&damaged[..], true);
        assert!(out.end.is_clean());
        assert_eq!(out.chunks.len(), 4, "victim {} must be skipped", victim);
        assert_eq!(out.skipped.len(), 1);
        assert!(matches!(out.skipped[0], ChunkError::CrcMismatch { .. }));
        assert_eq!(out.skipped[0].offset(), Some(bounds[victim] as u64));
        assert!(out.chunks.iter().all(|c| c.crc_valid));
        // индексы считают заголовки — на месте жертвы дырка
        assert!(out.chunks.iter().all(|c| c.index != victim + 1));

        // trust mode: чанк отдаётся с crc_valid=false (если распаковка не сломалась)
        let trusted = read_all(&damaged[..], false);
        if let Some(c) = trusted.chunks.iter().find(|c| c.index == victim + 1) {
            assert!(!c.crc_valid);
        } else {
            assert!(matches!(trusted.skipped[0], ChunkError::Decompression { .. }));
        }
    }
    Ok(())
}

#[test]
fn bad_magic_stops_the_pass() -> Result<()> {
    let (mut stream, bounds) = build_log(4)?;
    stream[bounds[2]] ^= 0xFF;

    let mut rd = ChunkReader::new(&stream[..]);
    let got: Vec<_> = rd.by_ref().collect();
    assert_eq!(got.len(), 2);
    match rd.end() {
        Some(StreamEnd::Fault(ChunkError::InvalidMagic { offset, .. })) => {
            assert_eq!(*offset, bounds[2] as u64)
        }
        other => panic!("expected InvalidMagic, got {:?}", other),
    }
    // последовательность не перезапускается
    assert!(rd.next().is_none());
    Ok(())
}

#[test]
fn version_mismatch_only_warns() -> Result<()> {
    let (mut stream, bounds) = build_log(3)?;
    stream[bounds[1] + OFF_VERSION] = 7;
    let out = read_all(&stream[..], true);
    assert_eq!(out.chunks.len(), 3);
    assert_eq!(out.chunks[1].header.version, 7);
    assert!(out.end.is_clean());
    Ok(())
}

#[test]
fn reads_from_file() -> Result<()> {
    let path = unique_file("file");
    let (stream, _) = build_log(4)?;
    fs::write(&path, &stream)?;

    let out = read_all(fs::File::open(&path)?, true);
    assert_eq!(out.chunks.len(), 4);
    assert!(out.end.is_clean());
    assert_eq!(out.chunks[3].header.timestamp, 1_700_000_003);

    let _ = fs::remove_file(&path);
    Ok(())
}

/// Источник, который отдаёт `ok` байт и затем падает с ошибкой ввода-вывода.
struct FailAfter {
    data: Vec<u8>,
    pos: usize,
    ok: usize,
}

impl Read for FailAfter {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.ok {
            return Err(io::Error::new(io::ErrorKind::Other, "device gone"));
        }
        let n = buf.len().min(self.ok - self.pos).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

#[test]
fn io_error_is_reported_apart_from_framing() -> Result<()> {
    let (stream, bounds) = build_log(3)?;
    let src = FailAfter { data: stream, pos: 0, ok: bounds[1] + 10 };
    let mut rd = ChunkReader::new(src);
    let got: Vec<_> = rd.by_ref().collect();
    assert_eq!(got.len(), 1);

    let end = rd.end().expect("pass finished");
    assert!(!end.is_clean());
    let e = end.io_error().expect("io fault");
    assert_eq!(e.kind(), io::ErrorKind::Other);
    assert!(!end.error().map(ChunkError::is_framing).unwrap_or(true));

    // обрезка файла — ошибка формата, не ввода-вывода
    let (stream, bounds) = build_log(2)?;
    let out = read_all(&stream[..bounds[1] + 10], true);
    assert!(out.end.io_error().is_none());
    assert!(out.end.error().map(ChunkError::is_framing).unwrap_or(false));
    Ok(())
}
