use anyhow::Result;

use mslog::chunk::{read_all, write_chunk, WriteOptions, CHUNK_HDR_SIZE};
use mslog::scan::{salvage_buffer, salvage_chunks, ScanOptions};

fn block(lines: &[&str]) -> Vec<u8> {
    let mut v = Vec::new();
    for l in lines {
        v.extend_from_slice(l.as_bytes());
        v.push(b'\n');
    }
    v
}

#[test]
fn lines_survive_crc_damage() -> Result<()> {
    let mut buf = Vec::new();
    write_chunk(
        &mut buf,
        &block(&["{\"t\":1,\"v\":10}", "{\"t\":2,\"v\":11}", "{\"t\":3,\"v\":12}"]),
        0x42,
        1_700_000_000,
        &WriteOptions::raw_only(),
    )?;
    let second = buf.len();
    write_chunk(&mut buf, &block(&["{\"t\":4,\"v\":13}"]), 0x42, 1_700_000_060, &WriteOptions::raw_only())?;

    // порча внутри второй строки первого чанка: сама строка теряется, соседние — нет
    buf[CHUNK_HDR_SIZE + 16 + 3] = b'#';

    let r = salvage_buffer(&buf, ScanOptions::default());
    assert!(!r.raw_fallback);
    assert_eq!(r.chunks_examined, 2);
    let ts: Vec<i64> = r.lines.iter().filter_map(|l| l.value["t"].as_i64()).collect();
    assert_eq!(ts, vec![1, 3, 4]);
    assert_eq!(r.lines[0].crc_valid, Some(false));
    assert_eq!(r.lines[2].offset, Some(second as u64));
    assert_eq!(r.lines[2].crc_valid, Some(true));
    Ok(())
}

#[test]
fn sequential_trust_mode_salvage() -> Result<()> {
    let mut buf = Vec::new();
    write_chunk(&mut buf, &block(&["{\"a\":1}", "junk", "{\"a\":2}"]), 1, 1, &WriteOptions::raw_only())?;
    buf[CHUNK_HDR_SIZE + 9] = b'J';

    let strict = read_all(&buf[..], true);
    assert!(strict.chunks.is_empty());

    let trusted = read_all(&buf[..], false);
    let lines = salvage_chunks(&trusted.chunks);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1].value["a"], 2);
    Ok(())
}

#[test]
fn framing_lost_falls_back_to_raw_text() {
    // ни одного magic: только текст с обрывками
    let dump = b"\xFF\xFF\xFF{\"x\":1}\n{\"x\":2}\n{\"x\":\n\xFF\xFF{\"x\":3}\n";
    let r = salvage_buffer(dump, ScanOptions::default());
    assert!(r.raw_fallback);
    let xs: Vec<i64> = r.lines.iter().filter_map(|l| l.value["x"].as_i64()).collect();
    assert_eq!(xs, vec![2]);
}
