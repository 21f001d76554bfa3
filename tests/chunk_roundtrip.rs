use anyhow::Result;

use mslog::checksum::crc32;
use mslog::chunk::{
    encode_chunk, read_all, write_chunk, ChunkHeader, WriteOptions, ALGO_DEFLATE, ALGO_RAW,
    CHUNK_HDR_SIZE,
};

fn noise(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = oorandom::Rand32::new(seed);
    (0..len).map(|_| rng.rand_u32() as u8).collect()
}

fn sensor_lines(n: usize) -> Vec<u8> {
    let mut s = String::new();
    for i in 0..n {
        s.push_str(&format!(
            "{{\"ts\":{},\"temperature_c\":{:.1},\"humidity_pct\":65.2,\"battery_pct\":{}}}\n",
            1_700_000_000 + i * 60,
            30.5 + (i % 7) as f64 * 0.2,
            28 - (i % 5)
        ));
    }
    s.into_bytes()
}

#[test]
fn roundtrip_various_payloads() -> Result<()> {
    let payloads: Vec<Vec<u8>> = vec![
        Vec::new(),
        b"{\"a\":1}".to_vec(),
        noise(7, 1023),
        noise(8, 4096),
        sensor_lines(200),
        vec![0u8; 64 * 1024],
    ];

    let opts = WriteOptions::default();
    let mut stream = Vec::new();
    for (i, p) in payloads.iter().enumerate() {
        write_chunk(&mut stream, p, 0x1020_BA4D_F03C, 1_700_000_000 + i as u32, &opts)?;
    }

    let out = read_all(&stream[..], true);
    assert!(out.end.is_clean(), "stream must end on a chunk boundary");
    assert!(out.skipped.is_empty());
    assert_eq!(out.bytes_read, stream.len() as u64);
    assert_eq!(out.chunks.len(), payloads.len());

    for (c, p) in out.chunks.iter().zip(&payloads) {
        assert_eq!(&c.payload, p);
        assert!(c.crc_valid);
        assert_eq!(c.header.raw_len as usize, p.len());
        assert!(!c.raw_len_mismatch());

        // CRC в заголовке — по сохранённым байтам
        let start = c.offset as usize + CHUNK_HDR_SIZE;
        let stored = &stream[start..start + c.header.data_len as usize];
        assert_eq!(crc32(stored), c.header.crc32);
    }
    Ok(())
}

#[test]
fn concrete_small_json_record() -> Result<()> {
    let payload = b"{\"a\":1}";
    let mut stream = Vec::new();
    let h = write_chunk(&mut stream, payload, 0x1020_BA4D_F03C, 1_700_000_000, &WriteOptions::default())?;

    assert_eq!(h.algo, ALGO_RAW);
    assert_eq!(h.raw_len, 7);
    assert_eq!(h.data_len, 7);
    assert_eq!(h.crc32, crc32(payload));
    assert_eq!(stream.len(), CHUNK_HDR_SIZE + 7);
    assert_eq!(&stream[..4], b"GLSM");
    assert_eq!(ChunkHeader::decode(&stream)?, h);

    let out = read_all(&stream[..], true);
    assert_eq!(out.chunks.len(), 1);
    assert_eq!(out.chunks[0].payload, payload);
    assert!(out.chunks[0].crc_valid);
    assert_eq!(out.chunks[0].node_id(), "10:20:BA:4D:F0:3C");
    assert_eq!(out.chunks[0].timestamp_iso().as_deref(), Some("2023-11-14T22:13:20Z"));
    Ok(())
}

#[test]
fn compression_gate() -> Result<()> {
    let opts = WriteOptions::default();

    // случайные байты не сжимаются на 5% -> raw
    let rnd = noise(42, 8192);
    let c = encode_chunk(&rnd, 1, 2, &opts)?;
    assert_eq!(c.header.algo, ALGO_RAW);
    assert_eq!(c.header.data_len as usize, rnd.len());

    // повторяющийся JSON сжимается -> deflate, raw_len — исходная длина
    let json = sensor_lines(100);
    let c = encode_chunk(&json, 1, 2, &opts)?;
    assert_eq!(c.header.algo, ALGO_DEFLATE);
    assert_eq!(c.header.level, opts.level);
    assert_eq!(c.header.raw_len as usize, json.len());
    assert!((c.header.data_len as usize) + CHUNK_HDR_SIZE < json.len() - json.len() / 20);

    // ниже порога — raw даже для сжимаемых данных
    let small = vec![b'x'; 1023];
    assert_eq!(encode_chunk(&small, 1, 2, &opts)?.header.algo, ALGO_RAW);
    let at = vec![b'x'; 1024];
    assert_eq!(encode_chunk(&at, 1, 2, &opts)?.header.algo, ALGO_DEFLATE);

    // raw_only никогда не сжимает
    assert_eq!(encode_chunk(&json, 1, 2, &WriteOptions::raw_only())?.header.algo, ALGO_RAW);
    Ok(())
}
