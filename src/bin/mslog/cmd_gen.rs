use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use mslog::chunk::WriteOptions;
use mslog::config::LogConfigBuilder;
use mslog::consts::FALLBACK_NODE_ID;
use mslog::fixture::write_fixture_log;
use mslog::util::{format_node_id, now_secs, parse_node_id};

// MAC тестового узла из прошивки
const DEMO_NODE_ID: u64 = 0x1020_BA4D_F03C;

pub fn exec(out: PathBuf, count: usize, node_id: Option<String>, timestamp: Option<u32>) -> Result<()> {
    let cfg = LogConfigBuilder::new().build();
    cfg.validate().map_err(|e| anyhow!(e))?;

    let node = match node_id {
        Some(s) => parse_node_id(&s).map_err(|e| anyhow!("--node-id {}: {}", s, e))?,
        None if cfg.node_id != FALLBACK_NODE_ID => cfg.node_id,
        None => DEMO_NODE_ID,
    };
    let ts = timestamp.unwrap_or_else(now_secs);

    let f = File::create(&out).with_context(|| format!("create {}", out.display()))?;
    let mut w = BufWriter::new(f);
    let headers = write_fixture_log(&mut w, node, ts, count, &WriteOptions::from(&cfg))?;
    w.flush().with_context(|| format!("flush {}", out.display()))?;

    for h in &headers {
        println!(
            "Chunk written: {} | {} bytes | CRC32=0x{:08X}",
            h.compression_label(),
            h.raw_len,
            h.crc32
        );
    }
    println!(
        "Test log file created: {} ({} chunks, node {})",
        out.display(),
        headers.len(),
        format_node_id(node)
    );
    Ok(())
}
