use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use mslog::chunk::DecodedChunk;
use mslog::metrics;
use mslog::report::{ChunkSummary, SensorView};
use mslog::util::{display_text, format_node_id, hex_dump};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// Одна строка метаданных на чанк.
    Meta,
    Json,
    Hex,
    Raw,
}

impl PayloadFormat {
    pub fn pick(json: bool, hex: bool, raw: bool) -> Self {
        if json {
            PayloadFormat::Json
        } else if hex {
            PayloadFormat::Hex
        } else if raw {
            PayloadFormat::Raw
        } else {
            PayloadFormat::Meta
        }
    }
}

pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read {}", path.display()))
}

pub fn emit_chunk(c: &DecodedChunk, fmt: PayloadFormat) -> Result<()> {
    match fmt {
        PayloadFormat::Meta => {
            let h = &c.header;
            println!(
                "chunk {} @0x{:08X}: node={} ts={} {} raw={} stored={} crc=0x{:08X} {}",
                c.index,
                c.offset,
                format_node_id(h.node_id),
                c.timestamp_iso().unwrap_or_else(|| "NO_TIMESTAMP".to_string()),
                h.compression_label(),
                h.raw_len,
                h.data_len,
                h.crc32,
                if c.crc_valid { "PASS" } else { "FAIL" }
            );
        }
        PayloadFormat::Json => match SensorView::from_chunk(c) {
            Some(v) => println!("{}", serde_json::to_string_pretty(&v)?),
            None => {
                // payload не JSON: в stdout только метаданные, текст в stderr
                println!("{}", serde_json::to_string_pretty(&c.meta())?);
                eprintln!("Chunk {}: not JSON: {}", c.index, display_text(&c.payload));
            }
        },
        PayloadFormat::Hex => {
            println!("=== Chunk {} ===", c.index);
            println!("{}", hex_dump(&c.payload));
        }
        PayloadFormat::Raw => {
            let mut out = std::io::stdout().lock();
            out.write_all(&c.payload).context("write payload to stdout")?;
        }
    }
    Ok(())
}

pub fn finish(summary: &ChunkSummary, stats: bool, quiet: bool) -> Result<()> {
    if !quiet {
        summary.print();
    }
    if stats {
        let m = metrics::snapshot();
        eprintln!("{}", serde_json::to_string_pretty(&m)?);
        if m.scan_candidates > 0 {
            eprintln!("scan reject ratio: {:.3}", m.scan_reject_ratio());
        }
    }
    Ok(())
}
