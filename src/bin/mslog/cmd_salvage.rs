use anyhow::{anyhow, bail, Result};
use log::info;
use std::path::PathBuf;

use mslog::chunk::read_all;
use mslog::config::LogConfigBuilder;
use mslog::metrics::record_lines_salvaged;
use mslog::scan::{salvage_buffer, salvage_chunks, salvage_text, ScanOptions, SalvagedLine};

use super::util::read_file;

pub fn exec(path: PathBuf, flash: bool, sequential: bool) -> Result<()> {
    let cfg = LogConfigBuilder::new().force(true).build();
    cfg.validate().map_err(|e| anyhow!(e))?;
    let buf = read_file(&path)?;

    let lines: Vec<SalvagedLine> = if sequential {
        // trust mode: CRC-invalid чанки тоже идут в разбор
        let out = read_all(&buf[..], false);
        if out.chunks.is_empty() {
            let raw: Vec<SalvagedLine> = salvage_text(&buf)
                .into_iter()
                .map(|value| SalvagedLine {
                    chunk: None,
                    offset: None,
                    crc_valid: None,
                    value,
                })
                .collect();
            record_lines_salvaged(raw.len());
            raw
        } else {
            salvage_chunks(&out.chunks)
        }
    } else {
        let opts = ScanOptions::from_config(&cfg, flash).map_err(|e| anyhow!(e))?;
        salvage_buffer(&buf, opts).lines
    };

    for l in &lines {
        println!("{}", serde_json::to_string(&l.value)?);
    }
    info!("salvage: extracted {} valid JSON lines", lines.len());
    if lines.is_empty() {
        bail!("no JSON lines recovered from {}", path.display());
    }
    Ok(())
}
