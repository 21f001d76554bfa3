use anyhow::{anyhow, bail, Result};
use log::info;
use std::path::PathBuf;

use mslog::config::LogConfigBuilder;
use mslog::report::ChunkSummary;
use mslog::scan::{scan, ScanOptions};

use super::util::{emit_chunk, finish, read_file, PayloadFormat};

pub struct ScanArgs {
    pub flash: bool,
    pub page_size: Option<usize>,
    pub page_header: Option<usize>,
    pub force: bool,
    pub no_verify: bool,
}

pub fn exec(path: PathBuf, args: ScanArgs, fmt: PayloadFormat, stats: bool, quiet: bool) -> Result<()> {
    let env = LogConfigBuilder::new().build();
    let mut b = LogConfigBuilder::new().flash_page(
        args.page_size.unwrap_or(env.flash_page_size),
        args.page_header.unwrap_or(env.flash_page_header),
    );
    if args.force {
        b = b.force(true);
    }
    if args.no_verify {
        b = b.verify_crc(false);
    }
    let cfg = b.build();
    cfg.validate().map_err(|e| anyhow!(e))?;
    let opts = ScanOptions::from_config(&cfg, args.flash).map_err(|e| anyhow!(e))?;

    let buf = read_file(&path)?;
    info!("scan: scanning {} bytes for log chunks", buf.len());
    let report = scan(&buf, opts);

    for c in &report.chunks {
        emit_chunk(c, fmt)?;
    }

    let st = &report.stats;
    let summary = ChunkSummary::from_chunks(
        &report.chunks,
        st.rejected_crc + st.rejected_decompress,
        cfg.verify_crc,
    );
    if stats {
        eprintln!("{}", serde_json::to_string_pretty(st)?);
    }

    if report.chunks.is_empty() {
        if !quiet {
            summary.print();
        }
        bail!("no valid chunks found in {}", path.display());
    }
    finish(&summary, stats, quiet)
}
