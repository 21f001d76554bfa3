use anyhow::{anyhow, bail, Context, Result};
use log::warn;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use mslog::chunk::{ChunkReader, StreamEnd};
use mslog::config::LogConfigBuilder;
use mslog::report::ChunkSummary;

use super::util::{emit_chunk, finish, PayloadFormat};

pub fn exec(path: PathBuf, no_verify: bool, fmt: PayloadFormat, stats: bool, quiet: bool) -> Result<()> {
    let mut b = LogConfigBuilder::new();
    if no_verify {
        b = b.verify_crc(false);
    }
    let cfg = b.build();
    cfg.validate().map_err(|e| anyhow!(e))?;

    let f = File::open(&path).with_context(|| format!("open {}", path.display()))?;
    let mut rd = ChunkReader::from_config(BufReader::new(f), &cfg);

    let mut chunks = Vec::new();
    for c in rd.by_ref() {
        emit_chunk(&c, fmt)?;
        chunks.push(c);
    }

    if let Some(end) = rd.end() {
        if let Some(e) = end.io_error() {
            bail!("read {} at byte {}: {}", path.display(), rd.position(), e);
        }
        if let StreamEnd::Fault(e) = end {
            warn!("decode: stopped at byte {}: {}", rd.position(), e);
        }
    }
    let summary = ChunkSummary::from_chunks(&chunks, rd.skipped().len(), cfg.verify_crc);

    if chunks.is_empty() {
        if !quiet {
            summary.print();
        }
        bail!("no valid chunks found in {}", path.display());
    }
    finish(&summary, stats, quiet)
}
