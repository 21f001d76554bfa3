use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Декодер и сканер восстановления логов MSLG
#[derive(Parser, Debug)]
#[command(name = "mslog", version, about = "MSLG telemetry log decoder and recovery scanner")]
pub struct Cli {
    /// Only warnings and errors on stderr
    #[arg(long, global = true)]
    pub quiet: bool,
    /// Debug logging (every rejected scan candidate)
    #[arg(long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Decode a well-formed log file sequentially
    Decode {
        #[arg(long)]
        path: PathBuf,
        /// Trust mode: emit chunks without checking CRC32
        #[arg(long)]
        no_verify: bool,
        /// Payloads as JSON objects (chunk metadata when a payload is not JSON)
        #[arg(long, conflicts_with_all = ["hex", "raw"])]
        json: bool,
        /// Payloads as hex dump
        #[arg(long, conflicts_with = "raw")]
        hex: bool,
        /// Payload bytes to stdout as is
        #[arg(long)]
        raw: bool,
        /// Print metrics as JSON to stderr at the end
        #[arg(long)]
        stats: bool,
    },
    /// Scan an arbitrary dump (partition image) for chunks
    Scan {
        #[arg(long)]
        path: PathBuf,
        /// Skip physical flash page headers inside payloads
        #[arg(long)]
        flash: bool,
        /// Flash page size (default 256 or MSLOG_FLASH_PAGE_SIZE)
        #[arg(long)]
        page_size: Option<usize>,
        /// Flash page header size (default 12 or MSLOG_FLASH_PAGE_HEADER)
        #[arg(long)]
        page_header: Option<usize>,
        /// Keep CRC-invalid chunks, marked invalid
        #[arg(long)]
        force: bool,
        #[arg(long)]
        no_verify: bool,
        #[arg(long, conflicts_with = "hex")]
        json: bool,
        #[arg(long)]
        hex: bool,
        #[arg(long)]
        stats: bool,
    },
    /// Extract valid JSON lines from a damaged dump (implies --force)
    Salvage {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        flash: bool,
        /// Walk the file sequentially in trust mode instead of scanning
        #[arg(long, conflicts_with = "flash")]
        sequential: bool,
    },
    /// Generate a deterministic test log of sensor readings
    Gen {
        #[arg(long)]
        out: PathBuf,
        /// Small single-reading chunks before the large one
        #[arg(long, default_value_t = 5)]
        count: usize,
        /// MAC (AA:BB:..) or hex; default MSLOG_NODE_ID or 10:20:BA:4D:F0:3C
        #[arg(long)]
        node_id: Option<String>,
        /// Unix time of the first reading (default now)
        #[arg(long)]
        timestamp: Option<u32>,
    },
    /// Append lines to <path>/samples.lz through the block-buffered logger
    Append {
        #[arg(long)]
        path: PathBuf,
        #[arg(long = "line", required = true)]
        lines: Vec<String>,
    },
}
