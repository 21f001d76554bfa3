use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};

mod cli;
mod util;
mod cmd_decode;
mod cmd_scan;
mod cmd_salvage;
mod cmd_gen;
mod cmd_append;

fn init_logger(quiet: bool, verbose: bool) {
    // RUST_LOG имеет приоритет; иначе info, --quiet -> warn, --verbose -> debug
    let default = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    Builder::from_env(Env::default().default_filter_or(default))
        .format_timestamp_millis()
        .init();
}

fn main() {
    let cli = cli::Cli::parse();
    init_logger(cli.quiet, cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: cli::Cli) -> Result<()> {
    let quiet = cli.quiet;
    match cli.cmd {
        cli::Cmd::Decode { path, no_verify, json, hex, raw, stats } =>
            cmd_decode::exec(path, no_verify, util::PayloadFormat::pick(json, hex, raw), stats, quiet),

        cli::Cmd::Scan { path, flash, page_size, page_header, force, no_verify, json, hex, stats } =>
            cmd_scan::exec(
                path,
                cmd_scan::ScanArgs { flash, page_size, page_header, force, no_verify },
                util::PayloadFormat::pick(json, hex, false),
                stats,
                quiet,
            ),

        cli::Cmd::Salvage { path, flash, sequential } =>
            cmd_salvage::exec(path, flash, sequential),

        cli::Cmd::Gen { out, count, node_id, timestamp } =>
            cmd_gen::exec(out, count, node_id, timestamp),

        cli::Cmd::Append { path, lines } =>
            cmd_append::exec(path, lines),
    }
}
