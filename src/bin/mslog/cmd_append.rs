use anyhow::{anyhow, Result};
use std::path::PathBuf;

use mslog::config::LogConfigBuilder;
use mslog::logger::LineLogger;

pub fn exec(path: PathBuf, lines: Vec<String>) -> Result<()> {
    let cfg = LogConfigBuilder::new().build();
    cfg.validate().map_err(|e| anyhow!(e))?;

    let mut lg = LineLogger::open(&path, &cfg)?;
    for l in &lines {
        lg.append_line(l)?;
    }
    lg.flush()?;

    println!(
        "appended {} lines to {} ({} bytes)",
        lines.len(),
        lg.sink().path().display(),
        lg.sink().file_size()
    );
    Ok(())
}
