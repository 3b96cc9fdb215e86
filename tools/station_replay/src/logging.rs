use std::{
    fs::{self, File},
    io::{self, Write},
    path::Path,
};

use anyhow::{anyhow, Result};
use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::replay::ReplayReport;

// Prints station records to stdout and warnings and errors to stderr.
struct ConsoleLog;

static CONSOLE: ConsoleLog = ConsoleLog;

impl Log for ConsoleLog {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error | Level::Warn => {
                eprintln!("[{:<5}] {}", record.level(), record.args())
            }
            _ => println!("[{:<5}] {}", record.level(), record.args()),
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

pub fn install(level: LevelFilter) -> Result<()> {
    log::set_logger(&CONSOLE).map_err(|err| anyhow!("logger already installed: {err}"))?;
    log::set_max_level(level);
    Ok(())
}

pub fn parse_level(raw: &str) -> Result<LevelFilter> {
    raw.parse::<LevelFilter>()
        .map_err(|_| anyhow!("invalid log level `{raw}` (use off|error|warn|info|debug|trace)"))
}

pub fn write_report(path: &Path, reports: &[ReplayReport]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, reports)?;
    Ok(())
}
