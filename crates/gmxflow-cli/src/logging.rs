use crate::error::Result;
use std::io;
use std::path::Path;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

/// Maps `-v` counts and `-q` to the console log level. Quiet still lets
/// errors through so a failed pipeline stage is never silent.
fn console_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Installs the global subscriber: a terse stderr console (no timestamps,
/// no targets) plus, when requested, a full-detail file log that always
/// records at DEBUG regardless of the console level.
pub fn init(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let console = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .with_filter(console_filter(verbosity, quiet));

    let file = log_file
        .map(std::fs::File::create)
        .transpose()?
        .map(|handle| {
            fmt::layer()
                .with_writer(handle)
                .with_ansi(false)
                .with_target(true)
                .with_filter(LevelFilter::DEBUG)
        });

    tracing_subscriber::registry().with(console).with(file).init();
    Ok(())
}
