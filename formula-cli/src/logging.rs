//! Stderr logger for the `formula` binary.
//!
//! The level comes from `FORMULA_LOG` (off, error, warn, info, debug, trace) when set,
//! otherwise from the number of `--verbose` flags.

use log::{LevelFilter, Log, Metadata, Record};
use std::io::Write;

pub const ENV_VAR: &str = "FORMULA_LOG";

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let target = record.target().split("::").last().unwrap_or_default();
        // Nothing sensible to do if stderr is gone.
        let _ = writeln!(
            std::io::stderr().lock(),
            "[{:<5}] [{}] {}",
            record.level(),
            target,
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

pub fn level_for(verbosity: u8, env: Option<&str>) -> LevelFilter {
    if let Some(level) = env.and_then(|value| value.trim().parse::<LevelFilter>().ok()) {
        return level;
    }
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the logger. Calling it twice keeps the first installation.
pub fn init(verbosity: u8) {
    let env = std::env::var(ENV_VAR).ok();
    let level = level_for(verbosity, env.as_deref());
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
