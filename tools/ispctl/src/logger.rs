//! Stderr sink for the `log` facade.

use std::io::Write;

use log::{Level, LevelFilter, Log, Metadata, Record};

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
        let level = match record.level() {
            Level::Error => "\x1b[31mERROR",
            Level::Warn => "\x1b[33mWARN ",
            Level::Info => "\x1b[34mINFO ",
            Level::Debug => "\x1b[36mDEBUG",
            Level::Trace => "\x1b[35mTRACE",
        };
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{level}\x1b[0m {}", record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Installs the sink. `verbosity` 0 logs warnings, 1 info, 2 and up debug.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
