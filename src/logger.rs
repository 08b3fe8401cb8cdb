//! logger.rs — `log` facade wiring over a board console sink.
//!
//! The loader logs through the standard `log` macros; this module renders
//! records as `[level] target: message` lines into whatever character sink
//! the board provides. Rendering allocates nothing. Until [`init`] runs
//! the macros are inert, which is exactly what pre-console code wants.

use core::fmt::{self, Write as _};

use log::{LevelFilter, Log, Metadata, Record};

/// Board console output. One line fragment at a time; the board decides
/// what a character becomes on the wire.
pub trait ConsoleSink: Sync {
    fn write_str(&self, s: &str);
}

static LOGGER: SplLogger = SplLogger;

// Single core, written once in init() before any record is emitted.
static mut SINK: Option<&'static dyn ConsoleSink> = None;

struct SplLogger;

struct SinkWriter(&'static dyn ConsoleSink);

impl fmt::Write for SinkWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_str(s);
        Ok(())
    }
}

fn level_tag(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "fail",
        log::Level::Warn => "warn",
        log::Level::Info => "info",
        log::Level::Debug => "dbg ",
        log::Level::Trace => "trce",
    }
}

impl Log for SplLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let sink = unsafe { SINK };
        if let Some(sink) = sink {
            let mut w = SinkWriter(sink);
            let _ = write!(
                w,
                "[{}] {}: {}\r\n",
                level_tag(record.level()),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

/// Attach the console sink and arm the facade. Call once, before the
/// sequence starts; later calls keep the first logger and only the level
/// changes.
pub fn init(sink: &'static dyn ConsoleSink, level: LevelFilter) {
    unsafe {
        SINK = Some(sink);
    }
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}
