//! Kernel logging backend.
//!
//! Library code logs through the `log` facade; once [`init`] has run, every
//! record is printed to the console as one colored `[LEVEL] message` line,
//! in a single locked output call so concurrent log lines never interleave.
#![cfg_attr(not(test), no_std)]

use core::fmt;

use kconsole::Console;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Once;

fn label(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRACE",
        Level::Debug => "DEBUG",
        Level::Info => " INFO",
        Level::Warn => " WARN",
        Level::Error => "ERROR",
    }
}

fn color(level: Level) -> &'static str {
    match level {
        Level::Trace => "\x1b[90m", // Gray
        Level::Debug => "\x1b[36m", // Cyan
        Level::Info => "\x1b[32m",  // Green
        Level::Warn => "\x1b[33m",  // Yellow
        Level::Error => "\x1b[31m", // Red
    }
}

/// One rendered log line, without the trailing newline.
struct Line<'r, 'a>(&'r Record<'a>);

impl fmt::Display for Line<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = self.0.level();
        write!(f, "{}[{}]\x1b[0m {}", color(level), label(level), self.0.args())
    }
}

struct KernelLogger {
    console: Once<&'static Console<'static>>,
}

static LOGGER: KernelLogger = KernelLogger {
    console: Once::new(),
};

impl Log for KernelLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        self.console.is_completed()
    }

    fn log(&self, record: &Record<'_>) {
        if let Some(console) = self.console.get() {
            console.print(format_args!("{}\n", Line(record)));
        }
    }

    fn flush(&self) {}
}

/// Route the `log` facade to `console`, dropping records above `level`.
///
/// Call once, after `Console::init`. A second call fails and leaves the
/// first console in place.
pub fn init(console: &'static Console<'static>, level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    LOGGER.console.call_once(|| console);
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicU32;
    use kconsole::{CharSink, ConsoleConfig, Cpu, Scheduler};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Vec<u8>>);

    impl CharSink for Capture {
        fn put(&self, byte: u8) {
            self.0.lock().unwrap().push(byte);
        }
    }

    struct Core;

    impl Cpu for Core {
        fn id(&self) -> usize {
            0
        }

        fn disable_interrupts(&self) {}

        fn halt(&self) -> ! {
            panic!("halted")
        }
    }

    struct NoSched;

    impl Scheduler for NoSched {
        fn park(&self, _word: &AtomicU32, _seen: u32) {}
        fn unpark_all(&self, _word: &AtomicU32) {}
        fn current_killed(&self) -> bool {
            true
        }
    }

    #[test]
    fn line_carries_level_label_and_color() {
        let rendered = format!(
            "{}",
            Line(&Record::builder().level(Level::Warn).args(format_args!("disk {}", "full")).build())
        );
        assert_eq!(rendered, "\x1b[33m[ WARN]\x1b[0m disk full");
    }

    #[test]
    fn records_reach_the_console() {
        let sink: &'static Capture = Box::leak(Box::default());
        let console: &'static Console<'static> =
            Box::leak(Box::new(Console::new(ConsoleConfig::DEFAULT, sink, &Core, &NoSched)));

        init(console, LevelFilter::Info).unwrap();
        log::info!("booted {} cpus", 4);
        log::debug!("filtered out");

        let text = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text, "\x1b[32m[ INFO]\x1b[0m booted 4 cpus\n");
        assert!(init(console, LevelFilter::Trace).is_err());
    }
}
