//! Logging utilities with indicatif integration and per-run log file

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use indicatif::MultiProgress;

/// ANSI color code and padded label for a log level.
fn level_style(level: log::Level, color: bool) -> (&'static str, &'static str, &'static str) {
    let label = match level {
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARN ",
        log::Level::Info => "INFO ",
        log::Level::Debug => "DEBUG",
        log::Level::Trace => "TRACE",
    };
    if !color {
        return ("", label, "");
    }
    let ansi = match level {
        log::Level::Error => "\x1b[31m",
        log::Level::Warn => "\x1b[33m",
        log::Level::Info => "\x1b[32m",
        log::Level::Debug => "\x1b[36m",
        log::Level::Trace => "\x1b[35m",
    };
    (ansi, label, "\x1b[0m")
}

/// Logger that prints through indicatif MultiProgress to avoid mixing with
/// progress bars, and mirrors every record to an optional log file.
pub struct IndicatifLogger {
    inner: env_logger::Logger,
    multi: MultiProgress,
    file: Option<Mutex<File>>,
}

impl IndicatifLogger {
    pub fn new(inner: env_logger::Logger, multi: MultiProgress, file: Option<File>) -> Self {
        Self {
            inner,
            multi,
            file: file.map(Mutex::new),
        }
    }
}

impl log::Log for IndicatifLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if self.inner.enabled(record.metadata()) {
            // TTY path — always has color (IndicatifLogger only used in TTY mode)
            let (pre, label, post) = level_style(record.level(), true);
            let line = format!("[{pre}{label}{post}] {}", record.args());
            self.multi.suspend(|| eprintln!("{line}"));

            if let Some(file) = &self.file {
                let (_, label, _) = level_style(record.level(), false);
                if let Ok(mut f) = file.lock() {
                    let _ = writeln!(f, "[{label}] {}", record.args());
                }
            }
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Writer that duplicates log output to stderr and a log file
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        std::io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::stderr().flush()?;
        self.file.flush()
    }
}

/// Initialize logging with optional TTY mode (indicatif integration) and
/// optional per-run log file.
///
/// The log file receives every record in addition to stderr, so scheduled
/// runs leave an audit trail next to the exported files.
pub fn init_logging(quiet: bool, debug: bool, multi: Option<&MultiProgress>, log_file: Option<&Path>) {
    let default_level = if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    let file = log_file.and_then(|path| match File::create(path) {
        Ok(f) => Some(f),
        Err(e) => {
            eprintln!("cannot create log file {}: {e}", path.display());
            None
        }
    });

    if let Some(multi) = multi {
        let logger = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(default_level),
        )
        .format_timestamp_millis()
        .build();
        let max_level = logger.filter();

        log::set_boxed_logger(Box::new(IndicatifLogger::new(logger, multi.clone(), file)))
            .expect("failed to init logger");
        log::set_max_level(max_level);
    } else {
        // Non-TTY: no ANSI colors, timestamp for log aggregation
        let mut builder = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(default_level),
        );
        builder.format(|buf, record| {
            let (_, label, _) = level_style(record.level(), false);
            writeln!(buf, "{} [{label}] {}", buf.timestamp(), record.args())
        });
        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(TeeWriter { file })));
        }
        builder.init();
    }
}
