//! Console and file logger.
//!
//! This module implements the [`log`] crate's logging facade, writing every
//! record to the console and to `log.txt`. On the V5 Brain the file lands on
//! the SD card; on a desktop simulation run it lands in the working
//! directory.
//!
//! # Usage
//!
//! Initialize the logger once at the start of your program:
//!
//! ```ignore
//! use lockstep::fs::logger;
//! use log::LevelFilter;
//!
//! logger::init(LevelFilter::Info).expect("Logger init failed");
//! ```
//!
//! # Log Output
//!
//! Each line carries the level, the uptime, the module path and the message:
//!
//! ```text
//! INFO [5s 123ms] lockstep::motion::pid::movement - PID move to 2000 started (max power 127, tolerance 10)
//! WARN [9s 8ms] lockstep::motion::pid::movement - PID move did not settle within 2s (error 37)
//! ```

use std::{
    fs::OpenOptions,
    io::{BufWriter, Write},
    sync::{Mutex, OnceLock},
    time::Duration,
};

use humantime::{FormattedDuration, format_duration};
use log::{LevelFilter, Metadata, Record, SetLoggerError};

/// Writes log records to the console and `log.txt`.
pub struct GroupLogger {
    /// `None` if the file could not be opened (e.g. no SD card).
    file_writer: Mutex<Option<BufWriter<std::fs::File>>>,
    #[cfg(not(feature = "vexide"))]
    started:     std::time::Instant,
}

impl GroupLogger {
    fn new() -> Self {
        let file_writer = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open("log.txt")
            .ok()
            .map(BufWriter::new);

        Self {
            file_writer: Mutex::new(file_writer),
            #[cfg(not(feature = "vexide"))]
            started: std::time::Instant::now(),
        }
    }

    #[cfg(feature = "vexide")]
    fn uptime(&self) -> Duration { vexide::time::user_uptime() }

    #[cfg(not(feature = "vexide"))]
    fn uptime(&self) -> Duration { self.started.elapsed() }

    /// Uptime rounded to milliseconds so stamps stay short.
    fn timestamp(&self) -> FormattedDuration {
        let uptime = self.uptime();
        format_duration(Duration::from_millis(uptime.as_millis() as u64))
    }
}

impl log::Log for GroupLogger {
    fn enabled(&self, metadata: &Metadata) -> bool { metadata.level() <= log::max_level() }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let log_line = format!(
                "{} [{}] {} - {}\n",
                record.level(),
                self.timestamp(),
                record.target(),
                record.args()
            );

            print!("{}", log_line);

            if let Ok(mut writer_guard) = self.file_writer.lock() {
                if let Some(ref mut writer) = *writer_guard {
                    let _ = writer.write_all(log_line.as_bytes());
                }
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut writer_guard) = self.file_writer.lock() {
            if let Some(ref mut writer) = *writer_guard {
                let _ = writer.flush();
            }
        }
    }
}

static LOGGER: OnceLock<GroupLogger> = OnceLock::new();

/// Installs the logger as the global `log` backend.
///
/// # Errors
///
/// Returns [`SetLoggerError`] if a logger has already been set.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    let logger = LOGGER.get_or_init(GroupLogger::new);
    log::set_logger(logger).map(|()| log::set_max_level(level))
}
