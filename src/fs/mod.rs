//! Filesystem utilities.
//!
//! # Logging
//!
//! The `logger` submodule provides a logger that writes to the console and
//! to `log.txt` (on the V5 Brain, the SD card). Motor groups, PID moves and
//! routines report through the `log` facade, so install it before running
//! anything you want a record of.
//!
//! # Example
//!
//! ```ignore
//! use lockstep::fs::logger;
//! use log::{info, LevelFilter};
//!
//! logger::init(LevelFilter::Debug).expect("Failed to initialize logger");
//! info!("Robot initialized successfully");
//! ```

/// Console and file logging.
pub mod logger;
