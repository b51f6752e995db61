//! # Lockstep
//!
//! Lockstep drives groups of VEX V5 motors as one mechanism. It is built to
//! run on [Vexide](https://vexide.dev), with a simulated backend for testing
//! routines on a desktop. It provides:
//!
//! - **Manual Control**: Run a group at one power, at a power per motor, or
//!   from a forward/backward button pair with directional speeds and a
//!   positional speed threshold.
//! - **PID Moves**: Blocking positional moves and in-place turns that settle
//!   on the group's average encoder position, with optional timeouts and
//!   cancellation.
//! - **Configuration**: Declarative robot descriptions validated up front and
//!   wired onto real or simulated motors.
//! - **Operator Control**: Bindings from controller sticks and buttons to
//!   mechanisms, sampled on a fixed-period loop.
//! - **Autonomous Routines**: Sequences of runs, waits and PID moves.
//! - **Logging**: A console and file logger for debugging and telemetry.
//!
//! ## Quick Start
//!
//! ```ignore
//! use lockstep::{
//!     config::{MotorGroupConfig, MotorPort, RobotConfig},
//!     peripherals::vex::VexClock,
//! };
//! use vexide::prelude::*;
//!
//! #[vexide::main]
//! async fn main(peripherals: Peripherals) {
//!     let mut robot = RobotConfig::new()
//!         .group(MotorGroupConfig::new(
//!             "drive",
//!             [MotorPort::reversed(1), MotorPort::reversed(2), MotorPort::new(3), MotorPort::new(4)],
//!         ))
//!         .build(VexClock, |port| wire(&mut peripherals, port))
//!         .expect("robot config");
//!
//!     let drive = robot.group_mut("drive").expect("drive");
//!     drive.move_pid(2000, 127, 10).await.ok();
//!     drive.turn_pid(600, 80, 10).await.ok();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`group`]: The motor group and its manual run commands.
//! - [`motion`]: Speed thresholds and PID movement.
//! - [`config`]: Robot descriptions and wiring.
//! - [`robot`]: Named mechanisms built from a configuration.
//! - [`opcontrol`]: Controller bindings and the operator loop.
//! - [`auton`]: Autonomous routines.
//! - [`peripherals`]: Motor, clock and controller abstractions with vexide and
//!   simulated backends.
//! - [`fs`]: Filesystem utilities including logging.
//! - [`error`]: The crate's error type.

/// Autonomous routine module.
///
/// Sequences of named-mechanism steps run one after another, sharing a
/// timeout and cancellation token.
pub mod auton;

/// Robot configuration module.
///
/// Describes motor groups by name and port and builds a
/// [`Robot`](robot::Robot) from the description once it has been validated.
pub mod config;

/// Error types.
pub mod error;

/// Filesystem utilities module.
///
/// Contains logging functionality for recording robot telemetry and debug
/// information to files on the V5 Brain's SD card.
pub mod fs;

/// Motor group module.
///
/// Provides the [`MotorGroup`](group::MotorGroup) struct and the
/// [`RunCommand`](group::RunCommand) used for manual control.
pub mod group;

/// Motion control module.
///
/// - **Thresholds**: Positional speed overrides for button control.
/// - **PID Control**: Positional moves and in-place turns.
pub mod motion;

/// Operator control utilities module.
///
/// Maps controller sticks and buttons to mechanisms during driver control.
pub mod opcontrol;

/// Device abstractions.
///
/// The motor, clock and controller traits the rest of the crate is generic
/// over, plus the simulated and vexide implementations.
pub mod peripherals;

/// Named mechanisms built from a [`RobotConfig`](config::RobotConfig).
pub mod robot;

pub use error::{Error, Result};
pub use group::{MotorGroup, RunCommand};
pub use motion::{
    pid::{CancelToken, MoveOptions, MoveReport},
    threshold::{PositionalThreshold, SpeedPair},
};
