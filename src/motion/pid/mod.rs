//! PID moves for motor groups.
//!
//! A motor group carries two constant sets: one for straight positional
//! moves ([`MotorGroup::move_pid`](crate::group::MotorGroup::move_pid)) and
//! one for turning in place
//! ([`MotorGroup::turn_pid`](crate::group::MotorGroup::turn_pid)). Both moves
//! tare the encoders, then run a 10 ms control loop until the error and its
//! tick-over-tick change have stayed under the tolerance for 50 ms.
//!
//! # How PID Works
//!
//! PID control calculates motor output based on three terms:
//!
//! - **P (Proportional)**: Output proportional to the error (distance from target).
//! - **I (Integral)**: Output proportional to accumulated error, reset each
//!   time the setpoint is passed.
//! - **D (Derivative)**: Output proportional to the change in error per tick.
//!
//! The formula is: `output = Kp*error + Ki*integral + Kd*derivative`
//!
//! # Tuning
//!
//! Start with Kp and increase until the mechanism reaches the target.
//! Add Kd to reduce overshoot. Only add Ki if it consistently undershoots.

/// Constants, per-move controller state and settle timing.
pub mod pid;

/// Blocking positional, subset and turning moves.
pub mod movement;

pub use movement::{CancelToken, MoveOptions, MoveReport};
pub use pid::{INTEGRAL_LIMIT, LOOP_PERIOD, PidConstants, PidRun, PidStep, SETTLE_TIME, SettleTimer};
