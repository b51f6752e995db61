//! Motion control for motor groups.
//!
//! - [`threshold`]: position-gated speed overrides for manual control.
//! - [`pid`]: blocking PID moves, linear and turning.

/// Positional speed thresholds and directional speed pairs.
pub mod threshold;

/// PID control algorithms.
///
/// Contains the controller state shared by every move and the blocking
/// move entry points on [`MotorGroup`](crate::group::MotorGroup).
pub mod pid;
