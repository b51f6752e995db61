//! Operator control utilities for driver control periods.
//!
//! This module maps controller input to motor groups during the
//! driver-controlled portion of a match.
//!
//! # Features
//!
//! - **Stick bindings**: one axis to a whole group, or one axis per motor for
//!   tank drives.
//! - **Dual-button bindings**: forward/backward buttons through the group's
//!   directional speeds and positional threshold.
//! - **Operator loop**: [`opcontrol`] samples the controller every 10 ms and
//!   drives every mechanism until cancelled.
//!
//! # Example
//!
//! ```ignore
//! use lockstep::{motion::pid::CancelToken, opcontrol::opcontrol};
//!
//! let stop = CancelToken::new();
//! opcontrol(&mut robot, &mut controller, &stop).await?;
//! ```

use log::{info, warn};

use crate::{
    error::Result,
    motion::pid::{CancelToken, LOOP_PERIOD},
    peripherals::{Clock, MotorDevice, controller::InputSource},
    robot::Robot,
};

/// Controller input mapping utilities.
///
/// Provides [`Binding`](controller::Binding) for mapping sticks and buttons
/// to motor groups.
pub mod controller;

/// Runs the operator loop until `cancel` fires.
///
/// Each tick samples one frame, applies every binding and sleeps for
/// [`LOOP_PERIOD`]. Every motor is stopped when the loop ends, whether by
/// cancellation or because a binding failed. Returns the number of ticks run.
pub async fn opcontrol<D, C, I>(
    robot: &mut Robot<D, C>,
    input: &mut I,
    cancel: &CancelToken,
) -> Result<u64>
where
    D: MotorDevice,
    C: Clock,
    I: InputSource,
{
    info!("Operator control started");
    let mut ticks = 0;
    while !cancel.is_cancelled() {
        let frame = input.frame();
        if let Err(e) = robot.drive_tick(&frame) {
            robot.stop_all();
            warn!("Operator control stopped after {} ticks: {}", ticks, e);
            return Err(e);
        }
        ticks += 1;
        robot.clock().sleep(LOOP_PERIOD).await;
    }
    robot.stop_all();
    info!("Operator control stopped after {} ticks", ticks);
    Ok(ticks)
}
