//! Hardware seams consumed by motor groups.
//!
//! The core never talks to a motor or a clock directly. It goes through:
//!
//! - [`MotorDevice`]: apply power, read and tare the encoder, set brake mode.
//! - [`Clock`]: read uptime and suspend until the next control tick.
//! - [`InputSource`](controller::InputSource): one controller snapshot per
//!   operator-control tick.
//!
//! Two backends ship with the crate. [`sim`] is always available and backs
//! every test. [`vex`] wraps vexide devices and is gated behind the `vexide`
//! cargo feature.

use std::{cell::RefCell, future::Future, rc::Rc, time::Duration};

/// Controller buttons, analog axes and per-tick snapshots.
pub mod controller;

/// Simulated motors, a virtual clock and scripted controller input.
pub mod sim;

/// vexide-backed motors, clock and controller.
#[cfg(feature = "vexide")]
pub mod vex;

/// Signed motor power. Devices accept `-MAX_POWER..=MAX_POWER`.
pub type Power = i32;

/// Largest power magnitude a device accepts.
pub const MAX_POWER: Power = 127;

/// How a motor behaves while it is commanded zero power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrakeMode {
    /// Spin freely.
    #[default]
    Coast,
    /// Actively hold the current position.
    Hold,
    /// Short the windings to stop quickly, then release.
    Brake,
}

/// A single actuator with power input and position feedback.
///
/// Positions are cumulative encoder readings relative to the last tare.
/// Implementations for real hardware are expected to swallow (and log) I/O
/// failures; the control loops treat every call as infallible.
pub trait MotorDevice {
    /// Commands a signed power. Values outside `±MAX_POWER` are clamped by
    /// the device.
    fn apply_power(&mut self, power: Power);

    /// Reads the cumulative encoder position.
    fn position(&self) -> i32;

    /// Zeroes the encoder position.
    fn tare_position(&mut self);

    /// Sets the zero-power behavior.
    fn set_brake_mode(&mut self, mode: BrakeMode);
}

impl<T: MotorDevice + ?Sized> MotorDevice for &mut T {
    fn apply_power(&mut self, power: Power) { (**self).apply_power(power) }

    fn position(&self) -> i32 { (**self).position() }

    fn tare_position(&mut self) { (**self).tare_position() }

    fn set_brake_mode(&mut self, mode: BrakeMode) { (**self).set_brake_mode(mode) }
}

impl<T: MotorDevice> MotorDevice for Rc<RefCell<T>> {
    fn apply_power(&mut self, power: Power) { self.borrow_mut().apply_power(power) }

    fn position(&self) -> i32 { self.borrow().position() }

    fn tare_position(&mut self) { self.borrow_mut().tare_position() }

    fn set_brake_mode(&mut self, mode: BrakeMode) { self.borrow_mut().set_brake_mode(mode) }
}

/// Time source for control loops.
///
/// `sleep` is the only point where a PID move or operator loop yields.
pub trait Clock {
    /// Time since the program started.
    fn now(&self) -> Duration;

    /// Suspends the caller for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

/// Makes an object clonable by wrapping it in `Rc` and `RefCell`
pub fn make_cloneable<T>(t: T) -> Rc<RefCell<T>> { Rc::new(RefCell::new(t)) }
