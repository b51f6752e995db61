//! Controller-to-motor-group bindings.
//!
//! A [`Binding`] turns one [`ControllerFrame`] into one [`RunCommand`] for
//! one motor group. Typical setups:
//!
//! - Tank drive on two motors: `PerDevice(vec![Axis::LeftY, Axis::RightY])`.
//! - Four-motor tank: `PerDevice(vec![LeftY, LeftY, RightY, RightY])`.
//! - A lift on two buttons: `DualButton { forward: Button::X, backward: Button::B }`.
//!
//! # Example
//!
//! ```ignore
//! use lockstep::opcontrol::controller::Binding;
//! use lockstep::peripherals::controller::Button;
//!
//! let binding = Binding::DualButton { forward: Button::R1, backward: Button::R2 };
//! binding.apply(&mut scooper, &frame)?;
//! ```

use crate::{
    error::{Error, Result},
    group::{MAX_MOTORS, MotorGroup, RunCommand},
    peripherals::{
        Clock, MotorDevice, Power,
        controller::{Axis, Button, ControllerFrame},
    },
};

/// How a motor group reads the controller during operator control.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Binding {
    /// Not driven by the controller.
    #[default]
    None,
    /// One stick axis to every motor.
    Uniform(Axis),
    /// One stick axis per motor, in device order.
    PerDevice(Vec<Axis>),
    /// Two buttons through the group's directional speeds and threshold.
    DualButton { forward: Button, backward: Button },
}

impl Binding {
    /// Checks that the binding fits a group of `motors` motors.
    ///
    /// # Errors
    ///
    /// [`Error::LengthMismatch`] for a [`Binding::PerDevice`] list of the
    /// wrong length.
    pub fn validate(&self, motors: usize) -> Result<()> {
        match self {
            Binding::PerDevice(axes) if axes.len() != motors => Err(Error::LengthMismatch {
                expected: motors,
                actual:   axes.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Drives `group` from one controller frame.
    pub fn apply<D: MotorDevice, C: Clock>(
        &self,
        group: &mut MotorGroup<D, C>,
        frame: &ControllerFrame,
    ) -> Result<()> {
        match self {
            Binding::None => Ok(()),
            Binding::Uniform(axis) => group.run(RunCommand::Uniform(frame.axis(*axis))),
            Binding::PerDevice(axes) => {
                self.validate(group.len())?;
                let mut powers: heapless::Vec<Power, MAX_MOTORS> = heapless::Vec::new();
                for axis in axes {
                    // Capacity holds: the list matches the group size.
                    let _ = powers.push(frame.axis(*axis));
                }
                group.run(RunCommand::Each(&powers))
            }
            Binding::DualButton { forward, backward } => group.run(RunCommand::Buttons {
                forward:  frame.pressed(*forward),
                backward: frame.pressed(*backward),
            }),
        }
    }
}
