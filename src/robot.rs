//! The assembled robot: named motor groups and their operator bindings.
//!
//! Built by [`RobotConfig::build`](crate::config::RobotConfig::build) and
//! owned by whoever runs the current competition stage, which makes every
//! motor group single-owner: the operator loop and an autonomous routine can
//! never drive the same group at once.

use crate::{
    error::{Error, Result},
    group::MotorGroup,
    opcontrol::controller::Binding,
    peripherals::{Clock, MotorDevice, controller::ControllerFrame},
};

/// A motor group with a name and an operator binding.
pub struct Mechanism<D, C> {
    name:    &'static str,
    group:   MotorGroup<D, C>,
    binding: Binding,
}

impl<D, C> Mechanism<D, C> {
    pub fn new(name: &'static str, group: MotorGroup<D, C>, binding: Binding) -> Self {
        Self {
            name,
            group,
            binding,
        }
    }

    /// Name used to look the group up from autonomous steps.
    pub fn name(&self) -> &'static str { self.name }

    pub fn group(&self) -> &MotorGroup<D, C> { &self.group }

    pub fn group_mut(&mut self) -> &mut MotorGroup<D, C> { &mut self.group }

}

/// Every mechanism on the robot, in configuration order.
pub struct Robot<D, C> {
    mechanisms: Vec<Mechanism<D, C>>,
    clock:      C,
}

impl<D: MotorDevice, C: Clock> Robot<D, C> {
    pub fn new(mechanisms: Vec<Mechanism<D, C>>, clock: C) -> Self { Self { mechanisms, clock } }

    pub fn clock(&self) -> &C { &self.clock }


    /// Looks up a motor group by name.
    pub fn group(&self, name: &str) -> Result<&MotorGroup<D, C>> {
        self.mechanisms
            .iter()
            .find(|m| m.name() == name)
            .map(Mechanism::group)
            .ok_or_else(|| Error::UnknownMechanism(name.to_string()))
    }

    /// Looks up a motor group by name for driving.
    pub fn group_mut(&mut self, name: &str) -> Result<&mut MotorGroup<D, C>> {
        self.mechanisms
            .iter_mut()
            .find(|m| m.name == name)
            .map(Mechanism::group_mut)
            .ok_or_else(|| Error::UnknownMechanism(name.to_string()))
    }

    /// Applies every mechanism's binding to one controller frame.
    pub fn drive_tick(&mut self, frame: &ControllerFrame) -> Result<()> {
        for mechanism in &mut self.mechanisms {
            mechanism.binding.apply(&mut mechanism.group, frame)?;
        }
        Ok(())
    }

    /// Stops every motor on the robot.
    pub fn stop_all(&mut self) {
        for mechanism in &mut self.mechanisms {
            mechanism.group.stop();
        }
    }
}
