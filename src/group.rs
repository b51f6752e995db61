//! Motor groups.
//!
//! A [`MotorGroup`] drives a fixed, ordered set of motors as one mechanism:
//! a drivetrain, a lift, an intake. It owns the group's directional speeds,
//! its [`PositionalThreshold`] and both PID constant sets. Manual control
//! lives here; the blocking PID moves are implemented in
//! [`motion::pid`](crate::motion::pid).
//!
//! # Example
//!
//! ```ignore
//! use lockstep::{group::{MotorGroup, RunCommand}, motion::threshold::SpeedPair};
//!
//! let mut ramp = MotorGroup::new([left_ramp, right_ramp], SpeedPair::new(40, -60), clock)?;
//! ramp.set_threshold(1500, 2000, SpeedPair::new(20, -60))?;
//!
//! // In the operator loop:
//! ramp.run(RunCommand::Buttons { forward: x_held, backward: b_held })?;
//! ```

use log::debug;

use crate::{
    error::{Error, Result},
    motion::{
        pid::PidConstants,
        threshold::{PositionalThreshold, SpeedPair},
    },
    peripherals::{BrakeMode, Clock, MotorDevice, Power},
};

/// Most motors a single group can hold.
pub const MAX_MOTORS: usize = 8;

/// A manual run request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunCommand<'a> {
    /// The same power to every motor.
    Uniform(Power),
    /// One power per motor, in device order.
    Each(&'a [Power]),
    /// Dual-button control. `forward` wins if both are held; neither held
    /// stops the group.
    Buttons { forward: bool, backward: bool },
}

/// A fixed set of motors controlled as one mechanism.
pub struct MotorGroup<D, C> {
    motors:         heapless::Vec<D, MAX_MOTORS>,
    clock:          C,
    speeds:         SpeedPair,
    threshold:      PositionalThreshold,
    constants:      PidConstants,
    turn_constants: PidConstants,
}

impl<D: MotorDevice, C: Clock> MotorGroup<D, C> {
    /// Creates a group from its motors, in device order.
    ///
    /// For turning moves the first half of the motors are treated as one side
    /// of the mechanism and the second half as the other.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyGroup`] for no motors, [`Error::TooManyMotors`] for more
    /// than [`MAX_MOTORS`].
    pub fn new(motors: impl IntoIterator<Item = D>, speeds: SpeedPair, clock: C) -> Result<Self> {
        let mut group = heapless::Vec::new();
        let mut count = 0;
        for motor in motors {
            count += 1;
            // Keep counting past capacity so the error reports the real size.
            let _ = group.push(motor);
        }
        if count == 0 {
            return Err(Error::EmptyGroup);
        }
        if count > MAX_MOTORS {
            return Err(Error::TooManyMotors {
                max:    MAX_MOTORS,
                actual: count,
            });
        }

        Ok(Self {
            motors: group,
            clock,
            speeds,
            threshold: PositionalThreshold::none(),
            constants: PidConstants::default(),
            turn_constants: PidConstants::default(),
        })
    }

    /// Number of motors in the group.
    pub fn len(&self) -> usize { self.motors.len() }

    /// Always `false`; a group cannot be built empty.
    pub fn is_empty(&self) -> bool { self.motors.is_empty() }

    /// The motors, in device order.
    pub fn motors(&self) -> &[D] { &self.motors }

    /// The clock PID moves tick against.
    pub fn clock(&self) -> &C { &self.clock }

    /// Applies a manual run command. Returns immediately.
    ///
    /// # Errors
    ///
    /// [`Error::LengthMismatch`] if a [`RunCommand::Each`] list does not have
    /// exactly one entry per motor. No motor is touched in that case.
    pub fn run(&mut self, command: RunCommand<'_>) -> Result<()> {
        match command {
            RunCommand::Uniform(power) => self.broadcast(power),
            RunCommand::Each(powers) => {
                self.check_len(powers.len())?;
                for (motor, &power) in self.motors.iter_mut().zip(powers) {
                    motor.apply_power(power);
                }
            }
            RunCommand::Buttons { forward, backward } => {
                let speeds = self.effective_speeds();
                if forward {
                    self.broadcast(speeds.forward);
                } else if backward {
                    self.broadcast(speeds.backward);
                } else {
                    self.broadcast(0);
                }
            }
        }
        Ok(())
    }

    /// Stops every motor.
    pub fn stop(&mut self) { self.broadcast(0); }

    /// The speed pair dual-button control would use right now: the
    /// threshold's override inside its interval, the directional speeds
    /// everywhere else.
    pub fn effective_speeds(&self) -> SpeedPair {
        if self.threshold.contains(self.average_position()) {
            self.threshold.speeds()
        } else {
            self.speeds
        }
    }

    /// Directional speeds used outside the threshold.
    pub fn speeds(&self) -> SpeedPair { self.speeds }

    /// Replaces the directional speeds.
    pub fn set_speeds(&mut self, speeds: SpeedPair) {
        debug!("Directional speeds set to {:?}", speeds);
        self.speeds = speeds;
    }

    /// The current positional threshold; [`PositionalThreshold::none`] if unset.
    pub fn threshold(&self) -> PositionalThreshold { self.threshold }

    /// Replaces the positional threshold.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyThreshold`] when `start == end`; the previous threshold
    /// is kept.
    pub fn set_threshold(&mut self, start: i32, end: i32, speeds: SpeedPair) -> Result<()> {
        self.threshold = PositionalThreshold::new(start, end, speeds)?;
        debug!("Threshold set to ({}, {}) with {:?}", start, end, speeds);
        Ok(())
    }

    /// Removes the positional threshold.
    pub fn clear_threshold(&mut self) { self.threshold = PositionalThreshold::none(); }

    /// Constants used by positional moves.
    pub fn pid_constants(&self) -> PidConstants { self.constants }

    /// Replaces the constants used by positional moves.
    pub fn set_pid_constants(&mut self, kp: f64, ki: f64, kd: f64) {
        self.constants = PidConstants::new(kp, ki, kd);
        debug!("PID constants set to {:?}", self.constants);
    }

    /// Constants used by turning moves.
    pub fn pid_turn_constants(&self) -> PidConstants { self.turn_constants }

    /// Replaces the constants used by turning moves.
    pub fn set_pid_turn_constants(&mut self, kp: f64, ki: f64, kd: f64) {
        self.turn_constants = PidConstants::new(kp, ki, kd);
        debug!("Turn PID constants set to {:?}", self.turn_constants);
    }

    /// Sets the brake mode for every motor in the group.
    pub fn set_brake(&mut self, mode: BrakeMode) {
        for motor in self.motors.iter_mut() {
            motor.set_brake_mode(mode);
        }
        debug!("Brake mode set to {:?}", mode);
    }

    /// Mean of the absolute motor positions, truncated toward zero.
    pub fn average_position(&self) -> i32 {
        let sum: i64 = self.motors.iter().map(|m| (m.position() as i64).abs()).sum();
        (sum / self.motors.len() as i64) as i32
    }

    /// Zeroes every motor's encoder.
    pub fn clear_encoders(&mut self) {
        for motor in self.motors.iter_mut() {
            motor.tare_position();
        }
    }

    pub(crate) fn broadcast(&mut self, power: Power) {
        for motor in self.motors.iter_mut() {
            motor.apply_power(power);
        }
    }

    pub(crate) fn motors_mut(&mut self) -> &mut [D] { &mut self.motors }

    /// Mean of the absolute positions of the motors at `indices`.
    ///
    /// `indices` must already be validated as non-empty and in range.
    pub(crate) fn average_position_of(&self, indices: &[usize]) -> i32 {
        let sum: i64 = indices
            .iter()
            .map(|&i| (self.motors[i].position() as i64).abs())
            .sum();
        (sum / indices.len() as i64) as i32
    }

    pub(crate) fn check_len(&self, actual: usize) -> Result<()> {
        if actual != self.motors.len() {
            return Err(Error::LengthMismatch {
                expected: self.motors.len(),
                actual,
            });
        }
        Ok(())
    }

    pub(crate) fn check_indices(&self, indices: &[usize]) -> Result<()> {
        if indices.is_empty() {
            return Err(Error::EmptyIndexSubset);
        }
        if let Some(&index) = indices.iter().find(|&&i| i >= self.motors.len()) {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.motors.len(),
            });
        }
        Ok(())
    }
}
