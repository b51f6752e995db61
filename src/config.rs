//! Startup configuration.
//!
//! A [`RobotConfig`] lists every motor group: its wiring, speeds, threshold,
//! brake mode, PID constants and operator binding. It is assembled once at
//! program start and turned into a [`Robot`] with [`RobotConfig::build`],
//! which is then passed by reference into the operator loop and autonomous
//! routines. No device or group lives in a global.
//!
//! # Example
//!
//! ```ignore
//! let config = RobotConfig::new()
//!     .group(
//!         MotorGroupConfig::new("drive", [MotorPort::new(1), MotorPort::reversed(2)])
//!             .with_pid(PidConstants::new(0.5, 0.0, 0.1))
//!             .with_binding(Binding::PerDevice(vec![Axis::LeftY, Axis::RightY])),
//!     )
//!     .group(
//!         MotorGroupConfig::new("ramp", [MotorPort::new(3), MotorPort::reversed(4)])
//!             .with_speeds(SpeedPair::new(40, -60))
//!             .with_threshold(1500, 2000, SpeedPair::new(20, -60))
//!             .with_brake(BrakeMode::Brake)
//!             .with_binding(Binding::DualButton { forward: Button::X, backward: Button::B }),
//!     );
//!
//! let mut robot = config.build(VexClock, |port| wire_motor(port))?;
//! ```

use std::collections::HashSet;

use log::info;

use crate::{
    error::{Error, Result},
    group::{MAX_MOTORS, MotorGroup},
    motion::{
        pid::PidConstants,
        threshold::{PositionalThreshold, SpeedPair},
    },
    opcontrol::controller::Binding,
    peripherals::{BrakeMode, Clock, MotorDevice},
    robot::{Mechanism, Robot},
};

/// A smart port and the motor's polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotorPort {
    pub port:     u8,
    pub reversed: bool,
}

impl MotorPort {
    /// A motor spinning in its normal direction.
    pub const fn new(port: u8) -> Self {
        Self {
            port,
            reversed: false,
        }
    }

    /// A motor mounted the other way round.
    pub const fn reversed(port: u8) -> Self {
        Self {
            port,
            reversed: true,
        }
    }
}

/// Configuration for one motor group.
#[derive(Debug, Clone, PartialEq)]
pub struct MotorGroupConfig {
    /// Name used by autonomous steps.
    pub name:      &'static str,
    /// Motors in device order.
    pub ports:     Vec<MotorPort>,
    pub speeds:    SpeedPair,
    /// `(start, end, speeds)`.
    pub threshold: Option<(i32, i32, SpeedPair)>,
    pub brake:     Option<BrakeMode>,
    pub pid:       PidConstants,
    pub turn_pid:  PidConstants,
    pub binding:   Binding,
}

impl MotorGroupConfig {
    /// Full-power directional speeds, no threshold, zero PID constants and
    /// no operator binding.
    pub fn new(name: &'static str, ports: impl IntoIterator<Item = MotorPort>) -> Self {
        Self {
            name,
            ports: ports.into_iter().collect(),
            speeds: SpeedPair::default(),
            threshold: None,
            brake: None,
            pid: PidConstants::default(),
            turn_pid: PidConstants::default(),
            binding: Binding::None,
        }
    }

    pub fn with_speeds(mut self, speeds: SpeedPair) -> Self {
        self.speeds = speeds;
        self
    }

    pub fn with_threshold(mut self, start: i32, end: i32, speeds: SpeedPair) -> Self {
        self.threshold = Some((start, end, speeds));
        self
    }

    pub fn with_brake(mut self, brake: BrakeMode) -> Self {
        self.brake = Some(brake);
        self
    }

    pub fn with_pid(mut self, pid: PidConstants) -> Self {
        self.pid = pid;
        self
    }

    pub fn with_turn_pid(mut self, turn_pid: PidConstants) -> Self {
        self.turn_pid = turn_pid;
        self
    }

    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.binding = binding;
        self
    }

    /// Rejects anything [`RobotConfig::build`] could not turn into a group.
    pub fn validate(&self) -> Result<()> {
        if self.ports.is_empty() {
            return Err(Error::EmptyGroup);
        }
        if self.ports.len() > MAX_MOTORS {
            return Err(Error::TooManyMotors {
                max:    MAX_MOTORS,
                actual: self.ports.len(),
            });
        }
        if let Some((start, end, speeds)) = self.threshold {
            PositionalThreshold::new(start, end, speeds)?;
        }
        self.binding.validate(self.ports.len())
    }
}

/// Every motor group on the robot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RobotConfig {
    pub groups: Vec<MotorGroupConfig>,
}

impl RobotConfig {
    pub fn new() -> Self { Self::default() }

    /// Adds a group. Groups are driven in the order they are added.
    pub fn group(mut self, group: MotorGroupConfig) -> Self {
        self.groups.push(group);
        self
    }

    /// Checks every group and that names are unique.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for group in &self.groups {
            if !names.insert(group.name) {
                return Err(Error::DuplicateMechanism(group.name.to_string()));
            }
            group.validate()?;
        }
        Ok(())
    }

    /// Wires and configures every group.
    ///
    /// `wire` is called once per motor, in configuration order, to obtain
    /// the device for a port. Nothing is wired unless the whole
    /// configuration validates.
    pub fn build<D, C, F>(self, clock: C, mut wire: F) -> Result<Robot<D, C>>
    where
        D: MotorDevice,
        C: Clock + Clone,
        F: FnMut(MotorPort) -> D,
    {
        self.validate()?;

        let mut mechanisms = Vec::with_capacity(self.groups.len());
        for config in self.groups {
            let motors = config.ports.iter().map(|&port| wire(port));
            let mut group = MotorGroup::new(motors, config.speeds, clock.clone())?;
            if let Some(brake) = config.brake {
                group.set_brake(brake);
            }
            if let Some((start, end, speeds)) = config.threshold {
                group.set_threshold(start, end, speeds)?;
            }
            group.set_pid_constants(config.pid.kp, config.pid.ki, config.pid.kd);
            group.set_pid_turn_constants(
                config.turn_pid.kp,
                config.turn_pid.ki,
                config.turn_pid.kd,
            );
            info!("Configured `{}` with {} motors", config.name, group.len());
            mechanisms.push(Mechanism::new(config.name, group, config.binding));
        }

        Ok(Robot::new(mechanisms, clock))
    }
}
