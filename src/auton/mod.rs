//! Autonomous routines.
//!
//! A [`Routine`] is a fixed list of [`Step`]s run strictly in order against
//! the robot's named motor groups. PID steps block until the move settles;
//! [`Step::RunUntil`] holds a dual-button run until the group passes a
//! position.
//!
//! # Example
//!
//! ```ignore
//! use lockstep::auton::{Routine, Step};
//!
//! let routine = Routine::new(vec![
//!     Step::run("scooper", 127),
//!     Step::move_pid("drive", 2000),
//!     Step::move_pid("drive", -1100),
//!     Step::stop("scooper"),
//!     Step::turn_pid("drive", 600),
//!     Step::move_pid_at("drive", 2500, 80),
//!     Step::run_until("ramp", 3000),
//! ]);
//! routine.run(&mut robot).await?;
//! ```

use std::time::Duration;

use log::{info, warn};

use crate::{
    error::{Error, Result},
    group::RunCommand,
    motion::pid::{LOOP_PERIOD, MoveOptions},
    peripherals::{Clock, MAX_POWER, MotorDevice, Power},
    robot::Robot,
};

/// Max power for PID steps that do not name one.
pub const DEFAULT_MAX_POWER: Power = MAX_POWER;

/// Error tolerance for PID steps that do not name one.
pub const DEFAULT_TOLERANCE: i32 = 10;

/// One autonomous action on a named mechanism.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Uniform power, returns immediately.
    Run { mechanism: &'static str, power: Power },
    /// Per-motor power, returns immediately.
    RunEach {
        mechanism: &'static str,
        powers:    Vec<Power>,
    },
    /// One dual-button run through the group's speeds and threshold,
    /// returns immediately.
    RunButtons {
        mechanism: &'static str,
        forward:   bool,
        backward:  bool,
    },
    Stop { mechanism: &'static str },
    MovePid {
        mechanism: &'static str,
        target:    i32,
        max_power: Power,
        tolerance: i32,
    },
    TurnPid {
        mechanism: &'static str,
        target:    i32,
        max_power: Power,
        tolerance: i32,
    },
    /// Dual-button run, one press per tick, until the average position
    /// reaches `limit`; then stop.
    RunUntil {
        mechanism: &'static str,
        forward:   bool,
        limit:     i32,
    },
    Wait(Duration),
}

impl Step {
    pub fn run(mechanism: &'static str, power: Power) -> Self { Step::Run { mechanism, power } }

    pub fn stop(mechanism: &'static str) -> Self { Step::Stop { mechanism } }

    /// A positional move at full power and default tolerance.
    pub fn move_pid(mechanism: &'static str, target: i32) -> Self {
        Self::move_pid_at(mechanism, target, DEFAULT_MAX_POWER)
    }

    pub fn move_pid_at(mechanism: &'static str, target: i32, max_power: Power) -> Self {
        Step::MovePid {
            mechanism,
            target,
            max_power,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// A turning move at full power and default tolerance.
    pub fn turn_pid(mechanism: &'static str, target: i32) -> Self {
        Step::TurnPid {
            mechanism,
            target,
            max_power: DEFAULT_MAX_POWER,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Holds the forward button until the average position reaches `limit`.
    pub fn run_until(mechanism: &'static str, limit: i32) -> Self {
        Step::RunUntil {
            mechanism,
            forward: true,
            limit,
        }
    }
}

/// An ordered list of steps.
#[derive(Debug, Clone, Default)]
pub struct Routine {
    steps:   Vec<Step>,
    options: MoveOptions,
}

impl Routine {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            options: MoveOptions::default(),
        }
    }

    /// Bounds every blocking step. The timeout applies per step.
    pub fn with_options(mut self, options: MoveOptions) -> Self {
        self.options = options;
        self
    }


    /// Runs every step in order.
    ///
    /// The first failing step ends the routine and stops every mechanism on
    /// the robot, including ones earlier steps left running.
    pub async fn run<D: MotorDevice, C: Clock>(&self, robot: &mut Robot<D, C>) -> Result<()> {
        info!("Autonomous routine started ({} steps)", self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            info!("Step {}: {:?}", index, step);
            if let Err(e) = self.run_step(robot, step).await {
                robot.stop_all();
                warn!("Step {} failed: {}", index, e);
                return Err(e);
            }
        }
        info!("Autonomous routine finished");
        Ok(())
    }

    async fn run_step<D: MotorDevice, C: Clock>(
        &self,
        robot: &mut Robot<D, C>,
        step: &Step,
    ) -> Result<()> {
        match step {
            Step::Run { mechanism, power } => {
                robot.group_mut(mechanism)?.run(RunCommand::Uniform(*power))
            }
            Step::RunEach { mechanism, powers } => {
                robot.group_mut(mechanism)?.run(RunCommand::Each(powers))
            }
            Step::RunButtons {
                mechanism,
                forward,
                backward,
            } => robot.group_mut(mechanism)?.run(RunCommand::Buttons {
                forward:  *forward,
                backward: *backward,
            }),
            Step::Stop { mechanism } => {
                robot.group_mut(mechanism)?.stop();
                Ok(())
            }
            Step::MovePid {
                mechanism,
                target,
                max_power,
                tolerance,
            } => robot
                .group_mut(mechanism)?
                .move_pid_with(*target, *max_power, *tolerance, &self.options)
                .await
                .map(|_| ()),
            Step::TurnPid {
                mechanism,
                target,
                max_power,
                tolerance,
            } => robot
                .group_mut(mechanism)?
                .turn_pid_with(*target, *max_power, *tolerance, &self.options)
                .await
                .map(|_| ()),
            Step::RunUntil {
                mechanism,
                forward,
                limit,
            } => self.run_until(robot, mechanism, *forward, *limit).await,
            Step::Wait(duration) => {
                robot.clock().sleep(*duration).await;
                Ok(())
            }
        }
    }

    async fn run_until<D: MotorDevice, C: Clock>(
        &self,
        robot: &mut Robot<D, C>,
        mechanism: &str,
        forward: bool,
        limit: i32,
    ) -> Result<()> {
        let group = robot.group_mut(mechanism)?;
        let started = group.clock().now();
        while group.average_position() < limit {
            let elapsed = group.clock().now().saturating_sub(started);
            if self.options.is_cancelled() {
                group.stop();
                return Err(Error::Cancelled { elapsed });
            }
            if self.options.timeout.is_some_and(|bound| elapsed >= bound) {
                group.stop();
                return Err(Error::NotSettled {
                    elapsed,
                    error: limit - group.average_position(),
                });
            }
            group.run(RunCommand::Buttons {
                forward,
                backward: !forward,
            })?;
            group.clock().sleep(LOOP_PERIOD).await;
        }
        group.stop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashMap, rc::Rc};

    use embassy_futures::block_on;

    use super::*;
    use crate::{
        config::{MotorGroupConfig, MotorPort, RobotConfig},
        motion::{
            pid::{CancelToken, PidConstants},
            threshold::SpeedPair,
        },
        peripherals::{
            BrakeMode, make_cloneable,
            sim::{SimClock, SimMotor},
        },
    };

    type Handle = Rc<RefCell<SimMotor>>;

    fn pushbot(
        clock: &SimClock,
        ticks_per_power: f64,
    ) -> (Robot<Handle, SimClock>, HashMap<u8, Handle>) {
        let mut motors = HashMap::new();
        let robot = RobotConfig::new()
            .group(
                MotorGroupConfig::new("drive", [
                    MotorPort::reversed(1),
                    MotorPort::reversed(2),
                    MotorPort::new(3),
                    MotorPort::new(4),
                ])
                .with_brake(BrakeMode::Brake)
                .with_pid(PidConstants::new(0.5, 0.0, 0.0))
                .with_turn_pid(PidConstants::new(0.5, 0.0, 0.0)),
            )
            .group(
                MotorGroupConfig::new("ramp", [MotorPort::new(5), MotorPort::reversed(6)])
                    .with_speeds(SpeedPair::new(40, -60))
                    .with_threshold(1500, 2000, SpeedPair::new(20, -60)),
            )
            .group(
                MotorGroupConfig::new("scooper", [MotorPort::new(12), MotorPort::reversed(13)])
                    .with_speeds(SpeedPair::new(100, -40)),
            )
            .build(clock.clone(), |port| {
                let motor = make_cloneable(
                    SimMotor::new(port.port, port.reversed).with_ticks_per_power(ticks_per_power),
                );
                motors.insert(port.port, motor.clone());
                motor
            })
            .unwrap();
        (robot, motors)
    }

    #[test]
    fn match_routine_runs_in_order() {
        let clock = SimClock::new();
        let (mut robot, motors) = pushbot(&clock, 0.2);
        let routine = Routine::new(vec![
            Step::run("scooper", 127),
            Step::move_pid("drive", 2000),
            Step::move_pid("drive", -1100),
            Step::stop("scooper"),
            Step::turn_pid("drive", 600),
            Step::move_pid_at("drive", 2500, 80),
            Step::Wait(Duration::from_millis(100)),
            Step::run_until("ramp", 3000),
        ])
        .with_options(MoveOptions::default().with_timeout(Duration::from_secs(10)));

        block_on(routine.run(&mut robot)).unwrap();

        // The scooper ran before the first move and stopped before the turn.
        let scooper = motors[&12].borrow();
        assert_eq!(scooper.history(), &[127, 0]);

        // Last drive move was a straight 2500 at 80 power.
        let front_left = motors[&1].borrow();
        assert!(front_left.history().iter().all(|p| p.abs() <= 127));
        assert!((front_left.position() - 2500).abs() < 10);
        assert_eq!(front_left.power(), 0);

        // The ramp slowed inside the threshold and stopped past the limit.
        let ramp = robot.group("ramp").unwrap();
        assert!(ramp.average_position() >= 3000);
        let ramp_history = motors[&5].borrow().history().to_vec();
        assert_eq!(ramp_history.first(), Some(&40));
        assert!(ramp_history.contains(&20));
        assert_eq!(ramp_history.last(), Some(&0));
    }

    #[test]
    fn run_until_honours_timeout() {
        let clock = SimClock::new();
        let (mut robot, motors) = pushbot(&clock, 0.0);
        let routine = Routine::new(vec![Step::run_until("ramp", 3000)])
            .with_options(MoveOptions::default().with_timeout(Duration::from_millis(100)));

        let result = block_on(routine.run(&mut robot));
        assert_eq!(
            result,
            Err(Error::NotSettled {
                elapsed: Duration::from_millis(100),
                error:   3000,
            })
        );
        assert_eq!(motors[&5].borrow().power(), 0);
    }

    #[test]
    fn cancellation_stops_the_routine() {
        let clock = SimClock::new();
        let (mut robot, motors) = pushbot(&clock, 0.2);
        let cancel = CancelToken::new();
        cancel.cancel();
        let routine = Routine::new(vec![
            Step::run("scooper", 127),
            Step::move_pid("drive", 2000),
            Step::stop("scooper"),
        ])
        .with_options(MoveOptions::default().with_cancel(cancel));

        let result = block_on(routine.run(&mut robot));
        assert!(matches!(result, Err(Error::Cancelled { .. })));
        // The scooper ran until the cancelled move ended the routine.
        assert_eq!(motors[&12].borrow().history(), &[127, 0]);
    }

    #[test]
    fn failed_move_stops_mechanisms_left_running() {
        let clock = SimClock::new();
        let (mut robot, motors) = pushbot(&clock, 0.0);
        let routine = Routine::new(vec![
            Step::run("scooper", 127),
            Step::move_pid("drive", 2000),
            Step::stop("scooper"),
        ])
        .with_options(MoveOptions::default().with_timeout(Duration::from_millis(100)));

        let result = block_on(routine.run(&mut robot));
        assert_eq!(
            result,
            Err(Error::NotSettled {
                elapsed: Duration::from_millis(100),
                error:   2000,
            })
        );
        assert_eq!(motors[&12].borrow().power(), 0);
        assert_eq!(motors[&13].borrow().power(), 0);
        assert_eq!(motors[&1].borrow().power(), 0);
    }

    #[test]
    fn button_step_uses_threshold_speeds() {
        let clock = SimClock::new();
        let (mut robot, motors) = pushbot(&clock, 0.2);
        motors[&5].borrow_mut().set_position(1800);
        motors[&6].borrow_mut().set_position(-1800);
        let routine = Routine::new(vec![
            Step::RunButtons {
                mechanism: "ramp",
                forward:   true,
                backward:  false,
            },
            Step::RunButtons {
                mechanism: "scooper",
                forward:   false,
                backward:  true,
            },
        ]);

        block_on(routine.run(&mut robot)).unwrap();
        assert_eq!(motors[&5].borrow().power(), 20);
        assert_eq!(motors[&12].borrow().power(), -40);
    }

    #[test]
    fn unknown_mechanism_fails_the_step() {
        let clock = SimClock::new();
        let (mut robot, _) = pushbot(&clock, 0.2);
        let routine = Routine::new(vec![Step::run("lift", 50)]);
        assert_eq!(
            block_on(routine.run(&mut robot)),
            Err(Error::UnknownMechanism("lift".to_string()))
        );
    }

    #[test]
    fn per_motor_step_checks_length() {
        let clock = SimClock::new();
        let (mut robot, motors) = pushbot(&clock, 0.2);
        let routine = Routine::new(vec![
            Step::RunEach {
                mechanism: "drive",
                powers:    vec![50, 50, -50, -50],
            },
            Step::RunEach {
                mechanism: "drive",
                powers:    vec![50],
            },
        ]);
        assert_eq!(
            block_on(routine.run(&mut robot)),
            Err(Error::LengthMismatch {
                expected: 4,
                actual:   1,
            })
        );
        assert_eq!(motors[&3].borrow().history(), &[-50, 0]);
    }
}
