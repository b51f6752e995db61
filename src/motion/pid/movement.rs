//! Blocking PID moves on a [`MotorGroup`].
//!
//! Each move borrows the group mutably for its whole duration, so nothing
//! else can command the same motors while it runs. The loop yields only at
//! [`Clock::sleep`] between ticks.
//!
//! By default a move runs until it settles, however long that takes. Pass
//! [`MoveOptions`] with a timeout or a [`CancelToken`] to bound it.
//!
//! # Example
//!
//! ```ignore
//! drive.set_pid_constants(0.5, 0.0, 0.1);
//! drive.move_pid(2000, 127, 10).await?;
//!
//! let options = MoveOptions::default().with_timeout(Duration::from_secs(2));
//! drive.turn_pid_with(600, 80, 10, &options).await?;
//! ```

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use log::{info, trace, warn};

use super::pid::{LOOP_PERIOD, PidConstants, PidRun, SettleTimer};
use crate::{
    error::{Error, Result},
    group::MotorGroup,
    peripherals::{Clock, MotorDevice, Power},
};

/// A shared flag that stops a running move or operator loop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self { Self::default() }

    pub fn cancel(&self) { self.0.store(true, Ordering::Release); }

    pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Acquire) }
}

/// Bounds on a blocking move. The default has none.
#[derive(Debug, Clone, Default)]
pub struct MoveOptions {
    /// Give up and report [`Error::NotSettled`] after this long.
    pub timeout: Option<Duration>,
    /// Give up and report [`Error::Cancelled`] once this fires.
    pub cancel:  Option<CancelToken>,
}

impl MoveOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

/// Summary of a settled move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveReport {
    /// Control ticks executed.
    pub ticks:       u32,
    /// Time from the first tick to the settling tick.
    pub elapsed:     Duration,
    /// Error on the settling tick.
    pub final_error: i32,
}

/// How the controller output is spread over the motors.
#[derive(Clone, Copy)]
enum Drive<'a> {
    /// Same power everywhere.
    Uniform,
    /// Power times a per-motor multiplier.
    Scaled(&'a [f64]),
    /// First half forward, second half reversed.
    Mirrored,
}

struct Plan<'a> {
    target:    i32,
    max_power: Power,
    tolerance: i32,
    constants: PidConstants,
    drive:     Drive<'a>,
    /// Motors whose encoders feed the error. `None` means all of them.
    sensors:   Option<&'a [usize]>,
}

impl<D: MotorDevice, C: Clock> MotorGroup<D, C> {
    /// Moves every motor by `target` encoder ticks and blocks until settled.
    ///
    /// Encoders are tared first, so `target` is relative to where the group
    /// is now. Negative targets move backward.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidTolerance`] if `error_threshold` is not positive.
    pub async fn move_pid(
        &mut self,
        target: i32,
        max_power: Power,
        error_threshold: i32,
    ) -> Result<MoveReport> {
        self.move_pid_with(target, max_power, error_threshold, &MoveOptions::default())
            .await
    }

    /// [`move_pid`](Self::move_pid) with a timeout and/or cancel token.
    pub async fn move_pid_with(
        &mut self,
        target: i32,
        max_power: Power,
        error_threshold: i32,
        options: &MoveOptions,
    ) -> Result<MoveReport> {
        let plan = Plan {
            target,
            max_power,
            tolerance: error_threshold,
            constants: self.pid_constants(),
            drive: Drive::Uniform,
            sensors: None,
        };
        self.run_pid(plan, options).await
    }

    /// Positional move with per-motor power scaling.
    ///
    /// Each motor receives the controller output times `scaling[i]`; a zero
    /// multiplier lets that motor coast. Only the encoders listed in
    /// `indices` are averaged into the error, keeping motors that are expected
    /// to slip out of the control signal.
    ///
    /// # Errors
    ///
    /// [`Error::LengthMismatch`] if `scaling` does not have one entry per
    /// motor, [`Error::EmptyIndexSubset`] or [`Error::IndexOutOfRange`] for a
    /// bad `indices` list, [`Error::InvalidTolerance`] as for
    /// [`move_pid`](Self::move_pid). Nothing is tared or commanded when
    /// validation fails.
    pub async fn move_pid_indices(
        &mut self,
        target: i32,
        max_power: Power,
        error_threshold: i32,
        scaling: &[f64],
        indices: &[usize],
        options: &MoveOptions,
    ) -> Result<MoveReport> {
        self.check_len(scaling.len())?;
        self.check_indices(indices)?;
        let plan = Plan {
            target,
            max_power,
            tolerance: error_threshold,
            constants: self.pid_constants(),
            drive: Drive::Scaled(scaling),
            sensors: Some(indices),
        };
        self.run_pid(plan, options).await
    }

    /// Turns in place by `target` encoder ticks using the turn constants.
    ///
    /// The first `ceil(n / 2)` motors receive the output and the remaining
    /// motors its negation.
    pub async fn turn_pid(
        &mut self,
        target: i32,
        max_power: Power,
        error_threshold: i32,
    ) -> Result<MoveReport> {
        self.turn_pid_with(target, max_power, error_threshold, &MoveOptions::default())
            .await
    }

    /// [`turn_pid`](Self::turn_pid) with a timeout and/or cancel token.
    pub async fn turn_pid_with(
        &mut self,
        target: i32,
        max_power: Power,
        error_threshold: i32,
        options: &MoveOptions,
    ) -> Result<MoveReport> {
        let plan = Plan {
            target,
            max_power,
            tolerance: error_threshold,
            constants: self.pid_turn_constants(),
            drive: Drive::Mirrored,
            sensors: None,
        };
        self.run_pid(plan, options).await
    }

    async fn run_pid(&mut self, plan: Plan<'_>, options: &MoveOptions) -> Result<MoveReport> {
        if plan.tolerance <= 0 {
            return Err(Error::InvalidTolerance(plan.tolerance));
        }

        info!(
            "PID move to {} started (max power {}, tolerance {})",
            plan.target, plan.max_power, plan.tolerance
        );
        self.clear_encoders();

        let mut pid = PidRun::new();
        let mut settle = SettleTimer::default();
        let started = self.clock().now();
        let mut ticks = 0;

        loop {
            if options.is_cancelled() {
                self.stop();
                let elapsed = self.clock().now().saturating_sub(started);
                warn!("PID move cancelled after {:?}", elapsed);
                return Err(Error::Cancelled { elapsed });
            }

            let position = match plan.sensors {
                Some(indices) => self.average_position_of(indices),
                None => self.average_position(),
            };
            // Backward moves add the (absolute) position so one formula
            // serves both directions.
            let error = if plan.target >= 0 {
                plan.target.saturating_sub(position)
            } else {
                plan.target.saturating_add(position)
            };

            let prev_error = pid.prev_error();
            let step = pid.step(error, &plan.constants, plan.max_power);
            self.apply_output(step.power, plan.drive);
            ticks += 1;
            trace!(
                "PID tick {}: error {} (prev {}), power {}",
                ticks, error, prev_error, step.power
            );

            let now = self.clock().now();
            let elapsed = now.saturating_sub(started);
            let within =
                error.unsigned_abs() < plan.tolerance.unsigned_abs() &&
                    step.derivative.unsigned_abs() < plan.tolerance.unsigned_abs();
            if settle.update(within, now) {
                self.stop();
                info!("PID move settled after {:?} ({} ticks)", elapsed, ticks);
                return Ok(MoveReport {
                    ticks,
                    elapsed,
                    final_error: error,
                });
            }

            if let Some(limit) = options.timeout {
                if elapsed >= limit {
                    self.stop();
                    warn!("PID move did not settle within {:?} (error {})", limit, error);
                    return Err(Error::NotSettled { elapsed, error });
                }
            }

            self.clock().sleep(LOOP_PERIOD).await;
        }
    }

    fn apply_output(&mut self, power: Power, drive: Drive<'_>) {
        match drive {
            Drive::Uniform => self.broadcast(power),
            Drive::Scaled(scaling) => {
                for (motor, &scale) in self.motors_mut().iter_mut().zip(scaling) {
                    motor.apply_power((power as f64 * scale) as Power);
                }
            }
            Drive::Mirrored => {
                let split = self.len().div_ceil(2);
                for (i, motor) in self.motors_mut().iter_mut().enumerate() {
                    motor.apply_power(if i < split { power } else { -power });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use embassy_futures::block_on;

    use super::*;
    use crate::{
        motion::{pid::SETTLE_TIME, threshold::SpeedPair},
        peripherals::{
            make_cloneable,
            sim::{SimClock, SimMotor},
        },
    };

    type Handle = Rc<RefCell<SimMotor>>;

    fn drive_of(n: u8) -> (MotorGroup<Handle, SimClock>, Vec<Handle>, SimClock) {
        drive_with(n, 0.2)
    }

    fn drive_with(
        n: u8,
        ticks_per_power: f64,
    ) -> (MotorGroup<Handle, SimClock>, Vec<Handle>, SimClock) {
        let clock = SimClock::new();
        let handles: Vec<Handle> = (1..=n)
            .map(|port| {
                make_cloneable(SimMotor::new(port, false).with_ticks_per_power(ticks_per_power))
            })
            .collect();
        let mut group =
            MotorGroup::new(handles.clone(), SpeedPair::default(), clock.clone()).unwrap();
        group.set_pid_constants(0.5, 0.0, 0.0);
        group.set_pid_turn_constants(0.5, 0.0, 0.0);
        (group, handles, clock)
    }

    fn bounded() -> MoveOptions { MoveOptions::default().with_timeout(Duration::from_secs(10)) }

    #[test]
    fn zero_move_settles_after_settle_time_and_stops() {
        let (mut group, handles, clock) = drive_of(2);
        let report = block_on(group.move_pid(0, 100, 10)).unwrap();

        assert_eq!(report.final_error, 0);
        assert_eq!(report.elapsed, SETTLE_TIME);
        assert_eq!(report.ticks, 6);
        assert_eq!(clock.now(), SETTLE_TIME);
        for handle in &handles {
            assert_eq!(handle.borrow().power(), 0);
        }
    }

    #[test]
    fn move_is_relative_to_position_at_call_time() {
        let (mut group, handles, _) = drive_of(2);
        for handle in &handles {
            handle.borrow_mut().set_position(5000);
        }
        let report = block_on(group.move_pid_with(0, 100, 10, &bounded())).unwrap();
        assert_eq!(report.ticks, 6);
        assert_eq!(group.average_position(), 0);
    }

    #[test]
    fn forward_move_reaches_target_within_power_limit() {
        let (mut group, handles, _) = drive_of(2);
        let report = block_on(group.move_pid_with(2000, 100, 10, &bounded())).unwrap();

        assert!(report.final_error.abs() < 10);
        assert!(report.elapsed >= SETTLE_TIME);
        assert!((group.average_position() - 2000).abs() < 10);
        for handle in &handles {
            let motor = handle.borrow();
            assert_eq!(motor.history()[0], 100);
            assert!(motor.history().iter().all(|p| p.abs() <= 100));
            assert_eq!(motor.power(), 0);
        }
    }

    #[test]
    fn backward_move_drives_negative() {
        let (mut group, handles, _) = drive_of(2);
        block_on(group.move_pid_with(-1000, 127, 10, &bounded())).unwrap();

        for handle in &handles {
            let motor = handle.borrow();
            assert_eq!(motor.history()[0], -127);
            assert!((motor.position() + 1000).abs() < 10);
        }
    }

    #[test]
    fn turn_mirrors_power_across_halves() {
        let (mut group, handles, _) = drive_of(4);
        // Straight constants that cannot move anything prove the turn set is used.
        group.set_pid_constants(0.0, 0.0, 0.0);
        block_on(group.turn_pid_with(600, 80, 10, &bounded())).unwrap();

        let history: Vec<Vec<Power>> =
            handles.iter().map(|h| h.borrow().history().to_vec()).collect();
        assert_eq!(history[0][0], 80);
        for tick in 0..history[0].len() {
            assert_eq!(history[0][tick], history[1][tick]);
            assert_eq!(history[2][tick], history[3][tick]);
            assert_eq!(history[0][tick], -history[2][tick]);
        }
        assert!(handles[0].borrow().position() > 590);
        assert!(handles[3].borrow().position() < -590);
    }

    #[test]
    fn turn_with_odd_count_gives_extra_motor_to_first_half() {
        let (mut group, handles, _) = drive_of(3);
        block_on(group.turn_pid_with(-300, 60, 10, &bounded())).unwrap();

        let first: Vec<Power> = handles.iter().map(|h| h.borrow().history()[0]).collect();
        assert_eq!(first, vec![-60, -60, 60]);
    }

    #[test]
    fn fast_entry_into_tolerance_does_not_settle() {
        // One command carries the motors from 0 to 93: the error lands at 7,
        // inside tolerance, but it changed by 93 that tick.
        let (mut group, handles, _) = drive_with(2, 1.875);
        let report = block_on(group.move_pid_with(100, 127, 10, &bounded())).unwrap();

        assert_eq!(handles[0].borrow().history()[..2], [50, 3]);
        // The settle span starts on the third tick (20 ms), not the second.
        assert_eq!(report.ticks, 8);
        assert_eq!(report.elapsed, Duration::from_millis(70));
        assert_eq!(report.final_error, 1);
    }

    #[test]
    fn stalled_move_times_out_and_stops() {
        let (mut group, handles, _) = drive_with(2, 0.0);
        let options = MoveOptions::default().with_timeout(Duration::from_millis(200));
        let result = block_on(group.move_pid_with(500, 100, 10, &options));

        assert_eq!(
            result,
            Err(Error::NotSettled {
                elapsed: Duration::from_millis(200),
                error:   500,
            })
        );
        for handle in &handles {
            assert_eq!(handle.borrow().power(), 0);
        }
    }

    #[test]
    fn cancelled_move_stops_without_driving() {
        let (mut group, handles, _) = drive_of(2);
        let cancel = CancelToken::new();
        cancel.cancel();
        let options = MoveOptions::default().with_cancel(cancel);

        let result = block_on(group.move_pid_with(2000, 100, 10, &options));
        assert_eq!(result, Err(Error::Cancelled { elapsed: Duration::ZERO }));
        for handle in &handles {
            assert_eq!(handle.borrow().history(), &[0]);
        }
    }

    #[test]
    fn non_positive_tolerance_is_rejected() {
        let (mut group, handles, _) = drive_of(2);
        assert_eq!(block_on(group.move_pid(100, 100, 0)), Err(Error::InvalidTolerance(0)));
        assert_eq!(block_on(group.turn_pid(100, 100, -5)), Err(Error::InvalidTolerance(-5)));
        assert!(handles.iter().all(|h| h.borrow().history().is_empty()));
    }

    #[test]
    fn subset_move_coasts_scaled_motors_and_reads_chosen_encoders() {
        let (mut group, handles, _) = drive_of(4);
        let report = block_on(group.move_pid_indices(
            1000,
            100,
            10,
            &[1.0, 1.0, 0.0, 0.0],
            &[0, 1],
            &bounded(),
        ))
        .unwrap();

        assert!(report.final_error.abs() < 10);
        assert!((handles[0].borrow().position() - 1000).abs() < 10);
        assert!(handles[2].borrow().history().iter().all(|&p| p == 0));
        assert!(handles[3].borrow().history().iter().all(|&p| p == 0));
        assert_eq!(handles[3].borrow().position(), 0);
    }

    #[test]
    fn subset_move_applies_fractional_scaling() {
        let (mut group, handles, _) = drive_of(2);
        block_on(group.move_pid_indices(1000, 100, 10, &[1.0, 0.5], &[0], &bounded())).unwrap();
        assert_eq!(handles[0].borrow().history()[0], 100);
        assert_eq!(handles[1].borrow().history()[0], 50);
    }

    #[test]
    fn subset_move_validates_before_touching_motors() {
        let (mut group, handles, _) = drive_of(2);
        handles[0].borrow_mut().set_position(42);

        let result = block_on(group.move_pid_indices(100, 100, 10, &[1.0], &[0], &bounded()));
        assert_eq!(result, Err(Error::LengthMismatch { expected: 2, actual: 1 }));

        let result =
            block_on(group.move_pid_indices(100, 100, 10, &[1.0, 1.0], &[0, 5], &bounded()));
        assert_eq!(result, Err(Error::IndexOutOfRange { index: 5, len: 2 }));

        let result = block_on(group.move_pid_indices(100, 100, 10, &[1.0, 1.0], &[], &bounded()));
        assert_eq!(result, Err(Error::EmptyIndexSubset));

        assert_eq!(handles[0].borrow().position(), 42);
        assert!(handles.iter().all(|h| h.borrow().history().is_empty()));
    }
}
