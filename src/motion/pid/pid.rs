//! PID constants and the per-move controller state.
//!
//! [`PidRun`] is created fresh for every blocking move and dropped when the
//! move ends, so no error history leaks from one move into the next.

use std::time::Duration;

use crate::peripherals::Power;

/// Period of every control loop tick.
pub const LOOP_PERIOD: Duration = Duration::from_millis(10);

/// How long error and error change must stay inside tolerance before a move
/// counts as settled.
pub const SETTLE_TIME: Duration = Duration::from_millis(50);

/// Symmetric bound on the accumulated integral.
pub const INTEGRAL_LIMIT: f64 = 500.0;

/// A `(kP, kI, kD)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidConstants {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
}

impl PidConstants {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self { Self { kp, ki, kd } }
}

/// Output of one controller tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidStep {
    /// Clamped output, truncated to motor power.
    pub power:      Power,
    /// Change in error since the previous tick.
    pub derivative: i32,
}

/// Error history for a single move.
#[derive(Debug, Clone, Default)]
pub struct PidRun {
    prev_error: i32,
    integral:   f64,
}

impl PidRun {
    pub fn new() -> Self { Self::default() }

    /// Advances the controller by one tick.
    ///
    /// The integral resets whenever the error changes sign (the setpoint was
    /// passed) and is otherwise clamped to [`INTEGRAL_LIMIT`]. The output is
    /// clamped to `±|max_power|`.
    pub fn step(&mut self, error: i32, constants: &PidConstants, max_power: Power) -> PidStep {
        let derivative = error.saturating_sub(self.prev_error);

        if self.prev_error != 0 && error.signum() != self.prev_error.signum() {
            self.integral = 0.0;
        } else {
            self.integral = (self.integral + error as f64).clamp(-INTEGRAL_LIMIT, INTEGRAL_LIMIT);
        }

        let output = constants.kp * error as f64 +
            constants.ki * self.integral +
            constants.kd * derivative as f64;
        self.prev_error = error;

        PidStep {
            power: abscap(output, max_power.unsigned_abs() as f64) as Power,
            derivative,
        }
    }

    pub fn prev_error(&self) -> i32 { self.prev_error }

    pub fn integral(&self) -> f64 { self.integral }
}

/// Tracks how long the settle condition has held without interruption.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettleTimer {
    since: Option<Duration>,
}

impl SettleTimer {
    /// Records this tick's verdict. Returns `true` once the condition has held
    /// for at least [`SETTLE_TIME`]; any tick outside tolerance restarts the
    /// span.
    pub fn update(&mut self, within_tolerance: bool, now: Duration) -> bool {
        if !within_tolerance {
            self.since = None;
            return false;
        }
        let since = *self.since.get_or_insert(now);
        now.saturating_sub(since) >= SETTLE_TIME
    }

    pub fn is_running(&self) -> bool { self.since.is_some() }
}

fn abscap(val: f64, cap: f64) -> f64 {
    if val > cap {
        cap
    } else if val < -cap {
        -cap
    } else {
        val
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proportional_output() {
        let mut pid = PidRun::new();
        let step = pid.step(40, &PidConstants::new(0.5, 0.0, 0.0), 127);
        assert_eq!(step.power, 20);
        assert_eq!(step.derivative, 40);
    }

    #[test]
    fn output_is_clamped_to_max_power() {
        let mut pid = PidRun::new();
        let constants = PidConstants::new(1.0, 0.0, 0.0);
        assert_eq!(pid.step(2000, &constants, 100).power, 100);
        assert_eq!(pid.step(-2000, &constants, 100).power, -100);
        // Negative max power is used by magnitude.
        assert_eq!(pid.step(2000, &constants, -60).power, 60);
        assert_eq!(pid.step(2000, &constants, Power::MIN).power, 2000);
    }

    #[test]
    fn derivative_is_tick_over_tick_change() {
        let mut pid = PidRun::new();
        let constants = PidConstants::new(0.0, 0.0, 1.0);
        pid.step(100, &constants, 127);
        let step = pid.step(70, &constants, 127);
        assert_eq!(step.derivative, -30);
        assert_eq!(step.power, -30);
        assert_eq!(pid.prev_error(), 70);
    }

    #[test]
    fn integral_accumulates_and_clamps() {
        let mut pid = PidRun::new();
        let constants = PidConstants::new(0.0, 1.0, 0.0);
        pid.step(300, &constants, 1000);
        assert_eq!(pid.integral(), 300.0);
        let step = pid.step(300, &constants, 1000);
        assert_eq!(pid.integral(), INTEGRAL_LIMIT);
        assert_eq!(step.power, 500);

        let mut pid = PidRun::new();
        for _ in 0..10 {
            pid.step(-200, &constants, 1000);
        }
        assert_eq!(pid.integral(), -INTEGRAL_LIMIT);
    }

    #[test]
    fn integral_resets_when_setpoint_is_passed() {
        let mut pid = PidRun::new();
        let constants = PidConstants::new(0.0, 1.0, 0.0);
        pid.step(300, &constants, 1000);
        pid.step(-10, &constants, 1000);
        assert_eq!(pid.integral(), 0.0);

        pid.step(-10, &constants, 1000);
        assert_eq!(pid.integral(), -10.0);

        // Landing exactly on the setpoint is a sign change too.
        pid.step(0, &constants, 1000);
        assert_eq!(pid.integral(), 0.0);

        // Leaving zero is not: the previous error was zero.
        pid.step(5, &constants, 1000);
        assert_eq!(pid.integral(), 5.0);
    }

    #[test]
    fn settle_timer_needs_continuous_span() {
        let ms = Duration::from_millis;
        let mut timer = SettleTimer::default();
        assert!(!timer.update(true, ms(0)));
        assert!(!timer.update(true, ms(40)));
        assert!(!timer.update(false, ms(45)));
        assert!(!timer.is_running());
        assert!(!timer.update(true, ms(50)));
        assert!(!timer.update(true, ms(90)));
        assert!(timer.update(true, ms(100)));
    }
}
