//! Simulation backend.
//!
//! [`SimMotor`] integrates its encoder from the power it is given, one step
//! per command, and records every command for inspection. [`SimClock`] keeps
//! virtual time that only moves when a control loop sleeps, so a PID move
//! that would take seconds on a robot finishes instantly and
//! deterministically. [`ScriptedInput`] replays controller frames.

use std::{cell::Cell, collections::VecDeque, rc::Rc, time::Duration};

use super::{
    BrakeMode, Clock, MAX_POWER, MotorDevice, Power,
    controller::{ControllerFrame, InputSource},
};

/// Encoder ticks gained per unit of power per command by default.
pub const DEFAULT_TICKS_PER_POWER: f64 = 0.2;

/// A simulated motor.
#[derive(Debug, Clone)]
pub struct SimMotor {
    port:            u8,
    reversed:        bool,
    power:           Power,
    position:        f64,
    brake_mode:      BrakeMode,
    ticks_per_power: f64,
    history:         Vec<Power>,
}

impl SimMotor {
    pub fn new(port: u8, reversed: bool) -> Self {
        Self {
            port,
            reversed,
            power: 0,
            position: 0.0,
            brake_mode: BrakeMode::default(),
            ticks_per_power: DEFAULT_TICKS_PER_POWER,
            history: Vec::new(),
        }
    }

    /// Sets how far the encoder advances per unit of power per command.
    ///
    /// Zero models a stalled or disconnected motor.
    pub fn with_ticks_per_power(mut self, ticks_per_power: f64) -> Self {
        self.ticks_per_power = ticks_per_power;
        self
    }

    /// Places the encoder at `position` without recording a command.
    pub fn set_position(&mut self, position: i32) { self.position = position as f64; }

    /// The smart port this motor stands in for.
    pub fn port(&self) -> u8 { self.port }

    pub fn is_reversed(&self) -> bool { self.reversed }

    /// The last commanded power.
    pub fn power(&self) -> Power { self.power }

    pub fn brake_mode(&self) -> BrakeMode { self.brake_mode }

    /// Every power command received, oldest first.
    pub fn history(&self) -> &[Power] { &self.history }

}

impl MotorDevice for SimMotor {
    fn apply_power(&mut self, power: Power) {
        let power = power.clamp(-MAX_POWER, MAX_POWER);
        self.power = power;
        self.history.push(power);
        self.position += power as f64 * self.ticks_per_power;
    }

    fn position(&self) -> i32 { self.position as i32 }

    fn tare_position(&mut self) { self.position = 0.0; }

    fn set_brake_mode(&mut self, mode: BrakeMode) { self.brake_mode = mode; }
}

/// Virtual time shared between clones.
///
/// Sleeping advances the shared time immediately and never blocks.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now:    Rc<Cell<Duration>>,
    sleeps: Rc<Cell<u64>>,
}

impl SimClock {
    pub fn new() -> Self { Self::default() }

    /// Moves time forward without a sleep.
    pub fn advance(&self, duration: Duration) { self.now.set(self.now.get() + duration); }

    /// Number of sleeps taken so far.
    pub fn sleeps(&self) -> u64 { self.sleeps.get() }
}

impl Clock for SimClock {
    fn now(&self) -> Duration { self.now.get() }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.set(self.sleeps.get() + 1);
        self.advance(duration);
    }
}

/// Replays a fixed list of frames, then repeats the last one forever.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<ControllerFrame>,
    last:   ControllerFrame,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = ControllerFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            last:   ControllerFrame::neutral(),
        }
    }

    /// Frames not yet replayed.
    pub fn remaining(&self) -> usize { self.frames.len() }
}

impl InputSource for ScriptedInput {
    fn frame(&mut self) -> ControllerFrame {
        if let Some(frame) = self.frames.pop_front() {
            self.last = frame;
        }
        self.last
    }
}
