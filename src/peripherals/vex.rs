//! vexide backend.
//!
//! Lets a [`MotorGroup`](crate::group::MotorGroup) drive V5 smart motors and
//! read a V5 controller. Power is mapped linearly from `±127` onto `±12 V`
//! and positions are reported in degrees. Device errors are logged and
//! otherwise ignored, so a disconnected motor reads as position zero instead
//! of aborting a match.
//!
//! # Example
//!
//! ```ignore
//! use lockstep::peripherals::vex::VexClock;
//! use vexide::prelude::*;
//!
//! #[vexide::main]
//! async fn main(peripherals: Peripherals) {
//!     let mut drive = MotorGroup::new(
//!         [
//!             Motor::new(peripherals.port_1, Gearset::Green, Direction::Forward),
//!             Motor::new(peripherals.port_2, Gearset::Green, Direction::Reverse),
//!         ],
//!         SpeedPair::default(),
//!         VexClock,
//!     )
//!     .expect("drive config");
//!     drive.move_pid(2000, 127, 10).await.ok();
//! }
//! ```

use std::time::Duration;

use log::warn;
use vexide::{
    controller::{ButtonState, ControllerState},
    prelude::{Controller, Motor},
    smart::motor::BrakeMode as VexBrakeMode,
    time::{sleep, user_uptime},
};

use super::{
    BrakeMode, Clock, MAX_POWER, MotorDevice, Power,
    controller::{Axis, Button, ControllerFrame, InputSource},
};

/// Voltage at full power.
const MAX_VOLTAGE: f64 = 12.0;

impl MotorDevice for Motor {
    fn apply_power(&mut self, power: Power) {
        let voltage = power.clamp(-MAX_POWER, MAX_POWER) as f64 / MAX_POWER as f64 * MAX_VOLTAGE;
        self.set_voltage(voltage).unwrap_or_else(|e| {
            warn!("Motor Set Voltage Error: {}", e);
        });
    }

    fn position(&self) -> i32 {
        Motor::position(self)
            .map(|angle| angle.as_degrees() as i32)
            .unwrap_or_else(|e| {
                warn!("Error Getting Motor Encoder Position: {}", e);
                0
            })
    }

    fn tare_position(&mut self) {
        self.reset_position().unwrap_or_else(|e| {
            warn!("Motor Reset Position Error: {}", e);
        });
    }

    fn set_brake_mode(&mut self, mode: BrakeMode) {
        let mode = match mode {
            BrakeMode::Coast => VexBrakeMode::Coast,
            BrakeMode::Hold => VexBrakeMode::Hold,
            BrakeMode::Brake => VexBrakeMode::Brake,
        };
        self.brake(mode).unwrap_or_else(|e| {
            warn!("Motor Brake Error: {}", e);
        });
    }
}

/// The V5 Brain's uptime clock and task sleep.
#[derive(Debug, Clone, Copy, Default)]
pub struct VexClock;

impl Clock for VexClock {
    fn now(&self) -> Duration { user_uptime() }

    async fn sleep(&self, duration: Duration) { sleep(duration).await; }
}

impl InputSource for Controller {
    fn frame(&mut self) -> ControllerFrame {
        let state = self.state().unwrap_or_else(|e| {
            warn!("Controller State Error: {}", e);
            ControllerState::default()
        });
        frame_from_state(&state)
    }
}

fn frame_from_state(state: &ControllerState) -> ControllerFrame {
    let mut frame = ControllerFrame::neutral();
    for button in Button::ALL {
        frame.set_button(button, get_button_state(state, button).is_pressed());
    }
    frame.set_axis(Axis::LeftX, stick_to_power(state.left_stick.x()));
    frame.set_axis(Axis::LeftY, stick_to_power(state.left_stick.y()));
    frame.set_axis(Axis::RightX, stick_to_power(state.right_stick.x()));
    frame.set_axis(Axis::RightY, stick_to_power(state.right_stick.y()));
    frame
}

/// Sticks read `-1.0..=1.0`.
fn stick_to_power(value: f64) -> Power { (value * MAX_POWER as f64).round() as Power }

fn get_button_state(state: &ControllerState, button: Button) -> ButtonState {
    match button {
        Button::A => state.button_a,
        Button::B => state.button_b,
        Button::X => state.button_x,
        Button::Y => state.button_y,
        Button::Up => state.button_up,
        Button::Down => state.button_down,
        Button::Left => state.button_left,
        Button::Right => state.button_right,
        Button::L1 => state.button_l1,
        Button::L2 => state.button_l2,
        Button::R1 => state.button_r1,
        Button::R2 => state.button_r2,
    }
}
