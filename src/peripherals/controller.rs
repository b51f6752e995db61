//! Controller input for operator control.
//!
//! The operator loop samples one [`ControllerFrame`] per tick from an
//! [`InputSource`] and hands it to every mechanism binding. Frames are plain
//! values, so the same bindings run against a physical controller, a
//! scripted replay or a hand-built frame in a test.

use super::{MAX_POWER, Power};

/// A list of Controller Buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    X,
    Y,
    Up,
    Down,
    Left,
    Right,
    L1,
    L2,
    R1,
    R2,
}

impl Button {
    /// Every button, in frame storage order.
    pub const ALL: [Button; 12] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::L1,
        Button::L2,
        Button::R1,
        Button::R2,
    ];

    fn index(self) -> usize { self as usize }
}

/// Analog joystick axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

impl Axis {
    fn index(self) -> usize { self as usize }
}

/// A snapshot of every button and axis, taken once per tick.
///
/// Axis values are stored in motor power units, `-127..=127`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerFrame {
    buttons: [bool; 12],
    axes:    [Power; 4],
}

impl ControllerFrame {
    /// A frame with nothing pressed and every stick centered.
    pub fn neutral() -> Self { Self::default() }

    /// Returns this frame with `button` held.
    pub fn with_button(mut self, button: Button) -> Self {
        self.set_button(button, true);
        self
    }

    /// Returns this frame with `axis` deflected to `value`.
    pub fn with_axis(mut self, axis: Axis, value: Power) -> Self {
        self.set_axis(axis, value);
        self
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        self.buttons[button.index()] = pressed;
    }

    /// Stores an axis value, clamped to the power range.
    pub fn set_axis(&mut self, axis: Axis, value: Power) {
        self.axes[axis.index()] = value.clamp(-MAX_POWER, MAX_POWER);
    }

    pub fn pressed(&self, button: Button) -> bool { self.buttons[button.index()] }

    pub fn axis(&self, axis: Axis) -> Power { self.axes[axis.index()] }
}

/// Anything that can be sampled for controller input once per tick.
pub trait InputSource {
    /// Samples the current state of the controller.
    fn frame(&mut self) -> ControllerFrame;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_frame_has_nothing_pressed() {
        let frame = ControllerFrame::neutral();
        for button in Button::ALL {
            assert!(!frame.pressed(button));
        }
        assert_eq!(frame.axis(Axis::LeftY), 0);
    }

    #[test]
    fn buttons_are_stored_independently() {
        let frame = ControllerFrame::neutral().with_button(Button::X).with_button(Button::R2);
        assert!(frame.pressed(Button::X));
        assert!(frame.pressed(Button::R2));
        assert!(!frame.pressed(Button::B));
        assert!(!frame.pressed(Button::R1));
    }

    #[test]
    fn axis_values_are_clamped() {
        let frame = ControllerFrame::neutral()
            .with_axis(Axis::LeftY, 400)
            .with_axis(Axis::RightY, -300)
            .with_axis(Axis::RightX, 42);
        assert_eq!(frame.axis(Axis::LeftY), 127);
        assert_eq!(frame.axis(Axis::RightY), -127);
        assert_eq!(frame.axis(Axis::RightX), 42);
    }
}
