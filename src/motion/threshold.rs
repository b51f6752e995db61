//! Position-gated speed overrides for dual-button control.
//!
//! A [`PositionalThreshold`] lets a motor group run at a different speed
//! while its average position lies inside an interval, e.g. slowing a lift
//! as it nears the top of its travel.

use crate::{
    error::{Error, Result},
    peripherals::{MAX_POWER, Power},
};

/// Forward and backward power used by dual-button control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedPair {
    pub forward:  Power,
    pub backward: Power,
}

impl SpeedPair {
    pub const fn new(forward: Power, backward: Power) -> Self { Self { forward, backward } }
}

impl Default for SpeedPair {
    /// Full power in both directions.
    fn default() -> Self { Self::new(MAX_POWER, -MAX_POWER) }
}

/// A position interval paired with override speeds.
///
/// The interval is open and direction-agnostic: `start` may be larger than
/// `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionalThreshold {
    start:  i32,
    end:    i32,
    speeds: SpeedPair,
}

impl PositionalThreshold {
    /// Creates a threshold over the open interval between `start` and `end`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyThreshold`] when `start == end`.
    pub fn new(start: i32, end: i32, speeds: SpeedPair) -> Result<Self> {
        if start == end {
            return Err(Error::EmptyThreshold(start));
        }
        Ok(Self { start, end, speeds })
    }

    /// A threshold that never matches. This is the state of a freshly built
    /// motor group.
    pub const fn none() -> Self {
        Self {
            start:  0,
            end:    0,
            speeds: SpeedPair::new(0, 0),
        }
    }

    /// Whether `position` lies strictly between `start` and `end`.
    pub fn contains(&self, position: i32) -> bool {
        let (low, high) = if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };
        position > low && position < high
    }

    pub fn start(&self) -> i32 { self.start }

    pub fn end(&self) -> i32 { self.end }

    pub fn speeds(&self) -> SpeedPair { self.speeds }
}

impl Default for PositionalThreshold {
    fn default() -> Self { Self::none() }
}
