//! Error types shared by motor groups, PID moves and robot configuration.
//!
//! Every fallible operation in the crate returns [`Result`]. The variants
//! fall into four families:
//!
//! - **Precondition violations**: a caller handed a motor group a power list
//!   or index subset that does not fit its device list.
//! - **Configuration errors**: rejected while a group or robot is being
//!   assembled, before any motor moves.
//! - **Non-convergence**: a bounded PID move ran out of time.
//! - **Cancellation**: a PID move or operator loop was stopped through a
//!   [`CancelToken`](crate::motion::pid::CancelToken).

use std::time::Duration;

/// Errors reported by `lockstep`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("expected {expected} entries (one per motor), got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("motor index {index} is out of range for a group of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("position subset must name at least one motor")]
    EmptyIndexSubset,

    #[error("error tolerance must be positive, got {0}")]
    InvalidTolerance(i32),

    #[error("a motor group needs at least one motor")]
    EmptyGroup,

    #[error("a motor group holds at most {max} motors, got {actual}")]
    TooManyMotors { max: usize, actual: usize },

    #[error("threshold interval is empty (start and end are both {0})")]
    EmptyThreshold(i32),

    #[error("no mechanism named `{0}`")]
    UnknownMechanism(String),

    #[error("mechanism `{0}` is configured more than once")]
    DuplicateMechanism(String),

    #[error("move did not settle within {elapsed:?} (last error {error})")]
    NotSettled { elapsed: Duration, error: i32 },

    #[error("cancelled after {elapsed:?}")]
    Cancelled { elapsed: Duration },
}

/// Shorthand for results carrying [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
