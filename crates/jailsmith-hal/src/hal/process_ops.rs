//! Process execution helpers.
//!
//! External commands are "world-touching" and must go through the HAL so we can
//! test the apply step without spawning real processes.

use crate::HalResult;
use std::process::Output;
use std::time::Duration;

/// Process execution trait (external command runner).
pub trait ProcessOps {
    /// Run to completion and return the captured output, successful or not.
    fn command_output(&self, program: &str, args: &[&str], timeout: Duration)
        -> HalResult<Output>;

    /// Run to completion; a non-zero exit becomes [`crate::HalError::CommandFailed`].
    fn command_status(&self, program: &str, args: &[&str], timeout: Duration) -> HalResult<()>;
}
