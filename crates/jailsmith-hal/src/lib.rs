//! jailsmith host access layer.
//!
//! Everything that touches the running host (filesystem probes, child processes,
//! privilege checks) goes through the traits in this crate so the planner can be
//! exercised against [`FakeHal`] without root or a real fail2ban install.

pub mod error;
pub mod hal;

pub use error::{HalError, HalResult};
pub use hal::{
    is_glob_pattern, FakeCommand, FakeHal, FsOps, LinuxHal, Operation, PrivilegeOps, ProcessOps,
    SystemHal,
};
