//! HAL trait definitions and implementations.
//!
//! This module defines the host-facing traits and provides both the real
//! (LinuxHal) and recording (FakeHal) implementations.

pub mod fake_hal;
pub mod fs_ops;
pub mod linux_hal;
pub mod privilege_ops;
pub mod process_ops;

pub use fake_hal::{FakeCommand, FakeHal, Operation};
pub use fs_ops::{is_glob_pattern, FsOps};
pub use linux_hal::LinuxHal;
pub use privilege_ops::PrivilegeOps;
pub use process_ops::ProcessOps;

/// Complete HAL combining all host operation traits.
pub trait SystemHal: FsOps + ProcessOps + PrivilegeOps + Send + Sync {}

/// Automatically implement SystemHal for any type implementing all required traits.
impl<T> SystemHal for T where T: FsOps + ProcessOps + PrivilegeOps + Send + Sync {}
