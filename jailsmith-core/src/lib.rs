//! 🛡️ jailsmith core library.
//!
//! Detects which log files and fail2ban filters exist on a host, compiles a
//! jail policy that only enables what was actually found, renders it, and
//! applies it to the running daemon.

pub mod apply;
pub mod catalogue;
pub mod commands;
pub mod config;
pub mod daemon;
pub mod errors;
pub mod filters;
pub mod logging;
pub mod operator;
pub mod planner;
pub mod policy;
pub mod render;
pub mod report;
pub mod resolver;

pub use errors::{EXIT_FAILURE, EXIT_OK, EXIT_RELOAD_FAILED};
