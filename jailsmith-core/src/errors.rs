use jailsmith_hal::HalError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for jailsmith orchestration code
pub type Result<T> = anyhow::Result<T>;

/// Process exit status for a completed run (including "applied, status unknown").
pub const EXIT_OK: i32 = 0;
/// Anything that stopped the run before the daemon was asked to reload.
pub const EXIT_FAILURE: i32 = 1;
/// The daemon rejected the new document. The document stays on disk.
pub const EXIT_RELOAD_FAILED: i32 = 3;

/// The security daemon could not apply the new document.
#[derive(Error, Debug)]
pub enum ReloadError {
    #[error("reload of {unit} failed: {source}")]
    Command {
        unit: String,
        #[source]
        source: HalError,
    },
}

/// The active jail set could not be read back.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("status query failed: {0}")]
    Command(#[from] HalError),

    #[error("unexpected status output: {0}")]
    Unparseable(String),
}

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: HalError,
    },

    /// Carries the document that was written so it can be shown to the operator.
    #[error("{source}")]
    Reload {
        #[source]
        source: ReloadError,
        document: String,
    },
}
