//! Write, reload, verify.
//!
//! Every step runs once per invocation. The only loop is the bounded status poll
//! after a successful reload, which gives the daemon time to finish starting.
//! A failed reload is never rolled back: the new document stays on disk and is
//! shown to the operator in full.

use crate::config::VerifyConfig;
use crate::daemon::SecurityDaemon;
use crate::errors::{ApplyError, QueryError, EXIT_FAILURE, EXIT_OK, EXIT_RELOAD_FAILED};
use jailsmith_hal::FsOps;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyPolicy {
    pub attempts: u32,
    pub backoff: Duration,
    pub timeout: Duration,
}

impl From<&VerifyConfig> for VerifyPolicy {
    fn from(config: &VerifyConfig) -> Self {
        Self {
            attempts: config.attempts.max(1),
            backoff: config.backoff(),
            timeout: config.timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Reload succeeded and the daemon reported its jails.
    Verified { active: Vec<String> },
    /// Reload succeeded but the daemon never answered the status query.
    StatusUnknown { reason: String },
}

pub fn apply_document<F, D>(
    fs: &F,
    daemon: &D,
    path: &Path,
    document: &str,
    verify: &VerifyPolicy,
) -> Result<ApplyOutcome, ApplyError>
where
    F: FsOps + ?Sized,
    D: SecurityDaemon + ?Sized,
{
    fs.write_atomic(path, document)
        .map_err(|source| ApplyError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("📝 wrote {}", path.display());

    daemon
        .apply_config(path)
        .map_err(|source| ApplyError::Reload {
            source,
            document: document.to_string(),
        })?;

    match poll_active_jails(daemon, verify) {
        Ok(active) => Ok(ApplyOutcome::Verified { active }),
        Err(err) => {
            log::warn!("⚠️  reload succeeded but status is unknown: {err}");
            Ok(ApplyOutcome::StatusUnknown {
                reason: err.to_string(),
            })
        }
    }
}

fn poll_active_jails<D: SecurityDaemon + ?Sized>(
    daemon: &D,
    verify: &VerifyPolicy,
) -> Result<Vec<String>, QueryError> {
    let started = Instant::now();
    let mut attempt = 1;
    loop {
        let remaining = verify.timeout.saturating_sub(started.elapsed());
        match daemon.query_active_jails(remaining) {
            Ok(active) => return Ok(active),
            Err(err) => {
                log::debug!("status attempt {attempt}/{} failed: {err}", verify.attempts);
                let out_of_time = started.elapsed() + verify.backoff > verify.timeout;
                if attempt >= verify.attempts || out_of_time {
                    return Err(err);
                }
            }
        }
        attempt += 1;
        std::thread::sleep(verify.backoff);
    }
}

/// Tell the operator how the run ended and pick the process exit status.
pub fn report_outcome<W: Write>(
    out: &mut W,
    result: &Result<ApplyOutcome, ApplyError>,
) -> io::Result<i32> {
    match result {
        Ok(ApplyOutcome::Verified { active }) => {
            writeln!(
                out,
                "✅ fail2ban reloaded. {} jails active: {}",
                active.len(),
                active.join(", ")
            )?;
            Ok(EXIT_OK)
        }
        Ok(ApplyOutcome::StatusUnknown { reason }) => {
            writeln!(out, "⚠️  applied, status unknown ({reason})")?;
            Ok(EXIT_OK)
        }
        Err(ApplyError::Reload { source, document }) => {
            writeln!(out, "❌ {source}")?;
            writeln!(
                out,
                "The new configuration was left in place for inspection:"
            )?;
            writeln!(out, "----- BEGIN JAIL CONFIG -----")?;
            write!(out, "{document}")?;
            if !document.ends_with('\n') {
                writeln!(out)?;
            }
            writeln!(out, "----- END JAIL CONFIG -----")?;
            Ok(EXIT_RELOAD_FAILED)
        }
        Err(err @ ApplyError::Write { .. }) => {
            writeln!(out, "❌ {err}")?;
            Ok(EXIT_FAILURE)
        }
    }
}
