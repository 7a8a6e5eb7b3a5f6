//! Log path resolution.
//!
//! Picks the first existing candidate for a service, or falls back to the
//! canonical location so the jail can be armed before the service has ever
//! written a log line.

use crate::catalogue::LogCandidates;
use jailsmith_hal::{is_glob_pattern, FsOps};
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// The file exists on the host.
    Found,
    /// A glob pattern, accepted without looking for matching files.
    Pattern,
    /// Nothing existed; the canonical location is expected to appear later.
    Pending,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Found => f.write_str("found"),
            Resolution::Pattern => f.write_str("pattern"),
            Resolution::Pending => f.write_str("pending"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLog {
    pub path: String,
    pub kind: Resolution,
}

/// Always yields exactly one path. Never fails.
pub fn resolve_log_path<F: FsOps + ?Sized>(fs: &F, candidates: &LogCandidates) -> ResolvedLog {
    for candidate in candidates.iter() {
        if is_glob_pattern(candidate) {
            if fs.exists_glob(candidate) {
                log::debug!("log candidate {candidate} is a pattern, accepting as-is");
                return ResolvedLog {
                    path: candidate.to_string(),
                    kind: Resolution::Pattern,
                };
            }
            continue;
        }
        if fs.exists(Path::new(candidate)) {
            log::debug!("log candidate {candidate} found");
            return ResolvedLog {
                path: candidate.to_string(),
                kind: Resolution::Found,
            };
        }
    }

    let fallback = candidates.fallback();
    log::info!("no log candidate present yet, expecting {fallback}");
    prepare_parent(fs, Path::new(fallback));
    ResolvedLog {
        path: fallback.to_string(),
        kind: Resolution::Pending,
    }
}

/// Make sure the owning service can create the file later. Failure only costs
/// us a warning.
fn prepare_parent<F: FsOps + ?Sized>(fs: &F, path: &Path) {
    let Some(parent) = path.parent() else {
        return;
    };
    if fs.exists(parent) {
        return;
    }
    if let Err(err) = fs.create_dir_all(parent) {
        log::warn!(
            "could not create log directory {}: {err}",
            parent.display()
        );
    }
}
