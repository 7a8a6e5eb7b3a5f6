//! Filesystem oracle.
//!
//! Probes never fail: an inaccessible path is simply "not there". Mutating calls
//! report errors so callers can decide whether they matter.

use crate::HalResult;
use std::path::Path;

pub trait FsOps {
    /// True when `path` exists and is reachable by this process.
    fn exists(&self, path: &Path) -> bool;

    /// Glob patterns are accepted without matching against concrete files: the
    /// owning daemon may create matching files later (rotated or per-host names).
    fn exists_glob(&self, _pattern: &str) -> bool {
        true
    }

    /// Names of the entries directly under `dir`, sorted.
    fn list_dir(&self, dir: &Path) -> HalResult<Vec<String>>;

    fn create_dir_all(&self, dir: &Path) -> HalResult<()>;

    /// Replace the file at `path` with `contents` (temp file + rename).
    fn write_atomic(&self, path: &Path, contents: &str) -> HalResult<()>;
}

/// Whether a path string contains shell glob metacharacters.
pub fn is_glob_pattern(path: &str) -> bool {
    path.contains(['*', '?', '['])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_glob_metacharacters() {
        assert!(is_glob_pattern("/var/lib/mysql/*.err"));
        assert!(is_glob_pattern("/var/log/httpd/access_log.?"));
        assert!(is_glob_pattern("/var/log/[ab].log"));
        assert!(!is_glob_pattern("/var/log/secure"));
    }
}
