//! Fake HAL implementation for testing.
//!
//! Holds an in-memory filesystem and records every mutating operation or
//! command without executing anything, so the planner and the apply step can
//! be tested in CI without root, fail2ban or systemd.

use super::{FsOps, PrivilegeOps, ProcessOps};
use crate::{HalError, HalResult};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
#[cfg(unix)]
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Operation records for testing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    CreateDir {
        path: PathBuf,
    },
    Write {
        path: PathBuf,
    },
    Command {
        program: String,
        args: Vec<String>,
        timeout_secs: u64,
    },
}

/// Scripted outcome for the next invocation of a program.
#[derive(Debug, Clone)]
pub enum FakeCommand {
    Success { stdout: String },
    Failure { code: i32, stderr: String },
    Timeout,
    NotFound,
}

#[derive(Debug, Clone, Default)]
struct FakeHalState {
    operations: Vec<Operation>,
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
    unreadable: BTreeSet<PathBuf>,
    scripted: HashMap<String, VecDeque<FakeCommand>>,
    root: bool,
}

/// Fake HAL implementation that records operations without executing them.
///
/// Unscripted commands succeed with empty output.
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        let hal = Self::default();
        hal.state().root = true;
        hal
    }

    fn state(&self) -> MutexGuard<'_, FakeHalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a file (and its ancestor directories).
    pub fn with_file(self, path: impl Into<PathBuf>, contents: &str) -> Self {
        let path = path.into();
        {
            let mut state = self.state();
            insert_ancestors(&mut state.dirs, &path);
            state.files.insert(path, contents.to_string());
        }
        self
    }

    /// Seed an empty directory (and its ancestors).
    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        {
            let mut state = self.state();
            insert_ancestors(&mut state.dirs, &path);
            state.dirs.insert(path);
        }
        self
    }

    /// Make listing `path` fail with a permission error.
    pub fn with_unreadable(self, path: impl Into<PathBuf>) -> Self {
        self.state().unreadable.insert(path.into());
        self
    }

    /// Pretend to run without root privileges.
    pub fn without_root(self) -> Self {
        self.state().root = false;
        self
    }

    /// Queue an outcome for the next call to `program`. Outcomes are consumed in order.
    pub fn push_command(&self, program: &str, outcome: FakeCommand) {
        self.state()
            .scripted
            .entry(program.to_string())
            .or_default()
            .push_back(outcome);
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.state().operations.clone()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.state().operations.iter().any(check)
    }

    /// Number of recorded invocations of `program`.
    pub fn command_count(&self, program: &str) -> usize {
        self.state()
            .operations
            .iter()
            .filter(|op| matches!(op, Operation::Command { program: p, .. } if p == program))
            .count()
    }

    /// Current content of an in-memory file.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state().files.get(path.as_ref()).cloned()
    }

    fn record_operation(&self, op: Operation) {
        self.state().operations.push(op);
    }
}

fn insert_ancestors(dirs: &mut BTreeSet<PathBuf>, path: &Path) {
    for ancestor in path.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        dirs.insert(ancestor.to_path_buf());
    }
}

#[cfg(unix)]
fn exit_status(code: i32) -> std::process::ExitStatus {
    std::process::ExitStatus::from_raw(code << 8)
}

impl ProcessOps for FakeHal {
    fn command_output(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> HalResult<Output> {
        self.record_operation(Operation::Command {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            timeout_secs: timeout.as_secs(),
        });
        log::info!("FAKE HAL: {} {}", program, args.join(" "));

        let scripted = self
            .state()
            .scripted
            .get_mut(program)
            .and_then(VecDeque::pop_front);

        match scripted.unwrap_or(FakeCommand::Success {
            stdout: String::new(),
        }) {
            FakeCommand::Success { stdout } => Ok(Output {
                status: exit_status(0),
                stdout: stdout.into_bytes(),
                stderr: Vec::new(),
            }),
            FakeCommand::Failure { code, stderr } => Ok(Output {
                status: exit_status(code),
                stdout: Vec::new(),
                stderr: stderr.into_bytes(),
            }),
            FakeCommand::Timeout => Err(HalError::CommandTimeout {
                program: program.to_string(),
                timeout_secs: timeout.as_secs(),
            }),
            FakeCommand::NotFound => Err(HalError::CommandNotFound(program.to_string())),
        }
    }

    fn command_status(&self, program: &str, args: &[&str], timeout: Duration) -> HalResult<()> {
        let output = self.command_output(program, args, timeout)?;
        if !output.status.success() {
            return Err(HalError::CommandFailed {
                program: program.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl FsOps for FakeHal {
    fn exists(&self, path: &Path) -> bool {
        let state = self.state();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn list_dir(&self, dir: &Path) -> HalResult<Vec<String>> {
        let state = self.state();
        if state.unreadable.contains(dir) {
            return Err(HalError::PermissionDenied);
        }
        if !state.dirs.contains(dir) {
            return Err(HalError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", dir.display()),
            )));
        }
        let names: BTreeSet<String> = state
            .files
            .keys()
            .map(PathBuf::as_path)
            .chain(state.dirs.iter().map(PathBuf::as_path))
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        Ok(names.into_iter().collect())
    }

    fn create_dir_all(&self, dir: &Path) -> HalResult<()> {
        self.record_operation(Operation::CreateDir {
            path: dir.to_path_buf(),
        });
        let mut state = self.state();
        insert_ancestors(&mut state.dirs, dir);
        state.dirs.insert(dir.to_path_buf());
        Ok(())
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> HalResult<()> {
        self.record_operation(Operation::Write {
            path: path.to_path_buf(),
        });
        let mut state = self.state();
        insert_ancestors(&mut state.dirs, path);
        state.files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}

impl PrivilegeOps for FakeHal {
    fn ensure_root(&self) -> HalResult<()> {
        if self.state().root {
            Ok(())
        } else {
            Err(HalError::NotRoot { uid: 1000 })
        }
    }
}
