//! Control surface of the running intrusion-prevention daemon.

use crate::errors::{QueryError, ReloadError};
use jailsmith_hal::ProcessOps;
use std::path::Path;
use std::time::{Duration, Instant};

const RESTART_TIMEOUT: Duration = Duration::from_secs(60);
const STATUS_TIMEOUT: Duration = Duration::from_secs(10);

pub trait SecurityDaemon {
    /// Make the daemon pick up the document already written at `document_path`.
    fn apply_config(&self, document_path: &Path) -> Result<(), ReloadError>;

    /// Names of the jails the daemon is currently running. Gives up once
    /// `budget` has been spent.
    fn query_active_jails(&self, budget: Duration) -> Result<Vec<String>, QueryError>;
}

/// fail2ban managed by systemd.
pub struct Fail2banDaemon<'a, H: ProcessOps + ?Sized> {
    hal: &'a H,
    unit: String,
}

impl<'a, H: ProcessOps + ?Sized> Fail2banDaemon<'a, H> {
    pub fn new(hal: &'a H) -> Self {
        Self {
            hal,
            unit: "fail2ban".to_string(),
        }
    }
}

impl<H: ProcessOps + ?Sized> SecurityDaemon for Fail2banDaemon<'_, H> {
    fn apply_config(&self, document_path: &Path) -> Result<(), ReloadError> {
        log::info!(
            "🔄 restarting {} to load {}",
            self.unit,
            document_path.display()
        );
        self.hal
            .command_status("systemctl", &["restart", self.unit.as_str()], RESTART_TIMEOUT)
            .map_err(|source| ReloadError::Command {
                unit: self.unit.clone(),
                source,
            })
    }

    fn query_active_jails(&self, budget: Duration) -> Result<Vec<String>, QueryError> {
        let deadline = Instant::now() + budget;
        let remaining = || {
            deadline
                .saturating_duration_since(Instant::now())
                .min(STATUS_TIMEOUT)
        };
        self.hal
            .command_status("fail2ban-client", &["ping"], remaining())?;
        let output = self
            .hal
            .command_output("fail2ban-client", &["status"], remaining())?;
        if !output.status.success() {
            return Err(QueryError::Unparseable(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        parse_jail_list(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Pull the jail names out of `fail2ban-client status`:
///
/// ```text
/// Status
/// |- Number of jail:      2
/// `- Jail list:   sshd, web-auth
/// ```
pub fn parse_jail_list(status: &str) -> Result<Vec<String>, QueryError> {
    let line = status
        .lines()
        .find(|line| line.contains("Jail list:"))
        .ok_or_else(|| QueryError::Unparseable(status.trim().to_string()))?;
    let list = line
        .split_once("Jail list:")
        .map(|(_, rest)| rest)
        .unwrap_or_default();
    Ok(list
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jailsmith_hal::{FakeCommand, FakeHal, HalError, Operation};

    const BUDGET: Duration = Duration::from_secs(15);
    const STATUS: &str = "Status\n|- Number of jail:\t2\n`- Jail list:\tsshd, web-auth\n";

    #[test]
    fn parses_jail_list() {
        assert_eq!(parse_jail_list(STATUS).unwrap(), vec!["sshd", "web-auth"]);
    }

    #[test]
    fn parses_empty_jail_list() {
        let status = "Status\n|- Number of jail:\t0\n`- Jail list:\t\n";
        assert!(parse_jail_list(status).unwrap().is_empty());
    }

    #[test]
    fn rejects_unrelated_output() {
        assert!(matches!(
            parse_jail_list("ERROR   Failed to access socket path"),
            Err(QueryError::Unparseable(_))
        ));
    }

    #[test]
    fn apply_restarts_the_unit() {
        let hal = FakeHal::new();
        Fail2banDaemon::new(&hal)
            .apply_config(Path::new("/etc/fail2ban/jail.local"))
            .unwrap();
        assert!(hal.has_operation(|op| matches!(
            op,
            Operation::Command { program, args, .. }
                if program == "systemctl" && args == &["restart", "fail2ban"]
        )));
    }

    #[test]
    fn failed_restart_is_a_reload_error() {
        let hal = FakeHal::new();
        hal.push_command(
            "systemctl",
            FakeCommand::Failure {
                code: 1,
                stderr: "Job for fail2ban.service failed".into(),
            },
        );
        let err = Fail2banDaemon::new(&hal)
            .apply_config(Path::new("/etc/fail2ban/jail.local"))
            .unwrap_err();
        assert!(err.to_string().contains("Job for fail2ban.service failed"));
    }

    #[test]
    fn query_reads_status() {
        let hal = FakeHal::new();
        hal.push_command("fail2ban-client", FakeCommand::Success { stdout: "pong".into() });
        hal.push_command("fail2ban-client", FakeCommand::Success { stdout: STATUS.into() });
        let jails = Fail2banDaemon::new(&hal).query_active_jails(BUDGET).unwrap();
        assert_eq!(jails, vec!["sshd", "web-auth"]);
    }

    #[test]
    fn query_fails_when_daemon_is_down() {
        let hal = FakeHal::new();
        hal.push_command(
            "fail2ban-client",
            FakeCommand::Failure {
                code: 255,
                stderr: "Failed to access socket path".into(),
            },
        );
        assert!(matches!(
            Fail2banDaemon::new(&hal).query_active_jails(BUDGET),
            Err(QueryError::Command(_))
        ));
    }

    #[test]
    fn status_commands_never_outlast_the_budget() {
        let hal = FakeHal::new();
        hal.push_command("fail2ban-client", FakeCommand::Success { stdout: "pong".into() });
        hal.push_command("fail2ban-client", FakeCommand::Success { stdout: STATUS.into() });
        Fail2banDaemon::new(&hal)
            .query_active_jails(Duration::from_secs(3))
            .unwrap();

        let timeouts: Vec<u64> = hal
            .operations()
            .into_iter()
            .filter_map(|op| match op {
                Operation::Command { timeout_secs, .. } => Some(timeout_secs),
                _ => None,
            })
            .collect();
        assert_eq!(timeouts.len(), 2);
        assert!(timeouts.iter().all(|secs| *secs <= 3), "{timeouts:?}");
    }

    #[test]
    fn long_budget_is_capped_per_command() {
        let hal = FakeHal::new();
        hal.push_command("fail2ban-client", FakeCommand::Success { stdout: "pong".into() });
        hal.push_command("fail2ban-client", FakeCommand::Success { stdout: STATUS.into() });
        Fail2banDaemon::new(&hal)
            .query_active_jails(Duration::from_secs(600))
            .unwrap();
        assert!(!hal.has_operation(|op| matches!(
            op,
            Operation::Command { timeout_secs, .. } if *timeout_secs > STATUS_TIMEOUT.as_secs()
        )));
    }

    #[test]
    fn hung_status_query_is_a_command_error() {
        let hal = FakeHal::new();
        hal.push_command("fail2ban-client", FakeCommand::Timeout);
        assert!(matches!(
            Fail2banDaemon::new(&hal).query_active_jails(BUDGET),
            Err(QueryError::Command(HalError::CommandTimeout { .. }))
        ));
    }

    #[test]
    fn missing_systemctl_is_a_reload_error() {
        let hal = FakeHal::new();
        hal.push_command("systemctl", FakeCommand::NotFound);
        let err = Fail2banDaemon::new(&hal)
            .apply_config(Path::new("/etc/fail2ban/jail.local"))
            .unwrap_err();
        assert!(matches!(
            err,
            ReloadError::Command {
                source: HalError::CommandNotFound(_),
                ..
            }
        ));
    }
}
