use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct Host {
    dir: TempDir,
}

impl Host {
    /// SSH log and `sshd` filter present, nothing else.
    fn ssh_only() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let root = dir.path();
        fs::create_dir_all(root.join("filter.d")).expect("filter dir");
        fs::write(root.join("filter.d/sshd.conf"), "").expect("filter");
        fs::write(root.join("secure"), "").expect("log");
        fs::create_dir_all(root.join("bin")).expect("bin dir");

        let config = format!(
            r#"
jail_path = "{root}/jail.local"
filter_dir = "{root}/filter.d"

[verify]
attempts = 2
backoff_ms = 0
timeout_secs = 1

[services.ssh]
candidates = ["{root}/secure", "{root}/auth.log"]

[services.web]
candidates = ["{root}/nginx/error.log"]

[services.database]
candidates = ["{root}/mysqld.log"]
"#,
            root = root.display()
        );
        fs::write(root.join("jailsmith.toml"), config).expect("config");
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn jail_path(&self) -> PathBuf {
        self.root().join("jail.local")
    }

    fn stub(&self, name: &str, body: &str) {
        let path = self.root().join("bin").join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write stub");
        let mut perms = fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("set perms");
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_jailsmith"))
            .args(args)
            .arg("--config")
            .arg(self.root().join("jailsmith.toml"))
            .env("PATH", self.root().join("bin"))
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to run jailsmith binary")
    }
}

#[test]
fn plan_prints_document_without_writing() {
    let host = Host::ssh_only();
    let output = host.run(&["plan", "--operator-ip", "203.0.113.7"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(
        "ignoreip = 127.0.0.1/8 10.0.0.0/8 172.16.0.0/12 192.168.0.0/16 203.0.113.7"
    ));
    assert!(stdout.contains("[sshd]"));
    assert!(stdout.contains(&format!("logpath = {}/secure", host.root().display())));
    assert!(!stdout.contains("[web-auth]"));
    assert!(!host.jail_path().exists());
}

#[test]
fn plan_json_reports_skip_reasons() {
    let host = Host::ssh_only();
    let output = host.run(&["plan", "--operator-ip", "203.0.113.7", "--json"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"skip_reason\": \"filter-unavailable\""));
    assert!(stdout.contains("\"kind\": \"pending\""));
}

#[test]
fn invalid_operator_ip_fails() {
    let host = Host::ssh_only();
    let output = host.run(&["plan", "--operator-ip", "not-an-ip"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid --operator-ip"));
}

#[test]
fn detect_lists_services() {
    let host = Host::ssh_only();
    let output = host.run(&["detect"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ssh-auth"));
    assert!(stdout.contains("filter=sshd"));
    assert!(stdout.contains("filter=none"));
    assert!(stdout.contains("/secure (found)"));
    assert!(stdout.contains("/nginx/error.log (pending)"));
    assert!(!stdout.contains("Found"));
}

#[test]
fn apply_reload_failure_exits_3_and_prints_document() {
    let host = Host::ssh_only();
    host.stub(
        "systemctl",
        "echo 'Job for fail2ban.service failed' >&2\nexit 1",
    );

    let output = host.run(&["apply", "--operator-ip", "203.0.113.7", "--skip-root-check"]);
    assert_eq!(output.status.code(), Some(3));

    let written = fs::read_to_string(host.jail_path()).expect("document left on disk");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Job for fail2ban.service failed"));
    assert!(stdout.contains(&written));
}

#[test]
fn apply_with_unknown_status_still_succeeds() {
    let host = Host::ssh_only();
    host.stub("systemctl", "exit 0");
    host.stub(
        "fail2ban-client",
        "echo 'Failed to access socket path' >&2\nexit 255",
    );

    let output = host.run(&["apply", "--operator-ip", "203.0.113.7", "--skip-root-check"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("applied, status unknown"));
    assert!(host.jail_path().exists());
}

#[test]
fn apply_reports_active_jails() {
    let host = Host::ssh_only();
    host.stub("systemctl", "exit 0");
    host.stub(
        "fail2ban-client",
        "if [ \"$1\" = status ]; then printf 'Status\\n|- Number of jail:\\t1\\n`- Jail list:\\tsshd\\n'; fi\nexit 0",
    );

    let output = host.run(&["apply", "--operator-ip", "203.0.113.7", "--skip-root-check"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("1 jails active: sshd"));
}
