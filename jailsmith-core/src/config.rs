//! Optional TOML configuration.
//!
//! Default path: `/etc/jailsmith/jailsmith.toml` (override via `--config` or
//! `JAILSMITH_CONFIG`). A missing default file means built-in defaults; a file
//! that was asked for explicitly must exist.

use crate::catalogue::{LogCandidates, MonitoredService, ServiceProfile};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/jailsmith/jailsmith.toml";
pub const CONFIG_ENV: &str = "JAILSMITH_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub jail_path: PathBuf,
    pub filter_dir: PathBuf,
    pub ip_lookup_url: String,
    pub defaults: DefaultsConfig,
    pub verify: VerifyConfig,
    pub services: ServicesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jail_path: PathBuf::from("/etc/fail2ban/jail.local"),
            filter_dir: PathBuf::from("/etc/fail2ban/filter.d"),
            ip_lookup_url: "https://ifconfig.me/ip".to_string(),
            defaults: DefaultsConfig::default(),
            verify: VerifyConfig::default(),
            services: ServicesConfig::default(),
        }
    }
}

/// Global ban policy written to the `[DEFAULT]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DefaultsConfig {
    /// Ban duration, seconds.
    pub bantime: u64,
    /// Lookback window, seconds.
    pub findtime: u64,
    pub maxretry: u32,
    pub backend: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            bantime: 3600,
            findtime: 600,
            maxretry: 5,
            backend: "auto".to_string(),
        }
    }
}

/// Post-reload status polling budget.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct VerifyConfig {
    pub attempts: u32,
    pub backoff_ms: u64,
    pub timeout_secs: u64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            attempts: 5,
            backoff_ms: 1000,
            timeout_secs: 15,
        }
    }
}

impl VerifyConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServicesConfig {
    pub ssh: ServiceOverride,
    pub web: ServiceOverride,
    pub database: ServiceOverride,
}

impl ServicesConfig {
    fn get(&self, service: MonitoredService) -> &ServiceOverride {
        match service {
            MonitoredService::SshAuth => &self.ssh,
            MonitoredService::WebAuth => &self.web,
            MonitoredService::DatabaseAuth => &self.database,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServiceOverride {
    pub enabled: bool,
    pub maxretry: Option<u32>,
    pub candidates: Option<LogCandidates>,
    pub filters: Option<Vec<String>>,
}

impl Default for ServiceOverride {
    fn default() -> Self {
        Self {
            enabled: true,
            maxretry: None,
            candidates: None,
            filters: None,
        }
    }
}

impl Config {
    /// Resolve the config location: explicit flag, then env var, then default.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::load_from(&path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::load_from(path)
                } else {
                    log::debug!("no config at {}, using built-in defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.defaults.bantime == 0 {
            bail!("defaults.bantime must be greater than zero");
        }
        if self.defaults.findtime == 0 {
            bail!("defaults.findtime must be greater than zero");
        }
        if self.defaults.maxretry == 0 {
            bail!("defaults.maxretry must be greater than zero");
        }
        if self.defaults.backend.trim().is_empty() {
            bail!("defaults.backend must not be empty");
        }
        if self.verify.attempts == 0 {
            bail!("verify.attempts must be at least 1");
        }
        if self.verify.timeout_secs == 0 {
            bail!("verify.timeout_secs must be greater than zero");
        }
        if !self.jail_path.is_absolute() {
            bail!("jail_path must be absolute: {}", self.jail_path.display());
        }
        for service in MonitoredService::ALL {
            let overrides = self.services.get(service);
            if overrides.maxretry == Some(0) {
                bail!("services.{}.maxretry must be greater than zero", config_key(service));
            }
            if let Some(filters) = &overrides.filters {
                if filters.is_empty() || filters.iter().any(|f| f.trim().is_empty()) {
                    bail!(
                        "services.{}.filters must list at least one filter name",
                        config_key(service)
                    );
                }
            }
        }
        Ok(())
    }

    /// Built-in catalogue with this file's overrides applied, in declaration order.
    pub fn catalogue(&self) -> Vec<ServiceProfile> {
        MonitoredService::ALL
            .into_iter()
            .map(|service| {
                let mut profile = ServiceProfile::builtin(service);
                let overrides = self.services.get(service);
                profile.enabled = overrides.enabled;
                if let Some(maxretry) = overrides.maxretry {
                    profile.maxretry = Some(maxretry);
                }
                if let Some(candidates) = &overrides.candidates {
                    profile.candidates = candidates.clone();
                }
                if let Some(filters) = &overrides.filters {
                    profile.filters = filters.clone();
                }
                profile
            })
            .collect()
    }
}

fn config_key(service: MonitoredService) -> &'static str {
    match service {
        MonitoredService::SshAuth => "ssh",
        MonitoredService::WebAuth => "web",
        MonitoredService::DatabaseAuth => "database",
    }
}
