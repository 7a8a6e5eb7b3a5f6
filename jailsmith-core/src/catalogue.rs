//! Monitored services and their static detection profiles.
//!
//! The catalogue is built once per run (built-in defaults plus any overrides from
//! the config file) and never derived from host state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Services whose authentication failures we guard. Declaration order is the
/// order jails are emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MonitoredService {
    SshAuth,
    WebAuth,
    DatabaseAuth,
}

impl MonitoredService {
    pub const ALL: [MonitoredService; 3] = [
        MonitoredService::SshAuth,
        MonitoredService::WebAuth,
        MonitoredService::DatabaseAuth,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MonitoredService::SshAuth => "ssh-auth",
            MonitoredService::WebAuth => "web-auth",
            MonitoredService::DatabaseAuth => "database-auth",
        }
    }

    /// Section name in the rendered jail document.
    pub fn jail_name(self) -> &'static str {
        match self {
            MonitoredService::SshAuth => "sshd",
            MonitoredService::WebAuth => "web-auth",
            MonitoredService::DatabaseAuth => "mysqld-auth",
        }
    }

    /// Substrings used to pick related filters out of the registry for diagnostics.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            MonitoredService::SshAuth => &["ssh"],
            MonitoredService::WebAuth => &["nginx", "apache", "http"],
            MonitoredService::DatabaseAuth => &["mysql", "maria"],
        }
    }

    /// Log locations in priority order; the last entry is the canonical
    /// fallback used when nothing exists yet.
    pub fn default_candidates(self) -> &'static [&'static str] {
        match self {
            MonitoredService::SshAuth => &["/var/log/auth.log", "/var/log/secure"],
            MonitoredService::WebAuth => &["/var/log/httpd/error_log", "/var/log/nginx/error.log"],
            // MariaDB names its error log after the host inside the datadir.
            MonitoredService::DatabaseAuth => &[
                "/var/log/mariadb/mariadb.log",
                "/var/log/mysqld.log",
                "/var/lib/mysql/*.err",
            ],
        }
    }

    pub fn default_filters(self) -> &'static [&'static str] {
        match self {
            MonitoredService::SshAuth => &["sshd"],
            MonitoredService::WebAuth => &["nginx-http-auth", "apache-auth"],
            MonitoredService::DatabaseAuth => &["mysqld-auth"],
        }
    }

    /// Log directory fragments that pin a service to one of its filters. A
    /// resolved path under `/httpd/` only ever pairs with `apache-auth`.
    pub fn log_flavours(self) -> &'static [(&'static str, &'static str)] {
        match self {
            MonitoredService::WebAuth => &[
                ("/httpd/", "apache-auth"),
                ("/apache2/", "apache-auth"),
                ("/nginx/", "nginx-http-auth"),
            ],
            MonitoredService::SshAuth | MonitoredService::DatabaseAuth => &[],
        }
    }

    pub fn default_maxretry(self) -> Option<u32> {
        match self {
            MonitoredService::SshAuth => Some(3),
            MonitoredService::WebAuth | MonitoredService::DatabaseAuth => None,
        }
    }
}

impl fmt::Display for MonitoredService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered, non-empty list of absolute log locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LogCandidates(Vec<String>);

impl LogCandidates {
    pub fn new(paths: Vec<String>) -> Result<Self, String> {
        if paths.is_empty() {
            return Err("candidate list must not be empty".to_string());
        }
        if let Some(relative) = paths.iter().find(|p| !Path::new(p).is_absolute()) {
            return Err(format!("candidate path must be absolute: {relative}"));
        }
        Ok(Self(paths))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Canonical location used when no candidate exists yet.
    pub fn fallback(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or_default()
    }
}

impl TryFrom<Vec<String>> for LogCandidates {
    type Error = String;

    fn try_from(paths: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(paths)
    }
}

impl From<LogCandidates> for Vec<String> {
    fn from(candidates: LogCandidates) -> Self {
        candidates.0
    }
}

/// Static detection record for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceProfile {
    pub service: MonitoredService,
    pub enabled: bool,
    pub candidates: LogCandidates,
    /// Acceptable filter names, first match wins.
    pub filters: Vec<String>,
    pub maxretry: Option<u32>,
}

impl ServiceProfile {
    pub fn builtin(service: MonitoredService) -> Self {
        let candidates = service
            .default_candidates()
            .iter()
            .map(|s| s.to_string())
            .collect();
        Self {
            service,
            enabled: true,
            candidates: LogCandidates(candidates),
            filters: service
                .default_filters()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            maxretry: service.default_maxretry(),
        }
    }
}

impl ServiceProfile {
    /// Filters acceptable for the resolved log `path`, in preference order.
    ///
    /// When the path belongs to a known flavour whose filter is listed, only that
    /// filter qualifies. Otherwise every listed filter does.
    pub fn filters_for(&self, path: &str) -> Vec<String> {
        let pinned = self
            .service
            .log_flavours()
            .iter()
            .find(|(fragment, _)| path.contains(fragment))
            .map(|(_, filter)| *filter)
            .filter(|filter| self.filters.iter().any(|f| f == filter));
        match pinned {
            Some(filter) => vec![filter.to_string()],
            None => self.filters.clone(),
        }
    }
}

/// Built-in catalogue in declaration order.
pub fn builtin_catalogue() -> Vec<ServiceProfile> {
    MonitoredService::ALL
        .into_iter()
        .map(ServiceProfile::builtin)
        .collect()
}
