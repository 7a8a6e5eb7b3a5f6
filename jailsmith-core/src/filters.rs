//! Filter registry probing.
//!
//! fail2ban keeps one definition per file under `filter.d/` (`<name>.conf`, with an
//! optional `<name>.local` override). A missing, unreadable or empty registry all
//! mean the same thing here: no filter is available.

use crate::catalogue::MonitoredService;
use jailsmith_hal::FsOps;
use std::collections::BTreeSet;
use std::path::Path;

const FILTER_SUFFIXES: [&str; 2] = [".conf", ".local"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRegistry {
    names: BTreeSet<String>,
}

impl FilterRegistry {
    /// List the registry once. Never fails.
    pub fn scan<F: FsOps + ?Sized>(fs: &F, dir: &Path) -> Self {
        match fs.list_dir(dir) {
            Ok(entries) => Self::from_entries(entries),
            Err(err) => {
                log::debug!("filter registry {} unavailable: {err}", dir.display());
                Self::default()
            }
        }
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = entries
            .into_iter()
            .filter_map(|entry| {
                let entry = entry.as_ref();
                FILTER_SUFFIXES
                    .iter()
                    .find_map(|suffix| entry.strip_suffix(*suffix))
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
            })
            .collect();
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// First of `wanted` present in the registry.
    pub fn select(&self, wanted: &[String]) -> Option<String> {
        wanted.iter().find(|name| self.contains(name)).cloned()
    }

    /// Registry entries related to any monitored service. Troubleshooting aid only.
    pub fn related_to_services(&self) -> Vec<String> {
        self.names
            .iter()
            .filter(|name| {
                MonitoredService::ALL
                    .iter()
                    .flat_map(|service| service.keywords())
                    .any(|keyword| name.contains(*keyword))
            })
            .cloned()
            .collect()
    }
}
