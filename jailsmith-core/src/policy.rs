//! Jail policy compilation.
//!
//! Turns per-service detection results into a [`JailPolicyDocument`]. A jail is
//! enabled only when its log path resolved and its filter is installed; there is
//! no partial enabling.

use crate::catalogue::MonitoredService;
use crate::config::DefaultsConfig;
use crate::operator::OperatorAddress;
use crate::planner::ServiceDetection;
use crate::resolver::ResolvedLog;
use serde::Serialize;
use std::fmt;

/// Always exempt, in this order, ahead of the operator's own address.
pub const FIXED_IGNORE_LIST: [&str; 4] = [
    "127.0.0.1/8",
    "10.0.0.0/8",
    "172.16.0.0/12",
    "192.168.0.0/16",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    FilterUnavailable,
    DisabledByConfig,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FilterUnavailable => f.write_str("filter-unavailable"),
            SkipReason::DisabledByConfig => f.write_str("disabled-by-config"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultSection {
    pub ignore_list: Vec<String>,
    pub bantime: u64,
    pub findtime: u64,
    pub maxretry: u32,
    pub backend: String,
}

impl DefaultSection {
    pub fn new(defaults: &DefaultsConfig, operator: &OperatorAddress) -> Self {
        let mut ignore_list: Vec<String> =
            FIXED_IGNORE_LIST.iter().map(|s| s.to_string()).collect();
        ignore_list.push(operator.to_string());
        Self {
            ignore_list,
            bantime: defaults.bantime,
            findtime: defaults.findtime,
            maxretry: defaults.maxretry,
            backend: defaults.backend.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JailSpec {
    pub service: MonitoredService,
    pub jail: String,
    pub enabled: bool,
    /// Selected filter, or the preferred one when none is installed.
    pub filter: String,
    pub log: ResolvedLog,
    pub maxretry: u32,
    pub skip_reason: Option<SkipReason>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JailPolicyDocument {
    pub defaults: DefaultSection,
    pub jails: Vec<JailSpec>,
}

impl JailPolicyDocument {
    pub fn enabled_jails(&self) -> impl Iterator<Item = &JailSpec> {
        self.jails.iter().filter(|jail| jail.enabled)
    }

    pub fn skipped_jails(&self) -> impl Iterator<Item = &JailSpec> {
        self.jails.iter().filter(|jail| !jail.enabled)
    }
}

/// Build the document. Services are emitted in declaration order and each at
/// most once; later duplicate detections are ignored.
pub fn compile(
    detections: Vec<ServiceDetection>,
    defaults: &DefaultsConfig,
    operator: &OperatorAddress,
) -> JailPolicyDocument {
    let mut jails = Vec::with_capacity(MonitoredService::ALL.len());

    for service in MonitoredService::ALL {
        let Some(detection) = detections
            .iter()
            .find(|d| d.profile.service == service)
        else {
            continue;
        };

        let skip_reason = if !detection.profile.enabled {
            Some(SkipReason::DisabledByConfig)
        } else if detection.filter.is_none() {
            Some(SkipReason::FilterUnavailable)
        } else {
            None
        };

        let filter = detection
            .filter
            .clone()
            .or_else(|| detection.profile.filters.first().cloned())
            .unwrap_or_default();

        let spec = JailSpec {
            service,
            jail: service.jail_name().to_string(),
            enabled: skip_reason.is_none(),
            filter,
            log: detection.log.clone(),
            maxretry: detection.profile.maxretry.unwrap_or(defaults.maxretry),
            skip_reason,
        };

        match spec.skip_reason {
            Some(reason) => log::warn!(
                "⚠️  skipping {} jail ({}): {}",
                service,
                spec.jail,
                reason
            ),
            None => log::info!(
                "jail {} enabled: filter={} logpath={}",
                spec.jail,
                spec.filter,
                spec.log.path
            ),
        }
        jails.push(spec);
    }

    JailPolicyDocument {
        defaults: DefaultSection::new(defaults, operator),
        jails,
    }
}
