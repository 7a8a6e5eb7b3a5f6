//! Detection pass and plan assembly.
//!
//! One pass per run: list the filter registry once, resolve each service's log
//! path once, then hand the per-service records to the compiler by value.

use crate::catalogue::ServiceProfile;
use crate::config::Config;
use crate::filters::FilterRegistry;
use crate::operator::OperatorAddress;
use crate::policy::{compile, JailPolicyDocument};
use crate::render::render;
use crate::resolver::{resolve_log_path, ResolvedLog};
use jailsmith_hal::FsOps;
use std::path::Path;

/// Everything learned about one service on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDetection {
    pub profile: ServiceProfile,
    pub log: ResolvedLog,
    /// Installed filter chosen for the service, if any.
    pub filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub services: Vec<ServiceDetection>,
    /// Registry entries related to monitored services (diagnostics only).
    pub related_filters: Vec<String>,
}

pub fn detect<F: FsOps + ?Sized>(
    fs: &F,
    catalogue: Vec<ServiceProfile>,
    filter_dir: &Path,
) -> Detection {
    let registry = FilterRegistry::scan(fs, filter_dir);
    let related_filters = registry.related_to_services();
    if related_filters.is_empty() {
        log::warn!(
            "⚠️  no service-related filters found in {}",
            filter_dir.display()
        );
    } else {
        log::info!(
            "filters in {}: {}",
            filter_dir.display(),
            related_filters.join(", ")
        );
    }

    let services = catalogue
        .into_iter()
        .map(|profile| {
            let log = resolve_log_path(fs, &profile.candidates);
            let filter = registry.select(&profile.filters_for(&log.path));
            ServiceDetection {
                profile,
                log,
                filter,
            }
        })
        .collect();

    Detection {
        services,
        related_filters,
    }
}

/// Result of a planning run: the compiled document and its rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub related_filters: Vec<String>,
    pub document: JailPolicyDocument,
    pub rendered: String,
}

pub fn plan<F: FsOps + ?Sized>(fs: &F, config: &Config, operator: &OperatorAddress) -> Plan {
    let detection = detect(fs, config.catalogue(), &config.filter_dir);
    let document = compile(detection.services, &config.defaults, operator);
    let rendered = render(&document);
    Plan {
        related_filters: detection.related_filters,
        document,
        rendered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::builtin_catalogue;
    use crate::resolver::Resolution;
    use jailsmith_hal::FakeHal;

    #[test]
    fn detect_pairs_logs_with_filters() {
        let hal = FakeHal::new()
            .with_file("/var/log/secure", "")
            .with_file("/etc/fail2ban/filter.d/sshd.conf", "")
            .with_file("/etc/fail2ban/filter.d/apache-auth.conf", "");
        let detection = detect(&hal, builtin_catalogue(), Path::new("/etc/fail2ban/filter.d"));

        let ssh = &detection.services[0];
        assert_eq!(ssh.log.path, "/var/log/secure");
        assert_eq!(ssh.log.kind, Resolution::Found);
        assert_eq!(ssh.filter.as_deref(), Some("sshd"));

        // Pending on the nginx fallback, so apache-auth does not qualify.
        let web = &detection.services[1];
        assert_eq!(web.log.kind, Resolution::Pending);
        assert_eq!(web.log.path, "/var/log/nginx/error.log");
        assert_eq!(web.filter, None);

        let db = &detection.services[2];
        assert_eq!(db.log.kind, Resolution::Pattern);
        assert_eq!(db.filter, None);

        assert_eq!(detection.related_filters, vec!["apache-auth", "sshd"]);
    }

    #[test]
    fn httpd_log_pairs_with_apache_filter() {
        let hal = FakeHal::new()
            .with_file("/var/log/httpd/error_log", "")
            .with_file("/etc/fail2ban/filter.d/apache-auth.conf", "")
            .with_file("/etc/fail2ban/filter.d/nginx-http-auth.conf", "");
        let operator: OperatorAddress = "198.51.100.20".parse().unwrap();
        let plan = plan(&hal, &Config::default(), &operator);

        let web = &plan.document.jails[1];
        assert!(web.enabled);
        assert_eq!(web.log.path, "/var/log/httpd/error_log");
        assert_eq!(web.filter, "apache-auth");
        assert!(plan.rendered.contains(
            "[web-auth]\nenabled = true\nfilter = apache-auth\nlogpath = /var/log/httpd/error_log\n"
        ));
    }

    #[test]
    fn nginx_log_pairs_with_nginx_filter() {
        let hal = FakeHal::new()
            .with_file("/var/log/nginx/error.log", "")
            .with_file("/etc/fail2ban/filter.d/apache-auth.conf", "")
            .with_file("/etc/fail2ban/filter.d/nginx-http-auth.conf", "");
        let detection = detect(&hal, builtin_catalogue(), Path::new("/etc/fail2ban/filter.d"));
        assert_eq!(detection.services[1].filter.as_deref(), Some("nginx-http-auth"));
    }

    #[test]
    fn httpd_log_without_apache_filter_is_skipped() {
        let hal = FakeHal::new()
            .with_file("/var/log/httpd/error_log", "")
            .with_file("/etc/fail2ban/filter.d/nginx-http-auth.conf", "");
        let detection = detect(&hal, builtin_catalogue(), Path::new("/etc/fail2ban/filter.d"));
        assert_eq!(detection.services[1].filter, None);
    }

    #[test]
    fn plan_is_idempotent() {
        let hal = FakeHal::new()
            .with_file("/var/log/auth.log", "")
            .with_file("/etc/fail2ban/filter.d/sshd.conf", "")
            .with_file("/etc/fail2ban/filter.d/mysqld-auth.conf", "");
        let config = Config::default();
        let operator: OperatorAddress = "198.51.100.20".parse().unwrap();

        let first = plan(&hal, &config, &operator);
        let second = plan(&hal, &config, &operator);
        assert_eq!(first.rendered, second.rendered);
        assert_eq!(first.document, second.document);
    }
}
