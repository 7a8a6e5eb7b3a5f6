//! fail2ban INI rendering.
//!
//! Output is a pure function of the document: no timestamps, no hostnames, so an
//! unchanged host renders byte-identical files.

use crate::policy::JailPolicyDocument;
use std::fmt::Write;

const HEADER: &str =
    "# Managed by jailsmith. Regenerated on every run; local edits are overwritten.\n";

/// `[DEFAULT]` first, then enabled jails in declaration order. Skipped jails are omitted.
pub fn render(document: &JailPolicyDocument) -> String {
    let mut out = String::from(HEADER);
    let defaults = &document.defaults;

    // Writing into a String cannot fail.
    let _ = writeln!(out);
    let _ = writeln!(out, "[DEFAULT]");
    let _ = writeln!(out, "ignoreip = {}", defaults.ignore_list.join(" "));
    let _ = writeln!(out, "bantime = {}", defaults.bantime);
    let _ = writeln!(out, "findtime = {}", defaults.findtime);
    let _ = writeln!(out, "maxretry = {}", defaults.maxretry);
    let _ = writeln!(out, "backend = {}", defaults.backend);

    for jail in document.enabled_jails() {
        let _ = writeln!(out);
        let _ = writeln!(out, "[{}]", jail.jail);
        let _ = writeln!(out, "enabled = true");
        let _ = writeln!(out, "filter = {}", jail.filter);
        let _ = writeln!(out, "logpath = {}", jail.log.path);
        let _ = writeln!(out, "maxretry = {}", jail.maxretry);
    }
    out
}
