//! Command entry points shared by the binary and the integration tests.
//!
//! Operator-facing text goes to the supplied writer; diagnostics go to the log.

use crate::apply::{apply_document, report_outcome, VerifyPolicy};
use crate::config::Config;
use crate::daemon::Fail2banDaemon;
use crate::operator::OperatorAddress;
use crate::planner::{detect, plan, Plan};
use crate::report::PlanReport;
use anyhow::{Context, Result};
use jailsmith_hal::{FsOps, SystemHal};
use std::io::Write;

/// Print what was found on this host without writing the jail document.
pub fn run_detect<F, W>(fs: &F, config: &Config, out: &mut W) -> Result<()>
where
    F: FsOps + ?Sized,
    W: Write,
{
    let detection = detect(fs, config.catalogue(), &config.filter_dir);
    writeln!(out, "🔍 Detection results")?;
    for service in &detection.services {
        let filter = service.filter.as_deref().unwrap_or("none");
        let state = if service.profile.enabled { "" } else { " [disabled]" };
        writeln!(
            out,
            "  {:<14} log={} ({})  filter={}{}",
            service.profile.service.name(),
            service.log.path,
            service.log.kind,
            filter,
            state
        )?;
    }
    if detection.related_filters.is_empty() {
        writeln!(out, "  no related filters in {}", config.filter_dir.display())?;
    } else {
        writeln!(
            out,
            "  related filters: {}",
            detection.related_filters.join(", ")
        )?;
    }
    Ok(())
}

/// Print the document (or its JSON report) that `apply` would write.
pub fn run_plan<F, W>(
    fs: &F,
    config: &Config,
    operator: &OperatorAddress,
    json: bool,
    out: &mut W,
) -> Result<()>
where
    F: FsOps + ?Sized,
    W: Write,
{
    let plan = plan(fs, config, operator);
    if json {
        let report = PlanReport::new(&plan)
            .to_json()
            .context("Failed to serialize plan report")?;
        writeln!(out, "{report}")?;
    } else {
        write!(out, "{}", plan.rendered)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    pub skip_root_check: bool,
}

/// Plan, write, reload and verify. Returns the process exit status.
pub fn run_apply<H, W>(
    hal: &H,
    config: &Config,
    operator: &OperatorAddress,
    options: ApplyOptions,
    out: &mut W,
) -> Result<i32>
where
    H: SystemHal + ?Sized,
    W: Write,
{
    if !options.skip_root_check {
        hal.ensure_root()
            .context("apply rewrites fail2ban configuration and must run as root")?;
    }

    let plan = plan(hal, config, operator);
    warn_skipped(&plan, out)?;

    let daemon = Fail2banDaemon::new(hal);
    let verify = VerifyPolicy::from(&config.verify);
    let result = apply_document(hal, &daemon, &config.jail_path, &plan.rendered, &verify);
    let code = report_outcome(out, &result)?;
    if let Err(err) = &result {
        log::error!("apply failed: {err}");
    }
    Ok(code)
}

fn warn_skipped<W: Write>(plan: &Plan, out: &mut W) -> Result<()> {
    for jail in plan.document.skipped_jails() {
        if let Some(reason) = jail.skip_reason {
            writeln!(
                out,
                "⚠️  skipped {} ({}): {}",
                jail.jail, jail.service, reason
            )?;
        }
    }
    Ok(())
}
