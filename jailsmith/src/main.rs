use anyhow::{Context, Result};
use clap::Parser;
use jailsmith_core::commands::{run_apply, run_detect, run_plan, ApplyOptions};
use jailsmith_core::config::Config;
use jailsmith_core::operator::{detect_operator_address, OperatorAddress};
use jailsmith_core::{EXIT_FAILURE, EXIT_OK};
use jailsmith_hal::LinuxHal;
use std::io::{self, Write};

mod cli;

fn main() {
    let cli = cli::Cli::parse();
    jailsmith_core::logging::init(cli.verbose);

    let code = match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            log::error!("{err:#}");
            eprintln!("❌ {err:#}");
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}

fn run(cli: &cli::Cli) -> Result<i32> {
    let config = Config::load(cli.config.as_deref())?;
    let hal = LinuxHal::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let code = match &cli.command {
        cli::Command::Detect => {
            run_detect(&hal, &config, &mut out)?;
            EXIT_OK
        }
        cli::Command::Plan { operator, json } => {
            let operator = operator_address(operator, &config)?;
            run_plan(&hal, &config, &operator, *json, &mut out)?;
            EXIT_OK
        }
        cli::Command::Apply {
            operator,
            skip_root_check,
        } => {
            let operator = operator_address(operator, &config)?;
            let options = ApplyOptions {
                skip_root_check: *skip_root_check,
            };
            run_apply(&hal, &config, &operator, options, &mut out)?
        }
    };
    out.flush()?;
    Ok(code)
}

fn operator_address(args: &cli::OperatorArgs, config: &Config) -> Result<OperatorAddress> {
    match &args.operator_ip {
        Some(raw) => raw
            .parse::<OperatorAddress>()
            .with_context(|| format!("Invalid --operator-ip {raw:?}")),
        None => detect_operator_address(&config.ip_lookup_url)
            .context("Failed to detect operator address (pass --operator-ip instead)"),
    }
}
