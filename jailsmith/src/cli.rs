//! CLI argument parsing for jailsmith

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jailsmith", version)]
#[command(about = "🛡️ jailsmith - fail2ban jails for the services this host actually runs")]
#[command(long_about = "🛡️ jailsmith - fail2ban jails for the services this host actually runs\n\n\
    Finds SSH, web server and database logs plus installed fail2ban filters,\n\
    then writes a jail configuration that only enables what is really there.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (default: /etc/jailsmith/jailsmith.toml, or $JAILSMITH_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Where the operator's own (never banned) address comes from.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct OperatorArgs {
    /// Operator address or CIDR range to exempt from bans
    #[arg(long)]
    pub operator_ip: Option<String>,

    /// Look the operator address up via the configured lookup URL
    #[arg(long)]
    pub detect_operator_ip: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// 🔍 Show detected log paths and filters (writes nothing)
    Detect,

    /// 📝 Print the jail configuration that would be written
    Plan {
        #[command(flatten)]
        operator: OperatorArgs,

        /// Print a JSON report instead of the rendered configuration
        #[arg(long)]
        json: bool,
    },

    /// 🛡️ Write the jail configuration, reload fail2ban and verify
    Apply {
        #[command(flatten)]
        operator: OperatorArgs,

        /// Do not require root (for staging into a test prefix)
        #[arg(long)]
        skip_root_check: bool,
    },
}
