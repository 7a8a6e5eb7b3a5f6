//! The operator's own address, exempted from bans.
//!
//! Supplied on the command line or looked up once per run from a plain-text
//! "what is my IP" endpoint. Never cached between runs.

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// A single address or CIDR range, as accepted by fail2ban's `ignoreip`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OperatorAddress(String);

impl OperatorAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OperatorAddress {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (addr, prefix) = match raw.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (raw, None),
        };
        let ip: IpAddr = addr
            .parse()
            .with_context(|| format!("not an IP address: {raw:?}"))?;
        if let Some(prefix) = prefix {
            let bits: u8 = prefix
                .parse()
                .with_context(|| format!("bad prefix length in {raw:?}"))?;
            let max = if ip.is_ipv4() { 32 } else { 128 };
            if bits > max {
                bail!("prefix length {bits} out of range for {addr}");
            }
        }
        Ok(Self(raw.to_string()))
    }
}

impl fmt::Display for OperatorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ask `lookup_url` for our externally visible address. One attempt.
pub fn detect_operator_address(lookup_url: &str) -> Result<OperatorAddress> {
    log::info!("Looking up operator address via {lookup_url}");
    let client = reqwest::blocking::Client::builder()
        .user_agent("jailsmith")
        .timeout(LOOKUP_TIMEOUT)
        .build()?;

    let body = client
        .get(lookup_url)
        .send()
        .with_context(|| format!("address lookup request to {lookup_url} failed"))?
        .error_for_status()
        .context("address lookup returned an error status")?
        .text()
        .context("address lookup response was not text")?;

    let first_line = body
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| anyhow!("address lookup returned an empty body"))?;
    let address = first_line.parse::<OperatorAddress>()?;
    log::info!("Operator address: {address}");
    Ok(address)
}
