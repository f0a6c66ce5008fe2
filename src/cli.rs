//! CLI argument parsing module for autoupgrade

use crate::session::DEFAULT_CHECK_COMMAND;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

/// Parse timeout string in format: Ns (seconds), Nm (minutes), Nh (hours)
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty timeout string".to_string());
    }

    let (num_str, unit) = if let Some(n) = s.strip_suffix('s') {
        (n, 's')
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 'm')
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 'h')
    } else {
        return Err(format!("invalid timeout format: {}", s));
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number in timeout: {}", num_str))?;
    if num == 0 {
        return Err("timeout must be greater than zero".to_string());
    }

    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        _ => unreachable!(),
    };
    let seconds = num
        .checked_mul(multiplier)
        .ok_or_else(|| format!("timeout too large: {}", s))?;

    Ok(Duration::from_secs(seconds))
}

/// Upgrade npm, yarn or pnpm dependencies one at a time, keeping only the
/// upgrades that pass your checks
#[derive(Parser, Debug, Clone)]
#[command(
    name = "autoupgrade",
    version,
    about = "Upgrade dependencies one at a time, keeping only those that pass your checks"
)]
pub struct CliArgs {
    /// Command that must pass before and after each upgrade
    #[arg(value_name = "CHECK_COMMAND", default_value = DEFAULT_CHECK_COMMAND)]
    pub check_command: String,

    /// Repository root to operate in
    #[arg(short = 'C', long = "dir", default_value = ".")]
    pub path: PathBuf,

    /// Proceed without asking for confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// List outdated packages and stop without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    // Package filters
    /// Upgrade only specific packages (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub only: Vec<String>,

    /// Exclude specific packages from upgrade (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Kill any subprocess running longer than this (e.g., 90s, 10m, 1h)
    #[arg(long, value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    // Output options
    /// Output the session report in JSON format
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,
}
