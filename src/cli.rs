use chrono::{DateTime, FixedOffset};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "snapprune")]
#[command(about = "Prune btrfs snapshots with a daily/monthly/yearly retention policy")]
#[command(version)]
pub struct Cli {
    /// Mounted btrfs path whose snapshots are pruned (repeatable)
    #[arg(long = "path", short = 'p', required = true)]
    pub paths: Vec<PathBuf>,

    /// Show what would be deleted without deleting anything
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Debug diagnostics and the audit log
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,

    /// Run btrfs through sudo
    #[arg(long, default_value_t = false)]
    pub sudo: bool,

    /// Retention policies as JSON: {"<volume>": {"day2day": 2, "firstOfDay": 5, "firstOfMonth": 2, "firstOfYear": 10}}
    #[arg(long, conflicts_with = "config_file")]
    pub config: Option<String>,

    /// Retention policies from a file (.toml, otherwise JSON)
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Directory for the audit log (defaults to the user data dir)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Print each volume's plan as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Pin the run clock (RFC 3339), for reproducible previews
    #[arg(long, hide = true, value_parser = parse_now)]
    pub now: Option<DateTime<FixedOffset>>,
}

fn parse_now(value: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(value).map_err(|e| format!("invalid timestamp '{value}': {e}"))
}
