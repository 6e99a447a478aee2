use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use snapprune::btrfs::BtrfsCommand;
use snapprune::cli::Cli;
use snapprune::config::Config;
use snapprune::error::codes;
use snapprune::{platform, prune, report};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "snapprune=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .init();
}

fn run(config: &Config) -> anyhow::Result<u8> {
    let store = BtrfsCommand::new(config.use_sudo);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let result = prune::run(&store, config, &mut out).context("failed to write run output")?;

    if !config.json_output {
        write!(out, "{}", report::summary(&result, config.dry_run, config.verbose))?;
    }
    out.flush()?;

    Ok(result.exit_code())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // refuse before touching the filesystem when the policy gate fails
    let config = match Config::from_args(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    if let Some(tool) = platform::missing_tool(config.use_sudo) {
        eprintln!("error: '{tool}' is not available");
        return ExitCode::from(codes::INVENTORY_FAILED);
    }

    debug!(now = %config.now, dry_run = config.dry_run, paths = config.paths.len(), "starting run");

    match run(&config) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(codes::PARTIAL_FAILURE)
        }
    }
}
