//! autoupgrade - upgrade npm, yarn or pnpm dependencies one at a time
//!
//! Each outdated package is installed at its latest version, the check
//! command is run, and the upgrade is kept only if the check passes.

use autoupgrade::cli::CliArgs;
use autoupgrade::command::SystemRunner;
use autoupgrade::error::AppError;
use autoupgrade::operator::TerminalOperator;
use autoupgrade::output::{create_formatter, OutputConfig};
use autoupgrade::package_manager::{detect, profile};
use autoupgrade::session::{Session, SessionConfig};
use clap::Parser;
use log::debug;
use std::io::{self, Write};
use std::process::ExitCode;

fn initialize_logger(verbose: bool, quiet: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        simplelog::LevelFilter::Debug
    } else if quiet {
        simplelog::LevelFilter::Warn
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("autoupgrade")
        .build();

    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if let Err(e) = initialize_logger(args.verbose, args.quiet) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    // Run the main logic and handle errors
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(command) = e.downcast_ref::<AppError>().and_then(AppError::failed_command) {
                eprintln!("Failed command: {}", command);
            }
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<()> {
    debug!("autoupgrade v{}", env!("CARGO_PKG_VERSION"));
    debug!("target: {}", args.path.display());

    let config = SessionConfig::from_cli(&args).map_err(AppError::from)?;
    let kind = detect(&args.path).map_err(AppError::from)?;
    debug!("detected package manager: {}", kind);

    let runner = SystemRunner::new(&args.path).with_timeout(args.timeout);
    let operator = TerminalOperator::new(args.quiet);
    let mut session = Session::new(config, profile(kind), runner, operator);
    let report = session.run().await.map_err(AppError::from)?;

    let formatter = create_formatter(OutputConfig::from_cli(args.json, args.verbose, args.quiet));
    let mut stdout = io::stdout().lock();
    formatter.format(&report, &mut stdout)?;
    stdout.flush()?;

    Ok(())
}
