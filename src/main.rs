//! depvet - Dependency restore and version policy validator CLI tool
//!
//! Validates `project.json` manifests against their lockfiles and a
//! configurable version policy, optionally rewriting fixable problems.

use clap::Parser;
use depvet::cli::CliArgs;
use depvet::orchestrator::Orchestrator;
use depvet::output::{create_formatter, OutputConfig};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit code for fatal startup failures
const EXIT_FATAL: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the default level
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    if args.verbose {
        eprintln!("depvet v{}", env!("CARGO_PKG_VERSION"));
        for path in &args.paths {
            eprintln!("Target: {}", path.display());
        }
    }

    let orchestrator = Orchestrator::from_args(&args)?;
    if args.verbose && orchestrator.config().fix_mode() {
        eprintln!("Mode: fix");
    }

    let report = orchestrator.run().await;

    let formatter = create_formatter(OutputConfig::from_cli(args.json, args.verbose, args.quiet));
    let mut stdout = io::stdout().lock();
    formatter.format(&report, &mut stdout)?;
    stdout.flush()?;

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
