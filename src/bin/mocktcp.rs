//! mocktcp Binary
//!
//! Loads a JSON script and plays it as a server or a client.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mocktcp::{ErrorClass, MockConfig, RunOptions, RunOutcome};
use tracing_subscriber::{fmt, EnvFilter};

/// mocktcp
#[derive(Parser, Debug)]
#[command(name = "mocktcp")]
#[command(about = "Scriptable TCP server/client for protocol testing")]
#[command(version)]
struct Args {
    /// The mock tcp server/client config file
    #[arg(short, long, default_value = "mocktcp.conf")]
    config: PathBuf,

    /// Validate every request item and exit
    #[arg(long)]
    check: bool,

    /// Capacity of a single read, in bytes
    #[arg(short, long, default_value = "2048")]
    buffer_size: usize,

    /// Parent directory for per-run dump directories
    #[arg(short, long, default_value = "./dump")]
    dump_dir: PathBuf,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mocktcp=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("mocktcp v{}", mocktcp::VERSION);
    tracing::info!("Config file: {}", args.config.display());

    let config = match MockConfig::from_file(&args.config) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    if args.check {
        return match config.validate() {
            Ok(()) => {
                println!("{}: {} request item(s) ok", args.config.display(), config.requests.len());
                ExitCode::SUCCESS
            }
            Err(e) => fail(e),
        };
    }

    let options = RunOptions::builder()
        .buffer_capacity(args.buffer_size)
        .dump_root(&args.dump_dir)
        .build();

    match mocktcp::run(&config, &options) {
        Ok(RunOutcome::ScriptPassed(report)) => {
            tracing::info!("[{}] {} exchange(s) matched", report.session, report.exchanges);
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::ByePacket { session }) => {
            tracing::info!("[{}] bye packet answered, exiting", session);
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::AcceptStopped) => {
            tracing::info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn fail(e: mocktcp::MockError) -> ExitCode {
    match e.class() {
        ErrorClass::MatchFailure => tracing::error!("Test failed: {}", e),
        ErrorClass::Config => tracing::error!("Invalid script: {}", e),
        ErrorClass::Transport => tracing::error!("Transport failure: {}", e),
    }
    // Exit codes are all within 1..=255
    ExitCode::from(e.exit_code() as u8)
}
