use std::process::ExitCode;

use clap::Parser as _;
use cli::Cli;
use tokio::{
    select,
    signal::unix::{SignalKind, signal},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{self, EnvFilter};

use tokenboard_core::config::Config;

mod cli;
mod query;
mod tokens;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error reporter: {e}");
        return ExitCode::FAILURE;
    }

    // Load configuration
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(
                    "hyper_util=warn"
                        .parse()
                        .expect("well-formed tracing directive should parse"),
                )
                .add_directive(
                    "reqwest=warn"
                        .parse()
                        .expect("well-formed tracing directive should parse"),
                )
                .add_directive(
                    "alloy_rpc_client=warn"
                        .parse()
                        .expect("well-formed tracing directive should parse"),
                ),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let shutdown_token = CancellationToken::new();

    let command_jh = tokio::spawn(cli.run(config, shutdown_token.clone()));

    // Set up signal handlers for graceful shutdown
    let mut sigterm = signal(SignalKind::terminate())
        .expect("setting sigterm listener on unix should always work");
    let mut sigint = signal(SignalKind::interrupt())
        .expect("setting sigint listener on unix should always work");

    // Wait for either command completion or interrupt signal
    select! {
        res = command_jh => match res {
            Ok(Ok(())) => ExitCode::SUCCESS,
            Ok(Err(e)) => {
                error!(error = ?e, "command failed");
                ExitCode::FAILURE
            }
            Err(e) => {
                error!(%e, "command task panicked");
                ExitCode::FAILURE
            }
        },
        _ = sigterm.recv() => {
            info!("received SIGTERM signal");
            shutdown_token.cancel();
            ExitCode::FAILURE
        }
        _ = sigint.recv() => {
            info!("received SIGINT signal");
            shutdown_token.cancel();
            ExitCode::FAILURE
        }
    }
}
