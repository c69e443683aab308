use std::process::ExitCode;

use color_eyre::eyre;
use tokenboard_core::config::Config;
use tokenboardd::{
    Tokenboard,
    telemetry::{self, init_subscriber},
};
use tokio::{
    select,
    signal::unix::{SignalKind, signal},
};
use tracing::{error, info, instrument, warn};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error reporter: {e}");
        return ExitCode::FAILURE;
    }

    // set up config
    let cfg: Config = match Config::load() {
        Err(err) => {
            eprintln!("failed to read config:\n{err:?}");
            return ExitCode::FAILURE;
        }
        Ok(cfg) => cfg,
    };

    // set up tracing
    let tracing_subscriber = telemetry::get_subscriber();
    init_subscriber(tracing_subscriber);
    info!(
        network.key = %cfg.network,
        indexer.url = %cfg.indexer.url,
        wallet.configured = cfg.wallet.is_some(),
        "starting tokenboard"
    );

    // spawn service
    let mut tokenboard = match Tokenboard::spawn(cfg) {
        Ok(tokenboard) => tokenboard,
        Err(e) => {
            error!(%e, "failed initializing tokenboard");
            return ExitCode::FAILURE;
        }
    };

    let mut sigterm = signal(SignalKind::terminate())
        .expect("setting sigterm listener on unix should always work");
    let mut sigint = signal(SignalKind::interrupt())
        .expect("setting sigint listener on unix should always work");

    // `None` when the service stopped on its own after a `quit` command
    let exit_reason = select! {
        _ = sigterm.recv() => Ok(Some("received SIGTERM")),
        _ = sigint.recv() => Ok(Some("received SIGINT")),
        res = &mut tokenboard => res.map(|()| None),
    };

    shutdown(exit_reason, tokenboard).await
}

#[instrument(skip_all)]
async fn shutdown(reason: eyre::Result<Option<&str>>, service: Tokenboard) -> ExitCode {
    let exit_code = match reason {
        Ok(Some(reason)) => {
            info!(reason, "shutting down");
            if let Err(e) = service.shutdown().await {
                warn!(%e, "shutting down");
            }
            ExitCode::SUCCESS
        }
        Ok(None) => {
            info!("tokenboard service finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(%e, "tokenboard service exited unexpectedly");
            ExitCode::FAILURE
        }
    };
    info!("shutdown successful");
    exit_code
}
