use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use color_eyre::eyre::{self, Context as _, eyre};
use tokenboard_core::config::Config;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

mod board;
mod command;
mod console;
pub mod telemetry;

/// The [`Tokenboard`] service returned by [`Tokenboard::spawn`].
pub struct Tokenboard {
    shutdown_token: CancellationToken,
    task: Option<JoinHandle<eyre::Result<()>>>,
}

impl Tokenboard {
    /// Spawns the [`Tokenboard`] service.
    ///
    /// # Errors
    /// Returns an error if the dashboard cannot be initialized.
    pub fn spawn(cfg: Config) -> eyre::Result<Self> {
        let shutdown_token = CancellationToken::new();
        let inner = board::Board::new(cfg, shutdown_token.child_token())?;
        let task = tokio::spawn(inner.run());

        Ok(Self {
            shutdown_token,
            task: Some(task),
        })
    }

    /// Shuts down the dashboard, waiting for the refresh scheduler to stop.
    ///
    /// # Errors
    /// Returns an error if an error occured during shutdown or the service
    /// was already shut down.
    pub async fn shutdown(mut self) -> eyre::Result<()> {
        self.shutdown_token.cancel();
        let task = self
            .task
            .take()
            .ok_or_else(|| eyre!("shutdown must only be called once"))?;
        flatten_join_result(task.await)
    }
}

impl Future for Tokenboard {
    type Output = eyre::Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        use futures::future::FutureExt as _;

        match self.task.as_mut() {
            Some(task) => task.poll_unpin(cx).map(flatten_join_result),
            None => Poll::Ready(Err(eyre!("tokenboard polled after completion"))),
        }
    }
}

fn flatten_join_result<T>(res: Result<eyre::Result<T>, JoinError>) -> eyre::Result<T> {
    match res {
        Ok(Ok(res)) => Ok(res),
        Ok(Err(e)) => Err(e).wrap_err("task returned with error"),
        Err(e) => Err(e).wrap_err("task panicked"),
    }
}
