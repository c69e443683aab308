use std::{sync::Arc, time::Duration};

use color_eyre::eyre;
use futures::future::Fuse;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::{dashboard::CycleResolver, render::Renderer, session::Session};

use super::{Handle, Phase, Worker};

pub struct Builder {
    pub session: Arc<Session>,
    pub resolver: Arc<dyn CycleResolver>,
    pub renderer: Arc<dyn Renderer>,
    /// Ticks between two cycles
    pub countdown: u32,
    pub tick: Duration,
}

impl Builder {
    pub fn build(self) -> eyre::Result<Handle> {
        let Self {
            session,
            resolver,
            renderer,
            countdown,
            tick,
        } = self;

        eyre::ensure!(!tick.is_zero(), "refresh tick must be non-zero");

        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let (phase_tx, phase_rx) = watch::channel(Phase::Idle);
        let (frame_tx, frame_rx) = watch::channel(None);

        let shutdown_token = CancellationToken::new();

        let worker = Worker {
            session,
            resolver,
            renderer,
            countdown,
            tick,
            trigger_rx,
            phase: Phase::Idle,
            phase_tx,
            frame_tx,
            shutdown_token: shutdown_token.clone(),
            in_flight: Fuse::terminated(),
            pending_restart: None,
        };

        let worker_handle = tokio::task::spawn(async move { worker.run().await });

        Ok(Handle {
            shutdown_token,
            worker_handle: Some(worker_handle),
            trigger_tx,
            phase_rx,
            frame_rx,
        })
    }
}
