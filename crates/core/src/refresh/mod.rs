//! Countdown-driven refresh of the dashboard.
//!
//! The worker runs at most one resolve cycle at a time. Triggers that arrive
//! while a cycle is in flight collapse into a single restart, and a frame
//! resolved for a session context that has since changed is dropped instead
//! of rendered.
use std::{pin::Pin, sync::Arc, time::Duration};

use color_eyre::eyre::{self, WrapErr as _, eyre};
use futures::{
    Future, FutureExt as _,
    future::{BoxFuture, Fuse, FusedFuture as _},
};
use tokio::{
    select,
    sync::{mpsc, watch},
    time::{Instant, MissedTickBehavior},
};
use tokio_stream::{StreamExt as _, wrappers::WatchStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::{
    dashboard::CycleResolver,
    render::{Frame, Renderer},
    session::{Session, SessionContext},
};

pub use builder::Builder;
mod builder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    CountingDown { remaining: u32 },
    Resolving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    WalletConnected,
    NetworkSwitched,
    ManualRefresh,
    TokenAdded,
    Countdown,
}

pub struct Handle {
    shutdown_token: CancellationToken,
    worker_handle: Option<tokio::task::JoinHandle<eyre::Result<()>>>,
    trigger_tx: mpsc::UnboundedSender<Trigger>,
    phase_rx: watch::Receiver<Phase>,
    frame_rx: watch::Receiver<Option<Arc<Frame>>>,
}

impl Handle {
    pub async fn shutdown(&mut self) -> eyre::Result<()> {
        self.shutdown_token.cancel();
        // Already awaited to completion through the handle's `Future` impl.
        let Some(worker) = self.worker_handle.take() else {
            return Ok(());
        };
        worker
            .await
            .wrap_err("refresh scheduler panicked")?
            .wrap_err("refresh scheduler returned with err")
    }

    /// Requests a resolve cycle. Coalesced with any cycle already in flight.
    pub fn trigger(&self, trigger: Trigger) -> eyre::Result<()> {
        self.trigger_tx
            .send(trigger)
            .map_err(|_| eyre!("refresh scheduler is not running"))
    }

    pub fn phase_rx(&self) -> watch::Receiver<Phase> {
        self.phase_rx.clone()
    }

    pub fn frame_rx(&self) -> watch::Receiver<Option<Arc<Frame>>> {
        self.frame_rx.clone()
    }

    /// The frame that was rendered last, if any.
    pub fn latest_frame(&self) -> Option<Arc<Frame>> {
        self.frame_rx.borrow().clone()
    }
}

// Awaiting the handle deals with the Worker's result
impl Future for Handle {
    type Output = eyre::Result<()>;

    fn poll(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        let Some(task) = self.worker_handle.as_mut() else {
            return std::task::Poll::Ready(Err(eyre!(
                "refresh handle polled after shutdown"
            )));
        };

        let result = std::task::ready!(task.poll_unpin(cx));
        self.worker_handle = None;
        std::task::Poll::Ready(match result {
            Ok(worker_res) => worker_res.wrap_err("refresh task returned with err"),
            Err(e) => Err(e).wrap_err("refresh task panicked"),
        })
    }
}

struct Worker {
    session: Arc<Session>,
    resolver: Arc<dyn CycleResolver>,
    renderer: Arc<dyn Renderer>,
    countdown: u32,
    tick: Duration,
    trigger_rx: mpsc::UnboundedReceiver<Trigger>,
    phase: Phase,
    phase_tx: watch::Sender<Phase>,
    frame_tx: watch::Sender<Option<Arc<Frame>>>,
    shutdown_token: CancellationToken,
    in_flight: Fuse<BoxFuture<'static, Frame>>,
    /// Latest trigger that arrived while a cycle was in flight
    pending_restart: Option<Trigger>,
}

impl Worker {
    #[instrument(name = "refresh_scheduler", skip(self), fields(countdown = self.countdown))]
    pub async fn run(mut self) -> eyre::Result<()> {
        info!(
            tick = %humantime::format_duration(self.tick),
            "Starting refresh scheduler"
        );

        let mut contexts = WatchStream::from_changes(self.session.subscribe());
        let mut last_context = self.session.current();

        let mut ticker = tokio::time::interval_at(Instant::now() + self.tick, self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        if last_context.wallet.is_some() {
            self.request_cycle(Trigger::WalletConnected);
        }

        // biased loop
        // 1. shutdown signal
        // 2. finished cycle: render or discard, then restart or count down
        // 3. session changes
        // 4. explicit triggers
        // 5. countdown ticks
        loop {
            select! {
                biased;

                () = self.shutdown_token.cancelled() => {
                    info!("refresh scheduler received shutdown signal");
                    break Ok(());
                }

                frame = &mut self.in_flight, if !self.in_flight.is_terminated() => {
                    self.complete_cycle(frame);
                    if matches!(self.phase, Phase::CountingDown { .. }) {
                        ticker.reset();
                    }
                }

                Some(context) = contexts.next() => {
                    match trigger_for(&last_context, &context) {
                        Some(trigger) => self.request_cycle(trigger),
                        None => self.go_idle(),
                    }
                    last_context = context;
                }

                Some(trigger) = self.trigger_rx.recv() => {
                    self.request_cycle(trigger);
                }

                _ = ticker.tick(), if matches!(self.phase, Phase::CountingDown { .. }) => {
                    self.count_down();
                }
            }
        }
    }

    fn request_cycle(&mut self, trigger: Trigger) {
        if !self.in_flight.is_terminated() {
            debug!(?trigger, "resolve in flight, coalescing into one restart");
            self.pending_restart = Some(trigger);
            return;
        }

        let context = self.session.current();
        if context.wallet.is_none() {
            debug!(?trigger, "no wallet connected, ignoring trigger");
            self.set_phase(Phase::Idle);
            return;
        }

        debug!(?trigger, generation = context.generation, "starting resolve cycle");
        let resolver = Arc::clone(&self.resolver);
        self.in_flight = async move { resolver.resolve(&context).await }
            .boxed()
            .fuse();
        self.set_phase(Phase::Resolving);
    }

    fn complete_cycle(&mut self, frame: Frame) {
        let generation = frame.context.generation;
        if self.session.is_current(generation) {
            self.renderer.render(&frame);
            self.frame_tx.send_replace(Some(Arc::new(frame)));
            debug!(generation, "rendered frame");
        } else {
            debug!(generation, "discarding frame resolved for a stale session context");
        }

        if let Some(trigger) = self.pending_restart.take() {
            self.request_cycle(trigger);
        } else if self.session.current().wallet.is_some() {
            self.set_phase(Phase::CountingDown {
                remaining: self.countdown,
            });
            self.renderer.countdown(self.countdown);
        } else {
            self.set_phase(Phase::Idle);
        }
    }

    fn count_down(&mut self) {
        let Phase::CountingDown { remaining } = self.phase else {
            return;
        };

        let remaining = remaining.saturating_sub(1);
        self.renderer.countdown(remaining);
        if remaining == 0 {
            self.request_cycle(Trigger::Countdown);
        } else {
            self.set_phase(Phase::CountingDown { remaining });
        }
    }

    fn go_idle(&mut self) {
        self.pending_restart = None;
        self.set_phase(Phase::Idle);
    }

    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.phase_tx.send_replace(phase);
    }
}

/// The trigger a session change implies; `None` once the wallet is gone.
fn trigger_for(previous: &SessionContext, next: &SessionContext) -> Option<Trigger> {
    next.wallet?;
    Some(if previous.network != next.network {
        Trigger::NetworkSwitched
    } else {
        Trigger::WalletConnected
    })
}
