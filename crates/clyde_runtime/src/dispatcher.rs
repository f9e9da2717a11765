//! The dispatcher: a single task that owns the session.
//!
//! Messages and ticks are queued into the task; a shutdown signal takes
//! priority over both. Once the loop stops, chains and subscriptions are
//! written back before `shutdown()` returns.

use crate::transport::Transport;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clyde_behavior::{BehaviorPipeline, IdleBehavior, Session};
use clyde_core::{ClydeConfig, Incoming, Reply};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

// ============================================================================
// Events
// ============================================================================

#[derive(Debug)]
enum Event {
    Message(Incoming),
    Tick,
    /// Answered once every earlier event has been handled.
    Flush(oneshot::Sender<()>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Running,
    ShuttingDown,
}

// ============================================================================
// Dispatcher
// ============================================================================

pub struct Dispatcher {
    session: Session,
    pipeline: BehaviorPipeline,
    idle: IdleBehavior,
    transport: Arc<dyn Transport>,
    tick_interval: Duration,
    pace_per_char: Duration,
    queue_capacity: usize,
}

impl Dispatcher {
    pub fn new(
        config: &ClydeConfig,
        session: Session,
        pipeline: BehaviorPipeline,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            session,
            pipeline,
            idle: IdleBehavior::new(config),
            transport,
            tick_interval: Duration::from_secs(config.runtime.tick_interval_secs.max(1)),
            pace_per_char: Duration::from_millis(config.runtime.pace_ms_per_char),
            queue_capacity: config.runtime.queue_capacity.max(1),
        }
    }

    /// Start the control loop on the tokio runtime.
    pub fn spawn(self) -> DispatcherHandle {
        let (events_tx, events_rx) = mpsc::channel(self.queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(events_rx, shutdown_rx));
        DispatcherHandle {
            events: events_tx,
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(
        mut self,
        mut events: mpsc::Receiver<Event>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<Session> {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        tracing::info!("Dispatcher running via {} transport", self.transport.name());
        let mut state = LoopState::Running;
        while state == LoopState::Running {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        state = LoopState::ShuttingDown;
                    }
                }
                event = events.recv() => match event {
                    Some(Event::Message(msg)) => self.handle_message(msg).await,
                    Some(Event::Tick) => self.handle_tick(Utc::now()).await,
                    Some(Event::Flush(done)) => {
                        let _ = done.send(());
                    }
                    None => state = LoopState::ShuttingDown,
                },
                _ = ticker.tick() => self.handle_tick(Utc::now()).await,
            }
        }

        tracing::info!("Dispatcher shutting down, saving state");
        self.session.persist()?;
        tracing::info!("State saved to {}", self.session.paths().chain.display());
        Ok(self.session)
    }

    async fn handle_message(&mut self, msg: Incoming) {
        if self.session.is_own(&msg) {
            tracing::trace!("Ignoring our own message on {}", msg.channel);
            return;
        }
        self.session.learn(&msg);

        let dispatch = self.pipeline.dispatch(&mut self.session, &msg, Utc::now());
        if let Some(rule) = &dispatch.rule {
            tracing::debug!(
                "{} on {}/{} matched {} ({} replies)",
                msg.sender_name(),
                msg.channel,
                msg.instance,
                rule,
                dispatch.replies.len()
            );
        }
        for reply in dispatch.replies {
            self.send(reply).await;
        }
    }

    async fn handle_tick(&mut self, now: DateTime<Utc>) {
        let mut replies: Vec<Reply> = Vec::new();
        replies.extend(self.idle.on_tick(&mut self.session, now));
        replies.extend(self.session.cat_tick(now));
        for reply in replies {
            self.send(reply).await;
        }
    }

    /// Sign, wrap, pace and hand a reply to the transport.
    async fn send(&mut self, reply: Reply) {
        let out = self.session.compose(reply);
        let delay = self.pace_per_char * out.body.chars().count() as u32;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Err(e) = self.transport.send(&out).await {
            tracing::warn!("Failed to send to {}/{}: {:#}", out.channel, out.instance, e);
        }
    }
}

// ============================================================================
// Handle
// ============================================================================

/// The only way to reach a running dispatcher.
pub struct DispatcherHandle {
    events: mpsc::Sender<Event>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Result<Session>>,
}

impl DispatcherHandle {
    /// Queue an incoming message, waiting for room if the queue is full.
    pub async fn deliver(&self, msg: Incoming) -> Result<()> {
        self.events
            .send(Event::Message(msg))
            .await
            .map_err(|_| anyhow!("dispatcher has stopped"))
    }

    /// Queue an extra tick. Dropped when the queue is full.
    pub fn tick(&self) -> Result<()> {
        match self.events.try_send(Event::Tick) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Dispatcher queue full, dropping tick");
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(anyhow!("dispatcher has stopped")),
        }
    }

    /// Wait until everything queued so far has been handled.
    pub async fn flush(&self) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.events
            .send(Event::Flush(done_tx))
            .await
            .map_err(|_| anyhow!("dispatcher has stopped"))?;
        done_rx.await.map_err(|_| anyhow!("dispatcher has stopped"))
    }

    /// Stop the loop and wait until state has been saved.
    ///
    /// Shutdown wins over queued events; call [`flush`](Self::flush) first
    /// to have them handled. Returns the final session.
    pub async fn shutdown(self) -> Result<Session> {
        // the loop may already be gone; the join below reports why
        let _ = self.shutdown.send(true);
        self.task.await.context("Dispatcher task failed")?
    }
}
