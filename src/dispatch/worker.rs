//! Dispatcher worker - serializes host notifications onto one task
//!
//! Hosts that deliver device notifications on a different thread than key
//! and motion events must not touch the registry concurrently. The worker
//! owns the [`InputDispatcher`] on a single tokio task and drains a bounded
//! queue of [`HostEvent`]s in arrival order.
//!
//! ```text
//! input thread ──┐
//!                ├─[HostEvent]─► mpsc ─► dispatch task ─► EngineSink
//! device thread ─┘   (bounded)          (owns dispatcher)
//! ```

use chrono::Local;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::DispatcherSettings;
use crate::dispatch::dispatcher::{HostEvent, InputDispatcher};
use crate::engine::EngineSink;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Dispatch queue closed")]
    QueueClosed,

    #[error("Dispatch queue full, dropped {0}")]
    QueueFull(String),

    #[error("Dispatcher stopped before replying")]
    ReplyDropped,
}

#[derive(Debug)]
struct Envelope {
    event: HostEvent,
    reply: Option<oneshot::Sender<bool>>,
}

/// Cloneable entry point into the dispatch task.
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    sender: mpsc::Sender<Envelope>,
    cancel: CancellationToken,
}

impl DispatcherHandle {
    /// Move `dispatcher` onto its own task.
    ///
    /// The join handle yields the dispatcher back once the task stops, either
    /// after [`DispatcherHandle::shutdown`] or when every handle is dropped.
    pub fn spawn<S>(
        dispatcher: InputDispatcher<S>,
        settings: &DispatcherSettings,
    ) -> (Self, JoinHandle<InputDispatcher<S>>)
    where
        S: EngineSink + Send + 'static,
    {
        info!("Spawning dispatcher task with settings: {:?}", settings);

        let (sender, receiver) = mpsc::channel(settings.queue_capacity.max(1));
        debug!(
            "Created host event queue with capacity {}",
            settings.queue_capacity
        );
        let cancel = CancellationToken::new();
        let stats_interval = stats_interval(settings.stats_interval_secs);

        let task = tokio::spawn(run_dispatch_loop(
            dispatcher,
            receiver,
            cancel.clone(),
            stats_interval,
        ));

        info!("Dispatcher task started");
        (Self { sender, cancel }, task)
    }

    /// Queue an event without waiting for the verdict.
    pub async fn send(&self, event: HostEvent) -> Result<(), DispatchError> {
        self.sender
            .send(Envelope { event, reply: None })
            .await
            .map_err(|_| DispatchError::QueueClosed)
    }

    /// Queue an event from a context that must not wait.
    pub fn try_send(&self, event: HostEvent) -> Result<(), DispatchError> {
        self.sender
            .try_send(Envelope { event, reply: None })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(envelope) => {
                    DispatchError::QueueFull(format!("{:?}", envelope.event))
                }
                mpsc::error::TrySendError::Closed(_) => DispatchError::QueueClosed,
            })
    }

    /// Queue an event from a plain thread. Panics if called inside the runtime.
    pub fn blocking_send(&self, event: HostEvent) -> Result<(), DispatchError> {
        self.sender
            .blocking_send(Envelope { event, reply: None })
            .map_err(|_| DispatchError::QueueClosed)
    }

    /// Queue an event and wait for whether the dispatcher consumed it.
    pub async fn dispatch(&self, event: HostEvent) -> Result<bool, DispatchError> {
        let (reply, verdict) = oneshot::channel();
        self.sender
            .send(Envelope {
                event,
                reply: Some(reply),
            })
            .await
            .map_err(|_| DispatchError::QueueClosed)?;
        verdict.await.map_err(|_| DispatchError::ReplyDropped)
    }

    /// Stop the task. Events still queued are dropped.
    pub fn shutdown(&self) {
        info!("Dispatcher shutdown requested");
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Saturates instead of wrapping for intervals chrono cannot represent.
fn stats_interval(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}

async fn run_dispatch_loop<S: EngineSink>(
    mut dispatcher: InputDispatcher<S>,
    mut receiver: mpsc::Receiver<Envelope>,
    cancel: CancellationToken,
    stats_interval: chrono::Duration,
) -> InputDispatcher<S> {
    info!("Entering dispatch loop");

    let mut event_count: u64 = 0;
    let mut consumed_count: u64 = 0;
    let mut last_stats_time = Local::now();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Dispatch loop cancelled");
                break;
            }
            envelope = receiver.recv() => {
                let Some(Envelope { event, reply }) = envelope else {
                    info!("All dispatcher handles dropped, leaving dispatch loop");
                    break;
                };

                debug!("Dispatching {:?}", event);
                let consumed = dispatcher.handle(event);
                event_count += 1;
                if consumed {
                    consumed_count += 1;
                }

                if let Some(reply) = reply {
                    if reply.send(consumed).is_err() {
                        warn!("Caller stopped waiting for dispatch verdict");
                    }
                }
            }
        }

        let now = Local::now();
        if now - last_stats_time > stats_interval {
            info!(
                "Dispatcher stats: {} events ({} consumed) since {}",
                event_count,
                consumed_count,
                last_stats_time.format("%H:%M:%S")
            );
            event_count = 0;
            consumed_count = 0;
            last_stats_time = now;
        }
    }

    if !receiver.is_empty() {
        error!("Dispatcher stopped with {} events still queued", receiver.len());
    }
    dispatcher
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_interval_saturates() {
        assert_eq!(stats_interval(10), chrono::Duration::seconds(10));
        assert_eq!(stats_interval(u64::MAX), chrono::Duration::MAX);
        assert_eq!(stats_interval(i64::MAX as u64), chrono::Duration::MAX);
        assert!(stats_interval(u64::MAX) > chrono::Duration::zero());
    }
}
