// ABOUTME: Transport channel owning one push-stream subscription per tracked resource.
// ABOUTME: Reconnects with exponential backoff and reports snapshots, errors, and connectivity.

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::error::TransportError;
use super::source::StatusSource;
use super::sse::StreamEvent;
use crate::config::StreamConfig;
use crate::snapshot::Snapshot;
use crate::types::Target;

/// Signals delivered to the channel's subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Snapshot(Snapshot),
    Error(TransportError),
    Connection(bool),
    /// The resource was deleted. The channel stops after sending this.
    Deleted,
}

/// Exponential reconnect delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Backoff {
    /// Delay before reconnect attempt number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.initial.saturating_mul(factor).min(self.max)
    }
}

impl From<&StreamConfig> for Backoff {
    fn from(config: &StreamConfig) -> Self {
        Self {
            initial: config.initial_backoff,
            max: config.max_backoff,
        }
    }
}

/// A live subscription to one resource's event stream.
///
/// The background task is aborted when the channel is closed or dropped, so
/// no events for the old target can be produced afterwards.
pub struct TransportChannel {
    target: Target,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for TransportChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportChannel")
            .field("target", &self.target)
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

impl TransportChannel {
    /// Open a channel for `target`. Must be called inside a tokio runtime.
    pub fn open(
        source: Arc<dyn StatusSource>,
        target: Target,
        backoff: Backoff,
    ) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_channel(source, target.clone(), backoff, tx));
        (Self { target, task }, rx)
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Whether the background task has stopped (deleted resource or closed).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Tear down the subscription.
    pub fn close(self) {
        tracing::debug!("Closing transport channel for {}", self.target);
        // Drop aborts the task.
    }
}

impl Drop for TransportChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_channel(
    source: Arc<dyn StatusSource>,
    target: Target,
    backoff: Backoff,
    tx: mpsc::UnboundedSender<ChannelEvent>,
) {
    let send = |event: ChannelEvent| tx.send(event).is_ok();
    let mut attempt: u32 = 0;

    loop {
        match source.stream(&target).await {
            Ok(mut events) => {
                tracing::debug!("Event stream connected for {}", target);
                if !send(ChannelEvent::Connection(true)) {
                    return;
                }

                while let Some(item) = events.next().await {
                    let delivered = match item {
                        Ok(StreamEvent::Snapshot(snapshot)) => {
                            attempt = 0;
                            send(ChannelEvent::Snapshot(snapshot))
                        }
                        Ok(StreamEvent::Heartbeat) => {
                            attempt = 0;
                            true
                        }
                        Ok(StreamEvent::Deleted) => {
                            tracing::debug!("Resource {} deleted, closing stream", target);
                            send(ChannelEvent::Deleted);
                            return;
                        }
                        Err(e) if !e.is_fatal() => {
                            tracing::warn!("Skipping bad stream event for {}: {}", target, e);
                            send(ChannelEvent::Error(e))
                        }
                        Err(e) => {
                            tracing::warn!("Event stream for {} dropped: {}", target, e);
                            if !send(ChannelEvent::Error(e)) {
                                return;
                            }
                            break;
                        }
                    };
                    if !delivered {
                        return;
                    }
                }

                if !send(ChannelEvent::Connection(false)) {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!("Event stream for {} unavailable: {}", target, e);
                if !send(ChannelEvent::Error(e)) {
                    return;
                }
            }
        }

        let delay = backoff.delay(attempt);
        attempt = attempt.saturating_add(1);
        tracing::debug!("Reconnecting stream for {} in {:?}", target, delay);
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_until_max() {
        let backoff = Backoff {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
        };
        assert_eq!(backoff.delay(0), Duration::from_secs(1));
        assert_eq!(backoff.delay(1), Duration::from_secs(2));
        assert_eq!(backoff.delay(4), Duration::from_secs(16));
        assert_eq!(backoff.delay(5), Duration::from_secs(30));
        assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(30));
    }
}
