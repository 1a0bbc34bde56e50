//! Ordered presence writes.
//!
//! Each presence call is its own request, so two calls fired back to back
//! can land in either order. A slow `isSmoking: true` landing after the
//! `false` that followed it would leave the user burning until the node
//! expires. Every presence write from one client goes through a single
//! writer task that applies them one at a time, in the order they were
//! queued.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use super::{best_effort, BestEffort, CounterStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceUpdate {
    Register,
    Burning(bool),
    Heartbeat,
    Remove,
}

impl PresenceUpdate {
    fn operation(self) -> &'static str {
        match self {
            PresenceUpdate::Register => "register_presence",
            PresenceUpdate::Burning(_) => "set_presence",
            PresenceUpdate::Heartbeat => "heartbeat",
            PresenceUpdate::Remove => "remove_presence",
        }
    }
}

type Queued = (PresenceUpdate, oneshot::Sender<BestEffort>);

/// Sending side of the writer. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PresenceQueue {
    tx: mpsc::UnboundedSender<Queued>,
}

impl PresenceQueue {
    /// Queue an update behind every update queued before it.
    ///
    /// The returned ack resolves once the update has been applied. It can be
    /// dropped when the caller does not care.
    pub fn send(&self, update: PresenceUpdate) -> PresenceAck {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send((update, ack_tx)).is_err() {
            debug!(?update, "presence writer stopped, update dropped");
        }
        PresenceAck { rx: ack_rx }
    }
}

/// Result of one queued presence update.
#[derive(Debug)]
pub struct PresenceAck {
    rx: oneshot::Receiver<BestEffort>,
}

impl PresenceAck {
    pub async fn outcome(self) -> BestEffort {
        self.rx
            .await
            .unwrap_or_else(|_| BestEffort::Ignored("presence writer stopped".into()))
    }
}

/// Owns the writer task. Dropping it stops the writer.
#[derive(Debug)]
pub struct PresenceWriter {
    queue: PresenceQueue,
    task: JoinHandle<()>,
}

impl PresenceWriter {
    pub fn spawn<S: CounterStore>(store: Arc<S>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Queued>();
        let task = tokio::spawn(async move {
            while let Some((update, ack)) = rx.recv().await {
                let outcome = best_effort(update.operation(), async {
                    match update {
                        PresenceUpdate::Register => store.register_presence().await,
                        PresenceUpdate::Burning(is_burning) => {
                            store.set_presence(is_burning).await
                        }
                        PresenceUpdate::Heartbeat => store.heartbeat().await,
                        PresenceUpdate::Remove => store.remove_presence().await,
                    }
                })
                .await;
                let _ = ack.send(outcome);
            }
        });
        Self {
            queue: PresenceQueue { tx },
            task,
        }
    }

    pub fn queue(&self) -> PresenceQueue {
        self.queue.clone()
    }

    pub fn send(&self, update: PresenceUpdate) -> PresenceAck {
        self.queue.send(update)
    }
}

impl Drop for PresenceWriter {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::slow_store;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn later_update_never_overtakes_a_slow_one() {
        let store = slow_store();
        let writer = PresenceWriter::spawn(Arc::clone(&store));

        writer.send(PresenceUpdate::Burning(true));
        let last = writer.send(PresenceUpdate::Burning(false));

        assert!(last.outcome().await.is_ok());
        assert_eq!(store.inner.presence().map(|p| p.is_smoking), Some(false));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.inner.presence().map(|p| p.is_smoking), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn remove_lands_after_queued_writes() {
        let store = slow_store();
        let writer = PresenceWriter::spawn(Arc::clone(&store));
        let queue = writer.queue();

        queue.send(PresenceUpdate::Register);
        queue.send(PresenceUpdate::Burning(true));
        queue.send(PresenceUpdate::Heartbeat);
        assert!(queue.send(PresenceUpdate::Remove).outcome().await.is_ok());
        assert!(store.inner.presence().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn ack_reports_stopped_writer() {
        let writer = PresenceWriter::spawn(slow_store());
        let queue = writer.queue();
        drop(writer);
        tokio::task::yield_now().await;

        let outcome = queue.send(PresenceUpdate::Heartbeat).outcome().await;
        assert!(matches!(outcome, BestEffort::Ignored(_)));
    }
}
