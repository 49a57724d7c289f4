use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use podjob_model::LifecycleEvent;

use crate::cluster::ClusterError;

/// One item of an event stream: an event, or the cause the stream closed with.
pub type EventItem = Result<LifecycleEvent, ClusterError>;

/// Consumer side of a job's event stream.
///
/// The stream ends (`next` returns `None`) when the producer goes away. An `Err`
/// item means the producer closed the stream because of that error.
/// Dropping the subscription releases it: the producer observes
/// [`EventSink::released`] and stops watching.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<EventItem>,
    release: CancellationToken,
}

impl Subscription {
    /// Create a connected sink/subscription pair.
    pub fn channel(capacity: usize) -> (EventSink, Subscription) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let release = CancellationToken::new();
        (
            EventSink {
                tx,
                released: release.clone(),
            },
            Subscription { rx, release },
        )
    }

    /// Next item, or `None` once the stream is closed or released.
    pub async fn next(&mut self) -> Option<EventItem> {
        if self.release.is_cancelled() {
            return None;
        }
        self.rx.recv().await
    }

    /// Stop receiving and tell the producer to stop. Idempotent.
    pub fn release(&mut self) {
        self.release.cancel();
        self.rx.close();
    }

    pub fn is_released(&self) -> bool {
        self.release.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release.cancel();
    }
}

/// Producer side of a job's event stream, held by the backend's watch task.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<EventItem>,
    released: CancellationToken,
}

impl EventSink {
    /// Push one item. Returns `false` once the subscription is released or dropped.
    pub async fn send(&self, item: EventItem) -> bool {
        tokio::select! {
            biased;
            _ = self.released.cancelled() => false,
            sent = self.tx.send(item) => sent.is_ok(),
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.is_cancelled() || self.tx.is_closed()
    }

    /// Resolves once the consumer released the subscription.
    pub async fn released(&self) {
        tokio::select! {
            _ = self.released.cancelled() => {}
            _ = self.tx.closed() => {}
        }
    }
}
