/// In-memory snapshot logs with publish/subscribe delivery
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

/// Undelivered snapshots a subscriber may hold before it is dropped as stalled
pub const SUBSCRIBER_BUFFER: usize = 64;

/// Kind of data carried by a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Satellites,
    Metrics,
    Trend,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Satellites => "satellites",
            StreamKind::Metrics => "metrics",
            StreamKind::Trend => "trend",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable published value. Clones share the same data.
#[derive(Debug, Serialize)]
pub struct Snapshot<T> {
    pub seq: u64,
    pub published_at: DateTime<Utc>,
    pub data: Arc<T>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            seq: self.seq,
            published_at: self.published_at,
            data: Arc::clone(&self.data),
        }
    }
}

/// Receiving end of a stream subscription; dropping it unsubscribes
#[derive(Debug)]
pub struct Subscription<T> {
    id: u64,
    kind: StreamKind,
    rx: Receiver<Snapshot<T>>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Wait for the next snapshot; None once the feed is gone or dropped us
    #[cfg(test)]
    pub async fn recv(&mut self) -> Option<Snapshot<T>> {
        self.rx.recv().await
    }

    /// Next already-delivered snapshot, if any
    #[cfg(test)]
    pub fn try_recv(&mut self) -> Option<Snapshot<T>> {
        self.rx.try_recv().ok()
    }

    pub fn into_stream(self) -> ReceiverStream<Snapshot<T>> {
        ReceiverStream::new(self.rx)
    }
}

struct RepoInner<T> {
    latest: Snapshot<T>,
    history: VecDeque<Snapshot<T>>,
    history_limit: usize,
    next_subscriber: u64,
    subscribers: Vec<(u64, Sender<Snapshot<T>>)>,
}

/// Append-only snapshot log for one stream kind.
///
/// Publishing and subscribing share one lock, so a new subscriber observes
/// either a whole publish or none of it. Delivery follows subscription order.
/// A subscriber whose buffer is full when a snapshot is published is dropped.
pub struct SnapshotRepo<T> {
    kind: StreamKind,
    inner: Mutex<RepoInner<T>>,
}

impl<T> SnapshotRepo<T> {
    pub fn new(kind: StreamKind, initial: T, at: DateTime<Utc>, history_limit: usize) -> Self {
        let latest = Snapshot {
            seq: 0,
            published_at: at,
            data: Arc::new(initial),
        };
        let history_limit = history_limit.max(1);
        let mut history = VecDeque::with_capacity(history_limit);
        history.push_back(latest.clone());
        Self {
            kind,
            inner: Mutex::new(RepoInner {
                latest,
                history,
                history_limit,
                next_subscriber: 0,
                subscribers: Vec::new(),
            }),
        }
    }

    /// Most recently published snapshot
    pub fn latest(&self) -> Snapshot<T> {
        self.inner.lock().latest.clone()
    }

    /// Retained snapshots, oldest first
    pub fn history(&self) -> Vec<Snapshot<T>> {
        self.inner.lock().history.iter().cloned().collect()
    }

    /// Live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .subscribers
            .iter()
            .filter(|(_, tx)| !tx.is_closed())
            .count()
    }

    /// Publish a new value to every subscriber and return its sequence number
    pub fn publish(&self, data: T, at: DateTime<Utc>) -> u64 {
        let mut inner = self.inner.lock();
        let snapshot = Snapshot {
            seq: inner.latest.seq + 1,
            published_at: at,
            data: Arc::new(data),
        };

        if inner.history.len() == inner.history_limit {
            inner.history.pop_front();
        }
        inner.history.push_back(snapshot.clone());
        inner.latest = snapshot.clone();

        let kind = self.kind;
        inner
            .subscribers
            .retain(|(id, tx)| match tx.try_send(snapshot.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(stream = %kind, subscriber = id, "dropping stalled subscriber");
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(stream = %kind, subscriber = id, "subscriber gone");
                    false
                }
            });

        snapshot.seq
    }

    /// Register a subscriber; the latest snapshot is delivered immediately
    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let mut inner = self.inner.lock();
        let id = inner.next_subscriber;
        inner.next_subscriber += 1;
        tx.try_send(inner.latest.clone()).ok();
        inner.subscribers.push((id, tx));
        debug!(stream = %self.kind, subscriber = id, "subscribed");
        Subscription {
            id,
            kind: self.kind,
            rx,
        }
    }
}
