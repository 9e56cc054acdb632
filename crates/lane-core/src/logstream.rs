//! Per-entity log broadcast with bounded replay.
//!
//! [`LogStreamManager`] is a fan-out hub keyed by entity id. Each id owns a
//! bounded buffer of recent lines; a subscriber first receives the buffered
//! history (oldest to newest) and then live emissions, with no gap and no
//! duplicate in between. Delivery uses one unbounded channel per subscriber,
//! so a slow consumer backs up its own channel without ever stalling the
//! emitter or its peers.
//!
//! The internal map is mutated under a single short-held mutex per operation;
//! no lock is held across an await or during delivery.

use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

struct Subscriber {
    id: u64,
    tx: mpsc::UnboundedSender<String>,
}

#[derive(Default)]
struct Channel {
    buffer: VecDeque<String>,
    subscribers: Vec<Subscriber>,
}

#[derive(Default)]
struct Inner {
    next_subscriber_id: u64,
    channels: HashMap<String, Channel>,
}

struct Shared {
    retention: usize,
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a panic elsewhere; the map itself is
        // still structurally sound.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Broadcast hub for per-entity progress lines.
#[derive(Clone)]
pub struct LogStreamManager {
    shared: Arc<Shared>,
}

impl LogStreamManager {
    /// Create a manager retaining at most `retention` lines per entity id.
    pub fn new(retention: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                retention,
                inner: Mutex::new(Inner::default()),
            }),
        }
    }

    /// Append `message` to the entity's buffer and forward it to every
    /// current subscriber.
    ///
    /// Never blocks on a subscriber: each send goes into that subscriber's
    /// own unbounded channel, and closed channels are pruned.
    pub fn emit(&self, entity_id: &str, message: impl Into<String>) {
        let message = message.into();
        let targets: Vec<mpsc::UnboundedSender<String>> = {
            let mut inner = self.shared.lock();
            let channel = inner.channels.entry(entity_id.to_string()).or_default();
            channel.buffer.push_back(message.clone());
            while channel.buffer.len() > self.shared.retention {
                channel.buffer.pop_front();
            }
            channel.subscribers.retain(|s| !s.tx.is_closed());
            channel.subscribers.iter().map(|s| s.tx.clone()).collect()
        };
        // Delivery happens outside the critical section.
        for tx in targets {
            let _ = tx.send(message.clone());
        }
    }

    /// Attach a subscriber to an entity's stream.
    ///
    /// The returned subscription yields the buffered history first, then live
    /// messages. The buffer snapshot and subscriber registration happen under
    /// one lock acquisition, so no message emitted after this call is skipped
    /// and nothing already buffered is delivered twice.
    pub fn subscribe(&self, entity_id: &str) -> LogSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let (id, replay) = {
            let mut inner = self.shared.lock();
            let id = inner.next_subscriber_id;
            inner.next_subscriber_id += 1;
            let channel = inner.channels.entry(entity_id.to_string()).or_default();
            let replay: VecDeque<String> = channel.buffer.iter().cloned().collect();
            channel.subscribers.push(Subscriber { id, tx });
            (id, replay)
        };
        LogSubscription {
            entity_id: entity_id.to_string(),
            subscriber_id: id,
            replay,
            rx,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Number of currently attached subscribers for an entity id.
    pub fn subscriber_count(&self, entity_id: &str) -> usize {
        self.shared
            .lock()
            .channels
            .get(entity_id)
            .map(|c| c.subscribers.len())
            .unwrap_or(0)
    }

    /// Whether any state (buffer or subscribers) exists for an entity id.
    pub fn has_entity(&self, entity_id: &str) -> bool {
        self.shared.lock().channels.contains_key(entity_id)
    }
}

/// Handle for one subscriber: replay, then live messages.
///
/// Dropping the subscription detaches it promptly; when an entity id has no
/// subscribers left and an empty buffer, its state is released.
pub struct LogSubscription {
    entity_id: String,
    subscriber_id: u64,
    replay: VecDeque<String>,
    rx: mpsc::UnboundedReceiver<String>,
    shared: Arc<Shared>,
}

impl LogSubscription {
    /// Receive the next message, replay first. Returns `None` once the
    /// manager is gone and the channel is drained.
    pub async fn recv(&mut self) -> Option<String> {
        if let Some(message) = self.replay.pop_front() {
            return Some(message);
        }
        self.rx.recv().await
    }

    /// Messages still pending from the replay phase.
    pub fn replay_len(&self) -> usize {
        self.replay.len()
    }
}

impl Stream for LogSubscription {
    type Item = String;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(message) = this.replay.pop_front() {
            return Poll::Ready(Some(message));
        }
        this.rx.poll_recv(cx)
    }
}

impl Drop for LogSubscription {
    fn drop(&mut self) {
        let mut inner = self.shared.lock();
        if let Some(channel) = inner.channels.get_mut(&self.entity_id) {
            channel.subscribers.retain(|s| s.id != self.subscriber_id);
            if channel.subscribers.is_empty() && channel.buffer.is_empty() {
                inner.channels.remove(&self.entity_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replay_then_live_without_gap_or_duplicate() {
        let logs = LogStreamManager::new(100);
        logs.emit("run-1", "one");
        logs.emit("run-1", "two");

        let mut sub = logs.subscribe("run-1");
        logs.emit("run-1", "three");

        assert_eq!(sub.recv().await.as_deref(), Some("one"));
        assert_eq!(sub.recv().await.as_deref(), Some("two"));
        assert_eq!(sub.recv().await.as_deref(), Some("three"));
    }

    #[tokio::test]
    async fn test_retention_bound_keeps_most_recent() {
        let logs = LogStreamManager::new(3);
        for i in 0..10 {
            logs.emit("run-1", format!("line {i}"));
        }

        let mut sub = logs.subscribe("run-1");
        assert_eq!(sub.replay_len(), 3);
        assert_eq!(sub.recv().await.as_deref(), Some("line 7"));
        assert_eq!(sub.recv().await.as_deref(), Some("line 8"));
        assert_eq!(sub.recv().await.as_deref(), Some("line 9"));
    }

    #[tokio::test]
    async fn test_fanout_identical_sequences() {
        let logs = LogStreamManager::new(100);
        let mut a = logs.subscribe("run-1");
        let mut b = logs.subscribe("run-1");

        logs.emit("run-1", "alpha");
        logs.emit("run-1", "beta");

        for sub in [&mut a, &mut b] {
            assert_eq!(sub.recv().await.as_deref(), Some("alpha"));
            assert_eq!(sub.recv().await.as_deref(), Some("beta"));
        }
    }

    #[tokio::test]
    async fn test_detach_does_not_affect_other_subscribers() {
        let logs = LogStreamManager::new(100);
        let a = logs.subscribe("run-1");
        let mut b = logs.subscribe("run-1");
        assert_eq!(logs.subscriber_count("run-1"), 2);

        drop(a);
        assert_eq!(logs.subscriber_count("run-1"), 1);

        logs.emit("run-1", "still here");
        assert_eq!(b.recv().await.as_deref(), Some("still here"));
    }

    #[tokio::test]
    async fn test_state_released_when_idle_and_empty() {
        let logs = LogStreamManager::new(100);
        let sub = logs.subscribe("run-1");
        assert!(logs.has_entity("run-1"));

        // Buffer is empty and the only subscriber detaches: state is dropped.
        drop(sub);
        assert!(!logs.has_entity("run-1"));

        // A non-empty buffer keeps the entity alive for late joiners.
        logs.emit("run-2", "kept");
        let sub2 = logs.subscribe("run-2");
        drop(sub2);
        assert!(logs.has_entity("run-2"));
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_buffers_only() {
        let logs = LogStreamManager::new(100);
        logs.emit("run-1", "buffered");
        assert_eq!(logs.subscriber_count("run-1"), 0);

        let mut sub = logs.subscribe("run-1");
        assert_eq!(sub.recv().await.as_deref(), Some("buffered"));
    }

    #[tokio::test]
    async fn test_entities_are_independent() {
        let logs = LogStreamManager::new(100);
        let mut a = logs.subscribe("run-a");
        logs.emit("run-b", "for b");
        logs.emit("run-a", "for a");
        assert_eq!(a.recv().await.as_deref(), Some("for a"));
    }

    #[tokio::test]
    async fn test_stream_interface_replays_then_follows() {
        use futures::StreamExt;

        let logs = LogStreamManager::new(100);
        logs.emit("run-1", "history");
        let mut sub = logs.subscribe("run-1");
        logs.emit("run-1", "live");

        assert_eq!(sub.next().await.as_deref(), Some("history"));
        assert_eq!(sub.next().await.as_deref(), Some("live"));
    }

    #[tokio::test]
    async fn test_slow_subscriber_does_not_block_emitter() {
        let logs = LogStreamManager::new(10);
        let _slow = logs.subscribe("run-1");
        // The slow subscriber never reads; emits must still complete.
        for i in 0..1000 {
            logs.emit("run-1", format!("line {i}"));
        }
        let mut fresh = logs.subscribe("run-1");
        assert_eq!(fresh.recv().await.as_deref(), Some("line 990"));
    }
}
