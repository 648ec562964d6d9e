//! Fire-and-forget write-through to a [`KvStore`]
//!
//! Callers never wait on the backend. Each key has a single pending slot
//! holding its latest value; a lone writer task drains the slots in the
//! order the values were handed in. A newer value overwrites an unwritten
//! older one instead of queueing behind it, so the last write started is the
//! one that ends up stored.

use std::{collections::HashMap, sync::Arc};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use super::KvStore;
use crate::error::StorageError;

/// A write that did not reach the backend
#[derive(Debug, Clone, Serialize)]
pub struct PersistFailure {
    pub key: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Latest value per key, stamped with the order it was handed in
#[derive(Debug, Default)]
struct Pending {
    seq: u64,
    cleared_at: u64,
    values: HashMap<&'static str, (u64, Value)>,
}

enum Op {
    Clear,
    Set(&'static str, Value),
}

impl Pending {
    /// Everything handed in after `applied`, oldest first
    fn ops_after(&self, applied: u64) -> Vec<Op> {
        let mut ops = Vec::new();
        if self.cleared_at > applied {
            ops.push(Op::Clear);
        }
        let mut writes: Vec<_> = self
            .values
            .iter()
            .filter(|(_, (seq, _))| *seq > applied)
            .collect();
        writes.sort_by_key(|(_, (seq, _))| *seq);
        ops.extend(
            writes
                .into_iter()
                .map(|(key, (_, value))| Op::Set(*key, value.clone())),
        );
        ops
    }
}

/// Best-effort persistence handle shared by the store and the panel
///
/// There is no retry and no rollback. Failures are logged and published to
/// subscribers; the caller's in-memory state stays as is.
#[derive(Clone)]
pub struct Persister {
    store: Arc<dyn KvStore>,
    failures: broadcast::Sender<PersistFailure>,
    pending: Arc<watch::Sender<Pending>>,
}

impl Persister {
    /// Create a persister and spawn its writer task
    ///
    /// Must be called from within a Tokio runtime. The writer stops once
    /// every clone of the persister is dropped and the last values are out.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        let (failures, _) = broadcast::channel(64);
        let (pending, slots) = watch::channel(Pending::default());
        tokio::spawn(drain(Arc::clone(&store), slots, failures.clone()));
        Self {
            store,
            failures,
            pending: Arc::new(pending),
        }
    }

    /// Receive failures of writes initiated after this call
    pub fn subscribe(&self) -> broadcast::Receiver<PersistFailure> {
        self.failures.subscribe()
    }

    /// Serialize `value` now and write it in the background
    pub fn write<T: Serialize>(&self, key: &'static str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                publish(&self.failures, key, &StorageError::from(e));
                return;
            }
        };
        self.pending.send_modify(|p| {
            p.seq += 1;
            p.values.insert(key, (p.seq, value));
        });
    }

    /// Clear the backend in the background, dropping unwritten values
    pub fn clear(&self) {
        self.pending.send_modify(|p| {
            p.seq += 1;
            p.cleared_at = p.seq;
            p.values.clear();
        });
    }

    /// Read and decode a value, awaiting the backend
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.store.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for Persister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persister")
            .field("pending_seq", &self.pending.borrow().seq)
            .field("subscribers", &self.failures.receiver_count())
            .finish()
    }
}

/// Writer task: apply whatever was handed in since the last pass
async fn drain(
    store: Arc<dyn KvStore>,
    mut slots: watch::Receiver<Pending>,
    failures: broadcast::Sender<PersistFailure>,
) {
    let mut applied = 0;
    while slots.changed().await.is_ok() {
        let (seq, ops) = {
            let pending = slots.borrow_and_update();
            (pending.seq, pending.ops_after(applied))
        };
        for op in ops {
            match op {
                Op::Clear => match store.clear().await {
                    Ok(()) => debug!("Cleared storage"),
                    Err(e) => publish(&failures, "*", &e),
                },
                Op::Set(key, value) => match store.set(key, value).await {
                    Ok(()) => debug!("Persisted {}", key),
                    Err(e) => publish(&failures, key, &e),
                },
            }
        }
        applied = seq;
    }
    debug!("Persister dropped, writer stopped");
}

fn publish(failures: &broadcast::Sender<PersistFailure>, key: &str, error: &StorageError) {
    warn!("Failed to persist {}: {}", key, error);
    // No subscribers is fine; the warning above is the record.
    let _ = failures.send(PersistFailure {
        key: key.to_string(),
        message: error.to_string(),
        at: Utc::now(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use futures::future::{self, BoxFuture, FutureExt};
    use serde_json::{json, Value};
    use std::time::Duration;

    struct BrokenStore;

    impl KvStore for BrokenStore {
        fn get<'a>(&'a self, _key: &'a str) -> BoxFuture<'a, Result<Option<Value>, StorageError>> {
            future::ready(Ok(None)).boxed()
        }

        fn set<'a>(&'a self, _key: &'a str, _value: Value) -> BoxFuture<'a, Result<(), StorageError>> {
            future::ready(Err(StorageError::Backend("disk full".to_string()))).boxed()
        }

        fn clear(&self) -> BoxFuture<'_, Result<(), StorageError>> {
            future::ready(Err(StorageError::Backend("disk full".to_string()))).boxed()
        }
    }

    #[tokio::test]
    async fn write_reaches_the_store() {
        let store = Arc::new(MemoryStore::new());
        let persister = Persister::new(store.clone());
        persister.write("timer_filter", &"countdown");

        for _ in 0..100 {
            if store.get("timer_filter").await.unwrap().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        let read: Option<String> = persister.read("timer_filter").await.unwrap();
        assert_eq!(read.as_deref(), Some("countdown"));
    }

    #[tokio::test]
    async fn failures_are_published() {
        let persister = Persister::new(Arc::new(BrokenStore));
        let mut rx = persister.subscribe();
        persister.write("timers", &json!([]));

        let failure = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("failure not published")
            .unwrap();
        assert_eq!(failure.key, "timers");
        assert!(failure.message.contains("disk full"));
    }

    /// Delays each write; smaller collections take longer
    struct SlowSmallWrites {
        inner: MemoryStore,
    }

    impl KvStore for SlowSmallWrites {
        fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>, StorageError>> {
            self.inner.get(key)
        }

        fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<(), StorageError>> {
            async move {
                let len = value.as_array().map_or(0, Vec::len) as u64;
                tokio::time::sleep(Duration::from_millis(40u64.saturating_sub(len * 15))).await;
                self.inner.set(key, value).await
            }
            .boxed()
        }

        fn clear(&self) -> BoxFuture<'_, Result<(), StorageError>> {
            self.inner.clear()
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    #[tokio::test]
    async fn newest_snapshot_wins_over_slow_older_one() {
        let store = Arc::new(SlowSmallWrites {
            inner: MemoryStore::new(),
        });
        let persister = Persister::new(store.clone());
        persister.write("timers", &json!(["a"]));
        persister.write("timers", &json!(["b", "a"]));
        settle().await;

        assert_eq!(store.get("timers").await.unwrap(), Some(json!(["b", "a"])));
    }

    #[tokio::test]
    async fn clear_is_not_undone_by_earlier_writes() {
        let store = Arc::new(SlowSmallWrites {
            inner: MemoryStore::new(),
        });
        let persister = Persister::new(store.clone());
        persister.write("timers", &json!([]));
        persister.write("timer_filter", &"countdown");
        persister.clear();
        settle().await;

        assert_eq!(store.get("timers").await.unwrap(), None);
        assert_eq!(store.get("timer_filter").await.unwrap(), None);

        persister.write("timer_filter", &"stopwatch");
        settle().await;
        assert_eq!(store.get("timer_filter").await.unwrap(), Some(json!("stopwatch")));
    }

    #[test]
    fn pending_orders_by_hand_in() {
        let mut pending = Pending::default();
        for (key, value) in [("timers", json!(1)), ("timer_filter", json!("x")), ("timers", json!(2))] {
            pending.seq += 1;
            pending.values.insert(key, (pending.seq, value));
        }
        let keys: Vec<_> = pending
            .ops_after(0)
            .into_iter()
            .map(|op| match op {
                Op::Set(key, value) => format!("{}={}", key, value),
                Op::Clear => "clear".to_string(),
            })
            .collect();
        assert_eq!(keys, ["timer_filter=\"x\"", "timers=2"]);
        assert!(pending.ops_after(3).is_empty());
    }
}
