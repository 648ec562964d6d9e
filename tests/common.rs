#![allow(dead_code)]

use std::{sync::Arc, time::Duration};
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use timer_panel::{
    clock::ManualClock,
    panel::{KindFilter, TimerPanel},
    state::TimerStore,
    storage::{KvStore, MemoryStore},
    StorageError,
};

/// Panel over an in-memory store driven by a manual clock
pub fn manual_panel(filter: KindFilter) -> (TimerPanel, ManualClock) {
    let clock = ManualClock::new(0);
    let store = TimerStore::new(Arc::new(clock.clone()));
    (TimerPanel::new(store, filter), clock)
}

/// Backend whose writes always fail
pub struct FailingStore;

impl KvStore for FailingStore {
    fn get<'a>(&'a self, _key: &'a str) -> BoxFuture<'a, Result<Option<Value>, StorageError>> {
        future::ready(Ok(None)).boxed()
    }

    fn set<'a>(&'a self, _key: &'a str, _value: Value) -> BoxFuture<'a, Result<(), StorageError>> {
        future::ready(Err(StorageError::Backend("quota exceeded".to_string()))).boxed()
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StorageError>> {
        future::ready(Ok(())).boxed()
    }
}

/// Memory backend whose writes finish sooner the more timers they carry
#[derive(Default)]
pub struct JitterStore {
    pub inner: MemoryStore,
}

impl KvStore for JitterStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>, StorageError>> {
        self.inner.get(key)
    }

    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let len = value.as_array().map_or(0, Vec::len) as u64;
            tokio::time::sleep(Duration::from_millis(60u64.saturating_sub(len * 20))).await;
            self.inner.set(key, value).await
        }
        .boxed()
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StorageError>> {
        self.inner.clear()
    }
}

/// Poll `check` until it holds or a second passes
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}
