//! In-memory store, used with `--in-memory` and in tests

use std::{
    collections::HashMap,
    sync::Mutex,
};
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;

use super::KvStore;
use crate::error::StorageError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, Value>) -> T,
    ) -> Result<T, StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Backend(format!("Failed to lock memory store: {}", e)))?;
        Ok(f(&mut entries))
    }
}

impl KvStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>, StorageError>> {
        future::ready(self.with_entries(|entries| entries.get(key).cloned())).boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<(), StorageError>> {
        future::ready(self.with_entries(|entries| {
            entries.insert(key.to_string(), value);
        }))
        .boxed()
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StorageError>> {
        future::ready(self.with_entries(|entries| entries.clear())).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_get_and_clear() {
        let store = MemoryStore::new();
        assert_eq!(store.get("timers").await.unwrap(), None);

        store.set("timers", json!([1, 2])).await.unwrap();
        store.set("timers", json!([3])).await.unwrap();
        assert_eq!(store.get("timers").await.unwrap(), Some(json!([3])));

        store.clear().await.unwrap();
        assert_eq!(store.get("timers").await.unwrap(), None);
    }
}
