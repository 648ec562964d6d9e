//! Persistence backends
//!
//! The engine treats persistence as an opaque async key-value store and
//! always writes whole values; no incremental diffing happens here.

pub mod file;
pub mod memory;
pub mod persister;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::StorageError;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use persister::{PersistFailure, Persister};

/// Key holding the entire timer collection
pub const TIMERS_KEY: &str = "timers";
/// Key holding the active kind filter
pub const FILTER_KEY: &str = "timer_filter";

/// Async key-value store consumed by the engine
pub trait KvStore: Send + Sync + 'static {
    /// Read a value, `None` when the key was never written
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>, StorageError>>;

    /// Replace the value stored under `key`
    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<(), StorageError>>;

    /// Drop every key
    fn clear(&self) -> BoxFuture<'_, Result<(), StorageError>>;
}
