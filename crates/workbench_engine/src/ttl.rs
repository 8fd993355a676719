use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use workbench_logging::workbench_debug;

use crate::store::LocalCacheStore;

/// Milliseconds since the Unix epoch. Injected so expiry is testable.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Clock that only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn at(millis: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(millis)),
        }
    }

    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(duration_millis(by), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub saved_at: u64,
    pub value: T,
}

impl<T> CacheEntry<T> {
    /// An entry exactly `max_age` old still counts as fresh.
    pub fn is_fresh(&self, now: u64, max_age: Duration) -> bool {
        now.saturating_sub(self.saved_at) <= duration_millis(max_age)
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// TTL cache stored under one store key.
///
/// Entries are addressed by a path of map keys below the store key: the
/// problem list lives at the root (`&[]`), statements at `&[problem_id]`,
/// translations at `&[problem_id, lang]`. Each entry carries its own
/// `savedAt`, so one stale translation never evicts its siblings.
pub struct TtlCache<T> {
    store: LocalCacheStore,
    clock: Arc<dyn Clock>,
    key: &'static str,
    max_age: Duration,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for TtlCache<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: Arc::clone(&self.clock),
            key: self.key,
            max_age: self.max_age,
            _value: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> TtlCache<T> {
    pub fn new(
        store: LocalCacheStore,
        clock: Arc<dyn Clock>,
        key: &'static str,
        max_age: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            key,
            max_age,
            _value: PhantomData,
        }
    }

    /// Fresh value at `path`, or `None` when absent, expired or malformed.
    pub fn read_fresh(&self, path: &[&str]) -> Option<T> {
        let root: Value = self.store.read(self.key)?;
        let node = path.iter().try_fold(&root, |node, segment| node.get(*segment))?;
        let entry: CacheEntry<T> = match serde_json::from_value(node.clone()) {
            Ok(entry) => entry,
            Err(err) => {
                workbench_debug!("Unreadable entry {}{:?}: {}", self.key, path, err);
                return None;
            }
        };
        if entry.is_fresh(self.clock.now_millis(), self.max_age) {
            Some(entry.value)
        } else {
            workbench_debug!("Expired entry {}{:?}", self.key, path);
            None
        }
    }

    /// Stamp `value` with the current time and store it at `path`, keeping
    /// every other entry under the same key.
    pub fn write(&self, path: &[&str], value: &T) {
        let entry = CacheEntry {
            saved_at: self.clock.now_millis(),
            value,
        };
        let entry = match serde_json::to_value(&entry) {
            Ok(entry) => entry,
            Err(err) => {
                workbench_debug!("Skipping unserializable entry {}: {}", self.key, err);
                return;
            }
        };
        let mut root = if path.is_empty() {
            Value::Null
        } else {
            self.store.read(self.key).unwrap_or(Value::Null)
        };
        insert_at(&mut root, path, entry);
        self.store.write(self.key, &root);
    }
}

fn insert_at(node: &mut Value, path: &[&str], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(head.to_string()).or_insert(Value::Null);
        insert_at(child, rest, value);
    }
}
