//! Expiring key/value storage over browser localStorage.
//!
//! DESIGN
//! ======
//! Every entry is a JSON envelope `{data, expires}` under a namespaced key.
//! Expiry is enforced lazily on read and eagerly by [`ExpiringStore::sweep_expired`]
//! at widget construction, so stale entries cannot accumulate even if they
//! are never read again. The backend is a seam: the browser implementation
//! surfaces unavailability instead of failing silently, and a shared-map
//! implementation backs native builds and tests.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key the chat-assigned visitor account is persisted under.
pub const ACCOUNT_KEY: &str = "user_account";

/// How long a persisted account stays valid.
pub const ACCOUNT_TTL_SECS: i64 = 60 * 60 * 24 * 30;

const NAMESPACE: &str = "chat_widget:";

/// Error surfaced by storage writes.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The browser exposes no usable localStorage (disabled or sandboxed).
    #[error("browser localStorage is unavailable")]
    Unavailable,
    /// The value could not be serialized into the storage envelope.
    #[error("failed to serialize value for key {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// The backend rejected the write (quota, security error).
    #[error("failed to write storage key {key}")]
    Write { key: String },
}

/// Minimal key/value surface the expiring store runs over.
pub trait StorageBackend {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str);
    fn keys(&self) -> Vec<String>;
}

/// Shared-map backend for native builds and tests.
///
/// Clones share the same underlying map, so a test can hold a handle for
/// direct inspection while the store owns another.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }
}

/// Browser localStorage backend.
#[cfg(feature = "web")]
#[derive(Clone, Debug)]
pub struct LocalStorage {
    storage: Option<web_sys::Storage>,
}

#[cfg(feature = "web")]
impl LocalStorage {
    /// Probe the window for localStorage. A widget constructed without it
    /// still works; writes surface [`StorageError::Unavailable`].
    #[must_use]
    pub fn detect() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            log::warn!("localStorage unavailable; account persistence disabled");
        }
        Self { storage }
    }
}

#[cfg(feature = "web")]
impl StorageBackend for LocalStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let Some(storage) = &self.storage else {
            return Err(StorageError::Unavailable);
        };
        storage
            .set_item(key, value)
            .map_err(|_| StorageError::Write { key: key.to_owned() })
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = &self.storage {
            let _ = storage.remove_item(key);
        }
    }

    fn keys(&self) -> Vec<String> {
        let Some(storage) = &self.storage else {
            return Vec::new();
        };
        let len = storage.length().unwrap_or(0);
        (0..len)
            .filter_map(|i| storage.key(i).ok().flatten())
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    data: Value,
    expires: i64,
}

/// Key/value store with a per-entry absolute expiry timestamp.
pub struct ExpiringStore<B> {
    backend: B,
    clock: Box<dyn Fn() -> i64>,
}

impl<B: StorageBackend> ExpiringStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, clock: Box::new(now_secs) }
    }

    /// Store with an injected clock (seconds since epoch). Used by tests to
    /// step time deterministically.
    pub fn with_clock(backend: B, clock: Box<dyn Fn() -> i64>) -> Self {
        Self { backend, clock }
    }

    /// Serialize `value` with an absolute expiry of now + `ttl_secs`.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: i64) -> Result<(), StorageError> {
        let data = serde_json::to_value(value).map_err(|source| StorageError::Serialize {
            key: key.to_owned(),
            source,
        })?;
        let envelope = Envelope { data, expires: self.now() + ttl_secs };
        let raw = serde_json::to_string(&envelope).map_err(|source| StorageError::Serialize {
            key: key.to_owned(),
            source,
        })?;
        self.backend.write(&namespaced(key), &raw)
    }

    /// Read `key`, treating missing, expired, and corrupt entries as absent.
    /// Expired and corrupt entries are removed on the way out.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let storage_key = namespaced(key);
        let raw = self.backend.read(&storage_key)?;
        let Ok(envelope) = serde_json::from_str::<Envelope>(&raw) else {
            log::warn!("evicting corrupt storage entry {storage_key}");
            self.backend.remove(&storage_key);
            return None;
        };
        if envelope.expires <= self.now() {
            self.backend.remove(&storage_key);
            return None;
        }
        serde_json::from_value(envelope.data).ok()
    }

    /// Eagerly evict every expired or corrupt entry in this crate's
    /// namespace. Returns the number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.now();
        let mut evicted = 0;
        for storage_key in self.backend.keys() {
            if !storage_key.starts_with(NAMESPACE) {
                continue;
            }
            let Some(raw) = self.backend.read(&storage_key) else {
                continue;
            };
            let expired = serde_json::from_str::<Envelope>(&raw).map_or(true, |e| e.expires <= now);
            if expired {
                self.backend.remove(&storage_key);
                evicted += 1;
            }
        }
        if evicted > 0 {
            log::debug!("evicted {evicted} expired storage entries");
        }
        evicted
    }

    fn now(&self) -> i64 {
        (self.clock)()
    }
}

fn namespaced(key: &str) -> String {
    format!("{NAMESPACE}{key}")
}

#[cfg(feature = "web")]
fn now_secs() -> i64 {
    #[allow(clippy::cast_possible_truncation)]
    {
        (js_sys::Date::now() / 1000.0) as i64
    }
}

#[cfg(not(feature = "web"))]
fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}
