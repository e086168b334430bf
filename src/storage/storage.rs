use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors a storage backend can report.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0} is not available")]
    Unavailable(StorageKind),

    #[error("{kind} rejected slot {name}: {reason}")]
    Rejected {
        kind: StorageKind,
        name: String,
        reason: String,
    },
}

/// Which key-value mapping a slot lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKind {
    /// Survives across sessions.
    #[serde(rename = "localStorage")]
    Local,
    /// Lives only as long as the current session.
    #[serde(rename = "sessionStorage")]
    Session,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Local => "localStorage",
            StorageKind::Session => "sessionStorage",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string-to-string mapping that slots are read from and written to.
pub trait Storage: Send + Sync {
    /// Read a slot. `Ok(None)` means the slot has never been written.
    fn get_item(&self, name: &str) -> Result<Option<String>, StorageError>;

    /// Replace a slot's contents.
    fn set_item(&self, name: &str, value: &str) -> Result<(), StorageError>;
}

/// In-process storage, used off the browser and in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-filled with records.
    pub fn with_items<I, K, V>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            items: RwLock::new(
                items
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, name: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.read().get(name).cloned())
    }

    fn set_item(&self, name: &str, value: &str) -> Result<(), StorageError> {
        self.items.write().insert(name.to_string(), value.to_string());
        Ok(())
    }
}

/// The storage environment pods run in.
///
/// A host without a mapping for a kind makes pods of that kind purely
/// in-memory.
#[derive(Clone, Default)]
pub struct Host {
    local: Option<Arc<dyn Storage>>,
    session: Option<Arc<dyn Storage>>,
}

impl Host {
    /// A host with no storage at all, e.g. server-side rendering.
    pub fn headless() -> Self {
        Self::default()
    }

    /// A host backed by two fresh [`MemoryStorage`] mappings.
    pub fn in_memory() -> Self {
        Self::headless()
            .with_storage(StorageKind::Local, Arc::new(MemoryStorage::new()))
            .with_storage(StorageKind::Session, Arc::new(MemoryStorage::new()))
    }

    /// A host backed by the browser window's `localStorage` and
    /// `sessionStorage`. Kinds the window does not expose are left empty.
    #[cfg(feature = "web")]
    pub fn browser() -> Self {
        use super::web::WebStorage;

        [StorageKind::Local, StorageKind::Session]
            .into_iter()
            .filter(|kind| WebStorage::available(*kind))
            .fold(Self::headless(), |host, kind| {
                host.with_storage(kind, Arc::new(WebStorage::new(kind)))
            })
    }

    pub fn with_storage(mut self, kind: StorageKind, storage: Arc<dyn Storage>) -> Self {
        match kind {
            StorageKind::Local => self.local = Some(storage),
            StorageKind::Session => self.session = Some(storage),
        }
        self
    }

    pub fn storage(&self, kind: StorageKind) -> Option<&Arc<dyn Storage>> {
        match kind {
            StorageKind::Local => self.local.as_ref(),
            StorageKind::Session => self.session.as_ref(),
        }
    }

    pub fn has_storage(&self, kind: StorageKind) -> bool {
        self.storage(kind).is_some()
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("local", &self.local.is_some())
            .field("session", &self.session.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_get_set() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("theme").unwrap(), None);

        storage.set_item("theme", "dark").unwrap();
        storage.set_item("theme", "light").unwrap();
        assert_eq!(storage.get_item("theme").unwrap().as_deref(), Some("light"));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn headless_host_has_no_storage() {
        let host = Host::headless();
        assert!(!host.has_storage(StorageKind::Local));
        assert!(!host.has_storage(StorageKind::Session));
    }

    #[test]
    fn in_memory_host_keeps_kinds_apart() {
        let host = Host::in_memory();
        let local = host.storage(StorageKind::Local).unwrap();
        let session = host.storage(StorageKind::Session).unwrap();

        local.set_item("k", "1").unwrap();
        assert_eq!(session.get_item("k").unwrap(), None);
    }

    #[test]
    fn kind_names() {
        assert_eq!(StorageKind::Local.to_string(), "localStorage");
        assert_eq!(
            serde_json::to_string(&StorageKind::Session).unwrap(),
            "\"sessionStorage\""
        );
    }
}
