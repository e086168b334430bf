use super::key::{slot_name, PodKey};
use crate::config::PodConfig;
use crate::error::PodError;
use crate::runtime::ReactiveRuntime;
use crate::signal::{Effect, Signal, WatchGuard};
use crate::storage::{Host, Storage, StorageError, StorageKind};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Where a pod's first value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum Seed<V> {
    /// Restore the stored record, or start from an empty object.
    Stored,
    /// Restore the stored record, or start from this value.
    Initial(V),
    /// Ignore any stored record and start from this value.
    Override(V),
}

impl<V> Seed<V> {
    fn into_parts(self) -> (Option<V>, bool) {
        match self {
            Seed::Stored => (None, false),
            Seed::Initial(value) => (Some(value), false),
            Seed::Override(value) => (Some(value), true),
        }
    }
}

/// The storage slot a pod is bound to.
struct Slot {
    storage: Arc<dyn Storage>,
    kind: StorageKind,
    name: String,
    skip_unchanged: bool,
    // Text most recently read from or written to the slot
    last: Mutex<Option<String>>,
}

impl Slot {
    /// Read the slot; an empty string counts as no record.
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.storage.get_item(&self.name)?.filter(|raw| !raw.is_empty()))
    }

    fn remember(&self, raw: String) {
        *self.last.lock() = Some(raw);
    }

    fn write(&self, json: String, force: bool) -> Result<(), StorageError> {
        let mut last = self.last.lock();
        // Another writer may have replaced the record since we last saw it
        if !force
            && self.skip_unchanged
            && last.as_deref() == Some(json.as_str())
            && self.storage.get_item(&self.name).ok().flatten().as_deref() == Some(json.as_str())
        {
            return Ok(());
        }
        self.storage.set_item(&self.name, &json)?;
        debug!(slot = %self.name, kind = %self.kind, bytes = json.len(), "wrote record");
        *last = Some(json);
        Ok(())
    }

    fn persist<V: Serialize>(&self, value: &V, force: bool) -> Result<(), PodError> {
        let json = serde_json::to_string(value)?;
        self.write(json, force)?;
        Ok(())
    }
}

/// A reactive value kept in sync with a storage slot.
///
/// Cloning a pod is cheap and yields another handle to the same value.
/// The slot stops being updated once every handle has been dropped.
///
/// ```
/// use podstate::{Host, Pod, PodConfig, Storage, StorageKind};
/// use serde_json::json;
///
/// let host = Host::in_memory();
/// let theme = Pod::acquire(
///     &host,
///     &PodConfig::default(),
///     "theme",
///     StorageKind::Local,
///     Some(json!({ "theme": "light" })),
///     false,
/// );
///
/// theme.set(json!({ "theme": "dark" }));
///
/// let stored = host.storage(StorageKind::Local).unwrap().get_item("theme").unwrap();
/// assert_eq!(stored.as_deref(), Some(r#"{"theme":"dark"}"#));
/// ```
pub struct Pod<V> {
    signal: Signal<V>,
    kind: StorageKind,
    slot: Option<Arc<Slot>>,
    _persistence: Option<Arc<Effect>>,
}

impl<V> Clone for Pod<V> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
            kind: self.kind,
            slot: self.slot.clone(),
            _persistence: self._persistence.clone(),
        }
    }
}

impl<V> Pod<V>
where
    V: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static,
{
    /// Bind `key` in `kind` storage to a new reactive value.
    ///
    /// The value is the stored record if one exists and `override_stored`
    /// is false. Otherwise it is `initial` (or an empty object), which is
    /// written to the slot right away. Every later change is written back.
    /// Malformed records and storage failures are logged, never returned.
    /// If the slot cannot be read, the pod is not persisted at all.
    pub fn acquire(
        host: &Host,
        config: &PodConfig,
        key: &str,
        kind: StorageKind,
        initial: Option<V>,
        override_stored: bool,
    ) -> Self {
        if key.is_empty() {
            warn!(%kind, "acquiring a pod with an empty key");
        }

        let Some(storage) = host.storage(kind) else {
            debug!(key, %kind, "no storage in this environment, pod is in-memory only");
            return Self {
                signal: Signal::new(initial.unwrap_or_else(empty_value)),
                kind,
                slot: None,
                _persistence: None,
            };
        };

        let slot = Arc::new(Slot {
            storage: Arc::clone(storage),
            kind,
            name: slot_name(key, kind, config.slot_naming),
            skip_unchanged: config.skip_unchanged_writes,
            last: Mutex::new(None),
        });

        let stored = if override_stored {
            None
        } else {
            match ReactiveRuntime::untrack(|| slot.read()) {
                Ok(stored) => stored,
                Err(err) => {
                    // Seeding now could overwrite a record we failed to see
                    warn!(slot = %slot.name, %kind, error = %err, "failed to read slot, pod is in-memory only");
                    return Self {
                        signal: Signal::new(initial.unwrap_or_else(empty_value)),
                        kind,
                        slot: None,
                        _persistence: None,
                    };
                }
            }
        };

        let value = match stored {
            Some(raw) => match serde_json::from_str::<V>(&raw) {
                Ok(value) => {
                    debug!(slot = %slot.name, %kind, "restored record");
                    slot.remember(raw);
                    value
                }
                Err(err) => {
                    warn!(slot = %slot.name, %kind, error = %err, "discarding malformed record");
                    empty_value()
                }
            },
            None => {
                let value = initial.unwrap_or_else(empty_value);
                if let Err(err) = slot.persist(&value, false) {
                    warn!(slot = %slot.name, %kind, error = %err, "failed to seed slot");
                }
                value
            }
        };

        let signal = Signal::new(value);
        let persistence = Effect::new({
            let signal = signal.clone();
            let slot = Arc::clone(&slot);
            move || {
                let json = signal.with(|value| serde_json::to_string(value));
                let result = json
                    .map_err(PodError::from)
                    .and_then(|json| slot.write(json, false).map_err(PodError::from));
                if let Err(err) = result {
                    warn!(slot = %slot.name, kind = %slot.kind, error = %err, "failed to persist change");
                }
            }
        });

        Self {
            signal,
            kind,
            slot: Some(slot),
            _persistence: Some(Arc::new(persistence)),
        }
    }

    /// [`Pod::acquire`] for a key with a registered value type.
    pub fn acquire_typed<K>(
        host: &Host,
        config: &PodConfig,
        kind: StorageKind,
        initial: Option<V>,
        override_stored: bool,
    ) -> Self
    where
        K: PodKey<Value = V>,
    {
        Self::acquire(host, config, K::NAME, kind, initial, override_stored)
    }

    /// [`Pod::acquire`] driven by a [`Seed`].
    pub fn from_seed(host: &Host, config: &PodConfig, key: &str, kind: StorageKind, seed: Seed<V>) -> Self {
        let (initial, override_stored) = seed.into_parts();
        Self::acquire(host, config, key, kind, initial, override_stored)
    }

    pub fn get(&self) -> V {
        self.signal.get()
    }

    pub fn get_untracked(&self) -> V {
        self.signal.get_untracked()
    }

    pub fn set(&self, value: V) {
        self.signal.set(value);
    }

    pub fn update(&self, f: impl FnOnce(&mut V)) {
        self.signal.update(f);
    }

    pub fn with<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        self.signal.with(f)
    }

    /// Watch the value; see [`Signal::watch`].
    pub fn subscribe<F>(&self, callback: F) -> WatchGuard
    where
        F: Fn(V) + Send + Sync + 'static,
    {
        self.signal.watch(callback)
    }

    /// Write the current value to the slot now, reporting any failure.
    ///
    /// A no-op for pods without storage.
    pub fn flush(&self) -> Result<(), PodError> {
        let Some(slot) = &self.slot else {
            return Ok(());
        };
        ReactiveRuntime::untrack(|| self.signal.with(|value| slot.persist(value, true)))
    }
}

impl<V> Pod<V> {
    /// The underlying signal, for composing with effects and watchers.
    pub fn signal(&self) -> &Signal<V> {
        &self.signal
    }

    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    /// Slot name, or `None` when the pod is not persisted.
    pub fn slot_name(&self) -> Option<&str> {
        self.slot.as_deref().map(|slot| slot.name.as_str())
    }

    pub fn is_persistent(&self) -> bool {
        self.slot.is_some()
    }
}

impl<V: fmt::Debug> fmt::Debug for Pod<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pod")
            .field("kind", &self.kind)
            .field("slot", &self.slot_name())
            .field("value", &self.signal.get_untracked())
            .finish()
    }
}

/// The value a pod falls back to: `{}` read as `V`, or `V::default()` when
/// `V` cannot be built from an empty object.
fn empty_value<V: DeserializeOwned + Default>() -> V {
    serde_json::from_value(serde_json::Value::Object(serde_json::Map::new())).unwrap_or_default()
}
