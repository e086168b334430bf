//! # podstate
//!
//! Reactive state that survives reloads.
//!
//! A [`Pod`] binds a reactive value to a slot in a key-value storage
//! backend (a browser's `localStorage`/`sessionStorage`, or an in-memory
//! map). On acquisition it restores the stored record, or seeds the slot
//! from the caller's initial value; afterwards every change is written back
//! synchronously.
//!
//! ## Signals (Low-level primitives)
//!
//! - `Signal<T>` - Reactive values that notify dependents when changed
//! - `Effect` - Side effects that run when dependencies change
//!
//! ## Pods and scopes
//!
//! - `Pod<V>` - A signal kept in sync with a storage slot
//! - `Scope` - A component-tree node pods are published into, so
//!   descendants can look them up instead of re-acquiring them
//! - `Host` - The storage environment (`Host::browser()` with the `web`
//!   feature, `Host::in_memory()`, or `Host::headless()`)
//!
//! ```
//! use podstate::{Host, PodConfig, Scope, Seed, StorageKind};
//! use serde_json::json;
//!
//! let host = Host::in_memory();
//! let root = Scope::root(host.clone(), PodConfig::default());
//!
//! let theme = root.pod("theme", StorageKind::Local, Seed::Initial(json!({ "theme": "light" })));
//! assert_eq!(theme.get(), json!({ "theme": "light" }));
//!
//! // A second acquisition restores what the first one stored.
//! theme.set(json!({ "theme": "dark" }));
//! let again = root.child().pod("theme", StorageKind::Local, Seed::<serde_json::Value>::Stored);
//! assert_eq!(again.get(), json!({ "theme": "dark" }));
//! ```

pub mod config;
pub mod error;
pub mod pod;
pub mod runtime;
pub mod scope;
pub mod signal;
pub mod storage;

// Re-export main types for convenience
pub use config::{PodConfig, SlotNaming};
pub use error::PodError;
pub use pod::{Pod, PodKey, Seed};
pub use scope::Scope;
pub use signal::{create_effect, Effect, Signal, WatchGuard};
pub use storage::{Host, MemoryStorage, Storage, StorageError, StorageKind};
