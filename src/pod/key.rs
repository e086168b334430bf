use crate::config::SlotNaming;
use crate::storage::StorageKind;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A key with a statically known value type.
///
/// Implement this once per key to get typed acquisition without repeating
/// the value type at every call site.
///
/// ```
/// use podstate::PodKey;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Default, Serialize, Deserialize)]
/// struct Layout {
///     bg: String,
/// }
///
/// struct LayoutKey;
///
/// impl PodKey for LayoutKey {
///     const NAME: &'static str = "layout";
///     type Value = Layout;
/// }
/// ```
pub trait PodKey {
    const NAME: &'static str;
    type Value: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static;
}

/// Name of the slot a key is stored under.
pub fn slot_name(key: &str, kind: StorageKind, naming: SlotNaming) -> String {
    match naming {
        SlotNaming::Key => key.to_string(),
        SlotNaming::Qualified => context_name(key, kind),
    }
}

/// Name a pod is published under in a [`Scope`](crate::Scope).
pub fn context_name(key: &str, kind: StorageKind) -> String {
    format!("{key}__{kind}__pod")
}
