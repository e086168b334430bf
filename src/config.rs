use serde::{Deserialize, Serialize};

/// How a pod's key maps to the slot name it is stored under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotNaming {
    /// The key itself, e.g. `theme`.
    #[default]
    Key,
    /// Key and backend, e.g. `theme__localStorage__pod`.
    Qualified,
}

/// Knobs shared by every pod acquired through a scope.
///
/// ```
/// use podstate::{PodConfig, SlotNaming};
///
/// let config: PodConfig = serde_json::from_str(r#"{"slot_naming":"qualified"}"#).unwrap();
/// assert_eq!(config.slot_naming, SlotNaming::Qualified);
/// assert!(config.skip_unchanged_writes);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodConfig {
    pub slot_naming: SlotNaming,
    /// Do not rewrite a slot with the text it already holds. The slot is
    /// re-read before a write is skipped, so a record replaced by another
    /// writer is still overwritten.
    pub skip_unchanged_writes: bool,
}

impl Default for PodConfig {
    fn default() -> Self {
        Self {
            slot_naming: SlotNaming::Key,
            skip_unchanged_writes: true,
        }
    }
}

impl PodConfig {
    pub fn qualified() -> Self {
        Self {
            slot_naming: SlotNaming::Qualified,
            ..Self::default()
        }
    }
}
