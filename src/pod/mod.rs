//! Reactive values persisted to a storage slot.
//!
//! A pod restores its value from storage when it is acquired, or seeds the
//! slot from the caller's initial value, then writes every change back.

mod key;
mod pod;

pub use key::{context_name, slot_name, PodKey};
pub use pod::{Pod, Seed};
