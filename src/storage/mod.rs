//! Key-value storage backends that pods persist into.

mod storage;
#[cfg(feature = "web")]
mod web;

pub use storage::{Host, MemoryStorage, Storage, StorageError, StorageKind};
#[cfg(feature = "web")]
pub use web::WebStorage;
