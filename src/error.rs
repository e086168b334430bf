use crate::storage::StorageError;
use thiserror::Error;

/// Errors returned by the explicit, fallible pod operations.
///
/// Acquiring a pod never fails; these only surface from calls such as
/// [`Pod::flush`](crate::Pod::flush) and [`Scope::lookup`](crate::Scope::lookup).
#[derive(Debug, Error)]
pub enum PodError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("nothing is bound to {0} in this scope or its ancestors")]
    NotBound(String),

    #[error("binding {name} holds a different value type")]
    TypeMismatch { name: String },
}
