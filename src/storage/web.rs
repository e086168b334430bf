use super::{Storage, StorageError, StorageKind};

/// `window.localStorage` / `window.sessionStorage`.
///
/// Holds no JS handle, so it is `Send + Sync`; the storage object is looked
/// up from the window on every call.
#[derive(Debug, Clone, Copy)]
pub struct WebStorage {
    kind: StorageKind,
}

impl WebStorage {
    pub fn new(kind: StorageKind) -> Self {
        Self { kind }
    }

    /// Whether the current window exposes this kind of storage.
    pub fn available(kind: StorageKind) -> bool {
        Self::new(kind).handle().is_ok()
    }

    fn handle(&self) -> Result<web_sys::Storage, StorageError> {
        let window = web_sys::window().ok_or(StorageError::Unavailable(self.kind))?;
        let storage = match self.kind {
            StorageKind::Local => window.local_storage(),
            StorageKind::Session => window.session_storage(),
        };
        storage
            .ok()
            .flatten()
            .ok_or(StorageError::Unavailable(self.kind))
    }

    fn rejected(&self, name: &str, err: wasm_bindgen::JsValue) -> StorageError {
        StorageError::Rejected {
            kind: self.kind,
            name: name.to_string(),
            reason: format!("{err:?}"),
        }
    }
}

impl Storage for WebStorage {
    fn get_item(&self, name: &str) -> Result<Option<String>, StorageError> {
        self.handle()?
            .get_item(name)
            .map_err(|err| self.rejected(name, err))
    }

    fn set_item(&self, name: &str, value: &str) -> Result<(), StorageError> {
        self.handle()?
            .set_item(name, value)
            .map_err(|err| self.rejected(name, err))
    }
}
