use crate::config::PodConfig;
use crate::error::PodError;
use crate::pod::{context_name, Pod, PodKey, Seed};
use crate::storage::{Host, StorageKind};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

type Binding = Arc<dyn Any + Send + Sync>;

struct ScopeInner {
    parent: Option<Arc<ScopeInner>>,
    host: Host,
    config: PodConfig,
    bindings: RwLock<HashMap<String, Binding>>,
}

/// A node in the component tree that pods can be published into.
///
/// Lookups walk from this scope up through its ancestors, so a binding
/// made in a child hides one with the same name further up. Bindings are
/// released when the scope and all of its children are dropped.
///
/// ```
/// use podstate::{Host, PodConfig, Scope, Seed, StorageKind};
///
/// let root = Scope::root(Host::in_memory(), PodConfig::default());
/// let counter = root.pod("count", StorageKind::Session, Seed::Initial(0_u32));
///
/// let child = root.child();
/// let shared = child.lookup::<u32>("count", StorageKind::Session).unwrap();
/// shared.set(3);
/// assert_eq!(counter.get(), 3);
/// ```
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    /// A scope with no parent.
    pub fn root(host: Host, config: PodConfig) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                parent: None,
                host,
                config,
                bindings: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// A scope whose lookups fall back to this one.
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                parent: Some(Arc::clone(&self.inner)),
                host: self.inner.host.clone(),
                config: self.inner.config.clone(),
                bindings: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn host(&self) -> &Host {
        &self.inner.host
    }

    pub fn config(&self) -> &PodConfig {
        &self.inner.config
    }

    /// Acquire a pod and publish it in this scope.
    pub fn pod<V>(&self, key: &str, kind: StorageKind, seed: Seed<V>) -> Pod<V>
    where
        V: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static,
    {
        let pod = Pod::from_seed(&self.inner.host, &self.inner.config, key, kind, seed);
        self.publish(&context_name(key, kind), pod)
    }

    /// [`Scope::pod`] for a key with a registered value type.
    pub fn pod_typed<K: PodKey>(&self, kind: StorageKind, seed: Seed<K::Value>) -> Pod<K::Value> {
        self.pod(K::NAME, kind, seed)
    }

    /// Bind `pod` under `name` in this scope and hand it back.
    pub fn publish<V>(&self, name: &str, pod: Pod<V>) -> Pod<V>
    where
        V: Send + Sync + 'static,
    {
        let previous = self
            .inner
            .bindings
            .write()
            .insert(name.to_string(), Arc::new(pod.clone()));
        if previous.is_some() {
            debug!(name, "replaced binding in scope");
        }
        pod
    }

    /// Find the pod published for `key` and `kind` here or in an ancestor.
    pub fn lookup<V>(&self, key: &str, kind: StorageKind) -> Result<Pod<V>, PodError>
    where
        V: Send + Sync + 'static,
    {
        self.lookup_name(&context_name(key, kind))
    }

    /// [`Scope::lookup`] for a key with a registered value type.
    pub fn lookup_typed<K: PodKey>(&self, kind: StorageKind) -> Result<Pod<K::Value>, PodError> {
        self.lookup(K::NAME, kind)
    }

    /// Find a binding by its exact name here or in an ancestor.
    pub fn lookup_name<V>(&self, name: &str) -> Result<Pod<V>, PodError>
    where
        V: Send + Sync + 'static,
    {
        let mut scope = Some(&self.inner);
        while let Some(current) = scope {
            let binding = current.bindings.read().get(name).cloned();
            if let Some(binding) = binding {
                return match binding.downcast_ref::<Pod<V>>() {
                    Some(pod) => Ok(pod.clone()),
                    None => {
                        warn!(name, "binding holds a different value type");
                        Err(PodError::TypeMismatch {
                            name: name.to_string(),
                        })
                    }
                };
            }
            scope = current.parent.as_ref();
        }
        Err(PodError::NotBound(name.to_string()))
    }

    /// Whether a binding with this exact name is visible from this scope.
    pub fn contains(&self, name: &str) -> bool {
        let mut scope = Some(&self.inner);
        while let Some(current) = scope {
            if current.bindings.read().contains_key(name) {
                return true;
            }
            scope = current.parent.as_ref();
        }
        false
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.inner.bindings.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("Scope")
            .field("host", &self.inner.host)
            .field("config", &self.inner.config)
            .field("bindings", &names)
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}
