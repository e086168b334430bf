use crate::runtime::ReactiveRuntime;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

/// A reactive signal that holds a value and notifies subscribers when changed.
///
/// A signal belongs to the runtime that was current when it was created;
/// writes made from anywhere notify the observers of that runtime.
pub struct Signal<T> {
    value: Arc<RwLock<T>>,
    id: usize,
    runtime: Arc<ReactiveRuntime>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            id: self.id,
            runtime: Arc::clone(&self.runtime),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(initial: T) -> Self {
        let runtime = ReactiveRuntime::current();
        let id = runtime.next_id();

        Self {
            value: Arc::new(RwLock::new(initial)),
            id,
            runtime,
        }
    }

    /// Get the current value of the signal.
    pub fn get(&self) -> T {
        self.runtime.track_read(self.id);
        self.value.read().clone()
    }

    /// Get the current value without subscribing the running observer.
    pub fn get_untracked(&self) -> T {
        self.value.read().clone()
    }

    /// Set a new value for the signal.
    pub fn set(&self, new_value: T) {
        *self.value.write() = new_value;
        self.runtime.notify_observers(self.id);
    }

    /// Update the value using a function.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        {
            let mut value = self.value.write();
            f(&mut *value);
        }
        self.runtime.notify_observers(self.id);
    }

    /// Read the value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.runtime.track_read(self.id);
        let value = self.value.read();
        f(&*value)
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Number of observers currently subscribed to this signal.
    pub fn observer_count(&self) -> usize {
        self.runtime.observer_count(self.id)
    }

    /// Watch this signal for changes.
    ///
    /// The callback runs immediately with the current value and again after
    /// every write. Dropping the guard unsubscribes it.
    pub fn watch<F>(&self, callback: F) -> WatchGuard
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let observer_id = self.runtime.next_id();
        let source = self.clone();

        self.runtime.create_observer(observer_id, move || {
            callback(source.get());
        });

        WatchGuard {
            observer_id,
            runtime: Arc::downgrade(&self.runtime),
        }
    }
}

/// RAII guard for signal watchers.
#[must_use = "dropping a WatchGuard unsubscribes the watcher"]
pub struct WatchGuard {
    observer_id: usize,
    runtime: Weak<ReactiveRuntime>,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.remove_observer(self.observer_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn signal_get_set_update() {
        ReactiveRuntime::scope(|| {
            let signal = Signal::new(0);
            assert_eq!(signal.get(), 0);

            signal.set(42);
            assert_eq!(signal.get(), 42);

            signal.update(|n| *n += 10);
            assert_eq!(signal.with(|n| *n), 52);
        });
    }

    #[test]
    fn watch_runs_immediately_and_on_change() {
        ReactiveRuntime::scope(|| {
            let signal = Signal::new(String::from("a"));
            let seen = Arc::new(RwLock::new(Vec::new()));

            let guard = signal.watch({
                let seen = seen.clone();
                move |value| seen.write().push(value)
            });

            signal.set("b".to_string());
            assert_eq!(*seen.read(), vec!["a".to_string(), "b".to_string()]);

            drop(guard);
            signal.set("c".to_string());
            assert_eq!(seen.read().len(), 2);
        });
    }

    #[test]
    fn writes_outside_scope_reach_scoped_watchers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (signal, _guard) = ReactiveRuntime::scope(|| {
            let signal = Signal::new(1);
            let guard = signal.watch({
                let calls = calls.clone();
                move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                }
            });
            (signal, guard)
        });

        signal.set(2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
