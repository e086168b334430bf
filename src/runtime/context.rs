use parking_lot::Mutex;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type Observer = Arc<dyn Fn() + Send + Sync>;

/// Dependency graph for a single runtime.
struct Graph {
    // Map from signal ID to set of observer IDs that depend on it
    dependencies: HashMap<usize, HashSet<usize>>,
    // Map from observer ID to set of signal IDs it depends on
    observer_deps: HashMap<usize, HashSet<usize>>,
    observers: HashMap<usize, Observer>,
    // Observers currently on the call stack; never re-entered
    running: HashSet<usize>,
}

impl Graph {
    fn new() -> Self {
        Self {
            dependencies: HashMap::new(),
            observer_deps: HashMap::new(),
            observers: HashMap::new(),
            running: HashSet::new(),
        }
    }

    fn clear_deps(&mut self, observer_id: usize) {
        if let Some(old_deps) = self.observer_deps.remove(&observer_id) {
            for signal_id in old_deps {
                if let Some(deps) = self.dependencies.get_mut(&signal_id) {
                    deps.remove(&observer_id);
                    if deps.is_empty() {
                        self.dependencies.remove(&signal_id);
                    }
                }
            }
        }
    }
}

static NEXT_RUNTIME: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    // Thread-local stack for scoped runtimes
    static RUNTIME_STACK: RefCell<Vec<Arc<ReactiveRuntime>>> = const { RefCell::new(Vec::new()) };
    // (runtime key, observer id) of the observer currently tracking reads
    static CURRENT_OBSERVER: Cell<Option<(usize, usize)>> = const { Cell::new(None) };
}

/// Hybrid reactive runtime for managing reactive primitives.
///
/// Supports both a global runtime (default) and scoped runtimes for
/// isolation. The runtime tracks which observers read which signals and
/// re-runs those observers synchronously when a signal is written.
///
/// # Examples
///
/// ```
/// use podstate::runtime::ReactiveRuntime;
/// use podstate::Signal;
///
/// ReactiveRuntime::scope(|| {
///     let signal = Signal::new(0);
///     assert_eq!(signal.get(), 0);
/// });
/// ```
pub struct ReactiveRuntime {
    key: usize,
    next_id: AtomicUsize,
    graph: Mutex<Graph>,
}

impl ReactiveRuntime {
    fn new() -> Arc<Self> {
        Arc::new(ReactiveRuntime {
            key: NEXT_RUNTIME.fetch_add(1, Ordering::Relaxed),
            next_id: AtomicUsize::new(0),
            graph: Mutex::new(Graph::new()),
        })
    }

    /// Run a function with a fresh isolated runtime.
    ///
    /// Signals and effects created inside `f` belong to the new runtime
    /// and keep it alive for as long as they exist.
    pub fn scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        Self::with_runtime(Self::new(), f)
    }

    /// Get or create the global runtime (fallback).
    pub fn global() -> Arc<Self> {
        use std::sync::OnceLock;
        static RUNTIME: OnceLock<Arc<ReactiveRuntime>> = OnceLock::new();
        Arc::clone(RUNTIME.get_or_init(Self::new))
    }

    /// Get the current reactive runtime (scoped or global fallback).
    pub fn current() -> Arc<Self> {
        RUNTIME_STACK.with(|stack| stack.borrow().last().cloned().unwrap_or_else(Self::global))
    }

    /// Run a function with a specific runtime as the current context.
    pub fn with_runtime<F, R>(runtime: Arc<Self>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        RUNTIME_STACK.with(|stack| stack.borrow_mut().push(runtime));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    /// Run `f` without subscribing the running observer to anything it reads.
    ///
    /// ```
    /// use podstate::runtime::ReactiveRuntime;
    /// use podstate::{Effect, Signal};
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    ///
    /// let signal = Signal::new(1);
    /// let runs = Arc::new(AtomicUsize::new(0));
    /// let _effect = Effect::new({
    ///     let signal = signal.clone();
    ///     let runs = runs.clone();
    ///     move || {
    ///         ReactiveRuntime::untrack(|| signal.get());
    ///         runs.fetch_add(1, Ordering::SeqCst);
    ///     }
    /// });
    ///
    /// signal.set(2);
    /// assert_eq!(runs.load(Ordering::SeqCst), 1);
    /// ```
    pub fn untrack<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let prev = CURRENT_OBSERVER.with(|current| current.replace(None));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
        CURRENT_OBSERVER.with(|current| current.set(prev));

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    /// Generate the next unique ID for a reactive primitive.
    pub fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Track a read of a signal by the current observer.
    pub fn track_read(&self, signal_id: usize) {
        let Some((key, observer_id)) = CURRENT_OBSERVER.with(Cell::get) else {
            return;
        };
        if key != self.key {
            return;
        }

        let mut graph = self.graph.lock();
        if !graph.observers.contains_key(&observer_id) {
            return;
        }
        graph.dependencies.entry(signal_id).or_default().insert(observer_id);
        graph.observer_deps.entry(observer_id).or_default().insert(signal_id);
    }

    /// Re-run every observer that depends on a signal.
    pub fn notify_observers(&self, signal_id: usize) {
        let pending: Vec<(usize, Observer)> = {
            let graph = self.graph.lock();
            let Some(ids) = graph.dependencies.get(&signal_id) else {
                return;
            };
            let mut ids: Vec<usize> = ids.iter().copied().collect();
            // Creation order keeps reruns deterministic
            ids.sort_unstable();
            ids.into_iter()
                .filter(|id| !graph.running.contains(id))
                .filter_map(|id| graph.observers.get(&id).map(|f| (id, Arc::clone(f))))
                .collect()
        };

        for (observer_id, observer) in pending {
            self.run_observer(observer_id, observer.as_ref());
        }
    }

    /// Register an observer and run it once to collect its dependencies.
    pub fn create_observer<F>(&self, observer_id: usize, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let observer: Observer = Arc::new(f);
        self.graph.lock().observers.insert(observer_id, Arc::clone(&observer));
        self.run_observer(observer_id, observer.as_ref());
    }

    /// Drop an observer and every dependency edge pointing at it.
    pub fn remove_observer(&self, observer_id: usize) {
        let mut graph = self.graph.lock();
        graph.observers.remove(&observer_id);
        graph.clear_deps(observer_id);
    }

    /// Number of observers currently subscribed to a signal.
    pub fn observer_count(&self, signal_id: usize) -> usize {
        self.graph
            .lock()
            .dependencies
            .get(&signal_id)
            .map_or(0, HashSet::len)
    }

    fn run_observer(&self, observer_id: usize, observer: &(dyn Fn() + Send + Sync)) {
        {
            let mut graph = self.graph.lock();
            if !graph.running.insert(observer_id) {
                return;
            }
            graph.clear_deps(observer_id);
        }

        let prev = CURRENT_OBSERVER.with(|current| current.replace(Some((self.key, observer_id))));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(observer));
        CURRENT_OBSERVER.with(|current| current.set(prev));

        self.graph.lock().running.remove(&observer_id);

        if let Err(e) = result {
            std::panic::resume_unwind(e);
        }
    }
}
