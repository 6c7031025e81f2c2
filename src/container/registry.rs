use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock, TryLockError};

use tracing::debug;

use crate::core::Phase;
use crate::error::ContainerError;

use super::service::{Factory, Service, Slot};

thread_local! {
    /// Keys currently being built on this thread, tagged with their container.
    static BUILDING: RefCell<Vec<(usize, String)>> = const { RefCell::new(Vec::new()) };
}

/// Lazy, memoizing service registry.
///
/// Factories are registered under string keys and run at most once, on first
/// [`resolve`](Container::resolve). Factories receive the container and may
/// resolve other keys.
///
/// ### Rules
/// - Registering a key that already holds a built instance fails with
///   [`ContainerError::DuplicateService`].
/// - Registering an unbuilt key again replaces its factory (last one wins).
/// - Concurrent first resolutions of one key build it once; later callers
///   wait for the build and get the same instance.
/// - A factory resolving its own key fails with
///   [`ContainerError::CircularDependency`].
///
/// The container also carries the current lifecycle [`Phase`], readable by
/// callbacks and workers.
pub struct Container {
    slots: RwLock<HashMap<String, Arc<Slot>>>,
    phase: AtomicU8,
    started: AtomicBool,
}

impl Container {
    /// Creates an empty container in [`Phase::Init`].
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            phase: AtomicU8::new(Phase::Init as u8),
            started: AtomicBool::new(false),
        }
    }

    /// Creates an empty container already wrapped in an `Arc`.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Registers `factory` under `key`.
    ///
    /// Fails if `key` already holds a built instance or is being built right now.
    ///
    /// # Example
    /// ```
    /// use bootvisor::Container;
    ///
    /// let app = Container::new();
    /// app.register("greeting", |_| Ok(String::from("Salut"))).unwrap();
    /// assert_eq!(app.get_string("greeting").unwrap(), "Salut");
    /// ```
    pub fn register<T, F>(&self, key: impl Into<String>, factory: F) -> Result<(), ContainerError>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        let key = key.into();
        let factory: Factory = Arc::new(move |app: &Container| factory(app).map(Service::new));

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = slots.get(&key) {
            let building = matches!(existing.build.try_lock(), Err(TryLockError::WouldBlock));
            if existing.is_built() || building {
                return Err(ContainerError::DuplicateService { key });
            }
            debug!(key = %key, "replacing factory of unbuilt service");
        }
        slots.insert(key, Arc::new(Slot::new(factory)));
        Ok(())
    }

    /// Registers a ready value; every resolution returns a handle to it.
    pub fn register_value<T>(&self, key: impl Into<String>, value: T) -> Result<(), ContainerError>
    where
        T: Send + Sync + 'static,
    {
        let key = key.into();
        let name = key.clone();
        let cell = std::sync::Mutex::new(Some(value));
        self.register(key, move |_| {
            cell.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
                .ok_or_else(|| ContainerError::build(name.as_str(), "value already consumed"))
        })
    }

    /// Returns the instance for `key`, building it on first access.
    pub fn resolve(&self, key: &str) -> Result<Service, ContainerError> {
        let slot = self.slot(key)?;
        if let Some(svc) = slot.instance.get() {
            return Ok(svc.clone());
        }

        let _frame = BuildFrame::enter(self.id(), key)?;
        let _guard = slot.build.lock().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have finished the build while we waited.
        if let Some(svc) = slot.instance.get() {
            return Ok(svc.clone());
        }

        debug!(key, phase = %self.phase(), "building service");
        let svc = (slot.factory)(self)?;
        let _ = slot.instance.set(svc.clone());
        Ok(svc)
    }

    /// Resolves `key` and downcasts it to `T`.
    pub fn resolve_as<T>(&self, key: &str) -> Result<Arc<T>, ContainerError>
    where
        T: Send + Sync + 'static,
    {
        let svc = self.resolve(key)?;
        svc.downcast::<T>().ok_or_else(|| ContainerError::TypeMismatch {
            key: key.to_string(),
            expected: std::any::type_name::<T>(),
            found: svc.type_name(),
        })
    }

    /// Resolves a `String` service and returns an owned copy.
    pub fn get_string(&self, key: &str) -> Result<String, ContainerError> {
        self.resolve_as::<String>(key).map(|s| s.as_ref().clone())
    }

    /// Returns every registered key, sorted.
    pub fn keys(&self) -> BTreeSet<String> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// True if a factory is registered under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// True if `key` already holds a memoized instance.
    pub fn is_built(&self, key: &str) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .is_some_and(|slot| slot.is_built())
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// True once the lifecycle has fully completed.
    pub fn is_terminated(&self) -> bool {
        self.phase() == Phase::Terminated
    }

    /// Moves the phase forward; never moves it backward.
    pub(crate) fn advance(&self, phase: Phase) {
        self.phase.fetch_max(phase as u8, Ordering::AcqRel);
    }

    /// Marks the container as driven by a lifecycle; false if it already was.
    pub(crate) fn claim(&self) -> bool {
        !self.started.swap(true, Ordering::AcqRel)
    }

    fn slot(&self, key: &str) -> Result<Arc<Slot>, ContainerError> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| ContainerError::UnknownService {
                key: key.to_string(),
            })
    }

    fn id(&self) -> usize {
        self as *const Container as usize
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("phase", &self.phase())
            .field("keys", &self.keys())
            .finish()
    }
}

/// Marks `key` as being built on this thread until dropped.
struct BuildFrame {
    _private: (),
}

impl BuildFrame {
    fn enter(container: usize, key: &str) -> Result<Self, ContainerError> {
        BUILDING.with(|stack| {
            let mut stack = stack.borrow_mut();
            let start = stack
                .iter()
                .position(|(c, k)| *c == container && k == key);
            if let Some(start) = start {
                let mut chain: Vec<String> = stack[start..]
                    .iter()
                    .filter(|(c, _)| *c == container)
                    .map(|(_, k)| k.clone())
                    .collect();
                chain.push(key.to_string());
                return Err(ContainerError::CircularDependency {
                    key: key.to_string(),
                    chain,
                });
            }
            stack.push((container, key.to_string()));
            Ok(BuildFrame { _private: () })
        })
    }
}

impl Drop for BuildFrame {
    fn drop(&mut self) {
        BUILDING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn unknown_key_fails() {
        let app = Container::new();
        assert_eq!(
            app.resolve("missing").unwrap_err(),
            ContainerError::UnknownService { key: "missing".into() }
        );
    }

    #[test]
    fn unbuilt_key_can_be_replaced() {
        let app = Container::new();
        app.register("n", |_| Ok(1u32)).unwrap();
        app.register("n", |_| Ok(2u32)).unwrap();
        assert_eq!(*app.resolve_as::<u32>("n").unwrap(), 2);
    }

    #[test]
    fn failed_build_is_not_memoized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = Container::new();
        let c = Arc::clone(&calls);
        app.register("flaky", move |_| {
            if c.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ContainerError::build("flaky", "not yet"))
            } else {
                Ok(7u8)
            }
        })
        .unwrap();

        assert!(matches!(app.resolve("flaky"), Err(ContainerError::Build { .. })));
        assert!(!app.is_built("flaky"));
        assert_eq!(*app.resolve_as::<u8>("flaky").unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn two_key_cycle_reports_chain() {
        let app = Container::new();
        app.register("a", |app| app.resolve_as::<u8>("b").map(|b| *b))
            .unwrap();
        app.register("b", |app| app.resolve_as::<u8>("a").map(|a| *a))
            .unwrap();

        match app.resolve("a") {
            Err(ContainerError::CircularDependency { key, chain }) => {
                assert_eq!(key, "a");
                assert_eq!(chain, vec!["a", "b", "a"]);
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
        // The frame stack is unwound: nothing stays marked as building.
        BUILDING.with(|s| assert!(s.borrow().is_empty()));
    }

    #[test]
    fn phase_never_moves_backward() {
        let app = Container::new();
        assert_eq!(app.phase(), Phase::Init);
        app.advance(Phase::Run);
        app.advance(Phase::Config);
        assert_eq!(app.phase(), Phase::Run);
        app.advance(Phase::Terminated);
        assert!(app.is_terminated());
    }

    #[test]
    fn register_value_resolves_same_instance() {
        let app = Container::new();
        app.register_value("limits", vec![1, 2, 3]).unwrap();
        let a = app.resolve("limits").unwrap();
        let b = app.resolve("limits").unwrap();
        assert!(a.ptr_eq(&b));
    }
}
