//! # Type-erased service handle.
//!
//! The container stores every value as `Arc<dyn Any + Send + Sync>` together
//! with its type name, so a mismatching typed lookup can say what was found.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use crate::error::ContainerError;

use super::Container;

/// Erased factory stored per key.
pub(crate) type Factory =
    Arc<dyn Fn(&Container) -> Result<Service, ContainerError> + Send + Sync + 'static>;

/// Shared handle to a built service.
///
/// Cloning is cheap and never rebuilds anything: all clones point to the
/// same memoized value.
#[derive(Clone)]
pub struct Service {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync + 'static>,
}

impl Service {
    pub(crate) fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            type_name: type_name::<T>(),
            value: Arc::new(value),
        }
    }

    /// Name of the stored type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the stored value as `Arc<T>`, or `None` if it is another type.
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    /// True if the stored value is a `T`.
    pub fn is<T: Send + Sync + 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    /// True if both handles point to the same memoized value.
    pub fn ptr_eq(&self, other: &Service) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Registration for one key: its factory and the instance it built, if any.
///
/// `build` serializes the first resolution across threads; `instance` is
/// readable without taking it.
pub(crate) struct Slot {
    pub(crate) factory: Factory,
    pub(crate) instance: OnceLock<Service>,
    pub(crate) build: Mutex<()>,
}

impl Slot {
    pub(crate) fn new(factory: Factory) -> Self {
        Self {
            factory,
            instance: OnceLock::new(),
            build: Mutex::new(()),
        }
    }

    #[inline]
    pub(crate) fn is_built(&self) -> bool {
        self.instance.get().is_some()
    }
}
