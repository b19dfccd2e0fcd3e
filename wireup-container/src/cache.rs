//! Instance caches for Singleton and Scoped lifetimes.
//!
//! An [`InstanceCache`] maps (resolving type, name) identities to live
//! instances. Entries are created at most once per identity: the first
//! writer wins, and a racing writer gets the already-cached instance back
//! instead of its own. The container owns one cache for Singleton (and
//! unscoped Scoped) instances; every scope owns its own.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::constructor::{InstanceDisposer, SharedInstance};
use crate::key::DependencyKey;

/// Cleanup hook for cached instances.
///
/// Register a type as disposable via `TypePlan::disposable`; its cached
/// instances are then disposed exactly once when the owning cache (the
/// container's, or a scope's) is disposed.
///
/// # Examples
/// ```rust,ignore
/// struct Connection { url: String }
///
/// impl Dispose for Connection {
///     fn dispose(&self) {
///         // close sockets, flush buffers, ...
///     }
/// }
///
/// builder.scoped::<Connection>(|t| {
///     t.constructor(vec![], |_| Ok(Connection { url: "...".into() }))
///         .disposable();
/// })
/// ```
pub trait Dispose: Send + Sync {
    fn dispose(&self);
}

struct CachedInstance {
    instance: SharedInstance,
    disposer: Option<InstanceDisposer>,
}

/// Thread-safe instance cache with at-most-once creation per identity.
///
/// All mutation goes through one lock per cache; independent caches never
/// contend with each other. Reads take the shared side of the lock, and
/// the write path re-checks presence before inserting, so exactly one
/// writer wins per identity.
pub(crate) struct InstanceCache {
    instances: RwLock<HashMap<DependencyKey, CachedInstance>>,
    disposed: AtomicBool,
}

impl InstanceCache {
    pub(crate) fn new() -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
            disposed: AtomicBool::new(false),
        }
    }

    /// Returns the cached instance for `key`, if any.
    pub(crate) fn try_get(&self, key: &DependencyKey) -> Option<SharedInstance> {
        self.instances
            .read()
            .get(key)
            .map(|cached| cached.instance.clone())
    }

    /// Stores `instance` under `key` if the identity is still vacant.
    ///
    /// Returns the instance that ended up cached: the caller's on a clean
    /// insert, or the previously stored one when another writer got there
    /// first. Callers must use the returned instance, not the one they
    /// passed in.
    pub(crate) fn add(
        &self,
        key: DependencyKey,
        instance: SharedInstance,
        disposer: Option<InstanceDisposer>,
    ) -> SharedInstance {
        // Cheap presence check on the read side; re-checked under the
        // write lock below.
        if let Some(existing) = self.try_get(&key) {
            return existing;
        }

        let mut instances = self.instances.write();
        if let Some(existing) = instances.get(&key) {
            trace!(key = %key, "lost instance race, returning cached instance");
            return existing.instance.clone();
        }

        if self.disposed.load(Ordering::Acquire) {
            // A disposed cache stores nothing; hand the instance back
            // uncached.
            return instance;
        }

        trace!(key = %key, "cached instance");
        instances.insert(
            key,
            CachedInstance {
                instance: instance.clone(),
                disposer,
            },
        );
        instance
    }

    /// Disposes every cached instance that registered a disposal hook and
    /// clears the cache. Safe to call more than once.
    pub(crate) fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut instances = self.instances.write();
        debug!(instances = instances.len(), "disposing instance cache");
        for (_, cached) in instances.drain() {
            if let Some(disposer) = cached.disposer {
                disposer(cached.instance.as_ref());
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.instances.read().len()
    }
}
