//! Resolution scopes.
//!
//! A [`Scope`] is a disposable resolution context: a fresh instance cache
//! attached (exactly once, at construction) to its own resolution engine.
//! Scoped-lifetime dependencies resolved through the scope are cached in
//! that cache and disposed together when the scope ends; Singleton
//! dependencies still come from the owning container.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::cache::InstanceCache;
use crate::constructor::Arguments;
use crate::container::{resolve_trait_typed, resolve_typed, resolve_typed_with};
use crate::engine::ResolutionEngine;
use crate::error::Result;
use crate::key::DependencyKey;
use crate::registry::Registry;

/// A disposable resolution context with its own cache for Scoped
/// dependencies.
///
/// Created by `Container::create_scope()`. Dropping the scope disposes
/// its cached instances; [`dispose`](Scope::dispose) does the same
/// explicitly and is idempotent.
pub struct Scope {
    engine: ResolutionEngine,
}

impl Scope {
    pub(crate) fn new(registry: Arc<Registry>, root: Arc<InstanceCache>) -> Self {
        let engine = ResolutionEngine::new(registry, root);
        engine
            .attach_scoped_cache(Arc::new(InstanceCache::new()))
            .expect("a freshly created engine accepts exactly one scoped cache");
        Self { engine }
    }

    /// Resolves a dependency by type within this scope.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        resolve_typed(&self.engine, DependencyKey::of::<T>())
    }

    /// Resolves a named dependency within this scope.
    pub fn resolve_named<T: Send + Sync + 'static>(&self, name: &'static str) -> Result<Arc<T>> {
        resolve_typed(&self.engine, DependencyKey::named::<T>(name))
    }

    /// Resolves a contract registered with an `_as` registration.
    pub fn resolve_trait<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        resolve_trait_typed(&self.engine, DependencyKey::of::<T>())
    }

    /// Resolves a named contract within this scope.
    pub fn resolve_trait_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &'static str,
    ) -> Result<Arc<T>> {
        resolve_trait_typed(&self.engine, DependencyKey::named::<T>(name))
    }

    /// Resolves with caller-supplied constructor parameters.
    pub fn resolve_with<T: Send + Sync + 'static>(&self, args: Arguments) -> Result<Arc<T>> {
        resolve_typed_with(&self.engine, DependencyKey::of::<T>(), args)
    }

    /// Named variant of [`resolve_with`](Self::resolve_with).
    pub fn resolve_named_with<T: Send + Sync + 'static>(
        &self,
        name: &'static str,
        args: Arguments,
    ) -> Result<Arc<T>> {
        resolve_typed_with(&self.engine, DependencyKey::named::<T>(name), args)
    }

    /// Disposes every disposable instance in this scope's cache.
    /// Idempotent; also invoked on drop.
    pub fn dispose(&self) {
        self.engine.dispose();
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        debug!("scope dropped");
        self.engine.dispose();
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope").finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::cache::Dispose;
    use crate::container::Container;
    use crate::key::DependencyKey;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Session;

    fn container_with_scoped_session() -> Container {
        Container::builder()
            .scoped::<Session>(|t| {
                t.constructor(vec![], |_| Ok(Session));
            })
            .build()
            .unwrap()
    }

    #[test]
    fn scoped_instance_reused_within_scope() {
        let container = container_with_scoped_session();
        let scope = container.create_scope();

        let a = scope.resolve::<Session>().unwrap();
        let b = scope.resolve::<Session>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn scopes_are_isolated() {
        let container = container_with_scoped_session();
        let scope1 = container.create_scope();
        let scope2 = container.create_scope();

        let first = scope1.resolve::<Session>().unwrap();
        let second = scope2.resolve::<Session>().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        // Disposing one scope leaves the other's instance usable.
        scope1.dispose();
        let still_there = scope2.resolve::<Session>().unwrap();
        assert!(Arc::ptr_eq(&second, &still_there));
    }

    #[test]
    fn singletons_are_shared_across_scopes() {
        struct Config;

        let container = Container::builder()
            .singleton::<Config>(|t| {
                t.constructor(vec![], |_| Ok(Config));
            })
            .build()
            .unwrap();

        let from_container = container.resolve::<Config>().unwrap();
        let scope1 = container.create_scope();
        let scope2 = container.create_scope();

        let from_scope1 = scope1.resolve::<Config>().unwrap();
        let from_scope2 = scope2.resolve::<Config>().unwrap();

        assert!(Arc::ptr_eq(&from_container, &from_scope1));
        assert!(Arc::ptr_eq(&from_container, &from_scope2));
    }

    #[test]
    fn transients_stay_fresh_inside_scopes() {
        struct Command;

        let container = Container::builder()
            .transient::<Command>(|t| {
                t.constructor(vec![], |_| Ok(Command));
            })
            .build()
            .unwrap();

        let scope = container.create_scope();
        let a = scope.resolve::<Command>().unwrap();
        let b = scope.resolve::<Command>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn scope_disposal_cascades_to_scoped_instances() {
        struct Transaction {
            disposals: Arc<AtomicU32>,
        }
        impl Dispose for Transaction {
            fn dispose(&self) {
                self.disposals.fetch_add(1, Ordering::SeqCst);
            }
        }

        let disposals = Arc::new(AtomicU32::new(0));
        let container = Container::builder()
            .scoped::<Transaction>({
                let disposals = disposals.clone();
                move |t| {
                    let disposals = disposals.clone();
                    t.constructor(vec![], move |_| {
                        Ok(Transaction {
                            disposals: disposals.clone(),
                        })
                    })
                    .disposable();
                }
            })
            .build()
            .unwrap();

        let scope = container.create_scope();
        let _transaction = scope.resolve::<Transaction>().unwrap();

        scope.dispose();
        scope.dispose();
        assert_eq!(disposals.load(Ordering::SeqCst), 1);

        // The container-wide cache was untouched.
        container.dispose();
        assert_eq!(disposals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_scope_disposes_instances() {
        struct Transaction {
            disposals: Arc<AtomicU32>,
        }
        impl Dispose for Transaction {
            fn dispose(&self) {
                self.disposals.fetch_add(1, Ordering::SeqCst);
            }
        }

        let disposals = Arc::new(AtomicU32::new(0));
        let container = Container::builder()
            .scoped::<Transaction>({
                let disposals = disposals.clone();
                move |t| {
                    let disposals = disposals.clone();
                    t.constructor(vec![], move |_| {
                        Ok(Transaction {
                            disposals: disposals.clone(),
                        })
                    })
                    .disposable();
                }
            })
            .build()
            .unwrap();

        {
            let scope = container.create_scope();
            let _transaction = scope.resolve::<Transaction>().unwrap();
        }

        assert_eq!(disposals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn scoped_graph_reuses_scoped_dependency() {
        struct Unit;
        struct Holder {
            unit: Arc<Unit>,
        }

        let container = Container::builder()
            .scoped::<Unit>(|t| {
                t.constructor(vec![], |_| Ok(Unit));
            })
            .transient::<Holder>(|t| {
                t.constructor(vec![DependencyKey::of::<Unit>()], |args| {
                    Ok(Holder {
                        unit: args.take::<Unit>()?,
                    })
                });
            })
            .build()
            .unwrap();

        let scope = container.create_scope();
        let first = scope.resolve::<Holder>().unwrap();
        let second = scope.resolve::<Holder>().unwrap();

        // Fresh holders, shared scoped dependency.
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first.unit, &second.unit));
    }

    #[test]
    fn explicit_parameters_work_in_scopes() {
        struct Tagged {
            tag: u64,
        }

        let container = Container::builder()
            .transient::<Tagged>(|t| {
                t.constructor(vec![DependencyKey::of::<u64>()], |args| {
                    Ok(Tagged {
                        tag: *args.take::<u64>()?,
                    })
                });
            })
            .build()
            .unwrap();

        let scope = container.create_scope();
        let tagged = scope
            .resolve_with::<Tagged>(crate::constructor::Arguments::new().with(17u64))
            .unwrap();
        assert_eq!(tagged.tag, 17);
    }
}
