//! # The Container — heart of Wireup
//!
//! The dependency injection container that resolves and manages the
//! lifecycle of your application's dependencies.
//!
//! # Architecture
//! ```text
//! ContainerBuilder  ──build()──>  Container
//!                                    │
//!                              create_scope()
//!                                    │
//!                                    ▼
//!                                  Scope
//! ```
//!
//! # Examples
//! ```rust
//! use wireup_container::prelude::*;
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, msg: &str);
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, msg: &str) { println!("{msg}"); }
//! }
//!
//! struct UserService {
//!     logger: Arc<dyn Logger>,
//! }
//!
//! let container = Container::builder()
//!     .singleton_as::<dyn Logger, ConsoleLogger>(
//!         |logger| logger as Arc<dyn Logger>,
//!         |t| {
//!             t.constructor(vec![], |_| Ok(ConsoleLogger));
//!         },
//!     )
//!     .transient::<UserService>(|t| {
//!         t.constructor(vec![DependencyKey::of::<dyn Logger>()], |args| {
//!             Ok(UserService { logger: args.take_trait::<dyn Logger>()? })
//!         });
//!     })
//!     .build()
//!     .expect("failed to build container");
//!
//! let service = container.resolve::<UserService>().expect("failed to resolve");
//! service.logger.log("wired up");
//! ```

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::cache::InstanceCache;
use crate::constructor::{self, Arguments, SharedInstance, TypePlan};
use crate::engine::ResolutionEngine;
use crate::error::{Result, WireupError};
use crate::graph::{DependencyInfo, GraphValidator};
use crate::key::DependencyKey;
use crate::lifetime::Lifetime;
use crate::provider::{Provider, ProviderRegistry};
use crate::registry::{DependencyRecord, Registry};
use crate::scope::Scope;

// ============================================================
// ContainerBuilder
// ============================================================

/// Builds a [`Container`] with registered dependencies.
///
/// Register all dependencies, then call
/// [`build()`](ContainerBuilder::build) to get an immutable, thread-safe
/// container. The builder is consumed by `build()`, so registering into a
/// built container is impossible by construction.
///
/// Registration errors (duplicate identities) are remembered and
/// surfaced by `build()`, keeping the chaining style intact.
pub struct ContainerBuilder {
    registry: Registry,
    deferred: Option<WireupError>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            registry: Registry::new(),
            deferred: None,
        }
    }

    // ── Singleton: pre-built value ──

    /// Registers a pre-built value as a singleton.
    pub fn singleton_value<T: Send + Sync + 'static>(self, value: T) -> Self {
        self.record(DependencyRecord::from_value(value))
    }

    // ── Same-type registrations ──

    /// Registers `T` with Singleton lifetime.
    ///
    /// `configure` declares the constructors of `T` on a [`TypePlan`].
    pub fn singleton<T: Send + Sync + 'static>(
        self,
        configure: impl FnOnce(&mut TypePlan<T>),
    ) -> Self {
        self.record(DependencyRecord::define(Lifetime::Singleton, configure))
    }

    /// Registers `T` with Scoped lifetime.
    pub fn scoped<T: Send + Sync + 'static>(
        self,
        configure: impl FnOnce(&mut TypePlan<T>),
    ) -> Self {
        self.record(DependencyRecord::define(Lifetime::Scoped, configure))
    }

    /// Registers `T` with Transient lifetime.
    pub fn transient<T: Send + Sync + 'static>(
        self,
        configure: impl FnOnce(&mut TypePlan<T>),
    ) -> Self {
        self.record(DependencyRecord::define(Lifetime::Transient, configure))
    }

    // ── Named registrations ──

    /// Registers `T` under a name with Singleton lifetime.
    pub fn singleton_named<T: Send + Sync + 'static>(
        self,
        name: &'static str,
        configure: impl FnOnce(&mut TypePlan<T>),
    ) -> Self {
        self.record(DependencyRecord::define_named(
            name,
            Lifetime::Singleton,
            configure,
        ))
    }

    /// Registers `T` under a name with Scoped lifetime.
    pub fn scoped_named<T: Send + Sync + 'static>(
        self,
        name: &'static str,
        configure: impl FnOnce(&mut TypePlan<T>),
    ) -> Self {
        self.record(DependencyRecord::define_named(
            name,
            Lifetime::Scoped,
            configure,
        ))
    }

    /// Registers `T` under a name with Transient lifetime.
    pub fn transient_named<T: Send + Sync + 'static>(
        self,
        name: &'static str,
        configure: impl FnOnce(&mut TypePlan<T>),
    ) -> Self {
        self.record(DependencyRecord::define_named(
            name,
            Lifetime::Transient,
            configure,
        ))
    }

    // ── Contract registrations (trait bindings) ──

    /// Registers contract `C` (typically `dyn Trait`) resolved by the
    /// concrete type `T`, Singleton lifetime.
    ///
    /// Resolve via `resolve_trait::<C>()`. Instances are cached under
    /// `T`'s identity, so contracts sharing a resolving type share one
    /// instance.
    pub fn singleton_as<C, T>(
        self,
        cast: impl Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static,
        configure: impl FnOnce(&mut TypePlan<T>),
    ) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        self.record(DependencyRecord::define_as(
            Lifetime::Singleton,
            cast,
            configure,
        ))
    }

    /// Registers contract `C` resolved by `T`, Scoped lifetime.
    pub fn scoped_as<C, T>(
        self,
        cast: impl Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static,
        configure: impl FnOnce(&mut TypePlan<T>),
    ) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        self.record(DependencyRecord::define_as(
            Lifetime::Scoped,
            cast,
            configure,
        ))
    }

    /// Registers contract `C` resolved by `T`, Transient lifetime.
    pub fn transient_as<C, T>(
        self,
        cast: impl Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static,
        configure: impl FnOnce(&mut TypePlan<T>),
    ) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        self.record(DependencyRecord::define_as(
            Lifetime::Transient,
            cast,
            configure,
        ))
    }

    // ── Escape hatch ──

    /// Registers a fully assembled [`DependencyRecord`] (e.g. a named
    /// contract record built with `DependencyRecord::define_as_named`).
    pub fn register(self, record: DependencyRecord) -> Self {
        self.record(record)
    }

    // ── Provider modules ──

    /// Adds a [`Provider`] module.
    pub fn add_provider(mut self, provider: &dyn Provider) -> Self {
        debug!(provider = provider.name(), "registering provider module");
        provider.register(&mut self);
        self
    }

    // ── Build ──

    /// Builds the container.
    ///
    /// Fails on a deferred registration error, on zero registrations, or
    /// when the declared constructor graph contains a cycle.
    #[instrument(skip(self), name = "container_build")]
    pub fn build(self) -> Result<Container> {
        if let Some(err) = self.deferred {
            return Err(err);
        }
        if self.registry.is_empty() {
            return Err(WireupError::EmptyContainer);
        }

        info!(registered = self.registry.len(), "building container");

        let mut nodes: HashMap<DependencyKey, DependencyInfo> = HashMap::new();
        for record in self.registry.snapshot() {
            // Edges come from the constructor automatic resolution would
            // pick; a failed selection surfaces at resolve time instead.
            let dependencies = constructor::select(record.constructors(), record.contract())
                .map(|ctor| ctor.params.clone())
                .unwrap_or_default();
            nodes.insert(
                record.contract().clone(),
                DependencyInfo {
                    key: record.contract().clone(),
                    dependencies,
                },
            );
        }
        GraphValidator::new(nodes).validate()?;

        let registry = Arc::new(self.registry);
        let root = Arc::new(InstanceCache::new());
        let engine = ResolutionEngine::new(registry.clone(), root.clone());

        info!("container built");
        Ok(Container {
            registry,
            root,
            engine,
        })
    }

    // ── Internal ──

    fn record(mut self, record: DependencyRecord) -> Self {
        self.push_record(record);
        self
    }

    fn push_record(&mut self, record: DependencyRecord) {
        if let Err(err) = self.registry.add(record) {
            if self.deferred.is_none() {
                self.deferred = Some(err);
            }
        }
    }
}

// Providers register into the builder through this trait.
impl ProviderRegistry for ContainerBuilder {
    fn register_record(&mut self, record: DependencyRecord) {
        self.push_record(record);
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Immutable, thread-safe dependency injection container.
///
/// Created by [`ContainerBuilder::build()`]. The container owns the
/// registry and the container-wide instance cache; its own engine never
/// has a scoped cache attached, so Scoped dependencies resolved here
/// degrade to container-wide caching.
pub struct Container {
    registry: Arc<Registry>,
    root: Arc<InstanceCache>,
    engine: ResolutionEngine,
}

impl Container {
    /// Creates a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Resolves a dependency by type.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        resolve_typed(&self.engine, DependencyKey::of::<T>())
    }

    /// Resolves a named dependency by type.
    pub fn resolve_named<T: Send + Sync + 'static>(&self, name: &'static str) -> Result<Arc<T>> {
        resolve_typed(&self.engine, DependencyKey::named::<T>(name))
    }

    /// Resolves a contract registered with an `_as` registration,
    /// typically a `dyn Trait`.
    pub fn resolve_trait<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        resolve_trait_typed(&self.engine, DependencyKey::of::<T>())
    }

    /// Resolves a named contract.
    pub fn resolve_trait_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &'static str,
    ) -> Result<Arc<T>> {
        resolve_trait_typed(&self.engine, DependencyKey::named::<T>(name))
    }

    /// Resolves with caller-supplied constructor parameters instead of
    /// recursive auto-resolution. The argument count must exactly match a
    /// declared constructor.
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

    /// Creates a scope with its own cache for Scoped dependencies.
    pub fn create_scope(&self) -> Scope {
        debug!("creating new scope");
        Scope::new(self.registry.clone(), self.root.clone())
    }

    /// Disposes every disposable instance in the container-wide cache.
    /// Idempotent; also invoked on drop.
    pub fn dispose(&self) {
        self.engine.dispose();
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        self.engine.dispose();
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.registry.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Typed resolution boundary (shared with Scope)
// ═══════════════════════════════════════════

pub(crate) fn resolve_typed<T: Send + Sync + 'static>(
    engine: &ResolutionEngine,
    key: DependencyKey,
) -> Result<Arc<T>> {
    let instance = engine.resolve(&key)?;
    extract::<T>(&key, instance)
}

pub(crate) fn resolve_typed_with<T: Send + Sync + 'static>(
    engine: &ResolutionEngine,
    key: DependencyKey,
    args: Arguments,
) -> Result<Arc<T>> {
    let instance = engine.resolve_with(&key, args)?;
    extract::<T>(&key, instance)
}

pub(crate) fn resolve_trait_typed<T: ?Sized + Send + Sync + 'static>(
    engine: &ResolutionEngine,
    key: DependencyKey,
) -> Result<Arc<T>> {
    let instance = engine.resolve(&key)?;
    extract_trait::<T>(&key, instance)
}

fn extract<T: Send + Sync + 'static>(
    key: &DependencyKey,
    instance: SharedInstance,
) -> Result<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| WireupError::TypeMismatch {
            key: key.clone(),
            expected: type_name::<T>(),
        })
}

fn extract_trait<T: ?Sized + Send + Sync + 'static>(
    key: &DependencyKey,
    instance: SharedInstance,
) -> Result<Arc<T>> {
    instance
        .downcast::<Arc<T>>()
        .map(|outer| (*outer).clone())
        .map_err(|_| WireupError::TypeMismatch {
            key: key.clone(),
            expected: type_name::<T>(),
        })
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder};
    pub use crate::cache::Dispose;
    pub use crate::constructor::{Arguments, ResolvedArguments, TypePlan};
    pub use crate::error::{Result, WireupError};
    pub use crate::key::DependencyKey;
    pub use crate::lifetime::Lifetime;
    pub use crate::provider::{Provider, ProviderRegistry};
    pub use crate::registry::DependencyRecord;
    pub use crate::scope::Scope;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
