//! The resolution engine.
//!
//! Given a contract identity, the engine looks up the dependency record,
//! serves a cached instance when the lifetime allows, and otherwise
//! selects a constructor, resolves its parameters depth-first by recursing
//! through itself, builds the instance, and commits it to the cache the
//! lifetime dictates. Construction always happens outside the cache
//! locks; only the final commit is serialized.
//!
//! Every engine shares its container's registry and container-wide cache.
//! A scope's engine additionally has a scoped cache attached — exactly
//! once, enforced here.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::trace;

use crate::cache::InstanceCache;
use crate::constructor::{self, Arguments, ResolvedArguments, SharedInstance};
use crate::error::{NotRegisteredError, Result, WireupError};
use crate::key::DependencyKey;
use crate::lifetime::Lifetime;
use crate::registry::{DependencyRecord, Registry};

pub(crate) struct ResolutionEngine {
    registry: Arc<Registry>,
    /// Container-wide cache: Singleton instances, and Scoped instances
    /// resolved outside any scope.
    root: Arc<InstanceCache>,
    /// At most one scoped cache may ever be attached.
    scoped: OnceCell<Arc<InstanceCache>>,
}

impl ResolutionEngine {
    pub(crate) fn new(registry: Arc<Registry>, root: Arc<InstanceCache>) -> Self {
        Self {
            registry,
            root,
            scoped: OnceCell::new(),
        }
    }

    /// Attaches the scoped cache this engine serves Scoped lifetimes from.
    ///
    /// # Errors
    /// Returns [`WireupError::ScopeProtocol`] when a scoped cache is
    /// already attached, or when the container-wide cache itself is passed
    /// as the scoped one.
    pub(crate) fn attach_scoped_cache(&self, cache: Arc<InstanceCache>) -> Result<()> {
        if Arc::ptr_eq(&cache, &self.root) {
            return Err(WireupError::ScopeProtocol {
                reason: "the container-wide cache cannot be attached as a scoped cache",
            });
        }
        self.scoped.set(cache).map_err(|_| WireupError::ScopeProtocol {
            reason: "a scoped cache is already attached to this engine",
        })
    }

    /// Resolves a contract identity, recursively constructing every
    /// declared constructor parameter.
    pub(crate) fn resolve(&self, key: &DependencyKey) -> Result<SharedInstance> {
        self.resolve_recursive(key, None)
    }

    fn resolve_recursive(
        &self,
        key: &DependencyKey,
        required_by: Option<&DependencyKey>,
    ) -> Result<SharedInstance> {
        let record = self.lookup(key, required_by)?;

        if let Some(hit) = self.cached(&record) {
            trace!(key = %key, "cache hit");
            return self.as_contract(&record, hit);
        }

        let ctor = constructor::select(record.constructors(), record.contract())?;
        trace!(key = %key, arity = ctor.arity(), "cache miss, constructing");

        // Depth-first, parameters left to right. A failure below names
        // this record as the consumer and carries the inner cause.
        let mut values = Vec::with_capacity(ctor.arity());
        for param in &ctor.params {
            let value = self
                .resolve_recursive(param, Some(record.contract()))
                .map_err(|source| WireupError::ConstructionFailed {
                    key: record.contract().clone(),
                    source: Box::new(source),
                })?;
            values.push(value);
        }

        let mut args = ResolvedArguments::new(values);
        let instance = ctor
            .build(&mut args)
            .map_err(|source| WireupError::ConstructionFailed {
                key: record.contract().clone(),
                source: Box::new(source),
            })?;

        let committed = self.commit(&record, instance);
        self.as_contract(&record, committed)
    }

    /// Resolves with caller-supplied parameter values. Selection is by
    /// exact parameter count; no recursive sub-resolution happens.
    pub(crate) fn resolve_with(
        &self,
        key: &DependencyKey,
        args: Arguments,
    ) -> Result<SharedInstance> {
        let record = self.lookup(key, None)?;

        if let Some(hit) = self.cached(&record) {
            trace!(key = %key, "cache hit");
            return self.as_contract(&record, hit);
        }

        let ctor = constructor::select_arity(record.constructors(), args.len(), record.contract())?;
        let mut args = args.into_resolved();
        let instance = ctor
            .build(&mut args)
            .map_err(|source| WireupError::ConstructionFailed {
                key: record.contract().clone(),
                source: Box::new(source),
            })?;

        let committed = self.commit(&record, instance);
        self.as_contract(&record, committed)
    }

    /// Disposes the attached scoped cache if present, else the
    /// container-wide cache. Idempotent.
    pub(crate) fn dispose(&self) {
        match self.scoped.get() {
            Some(scoped) => scoped.dispose(),
            None => self.root.dispose(),
        }
    }

    fn lookup(
        &self,
        key: &DependencyKey,
        required_by: Option<&DependencyKey>,
    ) -> Result<Arc<DependencyRecord>> {
        self.registry.get(key).ok_or_else(|| {
            WireupError::NotRegistered(NotRegisteredError {
                requested: key.clone(),
                required_by: required_by.cloned(),
                suggestions: self.registry.suggestions(key),
            })
        })
    }

    fn cached(&self, record: &DependencyRecord) -> Option<SharedInstance> {
        match record.lifetime() {
            Lifetime::Transient => None,
            Lifetime::Singleton => self.root.try_get(record.resolving()),
            Lifetime::Scoped => match self.scoped.get() {
                // A scoped hit wins; an instance cached container-wide
                // before any scope existed still satisfies the request.
                Some(scoped) => scoped
                    .try_get(record.resolving())
                    .or_else(|| self.root.try_get(record.resolving())),
                None => self.root.try_get(record.resolving()),
            },
        }
    }

    fn commit(&self, record: &DependencyRecord, instance: SharedInstance) -> SharedInstance {
        let key = record.resolving().clone();
        match record.lifetime() {
            Lifetime::Transient => instance,
            Lifetime::Singleton => self.root.add(key, instance, record.disposer()),
            Lifetime::Scoped => match self.scoped.get() {
                Some(scoped) => scoped.add(key, instance, record.disposer()),
                None => self.root.add(key, instance, record.disposer()),
            },
        }
    }

    /// Applies the record's contract cast, if any. The cache always holds
    /// the resolving-typed instance; the contract view is produced per
    /// resolution.
    fn as_contract(
        &self,
        record: &DependencyRecord,
        instance: SharedInstance,
    ) -> Result<SharedInstance> {
        match record.cast() {
            None => Ok(instance),
            Some(cast) => cast(instance).ok_or_else(|| WireupError::TypeMismatch {
                key: record.contract().clone(),
                expected: record.resolving().type_name(),
            }),
        }
    }
}
