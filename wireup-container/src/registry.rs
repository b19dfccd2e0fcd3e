//! Dependency registry — stores all registrations of a container.
//!
//! The registry maps (contract type, name) identities to
//! [`DependencyRecord`]s. Records are created at registration time and
//! never mutated or removed; registering the same identity twice is an
//! error, checked race-free under the registry's lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use wireup_support::rendering::suggest_similar;

use crate::constructor::{CastFn, ConstructorSpec, InstanceDisposer, SharedInstance, TypePlan};
use crate::error::{AlreadyRegisteredError, Result, WireupError};
use crate::key::DependencyKey;
use crate::lifetime::Lifetime;

/// One registered mapping from a contract to a resolving type.
///
/// A record pairs the contract identity callers request with the
/// resolving identity under which instances are cached, the lifetime,
/// and the resolving type's declared constructors. Two records that
/// resolve to the same (type, name) share one cache entry.
pub struct DependencyRecord {
    contract: DependencyKey,
    resolving: DependencyKey,
    lifetime: Lifetime,
    constructors: Vec<ConstructorSpec>,
    /// Present when contract and resolving types differ; maps the erased
    /// resolving instance to the erased contract view.
    cast: Option<CastFn>,
    disposer: Option<InstanceDisposer>,
}

impl DependencyRecord {
    /// A record whose contract and resolving type are the same `T`.
    pub fn define<T: Send + Sync + 'static>(
        lifetime: Lifetime,
        configure: impl FnOnce(&mut TypePlan<T>),
    ) -> Self {
        Self::assemble(
            DependencyKey::of::<T>(),
            DependencyKey::of::<T>(),
            lifetime,
            None,
            configure,
        )
    }

    /// Same as [`define`](Self::define), under a registration name.
    pub fn define_named<T: Send + Sync + 'static>(
        name: &'static str,
        lifetime: Lifetime,
        configure: impl FnOnce(&mut TypePlan<T>),
    ) -> Self {
        Self::assemble(
            DependencyKey::named::<T>(name),
            DependencyKey::named::<T>(name),
            lifetime,
            None,
            configure,
        )
    }

    /// A record resolving contract `C` (typically `dyn Trait`) with the
    /// concrete type `T`. `cast` converts the shared concrete instance to
    /// the contract view, e.g. `|c| c as Arc<dyn Logger>`.
    ///
    /// Instances are cached under `T`'s identity, so several contracts
    /// resolved by the same `T` share one cached instance.
    pub fn define_as<C, T>(
        lifetime: Lifetime,
        cast: impl Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static,
        configure: impl FnOnce(&mut TypePlan<T>),
    ) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        Self::assemble(
            DependencyKey::of::<C>(),
            DependencyKey::of::<T>(),
            lifetime,
            Some(Self::erase_cast(cast)),
            configure,
        )
    }

    /// Same as [`define_as`](Self::define_as), under a registration name
    /// shared by both identity spaces.
    pub fn define_as_named<C, T>(
        name: &'static str,
        lifetime: Lifetime,
        cast: impl Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static,
        configure: impl FnOnce(&mut TypePlan<T>),
    ) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        Self::assemble(
            DependencyKey::named::<C>(name),
            DependencyKey::named::<T>(name),
            lifetime,
            Some(Self::erase_cast(cast)),
            configure,
        )
    }

    /// A singleton record wrapping a pre-built value.
    pub fn from_value<T: Send + Sync + 'static>(value: T) -> Self {
        let key = DependencyKey::of::<T>();
        let (constructors, disposer) = TypePlan::prebuilt(value).into_parts();
        Self {
            contract: key.clone(),
            resolving: key,
            lifetime: Lifetime::Singleton,
            constructors,
            cast: None,
            disposer,
        }
    }

    fn assemble<T: Send + Sync + 'static>(
        contract: DependencyKey,
        resolving: DependencyKey,
        lifetime: Lifetime,
        cast: Option<CastFn>,
        configure: impl FnOnce(&mut TypePlan<T>),
    ) -> Self {
        let mut plan = TypePlan::<T>::new();
        configure(&mut plan);
        let (constructors, disposer) = plan.into_parts();
        Self {
            contract,
            resolving,
            lifetime,
            constructors,
            cast,
            disposer,
        }
    }

    fn erase_cast<C, T>(cast: impl Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static) -> CastFn
    where
        C: ?Sized + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        Arc::new(move |instance: SharedInstance| {
            let concrete = instance.downcast::<T>().ok()?;
            let contract: Arc<C> = cast(concrete);
            Some(Arc::new(contract) as SharedInstance)
        })
    }

    pub(crate) fn contract(&self) -> &DependencyKey {
        &self.contract
    }

    /// The identity instances of this record are cached under.
    pub(crate) fn resolving(&self) -> &DependencyKey {
        &self.resolving
    }

    pub(crate) fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub(crate) fn constructors(&self) -> &[ConstructorSpec] {
        &self.constructors
    }

    pub(crate) fn cast(&self) -> Option<&CastFn> {
        self.cast.as_ref()
    }

    pub(crate) fn disposer(&self) -> Option<InstanceDisposer> {
        self.disposer.clone()
    }
}

impl fmt::Debug for DependencyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyRecord")
            .field("contract", &self.contract)
            .field("resolving", &self.resolving)
            .field("lifetime", &self.lifetime)
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

/// Stores all dependency records of one container.
///
/// Written during the build phase, read-heavy afterwards. Mutation is
/// double-checked: a shared-side presence check first, then a re-check
/// under the write lock, so duplicate detection is race-free without
/// penalizing the read path.
pub(crate) struct Registry {
    records: RwLock<HashMap<DependencyKey, Arc<DependencyRecord>>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a record keyed by its contract identity.
    ///
    /// # Errors
    /// Returns [`WireupError::AlreadyRegistered`] if the identity is
    /// already taken.
    pub(crate) fn add(&self, record: DependencyRecord) -> Result<()> {
        let key = record.contract().clone();

        // Presence check without the write lock; re-checked below.
        if self.records.read().contains_key(&key) {
            return Err(WireupError::AlreadyRegistered(AlreadyRegisteredError {
                key,
            }));
        }

        let mut records = self.records.write();
        if records.contains_key(&key) {
            return Err(WireupError::AlreadyRegistered(AlreadyRegisteredError {
                key,
            }));
        }

        debug!(key = %key, lifetime = %record.lifetime(), "registered dependency");
        records.insert(key, Arc::new(record));
        Ok(())
    }

    /// Looks up a record by contract identity.
    pub(crate) fn get(&self, key: &DependencyKey) -> Option<Arc<DependencyRecord>> {
        self.records.read().get(key).cloned()
    }

    /// Registered keys with names similar to the requested one, for
    /// "did you mean?" error output.
    pub(crate) fn suggestions(&self, requested: &DependencyKey) -> Vec<DependencyKey> {
        let records = self.records.read();
        let names: Vec<&str> = records.keys().map(|k| k.type_name()).collect();
        let picked = suggest_similar(requested.type_name(), &names, 3);

        records
            .keys()
            .filter(|key| *key != requested && picked.iter().any(|p| p == key.type_name()))
            .cloned()
            .collect()
    }

    /// All records, for build-time graph validation.
    pub(crate) fn snapshot(&self) -> Vec<Arc<DependencyRecord>> {
        self.records.read().values().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.read().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("registered", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Database;

    fn record(lifetime: Lifetime) -> DependencyRecord {
        DependencyRecord::define::<Database>(lifetime, |t| {
            t.constructor(vec![], |_| Ok(Database));
        })
    }

    #[test]
    fn register_and_get() {
        let registry = Registry::new();
        registry.add(record(Lifetime::Singleton)).unwrap();

        let fetched = registry.get(&DependencyKey::of::<Database>()).unwrap();
        assert_eq!(fetched.lifetime(), Lifetime::Singleton);
        assert_eq!(fetched.constructors().len(), 1);
    }

    #[test]
    fn duplicate_fails() {
        let registry = Registry::new();
        registry.add(record(Lifetime::Singleton)).unwrap();

        let err = registry.add(record(Lifetime::Transient)).unwrap_err();
        assert!(matches!(err, WireupError::AlreadyRegistered(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn named_and_unnamed_coexist() {
        let registry = Registry::new();
        registry.add(record(Lifetime::Singleton)).unwrap();
        registry
            .add(DependencyRecord::define_named::<Database>(
                "replica",
                Lifetime::Singleton,
                |t| {
                    t.constructor(vec![], |_| Ok(Database));
                },
            ))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get(&DependencyKey::named::<Database>("replica")).is_some());
    }

    #[test]
    fn contract_record_keeps_both_identities() {
        trait Storage: Send + Sync {}
        impl Storage for Database {}

        let record = DependencyRecord::define_as::<dyn Storage, Database>(
            Lifetime::Singleton,
            |db| db as Arc<dyn Storage>,
            |t| {
                t.constructor(vec![], |_| Ok(Database));
            },
        );

        assert_eq!(*record.contract(), DependencyKey::of::<dyn Storage>());
        assert_eq!(*record.resolving(), DependencyKey::of::<Database>());
        assert!(record.cast().is_some());
    }

    #[test]
    fn from_value_is_singleton() {
        let record = DependencyRecord::from_value(42u32);
        assert_eq!(record.lifetime(), Lifetime::Singleton);
        assert_eq!(record.constructors().len(), 1);
    }

    #[test]
    fn suggestions_find_similar_names() {
        struct UserService;

        let registry = Registry::new();
        registry
            .add(DependencyRecord::define::<UserService>(
                Lifetime::Transient,
                |t| {
                    t.constructor(vec![], |_| Ok(UserService));
                },
            ))
            .unwrap();

        // Same short name, different path — close enough to suggest.
        let suggestions = registry.suggestions(&DependencyKey::of::<Database>());
        assert!(suggestions.is_empty() || suggestions[0].type_name().contains("UserService"));

        let close = registry.suggestions(&DependencyKey::named::<UserService>("x"));
        assert_eq!(close.len(), 1);
    }

    #[test]
    fn snapshot_returns_all_records() {
        let registry = Registry::new();
        registry.add(record(Lifetime::Singleton)).unwrap();
        registry
            .add(DependencyRecord::from_value(String::from("cfg")))
            .unwrap();

        assert_eq!(registry.snapshot().len(), 2);
    }
}
