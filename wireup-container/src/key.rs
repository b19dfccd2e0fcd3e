//! Dependency identification keys.
//!
//! [`DependencyKey`] uniquely identifies a dependency within the container.
//! It combines a [`TypeId`] with an optional name for keyed bindings.
//!
//! The same structure serves two identity spaces: the registry maps
//! (contract type, name) to a record, and the instance caches map
//! (resolving type, name) to a live instance.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Uniquely identifies a dependency in the container.
///
/// Each dependency is identified by its Rust type ([`TypeId`]) and an
/// optional name for cases where multiple registrations of the same type
/// must coexist.
///
/// # Examples
/// ```
/// use wireup_container::key::DependencyKey;
///
/// // Simple key — just a type
/// let key = DependencyKey::of::<String>();
/// assert_eq!(key.type_name(), "alloc::string::String");
/// assert_eq!(key.name(), None);
///
/// // Named key — type + name
/// let key = DependencyKey::named::<String>("database_url");
/// assert_eq!(key.name(), Some("database_url"));
/// ```
#[derive(Clone)]
pub struct DependencyKey {
    type_id: TypeId,
    type_name: &'static str,
    name: Option<&'static str>,
}

impl DependencyKey {
    /// Creates a key for type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            name: None,
        }
    }

    /// Creates a named key for type `T`.
    ///
    /// Named keys disambiguate multiple registrations of the same type.
    ///
    /// # Examples
    /// ```
    /// use wireup_container::key::DependencyKey;
    ///
    /// let primary = DependencyKey::named::<String>("primary_db");
    /// let replica = DependencyKey::named::<String>("replica_db");
    /// assert_ne!(primary, replica);
    /// ```
    #[inline]
    pub fn named<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            name: Some(name),
        }
    }

    /// Returns the [`TypeId`] of this dependency.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the human-readable type name.
    ///
    /// Used in error messages.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the optional name for keyed bindings.
    #[inline]
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }
}

// Two keys are equal when both the TypeId and the name match.
impl PartialEq for DependencyKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.name == other.name
    }
}

impl Eq for DependencyKey {}

impl Hash for DependencyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Debug for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "DependencyKey({}, name={:?})", self.type_name, name),
            None => write!(f, "DependencyKey({})", self.type_name),
        }
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "{} (name={:?})", self.type_name, name),
            None => write!(f, "{}", self.type_name),
        }
    }
}
