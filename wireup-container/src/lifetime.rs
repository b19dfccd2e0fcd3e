//! Dependency lifetimes.
//!
//! Lifetimes determine how long a resolved instance lives:
//! - [`Lifetime::Singleton`] — one instance for the owning container
//! - [`Lifetime::Scoped`] — one instance per scope (e.g., HTTP request)
//! - [`Lifetime::Transient`] — new instance on every resolve

use std::fmt;

/// Defines the lifetime of a dependency within the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// One instance shared across the owning container.
    ///
    /// Created on first resolve, cached in the container-wide cache,
    /// lives until the container is disposed.
    ///
    /// # When to use
    /// - Database connection pools
    /// - Configuration objects
    /// - Shared caches
    Singleton,

    /// One instance per scope.
    ///
    /// Created on first resolve within a scope and cached in that scope's
    /// cache. Resolved outside any scope, a Scoped dependency falls back to
    /// the container-wide cache and behaves like a Singleton.
    ///
    /// # When to use
    /// - Per-request database transactions
    /// - User session data
    /// - Request-specific services
    Scoped,

    /// New instance created on every resolve call.
    ///
    /// Never cached. Ownership of each instance passes to the caller.
    ///
    /// # When to use
    /// - Lightweight stateless services
    /// - Command/query handlers
    /// - Objects with mutable state that shouldn't be shared
    Transient,
}

impl Lifetime {
    /// Returns `true` if this lifetime caches instances.
    ///
    /// Singleton and Scoped both cache; Transient does not.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, Lifetime::Singleton | Lifetime::Scoped)
    }

    /// Returns `true` if this lifetime spans the whole container.
    #[inline]
    pub fn is_singleton(&self) -> bool {
        matches!(self, Lifetime::Singleton)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Singleton => write!(f, "Singleton"),
            Lifetime::Scoped => write!(f, "Scoped"),
            Lifetime::Transient => write!(f, "Transient"),
        }
    }
}
