//! Error types for Wireup container operations.
//!
//! Every failure surfaces through the single [`WireupError`] enum with a
//! descriptive payload, grouped into registration, resolution, scope
//! protocol, and construction kinds.

use crate::key::DependencyKey;
use std::fmt;

use wireup_support::rendering::{render_chain, shorten_type_name};

/// Main error type for all Wireup operations.
#[derive(Debug, thiserror::Error)]
pub enum WireupError {
    /// Requested dependency was never registered.
    #[error("{}", .0)]
    NotRegistered(NotRegisteredError),

    /// A dependency was already registered under the same (type, name).
    #[error("{}", .0)]
    AlreadyRegistered(AlreadyRegisteredError),

    /// `build()` was called on a builder with zero registrations.
    #[error("container has no registrations. Register at least one dependency before calling .build()")]
    EmptyContainer,

    /// The resolving type declares no constructors.
    #[error("{}", .0)]
    NoConstructor(NoConstructorError),

    /// No constructor matches the supplied parameter count.
    #[error("{}", .0)]
    ArityMismatch(ArityMismatchError),

    /// A resolved instance could not be downcast to the requested type.
    #[error("type mismatch for {key}: the resolved instance is not a {expected}")]
    TypeMismatch {
        key: DependencyKey,
        expected: &'static str,
    },

    /// A constructor consumed more arguments than were supplied.
    #[error("constructor argument list exhausted: expected another argument of type {expected}")]
    MissingArgument { expected: &'static str },

    /// Circular dependency detected in the declared constructor graph.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// Scope attachment protocol violated.
    #[error("scope protocol violation: {reason}")]
    ScopeProtocol { reason: &'static str },

    /// A constructor failed, or a nested resolution failed underneath it.
    #[error("failed to construct {key}: {source}")]
    ConstructionFailed {
        key: DependencyKey,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Error when a dependency was not registered.
///
/// Includes helpful hints about what went wrong.
#[derive(Debug)]
pub struct NotRegisteredError {
    /// The dependency that was requested
    pub requested: DependencyKey,
    /// What required this dependency (if known)
    pub required_by: Option<DependencyKey>,
    /// Similar keys that ARE registered, for "did you mean?" suggestions
    pub suggestions: Vec<DependencyKey>,
}

impl fmt::Display for NotRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dependency not registered: {}", self.requested)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: did you forget to register {}?",
            shorten_type_name(self.requested.type_name())
        )
    }
}

/// Error when registering a dependency whose (type, name) already exists.
#[derive(Debug)]
pub struct AlreadyRegisteredError {
    pub key: DependencyKey,
}

impl fmt::Display for AlreadyRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dependency already registered: {}", self.key)?;
        write!(
            f,
            "\n  Hint: each (type, name) pair may be registered only once"
        )
    }
}

/// Error when a registration declares no constructors at all.
#[derive(Debug)]
pub struct NoConstructorError {
    pub key: DependencyKey,
}

impl fmt::Display for NoConstructorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no constructor available for {}", self.key)?;
        write!(
            f,
            "\n  Hint: declare at least one constructor when registering {}",
            shorten_type_name(self.key.type_name())
        )
    }
}

/// Error when no constructor matches an explicit parameter count.
#[derive(Debug)]
pub struct ArityMismatchError {
    pub key: DependencyKey,
    /// The parameter count the caller supplied
    pub requested: usize,
    /// The parameter counts of the declared constructors
    pub available: Vec<usize>,
}

impl fmt::Display for ArityMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no constructor of {} accepts {} parameter(s)",
            self.key, self.requested
        )?;
        if self.available.is_empty() {
            write!(f, "\n  No constructors are declared for this registration")
        } else {
            write!(
                f,
                "\n  Declared constructors accept: {:?}",
                self.available
            )
        }
    }
}

/// Error when a circular dependency is detected at build time.
///
/// Shows the full dependency chain so you can see WHERE the cycle is.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// The chain of dependencies that forms the cycle.
    /// Example: ["A", "B", "C", "A"]
    pub chain: Vec<DependencyKey>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "circular dependency detected:\n  ")?;
        write!(f, "{}", render_chain(&self.chain))?;
        write!(
            f,
            "\n  Hint: break the cycle by restructuring one of these registrations"
        )
    }
}

/// Convenient Result type for Wireup operations.
pub type Result<T> = std::result::Result<T, WireupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_registered_error_display() {
        let err = WireupError::NotRegistered(NotRegisteredError {
            requested: DependencyKey::of::<String>(),
            required_by: Some(DependencyKey::of::<Vec<u8>>()),
            suggestions: vec![],
        });

        let msg = format!("{err}");
        assert!(msg.contains("not registered"));
        assert!(msg.contains("String"));
        assert!(msg.contains("Required by"));
    }

    #[test]
    fn not_registered_lists_suggestions() {
        let err = NotRegisteredError {
            requested: DependencyKey::of::<String>(),
            required_by: None,
            suggestions: vec![DependencyKey::named::<String>("primary")],
        };

        let msg = format!("{err}");
        assert!(msg.contains("Did you mean"));
        assert!(msg.contains("primary"));
    }

    #[test]
    fn circular_dependency_error_display() {
        let err = WireupError::CircularDependency(CircularDependencyError {
            chain: vec![
                DependencyKey::of::<String>(),
                DependencyKey::of::<i32>(),
                DependencyKey::of::<String>(),
            ],
        });

        let msg = format!("{err}");
        assert!(msg.contains("circular"));
        assert!(msg.contains("→"));
    }

    #[test]
    fn arity_mismatch_display() {
        let err = WireupError::ArityMismatch(ArityMismatchError {
            key: DependencyKey::of::<String>(),
            requested: 3,
            available: vec![0, 2],
        });

        let msg = format!("{err}");
        assert!(msg.contains("3 parameter"));
        assert!(msg.contains("[0, 2]"));
    }

    #[test]
    fn construction_failed_chains_source() {
        let inner = WireupError::NotRegistered(NotRegisteredError {
            requested: DependencyKey::of::<i32>(),
            required_by: Some(DependencyKey::of::<String>()),
            suggestions: vec![],
        });
        let err = WireupError::ConstructionFailed {
            key: DependencyKey::of::<String>(),
            source: Box::new(inner),
        };

        let msg = format!("{err}");
        assert!(msg.contains("failed to construct"));
        assert!(msg.contains("i32"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
