//! Provider trait — a module of related dependency registrations.
//!
//! Providers group related dependencies together so that a large
//! application can split its registrations by domain instead of piling
//! everything into one builder chain.
//!
//! # Examples
//! ```rust,ignore
//! struct DatabaseProvider;
//!
//! impl Provider for DatabaseProvider {
//!     fn register(&self, registry: &mut dyn ProviderRegistry) {
//!         registry.register_record(DependencyRecord::define::<Database>(
//!             Lifetime::Singleton,
//!             |t| {
//!                 t.constructor(vec![], |_| Database::connect("postgres://localhost"));
//!             },
//!         ));
//!     }
//! }
//! ```

use crate::registry::DependencyRecord;

/// A module that registers related dependencies into a container.
///
/// Implement this trait to group related services together, then hand the
/// module to `ContainerBuilder::add_provider`:
///
/// ```rust,ignore
/// let container = Container::builder()
///     .add_provider(&DatabaseProvider)
///     .add_provider(&AuthProvider)
///     .build()?;
/// ```
pub trait Provider: Send + Sync {
    /// Registers dependencies into the container builder.
    ///
    /// Called once during container construction.
    fn register(&self, registry: &mut dyn ProviderRegistry);

    /// Human-readable name for log output.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Interface providers use to register dependencies.
///
/// A subset of the builder's API, exposed as a trait object so provider
/// modules can be tested without a full container.
pub trait ProviderRegistry {
    /// Registers a fully assembled dependency record.
    fn register_record(&mut self, record: DependencyRecord);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifetime::Lifetime;

    // Mock registry for testing providers in isolation
    struct MockRegistry {
        records: Vec<DependencyRecord>,
    }

    impl ProviderRegistry for MockRegistry {
        fn register_record(&mut self, record: DependencyRecord) {
            self.records.push(record);
        }
    }

    struct Queue;

    struct MessagingProvider;

    impl Provider for MessagingProvider {
        fn register(&self, registry: &mut dyn ProviderRegistry) {
            registry.register_record(DependencyRecord::define::<Queue>(
                Lifetime::Singleton,
                |t| {
                    t.constructor(vec![], |_| Ok(Queue));
                },
            ));
            registry.register_record(DependencyRecord::from_value(64usize));
        }
    }

    #[test]
    fn provider_registers_records() {
        let mut registry = MockRegistry { records: vec![] };
        MessagingProvider.register(&mut registry);

        assert_eq!(registry.records.len(), 2);
        assert_eq!(registry.records[0].lifetime(), Lifetime::Singleton);
    }

    #[test]
    fn provider_has_name() {
        assert!(MessagingProvider.name().contains("MessagingProvider"));
    }
}
