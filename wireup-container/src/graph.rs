//! Dependency graph validation.
//!
//! Validates the declared constructor graph at build time: the parameters
//! of each registration's auto-selected constructor form the edges, and a
//! cycle among them is rejected before the first `resolve()` call ever
//! runs. Parameters that are not registered are left alone here — they
//! surface at resolution time as `NotRegistered` — and so are
//! registrations whose constructor selection fails.
//!
//! Only the declared graph is guarded. A build closure that resolves keys
//! it did not declare can still recurse unboundedly at resolution time;
//! such a cycle ends in stack exhaustion, not an error.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument, warn};

use crate::error::{CircularDependencyError, WireupError};
use crate::key::DependencyKey;

/// One node of the declared dependency graph.
#[derive(Debug, Clone)]
pub(crate) struct DependencyInfo {
    /// The registration's contract identity.
    pub key: DependencyKey,
    /// Parameter identities of the auto-selected constructor.
    pub dependencies: Vec<DependencyKey>,
}

/// Validates the declared dependency graph for cycles.
///
/// # Algorithm
/// Depth-first search with a "currently visiting" set; revisiting a key
/// on the active path is a cycle, and the path is reported in the error.
pub(crate) struct GraphValidator {
    dependencies: HashMap<DependencyKey, DependencyInfo>,
    visiting: HashSet<DependencyKey>,
    validated: HashSet<DependencyKey>,
    path: Vec<DependencyKey>,
}

impl GraphValidator {
    pub(crate) fn new(dependencies: HashMap<DependencyKey, DependencyInfo>) -> Self {
        Self {
            dependencies,
            visiting: HashSet::new(),
            validated: HashSet::new(),
            path: Vec::new(),
        }
    }

    /// Validates the entire graph.
    ///
    /// # Errors
    /// [`WireupError::CircularDependency`] when a declared cycle exists.
    #[instrument(skip(self), name = "graph_validation")]
    pub(crate) fn validate(&mut self) -> Result<(), WireupError> {
        let keys: Vec<DependencyKey> = self.dependencies.values().map(|info| info.key.clone()).collect();

        debug!(dependency_count = keys.len(), "validating dependency graph");

        for key in keys {
            if !self.validated.contains(&key) {
                self.validate_key(&key)?;
            }
        }

        debug!("dependency graph validation passed");
        Ok(())
    }

    fn validate_key(&mut self, key: &DependencyKey) -> Result<(), WireupError> {
        if self.validated.contains(key) {
            return Ok(());
        }

        // Revisited while still on the active path: cycle.
        if self.visiting.contains(key) {
            let cycle_start = self.path.iter().position(|k| k == key).unwrap_or(0);
            let mut chain: Vec<DependencyKey> = self.path[cycle_start..].to_vec();
            chain.push(key.clone());

            warn!(cycle = ?chain, "circular dependency detected");

            return Err(WireupError::CircularDependency(CircularDependencyError {
                chain,
            }));
        }

        // Unregistered keys are leaves here; resolution reports them.
        let Some(info) = self.dependencies.get(key).cloned() else {
            self.validated.insert(key.clone());
            return Ok(());
        };

        self.visiting.insert(key.clone());
        self.path.push(key.clone());

        for dep_key in &info.dependencies {
            self.validate_key(dep_key)?;
        }

        self.path.pop();
        self.visiting.remove(key);
        self.validated.insert(key.clone());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep_info(key: DependencyKey, deps: Vec<DependencyKey>) -> DependencyInfo {
        DependencyInfo {
            key,
            dependencies: deps,
        }
    }

    fn make_graph(infos: Vec<DependencyInfo>) -> HashMap<DependencyKey, DependencyInfo> {
        infos.into_iter().map(|i| (i.key.clone(), i)).collect()
    }

    struct Database;
    struct UserRepo;
    struct UserService;

    #[test]
    fn valid_simple_graph() {
        let graph = make_graph(vec![
            dep_info(DependencyKey::of::<Database>(), vec![]),
            dep_info(
                DependencyKey::of::<UserRepo>(),
                vec![DependencyKey::of::<Database>()],
            ),
            dep_info(
                DependencyKey::of::<UserService>(),
                vec![DependencyKey::of::<UserRepo>()],
            ),
        ]);

        let mut validator = GraphValidator::new(graph);
        assert!(validator.validate().is_ok());
    }

    #[test]
    fn detect_circular_dependency() {
        // A → B → C → A
        struct A;
        struct B;
        struct C;

        let graph = make_graph(vec![
            dep_info(DependencyKey::of::<A>(), vec![DependencyKey::of::<B>()]),
            dep_info(DependencyKey::of::<B>(), vec![DependencyKey::of::<C>()]),
            dep_info(DependencyKey::of::<C>(), vec![DependencyKey::of::<A>()]),
        ]);

        let mut validator = GraphValidator::new(graph);
        let result = validator.validate();

        assert!(result.is_err());
        match result.unwrap_err() {
            WireupError::CircularDependency(err) => {
                assert!(err.chain.len() >= 3);
                assert_eq!(err.chain.first(), err.chain.last());
            }
            other => panic!("expected CircularDependency, got: {other:?}"),
        }
    }

    #[test]
    fn detect_self_dependency() {
        struct A;

        let graph = make_graph(vec![dep_info(
            DependencyKey::of::<A>(),
            vec![DependencyKey::of::<A>()],
        )]);

        let mut validator = GraphValidator::new(graph);
        assert!(validator.validate().is_err());
    }

    #[test]
    fn missing_dependency_is_not_a_build_error() {
        struct A;
        struct B;

        // A → B, B not registered. Resolution reports that, not build.
        let graph = make_graph(vec![dep_info(
            DependencyKey::of::<A>(),
            vec![DependencyKey::of::<B>()],
        )]);

        let mut validator = GraphValidator::new(graph);
        assert!(validator.validate().is_ok());
    }

    #[test]
    fn diamond_dependency_ok() {
        //     A
        //    / \
        //   B   C
        //    \ /
        //     D
        struct A;
        struct B;
        struct C;
        struct D;

        let graph = make_graph(vec![
            dep_info(DependencyKey::of::<D>(), vec![]),
            dep_info(DependencyKey::of::<B>(), vec![DependencyKey::of::<D>()]),
            dep_info(DependencyKey::of::<C>(), vec![DependencyKey::of::<D>()]),
            dep_info(
                DependencyKey::of::<A>(),
                vec![DependencyKey::of::<B>(), DependencyKey::of::<C>()],
            ),
        ]);

        let mut validator = GraphValidator::new(graph);
        assert!(validator.validate().is_ok());
    }

    #[test]
    fn named_keys_are_distinct_nodes() {
        struct A;

        // A depends on A(name="inner") — not a self-cycle.
        let graph = make_graph(vec![
            dep_info(
                DependencyKey::of::<A>(),
                vec![DependencyKey::named::<A>("inner")],
            ),
            dep_info(DependencyKey::named::<A>("inner"), vec![]),
        ]);

        let mut validator = GraphValidator::new(graph);
        assert!(validator.validate().is_ok());
    }
}
