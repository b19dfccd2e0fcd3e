//! Constructor metadata and selection.
//!
//! Wireup records constructor shape at registration time instead of
//! reflecting over types at runtime: each [`TypePlan`] collects one
//! [`ConstructorSpec`] per constructor, declaring its parameter keys in
//! order, an optional "preferred" marker, and a build closure.
//!
//! Selection mirrors classic constructor injection: a single preferred
//! constructor wins outright, otherwise the constructor with the most
//! parameters does. Explicit-parameter resolution selects by exact arity.

use std::any::{Any, type_name};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::cache::Dispose;
use crate::error::{ArityMismatchError, NoConstructorError, Result, WireupError};
use crate::key::DependencyKey;

/// Type-erased instance shared between the caches and the engine.
pub(crate) type SharedInstance = Arc<dyn Any + Send + Sync>;

/// Build closure of one constructor. Receives the resolved arguments in
/// declaration order and returns the erased instance.
pub(crate) type BuildFn =
    Arc<dyn Fn(&mut ResolvedArguments) -> Result<SharedInstance> + Send + Sync>;

/// Disposal hook invoked by an instance cache on the instances it holds.
pub(crate) type InstanceDisposer = Arc<dyn Fn(&(dyn Any + Send + Sync)) + Send + Sync>;

/// Cast from the erased resolving type to the erased contract type.
pub(crate) type CastFn = Arc<dyn Fn(SharedInstance) -> Option<SharedInstance> + Send + Sync>;

/// One declared constructor of a resolving type.
pub(crate) struct ConstructorSpec {
    /// Parameter identities, left to right.
    pub(crate) params: Vec<DependencyKey>,
    /// Marks this constructor as the preferred injection target.
    pub(crate) preferred: bool,
    pub(crate) build: BuildFn,
}

impl ConstructorSpec {
    #[inline]
    pub(crate) fn arity(&self) -> usize {
        self.params.len()
    }

    pub(crate) fn build(&self, args: &mut ResolvedArguments) -> Result<SharedInstance> {
        (self.build)(args)
    }

    /// Spec for a pre-built instance: zero parameters, hands out the same
    /// erased value on every call.
    pub(crate) fn prebuilt(instance: SharedInstance) -> Self {
        Self {
            params: Vec::new(),
            preferred: false,
            build: Arc::new(move |_| Ok(instance.clone())),
        }
    }
}

impl std::fmt::Debug for ConstructorSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstructorSpec")
            .field("params", &self.params)
            .field("preferred", &self.preferred)
            .finish()
    }
}

/// Selects the constructor used for automatic resolution.
///
/// A single preferred constructor is selected outright, regardless of its
/// parameter count. Otherwise the constructor with the greatest parameter
/// count wins, ties broken by declaration order (first wins). When more
/// than one constructor is marked preferred the marks cancel out and the
/// parameter-count rule applies.
pub(crate) fn select<'a>(
    specs: &'a [ConstructorSpec],
    key: &DependencyKey,
) -> Result<&'a ConstructorSpec> {
    let Some(first) = specs.first() else {
        return Err(WireupError::NoConstructor(NoConstructorError {
            key: key.clone(),
        }));
    };

    let mut marked = specs.iter().filter(|c| c.preferred);
    if let (Some(only), None) = (marked.next(), marked.next()) {
        return Ok(only);
    }

    let mut best = first;
    for candidate in &specs[1..] {
        if candidate.arity() > best.arity() {
            best = candidate;
        }
    }
    Ok(best)
}

/// Selects the constructor for explicit-parameter resolution.
///
/// Candidates are the constructors whose parameter count equals `count`.
/// Among them a preferred constructor wins, else the last declared one.
pub(crate) fn select_arity<'a>(
    specs: &'a [ConstructorSpec],
    count: usize,
    key: &DependencyKey,
) -> Result<&'a ConstructorSpec> {
    let mut marked = None;
    let mut last = None;
    for candidate in specs.iter().filter(|c| c.arity() == count) {
        if candidate.preferred && marked.is_none() {
            marked = Some(candidate);
        }
        last = Some(candidate);
    }

    marked.or(last).ok_or_else(|| {
        WireupError::ArityMismatch(ArityMismatchError {
            key: key.clone(),
            requested: count,
            available: specs.iter().map(ConstructorSpec::arity).collect(),
        })
    })
}

/// The resolved argument list handed to a build closure.
///
/// Arguments arrive in the constructor's declared parameter order and are
/// consumed front to back with [`take`](ResolvedArguments::take) /
/// [`take_trait`](ResolvedArguments::take_trait).
pub struct ResolvedArguments {
    values: std::vec::IntoIter<SharedInstance>,
}

impl ResolvedArguments {
    pub(crate) fn new(values: Vec<SharedInstance>) -> Self {
        Self {
            values: values.into_iter(),
        }
    }

    /// Takes the next argument as a concrete type.
    pub fn take<T: Send + Sync + 'static>(&mut self) -> Result<Arc<T>> {
        let value = self.next_value::<T>()?;
        value
            .downcast::<T>()
            .map_err(|_| WireupError::TypeMismatch {
                key: DependencyKey::of::<T>(),
                expected: type_name::<T>(),
            })
    }

    /// Takes the next argument as a trait object (`Arc<dyn Trait>`).
    pub fn take_trait<T: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<T>> {
        let value = self.next_value::<T>()?;
        value
            .downcast::<Arc<T>>()
            .map(|outer| (*outer).clone())
            .map_err(|_| WireupError::TypeMismatch {
                key: DependencyKey::of::<T>(),
                expected: type_name::<T>(),
            })
    }

    fn next_value<T: ?Sized>(&mut self) -> Result<SharedInstance> {
        self.values.next().ok_or(WireupError::MissingArgument {
            expected: type_name::<T>(),
        })
    }
}

/// Caller-supplied parameter values for explicit-parameter resolution.
///
/// # Examples
/// ```
/// use wireup_container::constructor::Arguments;
///
/// let args = Arguments::new()
///     .with(String::from("postgres://localhost"))
///     .with(5432u16);
/// assert_eq!(args.len(), 2);
/// ```
#[derive(Default)]
pub struct Arguments {
    values: Vec<SharedInstance>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a concrete value.
    pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.values.push(Arc::new(value));
        self
    }

    /// Appends an already-shared value without re-wrapping it.
    pub fn with_arc<T: Send + Sync + 'static>(mut self, value: Arc<T>) -> Self {
        self.values.push(value);
        self
    }

    /// Appends a trait object.
    pub fn with_trait<T: ?Sized + Send + Sync + 'static>(mut self, value: Arc<T>) -> Self {
        self.values.push(Arc::new(value));
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn into_resolved(self) -> ResolvedArguments {
        ResolvedArguments::new(self.values)
    }
}

/// Declares the constructors (and disposal behavior) of a resolving type.
///
/// Passed to the registration methods of `ContainerBuilder`:
///
/// ```rust,ignore
/// builder.transient::<UserService>(|t| {
///     t.constructor(vec![DependencyKey::of::<Database>()], |args| {
///         let db = args.take::<Database>()?;
///         Ok(UserService { db })
///     });
/// })
/// ```
pub struct TypePlan<T> {
    specs: Vec<ConstructorSpec>,
    disposer: Option<InstanceDisposer>,
    _type: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> TypePlan<T> {
    pub(crate) fn new() -> Self {
        Self {
            specs: Vec::new(),
            disposer: None,
            _type: PhantomData,
        }
    }

    pub(crate) fn prebuilt(value: T) -> Self {
        let mut plan = Self::new();
        plan.specs
            .push(ConstructorSpec::prebuilt(Arc::new(value) as SharedInstance));
        plan
    }

    /// Declares a constructor with the given parameter keys.
    ///
    /// `build` receives the resolved parameter values in declaration
    /// order. Use [`DependencyKey::named`] for a parameter that must
    /// resolve under a non-default name.
    pub fn constructor(
        &mut self,
        params: Vec<DependencyKey>,
        build: impl Fn(&mut ResolvedArguments) -> Result<T> + Send + Sync + 'static,
    ) -> &mut Self {
        self.push(params, build, false)
    }

    /// Declares a constructor and marks it as the preferred injection
    /// target, selected regardless of parameter count.
    pub fn preferred_constructor(
        &mut self,
        params: Vec<DependencyKey>,
        build: impl Fn(&mut ResolvedArguments) -> Result<T> + Send + Sync + 'static,
    ) -> &mut Self {
        self.push(params, build, true)
    }

    /// Registers the type's [`Dispose`] impl as the cache disposal hook.
    ///
    /// Cached instances of `T` are disposed when their owning cache is
    /// disposed. Transient instances are never cached, so their cleanup
    /// stays with the caller.
    pub fn disposable(&mut self) -> &mut Self
    where
        T: Dispose,
    {
        self.disposer = Some(Arc::new(|instance| {
            if let Some(value) = instance.downcast_ref::<T>() {
                value.dispose();
            }
        }));
        self
    }

    fn push(
        &mut self,
        params: Vec<DependencyKey>,
        build: impl Fn(&mut ResolvedArguments) -> Result<T> + Send + Sync + 'static,
        preferred: bool,
    ) -> &mut Self {
        let build: BuildFn = Arc::new(move |args| Ok(Arc::new(build(args)?) as SharedInstance));
        self.specs.push(ConstructorSpec {
            params,
            preferred,
            build,
        });
        self
    }

    pub(crate) fn into_parts(self) -> (Vec<ConstructorSpec>, Option<InstanceDisposer>) {
        (self.specs, self.disposer)
    }
}
