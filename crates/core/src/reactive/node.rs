use async_trait::async_trait;
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::errors::CoreError;

/// Type-erased node value. Shared, never mutated once produced.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Identity of a node within one [`ReactiveGraph`](super::graph::ReactiveGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// A typed handle to a node producing values of type `T`.
pub trait Reactive<T> {
    fn id(&self) -> NodeId;
}

/// Handle to an input node, settable from UI events.
#[derive(Debug)]
pub struct Source<T> {
    pub(crate) id: NodeId,
    pub(crate) _marker: PhantomData<fn() -> T>,
}

/// Handle to a memoized calculation.
#[derive(Debug)]
pub struct Calc<T> {
    pub(crate) id: NodeId,
    pub(crate) _marker: PhantomData<fn() -> T>,
}

// Manual impls: handles are copyable regardless of `T`.
impl<T> Clone for Source<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Source<T> {}

impl<T> Clone for Calc<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Calc<T> {}

impl<T> Reactive<T> for Source<T> {
    fn id(&self) -> NodeId {
        self.id
    }
}

impl<T> Reactive<T> for Calc<T> {
    fn id(&self) -> NodeId {
        self.id
    }
}

struct DepValue {
    id: NodeId,
    name: String,
    value: Value,
}

/// Current values of a calculation's declared dependencies, fixed for the
/// duration of one evaluation.
pub struct Deps {
    calc: String,
    values: Vec<DepValue>,
}

impl Deps {
    pub(crate) fn new(calc: String) -> Self {
        Self {
            calc,
            values: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, id: NodeId, name: String, value: Value) {
        self.values.push(DepValue { id, name, value });
    }

    /// Borrow the value of a declared dependency.
    pub fn get<T: Any + Send + Sync>(&self, node: &impl Reactive<T>) -> Result<&T, CoreError> {
        let dep = self.find(node.id())?;
        (*dep.value)
            .downcast_ref::<T>()
            .ok_or_else(|| CoreError::TypeMismatch {
                node: dep.name.clone(),
                expected: std::any::type_name::<T>(),
            })
    }

    fn find(&self, id: NodeId) -> Result<&DepValue, CoreError> {
        self.values
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| CoreError::UndeclaredDependency {
                calc: self.calc.clone(),
                dependency: format!("#{}", id.0),
            })
    }
}

/// A calculation over declared dependencies. Implement this directly for
/// calculations that suspend on I/O; use
/// [`ReactiveGraph::calc`](super::graph::ReactiveGraph::calc) for plain closures.
#[async_trait]
pub trait Calculation: Send + Sync + 'static {
    type Output: Any + Send + Sync;

    async fn evaluate(&self, deps: &Deps) -> Result<Self::Output, CoreError>;
}

/// Adapter turning a synchronous closure into a [`Calculation`].
pub struct FnCalc<F, T> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

impl<F, T> FnCalc<F, T> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, T> Calculation for FnCalc<F, T>
where
    F: Fn(&Deps) -> Result<T, CoreError> + Send + Sync + 'static,
    T: Any + Send + Sync,
{
    type Output = T;

    async fn evaluate(&self, deps: &Deps) -> Result<T, CoreError> {
        (self.f)(deps)
    }
}

/// Object-safe form of [`Calculation`] stored inside the graph.
#[async_trait]
pub(crate) trait ErasedCalculation: Send + Sync {
    async fn evaluate_erased(&self, deps: &Deps) -> Result<Value, CoreError>;
}

#[async_trait]
impl<C: Calculation> ErasedCalculation for C {
    async fn evaluate_erased(&self, deps: &Deps) -> Result<Value, CoreError> {
        let out = self.evaluate(deps).await?;
        Ok(Arc::new(out) as Value)
    }
}
