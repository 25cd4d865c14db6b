use std::any::{Any, TypeId};
use std::collections::{HashSet, VecDeque};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::errors::CoreError;
use super::node::{Calc, Calculation, Deps, ErasedCalculation, FnCalc, NodeId, Reactive, Source, Value};

enum NodeKind {
    Source,
    Calc {
        deps: Vec<NodeId>,
        calc: Box<dyn ErasedCalculation>,
    },
}

enum Memo {
    /// Never evaluated.
    Empty,
    /// An upstream source changed since the last evaluation.
    Stale,
    Fresh(Result<Value, CoreError>),
}

struct Node {
    name: String,
    type_id: TypeId,
    type_name: &'static str,
    kind: NodeKind,
    dependents: Vec<NodeId>,
    memo: Memo,
    /// Bumped every time the node gets a new value (or error).
    version: u64,
    /// Number of times the calculation function actually ran.
    evaluations: u64,
}

impl Node {
    fn deps(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Source => &[],
            NodeKind::Calc { deps, .. } => deps,
        }
    }

    fn is_fresh(&self) -> bool {
        matches!(self.memo, Memo::Fresh(_))
    }
}

/// Explicit dependency graph of sources and memoized calculations.
///
/// - Dependencies are declared when a calculation is added and must already
///   exist, so the graph is acyclic by construction.
/// - Setting a source marks exactly the calculations reachable from it as
///   stale; nothing else is touched.
/// - Reading a calculation evaluates its stale ancestors first, in dependency
///   order, each at most once. Siblings therefore share one fresh value.
/// - A failed calculation memoizes its error. Dependents inherit that error
///   without running.
///
/// Evaluation takes `&mut self`, so no source can change while a read is in
/// progress, including while an async calculation is suspended.
#[derive(Default)]
pub struct ReactiveGraph {
    nodes: Vec<Node>,
}

impl std::fmt::Debug for ReactiveGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveGraph")
            .field("nodes", &self.nodes.iter().map(|n| n.name.as_str()).collect::<Vec<_>>())
            .field("stale", &self.nodes.iter().filter(|n| !n.is_fresh()).count())
            .finish()
    }
}

impl ReactiveGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Construction ────────────────────────────────────────────────

    /// Add an input node holding `initial`.
    pub fn source<T: Any + Send + Sync>(&mut self, name: impl Into<String>, initial: T) -> Source<T> {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.into(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            kind: NodeKind::Source,
            dependents: Vec::new(),
            memo: Memo::Fresh(Ok(Arc::new(initial) as Value)),
            version: 1,
            evaluations: 0,
        });
        Source {
            id,
            _marker: PhantomData,
        }
    }

    /// Add a calculation backed by a synchronous closure.
    pub fn calc<T, F>(
        &mut self,
        name: impl Into<String>,
        deps: &[NodeId],
        f: F,
    ) -> Result<Calc<T>, CoreError>
    where
        T: Any + Send + Sync,
        F: Fn(&Deps) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        self.calculation(name, deps, FnCalc::new(f))
    }

    /// Add a calculation. Evaluation is lazy: nothing runs until the node is read.
    pub fn calculation<C: Calculation>(
        &mut self,
        name: impl Into<String>,
        deps: &[NodeId],
        calc: C,
    ) -> Result<Calc<C::Output>, CoreError> {
        let id = NodeId(self.nodes.len());
        for dep in deps {
            self.node(*dep)?;
        }

        let mut unique = Vec::with_capacity(deps.len());
        for dep in deps {
            if !unique.contains(dep) {
                unique.push(*dep);
            }
        }
        for dep in &unique {
            self.nodes[dep.0].dependents.push(id);
        }

        self.nodes.push(Node {
            name: name.into(),
            type_id: TypeId::of::<C::Output>(),
            type_name: std::any::type_name::<C::Output>(),
            kind: NodeKind::Calc {
                deps: unique,
                calc: Box::new(calc),
            },
            dependents: Vec::new(),
            memo: Memo::Empty,
            version: 0,
            evaluations: 0,
        });
        Ok(Calc {
            id,
            _marker: PhantomData,
        })
    }

    // ── Mutation ────────────────────────────────────────────────────

    /// Assign a new value to a source and mark everything downstream stale.
    /// Returns the calculations that were invalidated.
    pub fn set<T: Any + Send + Sync>(
        &mut self,
        source: &Source<T>,
        value: T,
    ) -> Result<Vec<NodeId>, CoreError> {
        let node = self.node_mut(source.id)?;
        if node.type_id != TypeId::of::<T>() {
            return Err(CoreError::TypeMismatch {
                node: node.name.clone(),
                expected: node.type_name,
            });
        }
        node.memo = Memo::Fresh(Ok(Arc::new(value) as Value));
        node.version += 1;
        log::debug!("source '{}' set (v{})", node.name, node.version);

        Ok(self.mark_downstream_stale(source.id))
    }

    /// Mark a calculation and everything downstream of it stale, forcing
    /// re-evaluation on the next read.
    pub fn invalidate(&mut self, id: NodeId) -> Result<Vec<NodeId>, CoreError> {
        let node = self.node_mut(id)?;
        let mut invalidated = Vec::new();
        if let NodeKind::Calc { .. } = node.kind {
            if node.is_fresh() {
                node.memo = Memo::Stale;
            }
            invalidated.push(id);
        }
        invalidated.extend(self.mark_downstream_stale(id));
        Ok(invalidated)
    }

    fn mark_downstream_stale(&mut self, from: NodeId) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<NodeId> = self.nodes[from.0].dependents.iter().copied().collect();
        let mut invalidated = Vec::new();

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            let node = &mut self.nodes[id.0];
            if node.is_fresh() {
                node.memo = Memo::Stale;
            }
            invalidated.push(id);
            queue.extend(node.dependents.iter().copied());
        }

        invalidated.sort();
        if !invalidated.is_empty() {
            log::debug!(
                "'{}' invalidated {} calculation(s)",
                self.nodes[from.0].name,
                invalidated.len()
            );
        }
        invalidated
    }

    // ── Reading ─────────────────────────────────────────────────────

    /// Current value of a node, evaluating stale ancestors as needed.
    pub async fn get<T: Any + Send + Sync>(
        &mut self,
        node: &impl Reactive<T>,
    ) -> Result<Arc<T>, CoreError> {
        let id = node.id();
        let value = self.resolve(id).await?;
        value.downcast::<T>().map_err(|_| CoreError::TypeMismatch {
            node: self.nodes[id.0].name.clone(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// Type-erased [`get`](Self::get): the node's memoized result after bringing it up to date.
    pub async fn resolve(&mut self, id: NodeId) -> Result<Value, CoreError> {
        self.node(id)?;

        for next in self.evaluation_order(id) {
            self.evaluate(next).await;
        }

        match &self.nodes[id.0].memo {
            Memo::Fresh(result) => result.clone(),
            Memo::Empty | Memo::Stale => Err(CoreError::UnknownNode(id.0)),
        }
    }

    /// Memoized result without evaluating anything. `None` when the node is
    /// stale or was never evaluated.
    pub fn peek(&self, id: NodeId) -> Option<Result<Value, CoreError>> {
        match &self.nodes.get(id.0)?.memo {
            Memo::Fresh(result) => Some(result.clone()),
            Memo::Empty | Memo::Stale => None,
        }
    }

    /// Stale calculations reachable upward from `root`, ordered so every node
    /// comes after its dependencies. Fresh nodes are not included.
    fn evaluation_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(root, false)];

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            let node = &self.nodes[id.0];
            if node.is_fresh() || !visited.insert(id) {
                continue;
            }
            stack.push((id, true));
            for dep in node.deps().iter().rev() {
                if !self.nodes[dep.0].is_fresh() && !visited.contains(dep) {
                    stack.push((*dep, false));
                }
            }
        }
        order
    }

    /// Evaluate one calculation whose dependencies are all fresh.
    async fn evaluate(&mut self, id: NodeId) {
        let node = &self.nodes[id.0];
        let NodeKind::Calc { deps, calc } = &node.kind else {
            return;
        };

        let mut inputs = Deps::new(node.name.clone());
        let mut upstream_error = None;
        for dep in deps {
            let dep_node = &self.nodes[dep.0];
            match &dep_node.memo {
                Memo::Fresh(Ok(value)) => inputs.push(*dep, dep_node.name.clone(), value.clone()),
                Memo::Fresh(Err(e)) => {
                    upstream_error = Some(e.clone());
                    break;
                }
                Memo::Empty | Memo::Stale => {
                    upstream_error = Some(CoreError::UnknownNode(dep.0));
                    break;
                }
            }
        }

        let ran = upstream_error.is_none();
        let result = match upstream_error {
            Some(e) => Err(e),
            None => calc.evaluate_erased(&inputs).await,
        };

        let node = &mut self.nodes[id.0];
        if ran {
            node.evaluations += 1;
        }
        node.version += 1;
        match &result {
            Ok(_) => log::debug!("calc '{}' evaluated (v{})", node.name, node.version),
            Err(e) if ran => log::warn!("calc '{}' failed: {e}", node.name),
            Err(e) => log::debug!("calc '{}' skipped, upstream failed: {e}", node.name),
        }
        node.memo = Memo::Fresh(result);
    }

    // ── Introspection ───────────────────────────────────────────────

    pub fn name(&self, id: NodeId) -> Result<&str, CoreError> {
        Ok(&self.node(id)?.name)
    }

    /// Value version: changes whenever the node gets a new value or error.
    pub fn version(&self, id: NodeId) -> Result<u64, CoreError> {
        Ok(self.node(id)?.version)
    }

    /// How many times a calculation's function has run.
    pub fn evaluations(&self, id: NodeId) -> Result<u64, CoreError> {
        Ok(self.node(id)?.evaluations)
    }

    pub fn is_stale(&self, id: NodeId) -> Result<bool, CoreError> {
        Ok(!self.node(id)?.is_fresh())
    }

    pub fn dependencies(&self, id: NodeId) -> Result<&[NodeId], CoreError> {
        Ok(self.node(id)?.deps())
    }

    pub fn dependents(&self, id: NodeId) -> Result<&[NodeId], CoreError> {
        Ok(&self.node(id)?.dependents)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, id: NodeId) -> Result<&Node, CoreError> {
        self.nodes.get(id.0).ok_or(CoreError::UnknownNode(id.0))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, CoreError> {
        self.nodes.get_mut(id.0).ok_or(CoreError::UnknownNode(id.0))
    }
}
