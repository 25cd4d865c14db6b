//! Explicit reactive dependency graph and the output bindings that observe it.

pub mod binding;
pub mod graph;
pub mod node;

pub use binding::{Binding, BindingKind, BindingSet, Output, RenderUpdate};
pub use graph::ReactiveGraph;
pub use node::{Calc, Calculation, Deps, NodeId, Reactive, Source, Value};
