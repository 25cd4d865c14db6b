use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::Display;

use crate::errors::CoreError;
use crate::models::table::{Table, ToTable};
use super::graph::ReactiveGraph;
use super::node::{NodeId, Reactive, Value};

/// How a binding presents its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingKind {
    Text,
    /// Headline figure with a caption, e.g. the conversion rate.
    ValueBox { title: String },
    Table,
}

/// What a binding shows after a settle pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    Text(String),
    Table(Table),
    /// The dependency (or something upstream of it) failed.
    Error(String),
}

impl Output {
    pub fn is_error(&self) -> bool {
        matches!(self, Output::Error(_))
    }
}

/// One re-rendered output region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderUpdate {
    pub binding: String,
    pub kind: BindingKind,
    pub output: Output,
}

type RenderFn = Box<dyn Fn(&Value) -> Result<Output, CoreError> + Send + Sync>;

/// An output widget observing exactly one node. Bindings read only; they
/// never set sources.
pub struct Binding {
    name: String,
    kind: BindingKind,
    target: NodeId,
    render: RenderFn,
    last_version: Option<u64>,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("target", &self.target)
            .field("last_version", &self.last_version)
            .finish()
    }
}

impl Binding {
    /// Plain text rendered with `Display`.
    pub fn text<T>(name: impl Into<String>, node: &impl Reactive<T>) -> Self
    where
        T: Display + Any + Send + Sync,
    {
        Self::new(name, BindingKind::Text, node.id(), render_display::<T>)
    }

    /// Formatted value with a caption.
    pub fn value_box<T>(name: impl Into<String>, title: impl Into<String>, node: &impl Reactive<T>) -> Self
    where
        T: Display + Any + Send + Sync,
    {
        Self::new(
            name,
            BindingKind::ValueBox { title: title.into() },
            node.id(),
            render_display::<T>,
        )
    }

    /// Tabular grid.
    pub fn table<T>(name: impl Into<String>, node: &impl Reactive<T>) -> Self
    where
        T: ToTable + Any + Send + Sync,
    {
        Self::new(name, BindingKind::Table, node.id(), |value: &Value| {
            (**value)
                .downcast_ref::<T>()
                .map(|v| Output::Table(v.to_table()))
                .ok_or_else(|| CoreError::TypeMismatch {
                    node: "binding target".into(),
                    expected: std::any::type_name::<T>(),
                })
        })
    }

    fn new<F>(name: impl Into<String>, kind: BindingKind, target: NodeId, render: F) -> Self
    where
        F: Fn(&Value) -> Result<Output, CoreError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind,
            target,
            render: Box::new(render),
            last_version: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &BindingKind {
        &self.kind
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Bring the target up to date and render it if its version moved since
    /// the last render. `None` means nothing changed.
    pub async fn refresh(&mut self, graph: &mut ReactiveGraph) -> Option<RenderUpdate> {
        let result = graph.resolve(self.target).await;
        let version = graph.version(self.target).ok();
        if version.is_some() && version == self.last_version {
            return None;
        }
        self.last_version = version;

        let output = match result.and_then(|value| (self.render)(&value)) {
            Ok(output) => output,
            Err(e) => Output::Error(e.to_string()),
        };
        Some(RenderUpdate {
            binding: self.name.clone(),
            kind: self.kind.clone(),
            output,
        })
    }
}

fn render_display<T: Display + Any + Send + Sync>(value: &Value) -> Result<Output, CoreError> {
    (**value)
        .downcast_ref::<T>()
        .map(|v| Output::Text(v.to_string()))
        .ok_or_else(|| CoreError::TypeMismatch {
            node: "binding target".into(),
            expected: std::any::type_name::<T>(),
        })
}

/// The set of output bindings refreshed by each settle pass.
#[derive(Debug, Default)]
pub struct BindingSet {
    bindings: Vec<Binding>,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// One settle pass: refresh every binding in registration order and
    /// collect the ones that re-rendered. Memoization guarantees each stale
    /// calculation runs once per pass even when several bindings share it.
    pub async fn settle(&mut self, graph: &mut ReactiveGraph) -> Vec<RenderUpdate> {
        let mut updates = Vec::new();
        for binding in &mut self.bindings {
            if let Some(update) = binding.refresh(graph).await {
                updates.push(update);
            }
        }
        updates
    }
}
