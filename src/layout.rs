// Attribute override store: graph, default-vertex, default-edge and per-object scopes

use crate::graph::{EdgeId, Graph, VertexId};
use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Insertion-ordered attribute map, emitted verbatim into the script
pub type Attributes = IndexMap<String, Value>;

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("Invalid layout target: {0}")]
    InvalidTargetKind(String),
}

/// Identity of a single object that can carry its own attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKey {
    Vertex(VertexId),
    Edge(EdgeId),
}

impl From<VertexId> for ObjectKey {
    fn from(v: VertexId) -> Self {
        ObjectKey::Vertex(v)
    }
}

impl From<EdgeId> for ObjectKey {
    fn from(e: EdgeId) -> Self {
        ObjectKey::Edge(e)
    }
}

/// Where an attribute delta applies
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Graph,
    DefaultVertex,
    DefaultEdge,
    Vertex(VertexId),
    Edge(EdgeId),
    /// Same delta applied to every member
    Many(Vec<Target>),
}

impl Target {
    /// Flatten nested batches into single targets, preserving order
    pub fn flatten(&self) -> Vec<&Target> {
        match self {
            Target::Many(targets) => targets.iter().flat_map(Target::flatten).collect(),
            single => vec![single],
        }
    }
}

impl From<VertexId> for Target {
    fn from(v: VertexId) -> Self {
        Target::Vertex(v)
    }
}

impl From<EdgeId> for Target {
    fn from(e: EdgeId) -> Self {
        Target::Edge(e)
    }
}

impl From<ObjectKey> for Target {
    fn from(key: ObjectKey) -> Self {
        match key {
            ObjectKey::Vertex(v) => Target::Vertex(v),
            ObjectKey::Edge(e) => Target::Edge(e),
        }
    }
}

impl<T: Into<Target>> From<Vec<T>> for Target {
    fn from(targets: Vec<T>) -> Self {
        Target::Many(targets.into_iter().map(Into::into).collect())
    }
}

impl FromStr for Target {
    type Err = LayoutError;

    /// Parse the textual scope tokens; objects can only be addressed by handle
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "graph" => Ok(Target::Graph),
            "node" | "vertex" => Ok(Target::DefaultVertex),
            "edge" => Ok(Target::DefaultEdge),
            _ => Err(LayoutError::InvalidTargetKind(s.to_string())),
        }
    }
}

/// Incremental change to an attribute map. A `None` value removes the key.
/// An empty delta clears every attribute of its target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeDelta {
    changes: IndexMap<String, Option<Value>>,
}

impl AttributeDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta that removes all attributes of its targets
    pub fn clear() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.changes.insert(name.into(), Some(value.into()));
        self
    }

    pub fn remove(mut self, name: impl Into<String>) -> Self {
        self.changes.insert(name.into(), None);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<Value>) {
        self.changes.insert(name.into(), value);
    }

    pub fn is_clear(&self) -> bool {
        self.changes.is_empty()
    }

    fn apply(&self, attrs: &mut Attributes) {
        if self.is_clear() {
            attrs.clear();
            return;
        }
        for (name, value) in &self.changes {
            match value {
                // shift_remove keeps the remaining keys in insertion order
                None => {
                    attrs.shift_remove(name);
                }
                Some(value) => {
                    attrs.insert(name.clone(), value.clone());
                }
            }
        }
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for AttributeDelta {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs
            .into_iter()
            .fold(AttributeDelta::new(), |delta, (k, v)| delta.set(k, v))
    }
}

impl From<IndexMap<String, Option<Value>>> for AttributeDelta {
    fn from(changes: IndexMap<String, Option<Value>>) -> Self {
        Self { changes }
    }
}

/// The four override scopes. Object entries exist only while non-empty.
#[derive(Debug, Clone, Default)]
pub struct LayoutStore {
    graph: Attributes,
    vertex_defaults: Attributes,
    edge_defaults: Attributes,
    objects: HashMap<ObjectKey, Attributes>,
}

impl LayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `delta` into every scope addressed by `target`
    pub fn set_attributes(&mut self, target: impl Into<Target>, delta: &AttributeDelta) -> &mut Self {
        let target = target.into();
        for single in target.flatten() {
            match single {
                Target::Graph => delta.apply(&mut self.graph),
                Target::DefaultVertex => delta.apply(&mut self.vertex_defaults),
                Target::DefaultEdge => delta.apply(&mut self.edge_defaults),
                Target::Vertex(v) => self.merge_object(ObjectKey::Vertex(*v), delta),
                Target::Edge(e) => self.merge_object(ObjectKey::Edge(*e), delta),
                // flatten never yields a batch
                Target::Many(_) => {}
            }
        }
        self
    }

    fn merge_object(&mut self, key: ObjectKey, delta: &AttributeDelta) {
        let mut attrs = self.objects.remove(&key).unwrap_or_default();
        delta.apply(&mut attrs);
        if !attrs.is_empty() {
            self.objects.insert(key, attrs);
        }
    }

    pub fn graph(&self) -> &Attributes {
        &self.graph
    }

    pub fn vertex_defaults(&self) -> &Attributes {
        &self.vertex_defaults
    }

    pub fn edge_defaults(&self) -> &Attributes {
        &self.edge_defaults
    }

    /// Per-object overrides; `None` when the object has none
    pub fn object(&self, key: impl Into<ObjectKey>) -> Option<&Attributes> {
        self.objects.get(&key.into())
    }

    pub fn has_object(&self, key: impl Into<ObjectKey>) -> bool {
        self.objects.contains_key(&key.into())
    }

    /// Discard the overrides of a single object
    pub fn forget(&mut self, key: impl Into<ObjectKey>) -> Option<Attributes> {
        self.objects.remove(&key.into())
    }

    /// Discard overrides of objects no longer present in `graph`
    pub fn prune(&mut self, graph: &Graph) -> usize {
        let before = self.objects.len();
        self.objects.retain(|key, _| match key {
            ObjectKey::Vertex(v) => graph.contains_vertex(*v),
            ObjectKey::Edge(e) => graph.contains_edge(*e),
        });
        before - self.objects.len()
    }
}
