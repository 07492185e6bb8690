use crate::value::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

static NEXT_GRAPH: AtomicU64 = AtomicU64::new(0);

/// Stable handle of a vertex, bound to the graph that created it.
/// Handles are never reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId {
    graph: u64,
    index: usize,
}

/// Stable handle of an edge, bound to the graph that created it.
/// Handles are never reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId {
    graph: u64,
    index: usize,
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vertex #{} of graph #{}", self.index, self.graph)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge #{} of graph #{}", self.index, self.graph)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("{0} does not exist in this graph")]
    UnknownVertex(VertexId),
    #[error("{0} does not exist in this graph")]
    UnknownEdge(EdgeId),
}

#[derive(Debug, Clone)]
pub struct Vertex {
    id: Value,
    degree: usize,
}

impl Vertex {
    /// Visible identifier (label) of this vertex
    pub fn id(&self) -> &Value {
        &self.id
    }

    pub fn is_isolated(&self) -> bool {
        self.degree == 0
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    source: VertexId,
    target: VertexId,
    weight: Option<f64>,
    directed: bool,
}

impl Edge {
    /// (source, target); the order only carries meaning in a directed graph
    pub fn endpoints(&self) -> (VertexId, VertexId) {
        (self.source, self.target)
    }

    pub fn weight(&self) -> Option<f64> {
        self.weight
    }

    /// Whether this edge leads from `from` to `to`.
    /// Undirected edges connect their endpoints in either orientation.
    pub fn connects(&self, from: VertexId, to: VertexId) -> bool {
        if self.source == from && self.target == to {
            return true;
        }
        !self.directed && self.source == to && self.target == from
    }
}

/// Arena-backed graph. Removed slots stay as tombstones so that handles remain
/// unique for the lifetime of the graph. A clone shares its handles with the original.
#[derive(Debug, Clone)]
pub struct Graph {
    id: u64,
    directed: bool,
    vertices: Vec<Option<Vertex>>,
    edges: Vec<Option<Edge>>,
}

impl Graph {
    pub fn new(directed: bool) -> Self {
        Self {
            id: NEXT_GRAPH.fetch_add(1, Ordering::Relaxed),
            directed,
            vertices: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn add_vertex(&mut self, id: impl Into<Value>) -> VertexId {
        self.vertices.push(Some(Vertex {
            id: id.into(),
            degree: 0,
        }));
        self.vertex_handle(self.vertices.len() - 1)
    }

    pub fn add_edge(
        &mut self,
        source: VertexId,
        target: VertexId,
        weight: Option<f64>,
    ) -> Result<EdgeId, GraphError> {
        if !self.contains_vertex(source) {
            return Err(GraphError::UnknownVertex(source));
        }
        if !self.contains_vertex(target) {
            return Err(GraphError::UnknownVertex(target));
        }

        self.adjust_degree(source, true);
        if target != source {
            self.adjust_degree(target, true);
        }

        self.edges.push(Some(Edge {
            source,
            target,
            weight,
            directed: self.directed,
        }));
        Ok(self.edge_handle(self.edges.len() - 1))
    }

    /// Remove a vertex together with every incident edge.
    /// Returns the handles of the edges that were removed alongside it.
    pub fn remove_vertex(&mut self, vertex: VertexId) -> Result<Vec<EdgeId>, GraphError> {
        if !self.contains_vertex(vertex) {
            return Err(GraphError::UnknownVertex(vertex));
        }

        let incident: Vec<EdgeId> = self
            .edges()
            .filter(|(_, e)| e.source == vertex || e.target == vertex)
            .map(|(id, _)| id)
            .collect();
        for edge in &incident {
            self.remove_edge(*edge)?;
        }

        self.vertices[vertex.index] = None;
        Ok(incident)
    }

    pub fn remove_edge(&mut self, edge: EdgeId) -> Result<(), GraphError> {
        let removed = self
            .edge_slot(edge)
            .and_then(|i| self.edges[i].take())
            .ok_or(GraphError::UnknownEdge(edge))?;

        self.adjust_degree(removed.source, false);
        if removed.target != removed.source {
            self.adjust_degree(removed.target, false);
        }
        Ok(())
    }

    /// Change the visible identifier of a vertex; its handle stays the same.
    pub fn set_vertex_id(&mut self, vertex: VertexId, id: impl Into<Value>) -> Result<(), GraphError> {
        let slot = self
            .vertex_slot(vertex)
            .and_then(|i| self.vertices[i].as_mut())
            .ok_or(GraphError::UnknownVertex(vertex))?;
        slot.id = id.into();
        Ok(())
    }

    pub fn vertex(&self, vertex: VertexId) -> Option<&Vertex> {
        self.vertex_slot(vertex).and_then(|i| self.vertices[i].as_ref())
    }

    pub fn edge(&self, edge: EdgeId) -> Option<&Edge> {
        self.edge_slot(edge).and_then(|i| self.edges[i].as_ref())
    }

    pub fn contains_vertex(&self, vertex: VertexId) -> bool {
        self.vertex(vertex).is_some()
    }

    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        self.edge(edge).is_some()
    }

    pub fn is_isolated(&self, vertex: VertexId) -> bool {
        self.vertex(vertex).is_some_and(Vertex::is_isolated)
    }

    /// Whether any edge leads from `from` to `to`
    pub fn has_edge(&self, from: VertexId, to: VertexId) -> bool {
        self.edges().any(|(_, e)| e.connects(from, to))
    }

    /// Live vertices in insertion order
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
        let graph = self.id;
        self.vertices
            .iter()
            .enumerate()
            .filter_map(move |(index, v)| v.as_ref().map(|v| (VertexId { graph, index }, v)))
    }

    /// Live edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        let graph = self.id;
        self.edges
            .iter()
            .enumerate()
            .filter_map(move |(index, e)| e.as_ref().map(|e| (EdgeId { graph, index }, e)))
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices().count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }

    fn vertex_handle(&self, index: usize) -> VertexId {
        VertexId { graph: self.id, index }
    }

    fn edge_handle(&self, index: usize) -> EdgeId {
        EdgeId { graph: self.id, index }
    }

    /// Arena index of `vertex`, if it was issued by this graph
    fn vertex_slot(&self, vertex: VertexId) -> Option<usize> {
        (vertex.graph == self.id && vertex.index < self.vertices.len()).then_some(vertex.index)
    }

    fn edge_slot(&self, edge: EdgeId) -> Option<usize> {
        (edge.graph == self.id && edge.index < self.edges.len()).then_some(edge.index)
    }

    fn adjust_degree(&mut self, vertex: VertexId, increment: bool) {
        let slot = self.vertex_slot(vertex);
        if let Some(v) = slot.and_then(|i| self.vertices[i].as_mut()) {
            if increment {
                v.degree += 1;
            } else {
                v.degree = v.degree.saturating_sub(1);
            }
        }
    }
}
