use crate::graph::{Graph, VertexId};
use crate::layout::{AttributeDelta, LayoutStore, Target};
use crate::value::Value;
use crate::RenderOptions;
use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;

/// A graph loaded from an input document, with the overrides it declares
#[derive(Debug)]
pub struct GraphDocument {
    pub graph: Graph,
    pub layout: LayoutStore,
    pub options: Option<RenderOptions>,
}

type RawAttributes = IndexMap<String, Option<Value>>;

#[derive(Debug, Deserialize)]
struct JsonDocument {
    #[serde(default)]
    directed: bool,
    #[serde(default)]
    vertices: Vec<JsonVertex>,
    #[serde(default)]
    edges: Vec<JsonEdge>,
    #[serde(default)]
    attributes: JsonScopes,
    #[serde(default)]
    options: Option<RenderOptions>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonVertex {
    Detailed {
        id: Value,
        #[serde(default)]
        attributes: RawAttributes,
    },
    Plain(Value),
}

#[derive(Debug, Deserialize)]
struct JsonEdge {
    from: Value,
    to: Value,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    attributes: RawAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct JsonScopes {
    #[serde(default)]
    graph: RawAttributes,
    #[serde(default, alias = "vertex")]
    node: RawAttributes,
    #[serde(default)]
    edge: RawAttributes,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    from: String,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    weight: Option<f64>,
}

/// Maps rendered identifiers to vertices. Two ids that render identically
/// ("1" and 1) would be the same vertex in the script, so they share a key.
#[derive(Default)]
struct VertexIndex {
    by_id: HashMap<String, VertexId>,
}

impl VertexIndex {
    fn lookup(&self, id: &Value) -> Option<VertexId> {
        self.by_id.get(&id.to_string()).copied()
    }

    fn get_or_add(&mut self, graph: &mut Graph, id: Value) -> VertexId {
        let key = id.to_string();
        *self.by_id.entry(key).or_insert_with(|| graph.add_vertex(id))
    }
}

impl GraphDocument {
    /// Load a JSON graph document
    pub fn from_json_reader(reader: impl Read) -> Result<Self> {
        let doc: JsonDocument =
            serde_json::from_reader(reader).context("Input is not a valid graph document")?;
        Self::from_json_document(doc)
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        let doc: JsonDocument =
            serde_json::from_str(input).context("Input is not a valid graph document")?;
        Self::from_json_document(doc)
    }

    fn from_json_document(doc: JsonDocument) -> Result<Self> {
        let mut graph = Graph::new(doc.directed);
        let mut layout = LayoutStore::new();
        let mut index = VertexIndex::default();

        let mut vertex_attrs = Vec::new();
        for vertex in doc.vertices {
            let (id, attributes) = match vertex {
                JsonVertex::Plain(id) => (id, RawAttributes::new()),
                JsonVertex::Detailed { id, attributes } => (id, attributes),
            };
            if index.lookup(&id).is_some() {
                return Err(anyhow!("Duplicate vertex id '{}'", id));
            }
            let handle = index.get_or_add(&mut graph, id);
            vertex_attrs.push((handle, attributes));
        }

        let mut edge_attrs = Vec::new();
        for (n, edge) in doc.edges.into_iter().enumerate() {
            let from = index
                .lookup(&edge.from)
                .ok_or_else(|| anyhow!("Edge {} references unknown vertex '{}'", n, edge.from))?;
            let to = index
                .lookup(&edge.to)
                .ok_or_else(|| anyhow!("Edge {} references unknown vertex '{}'", n, edge.to))?;
            let handle = graph.add_edge(from, to, edge.weight)?;
            edge_attrs.push((handle, edge.attributes));
        }

        apply(&mut layout, Target::Graph, doc.attributes.graph);
        apply(&mut layout, Target::DefaultVertex, doc.attributes.node);
        apply(&mut layout, Target::DefaultEdge, doc.attributes.edge);
        for (handle, attributes) in vertex_attrs {
            apply(&mut layout, Target::Vertex(handle), attributes);
        }
        for (handle, attributes) in edge_attrs {
            apply(&mut layout, Target::Edge(handle), attributes);
        }

        Ok(Self {
            graph,
            layout,
            options: doc.options,
        })
    }

    /// Load a CSV edge list with a `from,to[,weight]` header.
    /// A row without `to` declares a vertex on its own.
    pub fn from_csv_reader(reader: impl Read, directed: bool) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut graph = Graph::new(directed);
        let mut index = VertexIndex::default();

        for (n, row) in reader.deserialize::<CsvRow>().enumerate() {
            // header is line 1
            let row = row.with_context(|| format!("Invalid edge list row at line {}", n + 2))?;
            let from = index.get_or_add(&mut graph, Value::from(row.from));
            match row.to.filter(|to| !to.is_empty()) {
                Some(to) => {
                    let to = index.get_or_add(&mut graph, Value::from(to));
                    graph.add_edge(from, to, row.weight)?;
                }
                None if row.weight.is_some() => {
                    return Err(anyhow!("Row at line {} has a weight but no target", n + 2));
                }
                None => {}
            }
        }

        Ok(Self {
            graph,
            layout: LayoutStore::new(),
            options: None,
        })
    }
}

fn apply(layout: &mut LayoutStore, target: Target, attributes: RawAttributes) {
    // an empty map in a document means "nothing set", not "clear"
    if !attributes.is_empty() {
        layout.set_attributes(target, &AttributeDelta::from(attributes));
    }
}
