// Script serializer: graph + layout overrides -> dot language text

use crate::graph::{Graph, VertexId};
use crate::layout::{Attributes, LayoutStore, ObjectKey};
use crate::value::Value;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Line ending appended after every script line
#[cfg(windows)]
pub const EOL: &str = "\r\n";
#[cfg(not(windows))]
pub const EOL: &str = "\n";

const INDENT: &str = "  ";

/// Numerals and simple alphanumeric names need no quoting
static BARE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:-?(?:\.[0-9]+|[0-9]+(?:\.[0-9]+)?)|[A-Za-z_][A-Za-z0-9_]*)$")
        .expect("bare identifier pattern is valid")
});

/// Build the complete script for `graph` with the overrides in `layout`.
/// Pure: neither input is modified and equal inputs give identical output.
pub fn create_script(graph: &Graph, layout: &LayoutStore) -> String {
    let directed = graph.is_directed();
    let mut script = String::new();

    script.push_str(if directed { "digraph" } else { "graph" });
    script.push_str(" G {");
    script.push_str(EOL);

    // Global defaults
    for (keyword, attrs) in [
        ("graph", layout.graph()),
        ("node", layout.vertex_defaults()),
        ("edge", layout.edge_defaults()),
    ] {
        if !attrs.is_empty() {
            push_line(&mut script, &format!("{} {}", keyword, escape_attributes(attrs)));
        }
    }

    // Isolated and individually styled vertices are declared explicitly,
    // all others are implied by the edge statements below
    for (id, vertex) in graph.vertices() {
        let attrs = layout.object(id);
        if !vertex.is_isolated() && attrs.is_none() {
            continue;
        }
        let mut line = escape_id(vertex.id());
        if let Some(attrs) = attrs {
            line.push(' ');
            line.push_str(&escape_attributes(attrs));
        }
        push_line(&mut script, &line);
    }

    let edge_op = if directed { " -> " } else { " -- " };
    let links: HashSet<(VertexId, VertexId)> = if directed {
        graph.edges().map(|(_, e)| e.endpoints()).collect()
    } else {
        HashSet::new()
    };

    for (id, edge) in graph.edges() {
        let (source, target) = edge.endpoints();
        let (Some(from), Some(to)) = (graph.vertex(source), graph.vertex(target)) else {
            continue;
        };

        let mut line = format!("{}{}{}", escape_id(from.id()), edge_op, escape_id(to.id()));

        let mut attrs = layout
            .object(ObjectKey::Edge(id))
            .cloned()
            .unwrap_or_default();
        if let Some(weight) = edge.weight() {
            attrs.insert("label".to_string(), Value::Float(weight));
        }
        // an opposite edge exists, so the pair is drawn as one undirected line
        if directed && links.contains(&(target, source)) {
            attrs.insert("dir".to_string(), Value::from("none"));
        }
        if !attrs.is_empty() {
            line.push(' ');
            line.push_str(&escape_attributes(&attrs));
        }
        push_line(&mut script, &line);
    }

    script.push('}');
    script.push_str(EOL);
    script
}

fn push_line(script: &mut String, line: &str) {
    script.push_str(INDENT);
    script.push_str(line);
    script.push_str(EOL);
}

/// Quote and escape an identifier or attribute value unless it is a plain
/// numeral or alphanumeric name.
pub fn escape_id(id: &Value) -> String {
    let raw = id.to_string();
    if BARE_ID.is_match(&raw) {
        return raw;
    }

    let mut escaped = String::with_capacity(raw.len() + 2);
    escaped.push('"');
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\\' => escaped.push_str("\\\\"),
            _ => escaped.push(c),
        }
    }
    escaped.push('"');
    escaped
}

/// Format `[name=value ...]`. Names are emitted as given, values are escaped.
pub fn escape_attributes(attrs: &Attributes) -> String {
    let pairs: Vec<String> = attrs
        .iter()
        .map(|(name, value)| format!("{}={}", name, escape_id(value)))
        .collect();
    format!("[{}]", pairs.join(" "))
}
