//! Class-level call graph of one or more traces, in the element layout graph
//! viewers load (`{"elements": {"nodes": [...], "edges": [...]}}`).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::config::ExtractorConfig;
use crate::model::{CallNode, CallTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Calls,
    Creates,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Calls => "calls",
            EdgeKind::Creates => "creates",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A caller → callee relation between two distinct project classes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }

    /// `source-kind-target`, unique within a graph.
    pub fn id(&self) -> String {
        format!("{}-{}-{}", self.source, self.kind, self.target)
    }
}

/// Project classes and the calls between them, each tagged with the traces
/// it was seen in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassGraph {
    nodes: BTreeMap<String, BTreeSet<String>>,
    edges: BTreeMap<Edge, BTreeSet<String>>,
}

impl ClassGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the project classes and calls of one trace.
    ///
    /// Only calls between two in-project classes become edges; self-calls
    /// are skipped. A call to a constructor is a `creates` edge.
    pub fn add_trace(&mut self, trace: &str, tree: &CallTree, config: &ExtractorConfig) {
        let (nodes_before, edges_before) = (self.nodes.len(), self.edges.len());

        let mut stack: Vec<&CallNode> = tree.roots.iter().collect();
        while let Some(node) = stack.pop() {
            let caller_inside = config.is_project_class(&node.class_name);
            if caller_inside {
                tag(self.nodes.entry(node.class_name.clone()).or_default(), trace);
            }

            for child in &node.children {
                if caller_inside
                    && child.class_name != node.class_name
                    && config.is_project_class(&child.class_name)
                {
                    let kind = if config.is_constructor(&child.method_name) {
                        EdgeKind::Creates
                    } else {
                        EdgeKind::Calls
                    };
                    let edge = Edge::new(
                        node.class_name.as_str(),
                        child.class_name.as_str(),
                        kind,
                    );
                    tag(self.edges.entry(edge).or_default(), trace);
                }
                stack.push(child);
            }
        }

        debug!(
            trace,
            new_nodes = self.nodes.len() - nodes_before,
            new_edges = self.edges.len() - edges_before,
            "trace added to class graph"
        );
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Traces a class appears in, or `None` for classes outside the graph.
    pub fn node_traces(&self, class_name: &str) -> Option<&BTreeSet<String>> {
        self.nodes.get(class_name)
    }

    pub fn edge_traces(&self, edge: &Edge) -> Option<&BTreeSet<String>> {
        self.edges.get(edge)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.keys()
    }

    /// The element document. An edge's weight is the number of traces it
    /// occurs in.
    pub fn to_json(&self) -> serde_json::Value {
        let nodes: Vec<_> = self
            .nodes
            .iter()
            .map(|(class_name, traces)| {
                json!({
                    "data": {
                        "id": class_name,
                        "properties": {
                            "simpleName": simple_name(class_name),
                            "kind": "class",
                            "traces": traces,
                        },
                        "labels": ["Structure"],
                    }
                })
            })
            .collect();

        let edges: Vec<_> = self
            .edges
            .iter()
            .map(|(edge, traces)| {
                json!({
                    "data": {
                        "id": edge.id(),
                        "source": edge.source,
                        "label": edge.kind,
                        "properties": {
                            "weight": traces.len(),
                            "traces": traces,
                        },
                        "target": edge.target,
                    }
                })
            })
            .collect();

        json!({ "elements": { "nodes": nodes, "edges": edges } })
    }
}

fn tag(traces: &mut BTreeSet<String>, trace: &str) {
    if !traces.contains(trace) {
        traces.insert(trace.to_string());
    }
}

fn simple_name(class_name: &str) -> &str {
    class_name.rsplit('.').next().unwrap_or(class_name)
}
