use crate::error::{EditError, EditResult};
use crate::model::{GraphEdge, GraphNode, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Single-document file format: `{ "nodes": [...], "edges": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphFile {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl From<Snapshot> for GraphFile {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            nodes: snapshot.nodes,
            edges: snapshot.edges,
        }
    }
}

impl From<GraphFile> for Snapshot {
    fn from(file: GraphFile) -> Self {
        Self {
            nodes: file.nodes,
            edges: file.edges,
        }
    }
}

pub fn export_graph(snapshot: &Snapshot) -> EditResult<String> {
    serde_json::to_string_pretty(&GraphFile::from(snapshot.clone()))
        .map_err(|err| EditError::Encode(err.to_string()))
}

/// Parse and validate an interchange payload. Missing `nodes`/`edges` keys
/// default to empty; duplicate node ids and dangling edges are rejected.
pub fn import_graph(input: &str) -> EditResult<Snapshot> {
    let file: GraphFile =
        serde_json::from_str(input).map_err(|err| EditError::InvalidImport(err.to_string()))?;

    let mut ids: HashSet<&str> = HashSet::with_capacity(file.nodes.len());
    for node in &file.nodes {
        if !ids.insert(node.id.as_str()) {
            return Err(EditError::InvalidImport(format!(
                "duplicate node id `{}`",
                node.id
            )));
        }
    }
    let mut edge_ids: HashSet<&str> = HashSet::with_capacity(file.edges.len());
    for edge in &file.edges {
        if !edge_ids.insert(edge.id.as_str()) {
            return Err(EditError::InvalidImport(format!(
                "duplicate edge id `{}`",
                edge.id
            )));
        }
        if !ids.contains(edge.source.as_str()) || !ids.contains(edge.target.as_str()) {
            return Err(EditError::InvalidImport(format!(
                "edge `{}` references a missing node",
                edge.id
            )));
        }
    }
    Ok(file.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_an_empty_graph() {
        let snapshot = import_graph("{}").unwrap();
        assert!(snapshot.nodes.is_empty());
        assert!(snapshot.edges.is_empty());
    }

    #[test]
    fn rejects_non_json() {
        let err = import_graph("not json").unwrap_err();
        assert!(matches!(err, EditError::InvalidImport(_)));
    }

    #[test]
    fn rejects_dangling_edges() {
        let input = r#"{"nodes":[{"id":"a","position":{"x":0,"y":0},"label":"A"}],
            "edges":[{"id":"e","source":"a","target":"b"}]}"#;
        assert!(import_graph(input).is_err());
    }

    #[test]
    fn accepts_exported_graph() {
        let snapshot = Snapshot {
            nodes: vec![
                GraphNode::new("a", Default::default(), "A"),
                GraphNode::new("b", Default::default(), "B"),
            ],
            edges: vec![GraphEdge::new("e", "a", "b")],
        };
        let json = export_graph(&snapshot).unwrap();
        assert_eq!(import_graph(&json).unwrap(), snapshot);
    }
}
