use crate::theme::NodeColor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ROOT_NODE_ID: &str = "root";
pub const DEFAULT_ROOT_LABEL: &str = "Central Idea";
pub const DEFAULT_DOCUMENT_NAME: &str = "Untitled Map";

/// Placement philosophy shared by incremental child placement and auto layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Radial: children on a circle around their parent.
    #[default]
    Mindmap,
    /// Tiered-horizontal: children in a row below their parent.
    Orgchart,
    /// Stacked-vertical: children in a column to the right of their parent.
    Logic,
}

impl LayoutMode {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "mindmap" | "radial" => Some(Self::Mindmap),
            "orgchart" | "tiered" => Some(Self::Orgchart),
            "logic" | "stacked" => Some(Self::Logic),
            _ => None,
        }
    }

    /// Anchor sides an edge leaves its source from and enters its target at.
    /// Radial edges float and carry no handles.
    pub fn edge_anchors(self) -> (Option<Anchor>, Option<Anchor>) {
        match self {
            Self::Mindmap => (None, None),
            Self::Orgchart => (Some(Anchor::Bottom), Some(Anchor::Top)),
            Self::Logic => (Some(Anchor::Right), Some(Anchor::Left)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub position: Position,
    pub label: String,
    #[serde(default)]
    pub color: NodeColor,
    #[serde(default)]
    pub is_portal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal_document_id: Option<String>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, position: Position, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position,
            label: label.into(),
            color: NodeColor::Default,
            is_portal: false,
            portal_document_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<Anchor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<Anchor>,
}

impl GraphEdge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    pub fn with_anchors(mut self, (source, target): (Option<Anchor>, Option<Anchor>)) -> Self {
        self.source_handle = source;
        self.target_handle = target;
        self
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// Immutable copy of one document's graph, used by the undo/redo stacks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub parent_document_id: Option<String>,
    #[serde(default)]
    pub parent_node_id: Option<String>,
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// A document holding a single default root node at the origin.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            pinned: false,
            parent_document_id: None,
            parent_node_id: None,
            nodes: vec![GraphNode::new(
                ROOT_NODE_ID,
                Position::default(),
                DEFAULT_ROOT_LABEL,
            )],
            edges: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_document_id.is_none()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    pub fn has_edge_between(&self, source: &str, target: &str) -> bool {
        self.edges
            .iter()
            .any(|edge| edge.source == source && edge.target == target)
    }

    /// Number of outgoing edges, which is what child placement counts.
    pub fn child_count(&self, id: &str) -> usize {
        self.edges.iter().filter(|edge| edge.source == id).count()
    }

    /// The first edge pointing at `id`, if any; its source is the node's parent.
    pub fn parent_edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.iter().find(|edge| edge.target == id)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Replace the graph wholesale; nodes and edges always move together.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.nodes = snapshot.nodes;
        self.edges = snapshot.edges;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn fresh_node_id(&self) -> String {
        loop {
            let id = short_id("node");
            if !self.has_node(&id) {
                return id;
            }
        }
    }

    pub fn fresh_edge_id(&self) -> String {
        loop {
            let id = short_id("edge");
            if self.edge(&id).is_none() {
                return id;
            }
        }
    }

    /// Edges whose endpoints are both present; true for every valid document.
    pub fn edges_are_consistent(&self) -> bool {
        self.edges
            .iter()
            .all(|edge| self.has_node(&edge.source) && self.has_node(&edge.target))
    }
}

pub fn short_id(prefix: &str) -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &raw[..12])
}

pub fn document_id() -> String {
    format!("doc-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_has_default_root() {
        let doc = Document::new("d1", "Map");
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.nodes[0].id, ROOT_NODE_ID);
        assert_eq!(doc.nodes[0].position, Position::default());
        assert!(doc.edges.is_empty());
        assert!(doc.is_top_level());
    }

    #[test]
    fn fresh_ids_do_not_collide_with_existing_nodes() {
        let mut doc = Document::new("d1", "Map");
        for _ in 0..32 {
            let id = doc.fresh_node_id();
            assert!(!doc.has_node(&id));
            doc.nodes.push(GraphNode::new(id, Position::default(), "n"));
        }
    }

    #[test]
    fn node_serializes_camel_case() {
        let mut node = GraphNode::new("a", Position::new(1.0, 2.0), "A");
        node.is_portal = true;
        node.portal_document_id = Some("d2".to_string());
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["isPortal"], serde_json::json!(true));
        assert_eq!(json["portalDocumentId"], serde_json::json!("d2"));
        assert_eq!(json["color"], serde_json::json!("default"));
    }

    #[test]
    fn anchors_follow_layout_mode() {
        assert_eq!(LayoutMode::Mindmap.edge_anchors(), (None, None));
        assert_eq!(
            LayoutMode::Orgchart.edge_anchors(),
            (Some(Anchor::Bottom), Some(Anchor::Top))
        );
        assert_eq!(LayoutMode::from_token("stacked"), Some(LayoutMode::Logic));
    }
}
