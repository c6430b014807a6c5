pub mod collision;
pub mod placement;
mod ranking;

use crate::config::{
    AutoLayoutConfig, CollisionConfig, FootprintConfig, PlacementConfig, RadialConfig,
    RankSpacing, StackedConfig, TieredConfig,
};
use crate::model::{GraphEdge, GraphNode, LayoutMode, Position};
use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use ranking::{RankEdge, compute_ranks, order_rank_nodes};
use std::collections::{HashMap, HashSet};

pub use collision::{CollisionReport, has_overlap, resolve_collisions};
pub use placement::{child_position, duplicate_position, parent_position, sibling_position};

/// Which algorithm produced the positions of an auto-layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutOutcome {
    Dagre,
    Layered,
    /// Nothing to lay out.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RankDirection {
    TopBottom,
    LeftRight,
}

impl RankDirection {
    fn for_mode(mode: LayoutMode) -> Self {
        match mode {
            LayoutMode::Orgchart => Self::TopBottom,
            LayoutMode::Mindmap | LayoutMode::Logic => Self::LeftRight,
        }
    }

    fn dagre_rankdir(self) -> &'static str {
        match self {
            Self::TopBottom => "tb",
            Self::LeftRight => "lr",
        }
    }

    fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftRight)
    }
}

/// Recompute every node position with a layered layout.
///
/// Ranks flow left to right for radial and stacked modes and top to bottom for
/// tiered mode. Positions are written back as top-left anchors, i.e. the
/// computed cell center minus half the footprint.
pub fn apply_auto_layout(
    nodes: &mut [GraphNode],
    edges: &[GraphEdge],
    mode: LayoutMode,
    footprint: &FootprintConfig,
    config: &AutoLayoutConfig,
) -> LayoutOutcome {
    if nodes.is_empty() {
        return LayoutOutcome::Empty;
    }
    let direction = RankDirection::for_mode(mode);
    let spacing = config.spacing(mode);
    let node_ids: Vec<String> = nodes.iter().map(|node| node.id.clone()).collect();
    let layout_edges = unique_edges(&node_ids, edges);

    let (outcome, centers) = match assign_positions_dagre(
        &node_ids,
        &layout_edges,
        direction,
        spacing,
        footprint,
        config.margin,
    ) {
        Some(centers) => (LayoutOutcome::Dagre, centers),
        None => (
            LayoutOutcome::Layered,
            assign_positions_manual(
                &node_ids,
                &layout_edges,
                direction,
                spacing,
                footprint,
                config,
            ),
        ),
    };

    for node in nodes.iter_mut() {
        if let Some((cx, cy)) = centers.get(&node.id) {
            node.position = Position::new(cx - footprint.width / 2.0, cy - footprint.height / 2.0);
        }
    }
    tracing::debug!(?outcome, ?mode, nodes = node_ids.len(), "auto layout applied");
    outcome
}

fn unique_edges(node_ids: &[String], edges: &[GraphEdge]) -> Vec<RankEdge> {
    let set: HashSet<&str> = node_ids.iter().map(String::as_str).collect();
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    edges
        .iter()
        .filter(|edge| set.contains(edge.source.as_str()) && set.contains(edge.target.as_str()))
        .filter(|edge| edge.source != edge.target)
        .filter(|edge| seen.insert((edge.source.as_str(), edge.target.as_str())))
        .map(|edge| RankEdge::new(edge.source.as_str(), edge.target.as_str()))
        .collect()
}

fn assign_positions_dagre(
    node_ids: &[String],
    edges: &[RankEdge],
    direction: RankDirection,
    spacing: RankSpacing,
    footprint: &FootprintConfig,
    margin: f32,
) -> Option<HashMap<String, (f32, f32)>> {
    let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
        DagreGraph::new(Some(GraphOption {
            directed: Some(true),
            multigraph: Some(false),
            compound: Some(false),
        }));

    let mut graph_config = DagreConfig::default();
    graph_config.rankdir = Some(direction.dagre_rankdir().to_string());
    graph_config.nodesep = Some(spacing.node_spacing);
    graph_config.ranksep = Some(spacing.rank_spacing);
    graph_config.marginx = Some(margin);
    graph_config.marginy = Some(margin);
    dagre_graph.set_graph(graph_config);

    for node_id in node_ids {
        let mut node = DagreNode::default();
        node.width = footprint.width;
        node.height = footprint.height;
        dagre_graph.set_node(node_id.clone(), Some(node));
    }
    for edge in edges {
        let _ = dagre_graph.set_edge(&edge.from, &edge.to, Some(DagreEdge::default()), None);
    }

    dagre_layout::run_layout(&mut dagre_graph);

    let mut centers = HashMap::with_capacity(node_ids.len());
    for node_id in node_ids {
        let Some(dagre_node) = dagre_graph.node(node_id) else {
            continue;
        };
        if !dagre_node.x.is_finite() || !dagre_node.y.is_finite() {
            continue;
        }
        centers.insert(node_id.clone(), (dagre_node.x, dagre_node.y));
    }
    if centers.len() == node_ids.len() {
        Some(centers)
    } else {
        tracing::debug!(
            placed = centers.len(),
            expected = node_ids.len(),
            "dagre left nodes unplaced, using layered fallback"
        );
        None
    }
}

/// Longest-path ranking, dummy chains for long edges, median ordering and
/// barycentric cross-axis placement.
fn assign_positions_manual(
    node_ids: &[String],
    edges: &[RankEdge],
    direction: RankDirection,
    spacing: RankSpacing,
    footprint: &FootprintConfig,
    config: &AutoLayoutConfig,
) -> HashMap<String, (f32, f32)> {
    let ranks = compute_ranks(node_ids, edges);
    let max_rank = ranks.values().copied().max().unwrap_or(0);
    let mut rank_nodes: Vec<Vec<String>> = vec![Vec::new(); max_rank + 1];
    for node_id in node_ids {
        let rank = ranks.get(node_id).copied().unwrap_or(0);
        rank_nodes[rank].push(node_id.clone());
    }

    let mut expanded: Vec<RankEdge> = Vec::new();
    let mut dummy_counter = 0usize;
    for edge in edges {
        let (Some(&from_rank), Some(&to_rank)) = (ranks.get(&edge.from), ranks.get(&edge.to)) else {
            continue;
        };
        if to_rank <= from_rank {
            continue;
        }
        let mut prev = edge.from.clone();
        for step in 1..(to_rank - from_rank) {
            let dummy_id = format!("__dummy_{dummy_counter}__");
            dummy_counter += 1;
            rank_nodes[from_rank + step].push(dummy_id.clone());
            expanded.push(RankEdge::new(prev, dummy_id.clone()));
            prev = dummy_id;
        }
        expanded.push(RankEdge::new(prev, edge.to.clone()));
    }
    order_rank_nodes(&mut rank_nodes, &expanded, config.ordering_passes);

    let (main_size, cross_size) = if direction.is_horizontal() {
        (footprint.width, footprint.height)
    } else {
        (footprint.height, footprint.width)
    };
    let half = cross_size / 2.0;

    let mut incoming: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &expanded {
        incoming.entry(edge.to.as_str()).or_default().push(edge.from.as_str());
        outgoing.entry(edge.from.as_str()).or_default().push(edge.to.as_str());
    }

    let mut cross_pos: HashMap<String, f32> = HashMap::new();
    for bucket in &rank_nodes {
        for (idx, node_id) in bucket.iter().enumerate() {
            cross_pos.insert(node_id.clone(), idx as f32 * (cross_size + spacing.node_spacing));
        }
    }

    let mut place_rank = |bucket: &[String], neighbors: &HashMap<&str, Vec<&str>>| {
        if bucket.is_empty() {
            return;
        }
        let mut entries: Vec<(&String, f32)> = bucket
            .iter()
            .map(|node_id| {
                let desired: Vec<f32> = neighbors
                    .get(node_id.as_str())
                    .into_iter()
                    .flatten()
                    .filter_map(|neighbor| cross_pos.get(*neighbor).copied())
                    .collect();
                let own = cross_pos.get(node_id).copied().unwrap_or(0.0);
                let target = if desired.is_empty() {
                    own
                } else {
                    desired.iter().sum::<f32>() / desired.len() as f32
                };
                (node_id, target)
            })
            .collect();
        entries.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        let desired_mean = entries.iter().map(|(_, d)| *d).sum::<f32>() / entries.len() as f32;
        let mut assigned: Vec<(&String, f32)> = Vec::with_capacity(entries.len());
        let mut prev_center: Option<f32> = None;
        for (node_id, desired) in entries {
            let center = match prev_center {
                Some(prev) => desired.max(prev + half * 2.0 + spacing.node_spacing),
                None => desired,
            };
            assigned.push((node_id, center));
            prev_center = Some(center);
        }
        let actual_mean = assigned.iter().map(|(_, c)| *c).sum::<f32>() / assigned.len() as f32;
        let delta = desired_mean - actual_mean;
        for (node_id, center) in assigned {
            cross_pos.insert(node_id.clone(), center + delta);
        }
    };

    for _ in 0..2 {
        for bucket in &rank_nodes {
            place_rank(bucket, &incoming);
        }
        for bucket in rank_nodes.iter().rev() {
            place_rank(bucket, &outgoing);
        }
    }

    let min_cross = node_ids
        .iter()
        .filter_map(|id| cross_pos.get(id))
        .fold(f32::INFINITY, |acc, value| acc.min(*value));
    let shift = if min_cross.is_finite() {
        config.margin + half - min_cross
    } else {
        0.0
    };

    let mut centers = HashMap::with_capacity(node_ids.len());
    for node_id in node_ids {
        let rank = ranks.get(node_id).copied().unwrap_or(0) as f32;
        let main = config.margin + main_size / 2.0 + rank * (main_size + spacing.rank_spacing);
        let cross = cross_pos.get(node_id).copied().unwrap_or(0.0) + shift;
        let center = if direction.is_horizontal() {
            (main, cross)
        } else {
            (cross, main)
        };
        centers.insert(node_id.clone(), center);
    }
    centers
}
