use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollisionReport {
    pub passes: usize,
    pub moves: usize,
    /// A full pass finished without moving anything.
    pub converged: bool,
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Rect {
    fn around(node: &GraphNode, width: f32, height: f32) -> Self {
        Self {
            x: node.position.x,
            y: node.position.y,
            width,
            height,
        }
    }

    fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Push overlapping nodes apart along the mode's spreading axis.
///
/// Each pass walks every ordered pair `(i, j)` and moves `j` one full
/// footprint (plus padding) away from `i`. The locked node is never moved.
/// Stops after a quiet pass or after `max_passes`; residual overlap is possible.
pub fn resolve_collisions(
    nodes: &mut [GraphNode],
    mode: LayoutMode,
    locked: Option<&str>,
    footprint: &FootprintConfig,
    config: &CollisionConfig,
) -> CollisionReport {
    let width = footprint.width + config.padding;
    let height = footprint.height + config.padding;
    let horizontal = matches!(mode, LayoutMode::Orgchart);
    let mut report = CollisionReport::default();

    for _ in 0..config.max_passes {
        report.passes += 1;
        let mut moved = false;
        for i in 0..nodes.len() {
            for j in 0..nodes.len() {
                if i == j || locked.is_some_and(|id| nodes[j].id == id) {
                    continue;
                }
                let a = Rect::around(&nodes[i], width, height);
                let b = Rect::around(&nodes[j], width, height);
                if !a.overlaps(&b) {
                    continue;
                }
                let (ax, ay) = a.center();
                let (bx, by) = b.center();
                let target = &mut nodes[j].position;
                if horizontal {
                    target.x += if bx >= ax { width } else { -width };
                } else {
                    target.y += if by >= ay { height } else { -height };
                }
                moved = true;
                report.moves += 1;
            }
        }
        if !moved {
            report.converged = true;
            break;
        }
    }

    if !report.converged {
        tracing::debug!(
            passes = report.passes,
            moves = report.moves,
            "collision pass budget exhausted"
        );
    }
    report
}

/// Whether any two footprints (padding included) still intersect.
pub fn has_overlap(
    nodes: &[GraphNode],
    footprint: &FootprintConfig,
    config: &CollisionConfig,
) -> bool {
    let width = footprint.width + config.padding;
    let height = footprint.height + config.padding;
    nodes.iter().enumerate().any(|(i, a)| {
        nodes[i + 1..].iter().any(|b| {
            Rect::around(a, width, height).overlaps(&Rect::around(b, width, height))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, x: f32, y: f32) -> GraphNode {
        GraphNode::new(id, Position::new(x, y), id)
    }

    #[test]
    fn separates_stacked_pair_vertically() {
        let mut nodes = vec![node("a", 0.0, 0.0), node("b", 0.0, 10.0)];
        let report = resolve_collisions(
            &mut nodes,
            LayoutMode::Mindmap,
            None,
            &FootprintConfig::default(),
            &CollisionConfig::default(),
        );
        assert!(report.converged);
        assert_eq!(nodes[0].position, Position::new(0.0, 0.0));
        assert_eq!(nodes[1].position, Position::new(0.0, 80.0));
    }

    #[test]
    fn orgchart_pushes_horizontally() {
        let mut nodes = vec![node("a", 0.0, 0.0), node("b", -5.0, 0.0)];
        resolve_collisions(
            &mut nodes,
            LayoutMode::Orgchart,
            None,
            &FootprintConfig::default(),
            &CollisionConfig::default(),
        );
        assert_eq!(nodes[1].position, Position::new(-175.0, 0.0));
    }

    #[test]
    fn locked_node_never_moves() {
        let mut nodes = vec![node("old", 0.0, 0.0), node("new", 0.0, 0.0)];
        resolve_collisions(
            &mut nodes,
            LayoutMode::Logic,
            Some("new"),
            &FootprintConfig::default(),
            &CollisionConfig::default(),
        );
        assert_eq!(nodes[1].position, Position::new(0.0, 0.0));
        assert_ne!(nodes[0].position, Position::new(0.0, 0.0));
    }

    #[test]
    fn untouched_when_nothing_overlaps() {
        let mut nodes = vec![node("a", 0.0, 0.0), node("b", 500.0, 500.0)];
        let report = resolve_collisions(
            &mut nodes,
            LayoutMode::Mindmap,
            None,
            &FootprintConfig::default(),
            &CollisionConfig::default(),
        );
        assert_eq!(report.passes, 1);
        assert_eq!(report.moves, 0);
        assert!(report.converged);
    }

    #[test]
    fn respects_pass_budget_on_a_pile() {
        let mut nodes: Vec<GraphNode> =
            (0..40).map(|i| node(&format!("n{i}"), 0.0, 0.0)).collect();
        let config = CollisionConfig {
            padding: 20.0,
            max_passes: 3,
        };
        let report = resolve_collisions(
            &mut nodes,
            LayoutMode::Mindmap,
            None,
            &FootprintConfig::default(),
            &config,
        );
        assert!(report.passes <= 3);
    }
}
