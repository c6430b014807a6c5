use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mindmap_rs::config::{AutoLayoutConfig, CollisionConfig, EditorConfig, FootprintConfig};
use mindmap_rs::layout::{apply_auto_layout, resolve_collisions};
use mindmap_rs::model::{GraphEdge, GraphNode, LayoutMode, Position, ROOT_NODE_ID};
use mindmap_rs::Editor;
use std::hint::black_box;

/// A balanced tree with `fanout` children per node, `depth` levels deep.
fn tree(fanout: usize, depth: usize) -> (Vec<GraphNode>, Vec<GraphEdge>) {
    let mut nodes = vec![GraphNode::new("n0", Position::default(), "n0")];
    let mut edges = Vec::new();
    let mut frontier = vec![0usize];
    for _ in 0..depth {
        let mut next = Vec::new();
        for parent in frontier {
            for _ in 0..fanout {
                let id = nodes.len();
                nodes.push(GraphNode::new(format!("n{id}"), Position::default(), format!("n{id}")));
                edges.push(GraphEdge::new(
                    format!("e{id}"),
                    format!("n{parent}"),
                    format!("n{id}"),
                ));
                next.push(id);
            }
        }
        frontier = next;
    }
    (nodes, edges)
}

/// Nodes dropped on a tight grid so most neighbours overlap.
fn pile(count: usize) -> Vec<GraphNode> {
    (0..count)
        .map(|i| {
            let x = (i % 8) as f32 * 40.0;
            let y = (i / 8) as f32 * 20.0;
            GraphNode::new(format!("n{i}"), Position::new(x, y), "n")
        })
        .collect()
}

fn bench_collisions(c: &mut Criterion) {
    let mut group = c.benchmark_group("collisions");
    let footprint = FootprintConfig::default();
    let config = CollisionConfig::default();
    for count in [8usize, 32, 96] {
        let input = pile(count);
        for mode in [LayoutMode::Mindmap, LayoutMode::Orgchart] {
            let name = format!("{count}_{mode:?}").to_lowercase();
            group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, data| {
                b.iter(|| {
                    let mut nodes = data.clone();
                    let report =
                        resolve_collisions(&mut nodes, mode, Some("n0"), &footprint, &config);
                    black_box(report.moves);
                });
            });
        }
    }
    group.finish();
}

fn bench_auto_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("auto_layout");
    let footprint = FootprintConfig::default();
    let config = AutoLayoutConfig::default();
    for (fanout, depth) in [(3usize, 2usize), (4, 3), (3, 5)] {
        let (nodes, edges) = tree(fanout, depth);
        for mode in [LayoutMode::Mindmap, LayoutMode::Orgchart, LayoutMode::Logic] {
            let name = format!("tree_{fanout}x{depth}_{mode:?}").to_lowercase();
            group.bench_with_input(BenchmarkId::from_parameter(name), &nodes, |b, data| {
                b.iter(|| {
                    let mut nodes = data.clone();
                    let outcome = apply_auto_layout(&mut nodes, &edges, mode, &footprint, &config);
                    black_box(outcome);
                });
            });
        }
    }
    group.finish();
}

fn bench_editing_session(c: &mut Criterion) {
    c.bench_function("editing_session", |b| {
        b.iter(|| {
            let mut editor = Editor::new(EditorConfig::default());
            let mut last = ROOT_NODE_ID.to_string();
            for step in 0..40 {
                last = match step % 4 {
                    0 | 1 => editor.add_child(ROOT_NODE_ID),
                    2 => editor.add_sibling(&last),
                    _ => editor.add_child(&last),
                }
                .unwrap_or(last);
            }
            while editor.undo() {}
            black_box(editor.history().redo_len());
        });
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_collisions, bench_auto_layout, bench_editing_session
);
criterion_main!(benches);
