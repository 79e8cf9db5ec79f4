use criterion::{black_box, criterion_group, criterion_main, Criterion};
use reasoning_graph::{AgentRole, EdgeRelation, ReasoningEdge, ReasoningGraph, ReasoningNode};
use uuid::Uuid;

fn node_insertion(c: &mut Criterion) {
    c.bench_function("add_node", |b| {
        let graph = ReasoningGraph::new();
        let session_id = Uuid::new_v4();
        b.iter(|| {
            let node = ReasoningNode::new(session_id, AgentRole::Analyst, "reasoning content", 0.8);
            black_box(graph.add_node(node))
        });
    });
}

fn edge_insertion_with_cycle_check(c: &mut Criterion) {
    c.bench_function("add_edge with populated graph", |b| {
        let graph = ReasoningGraph::new();
        let session_id = Uuid::new_v4();
        let mut ids = Vec::new();
        for _ in 0..200 {
            ids.push(graph.add_node(ReasoningNode::new(session_id, AgentRole::Analyst, "x", 0.5)));
        }
        // Build a chain so the reachability check has real work to do.
        for pair in ids.windows(2) {
            graph
                .add_edge(ReasoningEdge::new(pair[0], pair[1], EdgeRelation::LeadsTo, 1.0))
                .unwrap();
        }

        let source = ids[ids.len() - 1];
        let target = ids[0];
        b.iter(|| {
            // Rejected every time (it's a cycle), but we're measuring the
            // reachability BFS cost, not successful insertion.
            black_box(graph.add_edge(ReasoningEdge::new(source, target, EdgeRelation::LeadsTo, 1.0)).err())
        });
    });
}

criterion_group!(benches, node_insertion, edge_insertion_with_cycle_check);
criterion_main!(benches);
