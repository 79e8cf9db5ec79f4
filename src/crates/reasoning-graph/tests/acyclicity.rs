//! Property test: the reasoning graph is acyclic at all times.

use proptest::prelude::*;
use reasoning_graph::{AgentRole, EdgeRelation, ReasoningEdge, ReasoningGraph, ReasoningNode};
use uuid::Uuid;

const RELATIONS: [EdgeRelation; 7] = [
    EdgeRelation::LeadsTo,
    EdgeRelation::Challenges,
    EdgeRelation::Verifies,
    EdgeRelation::Supports,
    EdgeRelation::Contradicts,
    EdgeRelation::Merges,
    EdgeRelation::Observes,
];

proptest! {
    /// For any sequence of random (source-index, target-index) edge attempts
    /// over a fixed pool of nodes, the graph never ends up with a cycle: every
    /// edge that's accepted keeps the edge set acyclic, checked here by
    /// re-deriving reachability from the accepted edges after the fact.
    #[test]
    fn random_edge_attempts_never_produce_a_cycle(
        attempts in prop::collection::vec((0usize..8, 0usize..8, 0usize..7), 1..200)
    ) {
        let graph = ReasoningGraph::new();
        let session_id = Uuid::new_v4();
        let ids: Vec<Uuid> = (0..8)
            .map(|_| graph.add_node(ReasoningNode::new(session_id, AgentRole::Analyst, "n", 0.5)))
            .collect();

        let mut accepted: Vec<(Uuid, Uuid)> = Vec::new();

        for (src_idx, dst_idx, rel_idx) in attempts {
            if src_idx == dst_idx {
                continue;
            }
            let source = ids[src_idx];
            let target = ids[dst_idx];
            let edge = ReasoningEdge::new(source, target, RELATIONS[rel_idx], 1.0);

            match graph.add_edge(edge) {
                Ok(()) => accepted.push((source, target)),
                Err(_) => {
                    // a rejection must mean the accepted set already has a path back
                    prop_assert!(reachable(&accepted, target, source));
                }
            }

            prop_assert!(!has_cycle(&accepted));
        }
    }
}

fn reachable(edges: &[(Uuid, Uuid)], from: Uuid, to: Uuid) -> bool {
    if from == to {
        return true;
    }
    let mut visited = std::collections::HashSet::new();
    let mut stack = vec![from];
    visited.insert(from);
    while let Some(current) = stack.pop() {
        for &(s, t) in edges {
            if s == current && t == to {
                return true;
            }
            if s == current && visited.insert(t) {
                stack.push(t);
            }
        }
    }
    false
}

fn has_cycle(edges: &[(Uuid, Uuid)]) -> bool {
    edges.iter().any(|&(s, t)| reachable(edges, t, s))
}
