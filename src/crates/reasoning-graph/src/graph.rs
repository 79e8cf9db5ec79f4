use std::collections::{HashMap, HashSet, VecDeque};
use std::panic::AssertUnwindSafe;

use parking_lot::Mutex;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::error::GraphError;
use crate::models::{AgentRole, EdgeRelation, GraphChange, GraphSnapshot, ReasoningEdge, ReasoningNode};

/// A listener invoked synchronously, inside the mutation lock, on every
/// successful `add_node`/`add_edge`. Must be fast and non-reentrant: calling
/// back into the graph from inside a listener would deadlock. A listener that
/// returns `Err` or panics is logged and otherwise ignored.
pub type ChangeListener = Box<dyn Fn(&GraphChange) -> Result<(), String> + Send + Sync>;

struct GraphState {
    nodes: HashMap<Uuid, ReasoningNode>,
    edges: Vec<ReasoningEdge>,
    /// out_id -> [in_ids], used for the target-to-source reachability check.
    adjacency: HashMap<Uuid, Vec<Uuid>>,
}

impl GraphState {
    fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            adjacency: HashMap::new(),
        }
    }

    /// BFS from `from` following outgoing edges; true if `to` is reachable.
    fn has_path(&self, from: Uuid, to: Uuid) -> bool {
        if from == to {
            return true;
        }
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(from);
        visited.insert(from);

        while let Some(current) = queue.pop_front() {
            if let Some(next_hops) = self.adjacency.get(&current) {
                for &next in next_hops {
                    if next == to {
                        return true;
                    }
                    if visited.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        false
    }
}

/// A concurrent, in-memory, session-scoped directed acyclic graph of typed
/// reasoning nodes and edges.
///
/// All mutation and multi-node traversal happens under a single lock, so reads
/// never observe a torn view of a concurrent write.
pub struct ReasoningGraph {
    state: Mutex<GraphState>,
    listeners: Mutex<Vec<ChangeListener>>,
}

impl Default for ReasoningGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ReasoningGraph {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GraphState::new()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Registers a change listener. Listeners accumulate for the lifetime of the
    /// graph; there is no unregister.
    pub fn on_change(&self, listener: ChangeListener) {
        self.listeners.lock().push(listener);
    }

    fn notify(&self, change: GraphChange) {
        let listeners = self.listeners.lock();
        for listener in listeners.iter() {
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| listener(&change)));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(message)) => warn!(error = %message, "graph change listener returned an error"),
                Err(_) => warn!("graph change listener panicked"),
            }
        }
    }

    pub fn add_node(&self, node: ReasoningNode) -> Uuid {
        let id = node.id;
        {
            let mut state = self.state.lock();
            state.nodes.insert(id, node.clone());
            state.adjacency.entry(id).or_default();
        }
        self.notify(GraphChange::NodeAdded(node));
        id
    }

    /// Inserts `edge` unless doing so would introduce a cycle. A cycle is only
    /// possible when both endpoints already exist in the graph; an edge touching
    /// a brand-new node always succeeds.
    pub fn add_edge(&self, edge: ReasoningEdge) -> Result<(), GraphError> {
        let mut state = self.state.lock();
        let both_exist = state.nodes.contains_key(&edge.source_id) && state.nodes.contains_key(&edge.target_id);

        if both_exist && state.has_path(edge.target_id, edge.source_id) {
            return Err(GraphError::CycleDetected {
                source: edge.source_id,
                target: edge.target_id,
            });
        }

        state
            .adjacency
            .entry(edge.source_id)
            .or_default()
            .push(edge.target_id);
        state.edges.push(edge.clone());
        drop(state);

        self.notify(GraphChange::EdgeAdded(edge));
        Ok(())
    }

    pub fn get_node(&self, id: Uuid) -> Option<ReasoningNode> {
        self.state.lock().nodes.get(&id).cloned()
    }

    pub fn get_nodes_by_agent(&self, role: AgentRole) -> Vec<ReasoningNode> {
        let mut nodes: Vec<_> = self
            .state
            .lock()
            .nodes
            .values()
            .filter(|n| n.agent == role)
            .cloned()
            .collect();
        nodes.sort_by_key(|n| n.created_at);
        nodes
    }

    pub fn get_session_nodes(&self, session_id: Uuid) -> Vec<ReasoningNode> {
        let mut nodes: Vec<_> = self
            .state
            .lock()
            .nodes
            .values()
            .filter(|n| n.session_id == session_id)
            .cloned()
            .collect();
        nodes.sort_by_key(|n| n.created_at);
        nodes
    }

    fn incoming_with_relation(&self, node_id: Uuid, relation: EdgeRelation) -> Vec<(ReasoningEdge, ReasoningNode)> {
        let state = self.state.lock();
        state
            .edges
            .iter()
            .filter(|e| e.target_id == node_id && e.relation == relation)
            .filter_map(|e| state.nodes.get(&e.source_id).map(|n| (e.clone(), n.clone())))
            .collect()
    }

    pub fn get_challenges_for(&self, node_id: Uuid) -> Vec<(ReasoningEdge, ReasoningNode)> {
        self.incoming_with_relation(node_id, EdgeRelation::Challenges)
    }

    pub fn get_verifications_for(&self, node_id: Uuid) -> Vec<(ReasoningEdge, ReasoningNode)> {
        self.incoming_with_relation(node_id, EdgeRelation::Verifies)
    }

    pub fn get_supports_for(&self, node_id: Uuid) -> Vec<(ReasoningEdge, ReasoningNode)> {
        self.incoming_with_relation(node_id, EdgeRelation::Supports)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let state = self.state.lock();
        json!({
            "nodes": state.nodes.values().collect::<Vec<_>>(),
            "edges": state.edges,
        })
    }

    /// Session-scoped export. Only includes edges whose endpoints are both
    /// within the session's node-id set.
    pub fn to_snapshot(&self, session_id: Uuid) -> GraphSnapshot {
        let state = self.state.lock();
        let session_node_ids: HashSet<Uuid> = state
            .nodes
            .values()
            .filter(|n| n.session_id == session_id)
            .map(|n| n.id)
            .collect();

        let mut nodes: Vec<_> = state
            .nodes
            .values()
            .filter(|n| session_node_ids.contains(&n.id))
            .cloned()
            .collect();
        nodes.sort_by_key(|n| n.created_at);

        let edges: Vec<_> = state
            .edges
            .iter()
            .filter(|e| session_node_ids.contains(&e.source_id) && session_node_ids.contains(&e.target_id))
            .cloned()
            .collect();

        GraphSnapshot { session_id, nodes, edges }
    }

    /// Restores nodes and edges from a snapshot. Deliberately does **not**
    /// re-run cycle detection on the restored edges, trusting that a snapshot
    /// it produced itself was already acyclic. A caller that wants to
    /// validate an untrusted snapshot should insert its edges one at a time
    /// through `add_edge`.
    pub fn load_snapshot(&self, snapshot: GraphSnapshot) {
        let mut state = self.state.lock();
        for node in snapshot.nodes {
            state.adjacency.entry(node.id).or_default();
            state.nodes.insert(node.id, node);
        }
        for edge in snapshot.edges {
            state.adjacency.entry(edge.source_id).or_default().push(edge.target_id);
            state.edges.push(edge);
        }
    }

    /// Removes every node and edge belonging to `session_id`, returning the
    /// number of nodes removed.
    pub fn cleanup_session(&self, session_id: Uuid) -> usize {
        let mut state = self.state.lock();
        let to_remove: HashSet<Uuid> = state
            .nodes
            .iter()
            .filter(|(_, n)| n.session_id == session_id)
            .map(|(id, _)| *id)
            .collect();

        for id in &to_remove {
            state.nodes.remove(id);
            state.adjacency.remove(id);
        }
        for adj in state.adjacency.values_mut() {
            adj.retain(|target| !to_remove.contains(target));
        }
        state
            .edges
            .retain(|e| !to_remove.contains(&e.source_id) && !to_remove.contains(&e.target_id));

        to_remove.len()
    }
}
