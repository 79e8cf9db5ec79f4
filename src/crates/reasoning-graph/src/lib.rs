//! Concurrent, in-memory, typed reasoning graph.
//!
//! A [`ReasoningGraph`] holds the nodes and edges produced by a swarm run,
//! partitioned by session id. The edge set is maintained as a DAG: inserting an
//! edge that would close a cycle is rejected rather than silently accepted.

mod error;
mod graph;
mod models;

pub use error::GraphError;
pub use graph::{ChangeListener, ReasoningGraph};
pub use models::{
    AgentRole, DecisionPoint, EdgeRelation, GraphChange, GraphSnapshot, NodeKind, ReasoningEdge, ReasoningNode,
};
