use crate::core::node::NodeId;
use thiserror::Error;

/// Everything that can go wrong while wiring or evaluating a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Unknown key: '{key}' is not a declared port")]
    UnknownKey { key: String },

    #[error("Type mismatch: input '{key}' can only be bound to a Socket or left unconnected")]
    TypeMismatch { key: String },

    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Ownership violation: socket '{socket}' belongs to node {owner}, write attempted by {writer}")]
    OwnershipViolation {
        socket: String,
        owner: NodeId,
        writer: NodeId,
    },

    #[error("Cycle detected: output '{output}' of node {node} was demanded while it was being computed")]
    CycleDetected { node: NodeId, output: String },

    #[error("Invariant violation: node {node} did not set output '{output}' during compute")]
    InvariantViolation { node: NodeId, output: String },

    #[error("Input '{input}' of node {node} is not connected")]
    UnconnectedInput { node: NodeId, input: String },

    #[error("The node owning output '{output}' was dropped before the value was computed")]
    OwnerDropped { output: String },

    #[error("Compute failed in node {node}: {message}")]
    ComputeFailed { node: NodeId, message: String },
}
