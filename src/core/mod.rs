//! The evaluation core: sockets, port sets, nodes and graph validation.

pub mod error;
pub mod node;
pub mod ports;
pub mod socket;
pub mod validation;

/// The value carried by a socket. Type-erased on purpose: the protocol does not care.
pub type NodeValue = serde_json::Value;

use std::any::Any;

/// A helper trait that just provides the `as_any` method.
/// Needed for downcasting a node's `NodeLogic` back to its concrete type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: 'static> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
