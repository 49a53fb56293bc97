//! # lazyflow
//!
//! A small lazy dataflow evaluator. Nodes expose named output sockets and take
//! named inputs that point at other nodes' sockets. Nothing is computed when a
//! graph is wired up; reading a socket pulls exactly the part of the graph it
//! depends on, and every computed socket is cached from then on.
//!
//! ## Features
//!
//! - **Pull-based evaluation**: a node computes the first time one of its outputs is read
//! - **Memoization**: every socket is computed at most once
//! - **Cycle detection**: reentrant demand on a socket fails with [`GraphError::CycleDetected`]
//! - **Owned outputs**: only the owning node may write its sockets
//!
//! ## Quick Start
//!
//! ```rust
//! use lazyflow::prelude::*;
//!
//! let a = new_value_node(5)?;
//! let b = new_value_node(2)?;
//! let sum = new_add_node()?;
//! sum.connect("v1", &a.output("v")?)?;
//! sum.connect("v2", &b.output("v")?)?;
//!
//! // Nothing has been computed yet; this read kicks it off.
//! assert_eq!(sum.value("v")?, 7);
//! # Ok::<(), GraphError>(())
//! ```
//!
//! ## Writing a node
//!
//! ```rust
//! use lazyflow::prelude::*;
//!
//! struct Double;
//!
//! impl NodeLogic for Double {
//!     fn input_names(&self) -> &'static [&'static str] {
//!         &["x"]
//!     }
//!
//!     fn output_names(&self) -> &'static [&'static str] {
//!         &["y"]
//!     }
//!
//!     fn compute(&self, node: &Node) -> Result<(), GraphError> {
//!         let x = node.input_value("x")?.as_i64().unwrap_or_default();
//!         node.set_output("y", (x * 2).into())
//!     }
//! }
//!
//! let x = new_value_node(21)?;
//! let double = Node::new(Double)?;
//! double.connect("x", &x.output("v")?)?;
//! assert_eq!(double.value("y")?, 42);
//! # Ok::<(), GraphError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`nodes`]: the `Value` and `Add` node kinds
//! - [`prelude`]: Commonly used types and traits (import with `use lazyflow::prelude::*`)

// ============================================================================
// Core Module
// ============================================================================

mod core;
pub mod nodes;

// ============================================================================
// Public Re-exports
// ============================================================================

pub use crate::core::AsAny;
pub use crate::core::NodeValue;
pub use crate::core::error::GraphError;
pub use crate::core::node::{Node, NodeId, NodeLogic};
pub use crate::core::ports::{Inputs, NamePolicy, Outputs};
pub use crate::core::socket::{Socket, SocketState};
pub use crate::core::validation::{Severity, ValidationIssue, ValidationResult, validate};

pub use nodes::{Add, Value, new_add_node, new_value_node};

// ============================================================================
// Prelude
// ============================================================================

/// The main prelude: imports everything needed to build and read graphs.
///
/// # Example
/// ```rust
/// use lazyflow::prelude::*;
/// ```
pub mod prelude {
    pub use super::{
        // Nodes
        Add,
        // Core
        GraphError,
        Inputs,
        NamePolicy,
        Node,
        NodeId,
        NodeLogic,
        NodeValue,
        Outputs,
        Socket,
        SocketState,
        Value,
        new_add_node,
        new_value_node,
        // Validation
        validate,
        ValidationIssue,
        ValidationResult,
    };
}

// ============================================================================
// Library Metadata
// ============================================================================

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of this crate.
pub const NAME: &str = env!("CARGO_PKG_NAME");
