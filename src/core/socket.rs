use crate::core::error::GraphError;
use crate::core::node::{Node, NodeId, NodeInner};
use crate::core::NodeValue;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Where a socket is in its lifecycle.
///
/// There is no way back from `Valid`: once a value has been written it is served
/// from the cache for the rest of the socket's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    /// Nobody asked for the value yet (or the last attempt failed).
    Unrealized,
    /// The owning node is computing right now.
    Computing,
    /// A value has been written and is cached.
    Valid,
}

/// A single-value cell owned by exactly one node.
///
/// For the owning node this is an output; every other node that holds a handle to
/// it through its [`Inputs`](crate::Inputs) sees it as an input. Cloning a `Socket`
/// clones the handle, not the cell.
#[derive(Clone)]
pub struct Socket {
    inner: Rc<SocketInner>,
}

// The in-progress flag lives on the owning node: while it computes, every one
// of its sockets counts as `Computing`.
struct SocketInner {
    owner: NodeId,
    node: Weak<NodeInner>,
    name: String,
    value: RefCell<Option<NodeValue>>,
}

impl Socket {
    pub(crate) fn new(owner: NodeId, node: Weak<NodeInner>, name: impl Into<String>) -> Self {
        Socket {
            inner: Rc::new(SocketInner {
                owner,
                node,
                name: name.into(),
                value: RefCell::new(None),
            }),
        }
    }

    /// Returns the value of this socket, computing the owning node first if needed.
    ///
    /// The first read of an unrealized socket runs the owner's
    /// [`compute`](crate::NodeLogic::compute), which may in turn read any number of
    /// upstream sockets. Later reads are answered from the cache.
    ///
    /// # Errors
    /// * [`GraphError::CycleDetected`] if the socket is demanded while its owner is
    ///   still computing, through this socket or any sibling output.
    /// * [`GraphError::InvariantViolation`] if the owner finished computing without
    ///   writing this socket.
    /// * [`GraphError::OwnerDropped`] if this is a detached handle whose owning node
    ///   no longer exists. Sockets bound to an input always keep their owner alive.
    /// * Anything the owner's compute (or an upstream compute) returned.
    pub fn value(&self) -> Result<NodeValue, GraphError> {
        if let Some(value) = self.cached() {
            log::trace!(
                "Cache hit for output '{}' of node {}",
                self.inner.name,
                self.inner.owner
            );
            return Ok(value);
        }

        let node = self.owner_node().ok_or_else(|| GraphError::OwnerDropped {
            output: self.inner.name.clone(),
        })?;

        if node.is_computing() {
            log::warn!(
                "Output '{}' of node {} was demanded while the node was computing",
                self.inner.name,
                self.inner.owner
            );
            return Err(GraphError::CycleDetected {
                node: self.inner.owner,
                output: self.inner.name.clone(),
            });
        }

        node.compute()?;

        self.cached().ok_or_else(|| {
            log::error!(
                "Node {} ({}) finished computing without setting output '{}'",
                self.inner.owner,
                node.type_name(),
                self.inner.name
            );
            GraphError::InvariantViolation {
                node: self.inner.owner,
                output: self.inner.name.clone(),
            }
        })
    }

    /// Stores `value` in this socket.
    ///
    /// Only the owning node may write, so the writer has to identify itself. This
    /// holds whether or not the socket already has a value.
    pub fn set_value(&self, writer: NodeId, value: NodeValue) -> Result<(), GraphError> {
        if writer != self.inner.owner {
            return Err(GraphError::OwnershipViolation {
                socket: self.inner.name.clone(),
                owner: self.inner.owner,
                writer,
            });
        }
        *self.inner.value.borrow_mut() = Some(value);
        Ok(())
    }

    /// Where the socket is in its lifecycle.
    pub fn state(&self) -> SocketState {
        if self.is_valid() {
            SocketState::Valid
        } else if self.owner_node().is_some_and(|node| node.is_computing()) {
            SocketState::Computing
        } else {
            SocketState::Unrealized
        }
    }

    /// Whether a value has been written.
    pub fn is_valid(&self) -> bool {
        self.inner.value.borrow().is_some()
    }

    /// The identity of the node that owns this socket.
    pub fn owner(&self) -> NodeId {
        self.inner.owner
    }

    /// The output name this socket was declared under.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The owning node, if it is still alive.
    pub fn owner_node(&self) -> Option<Node> {
        self.inner.node.upgrade().map(Node::from_inner)
    }

    /// Whether both handles point at the same socket.
    pub fn ptr_eq(&self, other: &Socket) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn cached(&self) -> Option<NodeValue> {
        self.inner.value.borrow().clone()
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket")
            .field("owner", &self.inner.owner)
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}
