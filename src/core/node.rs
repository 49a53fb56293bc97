use crate::core::AsAny;
use crate::core::NodeValue;
use crate::core::error::GraphError;
use crate::core::ports::{Inputs, NamePolicy, Outputs};
use crate::core::socket::Socket;
use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// Opaque identity of a node. Sockets authenticate writers against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Uuid);

impl NodeId {
    /// A fresh, random identity.
    pub fn new() -> Self {
        NodeId(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The short form is enough to tell nodes apart in logs.
        write!(f, "{}", &self.0.simple().to_string()[..8])
    }
}

/// A node in a dataflow graph.
///
/// `Node` is a cheap, reference-counted handle: clones refer to the same node.
/// The node owns its [`Outputs`] sockets; its [`Inputs`] point at sockets owned by
/// other nodes. Nothing is computed until one of the output sockets is read.
#[derive(Clone)]
pub struct Node {
    inner: Rc<NodeInner>,
}

pub(crate) struct NodeInner {
    id: NodeId,
    inputs: RefCell<Inputs>,
    outputs: Outputs,
    behaviour: Box<dyn NodeLogic>,
    computing: Cell<bool>,
}

/// Clears the in-progress flag however compute exits, panics included.
struct ComputingGuard<'a>(&'a Cell<bool>);

impl<'a> ComputingGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        ComputingGuard(flag)
    }
}

impl Drop for ComputingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Node {
    /// Creates a new node with the given logic, using the default [`NamePolicy`].
    pub fn new<L: NodeLogic>(behaviour: L) -> Result<Self, GraphError> {
        Self::with_policy(behaviour, NamePolicy::default())
    }

    /// Creates a new node, validating its port names against `policy`.
    ///
    /// All inputs start unconnected and all outputs start unrealized.
    pub fn with_policy<L: NodeLogic>(behaviour: L, policy: NamePolicy) -> Result<Self, GraphError> {
        let inputs = Inputs::new(behaviour.input_names(), policy)?;
        let output_names = behaviour.output_names();
        policy.check_all(output_names)?;

        let id = NodeId::new();
        let inner = Rc::new_cyclic(|weak| NodeInner {
            id,
            inputs: RefCell::new(inputs),
            outputs: Outputs::allocate(id, weak, output_names),
            behaviour: Box::new(behaviour),
            computing: Cell::new(false),
        });

        let node = Node { inner };
        log::debug!("Created node {} ({})", id, node.type_name());
        Ok(node)
    }

    pub(crate) fn from_inner(inner: Rc<NodeInner>) -> Self {
        Node { inner }
    }

    /// The identity this node writes its outputs with.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Read-only view of the input bindings.
    ///
    /// The returned guard must be dropped before the inputs are rebound.
    pub fn inputs(&self) -> Ref<'_, Inputs> {
        self.inner.inputs.borrow()
    }

    /// The sockets this node owns.
    pub fn outputs(&self) -> &Outputs {
        &self.inner.outputs
    }

    /// A handle to the output socket `name`, e.g. for connecting it downstream.
    pub fn output(&self, name: &str) -> Result<Socket, GraphError> {
        self.inner.outputs.get(name).cloned()
    }

    /// Reads output `name`, computing this node (and whatever it depends on) if needed.
    pub fn value(&self, name: &str) -> Result<NodeValue, GraphError> {
        self.inner.outputs.get(name)?.value()
    }

    /// Binds input `name` to `socket`, or leaves it unconnected with `None`.
    pub fn set_input(&self, name: &str, socket: Option<Socket>) -> Result<(), GraphError> {
        let mut inputs = self.inner.inputs.borrow_mut();
        if let (Some(new), Ok(Some(old))) = (&socket, inputs.get(name)) {
            if !new.ptr_eq(old) {
                log::warn!(
                    "Input '{}' of node {} was already connected, rebinding it.",
                    name,
                    self.inner.id
                );
            }
        }
        inputs.set(name, socket)
    }

    /// Connects input `name` to an upstream output socket.
    pub fn connect(&self, name: &str, socket: &Socket) -> Result<(), GraphError> {
        self.set_input(name, Some(socket.clone()))?;
        log::debug!(
            "Connected output '{}' of node {} to input '{}' of node {}",
            socket.name(),
            socket.owner(),
            name,
            self.inner.id
        );
        Ok(())
    }

    /// Leaves input `name` unconnected.
    pub fn disconnect(&self, name: &str) -> Result<(), GraphError> {
        self.set_input(name, None)
    }

    /// Reads the value arriving at input `name`.
    ///
    /// Meant for [`NodeLogic::compute`]: this is where upstream nodes get pulled.
    pub fn input_value(&self, name: &str) -> Result<NodeValue, GraphError> {
        self.optional_input_value(name)?
            .ok_or_else(|| GraphError::UnconnectedInput {
                node: self.inner.id,
                input: name.to_string(),
            })
    }

    /// Like [`input_value`](Self::input_value), but an unconnected input reads as `None`.
    pub fn optional_input_value(&self, name: &str) -> Result<Option<NodeValue>, GraphError> {
        // Release the borrow before evaluating upstream.
        let socket = self.inner.inputs.borrow().get(name)?.cloned();
        socket.map(|socket| socket.value()).transpose()
    }

    /// Writes output `name` as this node.
    pub fn set_output(&self, name: &str, value: NodeValue) -> Result<(), GraphError> {
        self.inner.outputs.get(name)?.set_value(self.inner.id, value)
    }

    /// Downcasts the node's logic to its concrete type.
    pub fn logic<T: NodeLogic>(&self) -> Option<&T> {
        let behaviour: &dyn NodeLogic = &*self.inner.behaviour;
        behaviour.as_any().downcast_ref::<T>()
    }

    /// The kind of node, as reported by its logic.
    pub fn type_name(&self) -> &'static str {
        self.inner.behaviour.type_name()
    }

    /// Whether this node's compute is running right now.
    pub fn is_computing(&self) -> bool {
        self.inner.computing.get()
    }

    /// Runs the node's logic with every output marked as computing.
    pub(crate) fn compute(&self) -> Result<(), GraphError> {
        log::debug!("Computing node {} ({})", self.inner.id, self.type_name());
        let _guard = ComputingGuard::enter(&self.inner.computing);
        self.inner.behaviour.compute(self)?;
        log::debug!("Finished node {} ({})", self.inner.id, self.type_name());
        Ok(())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.inner.id)
            .field("type", &self.type_name())
            .field("outputs", &self.inner.outputs)
            .finish()
    }
}

/// Defines what a kind of node declares and computes.
pub trait NodeLogic: AsAny + 'static {
    /// Names of the inputs, in declaration order.
    fn input_names(&self) -> &'static [&'static str] {
        &[]
    }

    /// Names of the outputs, in declaration order.
    fn output_names(&self) -> &'static [&'static str] {
        &[]
    }

    /// Fill every declared output of `node`.
    ///
    /// Read inputs with [`Node::input_value`] and write outputs with
    /// [`Node::set_output`]. The default does nothing, which is only correct for
    /// nodes without outputs.
    fn compute(&self, _node: &Node) -> Result<(), GraphError> {
        Ok(())
    }

    /// Human-readable kind of node, used in logs.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::socket::SocketState;
    use serde_json::json;
    use std::cell::Cell;

    struct Sink;

    impl NodeLogic for Sink {
        fn input_names(&self) -> &'static [&'static str] {
            &["x"]
        }
    }

    struct Constant {
        value: i64,
        calls: Rc<Cell<usize>>,
    }

    impl NodeLogic for Constant {
        fn output_names(&self) -> &'static [&'static str] {
            &["out"]
        }

        fn compute(&self, node: &Node) -> Result<(), GraphError> {
            self.calls.set(self.calls.get() + 1);
            node.set_output("out", json!(self.value))
        }
    }

    struct BadName;

    impl NodeLogic for BadName {
        fn output_names(&self) -> &'static [&'static str] {
            &["not ok"]
        }
    }

    fn constant(value: i64) -> (Node, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let node = Node::new(Constant {
            value,
            calls: calls.clone(),
        })
        .unwrap();
        (node, calls)
    }

    #[test]
    fn test_node_construction() {
        let node = Node::new(Sink).unwrap();
        assert_eq!(node.inputs().len(), 1);
        assert!(node.inputs().get("x").unwrap().is_none());
        assert!(node.outputs().is_empty());
        assert!(node.logic::<Sink>().is_some());
        assert!(node.logic::<BadName>().is_none());
    }

    #[test]
    fn test_invalid_output_name() {
        let err = Node::new(BadName).unwrap_err();
        assert!(matches!(err, GraphError::InvalidName { .. }));
        assert!(Node::with_policy(BadName, NamePolicy::NonEmpty).is_ok());
    }

    #[test]
    fn test_nothing_computed_until_read() {
        let (node, calls) = constant(4);
        assert_eq!(calls.get(), 0);
        assert_eq!(node.output("out").unwrap().state(), SocketState::Unrealized);

        assert_eq!(node.value("out").unwrap(), json!(4));
        assert_eq!(node.value("out").unwrap(), json!(4));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_sockets_are_owned_by_node() {
        let (node, _) = constant(1);
        let socket = node.output("out").unwrap();
        assert_eq!(socket.owner(), node.id());
        assert_eq!(socket.owner_node().unwrap().id(), node.id());
        assert!(socket.ptr_eq(node.outputs().get("out").unwrap()));
    }

    #[test]
    fn test_input_value_pulls_upstream() {
        let (source, calls) = constant(9);
        let sink = Node::new(Sink).unwrap();

        assert_eq!(
            sink.input_value("x").unwrap_err(),
            GraphError::UnconnectedInput {
                node: sink.id(),
                input: "x".into()
            }
        );
        assert_eq!(sink.optional_input_value("x").unwrap(), None);

        sink.connect("x", &source.output("out").unwrap()).unwrap();
        assert_eq!(sink.input_value("x").unwrap(), json!(9));
        assert_eq!(calls.get(), 1);

        sink.disconnect("x").unwrap();
        assert!(sink.inputs().get("x").unwrap().is_none());
    }

    #[test]
    fn test_set_output_as_other_node_is_rejected() {
        let (a, _) = constant(1);
        let (b, _) = constant(2);
        let err = a.output("out").unwrap().set_value(b.id(), json!(0)).unwrap_err();
        assert!(matches!(err, GraphError::OwnershipViolation { owner, writer, .. }
            if owner == a.id() && writer == b.id()));
    }

    #[test]
    fn test_guard_clears_flag() {
        let flag = Cell::new(false);
        {
            let _guard = ComputingGuard::enter(&flag);
            assert!(flag.get());
        }
        assert!(!flag.get());
    }

    #[test]
    fn test_computing_flag_is_cleared_after_compute() {
        let (node, _) = constant(3);
        assert!(!node.is_computing());
        node.value("out").unwrap();
        assert!(!node.is_computing());
    }

    #[test]
    fn test_node_ids_are_distinct() {
        assert_ne!(NodeId::new(), NodeId::new());
        assert_eq!(NodeId::new().to_string().len(), 8);
    }
}
