//! Two small node kinds: a constant source and a binary adder.

use crate::core::NodeValue;
use crate::core::error::GraphError;
use crate::core::node::{Node, NodeLogic};

/// A source node exposing a fixed value on output `v`.
#[derive(Debug, Clone)]
pub struct Value {
    value: NodeValue,
}

impl Value {
    pub fn new(value: impl Into<NodeValue>) -> Self {
        Value {
            value: value.into(),
        }
    }

    pub fn get(&self) -> &NodeValue {
        &self.value
    }
}

impl NodeLogic for Value {
    fn output_names(&self) -> &'static [&'static str] {
        &["v"]
    }

    fn compute(&self, node: &Node) -> Result<(), GraphError> {
        node.set_output("v", self.value.clone())
    }

    fn type_name(&self) -> &'static str {
        "Value"
    }
}

/// Adds inputs `v1` and `v2` into output `v`.
///
/// Integers stay integers unless the sum overflows `i64`; anything else numeric
/// is added as `f64`.
#[derive(Debug, Clone, Default)]
pub struct Add;

impl NodeLogic for Add {
    fn input_names(&self) -> &'static [&'static str] {
        &["v1", "v2"]
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["v"]
    }

    fn compute(&self, node: &Node) -> Result<(), GraphError> {
        let lhs = node.input_value("v1")?;
        let rhs = node.input_value("v2")?;
        let sum = add(&lhs, &rhs).ok_or_else(|| GraphError::ComputeFailed {
            node: node.id(),
            message: format!("cannot add {} and {}", lhs, rhs),
        })?;
        node.set_output("v", sum)
    }

    fn type_name(&self) -> &'static str {
        "Add"
    }
}

fn add(lhs: &NodeValue, rhs: &NodeValue) -> Option<NodeValue> {
    if let (Some(a), Some(b)) = (lhs.as_i64(), rhs.as_i64()) {
        if let Some(sum) = a.checked_add(b) {
            return Some(sum.into());
        }
    }
    let sum = lhs.as_f64()? + rhs.as_f64()?;
    serde_json::Number::from_f64(sum).map(NodeValue::Number)
}

/// The `Value` node factory
pub fn new_value_node(value: impl Into<NodeValue>) -> Result<Node, GraphError> {
    Node::new(Value::new(value))
}

/// The `Add` node factory
pub fn new_add_node() -> Result<Node, GraphError> {
    Node::new(Add)
}
