//! The named input and output slots of a node.
//!
//! Both sets are shaped once, from the names a [`NodeLogic`](crate::NodeLogic)
//! declares, and keep their declaration order. Inputs hold handles to sockets of
//! *other* nodes, and keep those nodes alive; outputs hold the sockets the node
//! itself owns.

use crate::core::error::GraphError;
use crate::core::node::{Node, NodeId, NodeInner};
use crate::core::socket::Socket;
use std::any::Any;
use std::collections::HashSet;
use std::rc::Weak;

/// Which strings are acceptable as port names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamePolicy {
    /// ASCII identifiers: a letter or `_` followed by letters, digits or `_`.
    #[default]
    Identifier,
    /// Any non-empty string without surrounding whitespace.
    NonEmpty,
}

impl NamePolicy {
    /// Checks a single name against the policy.
    pub fn check(&self, name: &str) -> Result<(), GraphError> {
        let invalid = |reason: &str| GraphError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("name is empty"));
        }

        match self {
            NamePolicy::Identifier => {
                let mut chars = name.chars();
                let first = chars.next().unwrap_or_default();
                if !(first.is_ascii_alphabetic() || first == '_') {
                    return Err(invalid("must start with an ASCII letter or '_'"));
                }
                if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(invalid("may only contain ASCII letters, digits and '_'"));
                }
            }
            NamePolicy::NonEmpty => {
                if name.trim() != name {
                    return Err(invalid("has leading or trailing whitespace"));
                }
            }
        }
        Ok(())
    }

    /// Checks every name and rejects duplicates.
    pub fn check_all(&self, names: &[&str]) -> Result<(), GraphError> {
        let mut seen = HashSet::new();
        for name in names {
            self.check(name)?;
            if !seen.insert(*name) {
                return Err(GraphError::InvalidName {
                    name: name.to_string(),
                    reason: "declared more than once".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Fixed-key mapping from input name to an optional upstream socket.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    slots: Vec<(String, Option<Binding>)>,
}

/// An edge of the graph. Sockets only point weakly at their owner, so the edge
/// holds the upstream node itself.
#[derive(Debug, Clone)]
struct Binding {
    socket: Socket,
    upstream: Option<Node>,
}

impl Binding {
    fn new(socket: Socket) -> Self {
        let upstream = socket.owner_node();
        Binding { socket, upstream }
    }
}

impl Inputs {
    /// Creates an input set with every slot unconnected.
    pub fn new(names: &[&str], policy: NamePolicy) -> Result<Self, GraphError> {
        policy.check_all(names)?;
        Ok(Inputs {
            slots: names.iter().map(|name| (name.to_string(), None)).collect(),
        })
    }

    /// Binds `key` to an upstream socket, or unbinds it with `None`.
    pub fn set(&mut self, key: &str, socket: Option<Socket>) -> Result<(), GraphError> {
        let slot = self.slot_mut(key)?;
        *slot = socket.map(Binding::new);
        Ok(())
    }

    /// Binds `key` from a dynamically typed value.
    ///
    /// Accepts a [`Socket`] or an `Option<Socket>`; anything else is a
    /// [`GraphError::TypeMismatch`]. Unknown keys are reported first.
    pub fn set_any(&mut self, key: &str, value: &dyn Any) -> Result<(), GraphError> {
        let binding = if let Some(socket) = value.downcast_ref::<Socket>() {
            Some(socket.clone())
        } else if let Some(binding) = value.downcast_ref::<Option<Socket>>() {
            binding.clone()
        } else {
            self.slot_mut(key)?;
            return Err(GraphError::TypeMismatch {
                key: key.to_string(),
            });
        };
        self.set(key, binding)
    }

    /// The current binding of `key`.
    pub fn get(&self, key: &str) -> Result<Option<&Socket>, GraphError> {
        self.slots
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, binding)| binding.as_ref().map(|b| &b.socket))
            .ok_or_else(|| unknown(key))
    }

    /// The node feeding input `key`, if connected.
    pub fn upstream(&self, key: &str) -> Result<Option<&Node>, GraphError> {
        self.slots
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, binding)| binding.as_ref().and_then(|b| b.upstream.as_ref()))
            .ok_or_else(|| unknown(key))
    }

    /// All bindings in declaration order.
    pub fn values(&self) -> impl Iterator<Item = Option<&Socket>> {
        self.slots
            .iter()
            .map(|(_, binding)| binding.as_ref().map(|b| &b.socket))
    }

    /// Name and binding pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Socket>)> {
        self.slots
            .iter()
            .map(|(name, binding)| (name.as_str(), binding.as_ref().map(|b| &b.socket)))
    }

    /// Declared input names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(name, _)| name.as_str())
    }

    /// Number of declared inputs.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the node declares no inputs at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot_mut(&mut self, key: &str) -> Result<&mut Option<Binding>, GraphError> {
        self.slots
            .iter_mut()
            .find(|(name, _)| name == key)
            .map(|(_, socket)| socket)
            .ok_or_else(|| unknown(key))
    }
}

/// Fixed-key mapping from output name to a socket owned by the node.
#[derive(Debug, Clone, Default)]
pub struct Outputs {
    sockets: Vec<(String, Socket)>,
}

impl Outputs {
    /// Allocates one socket per name. Names must already be validated.
    pub(crate) fn allocate(owner: NodeId, node: &Weak<NodeInner>, names: &[&str]) -> Self {
        Outputs {
            sockets: names
                .iter()
                .map(|name| (name.to_string(), Socket::new(owner, node.clone(), *name)))
                .collect(),
        }
    }

    /// The socket declared as `key`.
    pub fn get(&self, key: &str) -> Result<&Socket, GraphError> {
        self.sockets
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, socket)| socket)
            .ok_or_else(|| unknown(key))
    }

    /// All sockets in declaration order.
    pub fn values(&self) -> impl Iterator<Item = &Socket> {
        self.sockets.iter().map(|(_, socket)| socket)
    }

    /// Name and socket pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Socket)> {
        self.sockets
            .iter()
            .map(|(name, socket)| (name.as_str(), socket))
    }

    /// Declared output names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sockets.iter().map(|(name, _)| name.as_str())
    }

    /// Number of declared outputs.
    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    /// Whether the node declares no outputs at all.
    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }
}

fn unknown(key: &str) -> GraphError {
    GraphError::UnknownKey {
        key: key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upstream(name: &str) -> Socket {
        let socket = Socket::new(NodeId::new(), Weak::new(), name);
        socket.set_value(socket.owner(), json!(1)).unwrap();
        socket
    }

    #[test]
    fn test_identifier_policy() {
        let policy = NamePolicy::Identifier;
        assert!(policy.check("v1").is_ok());
        assert!(policy.check("_private").is_ok());
        assert!(policy.check("").is_err());
        assert!(policy.check("1v").is_err());
        assert!(policy.check("has space").is_err());
        assert!(policy.check("dash-ed").is_err());
    }

    #[test]
    fn test_non_empty_policy() {
        let policy = NamePolicy::NonEmpty;
        assert!(policy.check("has space").is_ok());
        assert!(policy.check("dash-ed").is_ok());
        assert!(policy.check("").is_err());
        assert!(policy.check(" padded ").is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Inputs::new(&["a", "b", "a"], NamePolicy::default()).unwrap_err();
        assert!(matches!(err, GraphError::InvalidName { name, .. } if name == "a"));
    }

    #[test]
    fn test_inputs_start_unconnected() {
        let inputs = Inputs::new(&["v1", "v2"], NamePolicy::default()).unwrap();
        assert_eq!(inputs.len(), 2);
        assert!(inputs.get("v1").unwrap().is_none());
        assert!(inputs.values().all(|binding| binding.is_none()));
        assert_eq!(inputs.names().collect::<Vec<_>>(), vec!["v1", "v2"]);
    }

    #[test]
    fn test_set_and_get_binding() {
        let mut inputs = Inputs::new(&["v1", "v2"], NamePolicy::default()).unwrap();
        let socket = upstream("v");

        inputs.set("v2", Some(socket.clone())).unwrap();
        assert!(inputs.get("v2").unwrap().unwrap().ptr_eq(&socket));

        let bound: Vec<bool> = inputs.values().map(|b| b.is_some()).collect();
        assert_eq!(bound, vec![false, true]);

        inputs.set("v2", None).unwrap();
        assert!(inputs.get("v2").unwrap().is_none());
    }

    #[test]
    fn test_binding_holds_upstream_node() {
        let mut inputs = Inputs::new(&["v1"], NamePolicy::default()).unwrap();
        assert!(inputs.upstream("v1").unwrap().is_none());

        // An ownerless socket binds fine but has no node to hold on to.
        inputs.set("v1", Some(upstream("v"))).unwrap();
        assert!(inputs.get("v1").unwrap().is_some());
        assert!(inputs.upstream("v1").unwrap().is_none());
        assert!(inputs.upstream("v2").is_err());
    }

    #[test]
    fn test_unknown_input_key() {
        let mut inputs = Inputs::new(&["v1"], NamePolicy::default()).unwrap();
        let expected = GraphError::UnknownKey { key: "v3".into() };
        assert_eq!(inputs.set("v3", None).unwrap_err(), expected);
        assert_eq!(inputs.get("v3").unwrap_err(), expected);
    }

    #[test]
    fn test_set_any_accepts_sockets_only() {
        let mut inputs = Inputs::new(&["v1"], NamePolicy::default()).unwrap();
        let socket = upstream("v");

        inputs.set_any("v1", &socket).unwrap();
        assert!(inputs.get("v1").unwrap().is_some());

        inputs.set_any("v1", &None::<Socket>).unwrap();
        assert!(inputs.get("v1").unwrap().is_none());

        let err = inputs.set_any("v1", &json!(5)).unwrap_err();
        assert_eq!(err, GraphError::TypeMismatch { key: "v1".into() });

        let err = inputs.set_any("nope", &42_i32).unwrap_err();
        assert_eq!(err, GraphError::UnknownKey { key: "nope".into() });
    }

    #[test]
    fn test_outputs_lookup() {
        let owner = NodeId::new();
        let outputs = Outputs::allocate(owner, &Weak::new(), &["sum", "carry"]);
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs.get("carry").unwrap().owner(), owner);
        assert_eq!(outputs.names().collect::<Vec<_>>(), vec!["sum", "carry"]);
        assert!(outputs.values().all(|s| !s.is_valid()));
        assert_eq!(
            outputs.get("v").unwrap_err(),
            GraphError::UnknownKey { key: "v".into() }
        );
    }
}
