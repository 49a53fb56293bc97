use crate::core::node::{Node, NodeId};
use crate::core::socket::Socket;
use std::collections::HashMap;
use std::fmt;

/// How bad a [`ValidationIssue`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Reading the validated node is guaranteed to fail.
    Error,
    /// Reading the validated node might fail, depending on what compute reads.
    Warning,
}

/// Something found upstream of the validated node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// Input `input` of `node` is fed by output `output` of `upstream`, which is
    /// already on the path being resolved.
    Cycle {
        node: NodeId,
        input: String,
        upstream: NodeId,
        output: String,
    },
    /// Input `input` of `node` is not connected.
    Unconnected { node: NodeId, input: String },
    /// Input `input` of `node` was bound to a detached, never computed socket
    /// whose owning node was already gone.
    Detached {
        node: NodeId,
        input: String,
        output: String,
    },
}

impl ValidationIssue {
    pub fn severity(&self) -> Severity {
        match self {
            ValidationIssue::Cycle { .. } => Severity::Error,
            ValidationIssue::Unconnected { .. } => Severity::Warning,
            ValidationIssue::Detached { .. } => Severity::Error,
        }
    }

    /// The node whose input the issue is about.
    pub fn node(&self) -> NodeId {
        match self {
            ValidationIssue::Cycle { node, .. }
            | ValidationIssue::Unconnected { node, .. }
            | ValidationIssue::Detached { node, .. } => *node,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::Cycle {
                node,
                input,
                upstream,
                output,
            } => write!(
                f,
                "cycle: input '{}' of node {} depends on output '{}' of node {}, which is still being resolved",
                input, node, output, upstream
            ),
            ValidationIssue::Unconnected { node, input } => {
                write!(f, "input '{}' of node {} is unconnected", input, node)
            }
            ValidationIssue::Detached {
                node,
                input,
                output,
            } => write!(
                f,
                "input '{}' of node {} is bound to output '{}' of a node that no longer exists",
                input, node, output
            ),
        }
    }
}

/// The result of a validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// True when nothing found would make a read fail for certain.
    pub fn is_safe(&self) -> bool {
        self.errors().next().is_none()
    }

    /// True when some input might fail at compute time.
    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    /// Issues that make the read fail.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.by_severity(Severity::Error)
    }

    /// Issues that may make the read fail.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.by_severity(Severity::Warning)
    }

    /// Reports every issue through the `log` facade.
    pub fn log_summary(&self) {
        if self.issues.is_empty() {
            log::info!("Graph validation passed: every upstream input is connected and acyclic.");
            return;
        }

        for issue in &self.issues {
            match issue.severity() {
                Severity::Error => log::error!("{}", issue),
                Severity::Warning => log::warn!("{}", issue),
            }
        }
    }

    fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(move |issue| issue.severity() == severity)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current DFS path.
    Visiting,
    Done,
}

/// Checks the subgraph that reading `root` would pull in, without computing anything.
///
/// Walks every input edge upstream (depth first) and reports cycles as errors and
/// unconnected inputs as warnings. Unlike evaluation, this looks at all inputs,
/// including ones a node's compute might never read.
pub fn validate(root: &Node) -> ValidationResult {
    let mut result = ValidationResult::default();
    let mut marks = HashMap::new();
    visit(root, &mut marks, &mut result);
    result
}

fn visit(node: &Node, marks: &mut HashMap<NodeId, Mark>, result: &mut ValidationResult) {
    marks.insert(node.id(), Mark::Visiting);

    // Collect first so no borrow of the inputs is held while recursing.
    let edges: Vec<(String, Option<Socket>, Option<Node>)> = {
        let inputs = node.inputs();
        inputs
            .iter()
            .map(|(input, socket)| {
                let upstream = inputs.upstream(input).ok().flatten().cloned();
                (input.to_string(), socket.cloned(), upstream)
            })
            .collect()
    };

    for (input, socket, upstream) in edges {
        match (socket, upstream) {
            (None, _) => result.issues.push(ValidationIssue::Unconnected {
                node: node.id(),
                input,
            }),
            (Some(socket), None) => {
                if !socket.is_valid() {
                    result.issues.push(ValidationIssue::Detached {
                        node: node.id(),
                        input,
                        output: socket.name().to_string(),
                    });
                }
            }
            (Some(socket), Some(upstream)) => match marks.get(&upstream.id()).copied() {
                Some(Mark::Visiting) => result.issues.push(ValidationIssue::Cycle {
                    node: node.id(),
                    input,
                    upstream: upstream.id(),
                    output: socket.name().to_string(),
                }),
                Some(Mark::Done) => {}
                None => visit(&upstream, marks, result),
            },
        }
    }

    marks.insert(node.id(), Mark::Done);
}
