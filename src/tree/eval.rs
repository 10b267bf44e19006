//! Direct evaluation of a tree, without compiling it to a graph.
//!
//! This is the reference semantics the compiled graph must reproduce.

use super::{Callee, Node, NodeId, Tree};
use crate::exec::{call_function, invoke, ExecError};
use crate::value::Value;

impl Tree {
    /// Evaluate `root` by walking the tree. Shared nodes are evaluated once.
    pub fn eval(&self, root: NodeId) -> Result<Value, ExecError> {
        if self.get(root).is_none() {
            return Err(ExecError::MissingNode(root));
        }
        let mut values: Vec<Option<Value>> = vec![None; self.len()];
        let mut stack = vec![(root, false)];

        while let Some((id, expanded)) = stack.pop() {
            if values[id.index()].is_some() {
                continue;
            }
            let node = &self.nodes[id.index()];
            if !expanded {
                stack.push((id, true));
                for child in node.children().into_iter().rev() {
                    if values[child.index()].is_none() {
                        stack.push((child, false));
                    }
                }
                continue;
            }

            let value_of = |child: NodeId| -> Result<Value, ExecError> {
                values[child.index()]
                    .clone()
                    .ok_or(ExecError::MissingNode(child))
            };

            let value = match node {
                Node::Terminal(value) => value.clone(),
                Node::Tuple(items) => Value::List(
                    items
                        .iter()
                        .map(|item| value_of(*item))
                        .collect::<Result<_, _>>()?,
                ),
                Node::Invocation(call) => {
                    let args = call
                        .args
                        .iter()
                        .map(|arg| value_of(*arg))
                        .collect::<Result<Vec<_>, _>>()?;
                    let kwargs = call
                        .keywords()
                        .into_iter()
                        .map(|(name, arg)| Ok((name.to_string(), value_of(arg)?)))
                        .collect::<Result<Vec<_>, ExecError>>()?;
                    match &call.callee {
                        Callee::Function(f) => call_function(f, &args, &kwargs)?,
                        Callee::Node(callee) => invoke(&value_of(*callee)?, &args, &kwargs)?,
                    }
                }
            };
            values[id.index()] = Some(value);
        }

        values[root.index()]
            .take()
            .ok_or(ExecError::MissingNode(root))
    }
}
