//! Call trees, the lazily captured input of the compiler.
//!
//! Nodes live in a [`Tree`] arena and are addressed by [`NodeId`]. A node
//! may only reference nodes that were already pushed, so every tree is a
//! finite DAG by construction: sharing is expressed by passing the same
//! `NodeId` to several parents, and a node can never (transitively) contain
//! itself.
//!
//! Node identity is the arena index. Two terminals wrapping equal values are
//! two different nodes unless the caller reuses one `NodeId`.

mod eval;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;

use crate::value::{Function, Value};

/// Index of a node inside its [`Tree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// The thing an invocation calls.
#[derive(Clone, Debug, PartialEq)]
pub enum Callee {
    /// A function known at capture time. It is embedded in the task and
    /// does not occupy a graph entry of its own.
    Function(Function),
    /// A callee that is itself part of the tree (for example the result of
    /// another invocation).
    Node(NodeId),
}

impl From<Function> for Callee {
    fn from(f: Function) -> Self {
        Callee::Function(f)
    }
}

impl From<NodeId> for Callee {
    fn from(id: NodeId) -> Self {
        Callee::Node(id)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Invocation {
    pub callee: Callee,
    pub args: Vec<NodeId>,
    /// Keyword arguments in insertion order. The order carries no meaning.
    pub kwargs: Vec<(String, NodeId)>,
}

impl Invocation {
    /// Keyword arguments sorted by name. A repeated name keeps its last
    /// binding, as a mapping would.
    pub fn keywords(&self) -> Vec<(&str, NodeId)> {
        let map: BTreeMap<&str, NodeId> = self
            .kwargs
            .iter()
            .map(|(name, id)| (name.as_str(), *id))
            .collect();
        map.into_iter().collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// An already-known value.
    Terminal(Value),
    /// A call of a callee on positional and keyword argument nodes.
    Invocation(Invocation),
    /// An ordered collection of nodes, evaluated to a list.
    Tuple(Vec<NodeId>),
}

/// Variant tag of a [`Node`], used to select a compilation rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Terminal,
    Invocation,
    Tuple,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Terminal => write!(f, "terminal"),
            NodeKind::Invocation => write!(f, "invocation"),
            NodeKind::Tuple => write!(f, "tuple"),
        }
    }
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Terminal(_) => NodeKind::Terminal,
            Node::Invocation(_) => NodeKind::Invocation,
            Node::Tuple(_) => NodeKind::Tuple,
        }
    }

    /// Direct children: callee node, positionals, then keywords sorted by
    /// name. A keyword overridden by a later binding of the same name is
    /// not a child.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Node::Terminal(_) => Vec::new(),
            Node::Invocation(call) => {
                let mut out = Vec::with_capacity(1 + call.args.len() + call.kwargs.len());
                if let Callee::Node(id) = call.callee {
                    out.push(id);
                }
                out.extend(call.args.iter().copied());
                out.extend(call.keywords().into_iter().map(|(_, id)| id));
                out
            }
            Node::Tuple(items) => items.clone(),
        }
    }
}

/// Arena of immutable nodes.
#[derive(Clone, Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    /// Add a node. Panics if the node references an id that is not already
    /// in this tree.
    pub fn push(&mut self, node: Node) -> NodeId {
        let next = self.nodes.len();
        let overridden: Vec<NodeId> = match &node {
            Node::Invocation(call) => call.kwargs.iter().map(|(_, id)| *id).collect(),
            _ => Vec::new(),
        };
        for child in node.children().into_iter().chain(overridden) {
            assert!(
                child.index() < next,
                "node references {} which is not in this tree",
                child
            );
        }
        assert!(next < u32::MAX as usize, "tree is full");
        self.nodes.push(node);
        NodeId(next as u32)
    }

    pub fn terminal(&mut self, value: impl Into<Value>) -> NodeId {
        self.push(Node::Terminal(value.into()))
    }

    pub fn call(
        &mut self,
        callee: impl Into<Callee>,
        args: impl IntoIterator<Item = NodeId>,
    ) -> NodeId {
        self.call_with(callee, args, Vec::<(String, NodeId)>::new())
    }

    pub fn call_with<S: Into<String>>(
        &mut self,
        callee: impl Into<Callee>,
        args: impl IntoIterator<Item = NodeId>,
        kwargs: impl IntoIterator<Item = (S, NodeId)>,
    ) -> NodeId {
        self.push(Node::Invocation(Invocation {
            callee: callee.into(),
            args: args.into_iter().collect(),
            kwargs: kwargs
                .into_iter()
                .map(|(name, id)| (name.into(), id))
                .collect(),
        }))
    }

    pub fn tuple(&mut self, items: impl IntoIterator<Item = NodeId>) -> NodeId {
        self.push(Node::Tuple(items.into_iter().collect()))
    }

    /// Number of distinct nodes reachable from `root`, root included.
    pub fn reachable(&self, root: NodeId) -> usize {
        if self.get(root).is_none() {
            return 0;
        }
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        let mut count = 0;
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.index()], true) {
                continue;
            }
            count += 1;
            stack.extend(self.nodes[id.index()].children());
        }
        count
    }

    /// Number of node occurrences when the DAG below `root` is flattened
    /// into a plain tree. Saturates instead of overflowing.
    pub fn occurrences(&self, root: NodeId) -> u64 {
        if self.get(root).is_none() {
            return 0;
        }
        // Children precede parents in the arena, so one forward pass works.
        let mut counts = vec![0u64; root.index() + 1];
        for i in 0..=root.index() {
            counts[i] = self.nodes[i]
                .children()
                .iter()
                .fold(1u64, |acc, c| acc.saturating_add(counts[c.index()]));
        }
        counts[root.index()]
    }
}
