//! Node classification: one compilation rule per node kind.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::graph::{Descriptor, Key, Target};
use crate::tree::{Callee, Node, NodeId, NodeKind, Tree};
use crate::value::Value;

/// How one kind of node becomes a graph entry.
///
/// The driver resolves every node returned by [`dependencies`] before
/// calling [`descriptor`] with their keys in the same order.
///
/// [`dependencies`]: CompileRule::dependencies
/// [`descriptor`]: CompileRule::descriptor
pub trait CompileRule: Send + Sync {
    fn dependencies(&self, node: &Node) -> Vec<NodeId>;

    /// Readable fragment for the entry's key.
    fn label<'t>(&self, _node: &'t Node, _tree: &'t Tree) -> Option<&'t str> {
        None
    }

    /// Build the descriptor, or `None` if `node` is not a kind this rule
    /// understands.
    fn descriptor(&self, node: &Node, deps: Vec<Key>) -> Option<Descriptor>;
}

pub struct TerminalRule;

impl CompileRule for TerminalRule {
    fn dependencies(&self, _node: &Node) -> Vec<NodeId> {
        Vec::new()
    }

    fn descriptor(&self, node: &Node, _deps: Vec<Key>) -> Option<Descriptor> {
        match node {
            Node::Terminal(value) => Some(Descriptor::Literal(value.clone())),
            _ => None,
        }
    }
}

pub struct InvocationRule;

impl CompileRule for InvocationRule {
    fn dependencies(&self, node: &Node) -> Vec<NodeId> {
        let Node::Invocation(call) = node else {
            return Vec::new();
        };
        let mut deps = Vec::with_capacity(1 + call.args.len() + call.kwargs.len());
        if let Callee::Node(id) = call.callee {
            deps.push(id);
        }
        deps.extend(call.args.iter().copied());
        deps.extend(call.keywords().into_iter().map(|(_, id)| id));
        deps
    }

    fn label<'t>(&self, node: &'t Node, tree: &'t Tree) -> Option<&'t str> {
        let Node::Invocation(call) = node else {
            return None;
        };
        match &call.callee {
            Callee::Function(f) => Some(f.name()),
            Callee::Node(id) => match tree.get(*id)? {
                Node::Terminal(Value::Func(f)) => Some(f.name()),
                _ => None,
            },
        }
    }

    fn descriptor(&self, node: &Node, deps: Vec<Key>) -> Option<Descriptor> {
        let Node::Invocation(call) = node else {
            return None;
        };
        let mut deps = deps.into_iter();
        let target = match &call.callee {
            Callee::Function(f) => Target::Function(f.clone()),
            Callee::Node(_) => Target::Key(deps.next()?),
        };
        let args: Vec<Key> = deps.by_ref().take(call.args.len()).collect();
        let kwargs = call
            .keywords()
            .into_iter()
            .zip(deps)
            .map(|((name, _), key)| (name.to_string(), key))
            .collect();
        Some(Descriptor::Apply {
            target,
            args,
            kwargs,
        })
    }
}

pub struct TupleRule;

impl CompileRule for TupleRule {
    fn dependencies(&self, node: &Node) -> Vec<NodeId> {
        match node {
            Node::Tuple(items) => items.clone(),
            _ => Vec::new(),
        }
    }

    fn descriptor(&self, node: &Node, deps: Vec<Key>) -> Option<Descriptor> {
        match node {
            Node::Tuple(_) => Some(Descriptor::Tuple(deps)),
            _ => None,
        }
    }
}

/// Registration table from node kind to rule.
#[derive(Clone)]
pub struct RuleTable {
    rules: BTreeMap<NodeKind, Arc<dyn CompileRule>>,
}

impl RuleTable {
    /// A table with no rules; every node is unsupported.
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Rules for every built-in node kind.
    pub fn standard() -> Self {
        Self::empty()
            .with(NodeKind::Terminal, TerminalRule)
            .with(NodeKind::Invocation, InvocationRule)
            .with(NodeKind::Tuple, TupleRule)
    }

    /// Register `rule` for `kind`, returning the rule it replaces.
    pub fn register(
        &mut self,
        kind: NodeKind,
        rule: impl CompileRule + 'static,
    ) -> Option<Arc<dyn CompileRule>> {
        self.rules.insert(kind, Arc::new(rule))
    }

    pub fn with(mut self, kind: NodeKind, rule: impl CompileRule + 'static) -> Self {
        self.register(kind, rule);
        self
    }

    pub fn get(&self, kind: NodeKind) -> Option<&dyn CompileRule> {
        self.rules.get(&kind).map(|rule| rule.as_ref())
    }

    pub fn kinds(&self) -> impl Iterator<Item = NodeKind> + '_ {
        self.rules.keys().copied()
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.kinds()).finish()
    }
}
