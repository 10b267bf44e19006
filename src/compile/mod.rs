//! Tree-to-graph compilation with common-subexpression elimination.
//!
//! The driver walks the tree dependencies-first using an explicit work
//! stack, so arbitrarily deep trees compile without recursion. Every node is
//! resolved through the [`Scope`]; a node reached a second time contributes
//! no new entry. The resulting graph has exactly one entry per distinct node
//! reachable from the root.

pub mod rules;
mod scope;


use std::fmt;

use tracing::{debug, trace};

pub use rules::{CompileRule, RuleTable};
pub use scope::Scope;

use crate::graph::{Graph, GraphError, Key, KeyAllocator, KeySource};
use crate::tree::{NodeId, NodeKind, Tree};

/// Options controlling compilation.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Embed callee names in keys (`add-3` instead of `k3`).
    pub labels: bool,
    /// Validate the finished graph before returning it.
    pub verify: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            labels: true,
            verify: cfg!(debug_assertions),
        }
    }
}

impl CompileOptions {
    pub fn with_labels(mut self, labels: bool) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileError {
    /// No rule is registered for the kind of `node`.
    UnsupportedNodeKind { kind: NodeKind, node: NodeId },
    /// The id is not part of the tree.
    UnknownNode(NodeId),
    /// The finished graph failed validation.
    Invalid(GraphError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnsupportedNodeKind { kind, node } => {
                write!(f, "no compilation rule for {} node {}", kind, node)
            }
            CompileError::UnknownNode(node) => write!(f, "node {} is not in the tree", node),
            CompileError::Invalid(err) => write!(f, "compiled graph is invalid: {}", err),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<GraphError> for CompileError {
    fn from(err: GraphError) -> Self {
        CompileError::Invalid(err)
    }
}

/// Work item of the post-order traversal.
enum Visit {
    Enter(NodeId),
    Exit(NodeId, Vec<NodeId>),
}

#[derive(Clone, Debug, Default)]
pub struct Compiler {
    options: CompileOptions,
    rules: RuleTable,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            rules: RuleTable::standard(),
        }
    }

    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.rules = rules;
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Compile `root` with a fresh key allocator.
    pub fn compile(&self, tree: &Tree, root: NodeId) -> Result<(Graph, Key), CompileError> {
        self.compile_with(tree, root, &KeyAllocator::new())
    }

    /// Compile `root`, drawing keys from `keys`.
    pub fn compile_with(
        &self,
        tree: &Tree,
        root: NodeId,
        keys: &dyn KeySource,
    ) -> Result<(Graph, Key), CompileError> {
        if tree.get(root).is_none() {
            return Err(CompileError::UnknownNode(root));
        }

        let mut graph = Graph::new();
        let mut scope = Scope::with_capacity(tree.len());
        let mut stack = vec![Visit::Enter(root)];

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(id) => {
                    if scope.contains(id) {
                        continue;
                    }
                    let node = tree.get(id).ok_or(CompileError::UnknownNode(id))?;
                    let deps = self.rule_for(tree, id)?.dependencies(node);
                    let pending: Vec<NodeId> = deps
                        .iter()
                        .rev()
                        .copied()
                        .filter(|dep| !scope.contains(*dep))
                        .collect();
                    stack.push(Visit::Exit(id, deps));
                    stack.extend(pending.into_iter().map(Visit::Enter));
                }
                Visit::Exit(id, deps) => {
                    scope.resolve(id, |scope| -> Result<Key, CompileError> {
                        let node = tree.get(id).ok_or(CompileError::UnknownNode(id))?;
                        let rule = self.rule_for(tree, id)?;
                        let dep_keys = deps
                            .iter()
                            .map(|dep| {
                                scope
                                    .get(*dep)
                                    .cloned()
                                    .ok_or(CompileError::UnknownNode(*dep))
                            })
                            .collect::<Result<Vec<_>, _>>()?;
                        let descriptor = rule.descriptor(node, dep_keys).ok_or(
                            CompileError::UnsupportedNodeKind {
                                kind: node.kind(),
                                node: id,
                            },
                        )?;
                        let label = if self.options.labels {
                            rule.label(node, tree)
                        } else {
                            None
                        };
                        let key = keys.allocate(label);
                        trace!(node = %id, key = %key, "compiled {}", node.kind());
                        graph.insert(key.clone(), descriptor);
                        Ok(key)
                    })?;
                }
            }
        }

        let root_key = scope
            .get(root)
            .cloned()
            .ok_or(CompileError::UnknownNode(root))?;
        if self.options.verify {
            graph.validate()?;
        }
        debug!(
            nodes = tree.len(),
            entries = graph.len(),
            root = %root_key,
            "compiled tree"
        );
        Ok((graph, root_key))
    }

    fn rule_for(&self, tree: &Tree, id: NodeId) -> Result<&dyn CompileRule, CompileError> {
        let kind = tree
            .get(id)
            .ok_or(CompileError::UnknownNode(id))?
            .kind();
        self.rules
            .get(kind)
            .ok_or(CompileError::UnsupportedNodeKind { kind, node: id })
    }
}

/// Compile `root` with the standard rules and default options.
pub fn compile(tree: &Tree, root: NodeId) -> Result<(Graph, Key), CompileError> {
    Compiler::default().compile(tree, root)
}
