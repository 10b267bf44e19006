//! Task graphs: the flat output of compilation.
//!
//! A [`Graph`] maps each [`Key`] to a [`Descriptor`]. Descriptors reference
//! other entries only through keys. Graphs produced by the compiler satisfy:
//!
//! - every key referenced by a descriptor is an entry of the same graph;
//! - a descriptor only references keys allocated before its own, so
//!   iterating in key order visits dependencies first.

mod export;
mod fingerprint;
pub mod key;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;

pub use export::Edge;
pub use fingerprint::Fingerprint;
pub use key::{Key, KeyAllocator, KeySource, SharedKeyAllocator};

use crate::value::{Function, Value};

/// What an `Apply` task calls.
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    /// A function embedded directly in the task.
    Function(Function),
    /// The value of another entry.
    Key(Key),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Descriptor {
    /// Resolves to the stored value.
    Literal(Value),
    /// `target(*args, **kwargs)` with every operand given by key.
    /// Keywords are sorted by name.
    Apply {
        target: Target,
        args: Vec<Key>,
        kwargs: Vec<(String, Key)>,
    },
    /// A list of the referenced values.
    Tuple(Vec<Key>),
}

impl Descriptor {
    /// Keys this descriptor reads, in operand order.
    pub fn dependencies(&self) -> Vec<&Key> {
        match self {
            Descriptor::Literal(_) => Vec::new(),
            Descriptor::Apply {
                target,
                args,
                kwargs,
            } => {
                let mut deps = Vec::with_capacity(1 + args.len() + kwargs.len());
                if let Target::Key(key) = target {
                    deps.push(key);
                }
                deps.extend(args.iter());
                deps.extend(kwargs.iter().map(|(_, key)| key));
                deps
            }
            Descriptor::Tuple(items) => items.iter().collect(),
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Literal(value) => write!(f, "{}", value),
            Descriptor::Apply {
                target,
                args,
                kwargs,
            } => {
                match target {
                    Target::Function(func) => write!(f, "{}", func.name())?,
                    Target::Key(key) => write!(f, "{}", key)?,
                }
                write!(f, "(")?;
                let operands = args
                    .iter()
                    .map(|k| k.to_string())
                    .chain(kwargs.iter().map(|(name, k)| format!("{}={}", name, k)));
                for (i, operand) in operands.enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", operand)?;
                }
                write!(f, ")")
            }
            Descriptor::Tuple(items) => {
                write!(f, "[")?;
                for (i, key) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", key)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Structural problem found by [`Graph::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphError {
    /// `from` references `missing`, which has no entry.
    Dangling { from: Key, missing: Key },
    /// The dependency relation has a cycle through `at`.
    Cycle { at: Key },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::Dangling { from, missing } => {
                write!(f, "entry '{}' references missing key '{}'", from, missing)
            }
            GraphError::Cycle { at } => write!(f, "dependency cycle through '{}'", at),
        }
    }
}

impl std::error::Error for GraphError {}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    entries: BTreeMap<Key, Descriptor>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Key) -> Option<&Descriptor> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Descriptor)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    pub(crate) fn insert(&mut self, key: Key, descriptor: Descriptor) {
        let previous = self.entries.insert(key, descriptor);
        debug_assert!(previous.is_none(), "key allocated twice");
    }

    /// Check that every referenced key exists and that the graph is acyclic.
    pub fn validate(&self) -> Result<(), GraphError> {
        for (key, descriptor) in &self.entries {
            for dep in descriptor.dependencies() {
                if !self.entries.contains_key(dep) {
                    return Err(GraphError::Dangling {
                        from: key.clone(),
                        missing: dep.clone(),
                    });
                }
            }
        }
        let (graph, _) = self.to_petgraph();
        petgraph::algo::toposort(&graph, None)
            .map(|_| ())
            .map_err(|cycle| GraphError::Cycle {
                at: graph[cycle.node_id()].clone(),
            })
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, descriptor) in &self.entries {
            writeln!(f, "{} = {}", key, descriptor)?;
        }
        Ok(())
    }
}
