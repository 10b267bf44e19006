//! Graph exports: petgraph, Graphviz DOT and JSON.

use std::collections::HashMap;
use std::fmt;

use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use super::{Descriptor, Graph, Key, Target};
use crate::value::Value;

/// Role of a dependency edge, pointing from the operand to its consumer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Edge {
    Callee,
    Arg(usize),
    Keyword(String),
    Item(usize),
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Callee => write!(f, "callee"),
            Edge::Arg(i) => write!(f, "arg{}", i),
            Edge::Keyword(name) => write!(f, "{}", name),
            Edge::Item(i) => write!(f, "item{}", i),
        }
    }
}

impl Graph {
    /// Build a petgraph view with one vertex per entry. Edges run from a
    /// dependency to the entry that reads it. References to missing keys
    /// are skipped.
    pub fn to_petgraph(&self) -> (DiGraph<Key, Edge>, HashMap<Key, NodeIndex>) {
        let mut graph = DiGraph::with_capacity(self.len(), self.len());
        let mut index = HashMap::with_capacity(self.len());
        for key in self.keys() {
            index.insert(key.clone(), graph.add_node(key.clone()));
        }
        for (key, descriptor) in self.iter() {
            let to = index[key];
            let mut link = |dep: &Key, edge: Edge| {
                if let Some(&from) = index.get(dep) {
                    graph.add_edge(from, to, edge);
                }
            };
            match descriptor {
                Descriptor::Literal(_) => {}
                Descriptor::Apply {
                    target,
                    args,
                    kwargs,
                } => {
                    if let Target::Key(callee) = target {
                        link(callee, Edge::Callee);
                    }
                    for (i, arg) in args.iter().enumerate() {
                        link(arg, Edge::Arg(i));
                    }
                    for (name, arg) in kwargs {
                        link(arg, Edge::Keyword(name.clone()));
                    }
                }
                Descriptor::Tuple(items) => {
                    for (i, item) in items.iter().enumerate() {
                        link(item, Edge::Item(i));
                    }
                }
            }
        }
        (graph, index)
    }

    /// Render as a Graphviz digraph.
    pub fn to_dot(&self) -> String {
        let (graph, _) = self.to_petgraph();
        format!("{}", Dot::with_config(&graph, &[]))
    }

    /// Render as pretty-printed JSON with `root` marked.
    pub fn to_json(&self, root: &Key) -> Result<String, serde_json::Error> {
        let document = GraphDocument {
            root: root.to_string(),
            entries: self.iter().map(|(k, d)| EntryDocument::new(k, d)).collect(),
        };
        serde_json::to_string_pretty(&document)
    }
}

#[derive(Serialize)]
struct GraphDocument {
    root: String,
    entries: Vec<EntryDocument>,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum EntryDocument {
    Literal {
        key: String,
        value: serde_json::Value,
    },
    Apply {
        key: String,
        target: String,
        args: Vec<String>,
        kwargs: Vec<(String, String)>,
    },
    Tuple {
        key: String,
        items: Vec<String>,
    },
}

impl EntryDocument {
    fn new(key: &Key, descriptor: &Descriptor) -> Self {
        let key = key.to_string();
        match descriptor {
            Descriptor::Literal(value) => EntryDocument::Literal {
                key,
                value: value_to_json(value),
            },
            Descriptor::Apply {
                target,
                args,
                kwargs,
            } => EntryDocument::Apply {
                key,
                target: match target {
                    Target::Function(f) => f.to_string(),
                    Target::Key(k) => k.to_string(),
                },
                args: args.iter().map(|k| k.to_string()).collect(),
                kwargs: kwargs
                    .iter()
                    .map(|(name, k)| (name.clone(), k.to_string()))
                    .collect(),
            },
            Descriptor::Tuple(items) => EntryDocument::Tuple {
                key,
                items: items.iter().map(|k| k.to_string()).collect(),
            },
        }
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;
    match value {
        Value::None => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(n) => Json::from(*n),
        Value::Float(x) => serde_json::Number::from_f64(*x)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::Str(s) => Json::String(s.to_string()),
        Value::List(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Func(f) => Json::String(f.to_string()),
    }
}
