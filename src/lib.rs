//! Compile lazily-built call trees into minimal task graphs.
//!
//! A [`Tree`] of terminals and invocations, possibly sharing nodes, is
//! compiled into a flat [`Graph`] of keyed tasks with one entry per distinct
//! node. The graph is handed to an [`Executor`]; [`LocalExecutor`] is the
//! default.
//!
//! ```
//! use daisy::{builtins, compile, Executor, LocalExecutor, Tree, Value};
//!
//! let add = builtins::lookup("add").unwrap();
//! let mut tree = Tree::new();
//! let one = tree.terminal(1);
//! let two = tree.terminal(2);
//! let inner = tree.call(add.clone(), [one, two]);
//! let outer = tree.call(add, [inner, inner]);
//!
//! let (graph, root) = compile(&tree, outer).unwrap();
//! assert_eq!(graph.len(), 4);
//! assert_eq!(LocalExecutor.get(&graph, &root), Ok(Value::Int(6)));
//! ```

pub mod builtins;
pub mod compile;
pub mod diagnostic;
pub mod exec;
pub mod graph;
pub mod span;
pub mod syntax;
pub mod tree;
pub mod value;

pub use compile::{compile, CompileError, CompileOptions, CompileRule, Compiler, RuleTable};
pub use exec::{ExecError, Executor, LocalExecutor, RunError, Runner};
pub use graph::{Descriptor, Fingerprint, Graph, GraphError, Key, KeySource, Target};
pub use syntax::SourceTree;
pub use tree::{Callee, Invocation, Node, NodeId, NodeKind, Tree};
pub use value::{Function, Value};

use diagnostic::{render_diagnostics, Diagnostic};

/// Parse `.dsy` source, rendering any diagnostics (errors and warnings)
/// to stderr.
pub fn parse_source(source: &str, filename: &str) -> Result<SourceTree, Vec<Diagnostic>> {
    match syntax::parse(source) {
        Ok(parsed) => {
            render_diagnostics(&parsed.warnings, filename, source);
            Ok(parsed)
        }
        Err(errors) => {
            render_diagnostics(&errors, filename, source);
            Err(errors)
        }
    }
}
