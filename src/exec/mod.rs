//! Executing compiled graphs.
//!
//! The executor is an explicit dependency: [`Runner::new`] uses
//! [`LocalExecutor`], and [`Runner::with_executor`] injects any other
//! [`Executor`], including a plain closure `Fn(&Graph, &Key) -> Result<Value, ExecError>`.


use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::debug;

use crate::compile::{CompileError, Compiler};
use crate::graph::{Descriptor, Graph, Key, Target};
use crate::tree::{NodeId, Tree};
use crate::value::{Function, Value};

#[derive(Clone, Debug, PartialEq)]
pub enum ExecError {
    /// A descriptor references a key with no entry.
    MissingKey(Key),
    /// The entry depends on itself.
    Cycle(Key),
    /// A tree id with no node.
    MissingNode(NodeId),
    /// The callee evaluated to something that is not a function.
    NotCallable { found: &'static str },
    /// A function rejected its arguments.
    Call { function: String, message: String },
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::MissingKey(key) => write!(f, "no graph entry for key '{}'", key),
            ExecError::Cycle(key) => write!(f, "entry '{}' depends on itself", key),
            ExecError::MissingNode(node) => write!(f, "node {} is not in the tree", node),
            ExecError::NotCallable { found } => write!(f, "cannot call a value of type {}", found),
            ExecError::Call { function, message } => write!(f, "{}: {}", function, message),
        }
    }
}

impl std::error::Error for ExecError {}

pub(crate) fn call_function(
    function: &Function,
    args: &[Value],
    kwargs: &[(String, Value)],
) -> Result<Value, ExecError> {
    function.call(args, kwargs).map_err(|message| ExecError::Call {
        function: function.name().to_string(),
        message,
    })
}

pub(crate) fn invoke(
    callee: &Value,
    args: &[Value],
    kwargs: &[(String, Value)],
) -> Result<Value, ExecError> {
    let function = callee.as_function().ok_or(ExecError::NotCallable {
        found: callee.type_name(),
    })?;
    call_function(function, args, kwargs)
}

/// Evaluates the entry `key` of a graph.
pub trait Executor {
    fn get(&self, graph: &Graph, key: &Key) -> Result<Value, ExecError>;
}

impl<F> Executor for F
where
    F: Fn(&Graph, &Key) -> Result<Value, ExecError>,
{
    fn get(&self, graph: &Graph, key: &Key) -> Result<Value, ExecError> {
        self(graph, key)
    }
}

/// Sequential reference executor. Evaluates only the entries `key` depends
/// on, each once.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalExecutor;

impl Executor for LocalExecutor {
    fn get(&self, graph: &Graph, key: &Key) -> Result<Value, ExecError> {
        let mut values: HashMap<Key, Value> = HashMap::new();
        let mut pending: HashSet<&Key> = HashSet::new();
        let mut stack = vec![(key, false)];

        while let Some((current, ready)) = stack.pop() {
            if values.contains_key(current) {
                continue;
            }
            let descriptor = graph
                .get(current)
                .ok_or_else(|| ExecError::MissingKey(current.clone()))?;
            if !ready {
                // Still expanding below itself: only a cycle gets back here.
                if !pending.insert(current) {
                    return Err(ExecError::Cycle(current.clone()));
                }
                stack.push((current, true));
                for dep in descriptor.dependencies().into_iter().rev() {
                    if !values.contains_key(dep) {
                        stack.push((dep, false));
                    }
                }
                continue;
            }

            let lookup = |k: &Key| -> Result<Value, ExecError> {
                values
                    .get(k)
                    .cloned()
                    .ok_or_else(|| ExecError::MissingKey(k.clone()))
            };
            let value = match descriptor {
                Descriptor::Literal(value) => value.clone(),
                Descriptor::Tuple(items) => {
                    Value::List(items.iter().map(lookup).collect::<Result<_, _>>()?)
                }
                Descriptor::Apply {
                    target,
                    args,
                    kwargs,
                } => {
                    let args = args.iter().map(lookup).collect::<Result<Vec<_>, _>>()?;
                    let kwargs = kwargs
                        .iter()
                        .map(|(name, k)| Ok((name.clone(), lookup(k)?)))
                        .collect::<Result<Vec<_>, ExecError>>()?;
                    match target {
                        Target::Function(f) => call_function(f, &args, &kwargs)?,
                        Target::Key(callee) => invoke(&lookup(callee)?, &args, &kwargs)?,
                    }
                }
            };
            pending.remove(current);
            values.insert(current.clone(), value);
        }

        debug!(key = %key, evaluated = values.len(), "executed graph");
        values
            .remove(key)
            .ok_or_else(|| ExecError::MissingKey(key.clone()))
    }
}

/// Failure of [`Runner::run`].
#[derive(Clone, Debug, PartialEq)]
pub enum RunError {
    Compile(CompileError),
    Exec(ExecError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Compile(err) => write!(f, "{}", err),
            RunError::Exec(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RunError {}

impl From<CompileError> for RunError {
    fn from(err: CompileError) -> Self {
        RunError::Compile(err)
    }
}

impl From<ExecError> for RunError {
    fn from(err: ExecError) -> Self {
        RunError::Exec(err)
    }
}

/// Compiles a tree and hands the graph to an executor.
#[derive(Clone, Debug, Default)]
pub struct Runner<E = LocalExecutor> {
    compiler: Compiler,
    executor: E,
}

impl Runner<LocalExecutor> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: Executor> Runner<E> {
    pub fn with_executor(executor: E) -> Self {
        Self {
            compiler: Compiler::default(),
            executor,
        }
    }

    pub fn with_compiler(mut self, compiler: Compiler) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn run(&self, tree: &Tree, root: NodeId) -> Result<Value, RunError> {
        let (graph, key) = self.compiler.compile(tree, root)?;
        Ok(self.executor.get(&graph, &key)?)
    }
}
