use std::path::PathBuf;
use std::process;

use clap::{Args, ValueEnum};
use daisy::{CompileOptions, Compiler};

use super::{compile_or_exit, load_source};

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum Format {
    /// One `key = task` line per entry
    #[default]
    Text,
    /// Pretty-printed JSON document
    Json,
    /// Graphviz digraph
    Dot,
}

#[derive(Args)]
pub struct CompileArgs {
    /// Input .dsy file
    pub input: PathBuf,
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
    /// Use bare sequence keys (k0, k1, ...) instead of labelled ones
    #[arg(long)]
    pub no_labels: bool,
    /// Validate the graph even in release builds
    #[arg(long)]
    pub verify: bool,
    /// Write the graph to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn cmd_compile(args: CompileArgs) {
    let CompileArgs {
        input,
        format,
        no_labels,
        verify,
        output,
    } = args;
    let parsed = load_source(&input);

    let mut options = CompileOptions::default().with_labels(!no_labels);
    if verify {
        options = options.with_verify(true);
    }
    let compiler = Compiler::new(options);
    let (graph, root) = compile_or_exit(&compiler, &parsed);

    let rendered = match format {
        Format::Text => format!("{}root = {}\n", graph, root),
        Format::Dot => graph.to_dot(),
        Format::Json => match graph.to_json(&root) {
            Ok(json) => json + "\n",
            Err(e) => {
                eprintln!("error: cannot serialize graph: {}", e);
                process::exit(1);
            }
        },
    };

    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, rendered) {
                eprintln!("error: cannot write '{}': {}", path.display(), e);
                process::exit(1);
            }
            eprintln!(
                "Compiled {} nodes -> {} entries -> {}",
                parsed.tree.len(),
                graph.len(),
                path.display()
            );
        }
        None => print!("{}", rendered),
    }
}
