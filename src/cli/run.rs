use std::path::PathBuf;
use std::process;

use clap::Args;
use daisy::{Compiler, Executor, LocalExecutor};

use super::{compile_or_exit, load_source};

#[derive(Args)]
pub struct RunArgs {
    /// Input .dsy file
    pub input: PathBuf,
    /// Evaluate the tree directly instead of compiling it first
    #[arg(long)]
    pub direct: bool,
}

pub fn cmd_run(args: RunArgs) {
    let parsed = load_source(&args.input);

    let result = if args.direct {
        parsed.tree.eval(parsed.root)
    } else {
        let (graph, root) = compile_or_exit(&Compiler::default(), &parsed);
        LocalExecutor.get(&graph, &root)
    };

    match result {
        Ok(value) => println!("{}", value),
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}
