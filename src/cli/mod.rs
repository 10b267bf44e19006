pub mod compile;
pub mod fingerprint;
pub mod run;

use std::path::Path;
use std::process;

use daisy::{Compiler, Graph, Key, SourceTree};

/// Read and parse a `.dsy` file. Diagnostics are rendered to stderr; any
/// error exits the process.
pub fn load_source(input: &Path) -> SourceTree {
    if !input.extension().is_some_and(|e| e == "dsy") {
        eprintln!("error: input must be a .dsy file");
        process::exit(1);
    }
    let source = match std::fs::read_to_string(input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", input.display(), e);
            process::exit(1);
        }
    };
    let filename = input.display().to_string();
    match daisy::parse_source(&source, &filename) {
        Ok(parsed) => parsed,
        Err(errors) => {
            eprintln!(
                "error: could not parse '{}' ({} error(s))",
                filename,
                errors.len()
            );
            process::exit(1);
        }
    }
}

pub fn compile_or_exit(compiler: &Compiler, parsed: &SourceTree) -> (Graph, Key) {
    match compiler.compile(&parsed.tree, parsed.root) {
        Ok(compiled) => compiled,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}
