use std::path::PathBuf;

use clap::Args;
use daisy::Compiler;

use super::{compile_or_exit, load_source};

#[derive(Args)]
pub struct FingerprintArgs {
    /// Input .dsy file
    pub input: PathBuf,
    /// Show the full 256-bit hash instead of the short form
    #[arg(long)]
    pub full: bool,
}

pub fn cmd_fingerprint(args: FingerprintArgs) {
    let parsed = load_source(&args.input);
    let (graph, root) = compile_or_exit(&Compiler::default(), &parsed);
    let fingerprint = graph.fingerprint(&root);

    if args.full {
        println!("{} {}", fingerprint.to_hex(), args.input.display());
    } else {
        println!("{} {}", fingerprint, args.input.display());
    }
    eprintln!("{} entries from {} nodes", graph.len(), parsed.tree.len());
}
