use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(
    name = "daisy",
    version,
    about = "Compile shared call trees into minimal task graphs"
)]
struct Cli {
    /// Log compiler and executor activity to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a .dsy file and print its task graph
    Compile(cli::compile::CompileArgs),
    /// Compile and execute a .dsy file, printing the root value
    Run(cli::run::RunArgs),
    /// Print the structural fingerprint of a compiled .dsy file
    Fingerprint(cli::fingerprint::FingerprintArgs),
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Compile(args) => cli::compile::cmd_compile(args),
        Command::Run(args) => cli::run::cmd_run(args),
        Command::Fingerprint(args) => cli::fingerprint::cmd_fingerprint(args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "daisy=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
