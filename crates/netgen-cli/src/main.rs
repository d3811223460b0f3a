#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "netgen: coverage-guided instruction generator for social-network model checkers",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        OutputMode::detect(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Generate",
        about = "Generate one instruction file",
        long_about = "Generate one instruction file for the given mode and count, steering \
                      generation until every command has succeeded and every catalogued \
                      failure has been produced.",
        after_help = "EXAMPLES:\n    # Public-mode file of 5000 instructions\n    netgen generate --mode public --count 5000 --output data.txt\n\n    # Reproduce a mutual-mode file from its seed\n    netgen generate -m M -n 3000 -o data.txt --seed 42\n\n    # Emit the run report as JSON\n    netgen generate -n 1000 -o data.txt --json"
    )]
    Generate(cmd::generate::GenerateArgs),

    #[command(
        next_help_heading = "Generate",
        about = "Generate a numbered batch of files",
        long_about = "Generate one file per seed into a directory as test_data_<i>.txt and \
                      summarize coverage across the batch.",
        after_help = "EXAMPLES:\n    # Ten public-mode files from seeds 100..110\n    netgen batch --cases 10 --seed-start 100 --out-dir data/\n\n    # Mutual-mode batch with a summary in JSON\n    netgen batch --cases 5 --mode mutual --out-dir data/ --json"
    )]
    Batch(cmd::batch::BatchArgs),

    #[command(
        next_help_heading = "Inspect",
        about = "Replay an instruction file",
        long_about = "Parse an instruction file, replay it through the classifier and state \
                      updaters, and report per-command outcomes, coverage and invariant \
                      violations.",
        after_help = "EXAMPLES:\n    # Audit a generated file\n    netgen verify data.txt\n\n    # Fail when the file has gaps or inconsistencies\n    netgen verify data.txt --strict"
    )]
    Verify(cmd::verify::VerifyArgs),

    #[command(
        next_help_heading = "Inspect",
        about = "Print the failure catalog",
        long_about = "Print every catalogued (command, failure) pair with the exception the \
                      target raises for it.",
        after_help = "EXAMPLES:\n    # List all failure keys\n    netgen catalog\n\n    # Only one command\n    netgen catalog --command att"
    )]
    Catalog(cmd::catalog::CatalogArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        long_about = "Generate shell completion scripts for netgen.",
        after_help = "EXAMPLES:\n    # Bash\n    netgen completions bash > ~/.local/share/bash-completion/completions/netgen\n\n    # Zsh\n    netgen completions zsh > ~/.zfunc/_netgen"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("NETGEN_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "netgen=debug,info"
        } else {
            "netgen=info,warn"
        })
    });

    let format = env::var("NETGEN_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }
    let output = cli.output_mode();

    match cli.command {
        Commands::Generate(ref args) => cmd::generate::run_generate(args, output),
        Commands::Batch(ref args) => cmd::batch::run_batch(args, output),
        Commands::Verify(ref args) => cmd::verify::run_verify(args, output),
        Commands::Catalog(ref args) => cmd::catalog::run_catalog(args, output),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}
