//! fieldgrade CLI: grade exercise submissions against field rules.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "fieldgrade", version, about = "Exercise message grading engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade submissions against an exercise definition
    Grade {
        /// Path to the exercise .toml definition
        #[arg(long)]
        exercise: PathBuf,

        /// Submissions JSON file(s); one file per team
        #[arg(long, required = true, num_args = 1..)]
        submissions: Vec<PathBuf>,

        /// Extra summable keys for team merging (comma-separated)
        #[arg(long)]
        summable: Option<String>,

        /// Output directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: text, json, all
        #[arg(long)]
        format: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate exercise definition files
    Validate {
        /// Path to exercise file or directory
        #[arg(long)]
        exercise: PathBuf,
    },

    /// Show observed-value counters from a saved report
    Counters {
        /// Report JSON written by `grade`
        #[arg(long)]
        report: PathBuf,

        /// Only show this rule key
        #[arg(long)]
        key: Option<String>,
    },

    /// Create starter config and example exercise
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fieldgrade=info".parse().expect("static directive")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            exercise,
            submissions,
            summable,
            output,
            format,
            config,
        } => commands::grade::execute(exercise, submissions, summable, output, format, config),
        Commands::Validate { exercise } => commands::validate::execute(exercise),
        Commands::Counters { report, key } => commands::counters::execute(report, key),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
