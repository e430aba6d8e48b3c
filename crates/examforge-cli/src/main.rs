//! examforge CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "examforge", version, about = "Personalized exam assembly and scoring engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate question bank TOML files
    Validate {
        /// Path to a bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Simulate learners purchasing and sitting an exam
    Simulate {
        /// Path to a bank file or directory
        #[arg(long)]
        bank: PathBuf,

        /// Subject to assemble from
        #[arg(long)]
        subject: String,

        /// Number of simulated learners
        #[arg(long, default_value = "3")]
        learners: usize,

        /// Questions per exam
        #[arg(long, default_value = "10")]
        questions: usize,

        /// Percentage required to pass
        #[arg(long, default_value = "60.0")]
        passing_score: f64,

        /// Probability a simulated learner answers correctly
        #[arg(long, default_value = "0.7")]
        accuracy: f64,

        /// RNG seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Emit the full results as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Run an assembly workload and print pool-cache statistics
    CacheStats {
        /// Path to a bank file or directory
        #[arg(long)]
        bank: PathBuf,

        /// First-time buyers to simulate per subject
        #[arg(long, default_value = "10")]
        buyers: usize,

        /// Questions per exam
        #[arg(long, default_value = "10")]
        questions: usize,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("examforge=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Simulate {
            bank,
            subject,
            learners,
            questions,
            passing_score,
            accuracy,
            seed,
            json,
        } => {
            commands::simulate::execute(
                bank,
                subject,
                learners,
                questions,
                passing_score,
                accuracy,
                seed,
                json,
            )
            .await
        }
        Commands::CacheStats {
            bank,
            buyers,
            questions,
        } => commands::cache_stats::execute(bank, buyers, questions).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
