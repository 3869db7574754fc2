//! dailytest CLI: take the daily test from a terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod console;
mod interactive;
mod render;

#[derive(Parser)]
#[command(name = "dailytest", version, about = "Timed multiple-choice daily tests")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take the test for a date (today by default)
    Take {
        /// Date key, YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Act as the embedded mini-app: print outbound messages as `SEND <json>`
        #[arg(long)]
        embedded: bool,
    },

    /// Take a practice test from the question bank
    Practice {
        /// Number of questions
        #[arg(long, default_value = "10")]
        count: u32,

        /// Restrict to one subject
        #[arg(long)]
        subject: Option<String>,

        /// easy, medium, or hard
        #[arg(long)]
        difficulty: Option<String>,

        /// Exam year
        #[arg(long)]
        year: Option<u16>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        embedded: bool,
    },

    /// Print the info screen for a date
    Show {
        /// Date key, YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a test table TOML file
    Validate {
        /// Path to the test table
        #[arg(long)]
        tests: PathBuf,
    },

    /// Create a starter config and test table
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dailytest=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            date,
            config,
            embedded,
        } => commands::take::execute(date, config, embedded).await,
        Commands::Practice {
            count,
            subject,
            difficulty,
            year,
            config,
            embedded,
        } => commands::practice::execute(count, subject, difficulty, year, config, embedded).await,
        Commands::Show { date, config } => commands::show::execute(date, config).await,
        Commands::Validate { tests } => commands::validate::execute(tests),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
