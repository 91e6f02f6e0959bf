use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "mathmate")]
#[command(about = "MathMate CLI - AI math tutor session core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Multiple-choice question
    Mcq,
    /// Free-form question
    Essay,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a math question
    Solve {
        /// The question text (optional when an image is given)
        question: Option<String>,
        /// Question mode
        #[arg(long, value_enum, default_value = "essay")]
        mode: ModeArg,
        /// An MCQ answer option (repeat for each option)
        #[arg(long = "option")]
        options: Vec<String>,
        /// Path to a problem image (jpeg/png/webp)
        #[arg(long)]
        image: Option<PathBuf>,
        /// Numeric comparison tolerance for MCQ options
        #[arg(long, default_value_t = 0.01)]
        tolerance: f64,
        /// Response language (defaults to the stored preference)
        #[arg(long)]
        language: Option<String>,
        /// Enter an interactive follow-up loop after solving
        #[arg(long)]
        interactive: bool,
    },
    /// Inspect or edit the solve history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List stored records, newest first
    List,
    /// Replay one record (reconstructs the session and prints it)
    Show { id: String },
    /// Remove one record by id
    Remove { id: String },
    /// Remove all records
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            question,
            mode,
            options,
            image,
            tolerance,
            language,
            interactive,
        } => {
            commands::solve::run(commands::solve::SolveArgs {
                question,
                mcq: matches!(mode, ModeArg::Mcq),
                options,
                image,
                tolerance,
                language,
                interactive,
            })
            .await
        }
        Commands::History { action } => match action {
            HistoryAction::List => commands::history::list(),
            HistoryAction::Show { id } => commands::history::show(&id),
            HistoryAction::Remove { id } => commands::history::remove(&id),
            HistoryAction::Clear => commands::history::clear(),
        },
    }
}
