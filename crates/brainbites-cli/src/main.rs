use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "brainbites-cli", version, about = "BrainBites time-economy CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen-time balance control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Score and streak queries
    Score {
        #[command(subcommand)]
        action: commands::score::ScoreAction,
    },
    /// Daily goal management
    Goals {
        #[command(subcommand)]
        action: commands::goals::GoalsAction,
    },
    /// Interactive quiz sessions
    Quiz {
        #[command(subcommand)]
        action: commands::quiz::QuizAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Score { action } => commands::score::run(action),
        Commands::Goals { action } => commands::goals::run(action),
        Commands::Quiz { action } => commands::quiz::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
