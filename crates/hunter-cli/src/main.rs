use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "hunter-cli", version, about = "Hunterquest CLI")]
struct Cli {
    /// Print structured JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Account management
    User {
        #[command(subcommand)]
        action: commands::user::UserAction,
    },
    /// Daily quests
    Quest {
        #[command(subcommand)]
        action: commands::quest::QuestAction,
    },
    /// Stats, points and upgrades
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Body evaluations
    Evaluate {
        #[command(subcommand)]
        action: commands::evaluate::EvaluateAction,
    },
    /// Record a hunter re-evaluation
    Reevaluate(commands::evaluate::ReevaluateArgs),
    /// Show all hunters ranked by XP
    Leaderboard,
    /// Selected-date navigation
    Date {
        #[command(subcommand)]
        action: commands::date::DateAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("HUNTER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.json;
    let result = match cli.command {
        Commands::User { action } => commands::user::run(action, json),
        Commands::Quest { action } => commands::quest::run(action, json),
        Commands::Stats { action } => commands::stats::run(action, json),
        Commands::Evaluate { action } => commands::evaluate::run(action, json),
        Commands::Reevaluate(args) => commands::evaluate::reevaluate(args, json),
        Commands::Leaderboard => commands::stats::leaderboard(json),
        Commands::Date { action } => commands::date::run(action, json),
        Commands::Config { action } => commands::config::run(action, json),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
