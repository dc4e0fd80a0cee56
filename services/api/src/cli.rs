use crate::demo::{
    run_demo, run_leaderboard, run_trainee_table, DemoArgs, LeaderboardArgs, TraineesArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use maverick_mindset::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Maverick Mindset",
    about = "Run the trainee onboarding service or inspect a roster from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Rank a roster export by progress, optionally writing the ranking as CSV
    Leaderboard(LeaderboardArgs),
    /// Filter and sort a roster export the way the admin trainee table does
    Trainees(TraineesArgs),
    /// Walk one trainee through a plan, a quiz, a challenge and a reviewed submission
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Roster CSV to load into the in-memory store at startup
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Leaderboard(args) => run_leaderboard(args),
        Command::Trainees(args) => run_trainee_table(args),
        Command::Demo(args) => run_demo(args),
    }
}
