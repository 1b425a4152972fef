use crate::batch::{run_score, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use recoveriq::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "RecoverIQ",
    about = "Score hospital debt portfolios over HTTP or from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP scoring service (default command)
    Serve(ServeArgs),
    /// Score every hospital in a CSV file against a KPI document
    Score(ScoreArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
    }
}
