use crate::batch::{run_local_batch, LocalBatchArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use levelfix::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "LevelFix",
    about = "Repair missing or truncated PositionLevel tags in job-description XML exports",
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
    /// Repair XML files from disk and print the per-file report
    Repair(LocalBatchArgs),
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
        Command::Repair(args) => run_local_batch(args),
    }
}
