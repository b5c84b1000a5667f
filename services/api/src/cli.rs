use crate::demo::{run_demo, run_stages, DemoArgs};
use crate::infra::MAX_SEEDED_CANDIDATES;
use crate::server;
use campus_recruit::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Campus Recruit",
    about = "Run and demonstrate the staged recruitment workflow from the command line",
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
    /// Print the configured recruitment stages in pipeline order
    Stages,
    /// Walk a sample position through a stage advance and print the outcome
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
    /// Register candidate profiles for users 101..=N so applications can be filed
    #[arg(
        long,
        default_value_t = 0,
        value_parser = clap::value_parser!(u64).range(0..=MAX_SEEDED_CANDIDATES)
    )]
    pub(crate) seed_candidates: u64,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Stages => run_stages(),
        Command::Demo(args) => run_demo(args),
    }
}
