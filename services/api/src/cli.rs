use crate::console::{run_lookup, run_mask, LookupArgs, MaskArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use prize_lookup::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Prize Lookup",
    about = "Serve or run the simulated CPF prize lookup from the command line",
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
    /// Run one lookup and print the result
    Lookup(LookupArgs),
    /// Show how a partially typed CPF is masked
    Mask(MaskArgs),
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
        Command::Lookup(args) => run_lookup(args).await,
        Command::Mask(args) => {
            run_mask(args);
            Ok(())
        }
    }
}
