mod cli;
mod console;
mod infra;
mod routes;
mod server;

use prize_lookup::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
