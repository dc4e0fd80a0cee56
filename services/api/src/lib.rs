mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use maverick_mindset::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
