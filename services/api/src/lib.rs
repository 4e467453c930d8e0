mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use smart_property::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
