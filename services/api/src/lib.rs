mod cli;
mod infra;
mod report;
mod routes;
mod server;

use freight_decision::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
