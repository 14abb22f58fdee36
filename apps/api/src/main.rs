//! Evidentia API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod dev_seed;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use evidentia_core::AppError;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::{Repositories, build_app_state};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    let config = ApiConfig::load()?;
    let repositories = Repositories::default();
    if config.dev_seed {
        dev_seed::run(&repositories).await?;
    }

    let app_state = build_app_state(&repositories, config.retry_policy);
    let app = api_router::build_router(app_state);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(
        %address,
        max_write_attempts = config.retry_policy.max_attempts(),
        "evidentia-api listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
