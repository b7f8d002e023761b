//! Serves the diagnosis form.

#[macro_use]
extern crate tracing;

use std::env;

use carecrew::config::{AppConfig, log_filter};
use carecrew::crew::CrewPipeline;
use carecrew::web::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(env::var("RUST_LOG").ok().as_deref())?)
        .init();

    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            warn!("ignoring unreadable .env file: {err}");
        }
    }

    let config = AppConfig::from_env()?;
    debug!("loaded {config:?}");

    let pipeline = CrewPipeline::from_config(&config)?;
    let app = web::router(AppState::new(pipeline));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(
        "serving on http://{} with model {}",
        listener.local_addr()?,
        config.openai_model
    );
    axum::serve(listener, app).await?;

    Ok(())
}
