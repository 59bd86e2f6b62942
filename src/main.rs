use anyhow::Context;
use tracing::info;

use annotatex_api::{
    config::Config,
    database::init_db,
    logging::init_tracing,
    repository::Repository,
    server,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env().context("Failed to load configuration")?;

    init_tracing(&config.env);
    info!(env = %config.env, port = config.port, "Starting AnnotateX API");

    let pool = init_db(&config.database)
        .await
        .context("Failed to connect to db")?;

    let app_state = AppState::new(Repository::postgres(pool));

    server::run(&config, app_state)
        .await
        .context("Failed to run API server")
}
