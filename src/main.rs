use thiserror::Error;

use crate::api::server::{AppState, RouteError};
use crate::db::PgError;
use crate::util::env::{self, EnvErr};
use crate::util::telemetry;

mod api;
mod db;
mod reputation;
mod util;

#[derive(Debug, Error)]
enum RunnerErr {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Env(#[from] EnvErr),

    #[error(transparent)]
    Db(#[from] PgError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Std(#[from] Box<dyn std::error::Error>),
}

type Result<T> = core::result::Result<T, RunnerErr>;

#[tokio::main]
async fn main() -> Result<()> {
    let env = env::get_env().await?;
    let telemetry_registry = telemetry::Telemetry::new(env)?.register();

    tracing::info!("starting main application");

    let pool = db::db_pool().await?;
    let state = AppState::postgres(pool, env);

    let server = api::server::start_server(state).await?;
    let served = server.await?;

    telemetry_registry.shutdown();
    Ok(served?)
}
