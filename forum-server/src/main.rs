use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use data::repositories::memory::InMemoryStore;
use data::repositories::postgres::group_repository::PostgresGroupRepository;
use data::repositories::postgres::post_repository::PostgresPostRepository;
use data::repositories::postgres::user_repository::PostgresUserRepository;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::jwt::JwtService;
use infrastructure::logging::init_logging;
use infrastructure::settings::{Settings, StorageBackend};
use presentation::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let jwt = Arc::new(JwtService::new(&settings.jwt_secret, settings.jwt_ttl_seconds));
    let state = build_state(&settings, jwt).await?;

    state
        .post_service
        .seed_groups(settings.seed_groups.clone())
        .await
        .context("failed to seed groups")?;

    server::run_http(&settings, state).await
}

async fn build_state(settings: &Settings, jwt: Arc<JwtService>) -> Result<AppState> {
    match settings.storage_backend {
        StorageBackend::Postgres => {
            let database_url = settings
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres backend")?;
            let pool = create_pool(database_url, settings.database_max_connections).await?;
            run_migrations(&pool).await?;

            Ok(AppState::new(
                Arc::new(PostgresUserRepository::new(pool.clone())),
                Arc::new(PostgresPostRepository::new(pool.clone())),
                Arc::new(PostgresGroupRepository::new(pool)),
                jwt,
            ))
        }
        StorageBackend::Memory => {
            info!("using in-memory storage, data is lost on shutdown");
            let store = InMemoryStore::new();
            Ok(AppState::new(
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                Arc::new(store),
                jwt,
            ))
        }
    }
}
