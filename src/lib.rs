use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;
pub mod shared_repos;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{assets, auth, db, limiter, utils};

use assets::cloudinary::CloudinaryStore;
use auth::jwt::JwtService;
use errors::AppError;
use limiter::rate_limiter::RateLimiterStore;
use repositories::{
    asset_store::AssetStore,
    sqlx_repo::{SqlxContactRepo, SqlxProjectRepo},
};
use shared_repos::SharedRepositories;
use use_cases::{auth::{AdminAuthHandler, AdminCredentials}, contact::ContactHandler, projects::ProjectHandler};

pub type SharedAssetStore = Arc<dyn AssetStore>;
pub type AppProjectHandler = ProjectHandler<SqlxProjectRepo, SharedAssetStore>;
pub type AppContactHandler = ContactHandler<SqlxContactRepo>;
pub type AppAuthHandler = AdminAuthHandler<JwtService>;

pub struct AppState {
    pub project_handler: AppProjectHandler,
    pub contact_handler: AppContactHandler,
    pub auth_handler: AppAuthHandler,
    pub contact_limiter: RateLimiterStore,
    pub upload_max_bytes: usize,
    pub trust_x_forwarded_for: bool,
}

impl AppState {
    /// Builds the state against the configured Cloudinary account.
    pub fn new(config: &settings::AppConfig, pool: sqlx::PgPool) -> Result<Self, AppError> {
        let asset_store = CloudinaryStore::new(&config.asset_store)?;
        Ok(Self::with_asset_store(config, pool, Arc::new(asset_store)))
    }

    pub fn with_asset_store(
        config: &settings::AppConfig,
        pool: sqlx::PgPool,
        asset_store: SharedAssetStore,
    ) -> Self {
        let repos = SharedRepositories::new(pool);
        let jwt_service = JwtService::new(config);
        let credentials = AdminCredentials::from(config);

        AppState {
            project_handler: ProjectHandler::new(repos.project_repo, asset_store),
            contact_handler: ContactHandler::new(repos.contact_repo),
            auth_handler: AdminAuthHandler::new(jwt_service, credentials),
            contact_limiter: RateLimiterStore::per_window(
                config.contact_rate_limit,
                std::time::Duration::from_secs(config.contact_rate_window_secs),
            ),
            upload_max_bytes: config.upload_max_bytes,
            trust_x_forwarded_for: config.trust_x_forwarded_for,
        }
    }
}
