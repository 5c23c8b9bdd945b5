//! Application state containing repositories and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::{ContactRepository, UserRepository};
use crate::infrastructure::config::Config;
use crate::infrastructure::rate_limit::{InMemoryRateLimiter, RateLimiter};
use crate::infrastructure::{SeaOrmContactRepository, SeaOrmUserRepository};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Contact repository
    pub contact_repo: Arc<dyn ContactRepository>,
    /// User repository
    pub user_repo: Arc<dyn UserRepository>,
    /// Request counters consulted before every route
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState with all repositories initialized
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        Self::with_rate_limiter(db, config, Arc::new(InMemoryRateLimiter::new()))
    }

    /// Same as [`AppState::new`] with a caller-supplied counter store
    pub fn with_rate_limiter(
        db: DatabaseConnection,
        config: Config,
        rate_limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        let contact_repo = Arc::new(SeaOrmContactRepository::new(db.clone()));
        let user_repo = Arc::new(SeaOrmUserRepository::new(db));

        Self {
            contact_repo,
            user_repo,
            rate_limiter,
            config: Arc::new(config),
        }
    }
}
