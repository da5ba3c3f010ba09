//! # planhub-database
//!
//! Repository traits for notifications and users, with a PostgreSQL
//! implementation and an in-memory implementation used for local runs
//! and tests.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use planhub_core::config::{DatabaseConfig, DatabaseProvider, SeedUser};
use planhub_core::result::AppResult;
use planhub_entity::user::{User, UserRole};

pub use memory::{MemoryNotificationRepository, MemoryUserRepository};
pub use repositories::{
    NotificationFilter, NotificationRepository, PgNotificationRepository, PgUserRepository,
    UserRepository,
};

/// The repository set the rest of the application is wired against.
#[derive(Debug, Clone)]
pub struct Repositories {
    /// Notification store.
    pub notifications: Arc<dyn NotificationRepository>,
    /// User store.
    pub users: Arc<dyn UserRepository>,
    /// Present only when backed by PostgreSQL.
    pub pool: Option<PgPool>,
}

impl Repositories {
    /// Fresh in-memory repositories.
    pub fn in_memory() -> Self {
        Self {
            notifications: Arc::new(MemoryNotificationRepository::new()),
            users: Arc::new(MemoryUserRepository::new()),
            pool: None,
        }
    }

    /// Build the repositories selected by `config.provider`, connecting and
    /// migrating when PostgreSQL is chosen.
    pub async fn from_config(config: &DatabaseConfig) -> AppResult<Self> {
        match config.provider {
            DatabaseProvider::Memory => {
                let repositories = Self::in_memory();
                repositories.seed_users(&config.seed_users).await?;
                info!(
                    seeded_users = config.seed_users.len(),
                    "Using in-memory notification store"
                );
                Ok(repositories)
            }
            DatabaseProvider::Postgres => {
                let pool = connection::connect(config).await?;
                migration::apply(&pool).await?;
                Ok(Self {
                    notifications: Arc::new(PgNotificationRepository::new(pool.clone())),
                    users: Arc::new(PgUserRepository::new(pool.clone())),
                    pool: Some(pool),
                })
            }
        }
    }

    async fn seed_users(&self, seeds: &[SeedUser]) -> AppResult<()> {
        for seed in seeds {
            let role = seed.role.parse::<UserRole>()?;
            let user = User {
                id: seed.id,
                ..User::new(seed.username.clone(), role)
            };
            self.users.insert(&user).await?;
        }
        Ok(())
    }

    /// Check that the backing store answers.
    pub async fn health_check(&self) -> AppResult<bool> {
        match &self.pool {
            Some(pool) => connection::ping(pool).await,
            None => Ok(true),
        }
    }
}
