//! Profile persistence: store interface, backends, and pool setup.
//!
//! SYSTEM CONTEXT
//! ==============
//! The persistent profile store is an external collaborator. `ProfileStore` is
//! the interface the resolver depends on; `postgres` and `memory` are the two
//! backends the binary can run with.
//!
//! CONTRACT
//! ========
//! `select_profile` returns `Ok(None)` when no row exists and `Err` only for a
//! genuine query or transport failure. Writes always go through
//! `upsert_profile` keyed by `id`, never a separate existence check.

pub mod memory;
pub mod postgres;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::state::Profile;

pub use memory::MemoryProfileStore;
pub use postgres::PgProfileStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The query reached the backend and failed there.
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
    /// The backend could not be reached (pool exhausted or closed, I/O).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => Self::Unavailable(e.to_string()),
            other => Self::Database(other),
        }
    }
}

impl StoreError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) => "E_DATABASE",
            Self::Unavailable(_) => "E_STORE_UNAVAILABLE",
        }
    }
}

/// What an upsert does when a row with the same `id` already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnConflict {
    /// Leave the existing row untouched and return it.
    KeepExisting,
    /// Replace every mutable column; `created_at` is preserved.
    Overwrite,
}

#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    async fn select_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;

    async fn upsert_profile(&self, record: &Profile, on_conflict: OnConflict) -> Result<Profile, StoreError>;
}

/// Initialize the `PostgreSQL` connection pool and run migrations.
///
/// # Errors
///
/// Returns an error if the connection or migrations fail.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
