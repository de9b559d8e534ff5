//! Database operations for the Tablecraft `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Accounts for all three roles, Telegram identity, manager links
//! - `restaurants` - One per manager, optional assigned waiter
//! - `sections` / `categories` / `products` - The menu hierarchy
//! - `invitations` - One-shot and legacy invitation codes
//! - `chat_sessions` - Per-Telegram-chat registration conversation state
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p tablecraft-cli -- migrate
//! ```

pub mod categories;
pub mod chat_sessions;
pub mod invitations;
pub mod products;
pub mod restaurants;
pub mod sections;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::{Category, CategoryRepository};
pub use chat_sessions::{ChatSessionRepository, ConversationState, PendingRegistration};
pub use invitations::{Invitation, InvitationRepository};
pub use products::{Product, ProductInput, ProductRepository};
pub use restaurants::{NewRestaurant, Restaurant, RestaurantRepository};
pub use sections::{Section, SectionRepository};
pub use users::{TelegramIdentity, User, UserRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect(database_url.expose_secret())
        .await
}

/// Map a sqlx error to `Conflict` when it is a unique violation.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}
