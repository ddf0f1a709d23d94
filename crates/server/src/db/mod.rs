//! Database operations for the Attar `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `profile` - Customer/admin profiles (one per authenticated user)
//! - `api_token` - Bearer credentials resolved by the authorization guard
//! - `cart_item` - Ephemeral cart rows, deleted on successful checkout
//! - `review` - Product reviews, upserted per (user, product)
//! - `push_subscription` - Web Push subscriptions, unique per (user, endpoint)
//! - `admin_fcm_token` - Legacy FCM device tokens for admins
//!
//! Access rules are enforced here and in the route handlers rather than by
//! database policies: a caller may only touch rows scoped to their own user
//! id, admin-only tables require an admin role check.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run with
//! `sqlx migrate run`.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod carts;
pub mod profiles;
pub mod push_subscriptions;
pub mod reviews;
pub mod tokens;

pub use carts::CartRepository;
pub use profiles::ProfileRepository;
pub use push_subscriptions::PushSubscriptionRepository;
pub use reviews::ReviewRepository;
pub use tokens::TokenRepository;

/// Errors from repository operations.
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

    /// Constraint violation (e.g., duplicate subscription endpoint).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
