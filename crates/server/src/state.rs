//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use crate::config::AppConfig;
use crate::services::email::{EmailClient, EmailError};
use crate::services::push::{PushClient, PushError};

/// Error building application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("email client: {0}")]
    Email(#[from] EmailError),
    #[error("push client: {0}")]
    Push(#[from] PushError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool and provider clients. Handlers
/// receive test doubles by constructing the clients from a doctored config.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: PgPool,
    email: EmailClient,
    push: PushClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if a provider client cannot be constructed (bad API
    /// key header, invalid VAPID key material).
    pub fn new(config: AppConfig, pool: PgPool) -> Result<Self, StateError> {
        let email = EmailClient::new(&config.email)?;
        let push = PushClient::new(&config.push)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                email,
                push,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the transactional email client.
    #[must_use]
    pub fn email(&self) -> &EmailClient {
        &self.inner.email
    }

    /// Get a reference to the push delivery client.
    #[must_use]
    pub fn push(&self) -> &PushClient {
        &self.inner.push
    }
}
