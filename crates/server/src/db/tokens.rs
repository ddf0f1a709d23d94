//! Bearer token repository.
//!
//! The `api_token` table is authoritative for authentication: a token maps
//! to exactly one profile and may carry an expiry.

use sqlx::PgPool;
use uuid::Uuid;

use attar_core::{Email, Role, UserId};

use super::RepositoryError;
use crate::models::CurrentUser;

#[derive(sqlx::FromRow)]
struct PrincipalRow {
    user_id: Uuid,
    email: String,
    role: String,
}

/// Repository for bearer token resolution.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Resolve a bearer token to the principal it was issued for.
    ///
    /// Expired tokens resolve to `None`, same as unknown tokens.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the joined profile row is invalid.
    pub async fn resolve(&self, token: &str) -> Result<Option<CurrentUser>, RepositoryError> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r"
            SELECT p.id AS user_id, p.email, p.role
            FROM api_token t
            JOIN profile p ON p.id = t.user_id
            WHERE t.token = $1
              AND (t.expires_at IS NULL OR t.expires_at > now())
            ",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = r.role.parse::<Role>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(Some(CurrentUser {
            id: UserId::new(r.user_id),
            email,
            role,
        }))
    }
}
