//! Push subscription and FCM token repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use attar_core::{SubscriptionId, UserId};

use super::RepositoryError;
use crate::models::{AdminFcmToken, PushSubscription};

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    endpoint: String,
    p256dh: String,
    auth: String,
    created_at: DateTime<Utc>,
}

impl From<SubscriptionRow> for PushSubscription {
    fn from(r: SubscriptionRow) -> Self {
        Self {
            id: SubscriptionId::new(r.id),
            user_id: UserId::new(r.user_id),
            endpoint: r.endpoint,
            p256dh: r.p256dh,
            auth: r.auth,
            created_at: r.created_at,
        }
    }
}

/// Repository for push subscription database operations.
pub struct PushSubscriptionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PushSubscriptionRepository<'a> {
    /// Create a new push subscription repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Register or refresh a subscription for a user's browser.
    ///
    /// The (`user_id`, `endpoint`) pair is unique; re-subscribing from the
    /// same browser refreshes the encryption keys in place.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        user_id: UserId,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
    ) -> Result<PushSubscription, RepositoryError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r"
            INSERT INTO push_subscription (user_id, endpoint, p256dh, auth)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, endpoint)
            DO UPDATE SET p256dh = EXCLUDED.p256dh,
                          auth = EXCLUDED.auth
            RETURNING id, user_id, endpoint, p256dh, auth, created_at
            ",
        )
        .bind(user_id.as_uuid())
        .bind(endpoint)
        .bind(p256dh)
        .bind(auth)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Remove a subscription. Returns `true` if a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, user_id: UserId, endpoint: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM push_subscription WHERE user_id = $1 AND endpoint = $2
            ",
        )
        .bind(user_id.as_uuid())
        .bind(endpoint)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get all subscriptions registered for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PushSubscription>, RepositoryError> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r"
            SELECT id, user_id, endpoint, p256dh, auth, created_at
            FROM push_subscription
            WHERE user_id = $1
            ",
        )
        .bind(user_id.as_uuid())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(PushSubscription::from).collect())
    }

    /// Get subscriptions of every profile holding the admin role.
    ///
    /// Powers the "notify all admins" broadcast.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_admins(&self) -> Result<Vec<PushSubscription>, RepositoryError> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r"
            SELECT s.id, s.user_id, s.endpoint, s.p256dh, s.auth, s.created_at
            FROM push_subscription s
            JOIN profile p ON p.id = s.user_id
            WHERE p.role = 'admin'
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(PushSubscription::from).collect())
    }

    /// Get all legacy FCM device tokens registered for admins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn admin_fcm_tokens(&self) -> Result<Vec<AdminFcmToken>, RepositoryError> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            r"
            SELECT t.user_id, t.token
            FROM admin_fcm_token t
            JOIN profile p ON p.id = t.user_id
            WHERE p.role = 'admin'
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, token)| AdminFcmToken {
                user_id: UserId::new(user_id),
                token,
            })
            .collect())
    }
}
