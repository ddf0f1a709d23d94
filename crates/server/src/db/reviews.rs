//! Review repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use attar_core::{ProductId, ReviewId, UserId};

use super::RepositoryError;
use crate::models::{CurrentUser, PublicReview, Review};

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    product_id: Uuid,
    user_id: Uuid,
    rating: i16,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(r: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(r.id),
            product_id: ProductId::new(r.product_id),
            user_id: UserId::new(r.user_id),
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PublicReviewRow {
    id: Uuid,
    product_id: Uuid,
    rating: i16,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create or update the caller's review for a product.
    ///
    /// One review per (user, product): a second submission replaces the
    /// first rather than adding a row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: i16,
        comment: Option<&str>,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            INSERT INTO review (product_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET rating = EXCLUDED.rating,
                          comment = EXCLUDED.comment,
                          updated_at = now()
            RETURNING id, product_id, user_id, rating, comment, created_at, updated_at
            ",
        )
        .bind(product_id.as_uuid())
        .bind(user_id.as_uuid())
        .bind(rating)
        .bind(comment)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Delete a review.
    ///
    /// Owners may delete their own review; admins may delete any review.
    /// Returns `true` if a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(
        &self,
        review_id: ReviewId,
        requester: &CurrentUser,
    ) -> Result<bool, RepositoryError> {
        let result = if requester.is_admin() {
            sqlx::query(
                r"
                DELETE FROM review WHERE id = $1
                ",
            )
            .bind(review_id.as_uuid())
            .execute(self.pool)
            .await?
        } else {
            sqlx::query(
                r"
                DELETE FROM review WHERE id = $1 AND user_id = $2
                ",
            )
            .bind(review_id.as_uuid())
            .bind(requester.id.as_uuid())
            .execute(self.pool)
            .await?
        };

        Ok(result.rows_affected() > 0)
    }

    /// List reviews for a product without exposing reviewer identity.
    ///
    /// This is the anonymous read path; the `user_id` column never leaves
    /// the repository.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_public(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<PublicReview>, RepositoryError> {
        let rows = sqlx::query_as::<_, PublicReviewRow>(
            r"
            SELECT id, product_id, rating, comment, created_at
            FROM review
            WHERE product_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(product_id.as_uuid())
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| PublicReview {
                id: ReviewId::new(r.id),
                product_id: ProductId::new(r.product_id),
                rating: r.rating,
                comment: r.comment,
                created_at: r.created_at,
            })
            .collect())
    }
}
