//! Product review models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use attar_core::{ProductId, ReviewId, UserId};

/// A product review.
///
/// One row per (user, product) pair by convention: writes go through an
/// upsert. Rating is constrained to 1..=5 both here and in the schema.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Review projection for anonymous read paths.
///
/// The reviewer's user id is never exposed to unauthenticated callers.
#[derive(Debug, Clone, Serialize)]
pub struct PublicReview {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
