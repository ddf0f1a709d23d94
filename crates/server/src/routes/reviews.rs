//! Product review handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use attar_core::{ProductId, ReviewId};

use crate::db::ReviewRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{PublicReview, Review};
use crate::state::AppState;
use crate::validate::ReviewRequest;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReviewResponse {
    pub success: bool,
}

/// List a product's reviews without reviewer identity.
///
/// `GET /api/products/{product_id}/reviews` - no authentication required.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<PublicReview>>> {
    let reviews = ReviewRepository::new(state.pool())
        .list_public(product_id)
        .await?;

    Ok(Json(reviews))
}

/// Create or replace the caller's review of a product.
///
/// `POST /api/products/{product_id}/reviews`
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn upsert(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<Review>> {
    req.validate()?;

    let review = ReviewRepository::new(state.pool())
        .upsert(user.id, product_id, req.rating, req.comment.as_deref())
        .await?;

    Ok(Json(review))
}

/// Delete a review.
///
/// `DELETE /api/reviews/{review_id}` - owners delete their own, admins any.
/// A review that exists but belongs to someone else looks the same as one
/// that does not exist, so ownership cannot be probed.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(review_id): Path<ReviewId>,
) -> Result<Json<DeleteReviewResponse>> {
    let removed = ReviewRepository::new(state.pool())
        .delete(review_id, &user)
        .await?;

    if !removed {
        return Err(AppError::NotFound("review not found".to_string()));
    }

    Ok(Json(DeleteReviewResponse { success: true }))
}
