//! Web Push subscription registration.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use attar_core::SubscriptionId;

use crate::db::PushSubscriptionRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;
use crate::validate::{SubscribeRequest, UnsubscribeRequest};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    pub success: bool,
    pub subscription_id: SubscriptionId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsubscribeResponse {
    pub success: bool,
    pub removed: bool,
}

/// Register (or refresh) a push subscription for the caller.
///
/// `POST /api/push/subscribe`
///
/// Re-subscribing the same endpoint updates the stored keys in place, so a
/// browser that rotates its keys does not leave a stale row behind.
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn subscribe(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>> {
    req.validate()?;

    let subscription = PushSubscriptionRepository::new(state.pool())
        .upsert(user.id, &req.endpoint, &req.p256dh, &req.auth)
        .await?;

    Ok(Json(SubscribeResponse {
        success: true,
        subscription_id: subscription.id,
    }))
}

/// Remove one of the caller's push subscriptions.
///
/// `POST /api/push/unsubscribe`
///
/// Deleting an endpoint the caller never registered is not an error;
/// `removed` reports whether a row actually went away.
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<UnsubscribeRequest>,
) -> Result<Json<UnsubscribeResponse>> {
    let removed = PushSubscriptionRepository::new(state.pool())
        .delete(user.id, &req.endpoint)
        .await?;

    Ok(Json(UnsubscribeResponse {
        success: true,
        removed,
    }))
}
