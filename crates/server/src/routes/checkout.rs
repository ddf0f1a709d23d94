//! Checkout notification handlers.
//!
//! Per request: `received -> validated -> authorized -> profile-fetched ->
//! email-sent -> cart-cleared -> responded`. Validation or authorization
//! failure short-circuits before any side effect. Email failure is terminal
//! (the cart is left alone so the caller can resubmit); a cart-clear failure
//! after a sent email is logged and swallowed, because the user-visible
//! contract - the confirmation email - has already been honored.

use std::future::Future;

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use attar_core::{Email, UserId};

use crate::db::{CartRepository, ProfileRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::email::EmailError;
use crate::state::AppState;
use crate::validate::{CheckoutConfirmationRequest, CheckoutNotificationRequest};

/// Successful checkout response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub email_id: String,
}

/// Send the order confirmation email and clear the cart.
///
/// `POST /api/checkout/notification`
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn notification(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<CheckoutNotificationRequest>,
) -> Result<Json<CheckoutResponse>> {
    req.validate()?;

    if req.user_id != user.id {
        return Err(AppError::Forbidden(
            "userId does not match the authenticated caller".to_string(),
        ));
    }

    let profile = ProfileRepository::new(state.pool())
        .get(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("profile not found".to_string()))?;

    let email_id = email_then_clear(
        user.id,
        state.email().send_order_confirmation(
            &profile.email,
            &profile.full_name,
            &req.cart_items,
            req.total_price,
        ),
        CartRepository::new(state.pool()).clear(user.id),
    )
    .await?;

    Ok(Json(CheckoutResponse {
        success: true,
        email_id,
    }))
}

/// Run the checkout side-effect sequence.
///
/// The confirmation email must land before a single cart row is touched: an
/// email failure propagates with the cart intact (the `clear` future is
/// never awaited), while a cart-clear failure after a sent email is logged
/// and swallowed because the checkout already succeeded.
async fn email_then_clear<S, C>(user_id: UserId, send: S, clear: C) -> Result<String>
where
    S: Future<Output = std::result::Result<String, EmailError>>,
    C: Future<Output = std::result::Result<u64, RepositoryError>>,
{
    let email_id = send.await?;

    match clear.await {
        Ok(rows) => {
            tracing::info!(user_id = %user_id, rows, "Cart cleared after checkout");
        }
        Err(e) => {
            tracing::error!(user_id = %user_id, error = %e, "Cart clear failed after checkout email");
        }
    }

    Ok(email_id)
}

/// Send the order confirmation email to an address named in the payload.
///
/// `POST /api/checkout/confirmation`
///
/// Unlike [`notification`], the recipient comes from the payload rather than
/// the profile table; the payload address must still belong to the caller.
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn confirmation(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<CheckoutConfirmationRequest>,
) -> Result<Json<CheckoutResponse>> {
    req.validate()?;

    if user.email.as_str() != req.user_email {
        return Err(AppError::Forbidden(
            "userEmail does not match the authenticated caller".to_string(),
        ));
    }

    // Parse cannot fail here: validate() already checked the address.
    let to = Email::parse(&req.user_email)
        .map_err(|e| AppError::Internal(format!("validated email failed to parse: {e}")))?;

    let email_id = state
        .email()
        .send_order_confirmation(&to, &req.user_name, &req.cart_items, req.total_price)
        .await?;

    Ok(Json(CheckoutResponse {
        success: true,
        email_id,
    }))
}
