//! Cart-activity alerts and push notification fan-out.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::db::PushSubscriptionRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;
use crate::validate::{CartNotificationRequest, NotificationBody, PushNotificationRequest};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartNotificationResponse {
    pub success: bool,
    pub email_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushNotificationResponse {
    pub success: bool,
    pub user_notification_sent: bool,
    pub admin_notification_sent: bool,
}

/// Email the admin address about cart activity.
///
/// `POST /api/notifications/cart`
///
/// The legacy FCM broadcast to admin devices rides along best-effort: a
/// delivery failure there never fails the request once the email went out.
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn cart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<CartNotificationRequest>,
) -> Result<Json<CartNotificationResponse>> {
    req.validate()?;

    if req.user_id != user.id {
        return Err(AppError::Forbidden(
            "userId does not match the authenticated caller".to_string(),
        ));
    }

    let email_id = state
        .email()
        .send_cart_alert(&user.email, &req.product_title, req.quantity)
        .await?;

    if state.push().fcm_enabled() {
        let notification = NotificationBody {
            title: "Cart activity".to_string(),
            body: format!(
                "{} added {} x {}",
                user.email, req.quantity, req.product_title
            ),
        };
        match PushSubscriptionRepository::new(state.pool())
            .admin_fcm_tokens()
            .await
        {
            Ok(tokens) => {
                if let Err(e) = state.push().send_fcm(tokens, &notification).await {
                    tracing::warn!(error = %e, "FCM cart alert failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "FCM token lookup failed"),
        }
    }

    Ok(Json(CartNotificationResponse {
        success: true,
        email_id,
    }))
}

/// Fan a push notification out to a user and/or all admins.
///
/// `POST /api/notifications/push`
///
/// `userNotificationSent` / `adminNotificationSent` report whether at least
/// one endpoint in the respective audience accepted the payload. Individual
/// endpoint failures never fail the request.
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn push(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<PushNotificationRequest>,
) -> Result<Json<PushNotificationResponse>> {
    req.validate()?;

    if let Some(target) = req.user_id
        && target != user.id
    {
        return Err(AppError::Forbidden(
            "userId does not match the authenticated caller".to_string(),
        ));
    }

    let repo = PushSubscriptionRepository::new(state.pool());

    let mut user_sent = false;
    if let (Some(target), Some(notification)) = (req.user_id, &req.user_notification) {
        let subscriptions = repo.for_user(target).await?;
        let report = state.push().broadcast(subscriptions, notification).await?;
        user_sent = report.any_delivered();
    }

    // The admin leg is best-effort once we get this far: the user fan-out may
    // already have delivered, so a failed admin lookup degrades to
    // `adminNotificationSent: false` instead of a 500.
    let mut admin_sent = false;
    if req.notify_admin
        && let Some(notification) = &req.admin_notification
    {
        match repo.for_admins().await {
            Ok(subscriptions) => {
                let report = state.push().broadcast(subscriptions, notification).await?;
                admin_sent = report.any_delivered();
            }
            Err(e) => {
                tracing::error!(error = %e, "Admin subscription lookup failed");
            }
        }

        if state.push().fcm_enabled() {
            match repo.admin_fcm_tokens().await {
                Ok(tokens) => {
                    let report = state.push().send_fcm(tokens, notification).await?;
                    admin_sent = admin_sent || report.any_delivered();
                }
                Err(e) => {
                    tracing::error!(error = %e, "Admin FCM token lookup failed");
                }
            }
        }
    }

    Ok(Json(PushNotificationResponse {
        success: true,
        user_notification_sent: user_sent,
        admin_notification_sent: admin_sent,
    }))
}
