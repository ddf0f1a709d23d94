//! Push delivery target models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use attar_core::{SubscriptionId, UserId};

/// A browser Web Push subscription.
///
/// One row per browser/device, unique on (`user_id`, `endpoint`). Upserted
/// on subscribe, deleted on unsubscribe.
#[derive(Debug, Clone, Serialize)]
pub struct PushSubscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    /// Push service URL the browser handed out for this device.
    pub endpoint: String,
    /// Client public key (base64url, uncompressed P-256 point).
    pub p256dh: String,
    /// Client auth secret (base64url, 16 bytes).
    pub auth: String,
    pub created_at: DateTime<Utc>,
}

/// A legacy FCM device token registered for an admin.
#[derive(Debug, Clone)]
pub struct AdminFcmToken {
    pub user_id: UserId,
    pub token: String,
}
