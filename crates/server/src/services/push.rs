//! Push notification dispatch.
//!
//! Fan-out, not transactional: each subscription gets its own outbound POST,
//! deliveries run concurrently, and one failure never aborts the rest. The
//! caller gets an aggregate [`DispatchReport`] per notification class; a
//! class counts as sent when at least one delivery landed.

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::task::JoinSet;

use crate::config::PushConfig;
use crate::models::{AdminFcmToken, PushSubscription};
use crate::services::webpush::{
    WebPushCryptoError, encrypt_payload, parse_vapid_private_key, vapid_authorization,
};
use crate::validate::NotificationBody;

/// TTL advertised to push services, in seconds.
const PUSH_TTL_SECONDS: u32 = 86_400;

/// Legacy FCM send endpoint.
const FCM_SEND_URL: &str = "https://fcm.googleapis.com/fcm/send";

/// Errors that prevent dispatch from being attempted at all.
///
/// Per-target delivery failures are not errors; they show up in the
/// [`DispatchReport`] instead.
#[derive(Debug, Error)]
pub enum PushError {
    /// HTTP client failed to build.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// VAPID key material is unusable.
    #[error("push configuration error: {0}")]
    Crypto(#[from] WebPushCryptoError),

    /// Notification payload could not be serialized.
    #[error("payload serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Outcome of one delivery attempt to one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Push service accepted the message (2xx).
    Delivered,
    /// Subscription is gone (404/410); a candidate for cleanup.
    Expired,
    /// Anything else: transient failure, bad request, crypto error.
    Failed,
}

impl DeliveryOutcome {
    /// Classify a push-service response status.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        if status.is_success() {
            Self::Delivered
        } else if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            Self::Expired
        } else {
            Self::Failed
        }
    }
}

/// Aggregate result of a fan-out to one target set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub expired: usize,
    pub failed: usize,
}

impl DispatchReport {
    /// Record one delivery outcome.
    pub const fn record(&mut self, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Delivered => self.delivered += 1,
            DeliveryOutcome::Expired => self.expired += 1,
            DeliveryOutcome::Failed => self.failed += 1,
        }
    }

    /// Whether at least one delivery landed.
    #[must_use]
    pub const fn any_delivered(&self) -> bool {
        self.delivered > 0
    }

    /// Total delivery attempts.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.delivered + self.expired + self.failed
    }
}

/// Client for Web Push (and legacy FCM) delivery.
#[derive(Clone)]
pub struct PushClient {
    client: reqwest::Client,
    signing_key: p256::ecdsa::SigningKey,
    public_key: String,
    subject: String,
    fcm_server_key: Option<SecretString>,
}

impl PushClient {
    /// Create a new push client from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the VAPID private key is invalid or the HTTP client
    /// fails to build.
    pub fn new(config: &PushConfig) -> Result<Self, PushError> {
        let signing_key = parse_vapid_private_key(config.vapid_private_key.expose_secret())?;
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            signing_key,
            public_key: config.vapid_public_key.clone(),
            subject: config.vapid_subject.clone(),
            fcm_server_key: config.fcm_server_key.clone(),
        })
    }

    /// Whether the legacy FCM path is configured.
    #[must_use]
    pub const fn fcm_enabled(&self) -> bool {
        self.fcm_server_key.is_some()
    }

    /// Deliver one encrypted notification to one subscription.
    ///
    /// Never returns an error: every failure mode collapses into a
    /// [`DeliveryOutcome`] so the surrounding fan-out stays best-effort.
    pub async fn deliver(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> DeliveryOutcome {
        let body = match encrypt_payload(&subscription.p256dh, &subscription.auth, payload) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(
                    endpoint = %subscription.endpoint,
                    error = %e,
                    "Push payload encryption failed"
                );
                return DeliveryOutcome::Failed;
            }
        };

        let authorization = match vapid_authorization(
            &subscription.endpoint,
            &self.subject,
            &self.signing_key,
            &self.public_key,
        ) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    endpoint = %subscription.endpoint,
                    error = %e,
                    "VAPID header construction failed"
                );
                return DeliveryOutcome::Failed;
            }
        };

        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&authorization) {
            headers.insert("Authorization", value);
        }
        headers.insert("TTL", HeaderValue::from(PUSH_TTL_SECONDS));
        headers.insert("Content-Encoding", HeaderValue::from_static("aes128gcm"));
        headers.insert(
            "Content-Type",
            HeaderValue::from_static("application/octet-stream"),
        );

        let response = self
            .client
            .post(&subscription.endpoint)
            .headers(headers)
            .body(body)
            .send()
            .await;

        match response {
            Ok(resp) => {
                let outcome = DeliveryOutcome::from_status(resp.status());
                if outcome != DeliveryOutcome::Delivered {
                    tracing::warn!(
                        endpoint = %subscription.endpoint,
                        status = %resp.status(),
                        ?outcome,
                        "Push delivery not accepted"
                    );
                }
                outcome
            }
            Err(e) => {
                tracing::warn!(
                    endpoint = %subscription.endpoint,
                    error = %e,
                    "Push delivery request failed"
                );
                DeliveryOutcome::Failed
            }
        }
    }

    /// Fan a notification out to a set of subscriptions concurrently.
    ///
    /// Expired subscriptions (404/410) are counted in the report but not
    /// pruned here; cleanup is a separate concern.
    ///
    /// # Errors
    ///
    /// Only fails if the notification itself cannot be serialized; delivery
    /// failures are reported, not raised.
    pub async fn broadcast(
        &self,
        subscriptions: Vec<PushSubscription>,
        notification: &NotificationBody,
    ) -> Result<DispatchReport, PushError> {
        let payload = serde_json::to_vec(notification)?;

        let mut set = JoinSet::new();
        for subscription in subscriptions {
            let client = self.clone();
            let payload = payload.clone();
            set.spawn(async move { client.deliver(&subscription, &payload).await });
        }

        let mut report = DispatchReport::default();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    tracing::error!(error = %e, "Push delivery task panicked");
                    report.record(DeliveryOutcome::Failed);
                }
            }
        }

        tracing::info!(
            delivered = report.delivered,
            expired = report.expired,
            failed = report.failed,
            "Push fan-out complete"
        );
        Ok(report)
    }

    /// Send a notification to legacy FCM device tokens.
    ///
    /// No-op (empty report) when no FCM server key is configured. Each token
    /// is posted independently, same best-effort rules as Web Push.
    ///
    /// # Errors
    ///
    /// Only fails if the notification cannot be serialized.
    pub async fn send_fcm(
        &self,
        tokens: Vec<AdminFcmToken>,
        notification: &NotificationBody,
    ) -> Result<DispatchReport, PushError> {
        let Some(server_key) = &self.fcm_server_key else {
            return Ok(DispatchReport::default());
        };

        let authorization = format!("key={}", server_key.expose_secret());
        let mut report = DispatchReport::default();

        for token in tokens {
            let body = serde_json::json!({
                "to": token.token,
                "notification": {
                    "title": notification.title,
                    "body": notification.body,
                },
            });

            let response = self
                .client
                .post(FCM_SEND_URL)
                .header("Authorization", &authorization)
                .json(&body)
                .send()
                .await;

            match response {
                Ok(resp) => report.record(DeliveryOutcome::from_status(resp.status())),
                Err(e) => {
                    tracing::warn!(user_id = %token.user_id, error = %e, "FCM send failed");
                    report.record(DeliveryOutcome::Failed);
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_classification() {
        assert_eq!(
            DeliveryOutcome::from_status(StatusCode::CREATED),
            DeliveryOutcome::Delivered
        );
        assert_eq!(
            DeliveryOutcome::from_status(StatusCode::OK),
            DeliveryOutcome::Delivered
        );
        assert_eq!(
            DeliveryOutcome::from_status(StatusCode::NOT_FOUND),
            DeliveryOutcome::Expired
        );
        assert_eq!(
            DeliveryOutcome::from_status(StatusCode::GONE),
            DeliveryOutcome::Expired
        );
        assert_eq!(
            DeliveryOutcome::from_status(StatusCode::TOO_MANY_REQUESTS),
            DeliveryOutcome::Failed
        );
        assert_eq!(
            DeliveryOutcome::from_status(StatusCode::BAD_GATEWAY),
            DeliveryOutcome::Failed
        );
    }

    #[test]
    fn test_report_any_delivered_with_mixed_outcomes() {
        // N subscriptions where some return 410: the aggregate flag is true
        // as long as one delivery landed.
        let mut report = DispatchReport::default();
        report.record(DeliveryOutcome::Expired);
        report.record(DeliveryOutcome::Expired);
        report.record(DeliveryOutcome::Delivered);
        report.record(DeliveryOutcome::Failed);

        assert!(report.any_delivered());
        assert_eq!(report.total(), 4);
        assert_eq!(report.expired, 2);
    }

    #[test]
    fn test_report_all_failed() {
        let mut report = DispatchReport::default();
        report.record(DeliveryOutcome::Expired);
        report.record(DeliveryOutcome::Failed);
        assert!(!report.any_delivered());
    }

    #[test]
    fn test_empty_report() {
        let report = DispatchReport::default();
        assert!(!report.any_delivered());
        assert_eq!(report.total(), 0);
    }
}
