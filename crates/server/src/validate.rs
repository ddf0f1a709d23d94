//! Request payload types and validation.
//!
//! Every JSON body the notification pipeline accepts is a strongly-typed
//! struct with a single `validate()` entry point, called before any side
//! effect runs. Identifier format (RFC 4122) is enforced by the UUID-backed
//! ID types at deserialization time; everything else - string ceilings,
//! numeric ranges, collection bounds - is checked here. A request that fails
//! validation is never partially applied.

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use attar_core::{Email, UserId};

/// Maximum length for product titles and display names.
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum length for notification bodies and review comments.
pub const MAX_BODY_LEN: usize = 500;
/// Unit price ceiling.
pub const MAX_UNIT_PRICE: u32 = 1_000_000;
/// Order total ceiling.
pub const MAX_TOTAL_PRICE: u32 = 10_000_000;
/// Quantity range for a single cart line.
pub const QUANTITY_RANGE: std::ops::RangeInclusive<i64> = 1..=100;
/// Allowed cart sizes for a checkout payload.
pub const CART_LEN_RANGE: std::ops::RangeInclusive<usize> = 1..=50;
/// Review rating range.
pub const RATING_RANGE: std::ops::RangeInclusive<i16> = 1..=5;

/// A field-level validation failure. Maps to HTTP 400.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// The payload field that failed.
    pub field: &'static str,
    /// Human-readable reason.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// One line of a checkout cart payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemInput {
    pub product_title: String,
    pub quantity: i64,
    pub price: Decimal,
}

impl CartItemInput {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.product_title.is_empty() {
            return Err(ValidationError::new("productTitle", "must not be empty"));
        }
        if self.product_title.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::new(
                "productTitle",
                format!("must be at most {MAX_TITLE_LEN} characters"),
            ));
        }
        if !QUANTITY_RANGE.contains(&self.quantity) {
            return Err(ValidationError::new(
                "quantity",
                format!(
                    "must be between {} and {}",
                    QUANTITY_RANGE.start(),
                    QUANTITY_RANGE.end()
                ),
            ));
        }
        if self.price <= Decimal::ZERO || self.price > Decimal::from(MAX_UNIT_PRICE) {
            return Err(ValidationError::new(
                "price",
                format!("must be greater than 0 and at most {MAX_UNIT_PRICE}"),
            ));
        }
        Ok(())
    }
}

/// Validate a checkout cart: collection bounds plus every line.
fn validate_cart(
    cart_items: &[CartItemInput],
    total_price: Decimal,
) -> Result<(), ValidationError> {
    if !CART_LEN_RANGE.contains(&cart_items.len()) {
        return Err(ValidationError::new(
            "cartItems",
            format!(
                "must contain between {} and {} items",
                CART_LEN_RANGE.start(),
                CART_LEN_RANGE.end()
            ),
        ));
    }
    for item in cart_items {
        item.validate()?;
    }
    if total_price <= Decimal::ZERO || total_price > Decimal::from(MAX_TOTAL_PRICE) {
        return Err(ValidationError::new(
            "totalPrice",
            format!("must be greater than 0 and at most {MAX_TOTAL_PRICE}"),
        ));
    }
    Ok(())
}

/// `POST /api/checkout/notification` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutNotificationRequest {
    pub user_id: UserId,
    pub cart_items: Vec<CartItemInput>,
    pub total_price: Decimal,
}

impl CheckoutNotificationRequest {
    /// Check structural and bound constraints.
    ///
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_cart(&self.cart_items, self.total_price)
    }
}

/// `POST /api/checkout/confirmation` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutConfirmationRequest {
    pub user_email: String,
    pub user_name: String,
    pub cart_items: Vec<CartItemInput>,
    pub total_price: Decimal,
}

impl CheckoutConfirmationRequest {
    /// Check structural and bound constraints.
    ///
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        Email::parse(&self.user_email)
            .map_err(|e| ValidationError::new("userEmail", e.to_string()))?;
        if self.user_name.is_empty() {
            return Err(ValidationError::new("userName", "must not be empty"));
        }
        if self.user_name.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::new(
                "userName",
                format!("must be at most {MAX_TITLE_LEN} characters"),
            ));
        }
        validate_cart(&self.cart_items, self.total_price)
    }
}

/// `POST /api/notifications/cart` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartNotificationRequest {
    pub user_id: UserId,
    pub product_title: String,
    pub quantity: i64,
}

impl CartNotificationRequest {
    /// Check structural and bound constraints.
    ///
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.product_title.is_empty() {
            return Err(ValidationError::new("productTitle", "must not be empty"));
        }
        if self.product_title.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::new(
                "productTitle",
                format!("must be at most {MAX_TITLE_LEN} characters"),
            ));
        }
        if !QUANTITY_RANGE.contains(&self.quantity) {
            return Err(ValidationError::new(
                "quantity",
                format!(
                    "must be between {} and {}",
                    QUANTITY_RANGE.start(),
                    QUANTITY_RANGE.end()
                ),
            ));
        }
        Ok(())
    }
}

/// Title/body pair for a push notification.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct NotificationBody {
    pub title: String,
    pub body: String,
}

impl NotificationBody {
    fn validate(&self, field: &'static str) -> Result<(), ValidationError> {
        if self.title.is_empty() {
            return Err(ValidationError::new(field, "title must not be empty"));
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::new(
                field,
                format!("title must be at most {MAX_TITLE_LEN} characters"),
            ));
        }
        if self.body.chars().count() > MAX_BODY_LEN {
            return Err(ValidationError::new(
                field,
                format!("body must be at most {MAX_BODY_LEN} characters"),
            ));
        }
        Ok(())
    }
}

/// `POST /api/notifications/push` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushNotificationRequest {
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub notify_admin: bool,
    pub user_notification: Option<NotificationBody>,
    pub admin_notification: Option<NotificationBody>,
}

impl PushNotificationRequest {
    /// Check structural and bound constraints.
    ///
    /// A request must target at least one class: a user notification (with
    /// its user id) or the admin broadcast.
    ///
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(n) = &self.user_notification {
            if self.user_id.is_none() {
                return Err(ValidationError::new(
                    "userId",
                    "required when userNotification is present",
                ));
            }
            n.validate("userNotification")?;
        }
        if let Some(n) = &self.admin_notification {
            n.validate("adminNotification")?;
        }
        if self.user_notification.is_none() && !self.notify_admin {
            return Err(ValidationError::new(
                "notifyAdmin",
                "request targets neither a user nor the admins",
            ));
        }
        if self.notify_admin && self.admin_notification.is_none() {
            return Err(ValidationError::new(
                "adminNotification",
                "required when notifyAdmin is set",
            ));
        }
        Ok(())
    }
}

/// `POST /api/push/subscribe` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}

impl SubscribeRequest {
    /// Check structural constraints.
    ///
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.endpoint.starts_with("https://") {
            return Err(ValidationError::new("endpoint", "must be an https URL"));
        }
        if self.p256dh.is_empty() {
            return Err(ValidationError::new("p256dh", "must not be empty"));
        }
        if self.auth.is_empty() {
            return Err(ValidationError::new("auth", "must not be empty"));
        }
        Ok(())
    }
}

/// `POST /api/push/unsubscribe` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

/// `POST /api/products/{id}/reviews` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub rating: i16,
    pub comment: Option<String>,
}

impl ReviewRequest {
    /// Check structural and bound constraints.
    ///
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !RATING_RANGE.contains(&self.rating) {
            return Err(ValidationError::new(
                "rating",
                format!(
                    "must be between {} and {}",
                    RATING_RANGE.start(),
                    RATING_RANGE.end()
                ),
            ));
        }
        if let Some(comment) = &self.comment
            && comment.chars().count() > MAX_BODY_LEN
        {
            return Err(ValidationError::new(
                "comment",
                format!("must be at most {MAX_BODY_LEN} characters"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use attar_core::UserId;

    fn item(title: &str, quantity: i64, price: i64) -> CartItemInput {
        CartItemInput {
            product_title: title.to_string(),
            quantity,
            price: Decimal::from(price),
        }
    }

    fn checkout(items: Vec<CartItemInput>, total: i64) -> CheckoutNotificationRequest {
        CheckoutNotificationRequest {
            user_id: UserId::generate(),
            cart_items: items,
            total_price: Decimal::from(total),
        }
    }

    #[test]
    fn test_valid_checkout_payload() {
        let req = checkout(vec![item("Oud Intense", 2, 1500)], 3000);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_empty_cart_rejected() {
        let req = checkout(vec![], 100);
        let err = req.validate().unwrap_err();
        assert_eq!(err.field, "cartItems");
    }

    #[test]
    fn test_oversized_cart_rejected() {
        let items = (0..51).map(|_| item("Rose Accord", 1, 100)).collect();
        let req = checkout(items, 5100);
        let err = req.validate().unwrap_err();
        assert_eq!(err.field, "cartItems");
    }

    #[test]
    fn test_cart_of_fifty_accepted() {
        let items = (0..50).map(|_| item("Rose Accord", 1, 100)).collect();
        let req = checkout(items, 5000);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_quantity_bounds() {
        for bad in [0, -1, 101, i64::MAX] {
            let req = checkout(vec![item("Amber Noir", bad, 100)], 100);
            let err = req.validate().unwrap_err();
            assert_eq!(err.field, "quantity", "quantity {bad} should fail");
        }
        for good in [1, 100] {
            let req = checkout(vec![item("Amber Noir", good, 100)], 100);
            assert!(req.validate().is_ok(), "quantity {good} should pass");
        }
    }

    #[test]
    fn test_price_bounds() {
        let zero = checkout(vec![item("Musk", 1, 0)], 100);
        assert_eq!(zero.validate().unwrap_err().field, "price");

        let negative = checkout(vec![item("Musk", 1, -5)], 100);
        assert_eq!(negative.validate().unwrap_err().field, "price");

        let over = checkout(vec![item("Musk", 1, 1_000_001)], 100);
        assert_eq!(over.validate().unwrap_err().field, "price");

        let at_ceiling = checkout(vec![item("Musk", 1, 1_000_000)], 1_000_000);
        assert!(at_ceiling.validate().is_ok());
    }

    #[test]
    fn test_total_price_bounds() {
        let zero = checkout(vec![item("Vetiver", 1, 100)], 0);
        assert_eq!(zero.validate().unwrap_err().field, "totalPrice");

        let over = checkout(vec![item("Vetiver", 1, 100)], 10_000_001);
        assert_eq!(over.validate().unwrap_err().field, "totalPrice");
    }

    #[test]
    fn test_title_ceiling() {
        let long = "x".repeat(201);
        let req = checkout(vec![item(&long, 1, 100)], 100);
        assert_eq!(req.validate().unwrap_err().field, "productTitle");

        let at_limit = "x".repeat(200);
        let req = checkout(vec![item(&at_limit, 1, 100)], 100);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_confirmation_requires_valid_email() {
        let req = CheckoutConfirmationRequest {
            user_email: "not-an-email".to_string(),
            user_name: "Layla".to_string(),
            cart_items: vec![item("Saffron Veil", 1, 200)],
            total_price: Decimal::from(200),
        };
        assert_eq!(req.validate().unwrap_err().field, "userEmail");
    }

    #[test]
    fn test_push_request_needs_a_target() {
        let req = PushNotificationRequest {
            user_id: None,
            notify_admin: false,
            user_notification: None,
            admin_notification: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_push_user_notification_requires_user_id() {
        let req = PushNotificationRequest {
            user_id: None,
            notify_admin: false,
            user_notification: Some(NotificationBody {
                title: "Order shipped".to_string(),
                body: "On its way".to_string(),
            }),
            admin_notification: None,
        };
        assert_eq!(req.validate().unwrap_err().field, "userId");
    }

    #[test]
    fn test_push_body_ceiling() {
        let req = PushNotificationRequest {
            user_id: Some(UserId::generate()),
            notify_admin: false,
            user_notification: Some(NotificationBody {
                title: "Hi".to_string(),
                body: "x".repeat(501),
            }),
            admin_notification: None,
        };
        assert_eq!(req.validate().unwrap_err().field, "userNotification");
    }

    #[test]
    fn test_notify_admin_requires_body() {
        let req = PushNotificationRequest {
            user_id: None,
            notify_admin: true,
            user_notification: None,
            admin_notification: None,
        };
        assert_eq!(req.validate().unwrap_err().field, "adminNotification");
    }

    #[test]
    fn test_rating_bounds() {
        for bad in [0, 6, -1] {
            let req = ReviewRequest {
                rating: bad,
                comment: None,
            };
            assert!(req.validate().is_err(), "rating {bad} should fail");
        }
        for good in [1, 3, 5] {
            let req = ReviewRequest {
                rating: good,
                comment: Some("lovely sillage".to_string()),
            };
            assert!(req.validate().is_ok());
        }
    }

    #[test]
    fn test_subscribe_requires_https_endpoint() {
        let req = SubscribeRequest {
            endpoint: "http://push.example.com/abc".to_string(),
            p256dh: "key".to_string(),
            auth: "secret".to_string(),
        };
        assert_eq!(req.validate().unwrap_err().field, "endpoint");
    }

    #[test]
    fn test_malformed_user_id_rejected_at_deserialization() {
        let json = r#"{"userId":"123","cartItems":[],"totalPrice":10}"#;
        let parsed: Result<CheckoutNotificationRequest, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }
}
