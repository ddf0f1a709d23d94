//! Cart item model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use attar_core::{CartItemId, ProductId, UserId};

/// A persisted cart row.
///
/// Rows are deleted wholesale after a successful checkout confirmation
/// email.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub product_title: String,
    /// Always >= 1 (CHECK constraint).
    pub quantity: i32,
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
}
