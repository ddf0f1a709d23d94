//! Domain models backed by database rows.

pub mod cart;
pub mod profile;
pub mod push;
pub mod review;

pub use cart::CartItem;
pub use profile::{CurrentUser, Profile};
pub use push::{AdminFcmToken, PushSubscription};
pub use review::{PublicReview, Review};
