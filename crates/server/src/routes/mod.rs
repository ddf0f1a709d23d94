//! HTTP route handlers for the notification API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Health check
//!
//! # Checkout (requires bearer token)
//! POST /api/checkout/notification   - Order confirmation email + cart clear
//! POST /api/checkout/confirmation   - Order confirmation email (payload recipient)
//!
//! # Notifications (requires bearer token)
//! POST /api/notifications/cart      - Cart-activity alert email to the admin address
//! POST /api/notifications/push      - Web Push fan-out (user and/or admins)
//!
//! # Push subscriptions (requires bearer token)
//! POST /api/push/subscribe          - Register a browser subscription
//! POST /api/push/unsubscribe        - Remove a browser subscription
//!
//! # Reviews
//! GET    /api/products/:id/reviews  - Public review listing
//! POST   /api/products/:id/reviews  - Create/replace own review (bearer token)
//! DELETE /api/reviews/:id           - Delete own review, admins any (bearer token)
//! ```

pub mod checkout;
pub mod notifications;
pub mod push;
pub mod reviews;

use axum::{
    Router,
    http::{Method, header},
    routing::{delete, get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/notification", post(checkout::notification))
        .route("/confirmation", post(checkout::confirmation))
}

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", post(notifications::cart))
        .route("/push", post(notifications::push))
}

pub fn push_routes() -> Router<AppState> {
    Router::new()
        .route("/subscribe", post(push::subscribe))
        .route("/unsubscribe", post(push::unsubscribe))
}

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products/{product_id}/reviews",
            get(reviews::list).post(reviews::upsert),
        )
        .route("/reviews/{review_id}", delete(reviews::delete))
}

/// Assemble all API routes under `/api`.
///
/// The API is consumed cross-origin by the storefront frontend, so CORS is
/// wide open on origin; authorization still rides in the bearer header.
pub fn routes() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let api = Router::new()
        .nest("/checkout", checkout_routes())
        .nest("/notifications", notification_routes())
        .nest("/push", push_routes())
        .merge(review_routes());

    Router::new().nest("/api", api).layer(cors)
}
