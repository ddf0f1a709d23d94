//! Integration tests for the Attar notification server.
//!
//! # Running Tests
//!
//! ```bash
//! # Pure contract tests (no server needed)
//! cargo test -p attar-integration-tests
//!
//! # Live API tests against a running server
//! cargo test -p attar-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `checkout_contract` - Request/response JSON contract for checkout
//! - `push_delivery` - Delivery classification and VAPID token shape
//! - `notification_api` - Live HTTP tests (ignored by default)
//!
//! Live tests expect `ATTAR_BASE_URL` (default `http://localhost:3000`) and
//! `ATTAR_TEST_TOKEN`, a bearer token present in the `api_token` table.
