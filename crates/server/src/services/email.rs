//! Transactional email dispatch via the Resend API.
//!
//! Renders Askama HTML templates and submits them to Resend. Askama's HTML
//! auto-escaping covers every interpolated user-controlled string, so a
//! product title like `<script>` arrives in the rendered email as its entity
//! form. One outbound email per invocation; no retry on provider failure -
//! the provider's error message propagates to the caller.

use askama::Template;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use attar_core::Email;

use crate::config::EmailConfig;
use crate::validate::CartItemInput;

/// Resend API base URL.
const BASE_URL: &str = "https://api.resend.com";

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("email provider error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// API key contains characters that cannot form a header value.
    #[error("invalid API key format: {0}")]
    InvalidApiKey(String),
}

/// One rendered line of the order summary table.
struct OrderLineView {
    title: String,
    quantity: i64,
    unit_price: String,
    line_total: String,
}

/// HTML template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    customer_name: &'a str,
    customer_email: &'a str,
    lines: Vec<OrderLineView>,
    total: String,
}

/// HTML template for the admin cart-activity alert.
#[derive(Template)]
#[template(path = "email/cart_alert.html")]
struct CartAlertHtml<'a> {
    customer_email: &'a str,
    product_title: &'a str,
    quantity: i64,
}

/// Successful send response from Resend.
#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// Client for the Resend transactional email API.
#[derive(Clone)]
pub struct EmailClient {
    client: reqwest::Client,
    from_address: Email,
    admin_address: Email,
}

impl EmailClient {
    /// Create a new email client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the API key is not
    /// a valid header value.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| EmailError::InvalidApiKey(e.to_string()))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            from_address: config.from_address.clone(),
            admin_address: config.admin_address.clone(),
        })
    }

    /// Send the order confirmation email for a checkout.
    ///
    /// Returns the provider's email id on success.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render or the API call fails.
    pub async fn send_order_confirmation(
        &self,
        to: &Email,
        customer_name: &str,
        cart_items: &[CartItemInput],
        total_price: Decimal,
    ) -> Result<String, EmailError> {
        let html = OrderConfirmationHtml {
            customer_name,
            customer_email: to.as_str(),
            lines: cart_items.iter().map(order_line).collect(),
            total: format_price(total_price),
        }
        .render()?;

        self.send(to.as_str(), "Your Attar order confirmation", &html)
            .await
    }

    /// Send a cart-activity alert to the configured admin address.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render or the API call fails.
    pub async fn send_cart_alert(
        &self,
        customer_email: &Email,
        product_title: &str,
        quantity: i64,
    ) -> Result<String, EmailError> {
        let html = CartAlertHtml {
            customer_email: customer_email.as_str(),
            product_title,
            quantity,
        }
        .render()?;

        let to = self.admin_address.clone();
        self.send(to.as_str(), "Cart activity on Attar", &html).await
    }

    /// Submit an email to Resend.
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<String, EmailError> {
        let url = format!("{BASE_URL}/emails");

        let body = serde_json::json!({
            "from": self.from_address.as_str(),
            "to": [to],
            "subject": subject,
            "html": html,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: SendEmailResponse = response.json().await?;

        tracing::info!(to = %to, subject = %subject, email_id = %parsed.id, "Email sent");
        Ok(parsed.id)
    }
}

/// Format a decimal amount for display in emails.
fn format_price(amount: Decimal) -> String {
    format!("${amount:.2}")
}

fn order_line(item: &CartItemInput) -> OrderLineView {
    OrderLineView {
        title: item.product_title.clone(),
        quantity: item.quantity,
        unit_price: format_price(item.price),
        line_total: format_price(item.price * Decimal::from(item.quantity)),
    }
}
