//! Billing Provider Client
//!
//! Hosted checkout for the monthly premium subscription. The HTTP surface only
//! ever talks to `BillingProvider`; `StripeBilling` is the production
//! implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const PRODUCT_NAME: &str = "Premium Subscription";

/// A hosted checkout the client is redirected to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Outcome of a checkout as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub id: String,
    pub paid: bool,
    /// User the session was opened for, if the provider echoed it back
    pub user_id: Option<String>,
}

#[async_trait]
pub trait BillingProvider: Send + Sync {
    async fn create_checkout_session(&self, user_id: &str, email: &str) -> Result<CheckoutSession>;

    async fn session_status(&self, session_id: &str) -> Result<SessionStatus>;
}

/// Stripe Checkout over its REST API
#[derive(Clone)]
pub struct StripeBilling {
    client: Client,
    api_base: String,
    client_url: String,
    price_cents: u32,
}

#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl From<StripeSession> for SessionStatus {
    fn from(session: StripeSession) -> Self {
        Self {
            paid: session.payment_status.as_deref() == Some("paid"),
            user_id: session.metadata.get("userId").cloned(),
            id: session.id,
        }
    }
}

impl StripeBilling {
    pub fn new(
        secret_key: &str,
        api_base: impl Into<String>,
        client_url: impl Into<String>,
        price_cents: u32,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::AUTHORIZATION,
                    format!("Bearer {}", secret_key)
                        .parse()
                        .context("Invalid Stripe secret key")?,
                );
                headers
            })
            .build()
            .context("Failed to build Stripe client")?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client_url: client_url.into().trim_end_matches('/').to_string(),
            price_cents,
        })
    }

    #[inline]
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Form body for `POST /v1/checkout/sessions`
    fn checkout_form(&self, user_id: &str, email: &str) -> Vec<(&'static str, String)> {
        vec![
            ("mode", "subscription".to_string()),
            ("payment_method_types[0]", "card".to_string()),
            ("customer_email", email.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("line_items[0][price_data][currency]", "usd".to_string()),
            (
                "line_items[0][price_data][unit_amount]",
                self.price_cents.to_string(),
            ),
            (
                "line_items[0][price_data][recurring][interval]",
                "month".to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                PRODUCT_NAME.to_string(),
            ),
            (
                "success_url",
                format!(
                    "{}/subscribe/success?session_id={{CHECKOUT_SESSION_ID}}",
                    self.client_url
                ),
            ),
            ("cancel_url", format!("{}/subscribe", self.client_url)),
            ("metadata[userId]", user_id.to_string()),
        ]
    }
}

#[async_trait]
impl BillingProvider for StripeBilling {
    async fn create_checkout_session(&self, user_id: &str, email: &str) -> Result<CheckoutSession> {
        let resp = self
            .client
            .post(self.url("/v1/checkout/sessions"))
            .form(&self.checkout_form(user_id, email))
            .send()
            .await
            .context("POST /v1/checkout/sessions failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "POST /v1/checkout/sessions {}: {}",
                status,
                text
            ));
        }

        let session = resp
            .json::<StripeSession>()
            .await
            .context("Failed to parse checkout session")?;

        debug!("Checkout session {} opened for {}", session.id, user_id);

        let url = session
            .url
            .context("Checkout session response has no url")?;
        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn session_status(&self, session_id: &str) -> Result<SessionStatus> {
        let resp = self
            .client
            .get(self.url(&format!("/v1/checkout/sessions/{}", session_id)))
            .send()
            .await
            .context("GET /v1/checkout/sessions failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "GET /v1/checkout/sessions/{} {}: {}",
                session_id,
                status,
                text
            ));
        }

        let session = resp
            .json::<StripeSession>()
            .await
            .context("Failed to parse checkout session")?;

        Ok(SessionStatus::from(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_form_fields() {
        let billing =
            StripeBilling::new("sk_test", "https://api.stripe.com/", "http://localhost:3000/", 999)
                .unwrap();
        let form: HashMap<_, _> = billing
            .checkout_form("user-1", "a@example.com")
            .into_iter()
            .collect();

        assert_eq!(form["mode"], "subscription");
        assert_eq!(form["customer_email"], "a@example.com");
        assert_eq!(form["metadata[userId]"], "user-1");
        assert_eq!(form["line_items[0][price_data][unit_amount]"], "999");
        assert_eq!(form["line_items[0][price_data][recurring][interval]"], "month");
        assert_eq!(
            form["success_url"],
            "http://localhost:3000/subscribe/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(form["cancel_url"], "http://localhost:3000/subscribe");
        assert_eq!(
            billing.url("/v1/checkout/sessions"),
            "https://api.stripe.com/v1/checkout/sessions"
        );
    }

    #[test]
    fn test_session_status_from_response() {
        let paid: StripeSession = serde_json::from_str(
            r#"{"id":"cs_1","url":null,"payment_status":"paid","metadata":{"userId":"u1"}}"#,
        )
        .unwrap();
        assert_eq!(
            SessionStatus::from(paid),
            SessionStatus {
                id: "cs_1".into(),
                paid: true,
                user_id: Some("u1".into()),
            }
        );

        let unpaid: StripeSession =
            serde_json::from_str(r#"{"id":"cs_2","payment_status":"unpaid"}"#).unwrap();
        let status = SessionStatus::from(unpaid);
        assert!(!status.paid);
        assert_eq!(status.user_id, None);
    }
}
