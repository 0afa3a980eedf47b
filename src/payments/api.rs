//! Payment API Endpoints
//!
//! - `POST /api/payments/create-checkout-session` - open a hosted checkout
//! - `GET /api/payments/confirm?session_id=` - mark the caller paid once the
//!   provider reports the session as paid
//! - `POST /api/payments/mock` - mark the caller paid without a provider
//!   (only when mock payments are enabled)
//!
//! The caller's access token keeps its old subscription snapshot until it
//! calls `/api/auth/refresh`.

use crate::app::AppState;
use crate::auth::middleware::auth_middleware;
use crate::auth::models::{Identity, SubscriptionStatus};
use crate::auth::user_store::CredentialStore;
use crate::error::ApiError;
use axum::{
    extract::{Query, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    pub session_id: Option<String>,
}

pub fn payments_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/payments/create-checkout-session", post(create_checkout))
        .route("/api/payments/confirm", get(confirm))
        .route("/api/payments/mock", post(mock_payment))
        .route_layer(middleware::from_fn_with_state(
            state.codec.clone(),
            auth_middleware,
        ))
}

pub async fn create_checkout(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let billing = state
        .billing
        .as_ref()
        .ok_or(ApiError::NotConfigured("Payments"))?;

    let user = state
        .users
        .find_by_id(&identity.id)?
        .ok_or(ApiError::Unauthorized)?;

    let session = billing
        .create_checkout_session(&user.id, &user.email)
        .await
        .map_err(ApiError::Upstream)?;

    info!("💳 Checkout session {} for {}", session.id, user.id);

    Ok(Json(CheckoutResponse {
        url: session.url,
        session_id: session.id,
    }))
}

pub async fn confirm(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<Value>, ApiError> {
    let session_id = query
        .session_id
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("session_id is required"))?;

    let billing = state
        .billing
        .as_ref()
        .ok_or(ApiError::NotConfigured("Payments"))?;

    let status = billing
        .session_status(session_id.trim())
        .await
        .map_err(ApiError::Upstream)?;

    // Sessions are only attributable through the metadata set at checkout
    if status.user_id.as_deref() != Some(identity.id.as_str()) {
        warn!(
            "⚠️ Session {} confirmed by {} but opened for {:?}",
            status.id, identity.id, status.user_id
        );
        return Err(ApiError::Forbidden);
    }

    if !status.paid {
        return Err(ApiError::bad_request("Payment not completed"));
    }

    mark_paid(&state, &identity.id)?;

    Ok(Json(json!({
        "message": "Payment successful! You are now subscribed.",
        "subscriptionStatus": SubscriptionStatus::Paid,
    })))
}

pub async fn mock_payment(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Value>, ApiError> {
    if !state.allow_mock_payments {
        return Err(ApiError::NotFound("Route"));
    }

    mark_paid(&state, &identity.id)?;

    Ok(Json(json!({
        "message": "Test payment successful! You are now subscribed.",
        "subscriptionStatus": SubscriptionStatus::Paid,
    })))
}

fn mark_paid(state: &AppState, user_id: &str) -> Result<(), ApiError> {
    if !state
        .users
        .update_subscription_status(user_id, SubscriptionStatus::Paid)?
    {
        return Err(ApiError::NotFound("User"));
    }
    info!("✅ User {} is now a paid subscriber", user_id);
    Ok(())
}
