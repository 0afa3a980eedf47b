//! Application State & Router
//! Mission: Wire the stores, the token codec and the billing provider into one
//! axum router

use crate::auth::{auth_router, AuthService, TokenCodec, UserStore};
use crate::config::{AuthSettings, Config};
use crate::db::Database;
use crate::middleware::{request_logging, RateLimitConfig, RateLimitLayer};
use crate::payments::{payments_router, BillingProvider, StripeBilling};
use crate::posts::{posts_router, PostStore};
use crate::subscriptions::subscriptions_router;
use anyhow::Result;
use axum::{http::HeaderValue, middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub codec: Arc<TokenCodec>,
    pub users: Arc<UserStore>,
    pub posts: Arc<PostStore>,
    pub billing: Option<Arc<dyn BillingProvider>>,
    pub allow_mock_payments: bool,
    pub rate_limiter: RateLimitLayer,
}

impl AppState {
    /// State with no billing provider, mock payments off and the default
    /// auth rate limit.
    pub fn new(db: Database, codec: TokenCodec, settings: AuthSettings) -> Result<Self> {
        let users = Arc::new(UserStore::new(db.clone()));
        let codec = Arc::new(codec);
        let auth = Arc::new(AuthService::new(users.clone(), codec.clone(), settings)?);

        Ok(Self {
            auth,
            codec,
            users,
            posts: Arc::new(PostStore::new(db)),
            billing: None,
            allow_mock_payments: false,
            rate_limiter: RateLimitLayer::new(RateLimitConfig::default()),
        })
    }

    pub fn with_billing(mut self, billing: Arc<dyn BillingProvider>) -> Self {
        self.billing = Some(billing);
        self
    }

    pub fn with_mock_payments(mut self, allow: bool) -> Self {
        self.allow_mock_payments = allow;
        self
    }

    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limiter = RateLimitLayer::new(config);
        self
    }

    pub fn from_config(config: &Config, db: Database) -> Result<Self> {
        let state = Self::new(db, TokenCodec::new(config.jwt_secret.clone()), config.auth_settings())?
            .with_mock_payments(config.allow_mock_payments)
            .with_rate_limit(RateLimitConfig::per_minute(config.auth_rate_limit_per_minute));

        if config.allow_mock_payments {
            warn!("⚠️ Mock payments enabled - POST /api/payments/mock marks callers paid");
        }

        match config.stripe_secret_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => {
                let stripe = StripeBilling::new(
                    key,
                    config.stripe_api_base.clone(),
                    config.client_url.clone(),
                    config.subscription_price_cents,
                )?;
                info!("💳 Stripe billing enabled");
                Ok(state.with_billing(Arc::new(stripe)))
            }
            None => {
                warn!("STRIPE_SECRET_KEY not set - checkout endpoints return 503");
                Ok(state)
            }
        }
    }
}

/// Full API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(auth_router(&state))
        .merge(posts_router(&state))
        .merge(subscriptions_router(&state))
        .merge(payments_router(&state))
        .layer(middleware::from_fn(request_logging))
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

/// Permissive when no origins are configured
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
