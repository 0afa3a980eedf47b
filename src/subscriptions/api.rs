//! Subscription API Endpoints
//!
//! - `GET /api/subscriptions/status` - caller's stored subscription status
//! - `GET /api/subscriptions/creator/subscribers` - paid subscribers (creator/admin)
//! - `GET /api/subscriptions/creator/stats` - audience counts (creator/admin)

use crate::app::AppState;
use crate::auth::middleware::auth_middleware;
use crate::auth::models::{Identity, SubscriptionStatus, UserSummary};
use crate::auth::policy::{authorize, enforce, Action, Resource};
use crate::auth::user_store::CredentialStore;
use crate::error::ApiError;
use axum::{extract::State, middleware, routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SubscriptionStatusResponse {
    pub is_paid_subscriber: bool,
    pub subscription_status: SubscriptionStatus,
}

#[derive(Debug, Serialize)]
pub struct CreatorStats {
    pub total_subscribers: u64,
    pub paid_subscribers: u64,
    pub total_posts: u64,
}

pub fn subscriptions_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/subscriptions/status", get(status))
        .route("/api/subscriptions/creator/subscribers", get(subscribers))
        .route("/api/subscriptions/creator/stats", get(stats))
        .route_layer(middleware::from_fn_with_state(
            state.codec.clone(),
            auth_middleware,
        ))
}

/// Status is read from the store, so a payment shows up before the caller
/// refreshes its access token.
pub async fn status(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<SubscriptionStatusResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(&identity.id)?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(SubscriptionStatusResponse {
        is_paid_subscriber: user.subscription_status == SubscriptionStatus::Paid,
        subscription_status: user.subscription_status,
    }))
}

pub async fn subscribers(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    enforce(authorize(
        Some(&identity),
        &Resource::unowned(),
        Action::ViewAudience,
    ))?;

    let paid = state.users.list_paid_subscribers()?;
    Ok(Json(paid.iter().map(UserSummary::from_user).collect()))
}

/// Creator dashboard figures. Subscriber counts are platform-wide (every
/// subscriber-role account); `total_posts` counts only the caller's posts.
pub async fn stats(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<CreatorStats>, ApiError> {
    enforce(authorize(
        Some(&identity),
        &Resource::unowned(),
        Action::ViewAudience,
    ))?;

    let (total_subscribers, paid_subscribers) = state.users.subscriber_counts()?;
    let total_posts = state.posts.count_by_author(&identity.id)?;

    Ok(Json(CreatorStats {
        total_subscribers,
        paid_subscribers,
        total_posts,
    }))
}
