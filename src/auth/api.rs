//! Authentication API Endpoints
//! Mission: Provide register, login, refresh and identity endpoints
//!
//! # Endpoints
//!
//! - `POST /api/auth/register` - Create an account (201)
//! - `POST /api/auth/login` - Exchange credentials for an access/refresh pair
//! - `POST /api/auth/refresh` - Exchange a refresh token for a new access token
//! - `POST /api/auth/logout` - Client-side logout acknowledgement
//! - `GET /api/auth/profile` - Stored user row (access token)
//! - `GET /api/auth/me` - Identity claims carried by the access token

use crate::app::AppState;
use crate::auth::middleware::auth_middleware;
use crate::auth::models::{
    Identity, LoginRequest, LoginResponse, MeResponse, ProfileResponse, RefreshRequest,
    RefreshResponse, RegisterRequest, RegisterResponse,
};
use crate::error::ApiError;
use crate::middleware::rate_limit_middleware;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;

/// Auth routes; credential endpoints sit behind the per-IP rate limiter
pub fn auth_router(state: &AppState) -> Router<AppState> {
    let credentials = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ));

    let tokens = Router::new()
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout));

    let protected = Router::new()
        .route("/api/auth/profile", get(profile))
        .route("/api/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            state.codec.clone(),
            auth_middleware,
        ));

    credentials.merge(tokens).merge(protected)
}

/// Register endpoint - POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(payload) = payload?;
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(ApiError::bad_request("email and password are required"));
    };

    info!("📝 Registration attempt: {}", email.trim());

    let user = state
        .auth
        .register(&email, password, payload.role.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created",
            user,
        }),
    ))
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    // A malformed body is just another failed login
    let Json(payload) = payload.map_err(|_| ApiError::InvalidCredentials)?;
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(ApiError::InvalidCredentials);
    };

    info!("🔐 Login attempt: {}", email);

    let session = state.auth.authenticate(&email, password).await?;

    Ok(Json(LoginResponse::from(session)))
}

/// Refresh endpoint - POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| match rejection {
        // A body was sent but the token field is not a string
        JsonRejection::JsonDataError(_) => ApiError::Unauthorized,
        _ => ApiError::MissingToken,
    })?;
    let token = payload
        .refresh_token
        .filter(|t| !t.trim().is_empty())
        .ok_or(ApiError::MissingToken)?;

    let access_token = state.auth.refresh(token.trim())?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Logout endpoint - POST /api/auth/logout
///
/// Tokens are stateless; the client discards them. A leaked refresh token
/// stays valid until its own expiry.
pub async fn logout() -> Json<Value> {
    Json(json!({ "message": "Logout successful" }))
}

/// Profile endpoint - GET /api/auth/profile
pub async fn profile(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state.auth.profile(&identity.id)?;
    Ok(Json(ProfileResponse::from_user(&user)))
}

/// Current identity - GET /api/auth/me
/// Built from the token claims alone (no database lookup)
pub async fn me(identity: Identity) -> Json<MeResponse> {
    Json(MeResponse { user: identity })
}
