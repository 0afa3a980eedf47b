//! Shared harness for the HTTP integration tests

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use newsletter_backend::auth::TokenCodec;
use newsletter_backend::{router, AppState, AuthSettings, Database};
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret";

pub fn settings() -> AuthSettings {
    AuthSettings {
        bcrypt_cost: 4,
        ..Default::default()
    }
}

pub fn state_with(db: Database) -> AppState {
    AppState::new(db, TokenCodec::new(SECRET), settings())
        .unwrap()
        .with_mock_payments(true)
}

pub fn test_app() -> Router {
    router(state_with(Database::in_memory().unwrap()))
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Send a body verbatim, optionally without a content type
pub async fn send_raw(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(Method::POST).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    // Non-JSON bodies show up as Null so assertions on fields fail loudly
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// Register then log in; returns (access token, refresh token, user id)
pub async fn signup(app: &Router, email: &str, role: &str) -> (String, String, String) {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(serde_json::json!({ "email": email, "password": "secret1", "role": role })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "email": email, "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    (
        body["accessToken"].as_str().unwrap().to_string(),
        body["refreshToken"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}
