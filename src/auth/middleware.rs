//! Authentication Middleware
//! Mission: Protect API endpoints with bearer-token validation

use crate::auth::jwt::{TokenCodec, TokenKind};
use crate::auth::models::{AccessClaims, Identity};
use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(ApiError::MissingToken)?;

    let (scheme, token) = value.split_once(' ').ok_or(ApiError::MissingToken)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("Bearer") || token.is_empty() {
        return Err(ApiError::MissingToken);
    }

    Ok(token)
}

/// Verify the bearer token and build the request identity from its claims.
pub fn authenticate_headers(codec: &TokenCodec, headers: &HeaderMap) -> Result<Identity, ApiError> {
    let token = bearer_token(headers)?;

    // Expired and malformed collapse into one answer for the caller
    let payload = codec
        .decode::<AccessClaims>(TokenKind::Access, token)
        .map_err(|e| {
            debug!("Access token rejected: {}", e);
            ApiError::Unauthorized
        })?;

    Ok(Identity::from(payload.claims))
}

/// Auth middleware that rejects requests without a valid access token
pub async fn auth_middleware(
    State(codec): State<Arc<TokenCodec>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = authenticate_headers(&codec, req.headers())?;

    // Add identity to request extensions so handlers can access it
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Optional auth middleware - anonymous on any failure, identity when valid
pub async fn optional_auth_middleware(
    State(codec): State<Arc<TokenCodec>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Ok(identity) = authenticate_headers(&codec, req.headers()) {
        req.extensions_mut().insert(identity);
    }

    next.run(req).await
}

/// Handlers take `Identity` (required) or `Option<Identity>` (optional routes).
#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{RefreshClaims, Role, SubscriptionStatus};
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use std::time::Duration;
    use tower::ServiceExt;

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::new("test-secret-key-12345"))
    }

    fn claims() -> AccessClaims {
        AccessClaims {
            user_id: "user-1".to_string(),
            role: Role::Creator,
            subscription_status: SubscriptionStatus::Paid,
        }
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value.parse().unwrap());
        headers
    }

    async fn whoami(identity: Option<Identity>) -> String {
        identity.map(|i| i.id).unwrap_or_else(|| "anonymous".to_string())
    }

    fn app(codec: Arc<TokenCodec>) -> Router {
        let required = Router::new()
            .route("/required", get(whoami))
            .route_layer(middleware::from_fn_with_state(codec.clone(), auth_middleware));
        let optional = Router::new()
            .route("/optional", get(whoami))
            .route_layer(middleware::from_fn_with_state(
                codec,
                optional_auth_middleware,
            ));
        required.merge(optional)
    }

    async fn call(app: Router, uri: &str, auth: Option<&str>) -> (StatusCode, String) {
        let mut builder = HttpRequest::builder().uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers_with("Bearer abc")).unwrap(), "abc");
        assert_eq!(bearer_token(&headers_with("bearer abc")).unwrap(), "abc");
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(ApiError::MissingToken)
        ));
        assert!(matches!(
            bearer_token(&headers_with("abc")),
            Err(ApiError::MissingToken)
        ));
        assert!(matches!(
            bearer_token(&headers_with("Basic abc")),
            Err(ApiError::MissingToken)
        ));
        assert!(matches!(
            bearer_token(&headers_with("Bearer ")),
            Err(ApiError::MissingToken)
        ));
    }

    #[test]
    fn test_identity_is_token_snapshot() {
        let codec = codec();
        let token = codec
            .encode(TokenKind::Access, &claims(), Duration::from_secs(60))
            .unwrap();

        let identity = authenticate_headers(&codec, &headers_with(&format!("Bearer {}", token)))
            .unwrap();
        assert_eq!(identity.id, "user-1");
        assert_eq!(identity.role, Role::Creator);
        assert_eq!(identity.subscription_status, SubscriptionStatus::Paid);
    }

    #[test]
    fn test_expired_and_malformed_look_the_same() {
        let codec = codec();
        let expired = codec
            .encode_at(TokenKind::Access, &claims(), Duration::from_secs(60), 1_000)
            .unwrap();

        let expired_err =
            authenticate_headers(&codec, &headers_with(&format!("Bearer {}", expired)))
                .unwrap_err();
        let garbage_err = authenticate_headers(&codec, &headers_with("Bearer x.y.z")).unwrap_err();

        assert!(matches!(expired_err, ApiError::Unauthorized));
        assert!(matches!(garbage_err, ApiError::Unauthorized));
        assert_eq!(expired_err.to_string(), garbage_err.to_string());
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let codec = codec();
        let refresh = codec
            .encode(
                TokenKind::Refresh,
                &RefreshClaims {
                    user_id: "user-1".to_string(),
                },
                Duration::from_secs(60),
            )
            .unwrap();

        let result = authenticate_headers(&codec, &headers_with(&format!("Bearer {}", refresh)));
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_required_guard() {
        let codec = codec();
        let token = codec
            .encode(TokenKind::Access, &claims(), Duration::from_secs(60))
            .unwrap();

        let (status, body) = call(app(codec.clone()), "/required", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("missing_token"));

        let (status, _) = call(app(codec.clone()), "/required", Some("Bearer nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let auth = format!("Bearer {}", token);
        let (status, body) = call(app(codec), "/required", Some(&auth)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "user-1");
    }

    #[tokio::test]
    async fn test_optional_guard_falls_back_to_anonymous() {
        let codec = codec();
        let token = codec
            .encode(TokenKind::Access, &claims(), Duration::from_secs(60))
            .unwrap();

        let (status, body) = call(app(codec.clone()), "/optional", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");

        let (status, body) = call(app(codec.clone()), "/optional", Some("Bearer broken")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");

        let auth = format!("Bearer {}", token);
        let (_, body) = call(app(codec), "/optional", Some(&auth)).await;
        assert_eq!(body, "user-1");
    }
}
