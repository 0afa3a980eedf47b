//! Authentication Models
//! Mission: Define secure user, claim and identity data structures

use serde::{Deserialize, Serialize};

/// User account as owned by the credential store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub role: Role,
    pub subscription_status: SubscriptionStatus,
    pub created_at: String,
}

impl User {
    /// Display name derived from the local part of the email.
    pub fn username(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

/// User roles for RBAC
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "subscriber")]
    Subscriber, // Reads posts, pays for premium access
    #[serde(rename = "creator")]
    Creator, // Publishes posts, sees audience stats
    #[serde(rename = "admin")]
    Admin, // Bypasses ownership checks
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Subscriber => "subscriber",
            Role::Creator => "creator",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "subscriber" => Some(Role::Subscriber),
            "creator" => Some(Role::Creator),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Role granted to a self-service registration. Only `creator` can be
    /// requested; anything else (including `admin`) becomes `subscriber`.
    pub fn self_service(requested: Option<&str>) -> Self {
        match requested.map(str::trim) {
            Some("creator") => Role::Creator,
            _ => Role::Subscriber,
        }
    }
}

/// Billing state of a user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SubscriptionStatus {
    #[default]
    #[serde(rename = "free")]
    Free,
    #[serde(rename = "paid")]
    Paid,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Free => "free",
            SubscriptionStatus::Paid => "paid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "free" => Some(SubscriptionStatus::Free),
            "paid" => Some(SubscriptionStatus::Paid),
            _ => None,
        }
    }
}

/// Access token claims: a snapshot of the user's authorization state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: Role,
    pub subscription_status: SubscriptionStatus,
}

/// Refresh token claims: identity only, never authorization data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshClaims {
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// Request-scoped authenticated identity, taken verbatim from a verified
/// access token
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub role: Role,
    pub subscription_status: SubscriptionStatus,
}

impl From<AccessClaims> for Identity {
    fn from(claims: AccessClaims) -> Self {
        Self {
            id: claims.user_id,
            role: claims.role,
            subscription_status: claims.subscription_status,
        }
    }
}

impl From<&User> for AccessClaims {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            role: user.role,
            subscription_status: user.subscription_status,
        }
    }
}

/// Register request body. Fields are optional so that missing values map to
/// a 400 instead of a body rejection.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Refresh request body
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

/// User summary (sanitized)
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub subscription_status: SubscriptionStatus,
}

impl UserSummary {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            username: user.username().to_string(),
            role: user.role,
            subscription_status: user.subscription_status,
        }
    }
}

/// Full profile row (sanitized)
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub subscription_status: SubscriptionStatus,
    pub created_at: String,
}

impl ProfileResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            username: user.username().to_string(),
            role: user.role,
            subscription_status: user.subscription_status,
            created_at: user.created_at.clone(),
        }
    }
}

/// Token pair handed out by a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserSummary,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: UserSummary,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    pub user: UserSummary,
}

impl From<Session> for LoginResponse {
    fn from(session: Session) -> Self {
        Self {
            message: "Login successful",
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            user: session.user,
        }
    }
}

/// Refresh response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

/// Me response: the identity carried by the presented token
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Identity,
}
