//! Session Issuer & Refresh Handler
//! Mission: Turn credentials into token pairs, and refresh tokens into fresh
//! access tokens, without ever holding on to a plaintext password

use crate::auth::jwt::{TokenCodec, TokenKind};
use crate::auth::models::{AccessClaims, RefreshClaims, Role, Session, User, UserSummary};
use crate::auth::user_store::CredentialStore;
use crate::config::AuthSettings;
use crate::error::ApiError;
use anyhow::{Context, Result};
use bcrypt::{hash, verify};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Auth service shared by the auth routes
pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    codec: Arc<TokenCodec>,
    settings: AuthSettings,
    // Verified against when the email is unknown so both failure paths cost
    // one bcrypt comparison
    dummy_hash: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        codec: Arc<TokenCodec>,
        settings: AuthSettings,
    ) -> Result<Self> {
        let dummy_hash = hash("not-a-real-password", settings.bcrypt_cost)
            .context("Failed to prepare dummy password hash")?;

        Ok(Self {
            users,
            codec,
            settings,
            dummy_hash,
        })
    }

    /// Create an account. `requested_role` is normalized to a self-service role.
    pub async fn register(
        &self,
        email: &str,
        password: String,
        requested_role: Option<&str>,
    ) -> Result<UserSummary, ApiError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::bad_request("email and password are required"));
        }

        // Fast path; the UNIQUE constraint settles concurrent registrations
        if self.users.find_by_email(email)?.is_some() {
            return Err(ApiError::EmailAlreadyExists);
        }

        let role = Role::self_service(requested_role);
        let password_hash = hash_password(password, self.settings.bcrypt_cost).await?;
        let user = self.users.insert_user(email, &password_hash, role)?;

        Ok(UserSummary::from_user(&user))
    }

    /// Validate credentials and mint an access/refresh pair.
    pub async fn authenticate(&self, email: &str, password: String) -> Result<Session, ApiError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(email)? else {
            let _ = verify_password(password, self.dummy_hash.clone()).await?;
            warn!("❌ Failed login attempt: {}", email);
            return Err(ApiError::InvalidCredentials);
        };

        if !verify_password(password, user.password_hash.clone()).await? {
            warn!("❌ Failed login attempt: {}", email);
            return Err(ApiError::InvalidCredentials);
        }

        let session = self.issue_session(&user)?;

        info!(
            "✅ Login successful: {} ({})",
            user.email,
            user.role.as_str()
        );

        Ok(session)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// Role and subscription status are re-read from the store, so a payment
    /// confirmed since login shows up in the refreshed token.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, ApiError> {
        let payload = self
            .codec
            .decode::<RefreshClaims>(TokenKind::Refresh, refresh_token)
            .map_err(|e| {
                debug!("Refresh token rejected: {}", e);
                ApiError::Unauthorized
            })?;

        let user = self
            .users
            .find_by_id(&payload.claims.user_id)?
            .ok_or(ApiError::Unauthorized)?;

        self.mint_access(&user)
    }

    /// Current stored user row for an identity.
    pub fn profile(&self, user_id: &str) -> Result<User, ApiError> {
        self.users
            .find_by_id(user_id)?
            .ok_or(ApiError::NotFound("User"))
    }

    /// Create the configured admin account if it does not exist yet.
    /// Returns true when a new account was created.
    pub async fn bootstrap_admin(&self, email: &str, password: String) -> Result<bool, ApiError> {
        let email = normalize_email(email);
        if self.users.find_by_email(email)?.is_some() {
            debug!("Admin account {} already present", email);
            return Ok(false);
        }

        let password_hash = hash_password(password, self.settings.bcrypt_cost).await?;
        match self.users.insert_user(email, &password_hash, Role::Admin) {
            Ok(_) => {
                info!("🔐 Bootstrap admin created: {}", email);
                Ok(true)
            }
            Err(crate::db::StoreError::EmailTaken) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn issue_session(&self, user: &User) -> Result<Session, ApiError> {
        let access_token = self.mint_access(user)?;
        let refresh_token = self
            .codec
            .encode(
                TokenKind::Refresh,
                &RefreshClaims {
                    user_id: user.id.clone(),
                },
                self.settings.refresh_token_ttl,
            )
            .context("Failed to mint refresh token")?;

        Ok(Session {
            access_token,
            refresh_token,
            user: UserSummary::from_user(user),
        })
    }

    fn mint_access(&self, user: &User) -> Result<String, ApiError> {
        let token = self
            .codec
            .encode(
                TokenKind::Access,
                &AccessClaims::from(user),
                self.settings.access_token_ttl,
            )
            .context("Failed to mint access token")?;
        Ok(token)
    }
}

/// Canonical form used for every email lookup and insert. Matching is
/// otherwise exact (case-sensitive).
fn normalize_email(email: &str) -> &str {
    email.trim()
}

/// Hash on the blocking pool; the plaintext is dropped inside the task.
async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    let hashed = tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .context("Password hashing task failed")?
        .context("Failed to hash password")?;
    Ok(hashed)
}

/// bcrypt verification (constant-time digest comparison) on the blocking pool.
async fn verify_password(password: String, password_hash: String) -> Result<bool, ApiError> {
    let valid = tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .context("Password verification task failed")?
        .context("Failed to verify password")?;
    Ok(valid)
}
