//! Authentication Module
//! Mission: Secure API access with JWT access/refresh tokens, role and
//! subscription based authorization

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod service;
pub mod user_store;

pub use api::auth_router;
pub use jwt::{TokenCodec, TokenError, TokenKind};
pub use middleware::{auth_middleware, optional_auth_middleware};
pub use models::{Identity, Role, SubscriptionStatus};
pub use service::AuthService;
pub use user_store::{CredentialStore, UserStore};
