//! Newsletter Platform Backend Library
//!
//! Subscription newsletter API: creators publish posts, subscribers pay for
//! premium access. Exposes the router and its building blocks for the server
//! binary, the developer tools and the integration tests.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod payments;
pub mod posts;
pub mod subscriptions;

pub use app::{router, AppState};
pub use config::{AuthSettings, Config};
pub use db::Database;
pub use error::{ApiError, ErrorKind};
