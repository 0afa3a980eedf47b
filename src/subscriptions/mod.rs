//! Subscriptions Module
//! Mission: Subscription status for readers, audience figures for creators

pub mod api;

pub use api::{subscriptions_router, CreatorStats, SubscriptionStatusResponse};
