//! Payments Module
//! Mission: Turn a completed checkout into a paid subscription

pub mod api;
pub mod billing;

pub use api::payments_router;
pub use billing::{BillingProvider, CheckoutSession, SessionStatus, StripeBilling};
