//! Posts Module
//! Mission: Creator-authored posts with a premium gate on paid content

pub mod api;
pub mod models;
pub mod store;

pub use api::posts_router;
pub use models::{Post, PostView};
pub use store::PostStore;
