//! Post records and their wire shapes

use serde::{Deserialize, Serialize};

/// A stored post joined with its author's display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub is_paid: bool,
    pub author_id: String,
    pub author_username: String,
    pub created_at: String,
}

/// Post as returned by the API. `content` is `null` when the caller may not
/// read a premium post.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: String,
    pub title: String,
    pub content: Option<String>,
    pub is_paid_content: bool,
    pub author_id: String,
    pub author_username: String,
    pub created_at: String,
    pub locked: bool,
}

impl PostView {
    pub fn full(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: Some(post.content),
            is_paid_content: post.is_paid,
            author_id: post.author_id,
            author_username: post.author_username,
            created_at: post.created_at,
            locked: false,
        }
    }

    pub fn redacted(post: Post) -> Self {
        Self {
            content: None,
            locked: true,
            ..Self::full(post)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub is_paid_content: bool,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_paid_content: Option<bool>,
}

impl UpdatePostRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.is_paid_content.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Post {
        Post {
            id: "p1".into(),
            title: "Hello".into(),
            content: "secret".into(),
            is_paid: true,
            author_id: "u1".into(),
            author_username: "alice".into(),
            created_at: "2024-01-01T00:00:00.000000Z".into(),
        }
    }

    #[test]
    fn test_redacted_view_hides_content() {
        let json = serde_json::to_value(PostView::redacted(sample())).unwrap();
        assert!(json["content"].is_null());
        assert_eq!(json["locked"], true);
        assert_eq!(json["is_paid_content"], true);
        assert_eq!(json["title"], "Hello");
    }

    #[test]
    fn test_full_view_keeps_content() {
        let view = PostView::full(sample());
        assert_eq!(view.content.as_deref(), Some("secret"));
        assert!(!view.locked);
    }

    #[test]
    fn test_create_request_defaults_to_free() {
        let req: CreatePostRequest =
            serde_json::from_str(r#"{"title":"t","content":"c"}"#).unwrap();
        assert!(!req.is_paid_content);
    }
}
