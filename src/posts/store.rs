//! Post Storage
//! Mission: Persist posts in SQLite and resolve author display names

use crate::db::{Database, StoreError};
use crate::posts::models::{Post, UpdatePostRequest};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::info;
use uuid::Uuid;

const POST_SELECT: &str = "SELECT p.id, p.title, p.content, p.is_paid, p.author_id, p.created_at, u.email \
     FROM posts p LEFT JOIN users u ON u.id = p.author_id";

// Insertion order breaks ties between posts created in the same microsecond
const NEWEST_FIRST: &str = "ORDER BY p.created_at DESC, p.rowid DESC";

/// Post storage with SQLite backend
#[derive(Clone)]
pub struct PostStore {
    db: Database,
}

impl PostStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_post(row: &Row<'_>) -> rusqlite::Result<Post> {
        let author_id: String = row.get(4)?;
        let email: Option<String> = row.get(6)?;
        Ok(Post {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            is_paid: row.get::<_, i64>(3)? != 0,
            author_username: author_display_name(email.as_deref(), &author_id),
            author_id,
            created_at: row.get(5)?,
        })
    }

    pub fn create(
        &self,
        author_id: &str,
        title: &str,
        content: &str,
        is_paid: bool,
    ) -> Result<Post, StoreError> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        self.db.conn().execute(
            "INSERT INTO posts (id, title, content, is_paid, author_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, title, content, is_paid as i64, author_id, created_at],
        )?;

        info!("📝 Post {} created by {}", id, author_id);

        self.find_by_id(&id)?
            .ok_or_else(|| StoreError::Corrupt(format!("post {} vanished after insert", id)))
    }

    /// All posts, newest first
    pub fn list_all(&self) -> Result<Vec<Post>, StoreError> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!("{} {}", POST_SELECT, NEWEST_FIRST))?;
        let posts = stmt
            .query_map([], Self::row_to_post)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(posts)
    }

    pub fn list_by_author(&self, author_id: &str) -> Result<Vec<Post>, StoreError> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "{} WHERE p.author_id = ?1 {}",
            POST_SELECT, NEWEST_FIRST
        ))?;
        let posts = stmt
            .query_map([author_id], Self::row_to_post)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(posts)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<Post>, StoreError> {
        let conn = self.db.conn();
        let post = conn
            .query_row(
                &format!("{} WHERE p.id = ?1", POST_SELECT),
                [id],
                Self::row_to_post,
            )
            .optional()?;
        Ok(post)
    }

    /// Apply the supplied fields; returns the updated post, or None if absent
    pub fn update(&self, id: &str, changes: &UpdatePostRequest) -> Result<Option<Post>, StoreError> {
        let updated = self.db.conn().execute(
            "UPDATE posts SET
                title = COALESCE(?2, title),
                content = COALESCE(?3, content),
                is_paid = COALESCE(?4, is_paid)
             WHERE id = ?1",
            params![
                id,
                changes.title,
                changes.content,
                changes.is_paid_content.map(i64::from)
            ],
        )?;

        if updated == 0 {
            return Ok(None);
        }
        self.find_by_id(id)
    }

    /// Returns false when no post has this id
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let deleted = self
            .db
            .conn()
            .execute("DELETE FROM posts WHERE id = ?1", [id])?;
        if deleted > 0 {
            info!("🗑️ Post {} deleted", id);
        }
        Ok(deleted > 0)
    }

    pub fn count_by_author(&self, author_id: &str) -> Result<u64, StoreError> {
        let count: i64 = self.db.conn().query_row(
            "SELECT COUNT(*) FROM posts WHERE author_id = ?1",
            [author_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

/// Email local part, or a stable placeholder when the author row is gone
fn author_display_name(email: Option<&str>, author_id: &str) -> String {
    match email.and_then(|e| e.split('@').next()).filter(|s| !s.is_empty()) {
        Some(name) => name.to_string(),
        None => format!("Creator_{}", author_id.chars().take(8).collect::<String>()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;
    use crate::auth::user_store::{CredentialStore, UserStore};

    fn setup() -> (PostStore, String) {
        let db = Database::in_memory().unwrap();
        let users = UserStore::new(db.clone());
        let author = users
            .insert_user("writer@example.com", "hash", Role::Creator)
            .unwrap();
        (PostStore::new(db), author.id)
    }

    #[test]
    fn test_create_and_find() {
        let (posts, author) = setup();
        let post = posts.create(&author, "Title", "Body", true).unwrap();

        assert_eq!(post.title, "Title");
        assert!(post.is_paid);
        assert_eq!(post.author_username, "writer");

        let found = posts.find_by_id(&post.id).unwrap().unwrap();
        assert_eq!(found, post);
        assert!(posts.find_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_list_newest_first() {
        let (posts, author) = setup();
        let first = posts.create(&author, "first", "a", false).unwrap();
        let second = posts.create(&author, "second", "b", false).unwrap();

        let all = posts.list_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
    }

    #[test]
    fn test_partial_update() {
        let (posts, author) = setup();
        let post = posts.create(&author, "Title", "Body", false).unwrap();

        let changes = UpdatePostRequest {
            is_paid_content: Some(true),
            ..Default::default()
        };
        let updated = posts.update(&post.id, &changes).unwrap().unwrap();
        assert_eq!(updated.title, "Title");
        assert_eq!(updated.content, "Body");
        assert!(updated.is_paid);

        assert!(posts.update("missing", &changes).unwrap().is_none());
    }

    #[test]
    fn test_delete_and_count() {
        let (posts, author) = setup();
        let post = posts.create(&author, "Title", "Body", false).unwrap();
        posts.create(&author, "Other", "Body", false).unwrap();

        assert_eq!(posts.count_by_author(&author).unwrap(), 2);
        assert!(posts.delete(&post.id).unwrap());
        assert!(!posts.delete(&post.id).unwrap());
        assert_eq!(posts.count_by_author(&author).unwrap(), 1);
        assert_eq!(posts.list_by_author(&author).unwrap().len(), 1);
    }

    #[test]
    fn test_author_display_name_fallback() {
        assert_eq!(
            author_display_name(Some("bob@example.com"), "x"),
            "bob"
        );
        assert_eq!(
            author_display_name(None, "0123456789abcdef"),
            "Creator_01234567"
        );
    }
}
