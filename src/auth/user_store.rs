//! User Storage
//! Mission: Persist user accounts in SQLite behind the credential-store contract

use crate::auth::models::{Role, SubscriptionStatus, User};
use crate::db::{Database, StoreError};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::info;
use uuid::Uuid;

/// Everything the auth core needs from persistence.
pub trait CredentialStore: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new user with `free` subscription status. Fails with
    /// `StoreError::EmailTaken` if the email is already present.
    fn insert_user(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, StoreError>;

    fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Returns false when no user has this id.
    fn update_subscription_status(
        &self,
        id: &str,
        status: SubscriptionStatus,
    ) -> Result<bool, StoreError>;
}

const USER_COLUMNS: &str = "id, email, password_hash, role, subscription_status, created_at";

/// User storage with SQLite backend
#[derive(Clone)]
pub struct UserStore {
    db: Database,
}

impl UserStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_user(row: &Row<'_>) -> rusqlite::Result<(User, String, String)> {
        let role: String = row.get(3)?;
        let status: String = row.get(4)?;
        Ok((
            User {
                id: row.get(0)?,
                email: row.get(1)?,
                password_hash: row.get(2)?,
                role: Role::Subscriber,
                subscription_status: SubscriptionStatus::Free,
                created_at: row.get(5)?,
            },
            role,
            status,
        ))
    }

    /// Enum columns are validated outside the rusqlite closure so that a bad
    /// value surfaces as `StoreError::Corrupt` instead of being papered over.
    fn finish_user(raw: (User, String, String)) -> Result<User, StoreError> {
        let (mut user, role, status) = raw;
        user.role = Role::from_str(&role)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown role '{}'", role)))?;
        user.subscription_status = SubscriptionStatus::from_str(&status).ok_or_else(|| {
            StoreError::Corrupt(format!("unknown subscription status '{}'", status))
        })?;
        Ok(user)
    }

    fn find_one(&self, column: &str, value: &str) -> Result<Option<User>, StoreError> {
        let conn = self.db.conn();
        let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
        let raw = conn
            .query_row(&sql, params![value], Self::row_to_user)
            .optional()?;
        raw.map(Self::finish_user).transpose()
    }

    /// Paid subscribers, newest first.
    pub fn list_paid_subscribers(&self) -> Result<Vec<User>, StoreError> {
        let conn = self.db.conn();
        let sql = format!(
            "SELECT {} FROM users WHERE role = ?1 AND subscription_status = ?2
             ORDER BY created_at DESC",
            USER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![Role::Subscriber.as_str(), SubscriptionStatus::Paid.as_str()],
                Self::row_to_user,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::finish_user).collect()
    }

    /// (total subscribers, paid subscribers)
    pub fn subscriber_counts(&self) -> Result<(u64, u64), StoreError> {
        let conn = self.db.conn();
        let (total, paid): (i64, i64) = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN subscription_status = ?2 THEN 1 ELSE 0 END), 0)
             FROM users WHERE role = ?1",
            params![Role::Subscriber.as_str(), SubscriptionStatus::Paid.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((total.max(0) as u64, paid.max(0) as u64))
    }
}

impl CredentialStore for UserStore {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.find_one("email", email)
    }

    fn insert_user(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, StoreError> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            subscription_status: SubscriptionStatus::Free,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        };

        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO users (id, email, password_hash, role, subscription_status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id,
                user.email,
                user.password_hash,
                user.role.as_str(),
                user.subscription_status.as_str(),
                user.created_at,
            ],
        )
        .map_err(StoreError::from_insert)?;

        info!("✅ Created user: {} ({})", user.email, user.role.as_str());

        Ok(user)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.find_one("id", id)
    }

    fn update_subscription_status(
        &self,
        id: &str,
        status: SubscriptionStatus,
    ) -> Result<bool, StoreError> {
        let conn = self.db.conn();
        let rows_affected = conn.execute(
            "UPDATE users SET subscription_status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;

        if rows_affected > 0 {
            info!("💳 Subscription status of {} set to {}", id, status.as_str());
        }

        Ok(rows_affected > 0)
    }
}
