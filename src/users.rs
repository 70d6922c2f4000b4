//! External user-directory collaborator.
//!
//! The chat core does not own user records; it only reads principals and
//! flips the presence/unread attributes the gateway needs. Everything else
//! about users (registration, verification, roles) lives elsewhere.

use sqlx::SqlitePool;

use crate::clock;

#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_online: bool,
    pub last_seen: Option<i64>,
    pub unread_messages: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OnlineStatus {
    Online,
    Offline,
}

#[derive(Debug, Clone)]
pub struct UserDirectory {
    pool: SqlitePool,
}

impl UserDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, sqlx::Error> {
        let row: Option<(String, String, String, String, bool, Option<i64>, i64)> = sqlx::query_as(
            "SELECT id,first_name,last_name,email,is_online,last_seen,unread_messages
             FROM users WHERE id=?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(id, first_name, last_name, email, is_online, last_seen, unread_messages)| UserRecord {
                id,
                first_name,
                last_name,
                email,
                is_online,
                last_seen,
                unread_messages,
            },
        ))
    }

    /// Going offline also stamps `last_seen`.
    pub async fn set_online_status(
        &self,
        user_id: &str,
        status: OnlineStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = match status {
            OnlineStatus::Online => {
                sqlx::query("UPDATE users SET is_online=1 WHERE id=?")
                    .bind(user_id)
                    .execute(&self.pool)
                    .await?
            }
            OnlineStatus::Offline => {
                sqlx::query("UPDATE users SET is_online=0, last_seen=? WHERE id=?")
                    .bind(clock::now_ms())
                    .bind(user_id)
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected() > 0)
    }

    /// Atomic add at the storage layer; concurrent increments are never lost.
    pub async fn increment_unread(&self, user_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET unread_messages = unread_messages + 1 WHERE id=?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn clear_unread(&self, user_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET unread_messages = 0 WHERE id=?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn directory() -> UserDirectory {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::init_schema(&pool).await.unwrap();
        sqlx::query("INSERT INTO users (id,first_name,last_name,email) VALUES ('u1','Ada','L','ada@example.com')")
            .execute(&pool)
            .await
            .unwrap();
        UserDirectory::new(pool)
    }

    #[tokio::test]
    async fn unread_round_trip() {
        let dir = directory().await;
        assert!(dir.increment_unread("u1").await.unwrap());
        assert!(dir.increment_unread("u1").await.unwrap());
        assert_eq!(dir.find_by_id("u1").await.unwrap().unwrap().unread_messages, 2);

        assert!(dir.clear_unread("u1").await.unwrap());
        assert_eq!(dir.find_by_id("u1").await.unwrap().unwrap().unread_messages, 0);
    }

    #[tokio::test]
    async fn missing_user_reports_no_rows() {
        let dir = directory().await;
        assert!(!dir.increment_unread("ghost").await.unwrap());
        assert!(!dir.clear_unread("ghost").await.unwrap());
        assert!(dir.find_by_id("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn offline_stamps_last_seen() {
        let dir = directory().await;
        assert!(dir.set_online_status("u1", OnlineStatus::Online).await.unwrap());
        let user = dir.find_by_id("u1").await.unwrap().unwrap();
        assert!(user.is_online);
        assert!(user.last_seen.is_none());

        assert!(dir.set_online_status("u1", OnlineStatus::Offline).await.unwrap());
        let user = dir.find_by_id("u1").await.unwrap().unwrap();
        assert!(!user.is_online);
        assert!(user.last_seen.is_some());
    }
}
