//! Unread-counter updates with hot-path failure policy.
//!
//! Both operations run on the message path and must never abort delivery:
//! a missing user record or a storage hiccup is logged and swallowed.

use tracing::{debug, warn};

use crate::users::UserDirectory;

#[derive(Debug, Clone)]
pub struct UnreadCoordinator {
    directory: UserDirectory,
}

impl UnreadCoordinator {
    pub fn new(directory: UserDirectory) -> Self {
        Self { directory }
    }

    pub async fn increment(&self, user_id: &str) {
        match self.directory.increment_unread(user_id).await {
            Ok(true) => {}
            Ok(false) => debug!(user_id, "unread increment for unknown user"),
            Err(error) => warn!(user_id, error = %error, "unread increment failed"),
        }
    }

    pub async fn clear(&self, user_id: &str) {
        match self.directory.clear_unread(user_id).await {
            Ok(true) => {}
            Ok(false) => debug!(user_id, "unread clear for unknown user"),
            Err(error) => warn!(user_id, error = %error, "unread clear failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn coordinator() -> (UnreadCoordinator, UserDirectory) {
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
        let directory = UserDirectory::new(pool);
        (UnreadCoordinator::new(directory.clone()), directory)
    }

    #[tokio::test]
    async fn increments_and_clears() {
        let (unread, directory) = coordinator().await;
        unread.increment("u1").await;
        unread.increment("u1").await;
        assert_eq!(directory.find_by_id("u1").await.unwrap().unwrap().unread_messages, 2);

        unread.clear("u1").await;
        assert_eq!(directory.find_by_id("u1").await.unwrap().unwrap().unread_messages, 0);
    }

    #[tokio::test]
    async fn unknown_user_is_swallowed() {
        let (unread, _) = coordinator().await;
        // must not panic or error out of the message path
        unread.increment("ghost").await;
        unread.clear("ghost").await;
    }
}
