use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

use crate::config::Config;

pub async fn connect(config: &Config) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Creates the schema if it does not exist yet. Messages are append-only:
/// nothing updates or deletes them except the retention sweeper.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            is_online INTEGER NOT NULL DEFAULT 0,
            last_seen INTEGER,
            unread_messages INTEGER NOT NULL DEFAULT 0
        )",
        "CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            room_id TEXT NOT NULL,
            sender_id TEXT NOT NULL,
            message TEXT NOT NULL,
            file TEXT,
            reply_to_id TEXT,
            reply_to_message TEXT,
            reply_to_sender_id TEXT,
            created_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_messages_room_created
            ON messages (room_id, created_at DESC)",
        "CREATE INDEX IF NOT EXISTS idx_messages_expires
            ON messages (expires_at)",
        "CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            expires_at INTEGER NOT NULL
        )",
    ];

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_is_idempotent() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_schema(&pool).await.unwrap();
        init_schema(&pool).await.unwrap();

        sqlx::query("INSERT INTO users (id,first_name,last_name,email) VALUES ('u1','A','B','a@b.c')")
            .execute(&pool)
            .await
            .unwrap();
        let (unread,): (i64,) = sqlx::query_as("SELECT unread_messages FROM users WHERE id='u1'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(unread, 0);
    }
}
