//! Durable, append-only log of chat messages per room.
//!
//! Messages are immutable once appended; the only thing that ever removes
//! them is the retention sweeper, after a fixed seven-day window. Reads
//! filter expired rows as well, so a message past its window is invisible
//! even before the next sweep runs. Retention is policy, not API: nothing
//! here is exposed as a delete operation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::appresult::{AppError, AppResult};
use crate::clock;

/// Messages are kept for seven days after creation.
pub const RETENTION_MS: i64 = 7 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRef {
    pub reply_to_id: String,
    pub reply_to_message: String,
    pub reply_to_sender_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub room_id: String,
    pub sender_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyRef>,
    #[serde(serialize_with = "clock::serialize_rfc3339")]
    pub created_at: i64,
    #[serde(serialize_with = "clock::serialize_rfc3339")]
    pub expires_at: i64,
}

type MessageRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    i64,
    i64,
);

#[derive(Debug, Clone)]
pub struct MessageStore {
    pool: SqlitePool,
}

impl MessageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends one message. A body that trims to empty is only accepted
    /// when a file reference accompanies it.
    pub async fn append(
        &self,
        room_id: &str,
        sender_id: &str,
        body: &str,
        file: Option<String>,
        reply_to: Option<ReplyRef>,
    ) -> AppResult<Message> {
        if body.trim().is_empty() && file.is_none() {
            return Err(AppError::Validation(
                "message body or file is required".to_owned(),
            ));
        }

        let id = Uuid::now_v7();
        let created_at = clock::now_ms();
        let expires_at = created_at + RETENTION_MS;

        sqlx::query(
            "INSERT INTO messages
                (id,room_id,sender_id,message,file,reply_to_id,reply_to_message,reply_to_sender_id,created_at,expires_at)
             VALUES (?,?,?,?,?,?,?,?,?,?)",
        )
        .bind(id.to_string())
        .bind(room_id)
        .bind(sender_id)
        .bind(body)
        .bind(file.clone())
        .bind(reply_to.as_ref().map(|r| r.reply_to_id.clone()))
        .bind(reply_to.as_ref().map(|r| r.reply_to_message.clone()))
        .bind(reply_to.as_ref().map(|r| r.reply_to_sender_id.clone()))
        .bind(created_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(Message {
            id,
            room_id: room_id.to_owned(),
            sender_id: sender_id.to_owned(),
            message: body.to_owned(),
            file,
            reply_to,
            created_at,
            expires_at,
        })
    }

    /// Returns the `page`-th slice of a room's history, newest first.
    /// Pages beyond the end are empty, never an error; expired messages
    /// are never returned.
    pub async fn page(&self, room_id: &str, page: i64, limit: i64) -> AppResult<Vec<Message>> {
        let page = page.max(1);
        let limit = limit.max(1);
        let offset = (page - 1) * limit;

        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id,room_id,sender_id,message,file,reply_to_id,reply_to_message,reply_to_sender_id,created_at,expires_at
             FROM messages
             WHERE room_id=? AND expires_at>?
             ORDER BY created_at DESC, id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(room_id)
        .bind(clock::now_ms())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_message).collect()
    }

    /// Deletes rows past their expiry; returns how many went.
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM messages WHERE expires_at<=?")
            .bind(clock::now_ms())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Periodically removes expired messages for as long as the server runs.
pub fn spawn_retention_sweeper(store: MessageStore, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match store.sweep_expired().await {
                Ok(0) => {}
                Ok(deleted) => debug!(deleted, "swept expired messages"),
                Err(error) => warn!(error = %error, "retention sweep failed"),
            }
        }
    })
}

fn row_to_message(row: MessageRow) -> AppResult<Message> {
    let (
        id,
        room_id,
        sender_id,
        message,
        file,
        reply_to_id,
        reply_to_message,
        reply_to_sender_id,
        created_at,
        expires_at,
    ) = row;

    let reply_to = reply_to_id.map(|reply_to_id| ReplyRef {
        reply_to_id,
        reply_to_message: reply_to_message.unwrap_or_default(),
        reply_to_sender_id: reply_to_sender_id.unwrap_or_default(),
    });

    Ok(Message {
        id: Uuid::parse_str(&id).map_err(anyhow::Error::from)?,
        room_id,
        sender_id,
        message,
        file,
        reply_to,
        created_at,
        expires_at,
    })
}
