use axum::extract::{Path, Query, State};
use axum::debug_handler;
use serde::Deserialize;

use crate::appresult::AppResult;
use crate::auth::Principal;
use crate::chats::store::{Message, MessageStore};
use crate::reply::ApiReply;

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// `GET /chats/{room_id}?page&limit`: room history, newest first.
/// Negative or zero paging values are clamped to 1; defaults are page 1,
/// ten messages per page.
#[debug_handler(state = crate::AppState)]
pub async fn room_chats(
    _principal: Principal,
    Path(room_id): Path<String>,
    Query(HistoryQuery { page, limit }): Query<HistoryQuery>,
    State(store): State<MessageStore>,
) -> AppResult<ApiReply<Vec<Message>>> {
    let page = page.unwrap_or(1).abs().max(1);
    let limit = limit.unwrap_or(10).abs().max(1);

    let chats = store.page(&room_id, page, limit).await?;
    Ok(ApiReply::ok(200, "Chats retrieved successfully", chats))
}
