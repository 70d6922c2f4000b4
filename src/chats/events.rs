//! Wire protocol for the persistent connection.
//!
//! Frames are JSON objects of the shape `{"event": ..., "data": ...}`.
//! There is no reply channel: a frame that fails to parse or validate is
//! logged and dropped by the gateway.

use serde::{Deserialize, Serialize};

use crate::chats::store::{Message, ReplyRef};
use crate::clock;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "joinRoom")]
    JoinRoom(JoinRoom),
    #[serde(rename = "leaveRoom")]
    LeaveRoom(LeaveRoom),
    #[serde(rename = "message")]
    Message(InboundMessage),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    pub room_id: String,
    pub user_data: JoinUserData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinUserData {
    pub name: String,
    pub email: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRoom {
    pub room_id: String,
    pub user_data: LeaveUserData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveUserData {
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    pub message: String,
    pub room_id: String,
    pub sender_id: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub reply_to: Option<ReplyRef>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "connected")]
    Connected,
    #[serde(rename = "message")]
    Message(OutboundMessage),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub message: String,
    pub room_id: String,
    pub sender_id: String,
    #[serde(serialize_with = "clock::serialize_rfc3339")]
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyRef>,
}

impl From<&Message> for OutboundMessage {
    fn from(message: &Message) -> Self {
        Self {
            message: message.message.clone(),
            room_id: message.room_id.clone(),
            sender_id: message.sender_id.clone(),
            created_at: message.created_at,
            file: message.file.clone(),
            reply_to: message.reply_to.clone(),
        }
    }
}
