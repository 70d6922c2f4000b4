mod events;
mod history;
mod hub;
mod presence;
mod queue;
mod store;
mod unread;
mod ws;

use axum::{Router, routing::get};

use crate::AppState;

pub use events::{
    ClientEvent, InboundMessage, JoinRoom, JoinUserData, LeaveRoom, LeaveUserData,
    OutboundMessage, ServerEvent,
};
pub use history::{HistoryQuery, room_chats};
pub use hub::{RoomHub, RoomSubscription};
pub use presence::{Participant, Presence};
pub use queue::DeliveryQueue;
pub use store::{Message, MessageStore, RETENTION_MS, ReplyRef, spawn_retention_sweeper};
pub use unread::UnreadCoordinator;
pub use ws::{Session, chat_ws};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::chat_ws))
        .route("/{room_id}", get(history::room_chats))
}
