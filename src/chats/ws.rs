//! The room session protocol over a WebSocket.
//!
//! One task reads client frames, one drains the connection's delivery
//! queue into the socket. The transport is fire-and-forget: malformed or
//! failing events are logged and dropped, never answered, because there is
//! no response path for them. Disconnect is an implicit leave: presence
//! and the room subscription are torn down by `cleanup` whether or not a
//! `leaveRoom` frame ever arrived.

use std::sync::Arc;

use axum::debug_handler;
use axum::extract::ws::{Message as WsFrame, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::AppState;
use crate::chats::events::{
    ClientEvent, InboundMessage, JoinRoom, LeaveRoom, OutboundMessage, ServerEvent,
};
use crate::chats::hub::RoomSubscription;
use crate::chats::presence::Participant;
use crate::chats::queue::DeliveryQueue;
use crate::users::OnlineStatus;

#[debug_handler(state = crate::AppState)]
pub async fn chat_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_session(state, socket))
}

async fn run_session(state: AppState, socket: WebSocket) {
    let queue = Arc::new(DeliveryQueue::new(state.config.delivery_queue_capacity));
    let mut session = Session::new(state, queue.clone());

    let (mut sender, mut receiver) = socket.split();

    session.queue.enqueue(ServerEvent::Connected);

    let writer_queue = queue.clone();
    let mut writer_task = tokio::spawn(async move {
        while let Some(event) = writer_queue.dequeue().await {
            let dropped = writer_queue.take_dropped();
            if dropped > 0 {
                warn!(dropped, "slow consumer, delivery queue overflowed");
            }
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if sender.send(text.into()).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = receiver.next().await {
        match frame {
            WsFrame::Text(text) => {
                let event = match serde_json::from_str::<ClientEvent>(text.as_str()) {
                    Ok(event) => event,
                    Err(error) => {
                        debug!(error = %error, "dropping malformed client event");
                        continue;
                    }
                };
                session.handle(event).await;
            }
            WsFrame::Close(_) => break,
            _ => {}
        }
    }

    session.cleanup().await;
    writer_task.abort();
    let _ = (&mut writer_task).await;
}

struct JoinedRoom {
    room_id: String,
    user_id: String,
}

/// Per-connection protocol state. Public so the engine can be driven over
/// transports other than a raw WebSocket (and from tests).
pub struct Session {
    state: AppState,
    queue: Arc<DeliveryQueue<ServerEvent>>,
    subscription: Option<RoomSubscription>,
    joined: Option<JoinedRoom>,
}

impl Session {
    pub fn new(state: AppState, queue: Arc<DeliveryQueue<ServerEvent>>) -> Self {
        Self {
            state,
            queue,
            subscription: None,
            joined: None,
        }
    }

    pub async fn handle(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::JoinRoom(join) => self.handle_join(join).await,
            ClientEvent::LeaveRoom(leave) => self.handle_leave(leave).await,
            ClientEvent::Message(message) => self.handle_message(message).await,
        }
    }

    async fn handle_join(&mut self, JoinRoom { room_id, user_data }: JoinRoom) {
        if room_id.trim().is_empty()
            || user_data.name.trim().is_empty()
            || user_data.email.trim().is_empty()
            || user_data.user_id.trim().is_empty()
        {
            debug!("dropping malformed joinRoom payload");
            return;
        }

        let participant = self.state.presence.join(Participant {
            name: user_data.name,
            room_id: room_id.clone(),
            email: user_data.email,
            user_id: user_data.user_id,
        });

        // a second join moves the subscription to the new room
        drop(self.subscription.take());
        self.subscription = Some(
            self.state
                .hub
                .subscribe(&participant.room_id, self.queue.clone()),
        );
        self.joined = Some(JoinedRoom {
            room_id: room_id.clone(),
            user_id: participant.user_id.clone(),
        });

        if participant.user_id != room_id {
            // staff joined the owner's room: whatever was pending is now seen
            self.state.unread.clear(&room_id).await;
        } else if let Err(error) = self
            .state
            .directory
            .set_online_status(&room_id, OnlineStatus::Online)
            .await
        {
            warn!(error = %error, room_id = %room_id, "failed to mark owner online");
        }
    }

    async fn handle_message(&mut self, message: InboundMessage) {
        // whitespace-only submissions are a deliberate silent no-op
        if message.message.trim().is_empty() && message.file.is_none() {
            return;
        }

        let stored = match self
            .state
            .store
            .append(
                &message.room_id,
                &message.sender_id,
                &message.message,
                message.file,
                message.reply_to,
            )
            .await
        {
            Ok(stored) => stored,
            Err(error) => {
                warn!(error = %error, room_id = %message.room_id, "failed to persist message");
                return;
            }
        };

        self.state.hub.broadcast(
            &stored.room_id,
            &ServerEvent::Message(OutboundMessage::from(&stored)),
        );

        if stored.sender_id == stored.room_id {
            // the owner messaging their own room: if nobody else is there to
            // see it live, it counts as unread. The sender is the single
            // effective participant, whether or not their own presence entry
            // made it into the registry.
            let others = self
                .state
                .presence
                .members_of(&stored.room_id)
                .iter()
                .filter(|member| member.user_id != stored.sender_id)
                .count();
            if others == 0 {
                self.state.unread.increment(&stored.sender_id).await;
            }
        }
    }

    async fn handle_leave(&mut self, LeaveRoom { room_id, user_data }: LeaveRoom) {
        self.state.presence.leave(&user_data.user_id);
        drop(self.subscription.take());
        self.joined = None;

        if user_data.user_id == room_id {
            if let Err(error) = self
                .state
                .directory
                .set_online_status(&user_data.user_id, OnlineStatus::Offline)
                .await
            {
                warn!(error = %error, user_id = %user_data.user_id, "failed to mark owner offline");
            }
        }
    }

    /// Implicit leave on disconnect.
    pub async fn cleanup(&mut self) {
        if let Some(JoinedRoom { room_id, user_id }) = self.joined.take() {
            self.handle_leave(LeaveRoom {
                room_id,
                user_data: crate::chats::events::LeaveUserData { user_id },
            })
            .await;
        }
        drop(self.subscription.take());
        self.queue.close();
    }
}
