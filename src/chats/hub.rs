//! Per-room fan-out of server events to connection delivery queues.
//!
//! `broadcast` distributes to every subscriber of a room while holding the
//! hub lock, so all subscribers observe the same relative order for that
//! room. Subscriptions are RAII guards: dropping one detaches the queue,
//! which covers abrupt disconnects as well as explicit leaves.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::chats::events::ServerEvent;
use crate::chats::queue::DeliveryQueue;

#[derive(Debug, Clone, Default)]
pub struct RoomHub {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    rooms: HashMap<String, Vec<Subscriber>>,
}

#[derive(Debug)]
struct Subscriber {
    id: u64,
    queue: Arc<DeliveryQueue<ServerEvent>>,
}

/// Detaches its queue from the room on drop.
#[derive(Debug)]
pub struct RoomSubscription {
    hub: RoomHub,
    room_id: String,
    id: u64,
}

impl Drop for RoomSubscription {
    fn drop(&mut self) {
        self.hub.detach(&self.room_id, self.id);
    }
}

impl RoomHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        room_id: &str,
        queue: Arc<DeliveryQueue<ServerEvent>>,
    ) -> RoomSubscription {
        let id = {
            let mut inner = self.inner.lock().unwrap();
            inner.next_id += 1;
            let id = inner.next_id;
            inner
                .rooms
                .entry(room_id.to_owned())
                .or_default()
                .push(Subscriber { id, queue });
            id
        };
        debug!(room_id, "room subscription attached");
        RoomSubscription {
            hub: self.clone(),
            room_id: room_id.to_owned(),
            id,
        }
    }

    /// Enqueues the event to every live subscriber of the room and returns
    /// how many received it. Closed queues are pruned on the way.
    pub fn broadcast(&self, room_id: &str, event: &ServerEvent) -> usize {
        let mut inner = self.inner.lock().unwrap();
        let Some(subscribers) = inner.rooms.get_mut(room_id) else {
            return 0;
        };

        subscribers.retain(|subscriber| !subscriber.queue.is_closed());
        for subscriber in subscribers.iter() {
            subscriber.queue.enqueue(event.clone());
        }
        let delivered = subscribers.len();

        if subscribers.is_empty() {
            inner.rooms.remove(room_id);
        }
        delivered
    }

    pub fn subscriber_count(&self, room_id: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .rooms
            .get(room_id)
            .map_or(0, Vec::len)
    }

    fn detach(&self, room_id: &str, id: u64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(subscribers) = inner.rooms.get_mut(room_id) {
            subscribers.retain(|subscriber| subscriber.id != id);
            if subscribers.is_empty() {
                inner.rooms.remove(room_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chats::events::OutboundMessage;

    fn message(body: &str) -> ServerEvent {
        ServerEvent::Message(OutboundMessage {
            message: body.to_owned(),
            room_id: "r1".to_owned(),
            sender_id: "u1".to_owned(),
            created_at: 0,
            file: None,
            reply_to: None,
        })
    }

    fn drain(queue: &DeliveryQueue<ServerEvent>) -> Vec<ServerEvent> {
        std::iter::from_fn(|| queue.try_dequeue()).collect()
    }

    #[test]
    fn all_subscribers_see_the_same_order() {
        let hub = RoomHub::new();
        let a = Arc::new(DeliveryQueue::new(16));
        let b = Arc::new(DeliveryQueue::new(16));
        let _sub_a = hub.subscribe("r1", a.clone());
        let _sub_b = hub.subscribe("r1", b.clone());

        for body in ["one", "two", "three"] {
            assert_eq!(hub.broadcast("r1", &message(body)), 2);
        }

        assert_eq!(drain(&a), drain(&b));
        assert_eq!(a.len(), 0);
    }

    #[test]
    fn rooms_are_isolated() {
        let hub = RoomHub::new();
        let a = Arc::new(DeliveryQueue::new(16));
        let b = Arc::new(DeliveryQueue::new(16));
        let _sub_a = hub.subscribe("r1", a.clone());
        let _sub_b = hub.subscribe("r2", b.clone());

        hub.broadcast("r1", &message("hello"));

        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
    }

    #[test]
    fn dropping_a_subscription_detaches_it() {
        let hub = RoomHub::new();
        let queue = Arc::new(DeliveryQueue::new(16));
        let subscription = hub.subscribe("r1", queue.clone());
        assert_eq!(hub.subscriber_count("r1"), 1);

        drop(subscription);
        assert_eq!(hub.subscriber_count("r1"), 0);
        assert_eq!(hub.broadcast("r1", &message("late")), 0);
    }

    #[test]
    fn closed_queues_are_pruned_on_broadcast() {
        let hub = RoomHub::new();
        let queue = Arc::new(DeliveryQueue::new(16));
        let _subscription = hub.subscribe("r1", queue.clone());

        queue.close();
        assert_eq!(hub.broadcast("r1", &message("gone")), 0);
        assert_eq!(hub.subscriber_count("r1"), 0);
    }
}
