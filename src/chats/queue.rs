//! Ordered delivery buffer between message acceptance and socket writes.
//!
//! One queue per connection. Producers enqueue synchronously (the room
//! fan-out holds a lock while it distributes, which is what defines the
//! per-room delivery order); the connection's writer task drains
//! asynchronously. The buffer is bounded: a consumer that falls behind
//! loses its oldest undelivered items and the loss is counted, so a stalled
//! socket can never wedge producers.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::Notify;

#[derive(Debug)]
pub struct DeliveryQueue<T> {
    state: Mutex<State<T>>,
    notify: Notify,
    capacity: usize,
}

#[derive(Debug)]
struct State<T> {
    items: VecDeque<T>,
    dropped: u64,
    closed: bool,
}

impl<T> DeliveryQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                dropped: 0,
                closed: false,
            }),
            notify: Notify::new(),
            capacity: capacity.max(1),
        }
    }

    /// Appends to the tail and returns the new length. Never blocks; once
    /// the queue is full the oldest item is evicted and counted as dropped.
    /// Enqueueing after close is a no-op.
    pub fn enqueue(&self, item: T) -> usize {
        let len = {
            let mut state = self.state.lock().unwrap();
            if state.closed {
                return state.items.len();
            }
            if state.items.len() == self.capacity {
                state.items.pop_front();
                state.dropped += 1;
            }
            state.items.push_back(item);
            state.items.len()
        };
        self.notify.notify_one();
        len
    }

    /// Removes and returns the head. `None` means the queue is empty right
    /// now, which is an ordinary condition, not a failure.
    pub fn try_dequeue(&self) -> Option<T> {
        self.state.lock().unwrap().items.pop_front()
    }

    /// Waits for the next item. Returns `None` only once the queue has been
    /// closed and fully drained.
    pub async fn dequeue(&self) -> Option<T> {
        loop {
            {
                let mut state = self.state.lock().unwrap();
                if let Some(item) = state.items.pop_front() {
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    pub fn close(&self) {
        self.state.lock().unwrap().closed = true;
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of items lost to overflow since the last call.
    pub fn take_dropped(&self) -> u64 {
        let mut state = self.state.lock().unwrap();
        std::mem::take(&mut state.dropped)
    }
}
