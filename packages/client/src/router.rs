//! Relay event router.
//!
//! Fans the server's event stream out per room. A call controller subscribes
//! to its room for the lifetime of the call; events for rooms nobody is
//! subscribed to (a new incoming call, chat outside a call) go to the
//! session's fallback channel.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicU64, Ordering},
    },
};

use swaphere_server::{domain::RoomId, infrastructure::dto::websocket::ServerEvent};
use tokio::sync::mpsc;

struct Subscriber {
    id: u64,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

type Rooms = Arc<Mutex<HashMap<RoomId, Subscriber>>>;

fn lock(rooms: &Rooms) -> MutexGuard<'_, HashMap<RoomId, Subscriber>> {
    rooms.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone)]
pub struct EventRouter {
    rooms: Rooms,
    next_id: Arc<AtomicU64>,
    fallback: mpsc::UnboundedSender<ServerEvent>,
}

impl EventRouter {
    /// Creates a router and the receiver for unsubscribed events.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (fallback, fallback_rx) = mpsc::unbounded_channel();
        let router = Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(0)),
            fallback,
        };
        (router, fallback_rx)
    }

    /// Subscribes to `room_id`, replacing any earlier subscriber of that room.
    pub fn subscribe(&self, room_id: RoomId) -> RoomSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        lock(&self.rooms).insert(room_id.clone(), Subscriber { id, sender });
        RoomSubscription {
            id,
            room_id,
            receiver,
            rooms: self.rooms.clone(),
        }
    }

    /// Delivers an event to its room's subscriber, or to the fallback channel.
    pub fn route(&self, event: ServerEvent) {
        let event = match RoomId::parse(event.room_id()) {
            Ok(room_id) => {
                let rooms = lock(&self.rooms);
                match rooms.get(&room_id) {
                    Some(subscriber) => match subscriber.sender.send(event) {
                        Ok(()) => return,
                        Err(mpsc::error::SendError(event)) => event,
                    },
                    None => event,
                }
            }
            Err(e) => {
                tracing::debug!("Event {} has no usable room id: {}", event.name(), e);
                event
            }
        };

        if self.fallback.send(event).is_err() {
            tracing::debug!("Session is gone, dropping event");
        }
    }

    pub fn is_subscribed(&self, room_id: &RoomId) -> bool {
        lock(&self.rooms).contains_key(room_id)
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.rooms).len()
    }
}

/// Per-room event stream. Dropping it unsubscribes.
pub struct RoomSubscription {
    id: u64,
    room_id: RoomId,
    receiver: mpsc::UnboundedReceiver<ServerEvent>,
    rooms: Rooms,
}

impl RoomSubscription {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub async fn recv(&mut self) -> Option<ServerEvent> {
        self.receiver.recv().await
    }
}

impl Drop for RoomSubscription {
    fn drop(&mut self) {
        let mut rooms = lock(&self.rooms);
        // A newer subscription of the same room stays in place.
        if rooms.get(&self.room_id).is_some_and(|s| s.id == self.id) {
            rooms.remove(&self.room_id);
        }
    }
}
