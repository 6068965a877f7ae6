//! Room Registry (§2, §4.5): maps room id to runtime, created lazily on
//! first join and torn down when empty or the match has ended.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tracing::debug;
use usion_types::RoomId;

use crate::config::RoomConfig;
use crate::room::Room;
use usion_webhook::WebhookConfig;

pub struct RoomRegistry {
    rooms: DashMap<RoomId, Arc<Room>>,
    config: RoomConfig,
    webhook_config: WebhookConfig,
    http_client: reqwest::Client,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig, webhook_config: WebhookConfig) -> Arc<Self> {
        Arc::new(Self {
            rooms: DashMap::new(),
            config,
            webhook_config,
            http_client: reqwest::Client::new(),
        })
    }

    /// Looks up a room, creating it if this is the first join for `room_id`.
    pub fn get_or_create(self: &Arc<Self>, room_id: &RoomId) -> Arc<Room> {
        if let Some(room) = self.rooms.get(room_id) {
            return Arc::clone(&room);
        }
        let room = Arc::new(Room::new(
            room_id.clone(),
            self.config.clone(),
            self.webhook_config.clone(),
            self.http_client.clone(),
            Arc::downgrade(self) as Weak<RoomRegistry>,
        ));
        self.rooms.entry(room_id.clone()).or_insert_with(|| room).clone()
    }

    pub fn get(&self, room_id: &RoomId) -> Option<Arc<Room>> {
        self.rooms.get(room_id).map(|r| Arc::clone(&r))
    }

    /// Removes `room_id` if the room has no sessions left. Safe to call
    /// speculatively after any operation that might have emptied a room.
    pub fn prune(&self, room_id: &RoomId) {
        let should_remove = self.rooms.get(room_id).map(|r| r.should_teardown()).unwrap_or(false);
        if should_remove {
            self.rooms.remove(room_id);
            debug!(room_id = %room_id, "room deregistered");
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }
}
