//! In-process backend: owns the sqlite store and the notification channel,
//! and serves the client sync layer through [`RemoteStore`].

use anyhow::Result;
use async_trait::async_trait;
use client_core::RemoteStore;
use shared::{
    domain::{PathId, WaypointId},
    protocol::{
        AddPathWaypointRequest, DeletePathWaypointRequest, Notification, UpdateWaypointPayload,
        Waypoint,
    },
};
use storage::Storage;
use tokio::sync::broadcast;

pub mod commands;

pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct LocalBackend {
    storage: Storage,
    events: broadcast::Sender<Notification>,
}

impl LocalBackend {
    pub fn new(storage: Storage, notification_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(notification_capacity.max(1));
        Self { storage, events }
    }

    pub async fn open(database_url: &str, notification_capacity: usize) -> Result<Self> {
        let storage = Storage::new(database_url).await?;
        Ok(Self::new(storage, notification_capacity))
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

#[async_trait]
impl RemoteStore for LocalBackend {
    async fn get_waypoint(&self, id: WaypointId) -> Result<Waypoint> {
        Ok(commands::get_waypoint(&self.storage, id).await?)
    }

    async fn update_waypoint(&self, payload: UpdateWaypointPayload) -> Result<()> {
        Ok(commands::update_waypoint(&self.storage, &self.events, payload).await?)
    }

    async fn add_path_waypoint(&self, request: AddPathWaypointRequest) -> Result<Waypoint> {
        Ok(commands::add_path_waypoint(&self.storage, &self.events, request).await?)
    }

    async fn get_path_waypoints(&self, path_id: PathId) -> Result<Vec<Waypoint>> {
        Ok(commands::get_path_waypoints(&self.storage, path_id).await?)
    }

    async fn delete_path_waypoint(&self, request: DeletePathWaypointRequest) -> Result<()> {
        Ok(commands::delete_path_waypoint(&self.storage, &self.events, request).await?)
    }

    fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }
}
