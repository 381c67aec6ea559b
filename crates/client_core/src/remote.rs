use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{PathId, WaypointId},
    protocol::{
        AddPathWaypointRequest, DeletePathWaypointRequest, Notification, UpdateWaypointPayload,
        Waypoint,
    },
};
use tokio::sync::broadcast;

/// Command/notification boundary to the process that owns waypoint and path
/// state.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get_waypoint(&self, id: WaypointId) -> Result<Waypoint>;
    async fn update_waypoint(&self, payload: UpdateWaypointPayload) -> Result<()>;
    /// The backend assigns the id of the returned waypoint.
    async fn add_path_waypoint(&self, request: AddPathWaypointRequest) -> Result<Waypoint>;
    async fn get_path_waypoints(&self, path_id: PathId) -> Result<Vec<Waypoint>>;
    async fn delete_path_waypoint(&self, request: DeletePathWaypointRequest) -> Result<()>;
    /// Global fan-out channel. Every receiver sees every notification and
    /// filters by id itself.
    fn subscribe_notifications(&self) -> broadcast::Receiver<Notification>;
}

pub struct MissingRemoteStore;

#[async_trait]
impl RemoteStore for MissingRemoteStore {
    async fn get_waypoint(&self, id: WaypointId) -> Result<Waypoint> {
        Err(anyhow!("remote store unavailable; cannot fetch waypoint {id}"))
    }

    async fn update_waypoint(&self, payload: UpdateWaypointPayload) -> Result<()> {
        Err(anyhow!(
            "remote store unavailable; cannot update waypoint {}",
            payload.id
        ))
    }

    async fn add_path_waypoint(&self, request: AddPathWaypointRequest) -> Result<Waypoint> {
        Err(anyhow!(
            "remote store unavailable; cannot add waypoint to path {}",
            request.id
        ))
    }

    async fn get_path_waypoints(&self, path_id: PathId) -> Result<Vec<Waypoint>> {
        Err(anyhow!(
            "remote store unavailable; cannot fetch path {path_id}"
        ))
    }

    async fn delete_path_waypoint(&self, request: DeletePathWaypointRequest) -> Result<()> {
        Err(anyhow!(
            "remote store unavailable; cannot delete waypoint {} from path {}",
            request.wpt_id,
            request.path_id
        ))
    }

    fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        let (_, rx) = broadcast::channel(1);
        rx
    }
}
