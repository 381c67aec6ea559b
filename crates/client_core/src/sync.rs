//! Protocol adapter between the cached stores and the remote store.

use std::sync::Arc;

use shared::{
    domain::{PathId, WaypointId},
    protocol::{
        AddPathWaypointRequest, DeletePathWaypointRequest, Notification,
        UpdatePathWaypointsPayload, UpdateWaypointPayload, Waypoint, WaypointUpdate,
    },
};
use tokio::{sync::broadcast, task::JoinHandle};
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    StreamExt,
};
use tracing::{debug, info, warn};

use crate::{
    derived::PathSummary,
    error::{PullTarget, SyncError},
    observable::{Observable, Subscription},
    outbound::{NoUndo, Outbound, OutboundQueue, UndoHook},
    path_order::PathOrder,
    registry::Registries,
    remote::RemoteStore,
    waypoint_store::WaypointStore,
    SyncEvent,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct SyncClient {
    remote: Arc<dyn RemoteStore>,
    registries: Arc<Registries>,
    outbound: Outbound,
    events: broadcast::Sender<SyncEvent>,
    active_path: Observable<PathId>,
}

/// Background tasks owned by a running `SyncClient`.
pub struct SyncTasks {
    pub writer: JoinHandle<()>,
    pub listener: JoinHandle<()>,
}

impl SyncTasks {
    pub fn abort(&self) {
        self.writer.abort();
        self.listener.abort();
    }
}

impl SyncClient {
    /// Builds a client without starting any task. The caller owns the outbound
    /// queue and decides how it is drained.
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        registries: Arc<Registries>,
        undo: Arc<dyn UndoHook>,
    ) -> (Arc<Self>, OutboundQueue) {
        let (outbound, queue) = Outbound::channel(undo);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let client = Arc::new(Self {
            remote,
            registries,
            outbound,
            events,
            active_path: Observable::new(PathId(1)),
        });
        (client, queue)
    }

    /// Builds a client and spawns its writer and notification listener.
    /// Must be called inside a tokio runtime.
    pub fn start(
        remote: Arc<dyn RemoteStore>,
        registries: Arc<Registries>,
    ) -> (Arc<Self>, SyncTasks) {
        Self::start_with_undo(remote, registries, Arc::new(NoUndo))
    }

    pub fn start_with_undo(
        remote: Arc<dyn RemoteStore>,
        registries: Arc<Registries>,
        undo: Arc<dyn UndoHook>,
    ) -> (Arc<Self>, SyncTasks) {
        let (client, queue) = Self::new(Arc::clone(&remote), registries, undo);
        let writer = queue.spawn_writer(remote, client.events.clone());
        let listener = client.spawn_notification_listener();
        (client, SyncTasks { writer, listener })
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Store for `initial.id`, created from `initial` on first reference.
    pub fn waypoint_store(&self, initial: &Waypoint) -> Arc<WaypointStore> {
        let (store, created) = self
            .registries
            .waypoints
            .materialize(initial, &self.outbound);
        if created {
            let _ = self.events.send(SyncEvent::Materialized { id: initial.id });
        }
        store
    }

    pub fn store(&self, id: WaypointId) -> Option<Arc<WaypointStore>> {
        self.registries.waypoints.get(id)
    }

    pub fn snapshot(&self, id: WaypointId) -> Option<Waypoint> {
        self.store(id).map(|store| store.snapshot())
    }

    pub async fn handle_notification(&self, notification: Notification) -> Result<(), SyncError> {
        match notification {
            Notification::UpdateWaypoint(payload) => self.apply_waypoint_update(payload).await,
            Notification::UpdatePathWaypoints(payload) => {
                self.apply_path_waypoints(payload);
                Ok(())
            }
        }
    }

    /// Applies an `update_waypoint` notification. A known id gets `set_no_push`
    /// on exactly the named cells. An unknown id triggers one pull; the store
    /// is seeded from the pulled state and the notification's own values are
    /// not applied on top of it.
    pub async fn apply_waypoint_update(
        &self,
        payload: UpdateWaypointPayload,
    ) -> Result<(), SyncError> {
        let UpdateWaypointPayload { id, update } = payload;
        if update.is_empty() {
            return Ok(());
        }

        if let Some(store) = self.store(id) {
            store.apply_update_no_push(&update);
            return Ok(());
        }

        debug!(wpt_id = id.0, "update for unknown waypoint; pulling full state");
        let waypoint = self
            .remote
            .get_waypoint(id)
            .await
            .map_err(|source| self.pull_failed(PullTarget::Waypoint(id), source))?;
        self.waypoint_store(&waypoint);
        Ok(())
    }

    /// Replaces the order of an already materialized path. Returns `false`
    /// when nothing in this process observes that path.
    pub fn apply_path_waypoints(&self, payload: UpdatePathWaypointsPayload) -> bool {
        let Some(order) = self.registries.paths.get(payload.id) else {
            return false;
        };
        let ids = self.materialize_all(&payload.order);
        if order.replace(ids) {
            debug!(
                path_id = payload.id.0,
                len = payload.order.len(),
                "path order replaced"
            );
        }
        true
    }

    /// Order store for `path_id`, pulled and hydrated on first reference.
    /// Every waypoint in the pulled payload gets a store before the order is
    /// published. Concurrent first references share one pull. On pull failure
    /// nothing is registered.
    pub async fn path_order(&self, path_id: PathId) -> Result<Arc<PathOrder>, SyncError> {
        if let Some(existing) = self.registries.paths.get(path_id) {
            return Ok(existing);
        }

        let (order, created) = self
            .registries
            .paths
            .get_or_hydrate(path_id, || async {
                let waypoints = self
                    .remote
                    .get_path_waypoints(path_id)
                    .await
                    .map_err(|source| self.pull_failed(PullTarget::Path(path_id), source))?;
                let ids = self.materialize_all(&waypoints);
                Ok::<_, SyncError>(PathOrder::new(path_id, ids))
            })
            .await?;
        if created {
            info!(
                path_id = path_id.0,
                len = order.len(),
                "hydrated path order"
            );
        }
        Ok(order)
    }

    /// Adds a waypoint to the end of a path and materializes its store from
    /// the command's response.
    pub async fn add_path_waypoint(
        &self,
        path_id: PathId,
        update: WaypointUpdate,
    ) -> Result<WaypointId, SyncError> {
        let waypoint = self
            .remote
            .add_path_waypoint(AddPathWaypointRequest {
                id: path_id,
                update,
            })
            .await
            .map_err(|source| SyncError::Command {
                command: "add_path_waypoint",
                source,
            })?;
        self.waypoint_store(&waypoint);
        Ok(waypoint.id)
    }

    /// Removes a waypoint from a path. The local store, if any, stays
    /// registered.
    pub async fn delete_path_waypoint(
        &self,
        path_id: PathId,
        wpt_id: WaypointId,
    ) -> Result<(), SyncError> {
        self.remote
            .delete_path_waypoint(DeletePathWaypointRequest { path_id, wpt_id })
            .await
            .map_err(|source| SyncError::Command {
                command: "delete_path_waypoint",
                source,
            })
    }

    pub fn path_summary(&self, order: &PathOrder) -> PathSummary {
        PathSummary::compute(&order.get(), &self.registries.waypoints)
    }

    pub fn active_path(&self) -> PathId {
        self.active_path.get()
    }

    pub fn set_active_path(&self, path_id: PathId) {
        self.active_path.replace(path_id);
    }

    pub fn subscribe_active_path<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&PathId) + Send + Sync + 'static,
    {
        self.active_path.subscribe(listener)
    }

    pub async fn active_path_order(&self) -> Result<Arc<PathOrder>, SyncError> {
        self.path_order(self.active_path()).await
    }

    /// One long-lived listener on the global notification channel,
    /// dispatching by id. Subscribes before returning, so nothing sent after
    /// this call is missed.
    pub fn spawn_notification_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut notifications = BroadcastStream::new(self.remote.subscribe_notifications());
        let client = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(item) = notifications.next().await {
                match item {
                    Ok(notification) => {
                        let name = notification.name();
                        if let Err(err) = client.handle_notification(notification).await {
                            warn!(notification = name, error = %err, "notification not applied");
                        }
                    }
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(skipped, "notification listener lagged; cache may be stale");
                        let _ = client
                            .events
                            .send(SyncEvent::NotificationsLagged { skipped });
                    }
                }
            }
            debug!("notification channel closed; listener exiting");
        })
    }

    fn materialize_all(&self, waypoints: &[Waypoint]) -> Vec<WaypointId> {
        waypoints
            .iter()
            .map(|waypoint| self.waypoint_store(waypoint).id())
            .collect()
    }

    fn pull_failed(&self, target: PullTarget, source: anyhow::Error) -> SyncError {
        warn!(%target, error = %source, "pull failed; store left unseeded");
        let _ = self.events.send(SyncEvent::PullFailed {
            target,
            message: source.to_string(),
        });
        SyncError::Pull { target, source }
    }
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
