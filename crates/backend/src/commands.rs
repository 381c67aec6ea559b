//! Command handlers. Each one mutates storage and then broadcasts the
//! resulting notification to every subscriber, the caller included.

use shared::{
    domain::{PathId, WaypointId},
    error::{ApiError, ErrorCode},
    protocol::{
        AddPathWaypointRequest, DeletePathWaypointRequest, Notification,
        UpdatePathWaypointsPayload, UpdateWaypointPayload, Waypoint,
    },
};
use storage::Storage;
use tokio::sync::broadcast;
use tracing::{debug, info};

pub async fn get_waypoint(storage: &Storage, id: WaypointId) -> Result<Waypoint, ApiError> {
    storage
        .get_waypoint(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found(format!("waypoint {id} not found")))
}

pub async fn update_waypoint(
    storage: &Storage,
    events: &broadcast::Sender<Notification>,
    payload: UpdateWaypointPayload,
) -> Result<(), ApiError> {
    if payload.update.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "update_waypoint needs at least one field",
        ));
    }
    storage
        .update_waypoint(payload.id, &payload.update)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found(format!("waypoint {} not found", payload.id)))?;

    debug!(wpt_id = payload.id.0, "waypoint updated");
    broadcast_notification(events, Notification::UpdateWaypoint(payload));
    Ok(())
}

/// Creates a waypoint from the defaults plus `request.update` and appends it
/// to the end of the path, creating the path if needed.
pub async fn add_path_waypoint(
    storage: &Storage,
    events: &broadcast::Sender<Notification>,
    request: AddPathWaypointRequest,
) -> Result<Waypoint, ApiError> {
    let mut waypoint = Waypoint::new(WaypointId(0));
    waypoint.apply(&request.update);
    waypoint.id = storage.insert_waypoint(&waypoint).await.map_err(internal)?;
    storage
        .append_path_waypoint(request.id, waypoint.id)
        .await
        .map_err(internal)?;

    info!(
        path_id = request.id.0,
        wpt_id = waypoint.id.0,
        "waypoint added to path"
    );
    broadcast_path_order(storage, events, request.id).await?;
    Ok(waypoint)
}

pub async fn get_path_waypoints(
    storage: &Storage,
    path_id: PathId,
) -> Result<Vec<Waypoint>, ApiError> {
    storage.path_waypoints(path_id).await.map_err(internal)
}

pub async fn delete_path_waypoint(
    storage: &Storage,
    events: &broadcast::Sender<Notification>,
    request: DeletePathWaypointRequest,
) -> Result<(), ApiError> {
    let removed = storage
        .delete_path_waypoint(request.path_id, request.wpt_id)
        .await
        .map_err(internal)?;
    if !removed {
        return Err(ApiError::not_found(format!(
            "waypoint {} is not on path {}",
            request.wpt_id, request.path_id
        )));
    }

    info!(
        path_id = request.path_id.0,
        wpt_id = request.wpt_id.0,
        "waypoint removed from path"
    );
    broadcast_path_order(storage, events, request.path_id).await
}

async fn broadcast_path_order(
    storage: &Storage,
    events: &broadcast::Sender<Notification>,
    path_id: PathId,
) -> Result<(), ApiError> {
    let order = get_path_waypoints(storage, path_id).await?;
    broadcast_notification(
        events,
        Notification::UpdatePathWaypoints(UpdatePathWaypointsPayload { id: path_id, order }),
    );
    Ok(())
}

fn broadcast_notification(events: &broadcast::Sender<Notification>, notification: Notification) {
    let name = notification.name();
    // No receivers is fine; nothing is observing yet.
    let receivers = events.send(notification).unwrap_or(0);
    debug!(notification = name, receivers, "broadcast notification");
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
