use std::{sync::Arc, time::Duration};

use backend::{LocalBackend, DEFAULT_NOTIFICATION_CAPACITY};
use client_core::{Registries, RemoteCell, SyncClient, WaypointKind};
use shared::{
    domain::{PathId, WaypointId},
    protocol::{FieldValue, WaypointUpdate},
};

async fn backend() -> Arc<LocalBackend> {
    Arc::new(
        LocalBackend::open("sqlite::memory:", DEFAULT_NOTIFICATION_CAPACITY)
            .await
            .expect("backend"),
    )
}

/// Polls until `check` holds; the writer and listener run on their own tasks.
async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn local_edit_reaches_backend_and_second_client() {
    let backend = backend().await;
    let (editor, editor_tasks) = SyncClient::start(backend.clone(), Registries::new());
    let (viewer, viewer_tasks) = SyncClient::start(backend.clone(), Registries::new());

    let id = editor
        .add_path_waypoint(PathId(1), WaypointUpdate::default())
        .await
        .expect("add");
    let viewer_order = viewer.path_order(PathId(1)).await.expect("viewer order");
    assert_eq!(viewer_order.get(), vec![id]);

    let store = editor.store(id).expect("editor store");
    store.x.set(12.5);

    eventually(|| viewer.snapshot(id).map(|w| w.x) == Some(12.5)).await;
    let stored = backend
        .storage()
        .get_waypoint(id)
        .await
        .expect("query")
        .expect("row");
    assert_eq!(stored.x, 12.5);

    editor_tasks.abort();
    viewer_tasks.abort();
}

#[tokio::test]
async fn path_order_follows_add_and_delete() {
    let backend = backend().await;
    let (client, tasks) = SyncClient::start(backend.clone(), Registries::new());
    let order = client.path_order(PathId(3)).await.expect("order");
    assert!(order.is_empty());

    let mut ids = Vec::new();
    for x in [0.0, 1.0, 2.0] {
        ids.push(
            client
                .add_path_waypoint(PathId(3), WaypointUpdate::default().with(FieldValue::X(x)))
                .await
                .expect("add"),
        );
    }
    eventually(|| order.get() == ids).await;

    client
        .delete_path_waypoint(PathId(3), ids[0])
        .await
        .expect("delete");
    eventually(|| order.get() == ids[1..].to_vec()).await;
    assert!(client.store(ids[0]).is_some());

    tasks.abort();
}

#[tokio::test]
async fn classification_follows_remote_flag_changes() {
    let backend = backend().await;
    let (editor, editor_tasks) = SyncClient::start(backend.clone(), Registries::new());
    let (viewer, viewer_tasks) = SyncClient::start(backend.clone(), Registries::new());

    let id = editor
        .add_path_waypoint(PathId(1), WaypointUpdate::default())
        .await
        .expect("add");
    viewer.path_order(PathId(1)).await.expect("viewer order");
    let viewer_store = viewer.store(id).expect("viewer store");
    let kind = client_core::waypoint_kind(&viewer_store);
    assert_eq!(kind.get(), WaypointKind::FullWaypoint);

    let editor_store = editor.store(id).expect("editor store");
    RemoteCell::set(&editor_store.heading_constrained, false);

    eventually(|| kind.get() == WaypointKind::TranslationWaypoint).await;

    editor_tasks.abort();
    viewer_tasks.abort();
}

#[tokio::test]
async fn unknown_waypoint_pull_surfaces_not_found() {
    let backend = backend().await;
    let (client, _queue) = SyncClient::new(
        backend,
        Registries::new(),
        Arc::new(client_core::NoUndo),
    );

    let err = client
        .apply_waypoint_update(shared::protocol::UpdateWaypointPayload {
            id: WaypointId(404),
            update: FieldValue::X(1.0).into(),
        })
        .await
        .expect_err("missing waypoint");

    assert!(err.to_string().contains("waypoint 404"));
    assert!(client.store(WaypointId(404)).is_none());
}
