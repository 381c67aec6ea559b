use shared::{
    domain::{PathId, WaypointId},
    protocol::{FieldValue, Waypoint, WaypointUpdate},
};
use storage::Storage;

async fn path_with(storage: &Storage, path_id: PathId, count: usize) -> Vec<WaypointId> {
    let mut ids = Vec::with_capacity(count);
    for index in 0..count {
        let mut waypoint = Waypoint::new(WaypointId(0));
        waypoint.x = index as f64;
        let id = storage.insert_waypoint(&waypoint).await.expect("insert");
        storage
            .append_path_waypoint(path_id, id)
            .await
            .expect("append");
        ids.push(id);
    }
    ids
}

#[tokio::test]
async fn appended_waypoints_read_back_in_order() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let ids = path_with(&storage, PathId(1), 3).await;

    let waypoints = storage.path_waypoints(PathId(1)).await.expect("path");
    assert_eq!(
        waypoints.iter().map(|w| w.id).collect::<Vec<_>>(),
        ids
    );
    assert_eq!(waypoints[2].x, 2.0);
    assert_eq!(waypoints[0].control_interval_count, 40);
}

#[tokio::test]
async fn deleting_a_middle_waypoint_relinks_neighbours() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let ids = path_with(&storage, PathId(2), 3).await;

    assert!(storage
        .delete_path_waypoint(PathId(2), ids[1])
        .await
        .expect("delete"));

    assert_eq!(
        storage.path_waypoint_ids(PathId(2)).await.expect("ids"),
        vec![ids[0], ids[2]]
    );
    assert!(storage.get_waypoint(ids[1]).await.expect("get").is_none());

    let appended = path_with(&storage, PathId(2), 1).await;
    assert_eq!(
        storage.path_waypoint_ids(PathId(2)).await.expect("ids"),
        vec![ids[0], ids[2], appended[0]]
    );
}

#[tokio::test]
async fn deleting_head_and_tail_keeps_the_rest_reachable() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let ids = path_with(&storage, PathId(3), 4).await;

    storage
        .delete_path_waypoint(PathId(3), ids[0])
        .await
        .expect("delete head");
    storage
        .delete_path_waypoint(PathId(3), ids[3])
        .await
        .expect("delete tail");

    assert_eq!(
        storage.path_waypoint_ids(PathId(3)).await.expect("ids"),
        vec![ids[1], ids[2]]
    );
    assert!(!storage
        .delete_path_waypoint(PathId(3), ids[0])
        .await
        .expect("second delete"));
}

#[tokio::test]
async fn paths_do_not_share_links() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let first = path_with(&storage, PathId(10), 2).await;
    let second = path_with(&storage, PathId(11), 2).await;

    assert_eq!(storage.path_waypoint_ids(PathId(10)).await.expect("ids"), first);
    assert_eq!(storage.path_waypoint_ids(PathId(11)).await.expect("ids"), second);
    assert!(storage
        .path_waypoints(PathId(12))
        .await
        .expect("empty")
        .is_empty());
}

#[tokio::test]
async fn partial_update_persists_only_named_fields() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let id = storage
        .insert_waypoint(&Waypoint::new(WaypointId(0)))
        .await
        .expect("insert");

    let update = WaypointUpdate::default()
        .with(FieldValue::Heading(1.5))
        .with(FieldValue::ControlIntervalCount(0));
    let updated = storage
        .update_waypoint(id, &update)
        .await
        .expect("update")
        .expect("exists");

    assert_eq!(updated.heading, 1.5);
    assert_eq!(updated.control_interval_count, 0);
    assert_eq!(storage.get_waypoint(id).await.expect("get"), Some(updated));
}

#[tokio::test]
async fn file_backed_database_creates_parent_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("nested").join("paths.db");
    let url = format!("sqlite://{}", db_path.display());

    let storage = Storage::new(&url).await.expect("open");
    storage.health_check().await.expect("ping");
    assert!(db_path.exists());
}
