use super::*;

#[test]
fn memory_urls_have_no_file_path() {
    assert!(is_memory_url("sqlite::memory:"));
    assert!(is_memory_url("sqlite://file:paths?mode=memory&cache=shared"));
    assert_eq!(sqlite_path("sqlite::memory:"), None);
}

#[test]
fn file_urls_resolve_to_paths_without_query() {
    assert_eq!(
        sqlite_path("sqlite://./data/paths.db?mode=rwc"),
        Some(PathBuf::from("./data/paths.db"))
    );
    assert_eq!(sqlite_path("postgres://localhost/db"), None);
}

#[tokio::test]
async fn missing_waypoint_reads_and_updates_as_none() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("ping");

    assert!(storage
        .get_waypoint(WaypointId(404))
        .await
        .expect("query")
        .is_none());
    assert!(storage
        .update_waypoint(WaypointId(404), &WaypointUpdate::default())
        .await
        .expect("update")
        .is_none());
}

#[test]
fn parent_dir_is_created_only_for_file_urls() {
    ensure_sqlite_parent_dir_exists("sqlite::memory:").expect("memory url");

    let root = tempfile::tempdir().expect("tempdir");
    let db_path = root.path().join("nested").join("paths.db");
    ensure_sqlite_parent_dir_exists(&format!("sqlite://{}", db_path.display()))
        .expect("file url");

    assert!(root.path().join("nested").is_dir());
    assert!(!db_path.exists());
}
