use super::*;
use shared::protocol::{FieldValue, WaypointUpdate};

async fn setup() -> (Storage, broadcast::Sender<Notification>, broadcast::Receiver<Notification>) {
    let storage = Storage::new("sqlite::memory:").await.expect("storage");
    let (tx, rx) = broadcast::channel(16);
    (storage, tx, rx)
}

#[tokio::test]
async fn add_applies_defaults_and_broadcasts_full_order() {
    let (storage, tx, mut rx) = setup().await;

    let waypoint = add_path_waypoint(
        &storage,
        &tx,
        AddPathWaypointRequest {
            id: PathId(1),
            update: WaypointUpdate::default().with(FieldValue::X(3.0)),
        },
    )
    .await
    .expect("add");

    assert_eq!(waypoint.x, 3.0);
    assert_eq!(waypoint.control_interval_count, 40);
    assert!(waypoint.translation_constrained);
    assert!(waypoint.heading_constrained);
    assert!(!waypoint.is_initial_guess);

    match rx.recv().await.expect("notification") {
        Notification::UpdatePathWaypoints(payload) => {
            assert_eq!(payload.id, PathId(1));
            assert_eq!(payload.order, vec![waypoint]);
        }
        other => panic!("unexpected notification: {other:?}"),
    }
}

#[tokio::test]
async fn update_echoes_exactly_the_applied_fields() {
    let (storage, tx, mut rx) = setup().await;
    let id = storage
        .insert_waypoint(&Waypoint::new(WaypointId(0)))
        .await
        .expect("insert");
    let payload = UpdateWaypointPayload {
        id,
        update: FieldValue::Heading(0.5).into(),
    };

    update_waypoint(&storage, &tx, payload.clone())
        .await
        .expect("update");

    assert_eq!(
        rx.recv().await.expect("notification"),
        Notification::UpdateWaypoint(payload)
    );
    let stored = get_waypoint(&storage, id).await.expect("get");
    assert_eq!(stored.heading, 0.5);
}

#[tokio::test]
async fn unknown_waypoint_is_not_found() {
    let (storage, tx, _rx) = setup().await;

    let err = get_waypoint(&storage, WaypointId(77))
        .await
        .expect_err("missing");
    assert_eq!(err.code, ErrorCode::NotFound);

    let err = update_waypoint(
        &storage,
        &tx,
        UpdateWaypointPayload {
            id: WaypointId(77),
            update: FieldValue::X(1.0).into(),
        },
    )
    .await
    .expect_err("missing");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn empty_update_is_rejected() {
    let (storage, tx, mut rx) = setup().await;

    let err = update_waypoint(
        &storage,
        &tx,
        UpdateWaypointPayload {
            id: WaypointId(1),
            update: WaypointUpdate::default(),
        },
    )
    .await
    .expect_err("empty");

    assert_eq!(err.code, ErrorCode::Validation);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn delete_broadcasts_remaining_order() {
    let (storage, tx, mut rx) = setup().await;
    let mut ids = Vec::new();
    for x in [1.0, 2.0, 3.0] {
        let waypoint = add_path_waypoint(
            &storage,
            &tx,
            AddPathWaypointRequest {
                id: PathId(1),
                update: FieldValue::X(x).into(),
            },
        )
        .await
        .expect("add");
        ids.push(waypoint.id);
    }
    while rx.try_recv().is_ok() {}

    delete_path_waypoint(
        &storage,
        &tx,
        DeletePathWaypointRequest {
            path_id: PathId(1),
            wpt_id: ids[1],
        },
    )
    .await
    .expect("delete");

    match rx.recv().await.expect("notification") {
        Notification::UpdatePathWaypoints(payload) => {
            let order: Vec<WaypointId> = payload.order.iter().map(|w| w.id).collect();
            assert_eq!(order, vec![ids[0], ids[2]]);
        }
        other => panic!("unexpected notification: {other:?}"),
    }

    let err = delete_path_waypoint(
        &storage,
        &tx,
        DeletePathWaypointRequest {
            path_id: PathId(1),
            wpt_id: ids[1],
        },
    )
    .await
    .expect_err("already removed");
    assert_eq!(err.code, ErrorCode::NotFound);
}
