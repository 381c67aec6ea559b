use super::*;
use serde_json::json;

#[test]
fn partial_update_ignores_unknown_and_id_keys() {
    let update: WaypointUpdate = serde_json::from_value(json!({
        "id": 7,
        "y": 1.0,
        "bumper_width": 0.9,
    }))
    .expect("partial update");

    assert_eq!(update, WaypointUpdate::from(FieldValue::Y(1.0)));
}

#[test]
fn single_field_update_serializes_only_that_key() {
    let payload = UpdateWaypointPayload {
        id: WaypointId(3),
        update: FieldValue::HeadingConstrained(false).into(),
    };
    assert_eq!(
        serde_json::to_value(&payload).expect("serialize"),
        json!({ "id": 3, "update": { "heading_constrained": false } })
    );
}

#[test]
fn notifications_are_tagged_by_event_name() {
    let notification = Notification::UpdatePathWaypoints(UpdatePathWaypointsPayload {
        id: PathId(2),
        order: vec![Waypoint::new(WaypointId(9))],
    });
    let value = serde_json::to_value(&notification).expect("serialize");

    assert_eq!(value["event"], "update_path_waypoints");
    assert_eq!(value["payload"]["order"][0]["control_interval_count"], 40);
    assert_eq!(notification.name(), "update_path_waypoints");
}

#[test]
fn delete_request_uses_camel_case_keys() {
    let request = DeletePathWaypointRequest {
        path_id: PathId(1),
        wpt_id: WaypointId(4),
    };
    assert_eq!(
        serde_json::to_value(request).expect("serialize"),
        json!({ "pathId": 1, "wptId": 4 })
    );
}

#[test]
fn apply_overwrites_present_fields_only() {
    let mut waypoint = Waypoint::new(WaypointId(1));
    let update = WaypointUpdate::default()
        .with(FieldValue::X(2.5))
        .with(FieldValue::IsInitialGuess(true));
    waypoint.apply(&update);

    assert_eq!(waypoint.x, 2.5);
    assert!(waypoint.is_initial_guess);
    assert_eq!(waypoint.y, 0.0);
    assert!(waypoint.heading_constrained);
    assert_eq!(update.values().len(), 2);
}

#[test]
fn value_of_and_set_agree_for_every_field() {
    let source = Waypoint {
        id: WaypointId(5),
        x: 1.0,
        y: -2.0,
        heading: 0.5,
        is_initial_guess: true,
        translation_constrained: false,
        heading_constrained: false,
        control_interval_count: 0,
    };
    let mut target = Waypoint::new(WaypointId(5));
    for field in WaypointField::ALL {
        let value = source.value_of(field);
        assert_eq!(value.field(), field);
        target.set(value);
    }
    assert_eq!(target, source);
}
