use super::*;

#[test]
fn debug_shows_id_and_current_order() {
    let order = PathOrder::new(PathId(4), vec![WaypointId(2), WaypointId(1)]);

    let rendered = format!("{order:?}");

    assert!(rendered.contains("PathOrder"));
    assert!(rendered.contains("PathId(4)"));
    assert!(rendered.contains("WaypointId(2), WaypointId(1)"));
}

#[test]
fn local_set_is_ignored_and_replace_notifies() {
    let order = PathOrder::new(PathId(1), vec![WaypointId(1)]);
    let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = std::sync::Arc::clone(&seen);
    let _sub = order.subscribe(move |ids: &Vec<WaypointId>| {
        sink.lock().expect("lock").push(ids.clone())
    });

    order.set(vec![WaypointId(9)]);
    RemoteCell::set(&order, vec![WaypointId(8)]);
    assert_eq!(order.get(), vec![WaypointId(1)]);

    assert!(order.replace(vec![WaypointId(3), WaypointId(1)]));
    assert!(order.contains(WaypointId(3)));
    assert_eq!(order.len(), 2);
    assert_eq!(
        *seen.lock().expect("lock"),
        vec![vec![WaypointId(3), WaypointId(1)]]
    );
}
