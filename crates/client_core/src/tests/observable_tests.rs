use super::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

fn recorder<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |value: &T| {
        sink.lock().expect("recorder lock").push(value.clone())
    })
}

#[test]
fn subscribe_does_not_fire_with_current_value() {
    let cell = Observable::new(1_i32);
    let (seen, listener) = recorder();
    let _sub = cell.subscribe(listener);

    assert!(seen.lock().expect("lock").is_empty());
}

#[test]
fn replace_notifies_only_on_change() {
    let cell = Observable::new(1_i32);
    let (seen, listener) = recorder();
    let _sub = cell.subscribe(listener);

    assert!(!cell.replace(1));
    assert!(cell.replace(2));
    assert!(!cell.replace(2));
    assert!(cell.replace(3));

    assert_eq!(*seen.lock().expect("lock"), vec![2, 3]);
    assert_eq!(cell.get(), 3);
}

#[test]
fn dropping_subscription_unregisters_listener() {
    let cell = Observable::new(0_u32);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let sub = cell.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(cell.listener_count(), 1);

    cell.replace(1);
    drop(sub);
    cell.replace(2);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cell.listener_count(), 0);
}

#[test]
fn unsubscribe_and_detach() {
    let cell = Observable::new(String::from("a"));
    let (seen, listener) = recorder();
    cell.subscribe(listener).detach();
    let (other, listener) = recorder::<String>();
    cell.subscribe(listener).unsubscribe();

    cell.replace("b".into());

    assert_eq!(*seen.lock().expect("lock"), vec!["b".to_string()]);
    assert!(other.lock().expect("lock").is_empty());
    assert_eq!(cell.listener_count(), 1);
}

#[test]
fn listener_may_read_the_cell_it_observes() {
    let cell = Observable::new(10_i64);
    let reader = cell.clone();
    let (seen, sink) = recorder::<i64>();
    let _sub = cell.subscribe(move |_| sink(&reader.get()));

    cell.replace(11);

    assert_eq!(*seen.lock().expect("lock"), vec![11]);
}

#[test]
fn listener_writing_its_cell_leaves_later_listeners_current() {
    let cell = Observable::new(0_u8);
    let writer = cell.clone();
    let _clamp = cell.subscribe(move |value: &u8| {
        if *value > 5 {
            writer.replace(5);
        }
    });
    let (seen, listener) = recorder();
    let _sub = cell.subscribe(listener);

    cell.replace(9);

    assert_eq!(cell.get(), 5);
    assert_eq!(seen.lock().expect("lock").last(), Some(&5));
    assert!(!seen.lock().expect("lock").contains(&9));
}

#[test]
fn subscription_outliving_cell_is_harmless() {
    let cell = Observable::new(0_u8);
    let sub = cell.subscribe(|_| {});
    drop(cell);
    drop(sub);
}

#[test]
fn with_borrows_without_cloning() {
    let cell = Observable::new(vec![1, 2, 3]);
    assert_eq!(cell.with(Vec::len), 3);
}
