use std::fmt;

use shared::domain::{PathId, WaypointId};
use tracing::debug;

use crate::{
    observable::{Observable, Readable, Subscription},
    remote_value::RemoteCell,
};

/// Cached traversal order of one path.
///
/// Receive-only: the order changes when the backend reports it. `set`,
/// `set_no_push` and `push` are accepted and ignored; reordering goes through
/// path mutation commands instead.
pub struct PathOrder {
    id: PathId,
    order: Observable<Vec<WaypointId>>,
}

impl PathOrder {
    pub(crate) fn new(id: PathId, order: Vec<WaypointId>) -> Self {
        Self {
            id,
            order: Observable::new(order),
        }
    }

    pub fn id(&self) -> PathId {
        self.id
    }

    pub fn get(&self) -> Vec<WaypointId> {
        self.order.get()
    }

    pub fn len(&self) -> usize {
        self.order.with(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: WaypointId) -> bool {
        self.order.with(|order| order.contains(&id))
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Vec<WaypointId>) + Send + Sync + 'static,
    {
        self.order.subscribe(listener)
    }

    pub fn set(&self, _order: Vec<WaypointId>) {
        debug!(path_id = self.id.0, "path order is receive-only; ignoring local set");
    }

    pub(crate) fn replace(&self, order: Vec<WaypointId>) -> bool {
        self.order.replace(order)
    }
}

impl fmt::Debug for PathOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathOrder")
            .field("id", &self.id)
            .field("order", &self.get())
            .finish()
    }
}

impl Readable<Vec<WaypointId>> for PathOrder {
    fn get(&self) -> Vec<WaypointId> {
        PathOrder::get(self)
    }

    fn subscribe_boxed(
        &self,
        listener: Box<dyn Fn(&Vec<WaypointId>) + Send + Sync>,
    ) -> Subscription {
        self.order.subscribe_boxed(listener)
    }
}

impl RemoteCell<Vec<WaypointId>> for PathOrder {
    fn set_no_push(&self, _order: Vec<WaypointId>) {}

    fn push(&self) {}

    fn set(&self, order: Vec<WaypointId>) {
        PathOrder::set(self, order);
    }
}

#[cfg(test)]
#[path = "tests/path_order_tests.rs"]
mod tests;
