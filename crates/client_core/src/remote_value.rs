//! Reactive cell mirroring one backend-owned waypoint field.

use shared::{
    domain::{WaypointField, WaypointId},
    protocol::FieldValue,
};
use tracing::trace;

use crate::{
    observable::{Observable, Readable, Subscription},
    outbound::{LocalEdit, Outbound},
};

/// Write side shared by every remote-backed cell.
pub trait RemoteCell<T>: Readable<T> {
    /// Updates the cache and notifies listeners without contacting the remote.
    fn set_no_push(&self, value: T);
    /// Sends the current cached value to the remote.
    fn push(&self);

    fn set(&self, value: T) {
        self.set_no_push(value);
        self.push();
    }

    fn update(&self, apply: impl FnOnce(T) -> T)
    where
        Self: Sized,
    {
        self.set(apply(self.get()));
    }
}

/// Last writer wins: the cached value is whichever of the last local `set`
/// or the last inbound `set_no_push` was processed most recently.
pub struct RemoteValue<T> {
    id: WaypointId,
    field: WaypointField,
    encode: fn(T) -> FieldValue,
    cell: Observable<T>,
    outbound: Outbound,
}

impl<T> RemoteValue<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    pub(crate) fn new(
        id: WaypointId,
        initial: T,
        encode: fn(T) -> FieldValue,
        outbound: Outbound,
    ) -> Self {
        let field = encode(initial.clone()).field();
        Self {
            id,
            field,
            encode,
            cell: Observable::new(initial),
            outbound,
        }
    }

    pub fn id(&self) -> WaypointId {
        self.id
    }

    pub fn field(&self) -> WaypointField {
        self.field
    }

    pub fn get(&self) -> T {
        self.cell.get()
    }

    pub fn field_value(&self) -> FieldValue {
        (self.encode)(self.get())
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.cell.subscribe(listener)
    }

    pub fn set_no_push(&self, value: T) {
        if self.cell.replace(value) {
            trace!(wpt_id = self.id.0, field = %self.field, "cell changed");
        }
    }

    /// Exactly one outbound write per call, carrying only this field.
    pub fn push(&self) {
        self.outbound.send(self.id, self.field_value());
    }

    pub fn set(&self, value: T) {
        let before = self.field_value();
        self.set_no_push(value.clone());
        self.outbound.record_edit(LocalEdit {
            id: self.id,
            before,
            after: (self.encode)(value),
        });
        self.push();
    }

    pub fn update(&self, apply: impl FnOnce(T) -> T) {
        self.set(apply(self.get()));
    }
}

impl<T> Readable<T> for RemoteValue<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn get(&self) -> T {
        RemoteValue::get(self)
    }

    fn subscribe_boxed(&self, listener: Box<dyn Fn(&T) + Send + Sync>) -> Subscription {
        self.cell.subscribe_boxed(listener)
    }
}

impl<T> RemoteCell<T> for RemoteValue<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn set_no_push(&self, value: T) {
        RemoteValue::set_no_push(self, value);
    }

    fn push(&self) {
        RemoteValue::push(self);
    }

    fn set(&self, value: T) {
        RemoteValue::set(self, value);
    }
}

#[cfg(test)]
#[path = "tests/remote_value_tests.rs"]
mod tests;
