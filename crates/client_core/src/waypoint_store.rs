use shared::{
    domain::WaypointId,
    protocol::{FieldValue, Waypoint, WaypointUpdate},
};

use crate::{derived::WaypointKind, outbound::Outbound, remote_value::RemoteValue};

/// One `RemoteValue` per waypoint field. The id is fixed for the store's
/// lifetime.
pub struct WaypointStore {
    id: WaypointId,
    pub x: RemoteValue<f64>,
    pub y: RemoteValue<f64>,
    pub heading: RemoteValue<f64>,
    pub is_initial_guess: RemoteValue<bool>,
    pub translation_constrained: RemoteValue<bool>,
    pub heading_constrained: RemoteValue<bool>,
    pub control_interval_count: RemoteValue<u32>,
}

impl WaypointStore {
    pub(crate) fn new(initial: &Waypoint, outbound: &Outbound) -> Self {
        let id = initial.id;
        Self {
            id,
            x: RemoteValue::new(id, initial.x, FieldValue::X, outbound.clone()),
            y: RemoteValue::new(id, initial.y, FieldValue::Y, outbound.clone()),
            heading: RemoteValue::new(id, initial.heading, FieldValue::Heading, outbound.clone()),
            is_initial_guess: RemoteValue::new(
                id,
                initial.is_initial_guess,
                FieldValue::IsInitialGuess,
                outbound.clone(),
            ),
            translation_constrained: RemoteValue::new(
                id,
                initial.translation_constrained,
                FieldValue::TranslationConstrained,
                outbound.clone(),
            ),
            heading_constrained: RemoteValue::new(
                id,
                initial.heading_constrained,
                FieldValue::HeadingConstrained,
                outbound.clone(),
            ),
            control_interval_count: RemoteValue::new(
                id,
                initial.control_interval_count,
                FieldValue::ControlIntervalCount,
                outbound.clone(),
            ),
        }
    }

    pub fn id(&self) -> WaypointId {
        self.id
    }

    /// Plain copy of every cached field.
    pub fn snapshot(&self) -> Waypoint {
        Waypoint {
            id: self.id,
            x: self.x.get(),
            y: self.y.get(),
            heading: self.heading.get(),
            is_initial_guess: self.is_initial_guess.get(),
            translation_constrained: self.translation_constrained.get(),
            heading_constrained: self.heading_constrained.get(),
            control_interval_count: self.control_interval_count.get(),
        }
    }

    pub fn kind(&self) -> WaypointKind {
        WaypointKind::classify(
            self.is_initial_guess.get(),
            self.translation_constrained.get(),
            self.heading_constrained.get(),
        )
    }

    /// Local edit of a single field: updates the cell and pushes that field.
    pub fn set_field(&self, value: FieldValue) {
        match value {
            FieldValue::X(v) => self.x.set(v),
            FieldValue::Y(v) => self.y.set(v),
            FieldValue::Heading(v) => self.heading.set(v),
            FieldValue::IsInitialGuess(v) => self.is_initial_guess.set(v),
            FieldValue::TranslationConstrained(v) => self.translation_constrained.set(v),
            FieldValue::HeadingConstrained(v) => self.heading_constrained.set(v),
            FieldValue::ControlIntervalCount(v) => self.control_interval_count.set(v),
        }
    }

    /// Inbound path: touches exactly the cells named in `value`, never pushes.
    pub fn apply_no_push(&self, value: FieldValue) {
        match value {
            FieldValue::X(v) => self.x.set_no_push(v),
            FieldValue::Y(v) => self.y.set_no_push(v),
            FieldValue::Heading(v) => self.heading.set_no_push(v),
            FieldValue::IsInitialGuess(v) => self.is_initial_guess.set_no_push(v),
            FieldValue::TranslationConstrained(v) => self.translation_constrained.set_no_push(v),
            FieldValue::HeadingConstrained(v) => self.heading_constrained.set_no_push(v),
            FieldValue::ControlIntervalCount(v) => self.control_interval_count.set_no_push(v),
        }
    }

    pub fn apply_update_no_push(&self, update: &WaypointUpdate) {
        for value in update.values() {
            self.apply_no_push(value);
        }
    }
}
