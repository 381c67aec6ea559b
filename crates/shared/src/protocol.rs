use serde::{Deserialize, Serialize};

use crate::domain::{PathId, WaypointField, WaypointId};

pub const DEFAULT_CONTROL_INTERVAL_COUNT: u32 = 40;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: WaypointId,
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub is_initial_guess: bool,
    pub translation_constrained: bool,
    pub heading_constrained: bool,
    pub control_interval_count: u32,
}

impl Waypoint {
    /// A fully constrained pose waypoint at the origin.
    pub fn new(id: WaypointId) -> Self {
        Self {
            id,
            x: 0.0,
            y: 0.0,
            heading: 0.0,
            is_initial_guess: false,
            translation_constrained: true,
            heading_constrained: true,
            control_interval_count: DEFAULT_CONTROL_INTERVAL_COUNT,
        }
    }

    pub fn value_of(&self, field: WaypointField) -> FieldValue {
        match field {
            WaypointField::X => FieldValue::X(self.x),
            WaypointField::Y => FieldValue::Y(self.y),
            WaypointField::Heading => FieldValue::Heading(self.heading),
            WaypointField::IsInitialGuess => FieldValue::IsInitialGuess(self.is_initial_guess),
            WaypointField::TranslationConstrained => {
                FieldValue::TranslationConstrained(self.translation_constrained)
            }
            WaypointField::HeadingConstrained => {
                FieldValue::HeadingConstrained(self.heading_constrained)
            }
            WaypointField::ControlIntervalCount => {
                FieldValue::ControlIntervalCount(self.control_interval_count)
            }
        }
    }

    pub fn set(&mut self, value: FieldValue) {
        match value {
            FieldValue::X(v) => self.x = v,
            FieldValue::Y(v) => self.y = v,
            FieldValue::Heading(v) => self.heading = v,
            FieldValue::IsInitialGuess(v) => self.is_initial_guess = v,
            FieldValue::TranslationConstrained(v) => self.translation_constrained = v,
            FieldValue::HeadingConstrained(v) => self.heading_constrained = v,
            FieldValue::ControlIntervalCount(v) => self.control_interval_count = v,
        }
    }

    /// Overwrites every field present in `update`, leaving the rest untouched.
    pub fn apply(&mut self, update: &WaypointUpdate) {
        for value in update.values() {
            self.set(value);
        }
    }
}

/// One field of a waypoint together with its typed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    X(f64),
    Y(f64),
    Heading(f64),
    IsInitialGuess(bool),
    TranslationConstrained(bool),
    HeadingConstrained(bool),
    ControlIntervalCount(u32),
}

impl FieldValue {
    pub fn field(&self) -> WaypointField {
        match self {
            FieldValue::X(_) => WaypointField::X,
            FieldValue::Y(_) => WaypointField::Y,
            FieldValue::Heading(_) => WaypointField::Heading,
            FieldValue::IsInitialGuess(_) => WaypointField::IsInitialGuess,
            FieldValue::TranslationConstrained(_) => WaypointField::TranslationConstrained,
            FieldValue::HeadingConstrained(_) => WaypointField::HeadingConstrained,
            FieldValue::ControlIntervalCount(_) => WaypointField::ControlIntervalCount,
        }
    }
}

/// Partial waypoint diff as it travels on the wire. Keys outside the legal
/// field set (including `id`) are dropped during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_initial_guess: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_constrained: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_constrained: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_interval_count: Option<u32>,
}

impl WaypointUpdate {
    pub fn with(mut self, value: FieldValue) -> Self {
        self.insert(value);
        self
    }

    pub fn insert(&mut self, value: FieldValue) {
        match value {
            FieldValue::X(v) => self.x = Some(v),
            FieldValue::Y(v) => self.y = Some(v),
            FieldValue::Heading(v) => self.heading = Some(v),
            FieldValue::IsInitialGuess(v) => self.is_initial_guess = Some(v),
            FieldValue::TranslationConstrained(v) => self.translation_constrained = Some(v),
            FieldValue::HeadingConstrained(v) => self.heading_constrained = Some(v),
            FieldValue::ControlIntervalCount(v) => self.control_interval_count = Some(v),
        }
    }

    /// Present fields in declaration order.
    pub fn values(&self) -> Vec<FieldValue> {
        let candidates = [
            self.x.map(FieldValue::X),
            self.y.map(FieldValue::Y),
            self.heading.map(FieldValue::Heading),
            self.is_initial_guess.map(FieldValue::IsInitialGuess),
            self.translation_constrained
                .map(FieldValue::TranslationConstrained),
            self.heading_constrained.map(FieldValue::HeadingConstrained),
            self.control_interval_count
                .map(FieldValue::ControlIntervalCount),
        ];
        candidates.into_iter().flatten().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }
}

impl From<FieldValue> for WaypointUpdate {
    fn from(value: FieldValue) -> Self {
        WaypointUpdate::default().with(value)
    }
}

/// `update_waypoint` command body and notification payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateWaypointPayload {
    pub id: WaypointId,
    pub update: WaypointUpdate,
}

/// `add_path_waypoint` command body; `id` names the path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddPathWaypointRequest {
    pub id: PathId,
    pub update: WaypointUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePathWaypointRequest {
    pub path_id: PathId,
    pub wpt_id: WaypointId,
}

/// `update_path_waypoints` notification payload; `order` is the full path in
/// traversal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePathWaypointsPayload {
    pub id: PathId,
    pub order: Vec<Waypoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum Notification {
    UpdateWaypoint(UpdateWaypointPayload),
    UpdatePathWaypoints(UpdatePathWaypointsPayload),
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Notification::UpdateWaypoint(_) => "update_waypoint",
            Notification::UpdatePathWaypoints(_) => "update_path_waypoints",
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
