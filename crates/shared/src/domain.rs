use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(WaypointId);
id_newtype!(PathId);

/// Scalar fields of a waypoint that the backend owns. `id` is not a field: it
/// is assigned by the backend and never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointField {
    X,
    Y,
    Heading,
    IsInitialGuess,
    TranslationConstrained,
    HeadingConstrained,
    ControlIntervalCount,
}

impl WaypointField {
    pub const ALL: [WaypointField; 7] = [
        WaypointField::X,
        WaypointField::Y,
        WaypointField::Heading,
        WaypointField::IsInitialGuess,
        WaypointField::TranslationConstrained,
        WaypointField::HeadingConstrained,
        WaypointField::ControlIntervalCount,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WaypointField::X => "x",
            WaypointField::Y => "y",
            WaypointField::Heading => "heading",
            WaypointField::IsInitialGuess => "is_initial_guess",
            WaypointField::TranslationConstrained => "translation_constrained",
            WaypointField::HeadingConstrained => "heading_constrained",
            WaypointField::ControlIntervalCount => "control_interval_count",
        }
    }
}

impl fmt::Display for WaypointField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
