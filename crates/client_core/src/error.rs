use std::fmt;

use shared::domain::{PathId, WaypointId};
use thiserror::Error;

/// What a pull was trying to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullTarget {
    Waypoint(WaypointId),
    Path(PathId),
}

impl fmt::Display for PullTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PullTarget::Waypoint(id) => write!(f, "waypoint {id}"),
            PullTarget::Path(id) => write!(f, "path {id}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// The fetch that would have seeded a store failed; nothing was cached.
    #[error("pull of {target} failed: {source}")]
    Pull {
        target: PullTarget,
        source: anyhow::Error,
    },
    #[error("{command} failed: {source}")]
    Command {
        command: &'static str,
        source: anyhow::Error,
    },
}
