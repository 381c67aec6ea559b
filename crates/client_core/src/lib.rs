//! Client-side cache of backend-owned waypoint and path state.
//!
//! Every waypoint field is a [`RemoteValue`]: local reads are synchronous,
//! local writes update the cache first and are then queued as single-field
//! `update_waypoint` commands. Inbound notifications update the cache without
//! echoing back. Stores live in process-scoped [`Registries`] and are
//! materialized the first time an id is referenced.

use shared::domain::{WaypointField, WaypointId};

pub mod derived;
pub mod error;
pub mod observable;
pub mod outbound;
pub mod path_order;
pub mod registry;
pub mod remote;
pub mod remote_value;
pub mod sync;
pub mod waypoint_store;

pub use derived::{derived3, waypoint_kind, Derived, KindCounts, PathSummary, WaypointKind};
pub use error::{PullTarget, SyncError};
pub use observable::{Observable, Readable, Subscription};
pub use outbound::{LocalEdit, NoUndo, Outbound, OutboundQueue, UndoHook};
pub use path_order::PathOrder;
pub use registry::{EntityRegistry, PathRegistry, Registries};
pub use remote::{MissingRemoteStore, RemoteStore};
pub use remote_value::{RemoteCell, RemoteValue};
pub use sync::{SyncClient, SyncTasks};
pub use waypoint_store::WaypointStore;

/// Diagnostics published by the sync layer. Nothing here is required for
/// correctness; subscribers use it to surface failures.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// The backend rejected a queued write. The local value was kept.
    PushFailed {
        id: WaypointId,
        field: Option<WaypointField>,
        message: String,
    },
    PullFailed {
        target: PullTarget,
        message: String,
    },
    NotificationsLagged {
        skipped: u64,
    },
    Materialized {
        id: WaypointId,
    },
}
