//! Outbound write queue: local edits become single-field `update_waypoint`
//! commands, drained in issue order by one writer task.

use std::sync::Arc;

use shared::{
    domain::{WaypointField, WaypointId},
    protocol::{FieldValue, UpdateWaypointPayload},
};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::{remote::RemoteStore, SyncEvent};

/// A local edit to one field, as seen by the undo stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalEdit {
    pub id: WaypointId,
    pub before: FieldValue,
    pub after: FieldValue,
}

/// Called once for every local `set`. Inbound notifications never reach it.
pub trait UndoHook: Send + Sync {
    fn record(&self, edit: LocalEdit);
}

pub struct NoUndo;

impl UndoHook for NoUndo {
    fn record(&self, _edit: LocalEdit) {}
}

#[derive(Clone)]
pub struct Outbound {
    tx: mpsc::UnboundedSender<UpdateWaypointPayload>,
    undo: Arc<dyn UndoHook>,
}

impl Outbound {
    pub fn channel(undo: Arc<dyn UndoHook>) -> (Self, OutboundQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, undo }, OutboundQueue { rx })
    }

    pub(crate) fn record_edit(&self, edit: LocalEdit) {
        self.undo.record(edit);
    }

    /// Never blocks and never fails; a closed queue only logs.
    pub(crate) fn send(&self, id: WaypointId, value: FieldValue) {
        let field = value.field();
        let payload = UpdateWaypointPayload {
            id,
            update: value.into(),
        };
        if self.tx.send(payload).is_err() {
            warn!(
                wpt_id = id.0,
                %field,
                "outbound queue closed; dropping local write"
            );
        } else {
            debug!(wpt_id = id.0, %field, "queued waypoint push");
        }
    }
}

pub struct OutboundQueue {
    rx: mpsc::UnboundedReceiver<UpdateWaypointPayload>,
}

impl OutboundQueue {
    pub async fn recv(&mut self) -> Option<UpdateWaypointPayload> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<UpdateWaypointPayload> {
        self.rx.try_recv().ok()
    }

    /// Forwards queued writes to `remote` until every `Outbound` is dropped.
    /// A rejected write is reported on `events`; the local cache keeps the
    /// value and nothing is retried.
    pub fn spawn_writer(
        mut self,
        remote: Arc<dyn RemoteStore>,
        events: broadcast::Sender<SyncEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(payload) = self.recv().await {
                let id = payload.id;
                let field = payload
                    .update
                    .values()
                    .first()
                    .map(FieldValue::field);
                if let Err(err) = remote.update_waypoint(payload).await {
                    warn!(
                        wpt_id = id.0,
                        field = field.map(WaypointField::as_str),
                        error = %err,
                        "push failed; keeping local value"
                    );
                    let _ = events.send(SyncEvent::PushFailed {
                        id,
                        field,
                        message: err.to_string(),
                    });
                }
            }
            debug!("outbound queue closed; writer exiting");
        })
    }
}

#[cfg(test)]
#[path = "tests/outbound_tests.rs"]
mod tests;
