//! Process-scoped id → store maps. Lazily populated, never pruned.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, PoisonError, RwLock},
};

use shared::{
    domain::{PathId, WaypointId},
    protocol::Waypoint,
};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::{outbound::Outbound, path_order::PathOrder, waypoint_store::WaypointStore};

#[derive(Default)]
pub struct EntityRegistry {
    stores: RwLock<HashMap<WaypointId, Arc<WaypointStore>>>,
}

impl EntityRegistry {
    pub fn get(&self, id: WaypointId) -> Option<Arc<WaypointStore>> {
        self.stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn contains(&self, id: WaypointId) -> bool {
        self.stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the store for `initial.id`, creating it from `initial` if this
    /// is the first reference. Values passed on later calls are discarded.
    pub fn get_or_create(&self, initial: &Waypoint, outbound: &Outbound) -> Arc<WaypointStore> {
        self.materialize(initial, outbound).0
    }

    /// Like `get_or_create`, also reporting whether this call created the
    /// store. Lookup and insert happen under one write lock.
    pub(crate) fn materialize(
        &self,
        initial: &Waypoint,
        outbound: &Outbound,
    ) -> (Arc<WaypointStore>, bool) {
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = stores.get(&initial.id) {
            return (Arc::clone(existing), false);
        }
        let store = Arc::new(WaypointStore::new(initial, outbound));
        stores.insert(initial.id, Arc::clone(&store));
        debug!(wpt_id = initial.id.0, "materialized waypoint store");
        (store, true)
    }
}

type PathSlot = Arc<OnceCell<Arc<PathOrder>>>;

/// Path orders by id. A slot exists from the first hydration attempt on, but
/// only a successful hydration makes the order visible.
#[derive(Default)]
pub struct PathRegistry {
    orders: RwLock<HashMap<PathId, PathSlot>>,
}

impl PathRegistry {
    pub fn get(&self, id: PathId) -> Option<Arc<PathOrder>> {
        self.orders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .and_then(|slot| slot.get().cloned())
    }

    pub fn len(&self) -> usize {
        self.orders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the order for `id`, running `hydrate` if none is registered.
    /// Concurrent first callers wait on a single hydration. When `hydrate`
    /// fails nothing is registered and the next caller runs it again. The
    /// flag reports whether this call registered the order.
    pub async fn get_or_hydrate<F, Fut, E>(
        &self,
        id: PathId,
        hydrate: F,
    ) -> Result<(Arc<PathOrder>, bool), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<PathOrder, E>>,
    {
        let slot = self.slot(id);
        let mut created = false;
        let registered = &mut created;
        let order = slot
            .get_or_try_init(move || async move {
                let order = hydrate().await?;
                *registered = true;
                Ok::<_, E>(Arc::new(order))
            })
            .await?;
        Ok((Arc::clone(order), created))
    }

    fn slot(&self, id: PathId) -> PathSlot {
        let mut orders = self.orders.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(orders.entry(id).or_default())
    }
}

/// The only shared mutable state of the sync layer. Created once at startup
/// and handed to the `SyncClient`.
#[derive(Default)]
pub struct Registries {
    pub waypoints: EntityRegistry,
    pub paths: PathRegistry,
}

impl Registries {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
