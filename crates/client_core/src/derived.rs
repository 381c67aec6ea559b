//! Views computed from cached cells: waypoint classification, reactive
//! combinators, and path readiness.

use std::sync::{Arc, Mutex, PoisonError};

use shared::{domain::WaypointId, protocol::Waypoint};

use crate::{
    observable::{Observable, Readable, Subscription},
    registry::EntityRegistry,
    waypoint_store::WaypointStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaypointKind {
    FullWaypoint,
    TranslationWaypoint,
    EmptyWaypoint,
    InitialGuess,
}

impl WaypointKind {
    pub const ALL: [WaypointKind; 4] = [
        WaypointKind::FullWaypoint,
        WaypointKind::TranslationWaypoint,
        WaypointKind::EmptyWaypoint,
        WaypointKind::InitialGuess,
    ];

    /// First match wins; every flag combination maps to exactly one kind.
    pub fn classify(
        is_initial_guess: bool,
        translation_constrained: bool,
        heading_constrained: bool,
    ) -> Self {
        if is_initial_guess {
            WaypointKind::InitialGuess
        } else if !heading_constrained && !translation_constrained {
            WaypointKind::EmptyWaypoint
        } else if translation_constrained && !heading_constrained {
            WaypointKind::TranslationWaypoint
        } else {
            WaypointKind::FullWaypoint
        }
    }

    pub fn of(waypoint: &Waypoint) -> Self {
        Self::classify(
            waypoint.is_initial_guess,
            waypoint.translation_constrained,
            waypoint.heading_constrained,
        )
    }

    /// Position in the navbar table.
    pub fn index(self) -> usize {
        match self {
            WaypointKind::FullWaypoint => 0,
            WaypointKind::TranslationWaypoint => 1,
            WaypointKind::EmptyWaypoint => 2,
            WaypointKind::InitialGuess => 3,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            WaypointKind::FullWaypoint => "Pose Waypoint",
            WaypointKind::TranslationWaypoint => "Translation Waypoint",
            WaypointKind::EmptyWaypoint => "Empty Waypoint",
            WaypointKind::InitialGuess => "Initial Guess Point",
        }
    }
}

/// Output of a reactive combinator. Recomputes whenever an input cell changes;
/// dropping it detaches from the inputs.
pub struct Derived<T> {
    cell: Observable<T>,
    _inputs: Vec<Subscription>,
}

impl<T> Derived<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    pub fn get(&self) -> T {
        self.cell.get()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.cell.subscribe(listener)
    }
}

impl<T> Readable<T> for Derived<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn get(&self) -> T {
        Derived::get(self)
    }

    fn subscribe_boxed(&self, listener: Box<dyn Fn(&T) + Send + Sync>) -> Subscription {
        self.cell.subscribe_boxed(listener)
    }
}

/// Combines three cells. Each input listener stores its new value in a shared
/// snapshot and recomputes from the snapshot, so the inputs are never read
/// back from inside a notification.
pub fn derived3<A, B, C, T, F>(
    a: &impl Readable<A>,
    b: &impl Readable<B>,
    c: &impl Readable<C>,
    compute: F,
) -> Derived<T>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Clone + Send + 'static,
    T: Clone + PartialEq + Send + 'static,
    F: Fn(&A, &B, &C) -> T + Send + Sync + 'static,
{
    let inputs = Arc::new(Mutex::new((a.get(), b.get(), c.get())));
    let compute = Arc::new(compute);
    let initial = {
        let snapshot = inputs.lock().unwrap_or_else(PoisonError::into_inner);
        compute(&snapshot.0, &snapshot.1, &snapshot.2)
    };
    let cell = Observable::new(initial);

    let subscriptions = vec![
        watch(a, &inputs, &cell, {
            let compute = Arc::clone(&compute);
            move |snapshot: &mut (A, B, C), value: &A| {
                snapshot.0 = value.clone();
                compute(&snapshot.0, &snapshot.1, &snapshot.2)
            }
        }),
        watch(b, &inputs, &cell, {
            let compute = Arc::clone(&compute);
            move |snapshot: &mut (A, B, C), value: &B| {
                snapshot.1 = value.clone();
                compute(&snapshot.0, &snapshot.1, &snapshot.2)
            }
        }),
        watch(c, &inputs, &cell, {
            let compute = Arc::clone(&compute);
            move |snapshot: &mut (A, B, C), value: &C| {
                snapshot.2 = value.clone();
                compute(&snapshot.0, &snapshot.1, &snapshot.2)
            }
        }),
    ];
    Derived {
        cell,
        _inputs: subscriptions,
    }
}

fn watch<V, S, T>(
    source: &impl Readable<V>,
    inputs: &Arc<Mutex<S>>,
    cell: &Observable<T>,
    step: impl Fn(&mut S, &V) -> T + Send + Sync + 'static,
) -> Subscription
where
    S: Send + 'static,
    T: Clone + PartialEq + Send + 'static,
{
    let inputs = Arc::clone(inputs);
    let cell = cell.clone();
    source.subscribe_boxed(Box::new(move |value: &V| {
        let next = {
            let mut snapshot = inputs.lock().unwrap_or_else(PoisonError::into_inner);
            step(&mut *snapshot, value)
        };
        cell.replace(next);
    }))
}

/// Live classification of one waypoint; agrees with `WaypointKind::of` on
/// the store's snapshot at all times.
pub fn waypoint_kind(store: &WaypointStore) -> Derived<WaypointKind> {
    derived3(
        &store.is_initial_guess,
        &store.translation_constrained,
        &store.heading_constrained,
        |guess: &bool, translation: &bool, heading: &bool| {
            WaypointKind::classify(*guess, *translation, *heading)
        },
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounts {
    pub full: usize,
    pub translation: usize,
    pub empty: usize,
    pub initial_guess: usize,
}

impl KindCounts {
    fn add(&mut self, kind: WaypointKind) {
        match kind {
            WaypointKind::FullWaypoint => self.full += 1,
            WaypointKind::TranslationWaypoint => self.translation += 1,
            WaypointKind::EmptyWaypoint => self.empty += 1,
            WaypointKind::InitialGuess => self.initial_guess += 1,
        }
    }

    /// Waypoints that bound a segment, i.e. everything but initial guesses.
    pub fn constrained(&self) -> usize {
        self.full + self.translation + self.empty
    }
}

/// Readiness view over a path's cached order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSummary {
    pub kinds: Vec<(WaypointId, WaypointKind)>,
    pub counts: KindCounts,
    /// One entry per segment between consecutive non-guess waypoints. Guess
    /// points add their count to the segment they sit in.
    pub control_interval_counts: Vec<u32>,
    /// Ids in the order with no materialized store.
    pub missing: Vec<WaypointId>,
}

impl PathSummary {
    pub fn compute(order: &[WaypointId], registry: &EntityRegistry) -> Self {
        let mut missing = Vec::new();
        let waypoints: Vec<Waypoint> = order
            .iter()
            .filter_map(|id| match registry.get(*id) {
                Some(store) => Some(store.snapshot()),
                None => {
                    missing.push(*id);
                    None
                }
            })
            .collect();
        let mut summary = Self::from_waypoints(&waypoints);
        summary.missing = missing;
        summary
    }

    pub fn from_waypoints(waypoints: &[Waypoint]) -> Self {
        let last_constrained = waypoints.iter().rposition(|w| !w.is_initial_guess);

        let mut kinds = Vec::with_capacity(waypoints.len());
        let mut counts = KindCounts::default();
        let mut control_interval_counts: Vec<u32> = Vec::new();
        let mut segment_open = false;

        for (index, waypoint) in waypoints.iter().enumerate() {
            let kind = WaypointKind::of(waypoint);
            kinds.push((waypoint.id, kind));
            counts.add(kind);

            if kind == WaypointKind::InitialGuess {
                if segment_open {
                    if let Some(last) = control_interval_counts.last_mut() {
                        *last = last.saturating_add(waypoint.control_interval_count);
                    }
                }
            } else if Some(index) == last_constrained {
                segment_open = false;
            } else {
                control_interval_counts.push(waypoint.control_interval_count);
                segment_open = true;
            }
        }

        Self {
            kinds,
            counts,
            control_interval_counts,
            missing: Vec::new(),
        }
    }

    /// At least one segment and no unresolved ids.
    pub fn is_generation_ready(&self) -> bool {
        self.missing.is_empty() && self.counts.constrained() >= 2
    }
}

#[cfg(test)]
#[path = "tests/derived_tests.rs"]
mod tests;
