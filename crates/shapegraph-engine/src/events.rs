//! Lifecycle events emitted to external observers (views, editor chrome).
//!
//! Observers register a callback and receive every event synchronously in
//! emission order. The engine computes change-propagation paths from the
//! live edge set at notification time, so a removed vertex simply stops
//! appearing in propagation -- there is no per-vertex listener table to
//! keep in sync across replace/remove.

use std::fmt;

use shapegraph_core::{Vertex, VertexId};

/// A lifecycle or change-propagation event.
#[derive(Debug, Clone)]
pub enum GraphEvent {
    /// A vertex entered the graph.
    VertexAdded(Vertex),
    /// A vertex left the graph.
    VertexRemoved(Vertex),
    /// The vertex at a graph position was swapped.
    VertexReplaced { old: Vertex, new: Vertex },
    /// A commit finished; carries the newly committed vertices.
    Committed(Vec<Vertex>),
    /// A vertex's own content changed.
    VertexChanged(VertexId),
    /// A transitive descendant of `ancestor` changed. Emitted once per
    /// graph path that reaches the ancestor.
    DescendantChanged {
        ancestor: VertexId,
        descendant: VertexId,
    },
}

/// Subscription handle returned by `GeometryGraph::subscribe`.
///
/// Handles are never reused; unsubscribing invalidates the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type ObserverFn = Box<dyn FnMut(&GraphEvent) + Send>;

/// Registry of observer callbacks keyed by subscription handle.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    next_id: u64,
    observers: Vec<(ObserverId, ObserverFn)>,
}

impl ObserverRegistry {
    pub(crate) fn subscribe(
        &mut self,
        observer: impl FnMut(&GraphEvent) + Send + 'static,
    ) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Removes an observer. Returns false when the handle was already gone.
    pub(crate) fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    pub(crate) fn emit(&mut self, event: &GraphEvent) {
        for (_, observer) in self.observers.iter_mut() {
            observer(event);
        }
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .finish()
    }
}
