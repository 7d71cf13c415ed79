//! GeometryGraph: the vertex lifecycle and capture/commit coordinator.
//!
//! Owns the [`DependencyGraph`], the originals map for live edits, the
//! undo/redo history, and the observer registry; holds the persistence
//! collaborator as an `Arc<dyn ContentStore>` handed in at construction.
//!
//! All graph-structure mutation is synchronous and goes through
//! `&mut self`, so mutation is non-reentrant by construction: no observer
//! can see a half-replaced editing set. Suspension happens only at the
//! capture and snapshot persistence boundaries, and every commit
//! continuation re-checks that its target is still present before touching
//! the graph -- a capture that resolves after its vertex was canceled is
//! absorbed as a superseded commit, not an error.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use shapegraph_core::{
    DependencyGraph, GraphError, PointParams, SphereParams, Vertex, VertexId, VertexKind,
};
use shapegraph_store::{ContentStore, GraphSnapshot};

use crate::capture::capture;
use crate::command::{Command, CommandStack};
use crate::error::EngineError;
use crate::events::{GraphEvent, ObserverId, ObserverRegistry};

/// The geometry dependency graph and its lifecycle engine.
pub struct GeometryGraph {
    graph: DependencyGraph,
    store: Arc<dyn ContentStore>,
    /// Pre-edit vertices keyed by id; populated on edit, cleared on
    /// commit or cancel.
    originals: HashMap<VertexId, Vertex>,
    commands: CommandStack,
    observers: ObserverRegistry,
    next_id: u32,
}

impl GeometryGraph {
    /// Creates an empty graph persisting through `store`.
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        GeometryGraph {
            graph: DependencyGraph::new(),
            store,
            originals: HashMap::new(),
            commands: CommandStack::new(),
            observers: ObserverRegistry::default(),
            next_id: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    /// Registers an observer for lifecycle and change events.
    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&GraphEvent) + Send + 'static,
    ) -> ObserverId {
        self.observers.subscribe(observer)
    }

    /// Removes an observer. Returns false when the handle was already gone.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn emit(&mut self, event: GraphEvent) {
        self.observers.emit(&event);
    }

    // -----------------------------------------------------------------------
    // Prototypes
    // -----------------------------------------------------------------------

    fn fresh_id(&mut self, kind: &VertexKind) -> VertexId {
        let id = VertexId::new(format!("{}{}", kind.name(), self.next_id));
        self.next_id += 1;
        id
    }

    /// Creates an editing point prototype and adds it to the graph.
    /// No persistence happens until the prototype is committed.
    pub fn create_point_prototype(
        &mut self,
        params: PointParams,
        implicit: bool,
    ) -> Result<Vertex, EngineError> {
        let kind = VertexKind::Point(params);
        let vertex = Vertex::prototype(self.fresh_id(&kind), kind, implicit);
        self.add_vertex(vertex.clone())?;
        Ok(vertex)
    }

    /// Creates an editing polyline prototype with one implicit point child.
    ///
    /// The polyline→point edge is wired before the polyline's added event
    /// fires, so observers never see the polyline in a childless state.
    pub fn create_polyline_prototype(
        &mut self,
        point_params: PointParams,
    ) -> Result<Vertex, EngineError> {
        let point = self.create_point_prototype(point_params, true)?;
        let kind = VertexKind::Polyline;
        let polyline = Vertex::prototype(self.fresh_id(&kind), kind, false);
        self.graph.add_vertex(polyline.clone())?;
        self.graph.add_edge(&polyline.id, &point.id)?;
        self.emit(GraphEvent::VertexAdded(polyline.clone()));
        Ok(polyline)
    }

    /// Creates an editing sphere prototype and adds it to the graph.
    pub fn create_sphere_prototype(
        &mut self,
        params: SphereParams,
    ) -> Result<Vertex, EngineError> {
        let kind = VertexKind::Sphere(params);
        let vertex = Vertex::prototype(self.fresh_id(&kind), kind, false);
        self.add_vertex(vertex.clone())?;
        Ok(vertex)
    }

    // -----------------------------------------------------------------------
    // Polyline mutations
    // -----------------------------------------------------------------------

    /// Appends a point to a polyline, creating an implicit point prototype
    /// when none is supplied. A supplied vertex must already be in the
    /// graph; only the edge is added.
    pub fn add_point_to_polyline(
        &mut self,
        polyline: &VertexId,
        point: Option<Vertex>,
    ) -> Result<Vertex, EngineError> {
        if !self.graph.contains(polyline) {
            return Err(GraphError::VertexNotFound {
                id: polyline.clone(),
            }
            .into());
        }
        let point = match point {
            Some(point) => point,
            None => self.create_point_prototype(PointParams::default(), true)?,
        };
        self.graph.add_edge(polyline, &point.id)?;
        Ok(point)
    }

    /// Removes the most recently added point of a polyline. Rejected before
    /// mutation when the polyline has no children left.
    pub fn remove_last_point_from_polyline(
        &mut self,
        polyline: &VertexId,
    ) -> Result<(), EngineError> {
        if !self.graph.contains(polyline) {
            return Err(GraphError::VertexNotFound {
                id: polyline.clone(),
            }
            .into());
        }
        let children = self.graph.outgoing_vertices_of(polyline);
        let last = children
            .last()
            .cloned()
            .ok_or_else(|| EngineError::InvariantViolation {
                reason: format!("cannot remove last point from empty polyline {}", polyline),
            })?;
        self.remove(&last)?;
        Ok(())
    }

    /// Adds `child` to the graph and links it under `parent`, wiring the
    /// edge before the added event fires.
    pub fn add_child_to(&mut self, parent: &VertexId, child: Vertex) -> Result<(), EngineError> {
        self.graph.add_vertex(child.clone())?;
        if let Err(err) = self.graph.add_edge(parent, &child.id) {
            // an unlinkable child must not stay behind
            let _ = self.graph.remove_vertex(&child.id);
            return Err(err.into());
        }
        self.emit(GraphEvent::VertexAdded(child));
        Ok(())
    }

    /// Adds a vertex and notifies observers.
    pub fn add_vertex(&mut self, vertex: Vertex) -> Result<(), EngineError> {
        self.graph.add_vertex(vertex.clone())?;
        self.emit(GraphEvent::VertexAdded(vertex));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Enters edit mode on a vertex: swaps it for an editing clone and
    /// records the original for cancel and commit-undo.
    ///
    /// Container kinds edit their structural children too, producing a
    /// simultaneously-editing set. A child that is already editing (e.g. a
    /// point shared with another polyline under edit) is not re-entered.
    pub fn edit(&mut self, id: &VertexId) -> Result<(), EngineError> {
        let original = self
            .graph
            .vertex_by_id(id)
            .cloned()
            .ok_or_else(|| GraphError::VertexNotFound { id: id.clone() })?;
        self.replace(id, original.clone_editing())?;
        self.originals.insert(id.clone(), original.clone());

        if original.kind.is_container() {
            let children = self.graph.outgoing_vertices_of(id);
            for child_id in children {
                let already_editing = self
                    .graph
                    .vertex_by_id(&child_id)
                    .map_or(true, |child| child.editing);
                if !already_editing {
                    self.edit(&child_id)?;
                }
            }
        }
        Ok(())
    }

    /// Replaces an editing vertex's parameter payload and triggers change
    /// propagation. Only editing vertices accept updates, and an update
    /// cannot change the vertex kind.
    pub fn update_parameters(
        &mut self,
        id: &VertexId,
        kind: VertexKind,
    ) -> Result<(), EngineError> {
        let vertex = self
            .graph
            .vertex_by_id_mut(id)
            .ok_or_else(|| GraphError::VertexNotFound { id: id.clone() })?;
        if !vertex.editing {
            return Err(EngineError::InvariantViolation {
                reason: format!("vertex {} is not being edited", id),
            });
        }
        if std::mem::discriminant(&vertex.kind) != std::mem::discriminant(&kind) {
            return Err(EngineError::InvariantViolation {
                reason: format!(
                    "parameter update cannot change vertex {} from {} to {}",
                    id,
                    vertex.kind.name(),
                    kind.name()
                ),
            });
        }
        vertex.kind = kind;
        self.notify_changed(id);
        Ok(())
    }

    /// Reverts an edit or removes a prototype.
    ///
    /// An editing vertex with a recorded original reverts to it -- a pure
    /// in-memory swap, no persistence. A brand-new prototype is removed,
    /// together with implicit children that are not themselves being
    /// edited and have no other parent.
    pub fn cancel(&mut self, id: &VertexId) -> Result<(), EngineError> {
        let mut removed = HashSet::new();
        self.cancel_inner(id, &mut removed)
    }

    fn cancel_inner(
        &mut self,
        id: &VertexId,
        removed: &mut HashSet<VertexId>,
    ) -> Result<(), EngineError> {
        if let Some(original) = self.originals.remove(id) {
            self.replace(id, original)?;
            return Ok(());
        }

        // Brand-new prototype: no original to restore. Sweep implicit
        // children first, checking parenthood against the live edge set.
        let children = self.graph.outgoing_vertices_of(id);
        for child_id in children {
            if removed.contains(&child_id) {
                continue;
            }
            let Some(child) = self.graph.vertex_by_id(&child_id) else {
                continue;
            };
            let eligible = child.implicit && !child.editing;
            if !eligible {
                continue;
            }
            let has_other_parent = self
                .graph
                .incoming_vertices_of(&child_id)
                .iter()
                .any(|parent| parent != id);
            if !has_other_parent {
                self.remove(&child_id)?;
                removed.insert(child_id);
            }
        }

        self.remove(id)?;
        removed.insert(id.clone());
        Ok(())
    }

    /// Cancels every currently-editing vertex. The removal dedup set spans
    /// the whole batch, so an implicit child shared by several canceled
    /// parents is considered once.
    pub fn cancel_if_editing(&mut self) -> Result<(), EngineError> {
        let editing: Vec<VertexId> = self
            .editing_vertices()
            .into_iter()
            .map(|vertex| vertex.id)
            .collect();
        let mut removed = HashSet::new();
        for id in editing {
            if removed.contains(&id) || !self.graph.contains(&id) {
                continue;
            }
            self.cancel_inner(&id, &mut removed)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Commit
    // -----------------------------------------------------------------------

    /// Commits the current editing set.
    ///
    /// Non-editing clones of every editing vertex are captured
    /// concurrently; only once the whole batch has succeeded are the
    /// editing vertices replaced, the edge snapshot persisted, and the
    /// command recorded. A capture failure aborts with the editing state
    /// intact; a snapshot failure rolls the replacements back. Commit is
    /// all-or-nothing at the replacement boundary.
    pub async fn commit_edit(&mut self) -> Result<Vec<Vertex>, EngineError> {
        let editing = self.editing_vertices();
        if editing.is_empty() {
            return Ok(Vec::new());
        }

        let mut originals = Vec::with_capacity(editing.len());
        for vertex in &editing {
            let original = self.originals.get(&vertex.id).cloned().ok_or_else(|| {
                EngineError::InvariantViolation {
                    reason: format!(
                        "vertex {} has no pre-edit original; commit the creation instead",
                        vertex.id
                    ),
                }
            })?;
            originals.push(original);
        }

        let mut committed: Vec<Vertex> =
            editing.iter().map(Vertex::clone_non_editing).collect();
        let store = self.store.clone();
        capture(store.as_ref(), &mut committed).await?;

        for (editing_vertex, committed_vertex) in editing.iter().zip(&committed) {
            self.replace(&editing_vertex.id, committed_vertex.clone())?;
        }
        for vertex in &editing {
            self.originals.remove(&vertex.id);
        }

        if let Err(err) = self.commit_snapshot().await {
            // restore the editing state so the caller can retry or cancel
            for (editing_vertex, original) in editing.iter().zip(&originals) {
                let _ = self.replace(&editing_vertex.id, editing_vertex.clone());
                self.originals
                    .insert(editing_vertex.id.clone(), original.clone());
            }
            return Err(err);
        }

        debug!(count = committed.len(), "committed editing set");
        self.commands.push(Command::CommitEdit {
            committed: committed.clone(),
            originals,
        });
        self.emit(GraphEvent::Committed(committed.clone()));
        Ok(committed)
    }

    /// Commits a single prototype vertex.
    ///
    /// Returns `Ok(None)` when the prototype left the graph while its
    /// capture was in flight -- the commit was superseded by a cancel, not
    /// an error. Implicit vertices are committed without a snapshot or a
    /// committed event; their explicit parent's commit covers both.
    pub async fn commit_create(
        &mut self,
        editing_vertex: &Vertex,
    ) -> Result<Option<Vertex>, EngineError> {
        if self.originals.contains_key(&editing_vertex.id) {
            return Err(EngineError::InvariantViolation {
                reason: format!(
                    "vertex {} has a pre-edit original; commit the edit instead",
                    editing_vertex.id
                ),
            });
        }

        let children = self.children_of(&editing_vertex.id);
        let mut committed = editing_vertex.clone_non_editing();
        let store = self.store.clone();
        capture(store.as_ref(), std::slice::from_mut(&mut committed)).await?;

        // The graph may have changed underneath the capture: a synchronous
        // cancel can remove the prototype before this continuation runs.
        if !self.graph.contains(&editing_vertex.id) {
            debug!(id = %editing_vertex.id, "commit superseded; prototype left the graph");
            return Ok(None);
        }

        self.replace(&editing_vertex.id, committed.clone())?;

        if !committed.implicit {
            if let Err(err) = self.commit_snapshot().await {
                let _ = self.replace(&committed.id, editing_vertex.clone());
                return Err(err);
            }
        }

        debug!(id = %committed.id, implicit = committed.implicit, "committed creation");
        self.commands.push(Command::CommitCreate {
            vertex: committed.clone(),
            children,
        });
        if !committed.implicit {
            self.emit(GraphEvent::Committed(vec![committed.clone()]));
        }
        Ok(Some(committed))
    }

    /// Commits the editing set when one exists.
    pub async fn commit_if_editing(&mut self) -> Result<Vec<Vertex>, EngineError> {
        if self.is_editing() {
            self.commit_edit().await
        } else {
            Ok(Vec::new())
        }
    }

    /// Persists the edge-list snapshot of the whole graph.
    async fn commit_snapshot(&self) -> Result<(), EngineError> {
        let snapshot = self.serialize();
        self.store
            .persist_snapshot(&snapshot)
            .await
            .map_err(|source| EngineError::SnapshotFailed { source })
    }

    // -----------------------------------------------------------------------
    // Undo / redo
    // -----------------------------------------------------------------------

    /// Reverts the most recent committed command with pure in-memory
    /// operations. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(command) = self.commands.undo().cloned() else {
            return false;
        };
        match command {
            Command::CommitCreate { vertex, children } => {
                if let Err(err) = self.remove(&vertex.id) {
                    warn!(%err, "undo: committed vertex already absent");
                }
                for child in &children {
                    if self.graph.contains(&child.id) {
                        if let Err(err) = self.remove(&child.id) {
                            warn!(%err, "undo: child removal failed");
                        }
                    }
                }
            }
            Command::CommitEdit {
                committed,
                originals,
            } => {
                for (committed_vertex, original) in committed.iter().zip(&originals) {
                    if let Err(err) = self.replace(&committed_vertex.id, original.clone()) {
                        warn!(%err, "undo: replacement target absent");
                    }
                }
            }
        }
        true
    }

    /// Re-applies the most recently undone command. Returns false when
    /// there is nothing to redo. No re-capture happens: the content was
    /// already persisted by the original commit.
    pub fn redo(&mut self) -> bool {
        let Some(command) = self.commands.redo().cloned() else {
            return false;
        };
        match command {
            Command::CommitCreate { vertex, children } => {
                for child in &children {
                    if !self.graph.contains(&child.id) {
                        if let Err(err) = self.add_vertex(child.clone()) {
                            warn!(%err, "redo: child re-add failed");
                        }
                    }
                }
                if let Err(err) = self.add_vertex(vertex.clone()) {
                    warn!(%err, "redo: vertex re-add failed");
                }
                // re-addition does not bring edges back; re-link the subtree
                for child in &children {
                    if let Err(err) = self.graph.add_edge(&vertex.id, &child.id) {
                        warn!(%err, "redo: edge re-link failed");
                    }
                }
            }
            Command::CommitEdit {
                committed,
                originals,
            } => {
                for (committed_vertex, original) in committed.iter().zip(&originals) {
                    if let Err(err) = self.replace(&original.id, committed_vertex.clone()) {
                        warn!(%err, "redo: replacement target absent");
                    }
                }
            }
        }
        true
    }

    /// True when a command can be undone.
    pub fn can_undo(&self) -> bool {
        self.commands.can_undo()
    }

    /// True when a command can be redone.
    pub fn can_redo(&self) -> bool {
        self.commands.can_redo()
    }

    /// Number of recorded commands, including any redo tail.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    // -----------------------------------------------------------------------
    // Change propagation
    // -----------------------------------------------------------------------

    /// Signals that a vertex's content changed, notifying every transitive
    /// ancestor. Each ancestor receives one descendant-changed event per
    /// graph path that reaches it, always referencing the vertex that
    /// originally changed.
    pub fn notify_changed(&mut self, id: &VertexId) {
        self.emit(GraphEvent::VertexChanged(id.clone()));
        let mut frontier: Vec<VertexId> = self.graph.incoming_vertices_of(id).into_vec();
        while let Some(ancestor) = frontier.pop() {
            self.emit(GraphEvent::DescendantChanged {
                ancestor: ancestor.clone(),
                descendant: id.clone(),
            });
            frontier.extend(self.graph.incoming_vertices_of(&ancestor));
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Looks up a vertex by id.
    pub fn vertex_by_id(&self, id: &VertexId) -> Option<&Vertex> {
        self.graph.vertex_by_id(id)
    }

    /// All vertices in insertion order.
    pub fn vertices(&self) -> Vec<&Vertex> {
        self.graph.vertices()
    }

    /// Resolved child vertices, one entry per edge, in edge order.
    pub fn children_of(&self, id: &VertexId) -> Vec<Vertex> {
        self.graph
            .outgoing_vertices_of(id)
            .iter()
            .filter_map(|child_id| self.graph.vertex_by_id(child_id).cloned())
            .collect()
    }

    /// Resolved parent vertices, one entry per edge, in edge order.
    pub fn parents_of(&self, id: &VertexId) -> Vec<Vertex> {
        self.graph
            .incoming_vertices_of(id)
            .iter()
            .filter_map(|parent_id| self.graph.vertex_by_id(parent_id).cloned())
            .collect()
    }

    /// All vertices currently flagged as editing, in insertion order.
    pub fn editing_vertices(&self) -> Vec<Vertex> {
        self.graph
            .vertices()
            .into_iter()
            .filter(|vertex| vertex.editing)
            .cloned()
            .collect()
    }

    /// True when any vertex is being edited.
    pub fn is_editing(&self) -> bool {
        self.graph.vertices().iter().any(|vertex| vertex.editing)
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Serializes the committed graph structure: each captured vertex's
    /// content hash mapped to the ordered content hashes of its children.
    ///
    /// Vertices without an assigned hash (editing clones, prototypes) have
    /// not been captured and are excluded, both as keys and as children --
    /// a content-addressed document may only reference captured content.
    pub fn serialize(&self) -> GraphSnapshot {
        let mut snapshot = GraphSnapshot::default();
        for vertex in self.graph.vertices() {
            let Some(hash) = vertex.content_hash.clone() else {
                continue;
            };
            let children = self
                .graph
                .outgoing_vertices_of(&vertex.id)
                .iter()
                .filter_map(|child_id| self.graph.vertex_by_id(child_id))
                .filter_map(|child| child.content_hash.clone())
                .collect();
            snapshot.edges.insert(hash, children);
        }
        snapshot
    }

    // -----------------------------------------------------------------------
    // Internal mutation helpers
    // -----------------------------------------------------------------------

    fn remove(&mut self, id: &VertexId) -> Result<Vertex, EngineError> {
        let removed = self.graph.remove_vertex(id)?;
        self.emit(GraphEvent::VertexRemoved(removed.clone()));
        Ok(removed)
    }

    fn replace(&mut self, id: &VertexId, replacement: Vertex) -> Result<Vertex, EngineError> {
        let new_id = replacement.id.clone();
        let old = self.graph.replace_vertex(id, replacement.clone())?;
        self.emit(GraphEvent::VertexReplaced {
            old: old.clone(),
            new: replacement,
        });
        // the replacement counts as a change of the vertex at that position
        self.notify_changed(&new_id);
        Ok(old)
    }
}
