//! The directed dependency graph of geometry vertices.
//!
//! [`DependencyGraph`] wraps a petgraph `StableGraph` together with an
//! insertion-ordered id → position map. The graph owns vertex identity
//! resolution; all structural mutation goes through its methods.
//!
//! Replacing a vertex swaps the payload stored at its graph position, so
//! every incident edge survives in both directions with its multiplicity --
//! this is what lets the engine swap committed vertices for editing clones
//! (and back) without ever touching the edge set.

use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use petgraph::{Directed, Direction};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::GraphError;
use crate::vertex::{Vertex, VertexId};

/// Neighbor id list. Most vertices have only a handful of edges.
pub type NeighborList = SmallVec<[VertexId; 4]>;

/// The set of vertices plus the set of directed parent→child edges.
///
/// Vertices iterate in insertion order; neighbor queries return one entry
/// per edge in edge insertion order. Neither order is semantically
/// significant beyond determinism for serialization diffing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    inner: StableGraph<Vertex, (), Directed, u32>,
    positions: IndexMap<VertexId, NodeIndex<u32>>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex. Fails if its id is already present.
    pub fn add_vertex(&mut self, vertex: Vertex) -> Result<(), GraphError> {
        if self.positions.contains_key(&vertex.id) {
            return Err(GraphError::DuplicateVertex {
                id: vertex.id.clone(),
            });
        }
        let id = vertex.id.clone();
        let idx = self.inner.add_node(vertex);
        self.positions.insert(id, idx);
        Ok(())
    }

    /// Removes a vertex and every incident edge, returning it.
    pub fn remove_vertex(&mut self, id: &VertexId) -> Result<Vertex, GraphError> {
        let idx = self
            .positions
            .shift_remove(id)
            .ok_or_else(|| GraphError::VertexNotFound { id: id.clone() })?;
        self.inner
            .remove_node(idx)
            .ok_or_else(|| GraphError::VertexNotFound { id: id.clone() })
    }

    /// Swaps the vertex stored at `id`'s graph position for `replacement`,
    /// preserving all incident edges, and returns the old vertex.
    ///
    /// The replacement may carry a different id; position resolution is
    /// updated either way. When the ids match (the editing/commit cycle),
    /// the vertex keeps its place in insertion order.
    pub fn replace_vertex(
        &mut self,
        id: &VertexId,
        replacement: Vertex,
    ) -> Result<Vertex, GraphError> {
        let idx = *self
            .positions
            .get(id)
            .ok_or_else(|| GraphError::VertexNotFound { id: id.clone() })?;
        let new_id = replacement.id.clone();
        let slot = self
            .inner
            .node_weight_mut(idx)
            .ok_or_else(|| GraphError::VertexNotFound { id: id.clone() })?;
        let old = std::mem::replace(slot, replacement);
        if new_id != *id {
            self.positions.shift_remove(id);
            self.positions.insert(new_id, idx);
        }
        Ok(old)
    }

    /// Adds a directed parent→child edge. Both endpoints must exist.
    /// Parallel edges are legal: a polyline may reference the same point
    /// more than once.
    pub fn add_edge(&mut self, parent: &VertexId, child: &VertexId) -> Result<(), GraphError> {
        let parent_idx = self.position(parent)?;
        let child_idx = self.position(child)?;
        self.inner.add_edge(parent_idx, child_idx, ());
        Ok(())
    }

    /// Looks up a vertex by id.
    pub fn vertex_by_id(&self, id: &VertexId) -> Option<&Vertex> {
        self.positions
            .get(id)
            .and_then(|&idx| self.inner.node_weight(idx))
    }

    /// Looks up a vertex by id, mutably (e.g. for parameter updates on an
    /// editing clone).
    pub fn vertex_by_id_mut(&mut self, id: &VertexId) -> Option<&mut Vertex> {
        let idx = *self.positions.get(id)?;
        self.inner.node_weight_mut(idx)
    }

    /// Returns true when the id resolves to a vertex.
    pub fn contains(&self, id: &VertexId) -> bool {
        self.positions.contains_key(id)
    }

    /// All vertices in insertion order.
    pub fn vertices(&self) -> Vec<&Vertex> {
        self.positions
            .values()
            .filter_map(|&idx| self.inner.node_weight(idx))
            .collect()
    }

    /// Child ids of `id`, one entry per edge, in edge insertion order.
    /// Empty when the vertex has no children or does not exist.
    pub fn outgoing_vertices_of(&self, id: &VertexId) -> NeighborList {
        self.neighbor_ids(id, Direction::Outgoing)
    }

    /// Parent ids of `id`, one entry per edge, in edge insertion order.
    /// Empty when the vertex has no parents or does not exist.
    pub fn incoming_vertices_of(&self, id: &VertexId) -> NeighborList {
        self.neighbor_ids(id, Direction::Incoming)
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    fn position(&self, id: &VertexId) -> Result<NodeIndex<u32>, GraphError> {
        self.positions
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::VertexNotFound { id: id.clone() })
    }

    fn neighbor_ids(&self, id: &VertexId, direction: Direction) -> NeighborList {
        let mut ids = NeighborList::new();
        if let Some(&idx) = self.positions.get(id) {
            for neighbor in self.inner.neighbors_directed(idx, direction) {
                if let Some(vertex) = self.inner.node_weight(neighbor) {
                    ids.push(vertex.id.clone());
                }
            }
            // neighbors_directed walks newest-edge-first
            ids.reverse();
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::{PointParams, VertexKind};

    fn point(id: &str) -> Vertex {
        Vertex::prototype(
            VertexId::from(id),
            VertexKind::Point(PointParams::default()),
            false,
        )
    }

    fn polyline(id: &str) -> Vertex {
        Vertex::prototype(VertexId::from(id), VertexKind::Polyline, false)
    }

    #[test]
    fn add_vertex_rejects_duplicate_id() {
        let mut graph = DependencyGraph::new();
        graph.add_vertex(point("a")).unwrap();

        let result = graph.add_vertex(point("a"));
        assert!(matches!(
            result,
            Err(GraphError::DuplicateVertex { id }) if id.as_str() == "a"
        ));
        assert_eq!(graph.vertex_count(), 1);
    }

    #[test]
    fn remove_vertex_rejects_missing_id() {
        let mut graph = DependencyGraph::new();
        let result = graph.remove_vertex(&VertexId::from("ghost"));
        assert!(matches!(result, Err(GraphError::VertexNotFound { .. })));
    }

    #[test]
    fn remove_vertex_drops_incident_edges() {
        let mut graph = DependencyGraph::new();
        graph.add_vertex(polyline("pl")).unwrap();
        graph.add_vertex(point("p0")).unwrap();
        graph.add_vertex(point("p1")).unwrap();
        graph
            .add_edge(&VertexId::from("pl"), &VertexId::from("p0"))
            .unwrap();
        graph
            .add_edge(&VertexId::from("pl"), &VertexId::from("p1"))
            .unwrap();

        graph.remove_vertex(&VertexId::from("p0")).unwrap();

        assert_eq!(graph.edge_count(), 1);
        let children = graph.outgoing_vertices_of(&VertexId::from("pl"));
        assert_eq!(children.as_slice(), &[VertexId::from("p1")]);
    }

    #[test]
    fn add_edge_requires_both_endpoints() {
        let mut graph = DependencyGraph::new();
        graph.add_vertex(point("a")).unwrap();

        let result = graph.add_edge(&VertexId::from("a"), &VertexId::from("b"));
        assert!(matches!(result, Err(GraphError::VertexNotFound { .. })));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn parallel_edges_are_preserved() {
        let mut graph = DependencyGraph::new();
        graph.add_vertex(polyline("pl")).unwrap();
        graph.add_vertex(point("p")).unwrap();
        let pl = VertexId::from("pl");
        let p = VertexId::from("p");
        graph.add_edge(&pl, &p).unwrap();
        graph.add_edge(&pl, &p).unwrap();

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.outgoing_vertices_of(&pl).len(), 2);
        assert_eq!(graph.incoming_vertices_of(&p).len(), 2);
    }

    #[test]
    fn replace_vertex_rewires_neighbor_queries() {
        let mut graph = DependencyGraph::new();
        graph.add_vertex(polyline("pl")).unwrap();
        graph.add_vertex(point("p")).unwrap();
        let pl = VertexId::from("pl");
        let p = VertexId::from("p");
        graph.add_edge(&pl, &p).unwrap();

        // Same id, new payload: the editing/commit cycle.
        let replacement = graph.vertex_by_id(&p).unwrap().clone_editing();
        let old = graph.replace_vertex(&p, replacement.clone()).unwrap();
        assert!(old.proto);

        let children = graph.outgoing_vertices_of(&pl);
        assert_eq!(children.as_slice(), &[p.clone()]);
        assert!(graph.vertex_by_id(&p).unwrap().editing);
        assert!(!graph.vertex_by_id(&p).unwrap().proto);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn replace_vertex_with_new_id_updates_resolution() {
        let mut graph = DependencyGraph::new();
        graph.add_vertex(polyline("pl")).unwrap();
        graph.add_vertex(point("old")).unwrap();
        let pl = VertexId::from("pl");
        graph.add_edge(&pl, &VertexId::from("old")).unwrap();

        graph
            .replace_vertex(&VertexId::from("old"), point("new"))
            .unwrap();

        assert!(graph.vertex_by_id(&VertexId::from("old")).is_none());
        assert!(graph.vertex_by_id(&VertexId::from("new")).is_some());
        let children = graph.outgoing_vertices_of(&pl);
        assert_eq!(children.as_slice(), &[VertexId::from("new")]);
    }

    #[test]
    fn replace_vertex_rejects_missing_id() {
        let mut graph = DependencyGraph::new();
        let result = graph.replace_vertex(&VertexId::from("ghost"), point("x"));
        assert!(matches!(result, Err(GraphError::VertexNotFound { .. })));
    }

    #[test]
    fn vertices_iterate_in_insertion_order() {
        let mut graph = DependencyGraph::new();
        graph.add_vertex(point("c")).unwrap();
        graph.add_vertex(point("a")).unwrap();
        graph.add_vertex(point("b")).unwrap();

        let ids: Vec<&str> = graph.vertices().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn same_id_replacement_keeps_insertion_position() {
        let mut graph = DependencyGraph::new();
        graph.add_vertex(point("a")).unwrap();
        graph.add_vertex(point("b")).unwrap();
        graph.add_vertex(point("c")).unwrap();

        let replacement = graph
            .vertex_by_id(&VertexId::from("b"))
            .unwrap()
            .clone_editing();
        graph
            .replace_vertex(&VertexId::from("b"), replacement)
            .unwrap();

        let ids: Vec<&str> = graph.vertices().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn children_come_back_in_edge_insertion_order() {
        let mut graph = DependencyGraph::new();
        graph.add_vertex(polyline("pl")).unwrap();
        for id in ["p0", "p1", "p2"] {
            graph.add_vertex(point(id)).unwrap();
            graph
                .add_edge(&VertexId::from("pl"), &VertexId::from(id))
                .unwrap();
        }

        let children = graph.outgoing_vertices_of(&VertexId::from("pl"));
        let ids: Vec<&str> = children.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["p0", "p1", "p2"]);
    }

    #[test]
    fn neighbor_queries_on_missing_vertex_are_empty() {
        let graph = DependencyGraph::new();
        assert!(graph.outgoing_vertices_of(&VertexId::from("ghost")).is_empty());
        assert!(graph.incoming_vertices_of(&VertexId::from("ghost")).is_empty());
    }

    #[test]
    fn shared_child_has_two_parents() {
        let mut graph = DependencyGraph::new();
        graph.add_vertex(polyline("a")).unwrap();
        graph.add_vertex(polyline("b")).unwrap();
        graph.add_vertex(point("p")).unwrap();
        let p = VertexId::from("p");
        graph.add_edge(&VertexId::from("a"), &p).unwrap();
        graph.add_edge(&VertexId::from("b"), &p).unwrap();

        let parents = graph.incoming_vertices_of(&p);
        assert_eq!(
            parents.as_slice(),
            &[VertexId::from("a"), VertexId::from("b")]
        );
    }

    #[test]
    fn serde_roundtrip_preserves_structure() {
        let mut graph = DependencyGraph::new();
        graph.add_vertex(polyline("pl")).unwrap();
        graph.add_vertex(point("p")).unwrap();
        graph
            .add_edge(&VertexId::from("pl"), &VertexId::from("p"))
            .unwrap();

        let json = serde_json::to_string(&graph).unwrap();
        let back: DependencyGraph = serde_json::from_str(&json).unwrap();

        assert_eq!(back.vertex_count(), 2);
        assert_eq!(back.edge_count(), 1);
        assert_eq!(
            back.outgoing_vertices_of(&VertexId::from("pl")).as_slice(),
            &[VertexId::from("p")]
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        const VERTEX_COUNT: usize = 6;

        fn id_of(n: usize) -> VertexId {
            VertexId::new(format!("v{}", n))
        }

        proptest! {
            /// Replacing a vertex (same id, new payload) never changes any
            /// neighbor query anywhere in the graph.
            #[test]
            fn replacement_preserves_all_neighborhoods(
                edges in proptest::collection::vec(
                    (0..VERTEX_COUNT, 0..VERTEX_COUNT), 0..20),
                target in 0..VERTEX_COUNT,
            ) {
                let mut graph = DependencyGraph::new();
                for n in 0..VERTEX_COUNT {
                    graph.add_vertex(point(&format!("v{}", n))).unwrap();
                }
                for (parent, child) in &edges {
                    graph.add_edge(&id_of(*parent), &id_of(*child)).unwrap();
                }

                let before: Vec<(NeighborList, NeighborList)> = (0..VERTEX_COUNT)
                    .map(|n| {
                        (
                            graph.outgoing_vertices_of(&id_of(n)),
                            graph.incoming_vertices_of(&id_of(n)),
                        )
                    })
                    .collect();

                let replacement = graph
                    .vertex_by_id(&id_of(target))
                    .unwrap()
                    .clone_editing();
                graph.replace_vertex(&id_of(target), replacement).unwrap();

                for n in 0..VERTEX_COUNT {
                    prop_assert_eq!(
                        &graph.outgoing_vertices_of(&id_of(n)),
                        &before[n].0
                    );
                    prop_assert_eq!(
                        &graph.incoming_vertices_of(&id_of(n)),
                        &before[n].1
                    );
                }
            }
        }
    }
}
