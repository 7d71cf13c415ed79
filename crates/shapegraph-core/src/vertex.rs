//! The geometry vertex model: identity, lifecycle flags, and the closed
//! set of node kinds.
//!
//! A [`Vertex`] is one geometric entity in the dependency graph. Its
//! lifecycle runs prototype → editing → committed: prototypes and editing
//! clones carry `editing=true` and no content hash; committing captures the
//! vertex through the persistence collaborator, which assigns the hash.
//! Graph logic depends only on the common fields (`id`, `editing`, `proto`,
//! `implicit`) plus [`VertexKind::is_container`] -- never on the parameter
//! payloads themselves.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable vertex identity within a geometry graph.
///
/// Assigned once at prototype creation and shared across the lifecycle: an
/// editing clone and the committed vertex that replaces it carry the id of
/// the vertex they stand in for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(String);

impl VertexId {
    /// Creates an id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        VertexId(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VertexId {
    fn from(id: &str) -> Self {
        VertexId(id.to_string())
    }
}

/// Opaque content identifier assigned by the persistence collaborator.
///
/// Equal canonical content always maps to the same identifier, which is
/// what makes the edge snapshot a content-addressed document. A vertex has
/// no hash until its first successful capture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wraps an identifier returned by a collaborator.
    pub fn new(hash: impl Into<String>) -> Self {
        ContentHash(hash.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 3D coordinate triple used by vertex parameter payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Origin {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Origin { x, y, z }
    }
}

/// Parameters for a point vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointParams {
    pub origin: Origin,
}

/// Parameters for a sphere vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereParams {
    pub origin: Origin,
    pub radius: f64,
}

/// The closed set of geometry node kinds.
///
/// Polylines are containers: their points are structural children in the
/// graph rather than parameters, and editing a polyline edits its points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VertexKind {
    Point(PointParams),
    Polyline,
    Sphere(SphereParams),
}

impl VertexKind {
    /// Returns the kind name, also used as the id prefix for fresh
    /// prototypes ("point0", "polyline1", ...).
    pub fn name(&self) -> &'static str {
        match self {
            VertexKind::Point(_) => "point",
            VertexKind::Polyline => "polyline",
            VertexKind::Sphere(_) => "sphere",
        }
    }

    /// Container kinds edit their structural children together.
    pub fn is_container(&self) -> bool {
        matches!(self, VertexKind::Polyline)
    }
}

/// A node in the geometry dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Stable identity within the graph.
    pub id: VertexId,
    /// Content identifier from the last successful capture, `None` before.
    /// Invariant: a non-editing vertex in the graph always has a hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<ContentHash>,
    /// Is this a live-edit clone?
    pub editing: bool,
    /// Is this an uncommitted, newly created prototype?
    pub proto: bool,
    /// Was this vertex auto-created as a structural child (e.g. a
    /// polyline's point) rather than explicitly by the user?
    pub implicit: bool,
    /// Node kind and type-specific parameters.
    pub kind: VertexKind,
}

impl Vertex {
    /// Creates a prototype vertex: editing, uncommitted, no content hash.
    pub fn prototype(id: VertexId, kind: VertexKind, implicit: bool) -> Self {
        Vertex {
            id,
            content_hash: None,
            editing: true,
            proto: true,
            implicit,
            kind,
        }
    }

    /// Clones this vertex into a live-edit replacement sharing its id.
    pub fn clone_editing(&self) -> Self {
        Vertex {
            content_hash: None,
            editing: true,
            proto: false,
            ..self.clone()
        }
    }

    /// Clones this vertex into the non-editing form handed to capture.
    /// The hash is cleared; capture assigns a fresh one.
    pub fn clone_non_editing(&self) -> Self {
        Vertex {
            content_hash: None,
            editing: false,
            proto: false,
            ..self.clone()
        }
    }

    /// Canonical JSON representation sent to the capture collaborator.
    ///
    /// Carries identity, the implicit flag, and the kind tag with its
    /// parameters. The lifecycle flags (always false at capture time) and
    /// the hash itself are excluded. `serde_json` orders map keys, so equal
    /// content always produces the same document.
    pub fn canonical(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert(
            "id".to_string(),
            serde_json::Value::String(self.id.to_string()),
        );
        map.insert(
            "implicit".to_string(),
            serde_json::Value::Bool(self.implicit),
        );
        let kind = serde_json::to_value(&self.kind)
            .expect("vertex kind serialization should never fail");
        if let serde_json::Value::Object(fields) = kind {
            map.extend(fields);
        }
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str) -> Vertex {
        Vertex::prototype(
            VertexId::from(id),
            VertexKind::Point(PointParams {
                origin: Origin::new(1.0, 2.0, 3.0),
            }),
            false,
        )
    }

    #[test]
    fn prototype_flags() {
        let v = point("point0");
        assert!(v.editing);
        assert!(v.proto);
        assert!(!v.implicit);
        assert!(v.content_hash.is_none());
    }

    #[test]
    fn clone_editing_keeps_id_and_drops_proto() {
        let mut committed = point("point0").clone_non_editing();
        committed.content_hash = Some(ContentHash::new("abc"));

        let editing = committed.clone_editing();
        assert_eq!(editing.id, committed.id);
        assert!(editing.editing);
        assert!(!editing.proto);
        assert!(editing.content_hash.is_none());
    }

    #[test]
    fn clone_non_editing_clears_lifecycle_state() {
        let v = point("point0").clone_non_editing();
        assert!(!v.editing);
        assert!(!v.proto);
        assert!(v.content_hash.is_none());
    }

    #[test]
    fn canonical_is_deterministic_and_excludes_lifecycle() {
        let v = point("point0");
        let a = serde_json::to_string(&v.canonical()).unwrap();
        let b = serde_json::to_string(&v.canonical()).unwrap();
        assert_eq!(a, b);
        assert!(a.contains("\"type\":\"point\""));
        assert!(a.contains("\"id\":\"point0\""));
        assert!(!a.contains("editing"));
        assert!(!a.contains("proto"));
    }

    #[test]
    fn canonical_differs_on_parameter_change() {
        let a = point("point0");
        let mut b = point("point0");
        b.kind = VertexKind::Point(PointParams {
            origin: Origin::new(9.0, 2.0, 3.0),
        });
        assert_ne!(a.canonical(), b.canonical());
    }

    #[test]
    fn container_kinds() {
        assert!(VertexKind::Polyline.is_container());
        assert!(!VertexKind::Point(PointParams::default()).is_container());
        assert!(!VertexKind::Sphere(SphereParams {
            origin: Origin::default(),
            radius: 10.0,
        })
        .is_container());
    }

    #[test]
    fn kind_names() {
        assert_eq!(VertexKind::Polyline.name(), "polyline");
        assert_eq!(VertexKind::Point(PointParams::default()).name(), "point");
    }

    #[test]
    fn serde_roundtrip() {
        let mut v = point("point3").clone_non_editing();
        v.content_hash = Some(ContentHash::new("deadbeef"));
        let json = serde_json::to_string(&v).unwrap();
        let back: Vertex = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }

    #[test]
    fn vertex_id_display_is_transparent() {
        assert_eq!(format!("{}", VertexId::from("sphere7")), "sphere7");
        let json = serde_json::to_string(&VertexId::from("sphere7")).unwrap();
        assert_eq!(json, "\"sphere7\"");
    }
}
