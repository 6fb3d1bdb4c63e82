//! Intermediate representation for covered-bin geometry.
//!
//! This crate defines the DAG-based IR that the `coverbin` engine emits and
//! an external renderer consumes. Both 2D cross-sections and 3D solids live
//! in the same graph; extrusion nodes are the bridge between the two.
//!
//! The IR is purely declarative: no mesh data, just a graph of operations.
//! Evaluation (meshing) is handled separately by the renderer.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

pub mod scad;

pub use scad::to_scad;

/// Unique identifier for a node in the IR graph.
pub type NodeId = u64;

/// Errors raised while inspecting or serializing a document.
#[derive(Error, Debug)]
pub enum IrError {
    /// A node references a child that is not in the document.
    #[error("node {parent} references missing node {child}")]
    MissingNode {
        /// Referencing node.
        parent: NodeId,
        /// Missing child.
        child: NodeId,
    },
    /// A scene entry points at a node that is not in the document.
    #[error("scene root {0} is not a node of the document")]
    MissingRoot(NodeId),
    /// The graph contains a cycle.
    #[error("cycle detected at node {0}")]
    Cycle(NodeId),
    /// JSON (de)serialization failed.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// 2D vector with f64 components (millimeters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
}

impl Vec2 {
    /// Create a new Vec2.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 3D vector with f64 components (conventionally millimeters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// Create a new Vec3.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// CSG operation, the core building block of the IR DAG.
///
/// Each variant is either a leaf primitive or a combining/transform operation
/// that references child nodes by [`NodeId`]. Transforms and booleans apply to
/// 2D and 3D children alike; 2D nodes use `z = 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CsgOp {
    /// Axis-aligned rectangle centered at origin (2D).
    Rect {
        /// Size along X and Y.
        size: Vec2,
    },
    /// Circle centered at origin (2D).
    Circle {
        /// Radius.
        radius: f64,
        /// Number of segments (0 = auto).
        segments: u32,
    },
    /// Closed polygon (2D), counter-clockwise.
    Polygon {
        /// Vertices in order.
        points: Vec<Vec2>,
    },
    /// Rounded offset of a 2D child by a signed distance.
    Offset {
        /// Child profile.
        child: NodeId,
        /// Positive expands, negative contracts.
        delta: f64,
    },
    /// Axis-aligned box centered at origin.
    Cube {
        /// Size along each axis.
        size: Vec3,
    },
    /// Cylinder along the Z axis, centered at origin.
    Cylinder {
        /// Radius of the cylinder.
        radius: f64,
        /// Height of the cylinder.
        height: f64,
        /// Number of circular segments (0 = auto).
        segments: u32,
    },
    /// Empty geometry (identity for union).
    Empty,
    /// Boolean union of two geometries.
    Union {
        /// Left operand.
        left: NodeId,
        /// Right operand.
        right: NodeId,
    },
    /// Boolean difference (left minus right).
    Difference {
        /// Left operand (base).
        left: NodeId,
        /// Right operand (subtracted).
        right: NodeId,
    },
    /// Boolean intersection of two geometries.
    Intersection {
        /// Left operand.
        left: NodeId,
        /// Right operand.
        right: NodeId,
    },
    /// Translation by an offset vector.
    Translate {
        /// Child node to translate.
        child: NodeId,
        /// Translation offset.
        offset: Vec3,
    },
    /// Rotation by Euler angles in degrees (applied as X, then Y, then Z).
    Rotate {
        /// Child node to rotate.
        child: NodeId,
        /// Rotation angles in degrees.
        angles: Vec3,
    },
    /// Non-uniform scale. Negative factors mirror.
    Scale {
        /// Child node to scale.
        child: NodeId,
        /// Scale factors per axis.
        factor: Vec3,
    },
    /// Extrusion of a 2D profile along +Z from `z = 0` to `z = height`.
    LinearExtrude {
        /// Profile node.
        profile: NodeId,
        /// Extrusion height.
        height: f64,
    },
    /// Revolution of a 2D profile (x = radius, y = height) about Z,
    /// sweeping counter-clockwise from +X.
    RotateExtrude {
        /// Profile node.
        profile: NodeId,
        /// Sweep angle in degrees.
        angle: f64,
        /// Number of segments for a full turn (0 = auto).
        segments: u32,
    },
    /// `count[0] × count[1]` copies of a child on a grid centered at origin.
    GridPattern {
        /// Child node to replicate.
        child: NodeId,
        /// Copies along X and Y.
        count: [u32; 2],
        /// Spacing along X and Y.
        pitch: Vec2,
    },
}

impl CsgOp {
    /// Child node ids referenced by this operation, in operand order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            CsgOp::Union { left, right }
            | CsgOp::Difference { left, right }
            | CsgOp::Intersection { left, right } => vec![*left, *right],
            CsgOp::Offset { child, .. }
            | CsgOp::Translate { child, .. }
            | CsgOp::Rotate { child, .. }
            | CsgOp::Scale { child, .. }
            | CsgOp::GridPattern { child, .. } => vec![*child],
            CsgOp::LinearExtrude { profile, .. } | CsgOp::RotateExtrude { profile, .. } => {
                vec![*profile]
            }
            CsgOp::Rect { .. }
            | CsgOp::Circle { .. }
            | CsgOp::Polygon { .. }
            | CsgOp::Cube { .. }
            | CsgOp::Cylinder { .. }
            | CsgOp::Empty => vec![],
        }
    }

    /// Short operation name, used for summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            CsgOp::Rect { .. } => "rect",
            CsgOp::Circle { .. } => "circle",
            CsgOp::Polygon { .. } => "polygon",
            CsgOp::Offset { .. } => "offset",
            CsgOp::Cube { .. } => "cube",
            CsgOp::Cylinder { .. } => "cylinder",
            CsgOp::Empty => "empty",
            CsgOp::Union { .. } => "union",
            CsgOp::Difference { .. } => "difference",
            CsgOp::Intersection { .. } => "intersection",
            CsgOp::Translate { .. } => "translate",
            CsgOp::Rotate { .. } => "rotate",
            CsgOp::Scale { .. } => "scale",
            CsgOp::LinearExtrude { .. } => "linear_extrude",
            CsgOp::RotateExtrude { .. } => "rotate_extrude",
            CsgOp::GridPattern { .. } => "grid_pattern",
        }
    }
}

/// A node in the IR graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier.
    pub id: NodeId,
    /// Optional human-readable name.
    pub name: Option<String>,
    /// The operation this node represents.
    pub op: CsgOp,
}

/// Display material for a scene part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    /// Material name (e.g. "bin", "lid").
    pub name: String,
    /// Base color as `[r, g, b]` in 0.0..1.0.
    pub color: [f64; 3],
}

/// An entry in the scene: a root node with an assigned material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntry {
    /// Part name (e.g. "bin").
    pub name: String,
    /// Root node of this scene part.
    pub root: NodeId,
    /// Material key referencing a [`MaterialDef::name`].
    pub material: String,
}

/// A covered-bin document: the IR DAG plus the parts to render.
///
/// Maps are ordered so that serialization is byte-for-byte reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Format version string (e.g. "0.1").
    pub version: String,
    /// All nodes in the graph, keyed by [`NodeId`].
    pub nodes: BTreeMap<NodeId, Node>,
    /// Material definitions, keyed by name.
    pub materials: BTreeMap<String, MaterialDef>,
    /// Scene entries (output parts with materials).
    pub roots: Vec<SceneEntry>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            nodes: BTreeMap::new(),
            materials: BTreeMap::new(),
            roots: Vec::new(),
        }
    }
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, IrError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, IrError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check that every reference resolves and the graph is acyclic.
    pub fn validate(&self) -> Result<(), IrError> {
        for entry in &self.roots {
            if !self.nodes.contains_key(&entry.root) {
                return Err(IrError::MissingRoot(entry.root));
            }
        }
        self.topological_order().map(|_| ())
    }

    /// Node ids ordered so that children precede their parents.
    ///
    /// Scene roots are visited first (in scene order), then any orphans.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, IrError> {
        let mut result = Vec::with_capacity(self.nodes.len());
        let mut visited = HashSet::new();
        let mut in_progress = HashSet::new();

        fn visit(
            id: NodeId,
            doc: &Document,
            visited: &mut HashSet<NodeId>,
            in_progress: &mut HashSet<NodeId>,
            result: &mut Vec<NodeId>,
        ) -> Result<(), IrError> {
            if visited.contains(&id) {
                return Ok(());
            }
            if !in_progress.insert(id) {
                return Err(IrError::Cycle(id));
            }
            if let Some(node) = doc.nodes.get(&id) {
                for child in node.op.children() {
                    if !doc.nodes.contains_key(&child) {
                        return Err(IrError::MissingNode { parent: id, child });
                    }
                    visit(child, doc, visited, in_progress, result)?;
                }
            }
            in_progress.remove(&id);
            visited.insert(id);
            result.push(id);
            Ok(())
        }

        for entry in &self.roots {
            visit(entry.root, self, &mut visited, &mut in_progress, &mut result)?;
        }
        for &id in self.nodes.keys() {
            visit(id, self, &mut visited, &mut in_progress, &mut result)?;
        }
        Ok(result)
    }

    /// Count nodes per operation kind.
    pub fn op_histogram(&self) -> BTreeMap<&'static str, usize> {
        let mut hist = BTreeMap::new();
        for node in self.nodes.values() {
            *hist.entry(node.op.kind()).or_insert(0) += 1;
        }
        hist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plate_with_hole() -> Document {
        let mut doc = Document::new();
        doc.nodes.insert(
            1,
            Node {
                id: 1,
                name: Some("plate".to_string()),
                op: CsgOp::Cube {
                    size: Vec3::new(10.0, 20.0, 3.0),
                },
            },
        );
        doc.nodes.insert(
            2,
            Node {
                id: 2,
                name: Some("hole".to_string()),
                op: CsgOp::Cylinder {
                    radius: 2.0,
                    height: 10.0,
                    segments: 0,
                },
            },
        );
        doc.nodes.insert(
            3,
            Node {
                id: 3,
                name: None,
                op: CsgOp::Difference { left: 1, right: 2 },
            },
        );
        doc.materials.insert(
            "bin".to_string(),
            MaterialDef {
                name: "bin".to_string(),
                color: [0.2, 0.5, 0.8],
            },
        );
        doc.roots.push(SceneEntry {
            name: "plate".to_string(),
            root: 3,
            material: "bin".to_string(),
        });
        doc
    }

    #[test]
    fn roundtrip_document() {
        let doc = plate_with_hole();
        let json = doc.to_json().expect("serialize");
        let restored = Document::from_json(&json).expect("deserialize");

        assert_eq!(doc, restored);
        assert_eq!(restored.nodes.len(), 3);
        assert_eq!(restored.materials.len(), 1);
        assert_eq!(restored.roots.len(), 1);
    }

    #[test]
    fn serialization_is_stable() {
        let a = plate_with_hole().to_json().unwrap();
        let b = plate_with_hole().to_json().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_json_is_an_ir_error() {
        assert!(matches!(
            Document::from_json("{\"version\": 3"),
            Err(IrError::Json(_))
        ));
    }

    #[test]
    fn empty_document() {
        let doc = Document::new();
        assert_eq!(doc.version, "0.1");
        assert!(doc.nodes.is_empty());
        assert!(doc.materials.is_empty());
        assert!(doc.roots.is_empty());
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn serde_tagged_enum() {
        let op = CsgOp::LinearExtrude {
            profile: 4,
            height: 2.5,
        };
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains(r#""type":"LinearExtrude""#));

        let restored: CsgOp = serde_json::from_str(&json).unwrap();
        assert_eq!(op, restored);
    }

    #[test]
    fn topological_order_puts_children_first() {
        let doc = plate_with_hole();
        let order = doc.topological_order().unwrap();
        let pos = |id| order.iter().position(|&x| x == id).unwrap();
        assert!(pos(1) < pos(3));
        assert!(pos(2) < pos(3));
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn validate_reports_missing_child() {
        let mut doc = plate_with_hole();
        doc.nodes.remove(&2);
        assert!(matches!(
            doc.validate(),
            Err(IrError::MissingNode {
                parent: 3,
                child: 2
            })
        ));
    }

    #[test]
    fn validate_reports_cycle() {
        let mut doc = Document::new();
        doc.nodes.insert(
            1,
            Node {
                id: 1,
                name: None,
                op: CsgOp::Offset {
                    child: 2,
                    delta: 1.0,
                },
            },
        );
        doc.nodes.insert(
            2,
            Node {
                id: 2,
                name: None,
                op: CsgOp::Offset {
                    child: 1,
                    delta: 1.0,
                },
            },
        );
        assert!(matches!(doc.validate(), Err(IrError::Cycle(_))));
    }

    #[test]
    fn histogram_counts_kinds() {
        let hist = plate_with_hole().op_histogram();
        assert_eq!(hist["cube"], 1);
        assert_eq!(hist["cylinder"], 1);
        assert_eq!(hist["difference"], 1);
    }
}
