#![warn(missing_docs)]

//! coverbin: parametric storage bins with fitted lids.
//!
//! Compiles a [`BuildParameters`] value into immutable CSG descriptions of a
//! grid bin and a lid that mate through a tolerance-stacked lip and snap tabs.
//! Geometry is never meshed here; the result is lowered to a
//! [`coverbin_ir::Document`] for an external renderer.
//!
//! # Example
//!
//! ```rust,no_run
//! use coverbin::{build, BuildParameters, Part};
//!
//! let params = BuildParameters {
//!     divx: 3,
//!     divy: 2,
//!     part: Part::BothClosed,
//!     ..BuildParameters::default()
//! };
//! let output = build(&params);
//! let scad = coverbin_ir::to_scad(&output.to_document()).unwrap();
//! std::fs::write("bin.scad", scad).unwrap();
//! ```

use coverbin_ir::{CsgOp, Document, MaterialDef, Node, NodeId, SceneEntry};
use nalgebra::{Point2, Vector2, Vector3};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub mod assembly;
pub mod classify;
pub mod config;
pub mod error;
pub mod fit;
pub mod grip;
pub mod params;
pub mod pockets;
pub mod profile;
pub mod tolerance;

pub use assembly::{build, BuildOutput, CoveredBin};
pub use config::{PresetFile, RawParameters};
pub use error::{ConfigError, Result};
pub use params::{BuildParameters, GripMode, HeightMode, HeightSpec, InteriorStyle, Part};
pub use profile::{Footprint, GridContext, GridProfiles, ProfileProvider};
pub use tolerance::{resolve, ToleranceSet};

// =============================================================================
// 2D profiles
// =============================================================================

/// Operation at the root of a [`Profile`].
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum ProfileOp {
    /// Nothing (identity for union).
    Empty,
    /// Rectangle centered at origin.
    Rect { size: Vector2<f64> },
    /// Circle centered at origin.
    Circle { radius: f64, segments: u32 },
    /// Closed polygon.
    Polygon { points: Vec<Point2<f64>> },
    /// Rounded signed offset.
    Offset { child: Profile, delta: f64 },
    Translate { child: Profile, offset: Vector2<f64> },
    /// Rotation about the origin, degrees counter-clockwise.
    Rotate { child: Profile, degrees: f64 },
    Scale { child: Profile, factor: Vector2<f64> },
    Union(Profile, Profile),
    Difference(Profile, Profile),
    Intersection(Profile, Profile),
    /// Centered `count[0] × count[1]` replication.
    GridPattern {
        child: Profile,
        count: [u32; 2],
        pitch: Vector2<f64>,
    },
}

#[derive(Debug, PartialEq)]
struct ProfileNode {
    name: Option<String>,
    op: ProfileOp,
}

/// An immutable closed 2D cross-section.
///
/// Cloning is cheap: children are shared by reference, so a profile consumed
/// by several builders is the same value everywhere it appears.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile(Arc<ProfileNode>);

impl Profile {
    fn from_op(op: ProfileOp) -> Self {
        Self(Arc::new(ProfileNode { name: None, op }))
    }

    /// The empty profile.
    pub fn empty() -> Self {
        Self::from_op(ProfileOp::Empty)
    }

    /// Rectangle of `width × height` centered at origin.
    pub fn rect(width: f64, height: f64) -> Self {
        Self::from_op(ProfileOp::Rect {
            size: Vector2::new(width, height),
        })
    }

    /// Circle centered at origin.
    pub fn circle(radius: f64, segments: u32) -> Self {
        Self::from_op(ProfileOp::Circle { radius, segments })
    }

    /// Polygon through `points`, implicitly closed.
    pub fn polygon(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self::from_op(ProfileOp::Polygon {
            points: points
                .into_iter()
                .map(|(x, y)| Point2::new(x, y))
                .collect(),
        })
    }

    /// Attach a human-readable name (carried into the IR).
    pub fn named(&self, name: impl Into<String>) -> Self {
        Self(Arc::new(ProfileNode {
            name: Some(name.into()),
            op: self.0.op.clone(),
        }))
    }

    /// Name of this node, if any.
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// Root operation.
    pub fn op(&self) -> &ProfileOp {
        &self.0.op
    }

    /// Whether this profile is structurally empty.
    pub fn is_empty(&self) -> bool {
        matches!(self.0.op, ProfileOp::Empty)
    }

    /// Rounded offset; positive grows, negative shrinks. Zero is a no-op.
    pub fn offset(&self, delta: f64) -> Self {
        if delta == 0.0 || self.is_empty() {
            return self.clone();
        }
        Self::from_op(ProfileOp::Offset {
            child: self.clone(),
            delta,
        })
    }

    /// Translate in the plane.
    pub fn translate(&self, x: f64, y: f64) -> Self {
        Self::from_op(ProfileOp::Translate {
            child: self.clone(),
            offset: Vector2::new(x, y),
        })
    }

    /// Rotate about the origin (degrees, counter-clockwise).
    pub fn rotate(&self, degrees: f64) -> Self {
        Self::from_op(ProfileOp::Rotate {
            child: self.clone(),
            degrees,
        })
    }

    /// Scale per axis; negative factors mirror.
    pub fn scale(&self, x: f64, y: f64) -> Self {
        Self::from_op(ProfileOp::Scale {
            child: self.clone(),
            factor: Vector2::new(x, y),
        })
    }

    /// Mirror across the Y axis (`x → -x`).
    pub fn mirror_x(&self) -> Self {
        self.scale(-1.0, 1.0)
    }

    /// Boolean union.
    pub fn union(&self, other: &Profile) -> Self {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => other.clone(),
            (_, true) => self.clone(),
            _ => Self::from_op(ProfileOp::Union(self.clone(), other.clone())),
        }
    }

    /// Boolean difference (self - other).
    pub fn difference(&self, other: &Profile) -> Self {
        if self.is_empty() || other.is_empty() {
            return self.clone();
        }
        Self::from_op(ProfileOp::Difference(self.clone(), other.clone()))
    }

    /// Boolean intersection.
    pub fn intersection(&self, other: &Profile) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::empty();
        }
        Self::from_op(ProfileOp::Intersection(self.clone(), other.clone()))
    }

    /// Union of many profiles.
    pub fn union_all<'a>(profiles: impl IntoIterator<Item = &'a Profile>) -> Self {
        profiles
            .into_iter()
            .fold(Self::empty(), |acc, p| acc.union(p))
    }

    /// Replicate on a grid centered at origin.
    pub fn grid_pattern(&self, count: [u32; 2], pitch: Vector2<f64>) -> Self {
        if count == [1, 1] || self.is_empty() {
            return self.clone();
        }
        if count[0] == 0 || count[1] == 0 {
            return Self::empty();
        }
        Self::from_op(ProfileOp::GridPattern {
            child: self.clone(),
            count,
            pitch,
        })
    }

    /// Linear extrusion along +Z from 0 to `height`.
    pub fn extrude(&self, height: f64) -> Solid {
        if self.is_empty() || height <= 0.0 {
            return Solid::empty();
        }
        Solid::from_op(SolidOp::LinearExtrude {
            profile: self.clone(),
            height,
        })
    }

    /// Revolve about Z (profile x = radius, y = height) through `angle` degrees.
    pub fn revolve(&self, angle: f64, segments: u32) -> Solid {
        if self.is_empty() || angle <= 0.0 {
            return Solid::empty();
        }
        Solid::from_op(SolidOp::RotateExtrude {
            profile: self.clone(),
            angle,
            segments,
        })
    }
}

// =============================================================================
// 3D solids
// =============================================================================

/// Operation at the root of a [`Solid`].
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum SolidOp {
    /// Nothing (identity for union).
    Empty,
    /// Box centered at origin.
    Cube { size: Vector3<f64> },
    LinearExtrude { profile: Profile, height: f64 },
    RotateExtrude {
        profile: Profile,
        angle: f64,
        segments: u32,
    },
    Translate { child: Solid, offset: Vector3<f64> },
    /// Euler angles in degrees, applied X then Y then Z.
    Rotate { child: Solid, angles: Vector3<f64> },
    Scale { child: Solid, factor: Vector3<f64> },
    Union(Solid, Solid),
    Difference(Solid, Solid),
    Intersection(Solid, Solid),
    GridPattern {
        child: Solid,
        count: [u32; 2],
        pitch: Vector2<f64>,
    },
}

#[derive(Debug, PartialEq)]
struct SolidNode {
    name: Option<String>,
    op: SolidOp,
}

/// An immutable CSG solid.
///
/// Built bottom-up from primitives, extrusions and transformed copies; a
/// solid can only reference solids that already exist, so the graph is
/// acyclic by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Solid(Arc<SolidNode>);

impl Solid {
    fn from_op(op: SolidOp) -> Self {
        Self(Arc::new(SolidNode { name: None, op }))
    }

    /// The empty solid.
    pub fn empty() -> Self {
        Self::from_op(SolidOp::Empty)
    }

    /// Box centered at origin.
    pub fn cube(x: f64, y: f64, z: f64) -> Self {
        Self::from_op(SolidOp::Cube {
            size: Vector3::new(x, y, z),
        })
    }

    /// Attach a human-readable name (carried into the IR).
    pub fn named(&self, name: impl Into<String>) -> Self {
        Self(Arc::new(SolidNode {
            name: Some(name.into()),
            op: self.0.op.clone(),
        }))
    }

    /// Name of this node, if any.
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// Root operation.
    pub fn op(&self) -> &SolidOp {
        &self.0.op
    }

    /// Whether this solid is structurally empty.
    pub fn is_empty(&self) -> bool {
        matches!(self.0.op, SolidOp::Empty)
    }

    /// Translate the solid.
    pub fn translate(&self, x: f64, y: f64, z: f64) -> Self {
        if self.is_empty() {
            return self.clone();
        }
        Self::from_op(SolidOp::Translate {
            child: self.clone(),
            offset: Vector3::new(x, y, z),
        })
    }

    /// Rotate the solid (angles in degrees).
    pub fn rotate(&self, x_deg: f64, y_deg: f64, z_deg: f64) -> Self {
        if self.is_empty() {
            return self.clone();
        }
        Self::from_op(SolidOp::Rotate {
            child: self.clone(),
            angles: Vector3::new(x_deg, y_deg, z_deg),
        })
    }

    /// Scale the solid; negative factors mirror.
    pub fn scale(&self, x: f64, y: f64, z: f64) -> Self {
        if self.is_empty() {
            return self.clone();
        }
        Self::from_op(SolidOp::Scale {
            child: self.clone(),
            factor: Vector3::new(x, y, z),
        })
    }

    /// Boolean union.
    pub fn union(&self, other: &Solid) -> Self {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => other.clone(),
            (_, true) => self.clone(),
            _ => Self::from_op(SolidOp::Union(self.clone(), other.clone())),
        }
    }

    /// Boolean difference (self - other).
    pub fn difference(&self, other: &Solid) -> Self {
        if self.is_empty() || other.is_empty() {
            return self.clone();
        }
        Self::from_op(SolidOp::Difference(self.clone(), other.clone()))
    }

    /// Boolean intersection.
    pub fn intersection(&self, other: &Solid) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::empty();
        }
        Self::from_op(SolidOp::Intersection(self.clone(), other.clone()))
    }

    /// Union of many solids.
    pub fn union_all<'a>(solids: impl IntoIterator<Item = &'a Solid>) -> Self {
        solids.into_iter().fold(Self::empty(), |acc, s| acc.union(s))
    }

    /// Replicate on an XY grid centered at origin.
    pub fn grid_pattern(&self, count: [u32; 2], pitch: Vector2<f64>) -> Self {
        if count == [1, 1] || self.is_empty() {
            return self.clone();
        }
        if count[0] == 0 || count[1] == 0 {
            return Self::empty();
        }
        Self::from_op(SolidOp::GridPattern {
            child: self.clone(),
            count,
            pitch,
        })
    }
}

macro_rules! csg_operators {
    ($ty:ident) => {
        impl std::ops::Add for &$ty {
            type Output = $ty;
            fn add(self, rhs: &$ty) -> $ty {
                self.union(rhs)
            }
        }

        impl std::ops::Add for $ty {
            type Output = $ty;
            fn add(self, rhs: $ty) -> $ty {
                self.union(&rhs)
            }
        }

        impl std::ops::Sub for &$ty {
            type Output = $ty;
            fn sub(self, rhs: &$ty) -> $ty {
                self.difference(rhs)
            }
        }

        impl std::ops::Sub for $ty {
            type Output = $ty;
            fn sub(self, rhs: $ty) -> $ty {
                self.difference(&rhs)
            }
        }

        impl std::ops::BitAnd for &$ty {
            type Output = $ty;
            fn bitand(self, rhs: &$ty) -> $ty {
                self.intersection(rhs)
            }
        }

        impl std::ops::BitAnd for $ty {
            type Output = $ty;
            fn bitand(self, rhs: $ty) -> $ty {
                self.intersection(&rhs)
            }
        }
    };
}

csg_operators!(Profile);
csg_operators!(Solid);

// =============================================================================
// Lowering to the IR
// =============================================================================

/// Flattens shared profile/solid trees into an IR node map.
///
/// Ids are assigned in post-order as nodes are first reached, so the same
/// input always produces the same ids. Nodes shared by reference are emitted
/// once.
#[derive(Default)]
struct Lowering {
    nodes: BTreeMap<NodeId, Node>,
    seen: HashMap<usize, NodeId>,
    next: NodeId,
}

impl Lowering {
    fn push(&mut self, key: usize, name: Option<&str>, op: CsgOp) -> NodeId {
        self.next += 1;
        let id = self.next;
        self.nodes.insert(
            id,
            Node {
                id,
                name: name.map(str::to_string),
                op,
            },
        );
        self.seen.insert(key, id);
        id
    }

    fn profile(&mut self, p: &Profile) -> NodeId {
        let key = Arc::as_ptr(&p.0) as *const () as usize;
        if let Some(&id) = self.seen.get(&key) {
            return id;
        }
        let op = match p.op() {
            ProfileOp::Empty => CsgOp::Empty,
            ProfileOp::Rect { size } => CsgOp::Rect {
                size: ir_vec2(size),
            },
            ProfileOp::Circle { radius, segments } => CsgOp::Circle {
                radius: *radius,
                segments: *segments,
            },
            ProfileOp::Polygon { points } => CsgOp::Polygon {
                points: points
                    .iter()
                    .map(|pt| coverbin_ir::Vec2::new(pt.x, pt.y))
                    .collect(),
            },
            ProfileOp::Offset { child, delta } => CsgOp::Offset {
                child: self.profile(child),
                delta: *delta,
            },
            ProfileOp::Translate { child, offset } => CsgOp::Translate {
                child: self.profile(child),
                offset: coverbin_ir::Vec3::new(offset.x, offset.y, 0.0),
            },
            ProfileOp::Rotate { child, degrees } => CsgOp::Rotate {
                child: self.profile(child),
                angles: coverbin_ir::Vec3::new(0.0, 0.0, *degrees),
            },
            ProfileOp::Scale { child, factor } => CsgOp::Scale {
                child: self.profile(child),
                factor: coverbin_ir::Vec3::new(factor.x, factor.y, 1.0),
            },
            ProfileOp::Union(a, b) => CsgOp::Union {
                left: self.profile(a),
                right: self.profile(b),
            },
            ProfileOp::Difference(a, b) => CsgOp::Difference {
                left: self.profile(a),
                right: self.profile(b),
            },
            ProfileOp::Intersection(a, b) => CsgOp::Intersection {
                left: self.profile(a),
                right: self.profile(b),
            },
            ProfileOp::GridPattern {
                child,
                count,
                pitch,
            } => CsgOp::GridPattern {
                child: self.profile(child),
                count: *count,
                pitch: ir_vec2(pitch),
            },
        };
        self.push(key, p.name(), op)
    }

    fn solid(&mut self, s: &Solid) -> NodeId {
        let key = Arc::as_ptr(&s.0) as *const () as usize;
        if let Some(&id) = self.seen.get(&key) {
            return id;
        }
        let op = match s.op() {
            SolidOp::Empty => CsgOp::Empty,
            SolidOp::Cube { size } => CsgOp::Cube {
                size: ir_vec3(size),
            },
            SolidOp::LinearExtrude { profile, height } => CsgOp::LinearExtrude {
                profile: self.profile(profile),
                height: *height,
            },
            SolidOp::RotateExtrude {
                profile,
                angle,
                segments,
            } => CsgOp::RotateExtrude {
                profile: self.profile(profile),
                angle: *angle,
                segments: *segments,
            },
            SolidOp::Translate { child, offset } => CsgOp::Translate {
                child: self.solid(child),
                offset: ir_vec3(offset),
            },
            SolidOp::Rotate { child, angles } => CsgOp::Rotate {
                child: self.solid(child),
                angles: ir_vec3(angles),
            },
            SolidOp::Scale { child, factor } => CsgOp::Scale {
                child: self.solid(child),
                factor: ir_vec3(factor),
            },
            SolidOp::Union(a, b) => CsgOp::Union {
                left: self.solid(a),
                right: self.solid(b),
            },
            SolidOp::Difference(a, b) => CsgOp::Difference {
                left: self.solid(a),
                right: self.solid(b),
            },
            SolidOp::Intersection(a, b) => CsgOp::Intersection {
                left: self.solid(a),
                right: self.solid(b),
            },
            SolidOp::GridPattern {
                child,
                count,
                pitch,
            } => CsgOp::GridPattern {
                child: self.solid(child),
                count: *count,
                pitch: ir_vec2(pitch),
            },
        };
        self.push(key, s.name(), op)
    }
}

fn ir_vec2(v: &Vector2<f64>) -> coverbin_ir::Vec2 {
    coverbin_ir::Vec2::new(v.x, v.y)
}

fn ir_vec3(v: &Vector3<f64>) -> coverbin_ir::Vec3 {
    coverbin_ir::Vec3::new(v.x, v.y, v.z)
}

// =============================================================================
// Scene
// =============================================================================

/// A solid placed in a scene with a display material.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePart {
    /// Part name ("bin", "lid", ...).
    pub name: String,
    /// The geometry.
    pub solid: Solid,
    /// Display material.
    pub material: MaterialDef,
}

/// An ordered collection of output parts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    /// Parts in output order.
    pub parts: Vec<ScenePart>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part.
    pub fn add(&mut self, name: impl Into<String>, solid: Solid, material: MaterialDef) {
        self.parts.push(ScenePart {
            name: name.into(),
            solid,
            material,
        });
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the scene has no parts.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Part by name.
    pub fn get(&self, name: &str) -> Option<&ScenePart> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Lower every part into one IR document.
    ///
    /// Subtrees shared between parts are emitted once.
    pub fn to_document(&self) -> Document {
        let mut lowering = Lowering::default();
        let mut doc = Document::new();
        for part in &self.parts {
            let root = lowering.solid(&part.solid);
            doc.materials
                .insert(part.material.name.clone(), part.material.clone());
            doc.roots.push(SceneEntry {
                name: part.name.clone(),
                root,
                material: part.material.name.clone(),
            });
        }
        doc.nodes = lowering.nodes;
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> MaterialDef {
        MaterialDef {
            name: "test".to_string(),
            color: [0.5, 0.5, 0.5],
        }
    }

    #[test]
    fn test_empty_is_union_identity() {
        let cube = Solid::cube(1.0, 2.0, 3.0);
        assert_eq!(cube.union(&Solid::empty()), cube);
        assert_eq!(Solid::empty().union(&cube), cube);
        assert_eq!(cube.difference(&Solid::empty()), cube);
        assert!(cube.intersection(&Solid::empty()).is_empty());
    }

    #[test]
    fn test_operator_overloads() {
        let a = Profile::rect(4.0, 4.0);
        let b = Profile::circle(1.0, 16);
        assert!(matches!((&a - &b).op(), ProfileOp::Difference(_, _)));
        assert!(matches!((&a + &b).op(), ProfileOp::Union(_, _)));
        assert!(matches!((a & b).op(), ProfileOp::Intersection(_, _)));

        let c = Solid::cube(1.0, 1.0, 1.0);
        let d = Profile::circle(0.5, 16).extrude(2.0);
        assert!(matches!((&c - &d).op(), SolidOp::Difference(_, _)));
        assert!(matches!((c + d).op(), SolidOp::Union(_, _)));
    }

    #[test]
    fn test_zero_offset_is_noop() {
        let r = Profile::rect(2.0, 1.0);
        assert_eq!(r.offset(0.0), r);
        assert!(matches!(r.offset(0.5).op(), ProfileOp::Offset { .. }));
    }

    #[test]
    fn test_degenerate_extrusions_are_empty() {
        let r = Profile::rect(2.0, 1.0);
        assert!(r.extrude(0.0).is_empty());
        assert!(r.revolve(0.0, 32).is_empty());
        assert!(Profile::empty().extrude(3.0).is_empty());
        assert!(r.grid_pattern([0, 3], Vector2::new(1.0, 1.0)).is_empty());
    }

    #[test]
    fn test_shared_nodes_lower_once() {
        let shared = Profile::rect(2.0, 2.0).named("shared");
        let a = shared.extrude(1.0);
        let b = shared.translate(5.0, 0.0).extrude(1.0);

        let mut scene = Scene::new();
        scene.add("a", a, material());
        scene.add("b", b, material());
        let doc = scene.to_document();

        let rects = doc
            .nodes
            .values()
            .filter(|n| matches!(n.op, CsgOp::Rect { .. }))
            .count();
        assert_eq!(rects, 1);
        assert_eq!(doc.roots.len(), 2);
        assert_eq!(doc.materials.len(), 1);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_lowering_is_deterministic() {
        let make = || {
            let hole = Profile::circle(3.0, 32).extrude(10.0);
            let plate = Solid::cube(20.0, 20.0, 4.0).named("plate");
            let mut scene = Scene::new();
            scene.add("plate", &plate - &hole.translate(2.0, 0.0, 0.0), material());
            scene.to_document()
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn test_names_are_carried() {
        let mut scene = Scene::new();
        scene.add("p", Solid::cube(1.0, 1.0, 1.0).named("block"), material());
        let doc = scene.to_document();
        let root = doc.roots[0].root;
        assert_eq!(doc.nodes[&root].name.as_deref(), Some("block"));
    }
}
