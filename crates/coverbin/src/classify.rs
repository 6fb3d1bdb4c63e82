//! Point classification against profiles and solids.
//!
//! Evaluates a signed-distance style field directly on the CSG tree: negative
//! inside, positive outside. Primitives are exact; booleans use min/max, so
//! away from primitive surfaces the magnitude is only a bound. Offsets shift
//! the field, which makes `smooth` an identity here. Good enough to check
//! containment and clearance properties without a mesh kernel.

use crate::{Profile, ProfileOp, Solid, SolidOp};
use nalgebra::{Point2, Point3, Rotation2, Rotation3, Vector2, Vector3};

/// Signed distance from `pt` to a profile.
pub fn distance2(profile: &Profile, pt: Point2<f64>) -> f64 {
    match profile.op() {
        ProfileOp::Empty => f64::INFINITY,
        ProfileOp::Rect { size } => box2(pt.coords, size / 2.0),
        ProfileOp::Circle { radius, .. } => pt.coords.norm() - radius,
        ProfileOp::Polygon { points } => polygon(points, pt),
        ProfileOp::Offset { child, delta } => distance2(child, pt) - delta,
        ProfileOp::Translate { child, offset } => distance2(child, pt - offset),
        ProfileOp::Rotate { child, degrees } => {
            let inv = Rotation2::new(-degrees.to_radians());
            distance2(child, inv * pt)
        }
        ProfileOp::Scale { child, factor } => {
            let local = Point2::new(pt.x / factor.x, pt.y / factor.y);
            distance2(child, local) * factor.x.abs().min(factor.y.abs())
        }
        ProfileOp::Union(a, b) => distance2(a, pt).min(distance2(b, pt)),
        ProfileOp::Difference(a, b) => distance2(a, pt).max(-distance2(b, pt)),
        ProfileOp::Intersection(a, b) => distance2(a, pt).max(distance2(b, pt)),
        ProfileOp::GridPattern {
            child,
            count,
            pitch,
        } => grid_offsets(*count, *pitch)
            .map(|o| distance2(child, pt - o))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Signed distance from `pt` to a solid.
pub fn distance3(solid: &Solid, pt: Point3<f64>) -> f64 {
    match solid.op() {
        SolidOp::Empty => f64::INFINITY,
        SolidOp::Cube { size } => {
            let q = pt.coords.abs() - size / 2.0;
            q.sup(&Vector3::zeros()).norm() + q.max().min(0.0)
        }
        SolidOp::LinearExtrude { profile, height } => {
            let planar = distance2(profile, pt.xy());
            let axial = (pt.z - height / 2.0).abs() - height / 2.0;
            combine(planar, axial)
        }
        SolidOp::RotateExtrude { profile, angle, .. } => {
            let r = pt.xy().coords.norm();
            let section = distance2(profile, Point2::new(r, pt.z));
            section.max(wedge(pt.x, pt.y, *angle))
        }
        SolidOp::Translate { child, offset } => distance3(child, pt - offset),
        SolidOp::Rotate { child, angles } => {
            let rot = Rotation3::from_euler_angles(
                angles.x.to_radians(),
                angles.y.to_radians(),
                angles.z.to_radians(),
            );
            distance3(child, rot.inverse() * pt)
        }
        SolidOp::Scale { child, factor } => {
            let local = Point3::new(pt.x / factor.x, pt.y / factor.y, pt.z / factor.z);
            distance3(child, local) * factor.abs().min()
        }
        SolidOp::Union(a, b) => distance3(a, pt).min(distance3(b, pt)),
        SolidOp::Difference(a, b) => distance3(a, pt).max(-distance3(b, pt)),
        SolidOp::Intersection(a, b) => distance3(a, pt).max(distance3(b, pt)),
        SolidOp::GridPattern {
            child,
            count,
            pitch,
        } => grid_offsets(*count, *pitch)
            .map(|o| distance3(child, pt - Vector3::new(o.x, o.y, 0.0)))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Strictly inside the profile.
pub fn inside2(profile: &Profile, pt: Point2<f64>) -> bool {
    distance2(profile, pt) < 0.0
}

/// Strictly inside the solid.
pub fn inside3(solid: &Solid, pt: Point3<f64>) -> bool {
    distance3(solid, pt) < 0.0
}

fn box2(p: Vector2<f64>, half: Vector2<f64>) -> f64 {
    let q = p.abs() - half;
    q.sup(&Vector2::zeros()).norm() + q.max().min(0.0)
}

fn combine(a: f64, b: f64) -> f64 {
    Vector2::new(a.max(0.0), b.max(0.0)).norm() + a.max(b).min(0.0)
}

fn polygon(points: &[Point2<f64>], pt: Point2<f64>) -> f64 {
    let n = points.len();
    if n < 3 {
        return f64::INFINITY;
    }
    let mut dist = f64::INFINITY;
    let mut inside = false;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let ab = b - a;
        let ap = pt - a;
        let t = (ap.dot(&ab) / ab.norm_squared()).clamp(0.0, 1.0);
        dist = dist.min((ap - ab * t).norm());
        if (a.y > pt.y) != (b.y > pt.y) && pt.x < a.x + (pt.y - a.y) / (b.y - a.y) * ab.x {
            inside = !inside;
        }
    }
    if inside {
        -dist
    } else {
        dist
    }
}

/// Angular wedge from the +x axis through `angle` degrees, as a field.
fn wedge(x: f64, y: f64, angle: f64) -> f64 {
    if angle >= 360.0 {
        return f64::NEG_INFINITY;
    }
    let a = angle.to_radians();
    let start = -y;
    let end = -a.sin() * x + a.cos() * y;
    if angle <= 180.0 {
        start.max(end)
    } else {
        start.min(end)
    }
}

fn grid_offsets(count: [u32; 2], pitch: Vector2<f64>) -> impl Iterator<Item = Vector2<f64>> {
    let [nx, ny] = count;
    (0..ny).flat_map(move |j| {
        (0..nx).map(move |i| {
            Vector2::new(
                (f64::from(i) - f64::from(nx.saturating_sub(1)) / 2.0) * pitch.x,
                (f64::from(j) - f64::from(ny.saturating_sub(1)) / 2.0) * pitch.y,
            )
        })
    })
}
