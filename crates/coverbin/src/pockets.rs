//! Grid pocket tessellator.
//!
//! Splits an interior footprint into `divx × divy` equal rectangular pockets
//! separated by [`SEPARATOR_THICKNESS`] walls. The returned solid is a cutter;
//! the caller subtracts it from whatever fills the interior.
//!
//! The cutter is clipped to the interior shrunk by the wall thickness. That
//! outline shares its corner centers with the interior, so the corner pockets
//! keep the full wall thickness along the diagonal too.

use crate::profile::{Footprint, SEPARATOR_THICKNESS};
use crate::{Profile, Solid};
use nalgebra::{Point2, Vector2};
use tracing::{debug, warn};

/// Corner radius of each pocket before clamping.
pub const POCKET_RADIUS: f64 = 1.0;

/// Resolved pocket grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PocketLayout {
    /// Pockets per axis.
    pub count: [u32; 2],
    /// Center-to-center spacing.
    pub pitch: Vector2<f64>,
    /// Size of one pocket.
    pub size: Vector2<f64>,
    /// Corner radius of one pocket.
    pub radius: f64,
}

impl PocketLayout {
    /// Total number of pockets.
    pub fn len(&self) -> usize {
        self.count[0] as usize * self.count[1] as usize
    }

    /// Always false; an empty grid has no layout.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pocket centers, row by row.
    pub fn centers(&self) -> Vec<Point2<f64>> {
        let [nx, ny] = self.count;
        let off = |i: u32, n: u32, pitch: f64| (f64::from(i) - f64::from(n - 1) / 2.0) * pitch;
        (0..ny)
            .flat_map(|j| {
                (0..nx).map(move |i| Point2::new(off(i, nx, self.pitch.x), off(j, ny, self.pitch.y)))
            })
            .collect()
    }
}

/// Pocket grid for an interior span, or `None` when there is nothing to cut.
///
/// Pitch per axis is `(span - 2·wall + separator) / div`, which leaves
/// exactly `wall` between the outer pockets and the footprint edge.
pub fn pocket_layout(
    interior: &Footprint,
    divx: u32,
    divy: u32,
    wall_thickness: f64,
) -> Option<PocketLayout> {
    if divx == 0 || divy == 0 {
        return None;
    }
    let span = interior.size();
    if 2.0 * wall_thickness >= span.x.min(span.y) {
        warn!(
            wall_thickness,
            width = span.x,
            depth = span.y,
            "wall leaves no interior; pockets skipped"
        );
        return None;
    }

    let pitch = Vector2::new(
        (span.x - 2.0 * wall_thickness + SEPARATOR_THICKNESS) / f64::from(divx),
        (span.y - 2.0 * wall_thickness + SEPARATOR_THICKNESS) / f64::from(divy),
    );
    let size = pitch.add_scalar(-SEPARATOR_THICKNESS);
    if size.x <= 0.0 || size.y <= 0.0 {
        warn!(divx, divy, "pockets narrower than a separator; pockets skipped");
        return None;
    }

    Some(PocketLayout {
        count: [divx, divy],
        pitch,
        size,
        radius: POCKET_RADIUS.min(size.x.min(size.y) / 4.0),
    })
}

/// 2D cutter: every pocket outline, centered on the interior.
pub fn pocket_profile(layout: &PocketLayout) -> Profile {
    let r = layout.radius;
    Profile::rect(layout.size.x - 2.0 * r, layout.size.y - 2.0 * r)
        .offset(r)
        .named("pocket")
        .grid_pattern(layout.count, layout.pitch)
}

/// Pocket cutter from `z = 0` to `depth`, clipped to `interior` inset by
/// `wall_thickness`. Empty when `divx` or `divy` is zero or the footprint is
/// too small.
pub fn tessellate(
    interior: &Footprint,
    divx: u32,
    divy: u32,
    wall_thickness: f64,
    depth: f64,
) -> Solid {
    match pocket_layout(interior, divx, divy, wall_thickness) {
        Some(layout) => {
            debug!(
                count = layout.len(),
                pitch_x = layout.pitch.x,
                pitch_y = layout.pitch.y,
                "pockets"
            );
            let bound = interior.inset(wall_thickness).outline();
            pocket_profile(&layout)
                .intersection(&bound)
                .extrude(depth)
                .named("pockets")
        }
        None => Solid::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::inside3;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn interior() -> Footprint {
        Footprint {
            width: 81.6,
            depth: 81.6,
            radius: 2.8,
        }
    }

    #[test]
    fn test_six_by_six() {
        let layout = pocket_layout(&interior(), 6, 6, SEPARATOR_THICKNESS).unwrap();
        assert_eq!(layout.len(), 36);
        assert_relative_eq!(layout.pitch.x, 13.4, epsilon = 1e-12);
        assert_relative_eq!(layout.size.x, 12.2, epsilon = 1e-12);
        assert_relative_eq!(layout.radius, 1.0);

        let centers = layout.centers();
        assert_eq!(centers.len(), 36);
        assert_relative_eq!(centers[0].x, -33.5, epsilon = 1e-9);
        assert_relative_eq!(centers[35].y, 33.5, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_divisions_is_empty() {
        assert!(pocket_layout(&interior(), 0, 3, 1.2).is_none());
        assert!(tessellate(&interior(), 3, 0, 1.2, 10.0).is_empty());
    }

    #[test]
    fn test_degenerate_wall_is_empty() {
        assert!(tessellate(&interior(), 2, 2, 41.0, 10.0).is_empty());
        // Too many divisions for the span.
        assert!(pocket_layout(&interior(), 80, 1, 1.2).is_none());
    }

    #[test]
    fn test_small_pockets_clamp_radius() {
        let layout = pocket_layout(&interior(), 20, 1, SEPARATOR_THICKNESS).unwrap();
        assert!(layout.radius < POCKET_RADIUS);
        assert!(layout.radius > 0.0);
    }

    #[test]
    fn test_cutter_is_clipped_pattern_extrusion() {
        let cutter = tessellate(&interior(), 2, 3, 1.2, 10.0);
        match cutter.op() {
            crate::SolidOp::LinearExtrude { profile, height } => {
                assert_eq!(*height, 10.0);
                match profile.op() {
                    crate::ProfileOp::Intersection(pattern, _) => assert!(matches!(
                        pattern.op(),
                        crate::ProfileOp::GridPattern { count: [2, 3], .. }
                    )),
                    other => panic!("unexpected cutter profile {other:?}"),
                }
            }
            other => panic!("unexpected cutter {other:?}"),
        }
    }

    #[test]
    fn test_corner_pocket_keeps_wall_on_diagonal() {
        let fp = interior();
        let cutter = tessellate(&fp, 6, 6, SEPARATOR_THICKNESS, 10.0);
        let center = fp.width / 2.0 - fp.radius;
        let along = |s: f64| {
            let d = s / std::f64::consts::SQRT_2;
            Point3::new(center + d, center + d, 5.0)
        };

        // Interior arc at s = 2.8; the cutter stops 1.2 short of it.
        assert!(inside3(&cutter, along(1.55)));
        for k in 0..=20 {
            let s = 1.65 + f64::from(k) * 0.05;
            assert!(!inside3(&cutter, along(s)), "cut at {s}");
        }
    }
}
