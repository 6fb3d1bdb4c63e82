//! Finger-grip slots.
//!
//! Rounded slots centered on the lip top, one per grid cell along a face.
//! They are cut from the bin only; the lid keeps a flush rim.

use crate::params::GripMode;
use crate::profile::{Footprint, GridContext, GRID_PITCH, SEGMENTS};
use crate::{Profile, Solid};
use nalgebra::Vector2;
use tracing::debug;

/// Slot width as a fraction of the cell pitch.
pub const GRIP_WIDTH_RATIO: f64 = 0.4;
/// Slot height as a fraction of the cell pitch.
pub const GRIP_HEIGHT_RATIO: f64 = 0.12;
/// How far each cutter starts outside the outer face.
const OUTSIDE: f64 = 1.0;
/// How deep each cutter reaches past the outer face.
const REACH: f64 = 3.6;

/// Stadium of `width × height`, centered.
pub fn rounded_slot(width: f64, height: f64) -> Profile {
    let r = height / 2.0;
    let straight = (width - height).max(0.0);
    let cap = Profile::circle(r, SEGMENTS);
    Profile::union_all(&[
        Profile::rect(straight, height),
        cap.translate(-straight / 2.0, 0.0),
        cap.translate(straight / 2.0, 0.0),
    ])
}

/// Slots through the two faces normal to Y, `count` per face along X.
/// `half_depth` is the distance from the center to those faces.
fn face_pair(count: u32, half_depth: f64, lip_top: f64) -> Solid {
    let slot = rounded_slot(GRID_PITCH * GRIP_WIDTH_RATIO, GRID_PITCH * GRIP_HEIGHT_RATIO)
        .named("grip_slot")
        .grid_pattern([count, 1], Vector2::new(GRID_PITCH, 0.0));
    let one = slot
        .extrude(OUTSIDE + REACH)
        .rotate(90.0, 0.0, 0.0)
        .translate(0.0, half_depth + OUTSIDE, lip_top);
    one.union(&one.rotate(0.0, 0.0, 180.0))
}

/// Grip cutters for `mode`, to be subtracted from the bin.
pub fn build_grip_masks(mode: GripMode, footprint: &Footprint, ctx: &GridContext) -> Solid {
    let lip_top = ctx.lip_top();
    let masks = match mode {
        GripMode::None => Solid::empty(),
        GripMode::Single => face_pair(ctx.grid_x, footprint.depth / 2.0, lip_top),
        GripMode::Full => face_pair(ctx.grid_x, footprint.depth / 2.0, lip_top).union(
            &face_pair(ctx.grid_y, footprint.width / 2.0, lip_top).rotate(0.0, 0.0, 90.0),
        ),
    };
    debug!(%mode, "grip masks");
    masks.named("grips")
}
