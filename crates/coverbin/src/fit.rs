//! Lip and tab fit engine.
//!
//! Both lips are derived from the same nominal lip section and the same
//! [`ToleranceSet`]:
//!
//! * the **seat** is the region above and inside the nominal lip that the lid
//!   rim may occupy;
//! * the **bin lip** is the nominal lip with a clearance band cut away where
//!   the seat touches it (horizontal gap toward the outer face, vertical gap
//!   downward);
//! * the **lid lip** is the seat grown by the engagement clearance and
//!   clipped to the pocket, so it enters the band but never crosses it.
//!
//! Snap tabs are bosses on the bin lip face with matching slots in the lid
//! lip. A slot is its boss offset by the insertion clearance, so it always
//! contains the boss.
//!
//! Sharp reentrant corners are removed by [`smooth`] (shrink, then grow).

use crate::profile::{
    Footprint, GridContext, ProfileProvider, LID_THICKNESS, LIP_HEIGHT, SEAT_WIDTH, TAB_DEPTH,
    TAB_HEIGHT, TAB_WIDTH,
};
use crate::tolerance::ToleranceSet;
use crate::{Profile, Solid};
use tracing::debug;

/// u of the nominal lip's vertical face.
pub const LIP_FACE_U: f64 = 0.7;
/// Height of the tab centers above the body top.
pub const TAB_CENTER_W: f64 = 2.8;
/// How far a boss is sunk into the bin lip behind its face.
pub const TAB_EMBED: f64 = 0.3;
/// Tab y offset used when a grip slot sits at the face midpoint.
pub const TAB_OFFSET_ODD: f64 = 12.5;

const TAB_CORNER_RADIUS: f64 = 0.3;

/// Offset inward by `r`, then back out; rounds reentrant corners of the
/// complement. `r == 0` returns the profile unchanged.
pub fn smooth(profile: &Profile, r: f64) -> Profile {
    if r <= 0.0 {
        return profile.clone();
    }
    profile.offset(-r).offset(r)
}

/// Snap tab geometry for one bin/lid pair.
#[derive(Debug, Clone, PartialEq)]
pub struct TabSet {
    /// Boss cross-section in the face plane (along-face, height).
    pub boss_profile: Profile,
    /// Slot cross-section: the boss grown by `clearance`.
    pub slot_profile: Profile,
    /// Insertion clearance used.
    pub clearance: f64,
    /// Both bosses, placed on the bin.
    pub bosses: Solid,
    /// Both slots, placed for cutting from the lid.
    pub slots: Solid,
    /// u of the face the bosses stand on.
    pub face_u: f64,
    /// y of the tab on the +x face (the -x tab is at `-y`).
    pub y: f64,
    /// z of the tab centers.
    pub z: f64,
}

/// Builds the mating lip sections and snap tabs for one context.
pub struct FitEngine<'a, P: ProfileProvider + ?Sized> {
    provider: &'a P,
    ctx: &'a GridContext,
    tolerances: &'a ToleranceSet,
}

impl<'a, P: ProfileProvider + ?Sized> FitEngine<'a, P> {
    /// Engine over an explicit context and tolerance set.
    pub fn new(provider: &'a P, ctx: &'a GridContext, tolerances: &'a ToleranceSet) -> Self {
        Self {
            provider,
            ctx,
            tolerances,
        }
    }

    /// Nominal lip section from the provider.
    pub fn nominal_lip(&self) -> Profile {
        self.provider.lip_profile(self.ctx)
    }

    /// Region above and inside `lip` available to the lid rim.
    pub fn seat_profile(&self, lip: &Profile) -> Profile {
        let height = LIP_HEIGHT + LID_THICKNESS;
        let envelope = Profile::rect(SEAT_WIDTH + 1.0, height)
            .translate((SEAT_WIDTH - 1.0) / 2.0, height / 2.0);
        envelope.difference(lip).named("seat")
    }

    /// Bin-side lip: `lip` minus the seat swept by the clearance band.
    pub fn build_bin_lip(&self, lip: &Profile) -> Profile {
        let h = self.tolerances.horizontal;
        let v = self.tolerances.vertical;
        let e = self.tolerances.lip_engagement;

        let seat = self.seat_profile(lip);
        let band = Profile::union_all(&[
            seat.clone(),
            seat.translate(-h, 0.0),
            seat.translate(0.0, -v),
            seat.translate(-h, -v),
        ]);
        debug!(h, v, e, "bin lip");
        lip.difference(&smooth(&band, e)).named("bin_lip")
    }

    /// Lid-side lip: the seat grown by the engagement clearance, clipped to
    /// the pocket below the lid plate.
    pub fn build_lid_lip(&self, lip: &Profile) -> Profile {
        let h = self.tolerances.horizontal;
        let e = self.tolerances.lip_engagement;

        let grown = smooth(&self.seat_profile(lip).offset(e), e);
        let clip_w = SEAT_WIDTH - h;
        let clip_h = LIP_HEIGHT + e;
        let clip = Profile::rect(clip_w, clip_h)
            .translate(h + clip_w / 2.0, -e + clip_h / 2.0);
        debug!(h, e, "lid lip");
        grown.intersection(&clip).named("lid_lip")
    }

    /// Two opposing snap tabs on the ±x faces and their lid slots.
    ///
    /// `footprint` is the bin's outer footprint.
    pub fn build_tabs(&self, footprint: &Footprint, clearance: f64) -> TabSet {
        let clearance = clearance.max(0.0);
        let r = TAB_CORNER_RADIUS;
        let boss_profile = Profile::rect(TAB_WIDTH - 2.0 * r, TAB_HEIGHT - 2.0 * r)
            .offset(r)
            .named("tab_boss");
        let slot_profile = boss_profile.offset(clearance).named("tab_slot");

        let face_u = LIP_FACE_U - self.tolerances.horizontal;
        let y = if self.ctx.grid_y % 2 == 0 {
            0.0
        } else {
            TAB_OFFSET_ODD
        };
        let z = self.ctx.body_height + TAB_CENTER_W;

        // Extrusion axis onto +x, profile (a, b) onto (y, z); u = W/2 - x.
        let place = |profile: &Profile, u_start: f64, depth: f64| -> Solid {
            let one = profile
                .extrude(depth)
                .rotate(90.0, 0.0, 90.0)
                .translate(footprint.width / 2.0 - u_start - depth, y, z);
            one.union(&one.rotate(0.0, 0.0, 180.0))
        };

        let bosses = place(&boss_profile, face_u - TAB_EMBED, TAB_DEPTH + TAB_EMBED).named("tabs");
        let slots = place(
            &slot_profile,
            face_u - clearance,
            TAB_DEPTH + 2.0 * clearance,
        )
        .named("tab_slots");

        if clearance == 0.0 {
            debug!("tabs built as press fit");
        }

        TabSet {
            boss_profile,
            slot_profile,
            clearance,
            bosses,
            slots,
            face_u,
            y,
            z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{distance2, inside2, inside3};
    use crate::profile::GridProfiles;
    use crate::tolerance::resolve;
    use nalgebra::{Point2, Point3};

    fn ctx(grid_y: u32) -> GridContext {
        GridContext {
            grid_x: 2,
            grid_y,
            body_height: 21.0,
        }
    }

    #[test]
    fn test_smooth_zero_is_identity() {
        let p = Profile::rect(2.0, 2.0);
        assert_eq!(smooth(&p, 0.0), p);
        assert!(matches!(smooth(&p, 0.1).op(), crate::ProfileOp::Offset { .. }));
    }

    #[test]
    fn test_seat_excludes_lip() {
        let c = ctx(2);
        let t = resolve(0.1);
        let engine = FitEngine::new(&GridProfiles, &c, &t);
        let lip = engine.nominal_lip();
        let seat = engine.seat_profile(&lip);
        assert!(inside2(&seat, Point2::new(2.0, 3.0)));
        assert!(!inside2(&seat, Point2::new(0.3, 3.0)));
        assert!(!inside2(&seat, Point2::new(2.0, -0.5)));
    }

    #[test]
    fn test_bin_lip_has_clearance_band() {
        let c = ctx(2);
        let t = resolve(0.2);
        let engine = FitEngine::new(&GridProfiles, &c, &t);
        let lip = engine.nominal_lip();
        let bin = engine.build_bin_lip(&lip);

        // The vertical face moves outward by the horizontal clearance.
        assert!(inside2(&bin, Point2::new(0.3, 3.0)));
        assert!(!inside2(&bin, Point2::new(0.6, 3.0)));
        // The upward slope drops by the vertical clearance.
        assert!(inside2(&lip, Point2::new(1.6, 0.9)));
        assert!(!inside2(&bin, Point2::new(1.6, 0.9)));
        // Material under the lip is untouched.
        assert!(inside2(&bin, Point2::new(0.5, -1.0)));
    }

    #[test]
    fn test_lid_lip_stays_in_pocket() {
        let c = ctx(2);
        let t = resolve(0.1);
        let engine = FitEngine::new(&GridProfiles, &c, &t);
        let lid = engine.build_lid_lip(&engine.nominal_lip());

        assert!(inside2(&lid, Point2::new(2.0, 3.0)));
        // Never outside the horizontal clearance or above the lip top.
        assert!(!inside2(&lid, Point2::new(0.2, 4.3)));
        assert!(!inside2(&lid, Point2::new(2.0, 4.5)));
        // Grows into the band by the engagement clearance.
        assert!(distance2(&lid, Point2::new(0.7 - 0.05, 3.0)) < 0.0);
    }

    #[test]
    fn test_tabs_even_and_odd_depth() {
        let t = resolve(0.1);
        let fp = Footprint::outer(&ctx(2));

        let even = ctx(2);
        let tabs = FitEngine::new(&GridProfiles, &even, &t).build_tabs(&fp, t.tab_insertion);
        assert_eq!(tabs.y, 0.0);
        approx::assert_relative_eq!(tabs.z, 23.8);

        let odd = ctx(1);
        let fp_odd = Footprint::outer(&odd);
        let tabs = FitEngine::new(&GridProfiles, &odd, &t).build_tabs(&fp_odd, t.tab_insertion);
        assert_eq!(tabs.y, TAB_OFFSET_ODD);
    }

    #[test]
    fn test_bosses_stand_on_both_x_faces() {
        let c = ctx(2);
        let t = resolve(0.1);
        let fp = Footprint::outer(&c);
        let tabs = FitEngine::new(&GridProfiles, &c, &t).build_tabs(&fp, t.tab_insertion);

        let half = fp.width / 2.0;
        let u = tabs.face_u + TAB_DEPTH / 2.0;
        assert!(inside3(&tabs.bosses, Point3::new(half - u, 0.0, tabs.z)));
        assert!(inside3(&tabs.bosses, Point3::new(-(half - u), 0.0, tabs.z)));
        assert!(!inside3(&tabs.bosses, Point3::new(half - u, 0.0, tabs.z + 1.0)));
        assert!(!inside3(
            &tabs.bosses,
            Point3::new(half - tabs.face_u - TAB_DEPTH - 0.05, 0.0, tabs.z)
        ));
        assert!(inside3(&tabs.slots, Point3::new(half - u, 0.0, tabs.z)));
    }
}
