//! Tolerance resolver.
//!
//! The only place clearances are derived. The fit engine, the tab builder and
//! the lid plate all read from one [`ToleranceSet`], so bin and lid cannot
//! drift apart.

use crate::profile::GRID_CLEARANCE;
use tracing::{debug, warn};

/// Upper bound on the lip engagement clearance.
pub const LIP_ENGAGEMENT_CAP: f64 = 0.15;

/// Horizontal lid clearance as a fraction of the grid clearance.
pub const HORIZONTAL_FIT_RATIO: f64 = 0.5;

/// Above this the fit is expected to be loose.
const LOOSE_FIT_WARNING: f64 = 1.0;

/// Clearances derived from one vertical fit input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceSet {
    /// Gap between lid lip and bin lip along the wall normal.
    pub horizontal: f64,
    /// Gap between lid lip and bin lip vertically.
    pub vertical: f64,
    /// Outward offset of the lid lip into the clearance band.
    pub lip_engagement: f64,
    /// Extra room around each snap tab.
    pub tab_insertion: f64,
}

impl ToleranceSet {
    /// True when every clearance is non-negative and engagement never exceeds
    /// either gap it grows into.
    pub fn is_consistent(&self) -> bool {
        self.horizontal >= 0.0
            && self.vertical >= 0.0
            && self.lip_engagement >= 0.0
            && self.tab_insertion >= 0.0
            && self.lip_engagement <= self.vertical
            && self.lip_engagement <= self.horizontal
    }
}

/// Resolve every clearance from the vertical lid fit input.
///
/// Any value is accepted. Negative or NaN input is treated as zero (a press
/// fit); large values give a loose fit. Engagement is `min(cap, vertical)`.
pub fn resolve(vertical_fit: f64) -> ToleranceSet {
    let vertical = vertical_fit.max(0.0);
    let lip_engagement = LIP_ENGAGEMENT_CAP.min(vertical);

    let set = ToleranceSet {
        horizontal: HORIZONTAL_FIT_RATIO * GRID_CLEARANCE,
        vertical,
        lip_engagement,
        tab_insertion: lip_engagement,
    };

    // A failure here is a bug in this function, never a user error.
    assert!(set.is_consistent(), "inconsistent tolerance set {set:?}");

    if vertical > LOOSE_FIT_WARNING {
        warn!(vertical, "lid fit tolerance above 1 mm; expect a loose lid");
    }
    if set.tab_insertion == 0.0 {
        debug!("zero insertion clearance: tabs are a press fit");
    }
    debug!(?set, "resolved tolerances");
    set
}
