//! Bin and lid assembly, and part selection.
//!
//! [`CoveredBin`] resolves tolerances, the footprint and the nominal lip once
//! and hands the same values to every stage. Bin and lid are then built
//! independently from those shared values.

use crate::fit::FitEngine;
use crate::grip::build_grip_masks;
use crate::params::{BuildParameters, InteriorStyle, Part};
use crate::pockets::tessellate;
use crate::profile::{
    Footprint, GridContext, GridProfiles, ProfileProvider, BASE_HEIGHT, FLOOR_THICKNESS,
    GRID_PITCH, LID_THICKNESS, SEPARATOR_THICKNESS, TAB_DEPTH, WALL_THICKNESS,
};
use crate::tolerance::{resolve, ToleranceSet};
use crate::{Profile, Scene, Solid};
use coverbin_ir::{Document, MaterialDef};
use tracing::{debug, info};

/// How far below the body top a slice starts.
pub const SLICE_BELOW: f64 = 3.0;
/// How far above the lip top a slice ends.
pub const SLICE_ABOVE: f64 = 1.0;

/// Display material for the bin.
pub fn bin_material() -> MaterialDef {
    MaterialDef {
        name: "bin".to_string(),
        color: [0.95, 0.6, 0.2],
    }
}

/// Display material for the lid.
pub fn lid_material() -> MaterialDef {
    MaterialDef {
        name: "lid".to_string(),
        color: [0.3, 0.6, 0.9],
    }
}

/// Everything one build produced.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Selected part.
    pub part: Part,
    /// Tolerances both parts were built from.
    pub tolerances: ToleranceSet,
    /// Output solids.
    pub scene: Scene,
}

impl BuildOutput {
    /// Lower to the IR.
    pub fn to_document(&self) -> Document {
        self.scene.to_document()
    }
}

/// A bin/lid pair for one parameter set.
pub struct CoveredBin<P: ProfileProvider = GridProfiles> {
    params: BuildParameters,
    provider: P,
    ctx: GridContext,
    tolerances: ToleranceSet,
    footprint: Footprint,
    lip: Profile,
    bin_lip: Solid,
}

impl CoveredBin<GridProfiles> {
    /// Pair on the standard grid.
    pub fn standard(params: BuildParameters) -> Self {
        Self::new(params, GridProfiles)
    }
}

impl<P: ProfileProvider> CoveredBin<P> {
    /// Resolve the shared context, tolerances and nominal lip.
    pub fn new(params: BuildParameters, provider: P) -> Self {
        let ctx = GridContext::from_params(&params);
        let tolerances = resolve(params.lid_fit_tolerance);
        let footprint = Footprint::outer(&ctx);
        let lip = provider.lip_profile(&ctx);
        let bin_lip = {
            let engine = FitEngine::new(&provider, &ctx, &tolerances);
            provider
                .sweep_rounded(&engine.build_bin_lip(&lip), &footprint)
                .translate(0.0, 0.0, ctx.body_height)
                .named("bin_lip")
        };
        Self {
            params,
            provider,
            ctx,
            tolerances,
            footprint,
            lip,
            bin_lip,
        }
    }

    /// Parameters this pair was built from.
    pub fn params(&self) -> &BuildParameters {
        &self.params
    }

    /// Grid context.
    pub fn context(&self) -> &GridContext {
        &self.ctx
    }

    /// Resolved tolerances.
    pub fn tolerances(&self) -> &ToleranceSet {
        &self.tolerances
    }

    /// Outer footprint.
    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    /// Fit engine over the shared context and tolerances.
    pub fn fit_engine(&self) -> FitEngine<'_, P> {
        FitEngine::new(&self.provider, &self.ctx, &self.tolerances)
    }

    /// Z range of the `slice` output.
    pub fn slice_range(&self) -> (f64, f64) {
        (
            self.ctx.body_height - SLICE_BELOW,
            self.ctx.lip_top() + SLICE_ABOVE,
        )
    }

    /// Footprint inside the outer wall.
    pub fn interior(&self) -> Footprint {
        self.footprint.inset(WALL_THICKNESS)
    }

    /// The bin lip swept around the footprint, in place.
    pub fn bin_lip(&self) -> &Solid {
        &self.bin_lip
    }

    /// Pocket cutter in place, stopping short of the bin lip; empty when
    /// pockets are disabled.
    pub fn pocket_cutter(&self) -> Solid {
        let body = self.ctx.body_height;
        let floor = self.pocket_floor();
        tessellate(
            &self.interior(),
            self.params.divx,
            self.params.divy,
            SEPARATOR_THICKNESS,
            body - floor,
        )
        .translate(0.0, 0.0, floor)
        .difference(&self.bin_lip)
    }

    /// Highest z any interior fill may reach.
    ///
    /// The seated lid lip dips up to the engagement clearance below the body
    /// top, so separators stop the vertical clearance below it.
    pub fn fill_ceiling(&self) -> f64 {
        self.ctx.body_height - self.tolerances.vertical
    }

    /// z of the pocket floors.
    pub fn pocket_floor(&self) -> f64 {
        let floor = self.ctx.floor_top();
        match self.params.interior {
            InteriorStyle::Minimal => floor,
            InteriorStyle::PartialRaised => floor + (self.ctx.body_height - floor) / 2.0,
        }
    }

    fn interior_fill(&self, pockets: bool) -> Solid {
        let floor = self.ctx.floor_top();
        let cutter = if pockets {
            self.pocket_cutter()
        } else {
            Solid::empty()
        };
        let top = if cutter.is_empty() {
            self.pocket_floor().min(self.fill_ceiling())
        } else {
            self.fill_ceiling()
        };
        if top <= floor {
            return Solid::empty();
        }
        let block = self
            .provider
            .rounded_rect(&self.interior())
            .extrude(top - floor)
            .translate(0.0, 0.0, floor);
        block.difference(&cutter).named("interior")
    }

    fn shell(&self, pockets: bool) -> Solid {
        let engine = self.fit_engine();

        let base = self.provider.base_grid(&self.ctx);
        let walls = self
            .provider
            .sweep_rounded(&self.provider.wall_profile(&self.ctx), &self.footprint)
            .named("walls");
        let floor = self
            .provider
            .rounded_rect(&self.footprint)
            .extrude(FLOOR_THICKNESS)
            .translate(0.0, 0.0, BASE_HEIGHT)
            .named("floor");
        let interior = self.interior_fill(pockets);

        let bin = Solid::union_all(&[base, walls, floor, self.bin_lip.clone(), interior]);

        let grips = build_grip_masks(self.params.grip, &self.footprint, &self.ctx);
        let tabs = engine.build_tabs(&self.footprint, self.tolerances.tab_insertion);
        bin.difference(&grips).union(&tabs.bosses)
    }

    /// The bin.
    pub fn bin(&self) -> Solid {
        debug!(
            grid_x = self.ctx.grid_x,
            grid_y = self.ctx.grid_y,
            body = self.ctx.body_height,
            "building bin"
        );
        self.shell(true).named("bin")
    }

    /// The bin as built with zero divisions: interior fill kept, pockets
    /// suppressed.
    pub fn bin_without_pockets(&self) -> Solid {
        self.shell(false).named("bin_without_pockets")
    }

    /// The lid in its seated position on the bin.
    pub fn lid(&self) -> Solid {
        let body = self.ctx.body_height;
        let h = self.tolerances.horizontal;
        let engine = self.fit_engine();
        debug!(body, "building lid");

        let plate = self
            .provider
            .rounded_rect(&self.footprint.inset(h))
            .extrude(LID_THICKNESS)
            .translate(0.0, 0.0, self.ctx.lip_top())
            .named("lid_plate");
        let lip = self
            .provider
            .sweep_rounded(&engine.build_lid_lip(&self.lip), &self.footprint)
            .translate(0.0, 0.0, body)
            .named("lid_lip");
        let tabs = engine.build_tabs(&self.footprint, self.tolerances.tab_insertion);

        plate.union(&lip).difference(&tabs.slots).named("lid")
    }

    /// The lid flipped plate-down with its top face at `z = 0`.
    pub fn lid_for_print(&self) -> Solid {
        self.lid()
            .rotate(180.0, 0.0, 0.0)
            .translate(0.0, 0.0, self.ctx.lip_top() + LID_THICKNESS)
    }

    /// X offset of the lid in the `both-open` preview.
    pub fn open_offset(&self) -> f64 {
        self.footprint.width + GRID_PITCH - 2.0 * TAB_DEPTH
    }

    /// Horizontal band of the pocket-free bin around the lip.
    pub fn slice(&self) -> Solid {
        let (lo, hi) = self.slice_range();
        let slab = Solid::cube(
            self.footprint.width + 2.0,
            self.footprint.depth + 2.0,
            hi - lo,
        )
        .translate(0.0, 0.0, (lo + hi) / 2.0);
        self.bin_without_pockets()
            .intersection(&slab)
            .named("slice")
    }

    /// Build the selected part(s).
    pub fn build(&self) -> BuildOutput {
        let mut scene = Scene::new();
        match self.params.part {
            Part::Bin => scene.add("bin", self.bin(), bin_material()),
            Part::Lid => scene.add("lid", self.lid_for_print(), lid_material()),
            Part::BothClosed => {
                scene.add("bin", self.bin(), bin_material());
                scene.add("lid", self.lid(), lid_material());
            }
            Part::BothOpen => {
                scene.add("bin", self.bin(), bin_material());
                scene.add(
                    "lid",
                    self.lid().translate(self.open_offset(), 0.0, 0.0),
                    lid_material(),
                );
            }
            Part::Slice => scene.add("slice", self.slice(), bin_material()),
        }

        info!(
            part = %self.params.part,
            parts = scene.len(),
            tolerance = self.tolerances.vertical,
            "build complete"
        );
        BuildOutput {
            part: self.params.part,
            tolerances: self.tolerances,
            scene,
        }
    }
}

/// Build `params` on the standard grid.
pub fn build(params: &BuildParameters) -> BuildOutput {
    CoveredBin::standard(params.clone()).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GripMode;
    use crate::classify::inside3;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn params(part: Part) -> BuildParameters {
        BuildParameters {
            part,
            ..BuildParameters::default()
        }
    }

    #[test]
    fn test_part_selection() {
        assert_eq!(build(&params(Part::Bin)).scene.len(), 1);
        assert_eq!(build(&params(Part::Lid)).scene.len(), 1);
        assert_eq!(build(&params(Part::BothClosed)).scene.len(), 2);
        assert_eq!(build(&params(Part::BothOpen)).scene.len(), 2);
        let slice = build(&params(Part::Slice));
        assert!(slice.scene.get("slice").is_some());
    }

    #[test]
    fn test_bin_solid_regions() {
        let pair = CoveredBin::standard(params(Part::Bin));
        let bin = pair.bin();
        // Body height 21, 2x2 => 83.5 wide.
        assert!(inside3(&bin, Point3::new(21.0, 21.0, 2.0)));
        assert!(inside3(&bin, Point3::new(0.0, 0.0, 5.5)));
        assert!(inside3(&bin, Point3::new(41.5, 0.0, 15.0)));
        // Open cavity without divisions.
        assert!(!inside3(&bin, Point3::new(0.0, 0.0, 15.0)));
        // Lip stands above the body.
        assert!(inside3(&bin, Point3::new(41.5, 10.0, 24.0)));
        assert!(!inside3(&bin, Point3::new(41.5, 10.0, 26.0)));
    }

    #[test]
    fn test_lid_print_orientation() {
        let pair = CoveredBin::standard(params(Part::Lid));
        let lid = pair.lid_for_print();
        // Plate now occupies z in [0, 2] and the lip points up.
        assert!(inside3(&lid, Point3::new(0.0, 0.0, 1.0)));
        assert!(!inside3(&lid, Point3::new(0.0, 0.0, -0.5)));
        assert!(inside3(&lid, Point3::new(0.0, 40.0, 3.0)));
    }

    #[test]
    fn test_seated_lid_sits_on_lip() {
        let pair = CoveredBin::standard(params(Part::BothClosed));
        let lid = pair.lid();
        let top = pair.context().lip_top();
        assert!(inside3(&lid, Point3::new(0.0, 0.0, top + 1.0)));
        assert!(!inside3(&lid, Point3::new(0.0, 0.0, top - 1.0)));
        assert!(!inside3(&lid, Point3::new(0.0, 0.0, top + LID_THICKNESS + 0.1)));
    }

    #[test]
    fn test_open_offset() {
        let pair = CoveredBin::standard(params(Part::BothOpen));
        assert_relative_eq!(pair.open_offset(), 83.5 + 42.0 - 1.2);
    }

    #[test]
    fn test_partial_raised_plateau() {
        let minimal = CoveredBin::standard(params(Part::Bin));
        let raised = CoveredBin::standard(BuildParameters {
            interior: InteriorStyle::PartialRaised,
            ..params(Part::Bin)
        });
        assert_relative_eq!(minimal.pocket_floor(), 6.2);
        assert_relative_eq!(raised.pocket_floor(), 6.2 + (21.0 - 6.2) / 2.0);

        let bin = raised.bin();
        assert!(inside3(&bin, Point3::new(0.0, 0.0, 10.0)));
        assert!(!inside3(&bin, Point3::new(0.0, 0.0, 15.0)));
    }

    #[test]
    fn test_fill_stops_under_seated_lid() {
        let pair = CoveredBin::standard(BuildParameters {
            divx: 2,
            divy: 2,
            ..params(Part::Bin)
        });
        assert_relative_eq!(pair.fill_ceiling(), 21.0 - 0.1);
        let bin = pair.bin();
        // Separator cross at the center.
        assert!(inside3(&bin, Point3::new(0.0, 0.0, 20.8)));
        assert!(!inside3(&bin, Point3::new(0.0, 0.0, 20.95)));
    }

    #[test]
    fn test_grips_cut_bin_not_lid() {
        let p = BuildParameters {
            grip: GripMode::Single,
            ..params(Part::BothClosed)
        };
        let pair = CoveredBin::standard(p);
        let y = pair.footprint().depth / 2.0 - 0.3;
        let z = pair.context().lip_top() - 1.4;
        let plain = CoveredBin::standard(params(Part::Bin)).bin();
        assert!(inside3(&plain, Point3::new(21.0, y, z)));
        assert!(!inside3(&pair.bin(), Point3::new(21.0, y, z)));
        // The lid plate above the slot is untouched.
        let plate = Point3::new(21.0, y - 0.5, pair.context().lip_top() + 1.0);
        assert!(inside3(&pair.lid(), plate));
    }
}
