//! Three-by-two divided bin with its lid laid beside it.

use coverbin::{build, BuildParameters, GripMode, Part};

fn main() {
    let params = BuildParameters {
        grid_x: 3,
        grid_y: 2,
        divx: 3,
        divy: 2,
        grip: GripMode::Single,
        part: Part::BothOpen,
        ..BuildParameters::default()
    };

    let output = build(&params);
    println!(
        "clearances: horizontal {:.3}, vertical {:.3}, tab {:.3}",
        output.tolerances.horizontal, output.tolerances.vertical, output.tolerances.tab_insertion
    );

    let doc = output.to_document();
    let scad = coverbin_ir::to_scad(&doc).unwrap();
    std::fs::write("divided_bin.scad", scad).unwrap();
    println!("wrote divided_bin.scad ({} nodes)", doc.nodes.len());
}
