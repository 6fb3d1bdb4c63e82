//! OpenSCAD source emission.
//!
//! Each IR node becomes one zero-argument module named `n<id>`, so shared
//! subtrees stay shared in the emitted source. Modules are written in
//! topological order (dependencies first), followed by one colored call per
//! scene entry.
//!
//! # Example
//!
//! ```text
//! // coverbin 0.1
//! module n1() { cube([10, 20, 3], center = true); } // plate
//! module n2() { cylinder(r = 2, h = 10, center = true); } // hole
//! module n3() { difference() { n1(); n2(); } }
//!
//! // plate
//! color([0.2, 0.5, 0.8]) n3();
//! ```

use crate::{CsgOp, Document, IrError, Node, NodeId, Vec2, Vec3};

/// Render a document as OpenSCAD source.
pub fn to_scad(doc: &Document) -> Result<String, IrError> {
    doc.validate()?;

    let mut out = format!("// coverbin {}\n", doc.version);
    for id in doc.topological_order()? {
        let node = &doc.nodes[&id];
        out.push_str(&format_node(node));
        out.push('\n');
    }

    for entry in &doc.roots {
        out.push('\n');
        out.push_str(&format!("// {}\n", entry.name));
        match doc.materials.get(&entry.material) {
            Some(mat) => out.push_str(&format!(
                "color([{}, {}, {}]) {}();\n",
                mat.color[0],
                mat.color[1],
                mat.color[2],
                module_name(entry.root)
            )),
            None => out.push_str(&format!("{}();\n", module_name(entry.root))),
        }
    }

    Ok(out)
}

fn module_name(id: NodeId) -> String {
    format!("n{}", id)
}

fn call(id: NodeId) -> String {
    format!("{}();", module_name(id))
}

fn vec2(v: &Vec2) -> String {
    format!("[{}, {}]", v.x, v.y)
}

fn vec3(v: &Vec3) -> String {
    format!("[{}, {}, {}]", v.x, v.y, v.z)
}

fn fragments(segments: u32) -> String {
    if segments == 0 {
        String::new()
    } else {
        format!(", $fn = {}", segments)
    }
}

fn format_node(node: &Node) -> String {
    let body = format_op(&node.op);
    let suffix = node
        .name
        .as_deref()
        .map(|n| format!(" // {}", n))
        .unwrap_or_default();
    format!("module {}() {{ {} }}{}", module_name(node.id), body, suffix)
}

fn format_op(op: &CsgOp) -> String {
    match op {
        CsgOp::Rect { size } => format!("square({}, center = true);", vec2(size)),
        CsgOp::Circle { radius, segments } => {
            format!("circle(r = {}{});", radius, fragments(*segments))
        }
        CsgOp::Polygon { points } => {
            let pts: Vec<String> = points.iter().map(vec2).collect();
            format!("polygon([{}]);", pts.join(", "))
        }
        CsgOp::Offset { child, delta } => format!("offset(r = {}) {}", delta, call(*child)),
        CsgOp::Cube { size } => format!("cube({}, center = true);", vec3(size)),
        CsgOp::Cylinder {
            radius,
            height,
            segments,
        } => format!(
            "cylinder(r = {}, h = {}, center = true{});",
            radius,
            height,
            fragments(*segments)
        ),
        CsgOp::Empty => String::new(),
        CsgOp::Union { left, right } => {
            format!("union() {{ {} {} }}", call(*left), call(*right))
        }
        CsgOp::Difference { left, right } => {
            format!("difference() {{ {} {} }}", call(*left), call(*right))
        }
        CsgOp::Intersection { left, right } => {
            format!("intersection() {{ {} {} }}", call(*left), call(*right))
        }
        CsgOp::Translate { child, offset } => {
            format!("translate({}) {}", vec3(offset), call(*child))
        }
        CsgOp::Rotate { child, angles } => format!("rotate({}) {}", vec3(angles), call(*child)),
        CsgOp::Scale { child, factor } => format!("scale({}) {}", vec3(factor), call(*child)),
        CsgOp::LinearExtrude { profile, height } => {
            format!("linear_extrude(height = {}) {}", height, call(*profile))
        }
        CsgOp::RotateExtrude {
            profile,
            angle,
            segments,
        } => format!(
            "rotate_extrude(angle = {}{}) {}",
            angle,
            fragments(*segments),
            call(*profile)
        ),
        CsgOp::GridPattern {
            child,
            count,
            pitch,
        } => format!(
            "for (i = [0 : {}], j = [0 : {}]) translate([(i - {} / 2) * {}, (j - {} / 2) * {}, 0]) {}",
            count[0].saturating_sub(1),
            count[1].saturating_sub(1),
            count[0].saturating_sub(1),
            pitch.x,
            count[1].saturating_sub(1),
            pitch.y,
            call(*child)
        ),
    }
}
