//! DXF output for the in-process CAD-exchange path.

use crate::error::DelegateError;
use crate::protocol::{CadExportRequest, MeshPayload};
use dxf::entities::{Entity, EntityType, Face3D};
use dxf::tables::Layer;
use dxf::{Color, Drawing, Point};
use std::collections::BTreeSet;

/// Writes one `3DFACE` per valid face, on the object's mapped layer.
/// Triangles repeat their third corner, as DXF expects.
pub fn mesh_dxf(request: &CadExportRequest) -> Result<Vec<u8>, DelegateError> {
    let mut drawing = Drawing::new();
    let scale = effective_scale(request.scale);

    let layer_names: BTreeSet<&str> = request
        .objects
        .iter()
        .map(|o| request.cad_layer(&o.layer))
        .collect();
    for name in layer_names {
        if name == "0" {
            continue;
        }
        let mut layer = Layer::default();
        layer.name = name.to_string();
        drawing.add_layer(layer);
    }

    let mut faces_written = 0usize;
    for object in &request.objects {
        let layer = request.cad_layer(&object.layer).to_string();
        let color = object.color.as_deref().and_then(hex_to_aci);
        for face in object.valid_faces() {
            let mut entity = Entity::new(EntityType::Face3D(face_3d(object, face, scale)));
            entity.common.layer = layer.clone();
            if let Some(index) = color {
                entity.common.color = Color::from_index(index);
            }
            drawing.add_entity(entity);
            faces_written += 1;
        }
    }
    tracing::debug!(faces = faces_written, "wrote DXF faces");

    let mut out = Vec::new();
    drawing
        .save(&mut out)
        .map_err(|e| DelegateError::Encode(format!("DXF: {e}")))?;
    Ok(out)
}

fn face_3d(object: &MeshPayload, face: &[usize], scale: f64) -> Face3D {
    let corner = |k: usize| {
        let [x, y, z] = object.vertices[face[k.min(face.len() - 1)]];
        Point::new(x * scale, y * scale, z * scale)
    };
    let mut f = Face3D::default();
    f.first_corner = corner(0);
    f.second_corner = corner(1);
    f.third_corner = corner(2);
    f.fourth_corner = corner(3);
    f
}

pub(crate) fn effective_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

/// Nearest of the basic AutoCAD colour indices to a `#rrggbb` string.
fn hex_to_aci(hex: &str) -> Option<u8> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);

    // Index 7 is the foreground colour: white on dark backgrounds, black on light.
    const PALETTE: [(u8, (i32, i32, i32)); 9] = [
        (1, (255, 0, 0)),
        (2, (255, 255, 0)),
        (3, (0, 255, 0)),
        (4, (0, 255, 255)),
        (5, (0, 0, 255)),
        (6, (255, 0, 255)),
        (7, (255, 255, 255)),
        (7, (0, 0, 0)),
        (8, (128, 128, 128)),
    ];
    PALETTE
        .iter()
        .min_by_key(|(_, (pr, pg, pb))| {
            let (dr, dg, db) = (pr - r as i32, pg - g as i32, pb - b as i32);
            dr * dr + dg * dg + db * db
        })
        .map(|(index, _)| *index)
}
