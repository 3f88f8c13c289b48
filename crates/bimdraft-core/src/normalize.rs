use crate::model::{CanvasElement, Primitive2D};
use crate::report::Warning;
use crate::scene::SceneObject;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct NormalizeConfig {
    pub min_entity_length: f64,
    pub drop_degenerate_entities: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            min_entity_length: 1e-6,
            drop_degenerate_entities: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NormalizeStats {
    pub removed_degenerate_entities: usize,
    pub duplicate_ids: usize,
    pub removed_invalid_faces: usize,
    pub warnings: Vec<Warning>,
}

/// Drops degenerate canvas elements and reports duplicate identifiers.
/// Duplicates are kept: id uniqueness is the caller's contract.
pub fn normalize_canvas(
    elements: &mut Vec<CanvasElement>,
    cfg: &NormalizeConfig,
) -> NormalizeStats {
    let mut stats = NormalizeStats::default();

    let mut seen = HashSet::new();
    for e in elements.iter() {
        if !seen.insert(e.id.as_str()) {
            stats.duplicate_ids += 1;
            stats.warnings.push(Warning::new(
                "duplicate_id",
                format!("element id '{}' is used more than once", e.id),
            ));
        }
    }

    if cfg.drop_degenerate_entities {
        let min_len = cfg.min_entity_length;
        let before = elements.len();
        elements.retain(|e| !is_degenerate(&e.primitive, min_len));
        stats.removed_degenerate_entities = before.saturating_sub(elements.len());
    }

    stats
}

/// Removes faces with an unsupported arity or out-of-range vertex indices.
pub fn normalize_scene(objects: &mut [SceneObject]) -> NormalizeStats {
    let mut stats = NormalizeStats::default();
    for object in objects.iter_mut() {
        let before = object.faces.len();
        let vertex_count = object.vertices.len();
        object
            .faces
            .retain(|f| matches!(f.len(), 3 | 4) && f.iter().all(|&i| i < vertex_count));
        let removed = before - object.faces.len();
        if removed > 0 {
            stats.removed_invalid_faces += removed;
            stats.warnings.push(Warning::new(
                "invalid_faces",
                format!("object '{}': dropped {removed} malformed face(s)", object.id),
            ));
        }
    }
    stats
}

fn is_degenerate(p: &Primitive2D, min_len: f64) -> bool {
    match p {
        Primitive2D::Line(l) => l.p2.sub(l.p1).length() <= min_len,
        Primitive2D::Circle(c) => c.radius <= min_len,
        Primitive2D::Arc(a) => a.radius <= min_len,
        Primitive2D::Polyline(pl) => pl.points.len() < 2,
        Primitive2D::Rectangle(r) => r.width.abs() <= min_len || r.height.abs() <= min_len,
        Primitive2D::Text(t) => t.text.is_empty(),
        Primitive2D::Dimension(d) => d.measured_length() <= min_len,
    }
}
