//! Extents used to auto-size output viewports. Never used for culling.

use crate::geom::{BBox2, BBox3, Vec2};
use crate::model::CanvasElement;
use crate::scene::SceneObject;
use crate::visibility::ProjectedObject;

pub fn compute_bounds(elements: &[CanvasElement]) -> Option<BBox2> {
    let bbox = elements
        .iter()
        .fold(BBox2::empty(), |acc, e| acc.union(&e.bbox()));
    (!bbox.is_empty()).then_some(bbox)
}

pub fn scene_bounds(objects: &[SceneObject]) -> Option<BBox3> {
    let mut bbox = BBox3::empty();
    for object in objects {
        for v in &object.vertices {
            bbox.include_point(*v);
        }
    }
    (!bbox.is_empty()).then_some(bbox)
}

/// Screen-space extent of the faces that survived visibility.
pub fn projected_bounds(objects: &[ProjectedObject<'_>]) -> Option<BBox2> {
    let mut bbox = BBox2::empty();
    for object in objects {
        for face in &object.faces {
            for p in &face.points {
                bbox.include_point(Vec2::new(p.x, p.y));
            }
        }
    }
    (!bbox.is_empty()).then_some(bbox)
}
