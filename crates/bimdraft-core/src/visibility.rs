//! Back-face culling, behind-camera rejection and section-plane clipping.
//!
//! Face order in the input is the draw order; there is no depth sorting.

use crate::camera::{Projector, ScreenPoint};
use crate::geom::Vec3;
use crate::scene::SceneObject;
use serde::{Deserialize, Serialize};

/// Horizontal cutting plane. Geometry at or above `z` is kept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionPlane {
    pub z: f64,
    pub tolerance: f64,
}

impl SectionPlane {
    pub fn new(z: f64) -> Self {
        Self { z, tolerance: 1e-3 }
    }

    /// Plane-membership test on the face's vertices. A face wholly above the
    /// plane is kept as is. A face crossing the plane survives as cut geometry
    /// only when at least three of its vertices sit on the plane; no
    /// polygon/plane intersection is computed.
    pub fn classify(&self, vertices: &[Vec3], face: &[usize]) -> FaceClip {
        let above = face.iter().filter(|&&i| vertices[i].z >= self.z).count();
        let on_plane = face
            .iter()
            .filter(|&&i| (vertices[i].z - self.z).abs() <= self.tolerance)
            .count();

        if above == face.len() {
            FaceClip::Keep
        } else if above == 0 {
            FaceClip::Drop
        } else if on_plane >= 3 {
            FaceClip::KeepCut
        } else {
            FaceClip::Drop
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceClip {
    Keep,
    KeepCut,
    Drop,
}

#[derive(Debug, Clone)]
pub struct VisibilityConfig {
    pub show_hidden_lines: bool,
    pub section: Option<SectionPlane>,
    /// Faces whose front-facing screen area does not exceed this are culled.
    pub min_face_area: f64,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            show_hidden_lines: false,
            section: None,
            min_face_area: 1e-9,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityStats {
    pub faces_total: usize,
    pub faces_visible: usize,
    pub clipped_by_section: usize,
    pub rejected_behind_camera: usize,
    pub culled_back_facing: usize,
    pub cut_faces: usize,
}

#[derive(Debug, Clone)]
pub struct VisibleFace {
    /// Index into the object's face list.
    pub face_index: usize,
    pub points: Vec<ScreenPoint>,
    pub cut: bool,
}

#[derive(Debug, Clone)]
pub struct ProjectedObject<'a> {
    pub object: &'a SceneObject,
    /// Screen position of every vertex, `None` where projection failed.
    pub screen: Vec<Option<ScreenPoint>>,
    pub faces: Vec<VisibleFace>,
    pub is_cut_geometry: bool,
}

impl ProjectedObject<'_> {
    pub fn indices(&self, face: &VisibleFace) -> &[usize] {
        &self.object.faces[face.face_index]
    }
}

/// Signed area of the triangle formed by the first three points, measured
/// with the screen Y axis pointing up so that faces wound counter-clockwise
/// towards the viewer come out positive.
pub fn signed_area(points: &[ScreenPoint]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let (x0, y0) = (points[0].x, -points[0].y);
    let (x1, y1) = (points[1].x, -points[1].y);
    let (x2, y2) = (points[2].x, -points[2].y);
    0.5 * (x0 * (y1 - y2) + x1 * (y2 - y0) + x2 * (y0 - y1))
}

/// Runs clipping, projection and culling over every object. Objects with no
/// surviving faces are still returned so callers can account for them.
pub fn project_scene<'a>(
    objects: &'a [SceneObject],
    projector: &Projector,
    cfg: &VisibilityConfig,
) -> (Vec<ProjectedObject<'a>>, VisibilityStats) {
    let mut stats = VisibilityStats::default();
    let mut out = Vec::with_capacity(objects.len());

    for object in objects {
        let screen: Vec<Option<ScreenPoint>> =
            object.vertices.iter().map(|v| projector.project(*v)).collect();
        let mut faces = Vec::new();

        for (face_index, face) in object.faces.iter().enumerate() {
            if !object.is_valid_face(face) {
                continue;
            }
            stats.faces_total += 1;

            let clip = match &cfg.section {
                Some(plane) => plane.classify(&object.vertices, face),
                None => FaceClip::Keep,
            };
            if clip == FaceClip::Drop {
                stats.clipped_by_section += 1;
                continue;
            }

            let Some(points) = face.iter().map(|&i| screen[i]).collect::<Option<Vec<_>>>() else {
                stats.rejected_behind_camera += 1;
                continue;
            };

            if !cfg.show_hidden_lines && signed_area(&points) <= cfg.min_face_area {
                stats.culled_back_facing += 1;
                continue;
            }

            let cut = clip == FaceClip::KeepCut;
            if cut {
                stats.cut_faces += 1;
            }
            stats.faces_visible += 1;
            faces.push(VisibleFace {
                face_index,
                points,
                cut,
            });
        }

        let is_cut_geometry = faces.iter().any(|f| f.cut);
        out.push(ProjectedObject {
            object,
            screen,
            faces,
            is_cut_geometry,
        });
    }

    tracing::debug!(
        faces_total = stats.faces_total,
        faces_visible = stats.faces_visible,
        clipped = stats.clipped_by_section,
        behind_camera = stats.rejected_behind_camera,
        back_facing = stats.culled_back_facing,
        "scene visibility pass"
    );

    (out, stats)
}

/// Applies a section plane to the meshes themselves, returning fresh copies
/// with dropped faces removed and `is_cut_geometry` set where the plane
/// touched a retained face. Inputs are left untouched.
pub fn clip_scene(objects: &[SceneObject], plane: &SectionPlane) -> Vec<SceneObject> {
    objects
        .iter()
        .filter_map(|object| {
            let mut cut = false;
            let faces: Vec<Vec<usize>> = object
                .faces
                .iter()
                .filter(|face| object.is_valid_face(face))
                .filter(|face| match plane.classify(&object.vertices, face) {
                    FaceClip::Keep => true,
                    FaceClip::KeepCut => {
                        cut = true;
                        true
                    }
                    FaceClip::Drop => false,
                })
                .cloned()
                .collect();
            if faces.is_empty() {
                return None;
            }
            let mut clipped = object.clone();
            clipped.faces = faces;
            clipped.is_cut_geometry = cut;
            Some(clipped)
        })
        .collect()
}
