use crate::geom::Vec3;
use serde::{Deserialize, Serialize};

/// A mesh object. Faces hold 3 or 4 indices into this object's own vertex
/// list; quads are not triangulated and are treated as planar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneObject {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Vec<usize>>,
    #[serde(default = "default_layer")]
    pub layer: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_cut_geometry: bool,
}

fn default_layer() -> String {
    "0".to_string()
}

impl SceneObject {
    pub fn new(id: impl Into<String>, vertices: Vec<Vec3>, faces: Vec<Vec<usize>>) -> Self {
        Self {
            id: id.into(),
            kind: String::new(),
            vertices,
            faces,
            layer: default_layer(),
            color: None,
            is_cut_geometry: false,
        }
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = layer.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Whether `face` has a supported arity and only addresses existing vertices.
    pub fn is_valid_face(&self, face: &[usize]) -> bool {
        matches!(face.len(), 3 | 4) && face.iter().all(|&i| i < self.vertices.len())
    }
}

/// Axis-aligned box from `min` to `max` with outward, counter-clockwise quads.
pub fn box_object(id: impl Into<String>, min: Vec3, max: Vec3) -> SceneObject {
    let vertices = vec![
        Vec3::new(min.x, min.y, min.z),
        Vec3::new(max.x, min.y, min.z),
        Vec3::new(max.x, max.y, min.z),
        Vec3::new(min.x, max.y, min.z),
        Vec3::new(min.x, min.y, max.z),
        Vec3::new(max.x, min.y, max.z),
        Vec3::new(max.x, max.y, max.z),
        Vec3::new(min.x, max.y, max.z),
    ];
    let faces = vec![
        vec![0, 3, 2, 1], // bottom
        vec![4, 5, 6, 7], // top
        vec![0, 1, 5, 4], // front (-y)
        vec![1, 2, 6, 5], // right (+x)
        vec![2, 3, 7, 6], // back (+y)
        vec![3, 0, 4, 7], // left (-x)
    ];
    let mut obj = SceneObject::new(id, vertices, faces);
    obj.kind = "box".to_string();
    obj
}
