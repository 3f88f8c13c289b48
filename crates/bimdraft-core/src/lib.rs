//! Geometry core of the drawing export engine: canvas primitives, scene
//! meshes, camera projection, visibility, edge extraction and extents.

pub mod bounds;
pub mod camera;
pub mod edges;
pub mod geom;
pub mod model;
pub mod normalize;
pub mod report;
pub mod scene;
pub mod visibility;
