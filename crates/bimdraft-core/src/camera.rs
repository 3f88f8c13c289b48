//! Camera description and point projection.
//!
//! Camera space uses the orthonormal basis built from position/target/up.
//! Depth is measured along the forward axis and is positive in front of the
//! camera. Screen space has its origin at the top-left corner with Y down.

use crate::geom::Vec3;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const BASIS_EPSILON: f64 = 1e-12;

#[derive(Debug, Error, PartialEq)]
pub enum CameraError {
    #[error("camera position coincides with its target")]
    CoincidentTarget,
    #[error("camera up vector is zero or parallel to the view direction")]
    DegenerateUp,
    #[error("field of view must be in (0, 180) degrees, got {0}")]
    InvalidFieldOfView(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    #[serde(default = "default_fov")]
    pub fov_deg: f64,
    #[serde(default)]
    pub orthographic: bool,
}

fn default_fov() -> f64 {
    50.0
}

impl Camera {
    pub fn perspective(position: Vec3, target: Vec3, up: Vec3, fov_deg: f64) -> Self {
        Self {
            position,
            target,
            up,
            fov_deg,
            orthographic: false,
        }
    }

    pub fn orthographic(position: Vec3, target: Vec3, up: Vec3) -> Self {
        Self {
            position,
            target,
            up,
            fov_deg: default_fov(),
            orthographic: true,
        }
    }

    /// Builds the orthonormal camera basis. The caller's `up` only picks the
    /// roll; the basis up is re-derived so non-orthogonal input is tolerated.
    pub fn basis(&self) -> Result<CameraBasis, CameraError> {
        let position = to_na(self.position);
        let view = to_na(self.target) - position;
        if view.norm() <= BASIS_EPSILON {
            return Err(CameraError::CoincidentTarget);
        }
        let forward = view.normalize();

        let side = forward.cross(&to_na(self.up));
        if side.norm() <= BASIS_EPSILON {
            return Err(CameraError::DegenerateUp);
        }
        let right = side.normalize();
        let up = right.cross(&forward);

        Ok(CameraBasis {
            position,
            right,
            up,
            forward,
        })
    }

    pub fn projector(&self, width: f64, height: f64) -> Result<Projector, CameraError> {
        if !self.orthographic && !(self.fov_deg > 0.0 && self.fov_deg < 180.0) {
            return Err(CameraError::InvalidFieldOfView(self.fov_deg));
        }
        let basis = self.basis()?;
        let focal = if self.orthographic {
            1.0
        } else {
            1.0 / (self.fov_deg.to_radians() / 2.0).tan()
        };
        Ok(Projector {
            basis,
            width,
            height,
            focal,
            orthographic: self.orthographic,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub position: Vector3<f64>,
    pub right: Vector3<f64>,
    pub up: Vector3<f64>,
    pub forward: Vector3<f64>,
}

impl CameraBasis {
    /// `(x, y, depth)` of a world point in camera space.
    pub fn to_camera_space(&self, p: Vec3) -> Vector3<f64> {
        let d = to_na(p) - self.position;
        Vector3::new(d.dot(&self.right), d.dot(&self.up), d.dot(&self.forward))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
}

impl ScreenPoint {
    pub const INVALID: ScreenPoint = ScreenPoint {
        x: f64::NAN,
        y: f64::NAN,
        depth: f64::NAN,
    };

    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A camera bound to a canvas size. Immutable for the duration of an export.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    basis: CameraBasis,
    width: f64,
    height: f64,
    focal: f64,
    orthographic: bool,
}

impl Projector {
    /// Projects a world point to screen space. Returns `None` under
    /// perspective when the point is at or behind the camera plane.
    pub fn project(&self, p: Vec3) -> Option<ScreenPoint> {
        let cam = self.basis.to_camera_space(p);
        let (cx, cy, depth) = (cam.x, cam.y, cam.z);

        if self.orthographic {
            return Some(ScreenPoint {
                x: cx + self.width / 2.0,
                y: self.height / 2.0 - cy,
                depth,
            });
        }

        if depth <= 0.0 {
            return None;
        }
        let aspect = if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        };
        // Aspect scales X only: the vertical field of view is `fov`, so pixels stay square.
        let x = (cx * self.focal / (aspect * depth) + 0.5) * self.width;
        let y = (0.5 - cy * self.focal / depth) * self.height;
        let point = ScreenPoint { x, y, depth };
        point.is_valid().then_some(point)
    }

    /// [`Projector::project`] with the NaN sentinel in place of `None`.
    pub fn project_or_nan(&self, p: Vec3) -> ScreenPoint {
        self.project(p).unwrap_or(ScreenPoint::INVALID)
    }
}

fn to_na(p: Vec3) -> Vector3<f64> {
    Vector3::new(p.x, p.y, p.z)
}
