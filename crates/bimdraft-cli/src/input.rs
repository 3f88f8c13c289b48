use anyhow::{Context, Result};
use bimdraft_core::camera::Camera;
use bimdraft_core::model::{parse_canvas_elements, CanvasElement};
use bimdraft_core::report::Warning;
use bimdraft_core::scene::SceneObject;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInput {
    #[serde(default)]
    project_name: Option<String>,
    #[serde(default)]
    canvas: Vec<serde_json::Value>,
    #[serde(default)]
    objects: Vec<SceneObject>,
    #[serde(default)]
    camera: Option<Camera>,
}

/// Contents of an export input file. Canvas elements with an unknown
/// primitive type are skipped and reported in `warnings`.
#[derive(Debug)]
pub struct InputFile {
    pub project_name: Option<String>,
    pub canvas: Vec<CanvasElement>,
    pub objects: Vec<SceneObject>,
    pub camera: Option<Camera>,
    pub warnings: Vec<Warning>,
}

impl InputFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            std::fs::read_to_string(path).with_context(|| format!("read input: {path:?}"))?;
        Self::parse(&text).with_context(|| format!("parse input: {path:?}"))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawInput = serde_json::from_str(text).context("input is not valid export JSON")?;
        let (canvas, warnings) = parse_canvas_elements(&raw.canvas);
        Ok(Self {
            project_name: raw.project_name,
            canvas,
            objects: raw.objects,
            camera: raw.camera,
            warnings,
        })
    }

    /// Scene input wins whenever the file carries mesh objects.
    pub fn is_scene(&self) -> bool {
        !self.objects.is_empty()
    }
}
