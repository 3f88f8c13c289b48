//! JSON shapes exchanged with the format-generation service.

use bimdraft_core::scene::SceneObject;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One mesh as sent over the wire. Vertices are `[x, y, z]` triples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshPayload {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<Vec<usize>>,
    pub layer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl From<&SceneObject> for MeshPayload {
    fn from(object: &SceneObject) -> Self {
        Self {
            id: object.id.clone(),
            kind: object.kind.clone(),
            vertices: object.vertices.iter().map(|v| [v.x, v.y, v.z]).collect(),
            faces: object.faces.clone(),
            layer: object.layer.clone(),
            color: object.color.clone(),
        }
    }
}

impl MeshPayload {
    /// Faces with 3 or 4 in-range indices; anything else is skipped by writers.
    pub fn valid_faces(&self) -> impl Iterator<Item = &[usize]> {
        self.faces.iter().map(Vec::as_slice).filter(|face| {
            matches!(face.len(), 3 | 4) && face.iter().all(|&i| i < self.vertices.len())
        })
    }
}

/// CAD-exchange request. `layers` maps scene layer names to CAD layer names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CadExportRequest {
    pub objects: Vec<MeshPayload>,
    #[serde(default)]
    pub layers: BTreeMap<String, String>,
    pub scale: f64,
}

impl CadExportRequest {
    pub fn cad_layer<'a>(&'a self, layer: &'a str) -> &'a str {
        self.layers.get(layer).map(String::as_str).unwrap_or(layer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BimExportRequest {
    pub project_name: String,
    pub objects: Vec<MeshPayload>,
    pub scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    #[default]
    Zip,
    Tar,
}

impl ArchiveFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Tar => "tar",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "application/zip",
            ArchiveFormat::Tar => "application/x-tar",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub format: String,
    pub scale: f64,
    #[serde(default)]
    pub options: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchExportRequest {
    pub items: Vec<BatchItem>,
    pub archive_format: ArchiveFormat,
    pub include_metadata: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_content_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DelegateResponse {
    pub fn ok(binary_content_base64: String) -> Self {
        Self {
            success: true,
            binary_content_base64: Some(binary_content_base64),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            binary_content_base64: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_content_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchResponse {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStatus {
    #[serde(default)]
    pub current_item: Option<String>,
    pub items_processed: usize,
    pub total_items: usize,
    pub progress_percent: f64,
    pub status: String,
}

impl ProgressStatus {
    pub const TERMINAL: [&'static str; 3] = ["completed", "failed", "cancelled"];

    pub fn is_terminal(&self) -> bool {
        Self::TERMINAL
            .iter()
            .any(|s| self.status.eq_ignore_ascii_case(s))
    }

    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("completed")
    }
}
