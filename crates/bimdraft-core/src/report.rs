use crate::geom::BBox2;
use crate::visibility::VisibilityStats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub code: String,
    pub message: String,
}

impl Warning {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsReport {
    pub elements_total: usize,
    pub elements_rendered: usize,
    pub removed_degenerate_elements: usize,
    pub duplicate_ids: usize,
    pub objects_total: usize,
    pub removed_invalid_faces: usize,
    pub visibility: VisibilityStats,
    pub edges_unique: usize,
    pub edges_shared: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    pub output_format: String,
    pub stats: StatsReport,
    pub extents: Option<BBox2>,
    pub warnings: Vec<Warning>,
}

impl ExportReport {
    pub fn new(output_format: &str) -> Self {
        Self {
            output_format: output_format.to_string(),
            stats: StatsReport::default(),
            extents: None,
            warnings: Vec::new(),
        }
    }
}
