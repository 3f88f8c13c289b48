use crate::error::ExportError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Vector document, rendered in-process.
    Svg,
    /// CAD exchange, delegated.
    Dxf,
    /// BIM exchange, delegated.
    Ifc,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Svg => "svg",
            ExportFormat::Dxf => "dxf",
            ExportFormat::Ifc => "ifc",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Svg => bimdraft_svg::MIME_TYPE,
            ExportFormat::Dxf => "application/dxf",
            ExportFormat::Ifc => "application/x-step",
        }
    }

    pub fn is_delegated(self) -> bool {
        !matches!(self, ExportFormat::Svg)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(ExportFormat::Svg),
            "dxf" => Ok(ExportFormat::Dxf),
            "ifc" => Ok(ExportFormat::Ifc),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Which input items take part in an export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExportScope {
    #[default]
    All,
    Selection(Vec<String>),
}

impl ExportScope {
    pub fn includes(&self, id: &str) -> bool {
        match self {
            ExportScope::All => true,
            ExportScope::Selection(ids) => ids.iter().any(|s| s == id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_formats_case_insensitively() {
        assert_eq!(ExportFormat::Svg, "SVG".parse().unwrap());
        assert_eq!(ExportFormat::Ifc, " ifc ".parse().unwrap());
        assert!(matches!(
            "pdf".parse::<ExportFormat>(),
            Err(ExportError::UnsupportedFormat(f)) if f == "pdf"
        ));
    }

    #[test]
    fn selection_scope_filters_by_id() {
        let scope = ExportScope::Selection(vec!["a".into(), "c".into()]);
        assert!(scope.includes("a"));
        assert!(!scope.includes("b"));
        assert!(ExportScope::All.includes("b"));
    }
}
