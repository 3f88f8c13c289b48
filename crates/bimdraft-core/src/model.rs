use crate::geom::{BBox2, Vec2};
use crate::report::Warning;
use serde::{Deserialize, Serialize};

/// Presentation attributes shared by every canvas primitive.
///
/// `layer` is advisory: it drives CAD-layer mapping downstream and never
/// changes geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Style {
    pub layer: String,
    pub stroke_color: String,
    pub fill_color: Option<String>,
    pub stroke_width: f64,
    pub opacity: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            layer: "0".to_string(),
            stroke_color: "#000000".to_string(),
            fill_color: None,
            stroke_width: 1.0,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSeg2D {
    pub p1: Vec2,
    pub p2: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle2D {
    pub center: Vec2,
    pub radius: f64,
}

/// Angles are measured in canvas coordinates (Y down), so increasing angle
/// turns clockwise on screen. `ccw` selects the opposite, decreasing direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arc2D {
    pub center: Vec2,
    pub radius: f64,
    pub start_angle_deg: f64,
    pub end_angle_deg: f64,
    #[serde(default)]
    pub ccw: bool,
}

impl Arc2D {
    pub fn point_at(&self, angle_deg: f64) -> Vec2 {
        let a = angle_deg.to_radians();
        Vec2::new(
            self.center.x + self.radius * a.cos(),
            self.center.y + self.radius * a.sin(),
        )
    }

    /// Angular extent in degrees, walking in the arc's own direction.
    pub fn sweep_deg(&self) -> f64 {
        let raw = if self.ccw {
            self.start_angle_deg - self.end_angle_deg
        } else {
            self.end_angle_deg - self.start_angle_deg
        };
        let sweep = raw.rem_euclid(360.0);
        if sweep == 0.0 && raw != 0.0 {
            360.0
        } else {
            sweep
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline2D {
    pub points: Vec<Vec2>,
    #[serde(default)]
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect2D {
    pub origin: Vec2,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text2D {
    pub position: Vec2,
    pub text: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub anchor: TextAnchor,
}

fn default_font_size() -> f64 {
    12.0
}

fn default_font_family() -> String {
    "sans-serif".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension2D {
    pub p1: Vec2,
    pub p2: Vec2,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub offset: f64,
}

impl Dimension2D {
    pub fn measured_length(&self) -> f64 {
        self.p2.sub(self.p1).length()
    }

    /// The label as drawn: the caller's text, or the measured length.
    pub fn display_label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => format!("{:.2}", self.measured_length()),
        }
    }

    /// Endpoints of the dimension line, shifted `offset` along the left-hand normal.
    pub fn offset_line(&self) -> (Vec2, Vec2) {
        match self.p2.sub(self.p1).unit_normal() {
            Some(n) => {
                let shift = n.scale(self.offset);
                (self.p1.add(shift), self.p2.add(shift))
            }
            None => (self.p1, self.p2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Primitive2D {
    Line(LineSeg2D),
    Circle(Circle2D),
    Arc(Arc2D),
    Polyline(Polyline2D),
    Rectangle(Rect2D),
    Text(Text2D),
    Dimension(Dimension2D),
}

impl Primitive2D {
    pub fn type_name(&self) -> &'static str {
        match self {
            Primitive2D::Line(_) => "line",
            Primitive2D::Circle(_) => "circle",
            Primitive2D::Arc(_) => "arc",
            Primitive2D::Polyline(_) => "polyline",
            Primitive2D::Rectangle(_) => "rectangle",
            Primitive2D::Text(_) => "text",
            Primitive2D::Dimension(_) => "dimension",
        }
    }

    /// Extremal points of the primitive. Arcs use the full circle, which is
    /// always a superset of the true sweep.
    pub fn bbox(&self) -> BBox2 {
        let mut bbox = BBox2::empty();
        match self {
            Primitive2D::Line(line) => {
                bbox.include_point(line.p1);
                bbox.include_point(line.p2);
            }
            Primitive2D::Circle(Circle2D { center, radius })
            | Primitive2D::Arc(Arc2D { center, radius, .. }) => {
                let r = *radius;
                bbox.include_point(Vec2::new(center.x - r, center.y - r));
                bbox.include_point(Vec2::new(center.x + r, center.y + r));
            }
            Primitive2D::Polyline(poly) => {
                for p in &poly.points {
                    bbox.include_point(*p);
                }
            }
            Primitive2D::Rectangle(rect) => {
                bbox.include_point(rect.origin);
                bbox.include_point(Vec2::new(
                    rect.origin.x + rect.width,
                    rect.origin.y + rect.height,
                ));
            }
            Primitive2D::Text(text) => bbox.include_point(text.position),
            Primitive2D::Dimension(dim) => {
                let (a, b) = dim.offset_line();
                for p in [dim.p1, dim.p2, a, b] {
                    bbox.include_point(p);
                }
            }
        }
        bbox
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasElement {
    pub id: String,
    pub primitive: Primitive2D,
    #[serde(default)]
    pub style: Style,
}

impl CanvasElement {
    pub fn bbox(&self) -> BBox2 {
        self.primitive.bbox()
    }
}

/// Decodes canvas elements one at a time so that a single element with an
/// unknown or malformed primitive is skipped instead of failing the batch.
pub fn parse_canvas_elements(values: &[serde_json::Value]) -> (Vec<CanvasElement>, Vec<Warning>) {
    let mut elements = Vec::with_capacity(values.len());
    let mut warnings = Vec::new();
    for (index, value) in values.iter().enumerate() {
        match serde_json::from_value::<CanvasElement>(value.clone()) {
            Ok(element) => elements.push(element),
            Err(err) => {
                let tag = value
                    .get("primitive")
                    .and_then(|p| p.get("type"))
                    .and_then(|t| t.as_str())
                    .unwrap_or("<missing>");
                tracing::warn!(index, tag, error = %err, "skipping canvas element");
                warnings.push(Warning {
                    code: "unknown_element".to_string(),
                    message: format!("element #{index} (type '{tag}') skipped: {err}"),
                });
            }
        }
    }
    (elements, warnings)
}
