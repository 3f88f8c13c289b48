//! Vector document serializer.
//!
//! Canvas primitives and projected scene meshes are written as SVG. Every
//! drawable carries `data-id`/`data-layer` so output can be traced back to
//! its source element.

pub mod writer;

use bimdraft_core::bounds::{compute_bounds, projected_bounds};
use bimdraft_core::camera::{Camera, CameraError};
use bimdraft_core::edges::unique_edges;
use bimdraft_core::geom::{BBox2, Vec2};
use bimdraft_core::model::{Arc2D, CanvasElement, Dimension2D, Primitive2D, Rect2D, Style, Text2D};
use bimdraft_core::report::{ExportReport, Warning};
use bimdraft_core::scene::SceneObject;
use bimdraft_core::visibility::{project_scene, ProjectedObject, VisibilityConfig};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use writer::{comment_safe, escape, Num};

pub const MIME_TYPE: &str = "image/svg+xml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub project_name: String,
    pub generated_at: String,
}

#[derive(Debug, Clone)]
pub struct SvgOptions {
    /// Canvas size used for projection and as the fallback viewport.
    pub width: f64,
    pub height: f64,
    /// Explicit viewport in drawing coordinates; wins over auto-fit.
    pub viewport: Option<BBox2>,
    pub auto_fit: bool,
    pub padding: f64,
    /// Uniform output-space scale, applied after all geometry decisions.
    pub scale: f64,
    pub metadata: Option<DocumentMetadata>,
    pub background: Option<String>,
    pub visibility: VisibilityConfig,
    pub edge_color: String,
    pub edge_width: f64,
    pub face_fill: String,
    pub cut_stroke_factor: f64,
    pub dimension_tick: f64,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            viewport: None,
            auto_fit: true,
            padding: 20.0,
            scale: 1.0,
            metadata: None,
            background: None,
            visibility: VisibilityConfig::default(),
            edge_color: "#000000".to_string(),
            edge_width: 1.0,
            face_fill: "#ffffff".to_string(),
            cut_stroke_factor: 2.0,
            dimension_tick: 4.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SvgOutput {
    pub document: String,
    pub report: ExportReport,
}

pub struct SvgRenderer {
    opts: SvgOptions,
}

impl SvgRenderer {
    pub fn new(opts: SvgOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &SvgOptions {
        &self.opts
    }

    pub fn render(&self, elements: &[CanvasElement]) -> SvgOutput {
        let mut report = ExportReport::new("svg");
        report.stats.elements_total = elements.len();

        let extents = compute_bounds(elements);
        report.extents = extents;
        let viewport = self.resolve_viewport(extents);

        let mut body = String::new();
        for element in elements {
            self.write_element(&mut body, element, &mut report.warnings);
            report.stats.elements_rendered += 1;
        }

        SvgOutput {
            document: self.wrap(viewport, &body),
            report,
        }
    }

    pub fn render_scene(
        &self,
        objects: &[SceneObject],
        camera: &Camera,
    ) -> Result<SvgOutput, CameraError> {
        let projector = camera.projector(self.opts.width, self.opts.height)?;
        let (projected, visibility) = project_scene(objects, &projector, &self.opts.visibility);

        let mut report = ExportReport::new("svg");
        report.stats.objects_total = objects.len();
        report.stats.visibility = visibility;

        let extents = projected_bounds(&projected);
        report.extents = extents;
        let viewport = self.resolve_viewport(extents);

        let mut body = String::new();
        for object in &projected {
            if object.faces.is_empty() {
                continue;
            }
            let (unique, shared) = self.write_object(&mut body, object);
            report.stats.edges_unique += unique;
            report.stats.edges_shared += shared;
        }
        if visibility.faces_total > 0 && visibility.faces_visible == 0 {
            report.warnings.push(Warning::new(
                "nothing_visible",
                "no face survived clipping and culling",
            ));
        }

        Ok(SvgOutput {
            document: self.wrap(viewport, &body),
            report,
        })
    }

    fn resolve_viewport(&self, extents: Option<BBox2>) -> BBox2 {
        if let Some(viewport) = self.opts.viewport {
            return viewport;
        }
        match extents {
            Some(bbox) if self.opts.auto_fit => bbox.expand(self.opts.padding),
            _ => BBox2::new(
                Vec2::new(0.0, 0.0),
                Vec2::new(self.opts.width, self.opts.height),
            ),
        }
    }

    fn wrap(&self, viewport: BBox2, body: &str) -> String {
        let s = if self.opts.scale > 0.0 { self.opts.scale } else { 1.0 };
        let w = viewport.width() * s;
        let h = viewport.height() * s;

        let mut out = String::new();
        let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            Num(w),
            Num(h),
            Num(w),
            Num(h)
        );
        if let Some(meta) = &self.opts.metadata {
            let _ = writeln!(
                out,
                "<!-- Project: {} | Generated: {} | bimdraft -->",
                comment_safe(&meta.project_name),
                comment_safe(&meta.generated_at)
            );
            let _ = writeln!(out, "<title>{}</title>", escape(&meta.project_name));
        }
        if let Some(bg) = &self.opts.background {
            let _ = writeln!(
                out,
                r#"<rect class="background" x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
                Num(w),
                Num(h),
                escape(bg)
            );
        }
        let _ = writeln!(
            out,
            r#"<g transform="scale({}) translate({} {})">"#,
            Num(s),
            Num(-viewport.min.x),
            Num(-viewport.min.y)
        );
        out.push_str(body);
        let _ = writeln!(out, "</g>");
        let _ = writeln!(out, "</svg>");
        out
    }

    fn write_element(
        &self,
        out: &mut String,
        element: &CanvasElement,
        warnings: &mut Vec<Warning>,
    ) {
        let style = &element.style;
        let common = common_attrs(&element.id, style);
        match &element.primitive {
            Primitive2D::Line(l) => {
                let _ = writeln!(
                    out,
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" {common}/>"#,
                    Num(l.p1.x),
                    Num(l.p1.y),
                    Num(l.p2.x),
                    Num(l.p2.y)
                );
            }
            Primitive2D::Circle(c) => {
                let _ = writeln!(
                    out,
                    r#"<circle cx="{}" cy="{}" r="{}" {common}/>"#,
                    Num(c.center.x),
                    Num(c.center.y),
                    Num(c.radius)
                );
            }
            Primitive2D::Arc(arc) => self.write_arc(out, &element.id, arc, &common, warnings),
            Primitive2D::Polyline(poly) => {
                let tag = if poly.closed { "polygon" } else { "polyline" };
                let points = poly
                    .points
                    .iter()
                    .map(|p| format!("{},{}", Num(p.x), Num(p.y)))
                    .join(" ");
                let _ = writeln!(out, r#"<{tag} points="{points}" {common}/>"#);
            }
            Primitive2D::Rectangle(rect) => write_rect(out, rect, &common),
            Primitive2D::Text(text) => write_text(out, &element.id, text, style),
            Primitive2D::Dimension(dim) => self.write_dimension(out, &element.id, dim, style),
        }
    }

    /// Two-endpoint arc command. `large-arc` is always 0, so sweeps of 180
    /// degrees or more come out as the minor arc.
    fn write_arc(
        &self,
        out: &mut String,
        id: &str,
        arc: &Arc2D,
        common: &str,
        warnings: &mut Vec<Warning>,
    ) {
        let start = arc.point_at(arc.start_angle_deg);
        let end = arc.point_at(arc.end_angle_deg);
        let sweep_flag = if arc.ccw { 0 } else { 1 };

        let sweep = arc.sweep_deg();
        if sweep >= 180.0 {
            tracing::warn!(id, sweep, "arc sweep cannot be represented by a two-endpoint arc");
            warnings.push(Warning::new(
                "arc_sweep_ambiguous",
                format!("arc '{id}' sweeps {sweep:.1} degrees; rendered as the minor arc"),
            ));
        }

        let _ = writeln!(
            out,
            r#"<path d="M {} {} A {} {} 0 0 {} {} {}" {common}/>"#,
            Num(start.x),
            Num(start.y),
            Num(arc.radius),
            Num(arc.radius),
            sweep_flag,
            Num(end.x),
            Num(end.y)
        );
    }

    fn write_dimension(&self, out: &mut String, id: &str, dim: &Dimension2D, style: &Style) {
        let (a, b) = dim.offset_line();
        let tick = self.opts.dimension_tick;
        let normal = b.sub(a).unit_normal().unwrap_or(Vec2::new(0.0, -1.0));
        let mid = a.midpoint(b);

        let _ = writeln!(
            out,
            r#"<g class="dimension" data-id="{}" data-layer="{}" stroke="{}" stroke-width="{}" opacity="{}">"#,
            escape(id),
            escape(&style.layer),
            escape(&style.stroke_color),
            Num(style.stroke_width),
            Num(style.opacity.clamp(0.0, 1.0))
        );
        let _ = writeln!(
            out,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}"/>"#,
            Num(a.x),
            Num(a.y),
            Num(b.x),
            Num(b.y)
        );
        for end in [a, b] {
            let p = end.add(normal.scale(tick));
            let q = end.sub(normal.scale(tick));
            let _ = writeln!(
                out,
                r#"<line class="tick" x1="{}" y1="{}" x2="{}" y2="{}"/>"#,
                Num(p.x),
                Num(p.y),
                Num(q.x),
                Num(q.y)
            );
        }
        let label_at = mid.add(normal.scale(tick));
        let _ = writeln!(
            out,
            r#"<text x="{}" y="{}" text-anchor="middle" stroke="none" fill="{}">{}</text>"#,
            Num(label_at.x),
            Num(label_at.y),
            escape(&style.stroke_color),
            escape(&dim.display_label())
        );
        let _ = writeln!(out, "</g>");
    }

    /// Returns `(unique edges written, shared edges suppressed)`.
    fn write_object(&self, out: &mut String, object: &ProjectedObject<'_>) -> (usize, usize) {
        let src = object.object;
        let cut_attr = if object.is_cut_geometry {
            r#" data-cut="true""#
        } else {
            ""
        };
        let origin = format!(
            r#"data-id="{}" data-layer="{}""#,
            escape(&src.id),
            escape(&src.layer)
        );
        let _ = writeln!(
            out,
            r#"<g class="scene-object" {origin} data-type="{}"{cut_attr}>"#,
            escape(&src.kind)
        );

        let fill = src.color.as_deref().unwrap_or(self.opts.face_fill.as_str());
        for face in &object.faces {
            let points = face
                .points
                .iter()
                .map(|p| format!("{},{}", Num(p.x), Num(p.y)))
                .join(" ");
            let face_fill = if face.cut { "none".to_string() } else { escape(fill) };
            let _ = writeln!(
                out,
                r#"<polygon class="face" {origin} data-face="{}" points="{points}" fill="{face_fill}" stroke="none"/>"#,
                face.face_index
            );
        }

        let edges = unique_edges(object.faces.iter().map(|f| object.indices(f)));
        for edge in &edges.edges {
            let (Some(a), Some(b)) = (object.screen[edge.key.lo], object.screen[edge.key.hi]) else {
                continue;
            };
            let width = if object.faces[edge.first_face].cut {
                self.opts.edge_width * self.opts.cut_stroke_factor
            } else {
                self.opts.edge_width
            };
            let _ = writeln!(
                out,
                r#"<line class="edge" {origin} x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}"/>"#,
                Num(a.x),
                Num(a.y),
                Num(b.x),
                Num(b.y),
                escape(&self.opts.edge_color),
                Num(width)
            );
        }
        let _ = writeln!(out, "</g>");

        (edges.edges.len(), edges.duplicates)
    }
}

fn common_attrs(id: &str, style: &Style) -> String {
    let fill = style.fill_color.as_deref().unwrap_or("none");
    format!(
        r#"data-id="{}" data-layer="{}" stroke="{}" stroke-width="{}" fill="{}" opacity="{}""#,
        escape(id),
        escape(&style.layer),
        escape(&style.stroke_color),
        Num(style.stroke_width),
        escape(fill),
        Num(style.opacity.clamp(0.0, 1.0))
    )
}

fn write_rect(out: &mut String, rect: &Rect2D, common: &str) {
    let x = rect.origin.x.min(rect.origin.x + rect.width);
    let y = rect.origin.y.min(rect.origin.y + rect.height);
    let _ = writeln!(
        out,
        r#"<rect x="{}" y="{}" width="{}" height="{}" {common}/>"#,
        Num(x),
        Num(y),
        Num(rect.width.abs()),
        Num(rect.height.abs())
    );
}

fn write_text(out: &mut String, id: &str, text: &Text2D, style: &Style) {
    let fill = style.fill_color.as_deref().unwrap_or(style.stroke_color.as_str());
    let _ = writeln!(
        out,
        r#"<text x="{}" y="{}" font-size="{}" font-family="{}" text-anchor="{}" fill="{}" opacity="{}" data-id="{}" data-layer="{}">{}</text>"#,
        Num(text.position.x),
        Num(text.position.y),
        Num(text.font_size),
        escape(&text.font_family),
        text.anchor.as_str(),
        escape(fill),
        Num(style.opacity.clamp(0.0, 1.0)),
        escape(id),
        escape(&style.layer),
        escape(&text.text)
    );
}

pub fn serialize(elements: &[CanvasElement], opts: &SvgOptions) -> String {
    SvgRenderer::new(opts.clone()).render(elements).document
}

pub fn serialize_3d(
    objects: &[SceneObject],
    camera: &Camera,
    opts: &SvgOptions,
) -> Result<String, CameraError> {
    Ok(SvgRenderer::new(opts.clone())
        .render_scene(objects, camera)?
        .document)
}
