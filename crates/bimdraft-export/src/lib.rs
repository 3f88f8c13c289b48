//! Export orchestrator: picks the in-process vector path or the delegated
//! CAD/BIM path and packages the result as a [`Deliverable`].

pub mod error;
pub mod filename;
pub mod format;
pub mod state;

pub use error::ExportError;
pub use filename::suggested_filename;
pub use format::{ExportFormat, ExportScope};
pub use state::ExportState;

use bimdraft_core::camera::Camera;
use bimdraft_core::geom::BBox2;
use bimdraft_core::model::CanvasElement;
use bimdraft_core::normalize::{normalize_canvas, normalize_scene, NormalizeConfig, NormalizeStats};
use bimdraft_core::report::ExportReport;
use bimdraft_core::scene::SceneObject;
use bimdraft_core::visibility::{clip_scene, SectionPlane, VisibilityConfig};
use bimdraft_exchange::{
    decode_payload, poll_progress, ArchiveFormat, BatchExportRequest, BatchItem,
    BimExportRequest, CadExportRequest, DelegateResponse, FormatService, MeshPayload,
    PollConfig, ProgressStatus,
};
use bimdraft_svg::{DocumentMetadata, SvgOptions, SvgRenderer};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;

/// Borrowed export input. Nothing here is mutated by an export.
#[derive(Debug, Clone, Copy)]
pub enum ExportInput<'a> {
    Canvas(&'a [CanvasElement]),
    Scene {
        objects: &'a [SceneObject],
        camera: Option<&'a Camera>,
    },
}

impl ExportInput<'_> {
    fn kind(&self) -> &'static str {
        match self {
            ExportInput::Canvas(_) => "canvas",
            ExportInput::Scene { .. } => "scene",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub project_name: Option<String>,
    pub scale: f64,
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub viewport: Option<BBox2>,
    pub show_hidden_lines: bool,
    pub section: Option<SectionPlane>,
    pub include_metadata: bool,
    pub background: Option<String>,
    /// Scene layer name to CAD layer name. Unmapped layers keep their name.
    pub layer_map: BTreeMap<String, String>,
    pub normalize: NormalizeConfig,
    /// Fixed generation time; `None` uses the local clock.
    pub timestamp: Option<DateTime<Local>>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            project_name: None,
            scale: 1.0,
            width: 800.0,
            height: 600.0,
            padding: 20.0,
            viewport: None,
            show_hidden_lines: false,
            section: None,
            include_metadata: true,
            background: None,
            layer_map: BTreeMap::new(),
            normalize: NormalizeConfig::default(),
            timestamp: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Deliverable {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
    pub report: ExportReport,
}

type Observer = Box<dyn FnMut(ExportState) + Send>;

pub struct Exporter<S> {
    service: S,
    state: ExportState,
    observer: Option<Observer>,
}

impl<S: FormatService> Exporter<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: ExportState::Idle,
            observer: None,
        }
    }

    /// Registers a callback invoked on every state change.
    pub fn with_observer(mut self, observer: impl FnMut(ExportState) + Send + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn export(
        &mut self,
        scope: &ExportScope,
        format: ExportFormat,
        input: ExportInput<'_>,
        options: &ExportOptions,
    ) -> Result<Deliverable, ExportError> {
        self.begin();
        let result = self.run(scope, format, input, options).await;
        self.finish(&result, format.extension());
        result
    }

    /// Delegates an archive of several items. Always remote-shaped: local
    /// services answer `success = false`.
    pub async fn export_batch(
        &mut self,
        items: Vec<BatchItem>,
        archive_format: ArchiveFormat,
        options: &ExportOptions,
    ) -> Result<Deliverable, ExportError> {
        self.begin();
        let result = self.run_batch(items, archive_format, options).await;
        self.finish(&result, archive_format.extension());
        result
    }

    /// Follows a long-running delegated job until it reaches a terminal status.
    pub async fn wait_for_job(
        &self,
        job_id: &str,
        cfg: &PollConfig,
        on_update: impl FnMut(&ProgressStatus),
    ) -> Result<ProgressStatus, ExportError> {
        Ok(poll_progress(&self.service, job_id, cfg, on_update).await?)
    }

    fn begin(&mut self) {
        self.state = ExportState::Idle;
        self.advance(ExportState::Preparing);
    }

    fn finish(&mut self, result: &Result<Deliverable, ExportError>, format: &str) {
        match result {
            Ok(deliverable) => {
                tracing::info!(
                    format,
                    bytes = deliverable.bytes.len(),
                    filename = %deliverable.filename,
                    "export finished"
                );
                self.advance(ExportState::Success);
            }
            Err(err) => {
                tracing::warn!(format, error = %err, "export failed");
                self.advance(ExportState::Error);
            }
        }
    }

    fn advance(&mut self, next: ExportState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "export state {:?} -> {:?}",
            self.state,
            next
        );
        tracing::debug!(from = ?self.state, to = ?next, "export state");
        self.state = next;
        if let Some(observer) = self.observer.as_mut() {
            observer(next);
        }
    }

    async fn run(
        &mut self,
        scope: &ExportScope,
        format: ExportFormat,
        input: ExportInput<'_>,
        options: &ExportOptions,
    ) -> Result<Deliverable, ExportError> {
        let now = options.timestamp.unwrap_or_else(Local::now);
        let filename =
            suggested_filename(options.project_name.as_deref(), &now, format.extension());

        match input {
            ExportInput::Canvas(elements) => {
                if format.is_delegated() {
                    return Err(ExportError::UnsupportedInput {
                        format: format.extension(),
                        input: input.kind(),
                    });
                }
                let mut selected: Vec<CanvasElement> = elements
                    .iter()
                    .filter(|e| scope.includes(&e.id))
                    .cloned()
                    .collect();
                let normalized = normalize_canvas(&mut selected, &options.normalize);

                self.advance(ExportState::Serializing);
                let renderer = SvgRenderer::new(svg_options(options, &now));
                let mut out = renderer.render(&selected);
                out.report.stats.elements_total = elements.len();
                merge_normalize(&mut out.report, normalized);
                Ok(Deliverable {
                    bytes: out.document.into_bytes(),
                    filename,
                    mime_type: format.mime_type().to_string(),
                    report: out.report,
                })
            }
            ExportInput::Scene { objects, camera } => {
                let mut selected: Vec<SceneObject> = objects
                    .iter()
                    .filter(|o| scope.includes(&o.id))
                    .cloned()
                    .collect();
                let normalized = normalize_scene(&mut selected);

                if format == ExportFormat::Svg {
                    let camera = camera.ok_or(ExportError::MissingCamera)?;
                    self.advance(ExportState::Serializing);
                    let renderer = SvgRenderer::new(svg_options(options, &now));
                    let mut out = renderer.render_scene(&selected, camera)?;
                    merge_normalize(&mut out.report, normalized);
                    return Ok(Deliverable {
                        bytes: out.document.into_bytes(),
                        filename,
                        mime_type: format.mime_type().to_string(),
                        report: out.report,
                    });
                }

                let selected = match &options.section {
                    Some(plane) => clip_scene(&selected, plane),
                    None => selected,
                };
                let mut report = ExportReport::new(format.extension());
                report.stats.objects_total = objects.len();
                merge_normalize(&mut report, normalized);

                let meshes: Vec<MeshPayload> = selected.iter().map(MeshPayload::from).collect();
                self.advance(ExportState::Delegating);
                let response = self.delegate(format, meshes, options).await?;
                let bytes = response_payload(response)?;
                Ok(Deliverable {
                    bytes,
                    filename,
                    mime_type: format.mime_type().to_string(),
                    report,
                })
            }
        }
    }

    async fn delegate(
        &self,
        format: ExportFormat,
        objects: Vec<MeshPayload>,
        options: &ExportOptions,
    ) -> Result<DelegateResponse, ExportError> {
        let response = match format {
            ExportFormat::Dxf => {
                let mut layers = BTreeMap::new();
                for object in &objects {
                    let cad = options
                        .layer_map
                        .get(&object.layer)
                        .cloned()
                        .unwrap_or_else(|| object.layer.clone());
                    layers.insert(object.layer.clone(), cad);
                }
                let request = CadExportRequest {
                    objects,
                    layers,
                    scale: options.scale,
                };
                self.service.export_cad(&request).await?
            }
            ExportFormat::Ifc => {
                let request = BimExportRequest {
                    project_name: project_name(options).to_string(),
                    objects,
                    scale: options.scale,
                };
                self.service.export_bim(&request).await?
            }
            ExportFormat::Svg => {
                return Err(ExportError::UnsupportedFormat(format.to_string()));
            }
        };
        Ok(response)
    }

    async fn run_batch(
        &mut self,
        items: Vec<BatchItem>,
        archive_format: ArchiveFormat,
        options: &ExportOptions,
    ) -> Result<Deliverable, ExportError> {
        let now = options.timestamp.unwrap_or_else(Local::now);
        let request = BatchExportRequest {
            items,
            archive_format,
            include_metadata: options.include_metadata,
        };

        self.advance(ExportState::Delegating);
        let response = self.service.export_batch(&request).await?;
        if !response.success {
            return Err(ExportError::rejected(response.error));
        }
        let encoded = response
            .archive_content_base64
            .ok_or_else(|| ExportError::Payload("response has no archive content".into()))?;
        let bytes = decode_payload(&encoded).map_err(|e| ExportError::Payload(e.to_string()))?;
        if let Some(expected) = response.file_size {
            if expected != bytes.len() as u64 {
                tracing::warn!(
                    expected,
                    actual = bytes.len(),
                    "archive size differs from reported size"
                );
            }
        }

        let filename = response.filename.unwrap_or_else(|| {
            suggested_filename(options.project_name.as_deref(), &now, archive_format.extension())
        });
        let mut report = ExportReport::new(archive_format.extension());
        report.stats.objects_total = response.items_processed.unwrap_or(request.items.len());
        Ok(Deliverable {
            bytes,
            filename,
            mime_type: archive_format.mime_type().to_string(),
            report,
        })
    }
}

fn project_name(options: &ExportOptions) -> &str {
    options
        .project_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(filename::DEFAULT_PROJECT_NAME)
}

fn svg_options(options: &ExportOptions, now: &DateTime<Local>) -> SvgOptions {
    let metadata = options.include_metadata.then(|| DocumentMetadata {
        project_name: project_name(options).to_string(),
        generated_at: now.format("%Y-%m-%d %H:%M:%S").to_string(),
    });
    SvgOptions {
        width: options.width,
        height: options.height,
        viewport: options.viewport,
        padding: options.padding,
        scale: options.scale,
        metadata,
        background: options.background.clone(),
        visibility: VisibilityConfig {
            show_hidden_lines: options.show_hidden_lines,
            section: options.section,
            ..VisibilityConfig::default()
        },
        ..SvgOptions::default()
    }
}

fn merge_normalize(report: &mut ExportReport, stats: NormalizeStats) {
    report.stats.removed_degenerate_elements += stats.removed_degenerate_entities;
    report.stats.duplicate_ids += stats.duplicate_ids;
    report.stats.removed_invalid_faces += stats.removed_invalid_faces;
    report.warnings.extend(stats.warnings);
}

fn response_payload(response: DelegateResponse) -> Result<Vec<u8>, ExportError> {
    if !response.success {
        return Err(ExportError::rejected(response.error));
    }
    let encoded = response
        .binary_content_base64
        .ok_or_else(|| ExportError::Payload("response has no binary content".into()))?;
    let bytes = decode_payload(&encoded).map_err(|e| ExportError::Payload(e.to_string()))?;
    if bytes.is_empty() {
        return Err(ExportError::Payload("binary content is empty".into()));
    }
    Ok(bytes)
}
