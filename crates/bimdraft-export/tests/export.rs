use bimdraft_core::camera::Camera;
use bimdraft_core::geom::{Vec2, Vec3};
use bimdraft_core::model::{CanvasElement, Circle2D, LineSeg2D, Primitive2D, Style};
use bimdraft_core::scene::{box_object, SceneObject};
use bimdraft_core::visibility::SectionPlane;
use bimdraft_exchange::{
    encode_payload, ArchiveFormat, BatchExportRequest, BatchItem, BatchResponse,
    BimExportRequest, CadExportRequest, DelegateError, DelegateResponse, FormatService,
    LocalFormatService, ProgressStatus,
};
use bimdraft_export::{
    Deliverable, ExportError, ExportFormat, ExportInput, ExportOptions, ExportScope,
    ExportState, Exporter,
};
use chrono::{Local, TimeZone};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockService {
    response: DelegateResponse,
    batch: BatchResponse,
    http_status: Option<(u16, String)>,
    cad_requests: Mutex<Vec<CadExportRequest>>,
    bim_requests: Mutex<Vec<BimExportRequest>>,
}

impl MockService {
    fn returning(response: DelegateResponse) -> Self {
        Self {
            response,
            ..Self::default()
        }
    }

    fn answering_status(status: u16, message: &str) -> Self {
        Self {
            http_status: Some((status, message.to_string())),
            ..Self::default()
        }
    }

    fn transport_outcome(&self) -> Result<(), DelegateError> {
        match &self.http_status {
            Some((status, message)) => Err(DelegateError::Status {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl FormatService for MockService {
    async fn export_cad(
        &self,
        request: &CadExportRequest,
    ) -> Result<DelegateResponse, DelegateError> {
        self.cad_requests.lock().unwrap().push(request.clone());
        self.transport_outcome()?;
        Ok(self.response.clone())
    }

    async fn export_bim(
        &self,
        request: &BimExportRequest,
    ) -> Result<DelegateResponse, DelegateError> {
        self.bim_requests.lock().unwrap().push(request.clone());
        self.transport_outcome()?;
        Ok(self.response.clone())
    }

    async fn export_batch(
        &self,
        _request: &BatchExportRequest,
    ) -> Result<BatchResponse, DelegateError> {
        Ok(self.batch.clone())
    }

    async fn progress(&self, _job_id: &str) -> Result<ProgressStatus, DelegateError> {
        Err(DelegateError::Unsupported("progress".into()))
    }
}

fn options() -> ExportOptions {
    ExportOptions {
        project_name: Some("Tower".to_string()),
        timestamp: Some(Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
        ..ExportOptions::default()
    }
}

fn recorder() -> (Arc<Mutex<Vec<ExportState>>>, impl FnMut(ExportState) + Send + 'static) {
    let states = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&states);
    (states, move |s| sink.lock().unwrap().push(s))
}

fn canvas() -> Vec<CanvasElement> {
    vec![
        CanvasElement {
            id: "wall-1".to_string(),
            primitive: Primitive2D::Line(LineSeg2D {
                p1: Vec2::new(0.0, 0.0),
                p2: Vec2::new(100.0, 0.0),
            }),
            style: Style::default(),
        },
        CanvasElement {
            id: "column-1".to_string(),
            primitive: Primitive2D::Circle(Circle2D {
                center: Vec2::new(50.0, 50.0),
                radius: 5.0,
            }),
            style: Style::default(),
        },
    ]
}

fn cube() -> SceneObject {
    box_object("c1", Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0)).with_layer("walls")
}

fn text(deliverable: &Deliverable) -> &str {
    std::str::from_utf8(&deliverable.bytes).unwrap()
}

#[tokio::test]
async fn canvas_to_svg_runs_in_process() {
    let mock = MockService::default();
    let (states, observer) = recorder();
    let mut exporter = Exporter::new(&mock).with_observer(observer);
    let elements = canvas();

    let out = exporter
        .export(
            &ExportScope::All,
            ExportFormat::Svg,
            ExportInput::Canvas(&elements),
            &options(),
        )
        .await
        .unwrap();

    assert_eq!("image/svg+xml", out.mime_type);
    assert_eq!("Tower_20240102-030405.svg", out.filename);
    assert!(text(&out).contains("<!-- Project: Tower | Generated: 2024-01-02 03:04:05"));
    let doc = roxmltree::Document::parse(text(&out)).unwrap();
    assert_eq!(1, doc.descendants().filter(|n| n.has_tag_name("circle")).count());

    assert_eq!(
        vec![
            ExportState::Preparing,
            ExportState::Serializing,
            ExportState::Success
        ],
        *states.lock().unwrap()
    );
    assert_eq!(ExportState::Success, exporter.state());
    assert!(mock.cad_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn selection_scope_limits_output() {
    let mock = MockService::default();
    let mut exporter = Exporter::new(&mock);
    let elements = canvas();
    let scope = ExportScope::Selection(vec!["column-1".to_string()]);

    let out = exporter
        .export(&scope, ExportFormat::Svg, ExportInput::Canvas(&elements), &options())
        .await
        .unwrap();

    assert!(text(&out).contains(r#"data-id="column-1""#));
    assert!(!text(&out).contains(r#"data-id="wall-1""#));
    assert_eq!(2, out.report.stats.elements_total);
    assert_eq!(1, out.report.stats.elements_rendered);
}

#[tokio::test]
async fn scene_to_svg_needs_a_camera() {
    let mock = MockService::default();
    let (states, observer) = recorder();
    let mut exporter = Exporter::new(&mock).with_observer(observer);
    let objects = vec![cube()];

    let err = exporter
        .export(
            &ExportScope::All,
            ExportFormat::Svg,
            ExportInput::Scene {
                objects: &objects,
                camera: None,
            },
            &options(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::MissingCamera));
    assert_eq!(
        vec![ExportState::Preparing, ExportState::Error],
        *states.lock().unwrap()
    );
}

#[tokio::test]
async fn scene_to_svg_draws_visible_faces() {
    let mock = MockService::default();
    let mut exporter = Exporter::new(&mock);
    let objects = vec![cube()];
    let camera = Camera::orthographic(
        Vec3::new(0.5, 0.5, 10.0),
        Vec3::new(0.5, 0.5, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    );

    let out = exporter
        .export(
            &ExportScope::All,
            ExportFormat::Svg,
            ExportInput::Scene {
                objects: &objects,
                camera: Some(&camera),
            },
            &options(),
        )
        .await
        .unwrap();

    assert_eq!(1, text(&out).matches(r#"class="face""#).count());
    assert_eq!(4, out.report.stats.edges_unique);
}

#[tokio::test]
async fn dxf_is_delegated_and_decoded() {
    let mock = MockService::returning(DelegateResponse::ok(encode_payload(b"DXF-BYTES")));
    let (states, observer) = recorder();
    let mut exporter = Exporter::new(&mock).with_observer(observer);
    let objects = vec![
        cube(),
        box_object("c2", Vec3::new(2.0, 0.0, 0.0), Vec3::new(3.0, 1.0, 1.0)),
    ];
    let before = objects.clone();
    let mut opts = options();
    opts.scale = 0.5;
    opts.layer_map.insert("walls".to_string(), "A-WALL".to_string());

    let out = exporter
        .export(
            &ExportScope::All,
            ExportFormat::Dxf,
            ExportInput::Scene {
                objects: &objects,
                camera: None,
            },
            &opts,
        )
        .await
        .unwrap();

    assert_eq!(b"DXF-BYTES".to_vec(), out.bytes);
    assert_eq!("Tower_20240102-030405.dxf", out.filename);
    assert_eq!("application/dxf", out.mime_type);
    assert_eq!(before, objects);

    let requests = mock.cad_requests.lock().unwrap();
    assert_eq!(1, requests.len());
    let request = &requests[0];
    assert_eq!(2, request.objects.len());
    assert_eq!(0.5, request.scale);
    assert_eq!(Some("A-WALL"), request.layers.get("walls").map(String::as_str));
    assert_eq!(Some("0"), request.layers.get("0").map(String::as_str));
    assert_eq!(
        vec![
            ExportState::Preparing,
            ExportState::Delegating,
            ExportState::Success
        ],
        *states.lock().unwrap()
    );
}

#[tokio::test]
async fn section_plane_clips_delegated_meshes() {
    let mock = MockService::returning(DelegateResponse::ok(encode_payload(b"x")));
    let mut exporter = Exporter::new(&mock);
    let objects = vec![cube()];
    let opts = ExportOptions {
        section: Some(SectionPlane::new(1.0)),
        ..options()
    };

    exporter
        .export(
            &ExportScope::All,
            ExportFormat::Dxf,
            ExportInput::Scene {
                objects: &objects,
                camera: None,
            },
            &opts,
        )
        .await
        .unwrap();

    let requests = mock.cad_requests.lock().unwrap();
    assert_eq!(vec![vec![4, 5, 6, 7]], requests[0].objects[0].faces);
}

#[tokio::test]
async fn ifc_request_carries_project_name() {
    let mock = MockService::returning(DelegateResponse::ok(encode_payload(b"ISO-10303-21;")));
    let mut exporter = Exporter::new(&mock);
    let objects = vec![cube()];

    let out = exporter
        .export(
            &ExportScope::All,
            ExportFormat::Ifc,
            ExportInput::Scene {
                objects: &objects,
                camera: None,
            },
            &options(),
        )
        .await
        .unwrap();

    assert_eq!("Tower_20240102-030405.ifc", out.filename);
    let requests = mock.bim_requests.lock().unwrap();
    assert_eq!("Tower", requests[0].project_name);
    assert_eq!("c1", requests[0].objects[0].id);
}

#[tokio::test]
async fn service_failure_surfaces_its_message() {
    let objects = vec![cube()];
    let input = ExportInput::Scene {
        objects: &objects,
        camera: None,
    };

    let mock = MockService::returning(DelegateResponse::failed("mesh c1 is not closed"));
    let err = Exporter::new(&mock)
        .export(&ExportScope::All, ExportFormat::Dxf, input, &options())
        .await
        .unwrap_err();
    assert_eq!("mesh c1 is not closed", err.to_string());

    let mock = MockService::returning(DelegateResponse::default());
    let err = Exporter::new(&mock)
        .export(&ExportScope::All, ExportFormat::Dxf, input, &options())
        .await
        .unwrap_err();
    assert_eq!("export service reported failure", err.to_string());
}

#[tokio::test]
async fn transport_status_failure_ends_in_error_state() {
    let objects = vec![cube()];
    let mock = MockService::answering_status(502, "upstream converter offline");
    let (states, observer) = recorder();
    let mut exporter = Exporter::new(&mock).with_observer(observer);

    let err = exporter
        .export(
            &ExportScope::All,
            ExportFormat::Ifc,
            ExportInput::Scene {
                objects: &objects,
                camera: None,
            },
            &options(),
        )
        .await
        .unwrap_err();

    match &err {
        ExportError::Delegation(DelegateError::Status { status, message }) => {
            assert_eq!(502, *status);
            assert_eq!("upstream converter offline", message);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("upstream converter offline"));
    assert_eq!(ExportState::Error, exporter.state());
    assert_eq!(
        vec![
            ExportState::Preparing,
            ExportState::Delegating,
            ExportState::Error
        ],
        *states.lock().unwrap()
    );
    assert_eq!(1, mock.bim_requests.lock().unwrap().len());
}

#[tokio::test]
async fn undecodable_payload_is_an_error() {
    let objects = vec![cube()];
    let mock = MockService::returning(DelegateResponse::ok("not base64!".to_string()));
    let mut exporter = Exporter::new(&mock);
    let err = exporter
        .export(
            &ExportScope::All,
            ExportFormat::Ifc,
            ExportInput::Scene {
                objects: &objects,
                camera: None,
            },
            &options(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Payload(_)));
    assert_eq!(ExportState::Error, exporter.state());
}

#[tokio::test]
async fn canvas_cannot_be_delegated() {
    let mock = MockService::default();
    let elements = canvas();
    let err = Exporter::new(&mock)
        .export(
            &ExportScope::All,
            ExportFormat::Dxf,
            ExportInput::Canvas(&elements),
            &options(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ExportError::UnsupportedInput {
            format: "dxf",
            input: "canvas"
        }
    ));
}

#[tokio::test]
async fn batch_archive_is_decoded() {
    let mock = MockService {
        batch: BatchResponse {
            success: true,
            archive_content_base64: Some(encode_payload(b"PK\x03\x04")),
            filename: Some("sheets.zip".to_string()),
            file_size: Some(4),
            items_processed: Some(2),
            error: None,
        },
        ..MockService::default()
    };
    let items = vec![BatchItem {
        id: "s1".to_string(),
        kind: "sheet".to_string(),
        name: "Ground floor".to_string(),
        format: "dxf".to_string(),
        scale: 1.0,
        options: serde_json::Value::Null,
    }];

    let out = Exporter::new(&mock)
        .export_batch(items, ArchiveFormat::Zip, &options())
        .await
        .unwrap();
    assert_eq!(b"PK\x03\x04".to_vec(), out.bytes);
    assert_eq!("sheets.zip", out.filename);
    assert_eq!("application/zip", out.mime_type);
    assert_eq!(2, out.report.stats.objects_total);
}

#[tokio::test]
async fn local_service_produces_real_files() {
    let objects = vec![cube()];
    let mut exporter = Exporter::new(LocalFormatService);
    let out = exporter
        .export(
            &ExportScope::All,
            ExportFormat::Dxf,
            ExportInput::Scene {
                objects: &objects,
                camera: None,
            },
            &options(),
        )
        .await
        .unwrap();
    assert!(text(&out).contains("3DFACE"));

    let err = exporter
        .export_batch(Vec::new(), ArchiveFormat::Tar, &options())
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Rejected(_)));
}
