use bimdraft_core::geom::Vec3;
use bimdraft_core::scene::{box_object, SceneObject};
use bimdraft_exchange::{
    decode_payload, ArchiveFormat, BatchExportRequest, BimExportRequest, CadExportRequest,
    DelegateError, FormatService, LocalFormatService, MeshPayload,
};
use dxf::entities::EntityType;
use std::collections::BTreeMap;
use std::io::Cursor;

fn cube_payload() -> MeshPayload {
    let cube = box_object("w1", Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0))
        .with_layer("walls")
        .with_color("#ff0000");
    MeshPayload::from(&cube)
}

fn triangle_payload() -> MeshPayload {
    let tri = SceneObject::new(
        "t1",
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        vec![vec![0, 1, 2], vec![0, 1, 7]],
    );
    MeshPayload::from(&tri)
}

#[tokio::test]
async fn dxf_has_one_face_per_mesh_face_on_mapped_layers() {
    let request = CadExportRequest {
        objects: vec![cube_payload(), triangle_payload()],
        layers: BTreeMap::from([("walls".to_string(), "A-WALL".to_string())]),
        scale: 2.0,
    };
    let response = LocalFormatService.export_cad(&request).await.unwrap();
    assert!(response.success);
    let bytes = decode_payload(response.binary_content_base64.as_deref().unwrap()).unwrap();

    let drawing = dxf::Drawing::load(&mut Cursor::new(bytes)).unwrap();
    let faces: Vec<_> = drawing
        .entities()
        .filter_map(|e| match &e.specific {
            EntityType::Face3D(f) => Some((e.common.layer.clone(), f.clone())),
            _ => None,
        })
        .collect();
    // six cube quads plus the one valid triangle face
    assert_eq!(7, faces.len());
    assert_eq!(6, faces.iter().filter(|(layer, _)| layer == "A-WALL").count());
    assert!(drawing.layers().any(|l| l.name == "A-WALL"));

    let max_x = faces
        .iter()
        .flat_map(|(_, f)| [f.first_corner.x, f.second_corner.x, f.third_corner.x])
        .fold(f64::MIN, f64::max);
    assert_eq!(2.0, max_x);

    let (_, tri) = faces.iter().find(|(layer, _)| layer == "0").unwrap();
    let (c, d) = (&tri.third_corner, &tri.fourth_corner);
    assert_eq!((c.x, c.y, c.z), (d.x, d.y, d.z));
}

#[tokio::test]
async fn ifc_has_a_proxy_with_brep_per_object() {
    let request = BimExportRequest {
        project_name: "Tower 'A'".to_string(),
        objects: vec![cube_payload(), triangle_payload()],
        scale: 1.0,
    };
    let response = LocalFormatService.export_bim(&request).await.unwrap();
    let bytes = decode_payload(response.binary_content_base64.as_deref().unwrap()).unwrap();
    let text = String::from_utf8(bytes).unwrap();

    assert!(text.starts_with("ISO-10303-21;"));
    assert!(text.contains("FILE_SCHEMA(('IFC4'));"));
    assert!(text.contains("'Tower ''A'''"));
    assert_eq!(2, text.matches("IFCBUILDINGELEMENTPROXY(").count());
    assert_eq!(2, text.matches("IFCFACETEDBREP(").count());
    assert_eq!(7, text.matches("IFCFACE((").count());
    assert_eq!(1, text.matches("IFCRELCONTAINEDINSPATIALSTRUCTURE(").count());
    assert!(text.trim_end().ends_with("END-ISO-10303-21;"));

    let again = LocalFormatService.export_bim(&request).await.unwrap();
    assert_eq!(response, again);
}

#[tokio::test]
async fn batch_and_progress_are_remote_only() {
    let request = BatchExportRequest {
        items: Vec::new(),
        archive_format: ArchiveFormat::Zip,
        include_metadata: true,
    };
    let response = LocalFormatService.export_batch(&request).await.unwrap();
    assert!(!response.success);
    assert!(response.error.is_some());

    let err = LocalFormatService.progress("job-1").await.unwrap_err();
    assert!(matches!(err, DelegateError::Unsupported(_)));
}
