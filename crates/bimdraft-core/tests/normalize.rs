use bimdraft_core::geom::{Vec2, Vec3};
use bimdraft_core::model::{
    parse_canvas_elements, CanvasElement, Circle2D, LineSeg2D, Primitive2D, Style, TextAnchor,
};
use bimdraft_core::normalize::{normalize_canvas, normalize_scene, NormalizeConfig};
use bimdraft_core::scene::SceneObject;
use serde_json::json;

fn line(id: &str, a: Vec2, b: Vec2) -> CanvasElement {
    CanvasElement {
        id: id.to_string(),
        primitive: Primitive2D::Line(LineSeg2D { p1: a, p2: b }),
        style: Style::default(),
    }
}

#[test]
fn drops_degenerate_elements_and_reports_duplicate_ids() {
    let mut elements = vec![
        line("a", Vec2::new(0.0, 0.0), Vec2::new(0.0, 0.0)),
        line("b", Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)),
        line("b", Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0)),
        CanvasElement {
            id: "c".to_string(),
            primitive: Primitive2D::Circle(Circle2D {
                center: Vec2::new(0.0, 0.0),
                radius: 0.0,
            }),
            style: Style::default(),
        },
    ];

    let stats = normalize_canvas(&mut elements, &NormalizeConfig::default());
    assert_eq!(2, elements.len());
    assert_eq!(2, stats.removed_degenerate_entities);
    assert_eq!(1, stats.duplicate_ids);
    assert_eq!("duplicate_id", stats.warnings[0].code);
}

#[test]
fn drops_malformed_faces() {
    let mut objects = vec![SceneObject::new(
        "o",
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ],
        vec![vec![0, 1, 2], vec![0, 1], vec![0, 1, 7], vec![0, 1, 2, 0, 1]],
    )];
    let stats = normalize_scene(&mut objects);
    assert_eq!(vec![vec![0, 1, 2]], objects[0].faces);
    assert_eq!(3, stats.removed_invalid_faces);
}

#[test]
fn unknown_primitive_tags_are_skipped() {
    let values = vec![
        json!({"id": "t1", "primitive": {"type": "text", "position": {"x": 1.0, "y": 2.0}, "text": "Hi", "anchor": "middle"}}),
        json!({"id": "s1", "primitive": {"type": "spline", "points": []}}),
        json!({"id": "a1", "primitive": {"type": "arc", "center": {"x": 0.0, "y": 0.0}, "radius": 2.0, "startAngleDeg": 0.0, "endAngleDeg": 90.0},
               "style": {"layer": "A-ANNO", "strokeColor": "#ff0000"}}),
    ];
    let (elements, warnings) = parse_canvas_elements(&values);
    assert_eq!(2, elements.len());
    assert_eq!(1, warnings.len());
    assert_eq!("unknown_element", warnings[0].code);
    assert!(warnings[0].message.contains("spline"));

    match &elements[0].primitive {
        Primitive2D::Text(t) => {
            assert_eq!(TextAnchor::Middle, t.anchor);
            assert_eq!(12.0, t.font_size);
        }
        other => panic!("unexpected primitive {other:?}"),
    }
    assert_eq!("A-ANNO", elements[1].style.layer);
    assert_eq!("#ff0000", elements[1].style.stroke_color);
    assert_eq!(1.0, elements[1].style.opacity);
}
