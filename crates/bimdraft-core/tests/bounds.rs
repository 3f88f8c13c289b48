use approx::assert_relative_eq;
use bimdraft_core::bounds::{compute_bounds, scene_bounds};
use bimdraft_core::geom::{Vec2, Vec3};
use bimdraft_core::model::{
    Arc2D, CanvasElement, Circle2D, Dimension2D, LineSeg2D, Primitive2D, Rect2D, Style,
};
use bimdraft_core::scene::box_object;

fn element(id: &str, primitive: Primitive2D) -> CanvasElement {
    CanvasElement {
        id: id.to_string(),
        primitive,
        style: Style::default(),
    }
}

#[test]
fn empty_collection_has_no_bounds() {
    assert_eq!(None, compute_bounds(&[]));
    assert_eq!(None, scene_bounds(&[]));
}

#[test]
fn circle_bounds_are_center_plus_minus_radius() {
    let circle = element(
        "c",
        Primitive2D::Circle(Circle2D {
            center: Vec2::new(0.0, 0.0),
            radius: 5.0,
        }),
    );
    let b = compute_bounds(&[circle]).unwrap();
    assert_eq!(-5.0, b.min.x);
    assert_eq!(5.0, b.max.x);
    assert_eq!(-5.0, b.min.y);
    assert_eq!(5.0, b.max.y);
}

#[test]
fn arc_bounds_ignore_sweep() {
    for (start, end) in [(0.0, 10.0), (45.0, 135.0), (0.0, 359.0)] {
        let arc = element(
            "a",
            Primitive2D::Arc(Arc2D {
                center: Vec2::new(0.0, 0.0),
                radius: 5.0,
                start_angle_deg: start,
                end_angle_deg: end,
                ccw: false,
            }),
        );
        let b = compute_bounds(&[arc]).unwrap();
        assert_eq!((-5.0, 5.0, -5.0, 5.0), (b.min.x, b.max.x, b.min.y, b.max.y));
    }
}

#[test]
fn mixed_elements_union() {
    let elements = vec![
        element(
            "l",
            Primitive2D::Line(LineSeg2D {
                p1: Vec2::new(-2.0, 1.0),
                p2: Vec2::new(3.0, 4.0),
            }),
        ),
        element(
            "r",
            Primitive2D::Rectangle(Rect2D {
                origin: Vec2::new(10.0, 10.0),
                width: 5.0,
                height: 2.0,
            }),
        ),
        element(
            "d",
            Primitive2D::Dimension(Dimension2D {
                p1: Vec2::new(0.0, 0.0),
                p2: Vec2::new(10.0, 0.0),
                label: None,
                offset: -8.0,
            }),
        ),
    ];
    let b = compute_bounds(&elements).unwrap();
    assert_relative_eq!(-2.0, b.min.x);
    assert_relative_eq!(15.0, b.max.x);
    assert_relative_eq!(-8.0, b.min.y);
    assert_relative_eq!(12.0, b.max.y);
}

#[test]
fn scene_bounds_cover_all_vertices() {
    let a = box_object("a", Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
    let b = box_object("b", Vec3::new(-3.0, 2.0, 0.5), Vec3::new(-1.0, 4.0, 6.0));
    let bbox = scene_bounds(&[a, b]).unwrap();
    assert_eq!(Vec3::new(-3.0, 0.0, 0.0), bbox.min);
    assert_eq!(Vec3::new(1.0, 4.0, 6.0), bbox.max);
}
