#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn vec_approx_eq(a: Vec2, b: Vec2) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

fn cam(offset_x: f64, offset_y: f64, zoom: f64) -> Camera {
    Camera { offset: Vec2::new(offset_x, offset_y), zoom, viewport_width: 800.0, viewport_height: 600.0 }
}

// --- Camera defaults ---

#[test]
fn camera_default_offset_is_zero() {
    let c = Camera::default();
    assert_eq!(c.offset, Vec2::ZERO);
}

#[test]
fn camera_default_zoom_is_one() {
    assert_eq!(Camera::default().zoom, 1.0);
}

#[test]
fn camera_new_sets_viewport() {
    let c = Camera::new(320.0, 240.0);
    assert_eq!(c.viewport_width, 320.0);
    assert_eq!(c.viewport_height, 240.0);
    assert_eq!(c.zoom, 1.0);
}

// --- world_to_viewport ---

#[test]
fn world_origin_maps_to_viewport_bottom_left() {
    let c = cam(0.0, 0.0, 1.0);
    assert!(vec_approx_eq(c.world_to_viewport(Vec2::ZERO), Vec2::new(0.0, 600.0)));
}

#[test]
fn world_to_viewport_flips_y() {
    let c = cam(0.0, 0.0, 1.0);
    assert!(vec_approx_eq(c.world_to_viewport(Vec2::new(50.0, 100.0)), Vec2::new(50.0, 500.0)));
}

#[test]
fn world_to_viewport_with_zoom() {
    let c = cam(0.0, 0.0, 2.0);
    assert!(vec_approx_eq(c.world_to_viewport(Vec2::new(10.0, 20.0)), Vec2::new(20.0, 560.0)));
}

#[test]
fn world_to_viewport_with_offset() {
    let c = cam(100.0, 50.0, 1.0);
    assert!(vec_approx_eq(c.world_to_viewport(Vec2::new(100.0, 50.0)), Vec2::new(0.0, 600.0)));
}

// --- viewport_to_world ---

#[test]
fn viewport_top_left_is_world_top_left() {
    let c = cam(0.0, 0.0, 1.0);
    assert!(vec_approx_eq(c.viewport_to_world(Vec2::ZERO), Vec2::new(0.0, 600.0)));
}

#[test]
fn viewport_to_world_with_offset_and_zoom() {
    let c = cam(20.0, 10.0, 2.0);
    // x: 40/2 + 20 = 40; y: (600 - 200)/2 + 10 = 210
    assert!(vec_approx_eq(c.viewport_to_world(Vec2::new(40.0, 200.0)), Vec2::new(40.0, 210.0)));
}

// --- Round trips ---

#[test]
fn round_trip_with_offset_and_zoom() {
    let c = cam(50.0, -30.0, 2.0);
    let world = Vec2::new(100.0, 200.0);
    assert!(vec_approx_eq(c.viewport_to_world(c.world_to_viewport(world)), world));
}

#[test]
fn round_trip_fractional_zoom() {
    let c = cam(13.7, -42.3, 0.75);
    let world = Vec2::new(333.3, -999.9);
    assert!(vec_approx_eq(c.viewport_to_world(c.world_to_viewport(world)), world));
}

#[test]
fn round_trip_viewport_first() {
    let c = cam(10.0, 20.0, 1.5);
    let vp = Vec2::new(400.0, 300.0);
    assert!(vec_approx_eq(c.world_to_viewport(c.viewport_to_world(vp)), vp));
}

// --- view_transform ---

#[test]
fn view_transform_matches_world_to_viewport() {
    let c = cam(-12.0, 40.0, 1.75);
    let t = c.view_transform();
    for p in [Vec2::ZERO, Vec2::new(3.0, -8.0), Vec2::new(250.0, 125.5)] {
        assert!(vec_approx_eq(t.apply(p), c.world_to_viewport(p)));
    }
}

// --- viewport_dist_to_world ---

#[test]
fn viewport_dist_to_world_with_zoom() {
    assert!(approx_eq(cam(0.0, 0.0, 2.0).viewport_dist_to_world(10.0), 5.0));
    assert!(approx_eq(cam(0.0, 0.0, 0.5).viewport_dist_to_world(10.0), 20.0));
}

#[test]
fn viewport_dist_to_world_ignores_offset() {
    assert!(approx_eq(cam(999.0, -999.0, 4.0).viewport_dist_to_world(8.0), 2.0));
}

// --- Visibility ---

#[test]
fn visible_world_rect_scales_with_zoom() {
    let r = cam(10.0, 20.0, 2.0).visible_world_rect();
    assert_eq!(r.min, Vec2::new(10.0, 20.0));
    assert_eq!(r.max, Vec2::new(410.0, 320.0));
}

#[test]
fn is_visible_inside_and_outside() {
    let c = cam(0.0, 0.0, 1.0);
    assert!(c.is_visible(&Aabb::centered(Vec2::new(400.0, 300.0), 10.0, 10.0)));
    assert!(!c.is_visible(&Aabb::centered(Vec2::new(-100.0, 300.0), 10.0, 10.0)));
    assert!(!c.is_visible(&Aabb::centered(Vec2::new(400.0, 700.0), 10.0, 10.0)));
}

#[test]
fn is_visible_partial_overlap_counts() {
    let c = cam(0.0, 0.0, 1.0);
    assert!(c.is_visible(&Aabb::centered(Vec2::new(-4.0, 300.0), 10.0, 10.0)));
}

#[test]
fn is_visible_follows_pan() {
    let mut c = cam(0.0, 0.0, 1.0);
    let b = Aabb::centered(Vec2::new(1000.0, 300.0), 10.0, 10.0);
    assert!(!c.is_visible(&b));
    c.pan_by(-500.0, 0.0);
    assert!(c.is_visible(&b));
}

// --- pan / zoom ---

#[test]
fn pan_by_drag_right_moves_world_right() {
    let mut c = cam(0.0, 0.0, 2.0);
    let before = c.world_to_viewport(Vec2::new(5.0, 5.0));
    c.pan_by(10.0, 4.0);
    let after = c.world_to_viewport(Vec2::new(5.0, 5.0));
    assert!(approx_eq(after.x - before.x, 10.0));
    assert!(approx_eq(after.y - before.y, 4.0));
}

#[test]
fn zoom_at_keeps_anchor_fixed() {
    let mut c = cam(30.0, -20.0, 1.0);
    let anchor = Vec2::new(200.0, 150.0);
    let world_before = c.viewport_to_world(anchor);
    c.zoom_at(anchor, 2.5);
    assert!(approx_eq(c.zoom, 2.5));
    assert!(vec_approx_eq(c.viewport_to_world(anchor), world_before));
}

#[test]
fn zoom_at_clamps() {
    let mut c = cam(0.0, 0.0, 1.0);
    c.zoom_at(Vec2::ZERO, 1000.0);
    assert_eq!(c.zoom, MAX_ZOOM);
    c.zoom_at(Vec2::ZERO, 1e-9);
    assert_eq!(c.zoom, MIN_ZOOM);
}

#[test]
fn set_viewport_updates_size() {
    let mut c = Camera::default();
    c.set_viewport(640.0, 480.0);
    assert_eq!(c.visible_world_rect().max, Vec2::new(640.0, 480.0));
}
