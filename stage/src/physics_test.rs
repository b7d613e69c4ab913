#![allow(clippy::float_cmp)]

use uuid::Uuid;

use super::*;

const EPSILON: f64 = 1e-9;

#[derive(Default)]
struct Objects(Vec<RenderObject>);

impl Objects {
    fn add(&mut self, mut object: RenderObject) -> ObjectId {
        let id = Uuid::new_v4();
        object.attach(id, self.0.len());
        self.0.push(object);
        id
    }

    fn pos(&self, id: ObjectId) -> Vec2 {
        self.object(id).map_or(Vec2::new(f64::NAN, f64::NAN), |o| o.position)
    }
}

impl ObjectStore for Objects {
    fn object(&self, id: ObjectId) -> Option<&RenderObject> {
        self.0.iter().find(|o| o.id() == Some(id))
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut RenderObject> {
        self.0.iter_mut().find(|o| o.id() == Some(id))
    }
}

fn ground(objects: &mut Objects, world: &mut PhysicsWorld2D) -> ObjectId {
    // Top surface at y = 20.
    let id = objects.add(RenderObject::rect(400.0, 20.0).at(200.0, 10.0));
    world.bind(objects, id, 1.0, BodyKind::Static).expect("bind ground");
    id
}

// =============================================================
// Binding
// =============================================================

#[test]
fn bind_rejects_non_positive_density() {
    let mut objects = Objects::default();
    let id = objects.add(RenderObject::rect(1.0, 1.0));
    let mut world = PhysicsWorld2D::new();
    for density in [0.0, -1.0, f64::NAN] {
        let err = world.bind(&objects, id, density, BodyKind::Dynamic);
        assert!(matches!(err, Err(EngineError::Configuration(_))), "{density}");
    }
    assert!(world.is_empty());
}

#[test]
fn bind_rejects_second_body_for_same_object() {
    let mut objects = Objects::default();
    let id = objects.add(RenderObject::rect(1.0, 1.0));
    let mut world = PhysicsWorld2D::new();
    world.bind(&objects, id, 1.0, BodyKind::Dynamic).expect("first");
    let err = world.bind(&objects, id, 1.0, BodyKind::Static);
    assert!(matches!(err, Err(EngineError::Configuration(_))));
    assert_eq!(world.len(), 1);
}

#[test]
fn bind_rejects_unknown_object() {
    let objects = Objects::default();
    let mut world = PhysicsWorld2D::new();
    let err = world.bind(&objects, Uuid::new_v4(), 1.0, BodyKind::Dynamic);
    assert!(matches!(err, Err(EngineError::State(_))));
}

#[test]
fn body_mut_unknown_is_state_error() {
    let mut world = PhysicsWorld2D::new();
    assert!(matches!(world.body_mut(BodyId(99)), Err(EngineError::State(_))));
}

#[test]
fn detach_object_removes_its_body() {
    let mut objects = Objects::default();
    let id = objects.add(RenderObject::rect(1.0, 1.0));
    let mut world = PhysicsWorld2D::new();
    let body = world.bind(&objects, id, 1.0, BodyKind::Dynamic).expect("bind");
    assert_eq!(world.body_for(id), Some(body));
    assert!(world.detach_object(id).is_some());
    assert!(world.body(body).is_none());
    assert!(world.detach_object(id).is_none());
}

#[test]
fn fluent_body_setters_chain() {
    let mut objects = Objects::default();
    let id = objects.add(RenderObject::rect(1.0, 1.0));
    let mut world = PhysicsWorld2D::new();
    let body = world.bind(&objects, id, 1.0, BodyKind::Static).expect("bind");
    world.body_mut(body).expect("body").set_dynamic().set_velocity(1.0, 2.0).apply_center_force(3.0, 4.0);
    let b = world.body(body).expect("body");
    assert_eq!(b.kind(), BodyKind::Dynamic);
    assert_eq!(b.velocity(), Vec2::new(1.0, 2.0));
    assert_eq!(b.accumulated_force(), Vec2::new(3.0, 4.0));
}

// =============================================================
// Integration
// =============================================================

#[test]
fn no_gravity_no_force_means_no_motion() {
    let mut objects = Objects::default();
    let id = objects.add(RenderObject::rect(10.0, 10.0).at(3.0, 4.0));
    let mut world = PhysicsWorld2D::new();
    world.set_gravity(0.0, 0.0);
    world.bind(&objects, id, 1.0, BodyKind::Dynamic).expect("bind");
    for _ in 0..120 {
        world.update(1.0 / 60.0, &mut objects);
    }
    assert_eq!(objects.pos(id), Vec2::new(3.0, 4.0));
}

#[test]
fn gravity_integrates_semi_implicitly() {
    let mut objects = Objects::default();
    let id = objects.add(RenderObject::rect(1.0, 1.0));
    let mut world = PhysicsWorld2D::new();
    world.set_gravity(0.0, -50.0);
    let body = world.bind(&objects, id, 1.0, BodyKind::Dynamic).expect("bind");
    world.update(0.5, &mut objects);
    assert_eq!(world.body(body).map(RigidBody2D::velocity), Some(Vec2::new(0.0, -25.0)));
    assert_eq!(objects.pos(id), Vec2::new(0.0, -12.5));
}

#[test]
fn force_is_divided_by_mass_and_cleared() {
    let mut objects = Objects::default();
    let id = objects.add(RenderObject::rect(10.0, 10.0));
    let mut world = PhysicsWorld2D::new();
    let body = world.bind(&objects, id, 2.0, BodyKind::Dynamic).expect("bind");
    world.body_mut(body).expect("body").apply_center_force(200.0, 0.0);
    world.update(1.0, &mut objects);
    let b = world.body(body).expect("body");
    assert!((b.velocity().x - 1.0).abs() < EPSILON);
    assert_eq!(b.accumulated_force(), Vec2::ZERO);
}

#[test]
fn static_bodies_do_not_integrate() {
    let mut objects = Objects::default();
    let mut world = PhysicsWorld2D::new();
    world.set_gravity(0.0, -50.0);
    let id = ground(&mut objects, &mut world);
    world.update(1.0, &mut objects);
    assert_eq!(objects.pos(id), Vec2::new(200.0, 10.0));
}

#[test]
fn non_positive_step_is_noop() {
    let mut objects = Objects::default();
    let id = objects.add(RenderObject::rect(1.0, 1.0));
    let mut world = PhysicsWorld2D::new();
    world.set_gravity(0.0, -50.0);
    world.bind(&objects, id, 1.0, BodyKind::Dynamic).expect("bind");
    world.update(0.0, &mut objects);
    world.update(-1.0, &mut objects);
    assert_eq!(objects.pos(id), Vec2::ZERO);
}

// =============================================================
// Contacts
// =============================================================

#[test]
fn box_thrown_up_falls_back_and_rests_on_ground() {
    let mut objects = Objects::default();
    let mut world = PhysicsWorld2D::new();
    world.set_gravity(0.0, -50.0);
    ground(&mut objects, &mut world);
    let id = objects.add(RenderObject::rect(20.0, 20.0).at(200.0, 30.0));
    let body = world.bind(&objects, id, 1.0, BodyKind::Dynamic).expect("bind");
    // mass 400: net upward acceleration of 100 on the first step.
    world.body_mut(body).expect("body").apply_center_force(0.0, 400.0 * 150.0);

    let (mut went_up, mut came_down) = (false, false);
    for _ in 0..600 {
        world.update(1.0 / 60.0, &mut objects);
        let vy = world.body(body).map_or(0.0, |b| b.velocity().y);
        went_up |= vy > 0.0;
        came_down |= went_up && vy < 0.0;
        let bottom = objects.pos(id).y - 10.0;
        assert!(bottom >= 20.0 - 1e-6, "sank to {bottom}");
    }
    assert!(went_up && came_down);
    assert!((objects.pos(id).y - 30.0).abs() < 1e-6);
}

#[test]
fn side_contact_zeroes_only_inbound_component() {
    let mut objects = Objects::default();
    let mut world = PhysicsWorld2D::new();
    let wall = objects.add(RenderObject::rect(10.0, 100.0).at(0.0, 0.0));
    world.bind(&objects, wall, 1.0, BodyKind::Static).expect("wall");
    let id = objects.add(RenderObject::rect(10.0, 10.0).at(11.0, 0.0));
    let body = world.bind(&objects, id, 1.0, BodyKind::Dynamic).expect("bind");
    world.body_mut(body).expect("body").set_velocity(-6.0, 3.0);

    world.update(1.0, &mut objects);
    let b = world.body(body).expect("body");
    assert_eq!(b.velocity(), Vec2::new(0.0, 3.0));
    assert!((objects.pos(id).x - 10.0).abs() < EPSILON);
}

#[test]
fn circle_rests_on_box() {
    let mut objects = Objects::default();
    let mut world = PhysicsWorld2D::new();
    world.set_gravity(0.0, -50.0);
    ground(&mut objects, &mut world);
    let id = objects.add(RenderObject::circle(5.0).at(100.0, 26.0));
    world.bind(&objects, id, 1.0, BodyKind::Dynamic).expect("bind");
    for _ in 0..240 {
        world.update(1.0 / 60.0, &mut objects);
    }
    assert!((objects.pos(id).y - 25.0).abs() < 1e-6);
}

#[test]
fn circles_push_apart_along_center_line() {
    let mut objects = Objects::default();
    let mut world = PhysicsWorld2D::new();
    let anchor = objects.add(RenderObject::circle(5.0));
    world.bind(&objects, anchor, 1.0, BodyKind::Static).expect("anchor");
    let id = objects.add(RenderObject::circle(5.0).at(8.0, 0.0));
    world.bind(&objects, id, 1.0, BodyKind::Dynamic).expect("bind");
    world.update(1e-3, &mut objects);
    assert!((objects.pos(id).x - 10.0).abs() < 1e-9);
}

#[test]
fn box_against_static_circle_is_pushed_out() {
    let mut objects = Objects::default();
    let mut world = PhysicsWorld2D::new();
    let post = objects.add(RenderObject::circle(5.0));
    world.bind(&objects, post, 1.0, BodyKind::Static).expect("post");
    let id = objects.add(RenderObject::rect(10.0, 10.0).at(0.0, 8.0));
    let body = world.bind(&objects, id, 1.0, BodyKind::Dynamic).expect("bind");
    world.body_mut(body).expect("body").set_velocity(0.0, -1.0);
    world.update(1e-3, &mut objects);
    // Box bottom ends flush with the circle top.
    assert!((objects.pos(id).y - 10.0).abs() < 1e-9);
    assert_eq!(world.body(body).map(|b| b.velocity().y), Some(0.0));
}

#[test]
fn bodies_of_missing_objects_are_dropped_on_update() {
    let mut objects = Objects::default();
    let gone = objects.add(RenderObject::rect(1.0, 1.0));
    let kept = objects.add(RenderObject::rect(1.0, 1.0).at(5.0, 5.0));
    let mut world = PhysicsWorld2D::new();
    world.set_gravity(0.0, -10.0);
    world.bind(&objects, gone, 1.0, BodyKind::Dynamic).expect("bind");
    world.bind(&objects, kept, 1.0, BodyKind::Static).expect("bind");
    objects.0.retain(|o| o.id() != Some(gone));

    world.update(1.0, &mut objects);
    assert_eq!(world.len(), 1);
    assert!(world.body_for(gone).is_none());
    assert!(world.body_for(kept).is_some());
}

#[test]
fn prune_runs_even_on_a_zero_step() {
    let mut objects = Objects::default();
    let id = objects.add(RenderObject::rect(1.0, 1.0));
    let mut world = PhysicsWorld2D::new();
    world.bind(&objects, id, 1.0, BodyKind::Dynamic).expect("bind");
    objects.0.clear();
    world.update(0.0, &mut objects);
    assert!(world.is_empty());
    assert_eq!(world.prune(&objects), 0);
}
