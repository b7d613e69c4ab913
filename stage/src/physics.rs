//! 2D rigid-body integration with static-contact resolution.
//!
//! Bodies don't own geometry: each one points at a [`RenderObject`] through
//! its [`ObjectId`] and reads the object's position and shape every step.
//! Only dynamic bodies integrate. After integrating, each dynamic body is
//! pushed out of every static body it overlaps along the axis (or normal) of
//! least penetration, and the velocity component heading into the contact is
//! zeroed. Dynamic-vs-dynamic contacts are not resolved, and deep stacks of
//! bodies resting on each other settle only approximately.

#[cfg(test)]
#[path = "physics_test.rs"]
mod physics_test;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::math::{Aabb, Vec2};
use crate::object::{ObjectId, RenderObject, Shape};

/// Lookup of live render objects by id.
pub trait ObjectStore {
    fn object(&self, id: ObjectId) -> Option<&RenderObject>;
    fn object_mut(&mut self, id: ObjectId) -> Option<&mut RenderObject>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// Immovable; other bodies collide against it.
    #[default]
    Static,
    /// Integrated every step.
    Dynamic,
}

/// Motion state bound to one render object.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody2D {
    id: BodyId,
    object: ObjectId,
    density: f64,
    kind: BodyKind,
    velocity: Vec2,
    force: Vec2,
}

impl RigidBody2D {
    #[must_use]
    pub fn id(&self) -> BodyId {
        self.id
    }

    #[must_use]
    pub fn object(&self) -> ObjectId {
        self.object
    }

    #[must_use]
    pub fn density(&self) -> f64 {
        self.density
    }

    #[must_use]
    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Force accumulated since the last step.
    #[must_use]
    pub fn accumulated_force(&self) -> Vec2 {
        self.force
    }

    pub fn set_dynamic(&mut self) -> &mut Self {
        self.kind = BodyKind::Dynamic;
        self
    }

    /// Static bodies stop moving.
    pub fn set_static(&mut self) -> &mut Self {
        self.kind = BodyKind::Static;
        self.velocity = Vec2::ZERO;
        self.force = Vec2::ZERO;
        self
    }

    /// Add a force through the center of mass for the next step.
    pub fn apply_center_force(&mut self, fx: f64, fy: f64) -> &mut Self {
        self.force += Vec2::new(fx, fy);
        self
    }

    pub fn set_velocity(&mut self, vx: f64, vy: f64) -> &mut Self {
        self.velocity = Vec2::new(vx, vy);
        self
    }

    /// `density × area` of the bound object.
    #[must_use]
    pub fn mass_of(&self, object: &RenderObject) -> f64 {
        self.density * object.area()
    }
}

/// Collision geometry derived from an object each step.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Collider {
    Box(Aabb),
    Circle { center: Vec2, radius: f64 },
}

impl Collider {
    fn of(object: &RenderObject) -> Self {
        let bounds = object.world_bounds();
        match object.shape {
            Shape::Circle { .. } => {
                Self::Circle { center: bounds.center(), radius: bounds.width().max(bounds.height()) * 0.5 }
            }
            _ => Self::Box(bounds),
        }
    }
}

/// Push-out for a moving collider: move it by `normal × depth`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Contact {
    /// Unit vector pointing away from the static collider.
    normal: Vec2,
    depth: f64,
}

fn box_box(moving: &Aabb, fixed: &Aabb) -> Option<Contact> {
    let overlap_x = moving.max.x.min(fixed.max.x) - moving.min.x.max(fixed.min.x);
    let overlap_y = moving.max.y.min(fixed.max.y) - moving.min.y.max(fixed.min.y);
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return None;
    }
    let d = moving.center() - fixed.center();
    if overlap_x < overlap_y {
        let sign = if d.x < 0.0 { -1.0 } else { 1.0 };
        Some(Contact { normal: Vec2::new(sign, 0.0), depth: overlap_x })
    } else {
        let sign = if d.y < 0.0 { -1.0 } else { 1.0 };
        Some(Contact { normal: Vec2::new(0.0, sign), depth: overlap_y })
    }
}

fn circle_box(center: Vec2, radius: f64, fixed: &Aabb) -> Option<Contact> {
    let closest = Vec2::new(center.x.clamp(fixed.min.x, fixed.max.x), center.y.clamp(fixed.min.y, fixed.max.y));
    let d = center - closest;
    let dist = d.length();
    if dist > 0.0 {
        if dist >= radius {
            return None;
        }
        return d.normalize().map(|normal| Contact { normal, depth: radius - dist });
    }
    // Center inside the box: leave through the nearest face.
    let faces = [
        (center.x - fixed.min.x, Vec2::new(-1.0, 0.0)),
        (fixed.max.x - center.x, Vec2::new(1.0, 0.0)),
        (center.y - fixed.min.y, Vec2::new(0.0, -1.0)),
        (fixed.max.y - center.y, Vec2::new(0.0, 1.0)),
    ];
    faces
        .into_iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(gap, normal)| Contact { normal, depth: gap + radius })
}

fn circle_circle(a: Vec2, ra: f64, b: Vec2, rb: f64) -> Option<Contact> {
    let d = a - b;
    let dist = d.length();
    let reach = ra + rb;
    if dist >= reach {
        return None;
    }
    let normal = d.normalize().unwrap_or(Vec2::new(0.0, 1.0));
    Some(Contact { normal, depth: reach - dist })
}

fn contact(moving: Collider, fixed: Collider) -> Option<Contact> {
    match (moving, fixed) {
        (Collider::Box(a), Collider::Box(b)) => box_box(&a, &b),
        (Collider::Circle { center, radius }, Collider::Box(b)) => circle_box(center, radius, &b),
        (Collider::Box(a), Collider::Circle { center, radius }) => {
            circle_box(center, radius, &a).map(|c| Contact { normal: -c.normal, ..c })
        }
        (Collider::Circle { center: a, radius: ra }, Collider::Circle { center: b, radius: rb }) => {
            circle_circle(a, ra, b, rb)
        }
    }
}

/// Gravity plus the set of bodies.
#[derive(Debug, Clone, Default)]
pub struct PhysicsWorld2D {
    gravity: Vec2,
    bodies: Vec<RigidBody2D>,
    next_id: u64,
}

impl PhysicsWorld2D {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_gravity(&mut self, gx: f64, gy: f64) -> &mut Self {
        self.gravity = Vec2::new(gx, gy);
        self
    }

    #[must_use]
    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Bind a new body to a live object.
    ///
    /// # Errors
    ///
    /// [`EngineError::Configuration`] for a non-positive density or an object
    /// that already has a body; [`EngineError::State`] for an unknown object.
    pub fn bind(
        &mut self,
        objects: &impl ObjectStore,
        object: ObjectId,
        density: f64,
        kind: BodyKind,
    ) -> Result<BodyId, EngineError> {
        if density.is_nan() || density <= 0.0 {
            return Err(EngineError::Configuration(format!("density must be positive, got {density}")));
        }
        if self.body_for(object).is_some() {
            return Err(EngineError::Configuration(format!("object {object} already has a body")));
        }
        if objects.object(object).is_none() {
            return Err(EngineError::State(format!("object {object} is not in the scene")));
        }
        let id = BodyId(self.next_id);
        self.next_id += 1;
        self.bodies.push(RigidBody2D {
            id,
            object,
            density,
            kind,
            velocity: Vec2::ZERO,
            force: Vec2::ZERO,
        });
        tracing::debug!(?id, %object, ?kind, density, "body bound");
        Ok(id)
    }

    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&RigidBody2D> {
        self.bodies.iter().find(|b| b.id == id)
    }

    /// # Errors
    ///
    /// [`EngineError::State`] if no body has this id.
    pub fn body_mut(&mut self, id: BodyId) -> Result<&mut RigidBody2D, EngineError> {
        self.bodies
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| EngineError::State(format!("no body {id:?}")))
    }

    /// The body driving `object`, if any.
    #[must_use]
    pub fn body_for(&self, object: ObjectId) -> Option<BodyId> {
        self.bodies.iter().find(|b| b.object == object).map(|b| b.id)
    }

    pub fn unbind(&mut self, id: BodyId) -> Option<RigidBody2D> {
        let pos = self.bodies.iter().position(|b| b.id == id)?;
        Some(self.bodies.remove(pos))
    }

    /// Drop the body bound to `object`. Called when the object is destroyed.
    pub fn detach_object(&mut self, object: ObjectId) -> Option<RigidBody2D> {
        let id = self.body_for(object)?;
        self.unbind(id)
    }

    /// Drop bodies whose object is gone from `objects`. Returns how many.
    pub fn prune(&mut self, objects: &impl ObjectStore) -> usize {
        let before = self.bodies.len();
        self.bodies.retain(|b| objects.object(b.object).is_some());
        let pruned = before - self.bodies.len();
        if pruned > 0 {
            tracing::debug!(pruned, "bodies of destroyed objects dropped");
        }
        pruned
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn bodies(&self) -> impl Iterator<Item = &RigidBody2D> {
        self.bodies.iter()
    }

    /// Advance by `dt_secs`: integrate dynamic bodies, then resolve their
    /// contacts with static bodies. Non-positive steps do nothing.
    ///
    /// Bodies whose object is no longer in `objects` are dropped first.
    pub fn update(&mut self, dt_secs: f64, objects: &mut impl ObjectStore) {
        self.prune(&*objects);
        if dt_secs.is_nan() || dt_secs <= 0.0 {
            return;
        }
        for body in self.bodies.iter_mut().filter(|b| b.kind == BodyKind::Dynamic) {
            let Some(object) = objects.object_mut(body.object) else {
                continue;
            };
            let mass = body.mass_of(object);
            let accel = if mass > 0.0 { self.gravity + body.force / mass } else { self.gravity };
            body.velocity += accel * dt_secs;
            object.position += body.velocity * dt_secs;
            body.force = Vec2::ZERO;
        }

        let fixed: Vec<Collider> = self
            .bodies
            .iter()
            .filter(|b| b.kind == BodyKind::Static)
            .filter_map(|b| objects.object(b.object))
            .map(Collider::of)
            .collect();
        if fixed.is_empty() {
            return;
        }
        for body in self.bodies.iter_mut().filter(|b| b.kind == BodyKind::Dynamic) {
            let Some(object) = objects.object_mut(body.object) else {
                continue;
            };
            for other in &fixed {
                let Some(hit) = contact(Collider::of(object), *other) else {
                    continue;
                };
                object.position += hit.normal * hit.depth;
                let inbound = body.velocity.dot(hit.normal);
                if inbound < 0.0 {
                    body.velocity -= hit.normal * inbound;
                }
            }
        }
    }
}
