#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::Camera;
use crate::math::Vec2;
use crate::object::{ObjectId, RenderObject};

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub object_id: ObjectId,
    pub array_index: usize,
    /// The tested point in world coordinates.
    pub world: Vec2,
}

/// Topmost object under `viewport_pt`.
///
/// `candidates` must be in paint order (bottom first); they are walked in
/// reverse so the last-painted object wins. Objects that aren't drawable are
/// passed over.
#[must_use]
pub fn hit_test<'a>(
    candidates: impl DoubleEndedIterator<Item = &'a RenderObject>,
    viewport_pt: Vec2,
    camera: &Camera,
) -> Option<Hit> {
    let world = camera.viewport_to_world(viewport_pt);
    candidates.rev().filter(|o| o.is_drawable()).find(|o| o.contains_world(world)).and_then(|o| {
        Some(Hit { object_id: o.id()?, array_index: o.array_index()?, world })
    })
}
