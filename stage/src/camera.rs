#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_ZOOM, MIN_ZOOM};
use crate::math::{Aabb, Transform, Vec2};

/// Pan/zoom camera mapping y-up world space onto the y-down viewport.
///
/// `offset` is the world point shown at the viewport's bottom-left corner.
/// `zoom` is viewport pixels per world unit (1.0 = no zoom).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub offset: Vec2,
    pub zoom: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { offset: Vec2::ZERO, zoom: 1.0, viewport_width: 0.0, viewport_height: 0.0 }
    }
}

impl Camera {
    /// Camera at the world origin with a viewport of the given size.
    #[must_use]
    pub fn new(viewport_width: f64, viewport_height: f64) -> Self {
        Self { viewport_width, viewport_height, ..Self::default() }
    }

    /// Convert a world-space point to viewport coordinates (pixels, y-down).
    #[must_use]
    pub fn world_to_viewport(&self, world: Vec2) -> Vec2 {
        Vec2 {
            x: (world.x - self.offset.x) * self.zoom,
            y: self.viewport_height - (world.y - self.offset.y) * self.zoom,
        }
    }

    /// Convert a viewport point (pixels, y-down) to world coordinates.
    #[must_use]
    pub fn viewport_to_world(&self, viewport: Vec2) -> Vec2 {
        Vec2 {
            x: viewport.x / self.zoom + self.offset.x,
            y: (self.viewport_height - viewport.y) / self.zoom + self.offset.y,
        }
    }

    /// Convert a viewport distance (pixels) to world-space distance.
    #[must_use]
    pub fn viewport_dist_to_world(&self, viewport_dist: f64) -> f64 {
        viewport_dist / self.zoom
    }

    /// The affine form of [`Self::world_to_viewport`], for the paint surface.
    #[must_use]
    pub fn view_transform(&self) -> Transform {
        Transform::new(
            self.zoom,
            0.0,
            0.0,
            -self.zoom,
            -self.offset.x * self.zoom,
            self.offset.y.mul_add(self.zoom, self.viewport_height),
        )
    }

    /// The world-space rectangle covered by the viewport.
    #[must_use]
    pub fn visible_world_rect(&self) -> Aabb {
        let extent = Vec2::new(self.viewport_width / self.zoom, self.viewport_height / self.zoom);
        Aabb::new(self.offset, self.offset + extent)
    }

    /// Whether a world-space bounding box overlaps the viewport.
    ///
    /// The renderer's culling pass and the scene's hit-testing both go through
    /// this, so an object is paintable exactly when it is hittable.
    #[must_use]
    pub fn is_visible(&self, bounds: &Aabb) -> bool {
        self.visible_world_rect().intersects(bounds)
    }

    /// Pan by a viewport-space drag delta. Dragging right/down moves the world right/down.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.offset.x -= dx / self.zoom;
        self.offset.y += dy / self.zoom;
    }

    /// Multiply zoom by `factor`, keeping the world point under `anchor` fixed.
    pub fn zoom_at(&mut self, anchor: Vec2, factor: f64) {
        let world = self.viewport_to_world(anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.offset = Vec2 {
            x: world.x - anchor.x / self.zoom,
            y: world.y - (self.viewport_height - anchor.y) / self.zoom,
        };
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport_width = width;
        self.viewport_height = height;
    }
}
