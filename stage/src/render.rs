//! Renderer: the ordered object list and the camera-relative draw pass.
//!
//! Objects paint in ascending `array_index`, which always equals their
//! position in the list. Each draw pass rebuilds the visible list from the
//! camera; hit-testing reads that same list, so whatever was painted this
//! tick is exactly what can be hit.
//!
//! Structural changes requested from handlers are queued as [`Command`]s and
//! applied by [`Renderer::flush_deferred`], never while the list is being
//! walked.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::Camera;
use crate::color::{Color, PixelSample};
use crate::error::EngineError;
use crate::event::{Command, EventKind, StageEvent};
use crate::hit::{self, Hit};
use crate::looper::{TickState, now_ms};
use crate::math::{Transform, Vec2};
use crate::object::{ObjectId, RenderObject};
use crate::offscreen::OffscreenRenderer;
use crate::physics::ObjectStore;
use crate::surface::{Paint, Surface};

/// Summary of one draw pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame: u64,
    pub duration_ms: f64,
    pub visible_count: usize,
    pub skipped: bool,
}

impl FrameReport {
    #[must_use]
    pub fn skipped(frame: u64) -> Self {
        Self { frame, duration_ms: 0.0, visible_count: 0, skipped: true }
    }
}

/// How an offscreen texture is blended back onto the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeOptions {
    pub opacity: f64,
    /// Bilinear filtering when stretching the texture.
    pub smoothing: bool,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self { opacity: 1.0, smoothing: true }
    }
}

/// Owns the paint surface and the ordered object list.
pub struct Renderer<S: Surface> {
    surface: S,
    objects: Vec<RenderObject>,
    index: HashMap<ObjectId, usize>,
    visible: Vec<ObjectId>,
    commands: Vec<Command>,
    destroyed: Vec<ObjectId>,
    drawn_frame: Option<u64>,
}

impl<S: Surface> Renderer<S> {
    #[must_use]
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            objects: Vec::new(),
            index: HashMap::new(),
            visible: Vec::new(),
            commands: Vec::new(),
            destroyed: Vec::new(),
            drawn_frame: None,
        }
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    // --- Object list ---

    /// Append `object` on top of the paint order and return its new id.
    pub fn add(&mut self, mut object: RenderObject) -> ObjectId {
        let id = Uuid::new_v4();
        let array_index = self.objects.len();
        object.attach(id, array_index);
        self.objects.push(object);
        self.index.insert(id, array_index);
        tracing::debug!(%id, array_index, "object added");
        id
    }

    /// Remove an object now and close the gap in the paint order.
    ///
    /// The returned object is standalone again, with its handlers dropped.
    ///
    /// # Errors
    ///
    /// [`EngineError::State`] if `id` is not live.
    pub fn destroy(&mut self, id: ObjectId) -> Result<RenderObject, EngineError> {
        let at = self.index.remove(&id).ok_or_else(|| EngineError::State(format!("object {id} is not live")))?;
        let mut object = self.objects.remove(at);
        for (i, later) in self.objects.iter_mut().enumerate().skip(at) {
            later.set_array_index(i);
            if let Some(later_id) = later.id() {
                self.index.insert(later_id, i);
            }
        }
        self.visible.retain(|v| *v != id);
        object.detach();
        tracing::debug!(%id, "object destroyed");
        Ok(object)
    }

    /// Queue a destroy for the next [`Self::flush_deferred`].
    pub fn request_destroy(&mut self, id: ObjectId) {
        self.commands.push(Command::Destroy(id));
    }

    /// Apply queued commands. Destroyed ids accumulate until
    /// [`Self::drain_destroyed`]. Returns how many objects were removed.
    pub fn flush_deferred(&mut self) -> usize {
        let mut removed = 0;
        for command in std::mem::take(&mut self.commands) {
            match command {
                Command::Destroy(id) => {
                    // Already gone when two handlers asked for the same object.
                    if self.destroy(id).is_ok() {
                        self.destroyed.push(id);
                        removed += 1;
                    }
                }
            }
        }
        removed
    }

    /// Ids removed by [`Self::flush_deferred`] since the last drain. The list
    /// only spans one frame: each draw pass starts it empty.
    pub fn drain_destroyed(&mut self) -> Vec<ObjectId> {
        std::mem::take(&mut self.destroyed)
    }

    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&RenderObject> {
        self.index.get(&id).and_then(|&i| self.objects.get(i))
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut RenderObject> {
        self.index.get(&id).and_then(|&i| self.objects.get_mut(i))
    }

    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.index.contains_key(&id)
    }

    /// Live objects in paint order.
    #[must_use]
    pub fn objects(&self) -> &[RenderObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut RenderObject> {
        self.objects.iter_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    // --- Surface passes ---

    /// Reset the surface to transparent.
    ///
    /// # Errors
    ///
    /// Surface backend failure.
    pub fn clear_scene(&mut self) -> Result<(), EngineError> {
        self.surface.clear()
    }

    /// Fill the whole surface with `color`.
    ///
    /// # Errors
    ///
    /// Surface backend failure.
    pub fn paint_scene(&mut self, color: Color) -> Result<(), EngineError> {
        let (w, h) = (f64::from(self.surface.width()), f64::from(self.surface.height()));
        self.surface.fill_rect(&Transform::translation(w * 0.5, h * 0.5), w, h, &Paint::solid(color))
    }

    /// Advance every live object's tweens. Skip ticks are ignored.
    pub fn sample_animations(&mut self, tick: &TickState) {
        if tick.is_skip() {
            return;
        }
        for object in &mut self.objects {
            object.sample_animations(tick.delta_ms);
        }
    }

    /// Cull against `camera`, paint what's visible in order, and fire each
    /// painted object's `Render` handler. Skip ticks paint nothing.
    ///
    /// Handler failures are logged and the pass continues. Destroys they
    /// request are applied when the pass is done.
    ///
    /// # Errors
    ///
    /// Surface backend failure.
    pub fn render_objects_in_camera(&mut self, tick: &TickState, camera: &Camera) -> Result<FrameReport, EngineError> {
        if tick.is_skip() {
            return Ok(FrameReport::skipped(tick.frame));
        }
        let started = now_ms();
        let view = camera.view_transform();
        self.visible.clear();
        self.destroyed.clear();
        for object in &mut self.objects {
            let Some(id) = object.id() else {
                continue;
            };
            if !object.is_drawable() || !camera.is_visible(&object.world_bounds()) {
                continue;
            }
            object.draw(&mut self.surface, &view)?;
            self.visible.push(id);

            if object.has_listener(EventKind::Render) {
                let mut event = StageEvent::new(
                    EventKind::Render,
                    camera.world_to_viewport(object.position),
                    object.position,
                    tick.timestamp_ms,
                );
                event.target = Some(id);
                object.dispatch(&event, &self.surface, &mut self.commands);
            }
        }
        self.drawn_frame = Some(tick.frame);
        self.flush_deferred();

        let report = FrameReport {
            frame: tick.frame,
            duration_ms: (now_ms() - started).max(0.0),
            visible_count: self.visible.len(),
            skipped: false,
        };
        tracing::debug!(frame = report.frame, visible = report.visible_count, "draw pass complete");
        Ok(report)
    }

    /// Frame of the most recent draw pass.
    #[must_use]
    pub fn drawn_frame(&self) -> Option<u64> {
        self.drawn_frame
    }

    /// Ids painted by the latest draw pass, bottom first.
    #[must_use]
    pub fn visible(&self) -> &[ObjectId] {
        &self.visible
    }

    /// Topmost visible object under a viewport point.
    #[must_use]
    pub fn hit_test(&self, viewport_pt: Vec2, camera: &Camera) -> Option<Hit> {
        hit::hit_test(self.visible.iter().filter_map(|id| self.get(*id)), viewport_pt, camera)
    }

    /// Sample a device-pixel region.
    ///
    /// # Errors
    ///
    /// Surface backend failure.
    pub fn get_image_data(&self, x: i32, y: i32, width: u32, height: u32) -> Result<PixelSample, EngineError> {
        let data = self.surface.get_image_data(x, y, width, height)?;
        Ok(PixelSample::from_rgba(&data, width, height))
    }

    /// Composite the texture captured this tick back over the surface.
    ///
    /// # Errors
    ///
    /// [`EngineError::State`] if no texture exists or it was captured on an
    /// earlier frame than the latest draw pass.
    pub fn render_copied_texture(
        &mut self,
        offscreen: &OffscreenRenderer,
        options: CompositeOptions,
    ) -> Result<(), EngineError> {
        let texture = offscreen.texture().ok_or_else(|| EngineError::State("no offscreen texture".into()))?;
        if Some(texture.frame()) != self.drawn_frame {
            return Err(EngineError::State(format!(
                "offscreen texture from frame {} is stale (latest draw pass: {:?})",
                texture.frame(),
                self.drawn_frame
            )));
        }
        self.surface.composite_snapshot(texture.image(), options.opacity, options.smoothing)
    }

    // --- Events ---

    /// Deliver `event` to one object's handler. Returns whether a handler ran.
    pub fn dispatch(&mut self, id: ObjectId, event: &StageEvent) -> bool {
        let Some(&at) = self.index.get(&id) else {
            return false;
        };
        let Some(object) = self.objects.get_mut(at) else {
            return false;
        };
        object.dispatch(event, &self.surface, &mut self.commands)
    }

    /// Surface and command queue together, for scene-level handlers.
    pub(crate) fn handler_parts(&mut self) -> (&S, &mut Vec<Command>) {
        (&self.surface, &mut self.commands)
    }
}

impl<S: Surface> ObjectStore for Renderer<S> {
    fn object(&self, id: ObjectId) -> Option<&RenderObject> {
        self.get(id)
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut RenderObject> {
        self.get_mut(id)
    }
}
