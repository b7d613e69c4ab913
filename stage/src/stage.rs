//! The per-tick pipeline.
//!
//! [`Stage`] owns every engine part and runs one tick in a fixed order:
//! camera update, physics, animation sampling, background, draw pass,
//! post-process composite, then pointer dispatch. It is generic over the
//! paint [`Surface`] so the whole pipeline runs headless against a
//! [`crate::surface::PixelSurface`] in tests.

#[cfg(test)]
#[path = "stage_test.rs"]
mod stage_test;

use crate::camera::Camera;
use crate::color::Color;
use crate::error::EngineError;
use crate::input::{GamepadEvent, InputState, KeyEvent};
use crate::looper::{ListenerId, Looper, LooperEvent, TickState, now_ms};
use crate::object::{ObjectId, RenderObject};
use crate::offscreen::OffscreenRenderer;
use crate::physics::{BodyId, BodyKind, PhysicsWorld2D};
use crate::render::{CompositeOptions, FrameReport, Renderer};
use crate::scene::Scene;
use crate::surface::Surface;

/// Offscreen copy-back composited after every draw pass.
#[derive(Debug, Clone)]
pub struct PostProcess {
    pub offscreen: OffscreenRenderer,
    pub options: CompositeOptions,
}

pub struct Stage<S: Surface> {
    pub scene: Scene,
    pub physics: PhysicsWorld2D,
    pub input: InputState,
    /// Painted under every object; `None` leaves the cleared surface transparent.
    pub background: Option<Color>,
    renderer: Renderer<S>,
    camera: Camera,
    pending_camera: Option<Camera>,
    post: Option<PostProcess>,
    last_report: Option<FrameReport>,
}

impl<S: Surface> Stage<S> {
    /// Stage over `surface`, with scene and camera sized to match it.
    #[must_use]
    pub fn new(surface: S) -> Self {
        let (w, h) = (f64::from(surface.width()), f64::from(surface.height()));
        Self {
            scene: Scene::new(w, h),
            renderer: Renderer::new(surface),
            physics: PhysicsWorld2D::new(),
            input: InputState::new(),
            background: None,
            camera: Camera::new(w, h),
            pending_camera: None,
            post: None,
            last_report: None,
        }
    }

    // --- Objects ---

    /// Read access to the object list and surface. Objects are removed only
    /// through [`Self::destroy`] so their bodies go with them.
    #[must_use]
    pub fn renderer(&self) -> &Renderer<S> {
        &self.renderer
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut RenderObject> {
        self.renderer.get_mut(id)
    }

    pub fn add(&mut self, object: RenderObject) -> ObjectId {
        self.renderer.add(object)
    }

    /// Remove an object and detach any body bound to it.
    ///
    /// # Errors
    ///
    /// [`EngineError::State`] if `id` is not live.
    pub fn destroy(&mut self, id: ObjectId) -> Result<RenderObject, EngineError> {
        let object = self.renderer.destroy(id)?;
        self.physics.detach_object(id);
        Ok(object)
    }

    /// Bind a rigid body to a live object.
    ///
    /// # Errors
    ///
    /// See [`PhysicsWorld2D::bind`].
    pub fn bind_body(&mut self, id: ObjectId, density: f64, kind: BodyKind) -> Result<BodyId, EngineError> {
        self.physics.bind(&self.renderer, id, density, kind)
    }

    // --- Camera ---

    /// The camera used by the latest draw pass.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Replace the camera from the start of the next tick.
    pub fn set_camera(&mut self, camera: Camera) {
        self.pending_camera = Some(camera);
    }

    /// Edit the camera that the next tick will use.
    pub fn pending_camera_mut(&mut self) -> &mut Camera {
        self.pending_camera.get_or_insert(self.camera)
    }

    // --- Post-processing ---

    pub fn enable_post_process(&mut self, offscreen: OffscreenRenderer, options: CompositeOptions) {
        self.post = Some(PostProcess { offscreen, options });
    }

    pub fn disable_post_process(&mut self) {
        self.post = None;
    }

    #[must_use]
    pub fn post_process(&self) -> Option<&PostProcess> {
        self.post.as_ref()
    }

    // --- Host events ---

    /// Forward a host resize. An `AutoResize` scene resizes the surface and
    /// the next tick's camera viewport. With `RedrawOnResize` the cleared
    /// surface is repainted right away through that camera.
    ///
    /// # Errors
    ///
    /// Surface backend failure.
    pub fn handle_host_resize(&mut self, width: u32, height: u32) -> Result<bool, EngineError> {
        if !self.scene.handle_host_resize(f64::from(width), f64::from(height)) {
            return Ok(false);
        }
        self.renderer.surface_mut().resize(width, height)?;
        self.pending_camera_mut().set_viewport(f64::from(width), f64::from(height));
        if self.scene.take_redraw_request() {
            self.redraw()?;
        }
        Ok(true)
    }

    /// Repaint the last drawn frame outside the tick sequence. Nothing is
    /// painted before the first frame.
    fn redraw(&mut self) -> Result<(), EngineError> {
        let Some(frame) = self.renderer.drawn_frame() else {
            return Ok(());
        };
        let tick = TickState { delta_ms: 0.0, timestamp_ms: now_ms(), frame };
        let camera = self.pending_camera.unwrap_or(self.camera);
        let report = self.paint(&tick, &camera)?;
        tracing::debug!(frame, visible = report.visible_count, "redrawn after resize");
        Ok(())
    }

    /// Keyboard events run their handlers immediately.
    pub fn handle_key(&mut self, event: KeyEvent) -> bool {
        self.input.handle_key(event)
    }

    pub fn handle_gamepad(&mut self, event: &GamepadEvent) -> bool {
        self.input.handle_gamepad(event)
    }

    // --- Ticking ---

    /// Report from the most recent non-skip tick.
    #[must_use]
    pub fn last_report(&self) -> Option<FrameReport> {
        self.last_report
    }

    /// Run one tick of the pipeline. Skip ticks change nothing.
    ///
    /// # Errors
    ///
    /// Surface backend failure, or a post-process capture that cannot be
    /// composited.
    pub fn frame(&mut self, tick: &TickState) -> Result<FrameReport, EngineError> {
        if tick.is_skip() {
            tracing::trace!(frame = tick.frame, "skip tick");
            return Ok(FrameReport::skipped(tick.frame));
        }
        if let Some(camera) = self.pending_camera.take() {
            self.camera = camera;
        }

        self.physics.update(tick.delta_secs(), &mut self.renderer);
        self.renderer.sample_animations(tick);

        let camera = self.camera;
        let report = self.paint(tick, &camera)?;

        let delivered = self.scene.dispatch_input(&mut self.renderer, &self.camera, tick.timestamp_ms);
        self.renderer.flush_deferred();
        self.detach_destroyed();

        tracing::trace!(frame = tick.frame, delivered, objects = self.renderer.len(), "tick complete");
        self.last_report = Some(report);
        Ok(report)
    }

    /// Register [`Self::frame`] as an update listener on `looper`.
    pub fn attach(looper: &mut Looper<Self>) -> ListenerId
    where
        S: 'static,
    {
        looper.add_event_listener(LooperEvent::Update, |stage: &mut Self, tick| {
            stage.frame(tick)?;
            Ok(())
        })
    }

    /// Background, draw pass, then the post-process composite.
    fn paint(&mut self, tick: &TickState, camera: &Camera) -> Result<FrameReport, EngineError> {
        self.renderer.clear_scene()?;
        if let Some(background) = self.background {
            self.renderer.paint_scene(background)?;
        }
        let report = self.renderer.render_objects_in_camera(tick, camera)?;
        self.detach_destroyed();

        if let Some(post) = self.post.as_mut() {
            post.offscreen.create_texture(&self.renderer)?;
            self.renderer.render_copied_texture(&post.offscreen, post.options)?;
        }
        Ok(report)
    }

    fn detach_destroyed(&mut self) {
        for id in self.renderer.drain_destroyed() {
            self.physics.detach_object(id);
        }
    }
}
