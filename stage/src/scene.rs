//! Scene: host-facing bounds, attributes, and pointer input.
//!
//! Pointer events from the host are queued as they arrive and dispatched at
//! the end of the tick, after the draw pass, so hit-testing always sees the
//! objects that were just painted.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::{HashSet, VecDeque};
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::color::PixelSample;
use crate::error::{EngineError, ListenerResult};
use crate::event::{Command, EventKind, EventTable, StageEvent};
use crate::input::{Button, Modifiers, WheelDelta};
use crate::math::Vec2;
use crate::object::ObjectId;
use crate::render::Renderer;
use crate::surface::Surface;

/// Host-integration switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneAttribute {
    /// Follow the host element's size on resize.
    AutoResize,
    /// Swallow the host's context menu over the scene.
    SuppressContextMenu,
    /// Request a redraw after an automatic resize.
    RedrawOnResize,
}

/// Handler for one scene-level [`EventKind`].
pub type SceneHandler = Box<dyn FnMut(&StageEvent, &mut SceneContext<'_>) -> ListenerResult>;

/// What a scene handler can touch while it runs.
pub struct SceneContext<'a> {
    surface: &'a dyn Surface,
    commands: &'a mut Vec<Command>,
    camera: &'a Camera,
}

impl SceneContext<'_> {
    /// Sample surface pixels as they stand right now.
    ///
    /// # Errors
    ///
    /// Surface backend failure.
    pub fn get_image_data(&self, x: i32, y: i32, width: u32, height: u32) -> Result<PixelSample, EngineError> {
        let data = self.surface.get_image_data(x, y, width, height)?;
        Ok(PixelSample::from_rgba(&data, width, height))
    }

    /// Destroy `id` once input dispatch finishes.
    pub fn destroy(&mut self, id: ObjectId) {
        self.commands.push(Command::Destroy(id));
    }

    /// The camera used for this tick's draw pass.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        self.camera
    }
}

/// A host pointer event waiting for end-of-tick dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PointerInput {
    Move { at: Vec2 },
    Down { at: Vec2, button: Button },
    Up { at: Vec2, button: Button },
    Wheel { at: Vec2, delta: WheelDelta },
}

/// Pointer gesture in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Gesture {
    /// No primary button held over an object.
    #[default]
    Idle,
    /// Primary button went down on `target`; the next move starts a drag.
    Armed { target: ObjectId },
    /// `target` is being dragged until the button is released.
    Dragging { target: ObjectId },
}

pub struct Scene {
    width: f64,
    height: f64,
    attributes: HashSet<SceneAttribute>,
    redraw_requested: bool,
    modifiers: Modifiers,
    cursor: Option<Vec2>,
    pressed: Option<Button>,
    gesture: Gesture,
    hover: Option<ObjectId>,
    last_wheel: Option<WheelDelta>,
    queue: VecDeque<PointerInput>,
    listeners: EventTable<SceneHandler>,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("attributes", &self.attributes)
            .field("cursor", &self.cursor)
            .field("gesture", &self.gesture)
            .field("hover", &self.hover)
            .field("queued", &self.queue.len())
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

impl Scene {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            attributes: HashSet::new(),
            redraw_requested: false,
            modifiers: Modifiers::default(),
            cursor: None,
            pressed: None,
            gesture: Gesture::Idle,
            hover: None,
            last_wheel: None,
            queue: VecDeque::new(),
            listeners: EventTable::new(),
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn set_attribute(&mut self, attribute: SceneAttribute) -> &mut Self {
        self.attributes.insert(attribute);
        self
    }

    pub fn remove_attribute(&mut self, attribute: SceneAttribute) -> &mut Self {
        self.attributes.remove(&attribute);
        self
    }

    #[must_use]
    pub fn has_attribute(&self, attribute: SceneAttribute) -> bool {
        self.attributes.contains(&attribute)
    }

    #[must_use]
    pub fn suppresses_context_menu(&self) -> bool {
        self.has_attribute(SceneAttribute::SuppressContextMenu)
    }

    /// React to the host element changing size.
    ///
    /// Only an `AutoResize` scene follows the host. Returns whether the scene
    /// was resized.
    pub fn handle_host_resize(&mut self, width: f64, height: f64) -> bool {
        if !self.has_attribute(SceneAttribute::AutoResize) {
            return false;
        }
        if (width, height) == (self.width, self.height) {
            return false;
        }
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        if self.has_attribute(SceneAttribute::RedrawOnResize) {
            self.redraw_requested = true;
        }
        tracing::debug!(width = self.width, height = self.height, "scene resized");
        true
    }

    /// Consume a pending redraw request from an automatic resize.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    /// Middle of the scene bounds.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// A point drawn uniformly from the current scene bounds.
    pub fn random_position<R: Rng>(&self, rng: &mut R) -> Vec2 {
        Vec2::new(rng.random::<f64>() * self.width, rng.random::<f64>() * self.height)
    }

    // --- Listeners ---

    /// Register the scene handler for `kind`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Configuration`] if `kind` is not a scene event or
    /// already has a handler.
    pub fn add_event_listener(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&StageEvent, &mut SceneContext<'_>) -> ListenerResult + 'static,
    ) -> Result<&mut Self, EngineError> {
        if !EventKind::SCENE.contains(&kind) {
            return Err(EngineError::Configuration(format!("{kind} is not a scene event")));
        }
        self.listeners.add(kind, Box::new(handler))?;
        Ok(self)
    }

    pub fn remove_event_listener(&mut self, kind: EventKind) -> bool {
        self.listeners.remove(kind)
    }

    #[must_use]
    pub fn has_listener(&self, kind: EventKind) -> bool {
        self.listeners.contains(kind)
    }

    // --- Pointer queue ---

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    pub fn queue_pointer_move(&mut self, at: Vec2) {
        self.queue.push_back(PointerInput::Move { at });
    }

    pub fn queue_pointer_down(&mut self, at: Vec2, button: Button) {
        self.queue.push_back(PointerInput::Down { at, button });
    }

    pub fn queue_pointer_up(&mut self, at: Vec2, button: Button) {
        self.queue.push_back(PointerInput::Up { at, button });
    }

    pub fn queue_wheel(&mut self, at: Vec2, delta: WheelDelta) {
        self.queue.push_back(PointerInput::Wheel { at, delta });
    }

    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Last pointer position in viewport pixels.
    #[must_use]
    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    #[must_use]
    pub fn pressed_button(&self) -> Option<Button> {
        self.pressed
    }

    #[must_use]
    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// Object under the cursor as of the last dispatch.
    #[must_use]
    pub fn hover_target(&self) -> Option<ObjectId> {
        self.hover
    }

    #[must_use]
    pub fn last_wheel(&self) -> Option<WheelDelta> {
        self.last_wheel
    }

    /// Forget the pointer entirely, e.g. when it leaves the host element.
    pub fn reset_pointer(&mut self) {
        self.queue.clear();
        self.cursor = None;
        self.pressed = None;
        self.gesture = Gesture::Idle;
    }

    // --- Dispatch ---

    /// Deliver queued pointer input against this tick's visible list.
    ///
    /// Each event goes to the topmost hit object, then to the scene handler
    /// for its kind. Enter/leave are compared once against the previous
    /// dispatch. Returns how many handlers ran.
    pub fn dispatch_input<S: Surface>(&mut self, renderer: &mut Renderer<S>, camera: &Camera, timestamp_ms: f64) -> usize {
        let mut delivered = 0;
        while let Some(input) = self.queue.pop_front() {
            delivered += self.dispatch_one(input, renderer, camera, timestamp_ms);
        }

        let hover = self.cursor.and_then(|at| renderer.hit_test(at, camera)).map(|hit| hit.object_id);
        if hover != self.hover {
            let at = self.cursor.unwrap_or(Vec2::ZERO);
            if let Some(previous) = self.hover {
                let event = self.event(EventKind::PointerLeave, at, camera, Some(previous), timestamp_ms);
                delivered += self.deliver(renderer, camera, Some(previous), &event);
            }
            if let Some(current) = hover {
                let event = self.event(EventKind::PointerEnter, at, camera, Some(current), timestamp_ms);
                delivered += self.deliver(renderer, camera, Some(current), &event);
            }
            self.hover = hover;
        }
        delivered
    }

    fn dispatch_one<S: Surface>(
        &mut self,
        input: PointerInput,
        renderer: &mut Renderer<S>,
        camera: &Camera,
        timestamp_ms: f64,
    ) -> usize {
        let mut delivered = 0;
        match input {
            PointerInput::Move { at } => {
                self.cursor = Some(at);
                let target = renderer.hit_test(at, camera).map(|hit| hit.object_id);
                if let Gesture::Armed { target: dragged } = self.gesture {
                    self.gesture = Gesture::Dragging { target: dragged };
                    let mut event = self.event(EventKind::DragStart, at, camera, Some(dragged), timestamp_ms);
                    event.button = self.pressed;
                    delivered += self.deliver(renderer, camera, Some(dragged), &event);
                }
                let event = self.event(EventKind::PointerMove, at, camera, target, timestamp_ms);
                delivered += self.deliver(renderer, camera, target, &event);
            }
            PointerInput::Down { at, button } => {
                self.cursor = Some(at);
                self.pressed = Some(button);
                let target = renderer.hit_test(at, camera).map(|hit| hit.object_id);
                if let (Button::Primary, Some(target)) = (button, target) {
                    self.gesture = Gesture::Armed { target };
                }
                let mut event = self.event(EventKind::PointerDown, at, camera, target, timestamp_ms);
                event.button = Some(button);
                delivered += self.deliver(renderer, camera, target, &event);
            }
            PointerInput::Up { at, button } => {
                self.cursor = Some(at);
                self.pressed = None;
                if let Gesture::Dragging { target: dragged } = std::mem::take(&mut self.gesture) {
                    let mut event = self.event(EventKind::DragEnd, at, camera, Some(dragged), timestamp_ms);
                    event.button = Some(button);
                    delivered += self.deliver(renderer, camera, Some(dragged), &event);
                }
                let target = renderer.hit_test(at, camera).map(|hit| hit.object_id);
                let mut event = self.event(EventKind::PointerUp, at, camera, target, timestamp_ms);
                event.button = Some(button);
                delivered += self.deliver(renderer, camera, target, &event);
            }
            PointerInput::Wheel { at, delta } => {
                self.cursor = Some(at);
                self.last_wheel = Some(delta);
                let target = renderer.hit_test(at, camera).map(|hit| hit.object_id);
                let mut event = self.event(EventKind::Wheel, at, camera, target, timestamp_ms);
                event.wheel = Some(delta);
                delivered += self.deliver(renderer, camera, target, &event);
            }
        }
        delivered
    }

    fn event(
        &self,
        kind: EventKind,
        at: Vec2,
        camera: &Camera,
        target: Option<ObjectId>,
        timestamp_ms: f64,
    ) -> StageEvent {
        let mut event = StageEvent::new(kind, at, camera.viewport_to_world(at), timestamp_ms);
        event.target = target;
        event.modifiers = self.modifiers;
        event
    }

    /// Run the object handler, then the scene handler. Returns how many ran.
    fn deliver<S: Surface>(
        &mut self,
        renderer: &mut Renderer<S>,
        camera: &Camera,
        object: Option<ObjectId>,
        event: &StageEvent,
    ) -> usize {
        let mut ran = usize::from(object.is_some_and(|id| renderer.dispatch(id, event)));
        if let Some(mut handler) = self.listeners.take(event.kind) {
            let (surface, commands) = renderer.handler_parts();
            let mut ctx = SceneContext { surface, commands, camera };
            if let Err(e) = handler(event, &mut ctx) {
                tracing::warn!(kind = %event.kind, error = %e, "scene handler failed");
            }
            self.listeners.restore(event.kind, handler);
            ran += 1;
        }
        ran
    }
}
