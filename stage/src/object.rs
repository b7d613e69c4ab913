//! Drawable objects: shapes, styles, transforms, and per-object event handlers.
//!
//! A [`RenderObject`] is standalone until [`crate::render::Renderer::add`]
//! assigns its id and `array_index`. Its `position` is the world-space center
//! of the shape; the local-to-world mapping is
//! `scale → rotation → transform → translate(position)`.

#[cfg(test)]
#[path = "object_test.rs"]
mod object_test;

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::animation::{AnimatedProperty, Animations, Easing, Tween};
use crate::color::{Color, PixelSample};
use crate::error::{EngineError, ListenerResult};
use crate::event::{Command, EventKind, EventTable, StageEvent};
use crate::math::{Aabb, Transform, Vec2};
use crate::resource::ResourceRequest;
use crate::surface::{Paint, Shadow, Surface};

/// Object identifier, assigned on [`crate::render::Renderer::add`].
pub type ObjectId = Uuid;

/// Fill, shadow, and opacity of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub fill: Color,
    pub shadow: Option<Shadow>,
    /// `0.0..=1.0`.
    pub opacity: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self { fill: Color::BLACK, shadow: None, opacity: 1.0 }
    }
}

impl Style {
    #[must_use]
    pub fn filled(fill: Color) -> Self {
        Self { fill, ..Self::default() }
    }

    #[must_use]
    pub fn paint(&self) -> Paint {
        Paint { color: self.fill, opacity: self.opacity.clamp(0.0, 1.0), shadow: self.shadow }
    }
}

/// A rect or circle primitive inside a composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Rect { width: f64, height: f64 },
    Circle { radius: f64 },
}

impl Primitive {
    fn local_bounds(self) -> Aabb {
        match self {
            Self::Rect { width, height } => Aabb::centered(Vec2::ZERO, width, height),
            Self::Circle { radius } => Aabb::centered(Vec2::ZERO, radius * 2.0, radius * 2.0),
        }
    }

    fn contains(self, p: Vec2) -> bool {
        match self {
            Self::Rect { width, height } => p.x.abs() <= width * 0.5 && p.y.abs() <= height * 0.5,
            Self::Circle { radius } => p.length() <= radius,
        }
    }

    fn draw(self, surface: &mut dyn Surface, device: &Transform, paint: &Paint) -> Result<(), EngineError> {
        match self {
            Self::Rect { width, height } => surface.fill_rect(device, width, height, paint),
            Self::Circle { radius } => surface.fill_ellipse(device, radius, radius, paint),
        }
    }
}

/// One piece of a composite shape, offset from the object's center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub offset: Vec2,
    pub primitive: Primitive,
    pub style: Style,
}

/// Closed set of drawable shapes.
#[derive(Debug, Clone)]
pub enum Shape {
    Rect { width: f64, height: f64 },
    Circle { radius: f64 },
    /// Drawn and hittable only once the request is ready.
    Image { request: ResourceRequest, width: f64, height: f64 },
    Composite { parts: Vec<Part> },
}

impl Shape {
    /// Bounding box in local coordinates.
    #[must_use]
    pub fn local_bounds(&self) -> Aabb {
        match self {
            Self::Rect { width, height } | Self::Image { width, height, .. } => {
                Aabb::centered(Vec2::ZERO, *width, *height)
            }
            Self::Circle { radius } => Aabb::centered(Vec2::ZERO, radius * 2.0, radius * 2.0),
            Self::Composite { parts } => parts
                .iter()
                .map(|p| p.primitive.local_bounds().translate(p.offset))
                .reduce(|a, b| a.union(&b))
                .unwrap_or_else(|| Aabb::centered(Vec2::ZERO, 0.0, 0.0)),
        }
    }

    /// Point test in local coordinates. Edges count as inside.
    #[must_use]
    pub fn contains_local(&self, p: Vec2) -> bool {
        match self {
            Self::Rect { width, height } | Self::Image { width, height, .. } => {
                Primitive::Rect { width: *width, height: *height }.contains(p)
            }
            Self::Circle { radius } => Primitive::Circle { radius: *radius }.contains(p),
            Self::Composite { parts } => parts.iter().any(|part| part.primitive.contains(p - part.offset)),
        }
    }

    /// Unscaled area. Composites use their bounding box.
    #[must_use]
    pub fn area(&self) -> f64 {
        match self {
            Self::Circle { radius } => PI * radius * radius,
            _ => {
                let b = self.local_bounds();
                b.width() * b.height()
            }
        }
    }

    /// False while an image is pending or after it failed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        match self {
            Self::Image { request, .. } => request.image().is_some(),
            _ => true,
        }
    }
}

/// Handler for one [`EventKind`] on a render object.
pub type ObjectHandler = Box<dyn FnMut(&StageEvent, &mut EventContext<'_>) -> ListenerResult>;

/// What an object handler can touch while it runs.
pub struct EventContext<'a> {
    /// The object the event was delivered to.
    pub object: &'a mut RenderObject,
    surface: &'a dyn Surface,
    commands: &'a mut Vec<Command>,
}

impl<'a> EventContext<'a> {
    pub(crate) fn new(object: &'a mut RenderObject, surface: &'a dyn Surface, commands: &'a mut Vec<Command>) -> Self {
        Self { object, surface, commands }
    }

    /// Sample surface pixels as they stand right now.
    ///
    /// # Errors
    ///
    /// Surface backend failure.
    pub fn get_image_data(&self, x: i32, y: i32, width: u32, height: u32) -> Result<PixelSample, EngineError> {
        let data = self.surface.get_image_data(x, y, width, height)?;
        Ok(PixelSample::from_rgba(&data, width, height))
    }

    /// Destroy `id` once the current phase finishes.
    pub fn destroy(&mut self, id: ObjectId) {
        self.commands.push(Command::Destroy(id));
    }

    /// Destroy the object this event was delivered to.
    pub fn destroy_self(&mut self) {
        if let Some(id) = self.object.id() {
            self.destroy(id);
        }
    }
}

/// A drawable object in the scene.
pub struct RenderObject {
    id: Option<ObjectId>,
    array_index: Option<usize>,
    /// World-space center.
    pub position: Vec2,
    pub shape: Shape,
    pub style: Style,
    /// Extra affine applied after scale and rotation, before translation.
    pub transform: Transform,
    /// Radians, counter-clockwise.
    pub rotation: f64,
    pub scale: Vec2,
    /// Hidden objects are neither drawn nor hit-tested.
    pub visible: bool,
    pub animations: Animations,
    listeners: EventTable<ObjectHandler>,
}

impl fmt::Debug for RenderObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderObject")
            .field("id", &self.id)
            .field("array_index", &self.array_index)
            .field("position", &self.position)
            .field("shape", &self.shape)
            .field("style", &self.style)
            .field("visible", &self.visible)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

impl RenderObject {
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        Self {
            id: None,
            array_index: None,
            position: Vec2::ZERO,
            shape,
            style: Style::default(),
            transform: Transform::IDENTITY,
            rotation: 0.0,
            scale: Vec2::new(1.0, 1.0),
            visible: true,
            animations: Animations::new(),
            listeners: EventTable::new(),
        }
    }

    #[must_use]
    pub fn rect(width: f64, height: f64) -> Self {
        Self::new(Shape::Rect { width, height })
    }

    #[must_use]
    pub fn circle(radius: f64) -> Self {
        Self::new(Shape::Circle { radius })
    }

    #[must_use]
    pub fn image(request: ResourceRequest, width: f64, height: f64) -> Self {
        Self::new(Shape::Image { request, width, height })
    }

    #[must_use]
    pub fn composite(parts: Vec<Part>) -> Self {
        Self::new(Shape::Composite { parts })
    }

    // --- Builders ---

    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    #[must_use]
    pub fn fill(mut self, color: Color) -> Self {
        self.style.fill = color;
        self
    }

    #[must_use]
    pub fn shadow(mut self, shadow: Shadow) -> Self {
        self.style.shadow = Some(shadow);
        self
    }

    #[must_use]
    pub fn opacity(mut self, opacity: f64) -> Self {
        self.style.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn rotated(mut self, radians: f64) -> Self {
        self.rotation = radians;
        self
    }

    #[must_use]
    pub fn scaled(mut self, sx: f64, sy: f64) -> Self {
        self.scale = Vec2::new(sx, sy);
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    // --- Identity ---

    /// `None` until the object is added to a renderer.
    #[must_use]
    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    /// Position in the renderer's paint order. `None` while standalone.
    #[must_use]
    pub fn array_index(&self) -> Option<usize> {
        self.array_index
    }

    pub(crate) fn attach(&mut self, id: ObjectId, index: usize) {
        self.id = Some(id);
        self.array_index = Some(index);
    }

    pub(crate) fn set_array_index(&mut self, index: usize) {
        self.array_index = Some(index);
    }

    /// Back to standalone: drops id, index, and every handler.
    pub(crate) fn detach(&mut self) {
        self.id = None;
        self.array_index = None;
        self.listeners.clear();
    }

    // --- Geometry ---

    pub fn set_position(&mut self, x: f64, y: f64) -> &mut Self {
        self.position = Vec2::new(x, y);
        self
    }

    pub fn translate(&mut self, dx: f64, dy: f64) -> &mut Self {
        self.position += Vec2::new(dx, dy);
        self
    }

    /// Local coordinates to world coordinates.
    #[must_use]
    pub fn local_to_world(&self) -> Transform {
        Transform::scaling(self.scale.x, self.scale.y)
            .then(&Transform::rotation(self.rotation))
            .then(&self.transform)
            .then(&Transform::translation(self.position.x, self.position.y))
    }

    /// World-space bounding box of the transformed shape.
    #[must_use]
    pub fn world_bounds(&self) -> Aabb {
        self.local_to_world().map_aabb(self.shape.local_bounds())
    }

    /// Whether `world` falls on the shape. Singular transforms hit nothing.
    #[must_use]
    pub fn contains_world(&self, world: Vec2) -> bool {
        self.local_to_world().invert().is_some_and(|inv| self.shape.contains_local(inv.apply(world)))
    }

    /// Visible and, for images, loaded.
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.visible && self.shape.is_ready()
    }

    /// Area scaled by the object's scale factors.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.shape.area() * (self.scale.x * self.scale.y).abs()
    }

    /// Paint through `view` (world → device).
    ///
    /// # Errors
    ///
    /// Surface backend failure.
    pub fn draw(&self, surface: &mut dyn Surface, view: &Transform) -> Result<(), EngineError> {
        let device = self.local_to_world().then(view);
        let paint = self.style.paint();
        match &self.shape {
            Shape::Rect { width, height } => surface.fill_rect(&device, *width, *height, &paint),
            Shape::Circle { radius } => surface.fill_ellipse(&device, *radius, *radius, &paint),
            Shape::Image { request, width, height } => match request.image() {
                // Image rows run top-down; local space is y-up.
                Some(image) => {
                    let flipped = Transform::scaling(1.0, -1.0).then(&device);
                    surface.draw_image(&flipped, &image, *width, *height, paint.opacity)
                }
                None => Ok(()),
            },
            Shape::Composite { parts } => {
                for part in parts {
                    let at = Transform::translation(part.offset.x, part.offset.y).then(&device);
                    let mut part_paint = part.style.paint();
                    part_paint.opacity *= paint.opacity;
                    part.primitive.draw(surface, &at, &part_paint)?;
                }
                Ok(())
            }
        }
    }

    // --- Animation ---

    /// Tween `property` from its current value to `to`.
    pub fn animate(&mut self, property: AnimatedProperty, to: f64, duration_ms: f64, easing: Easing) -> &mut Self {
        let from = self.property(property).unwrap_or(to);
        self.animations.start(property, Tween::new(from, to, duration_ms, easing));
        self
    }

    /// Tween the fill color to `to`.
    pub fn animate_fill(&mut self, to: Color, duration_ms: f64, easing: Easing) -> &mut Self {
        self.animations.animate_color(self.style.fill, to, duration_ms, easing);
        self
    }

    /// Current value of an animatable property, `None` if the shape lacks it.
    #[must_use]
    pub fn property(&self, property: AnimatedProperty) -> Option<f64> {
        match (property, &self.shape) {
            (AnimatedProperty::Radius, Shape::Circle { radius }) => Some(*radius),
            (AnimatedProperty::Width, Shape::Rect { width, .. } | Shape::Image { width, .. }) => Some(*width),
            (AnimatedProperty::Height, Shape::Rect { height, .. } | Shape::Image { height, .. }) => Some(*height),
            (AnimatedProperty::Radius | AnimatedProperty::Width | AnimatedProperty::Height, _) => None,
            (AnimatedProperty::Opacity, _) => Some(self.style.opacity),
            (AnimatedProperty::ScaleX, _) => Some(self.scale.x),
            (AnimatedProperty::ScaleY, _) => Some(self.scale.y),
            (AnimatedProperty::Rotation, _) => Some(self.rotation),
            (AnimatedProperty::FillRed, _) => Some(f64::from(self.style.fill.r)),
            (AnimatedProperty::FillGreen, _) => Some(f64::from(self.style.fill.g)),
            (AnimatedProperty::FillBlue, _) => Some(f64::from(self.style.fill.b)),
            (AnimatedProperty::FillAlpha, _) => Some(f64::from(self.style.fill.a)),
            (AnimatedProperty::ShadowBlur, _) => self.style.shadow.map(|s| s.blur),
        }
    }

    /// Write one sampled value. Properties the shape lacks are ignored.
    pub fn set_property(&mut self, property: AnimatedProperty, value: f64) {
        match (property, &mut self.shape) {
            (AnimatedProperty::Radius, Shape::Circle { radius }) => *radius = value.max(0.0),
            (AnimatedProperty::Width, Shape::Rect { width, .. } | Shape::Image { width, .. }) => {
                *width = value.max(0.0);
            }
            (AnimatedProperty::Height, Shape::Rect { height, .. } | Shape::Image { height, .. }) => {
                *height = value.max(0.0);
            }
            (AnimatedProperty::Radius | AnimatedProperty::Width | AnimatedProperty::Height, _) => {}
            (AnimatedProperty::Opacity, _) => self.style.opacity = value.clamp(0.0, 1.0),
            (AnimatedProperty::ScaleX, _) => self.scale.x = value,
            (AnimatedProperty::ScaleY, _) => self.scale.y = value,
            (AnimatedProperty::Rotation, _) => self.rotation = value,
            (AnimatedProperty::FillRed, _) => self.style.fill.r = channel(value),
            (AnimatedProperty::FillGreen, _) => self.style.fill.g = channel(value),
            (AnimatedProperty::FillBlue, _) => self.style.fill.b = channel(value),
            (AnimatedProperty::FillAlpha, _) => self.style.fill.a = channel(value),
            (AnimatedProperty::ShadowBlur, _) => {
                if let Some(shadow) = self.style.shadow.as_mut() {
                    shadow.blur = value.max(0.0);
                }
            }
        }
    }

    /// Advance every tween by `delta_ms` and apply the sampled values.
    pub(crate) fn sample_animations(&mut self, delta_ms: f64) {
        if self.animations.is_empty() {
            return;
        }
        for (property, value) in self.animations.sample(delta_ms) {
            self.set_property(property, value);
        }
    }

    // --- Events ---

    /// Register the handler for `kind`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Configuration`] if `kind` already has a handler.
    pub fn add_event_listener(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&StageEvent, &mut EventContext<'_>) -> ListenerResult + 'static,
    ) -> Result<&mut Self, EngineError> {
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

    /// Run this object's handler for `event.kind`.
    ///
    /// Handler failures are logged. Returns whether a handler ran.
    pub(crate) fn dispatch(&mut self, event: &StageEvent, surface: &dyn Surface, commands: &mut Vec<Command>) -> bool {
        let Some(mut handler) = self.listeners.take(event.kind) else {
            return false;
        };
        let id = self.id;
        let result = handler(event, &mut EventContext::new(self, surface, commands));
        if let Err(e) = result {
            tracing::warn!(object = ?id, kind = %event.kind, error = %e, "object handler failed");
        }
        self.listeners.restore(event.kind, handler);
        true
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
