//! Typed event tables for render objects and the scene.
//!
//! Each [`EventKind`] has at most one handler. Handlers are taken out of the
//! table while they run so they can receive `&mut` access to their owner;
//! removal during the call is honored when the handler is put back.

#[cfg(test)]
#[path = "event_test.rs"]
mod event_test;

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::input::{Button, Modifiers, WheelDelta};
use crate::math::Vec2;
use crate::object::ObjectId;

/// Closed set of events an object or the scene can listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Fired on an object right after it is painted.
    Render,
    PointerMove,
    PointerEnter,
    PointerLeave,
    PointerDown,
    PointerUp,
    Wheel,
    DragStart,
    DragEnd,
}

impl EventKind {
    /// Kinds the scene accepts listeners for.
    pub const SCENE: [Self; 6] =
        [Self::PointerMove, Self::PointerDown, Self::PointerUp, Self::Wheel, Self::DragStart, Self::DragEnd];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Render => "render",
            Self::PointerMove => "pointer_move",
            Self::PointerEnter => "pointer_enter",
            Self::PointerLeave => "pointer_leave",
            Self::PointerDown => "pointer_down",
            Self::PointerUp => "pointer_up",
            Self::Wheel => "wheel",
            Self::DragStart => "drag_start",
            Self::DragEnd => "drag_end",
        };
        f.write_str(name)
    }
}

/// Payload delivered to object and scene handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct StageEvent {
    pub kind: EventKind,
    /// Pointer position in viewport pixels (y-down). For `Render`, the
    /// object's center mapped through the camera.
    pub viewport: Vec2,
    /// The same point in world units (y-up).
    pub world: Vec2,
    /// Topmost object under the pointer, if any.
    pub target: Option<ObjectId>,
    pub button: Option<Button>,
    pub wheel: Option<WheelDelta>,
    pub modifiers: Modifiers,
    pub timestamp_ms: f64,
}

impl StageEvent {
    #[must_use]
    pub fn new(kind: EventKind, viewport: Vec2, world: Vec2, timestamp_ms: f64) -> Self {
        Self {
            kind,
            viewport,
            world,
            target: None,
            button: None,
            wheel: None,
            modifiers: Modifiers::default(),
            timestamp_ms,
        }
    }
}

/// Deferred structural change requested from inside a handler.
///
/// Applied after the phase that was iterating the object list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Destroy(ObjectId),
}

/// One handler slot per [`EventKind`].
pub struct EventTable<H> {
    handlers: HashMap<EventKind, H>,
    in_flight: HashSet<EventKind>,
}

impl<H> Default for EventTable<H> {
    fn default() -> Self {
        Self { handlers: HashMap::new(), in_flight: HashSet::new() }
    }
}

impl<H> fmt::Debug for EventTable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().chain(self.in_flight.iter()).map(ToString::to_string).collect();
        kinds.sort();
        f.debug_struct("EventTable").field("kinds", &kinds).finish()
    }
}

impl<H> EventTable<H> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Configuration`] if `kind` already has a handler. The
    /// existing handler stays active.
    pub fn add(&mut self, kind: EventKind, handler: H) -> Result<(), EngineError> {
        if self.contains(kind) {
            return Err(EngineError::Configuration(format!("{kind} handler already registered")));
        }
        self.handlers.insert(kind, handler);
        Ok(())
    }

    /// Unregister the handler for `kind`. Returns whether one was registered.
    pub fn remove(&mut self, kind: EventKind) -> bool {
        self.handlers.remove(&kind).is_some() || self.in_flight.remove(&kind)
    }

    #[must_use]
    pub fn contains(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind) || self.in_flight.contains(&kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len() + self.in_flight.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
        self.in_flight.clear();
    }

    /// Take the handler out for a call. Pair with [`Self::restore`].
    pub fn take(&mut self, kind: EventKind) -> Option<H> {
        let handler = self.handlers.remove(&kind)?;
        self.in_flight.insert(kind);
        Some(handler)
    }

    /// Put a taken handler back unless it was removed during the call.
    pub fn restore(&mut self, kind: EventKind, handler: H) {
        if self.in_flight.remove(&kind) {
            self.handlers.insert(kind, handler);
        }
    }
}
