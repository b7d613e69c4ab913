//! Input model: modifier keys, pointer buttons, keyboard and gamepad state.
//!
//! Pointer events are queued on the scene and dispatched at the end of the
//! tick. Keyboard and gamepad events go through [`InputState`], which the
//! stage owns explicitly; they are processed as soon as the host delivers
//! them.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, ListenerResult};

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the host (e.g. `"ArrowLeft"`, `" "`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key(pub String);

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    Down,
    Up,
}

/// A key transition delivered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub mode: KeyMode,
    pub modifiers: Modifiers,
    /// True for a down event while the key was already held.
    #[serde(default)]
    pub repeat: bool,
    pub timestamp_ms: f64,
}

impl KeyEvent {
    #[must_use]
    pub fn down(key: impl Into<Key>, timestamp_ms: f64) -> Self {
        Self { key: key.into(), mode: KeyMode::Down, modifiers: Modifiers::default(), repeat: false, timestamp_ms }
    }

    #[must_use]
    pub fn up(key: impl Into<Key>, timestamp_ms: f64) -> Self {
        Self { key: key.into(), mode: KeyMode::Up, modifiers: Modifiers::default(), repeat: false, timestamp_ms }
    }
}

/// A gamepad connecting or disconnecting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamepadEvent {
    pub index: u32,
    /// Device description string from the host.
    pub id: String,
    pub connected: bool,
    pub timestamp_ms: f64,
}

pub type KeyHandler = Box<dyn FnMut(&KeyEvent) -> ListenerResult>;
pub type GamepadHandler = Box<dyn FnMut(&GamepadEvent) -> ListenerResult>;

/// Keyboard and gamepad state with one handler per key and transition.
#[derive(Default)]
pub struct InputState {
    pressed: HashSet<Key>,
    key_down: HashMap<Key, KeyHandler>,
    key_up: HashMap<Key, KeyHandler>,
    gamepads: BTreeMap<u32, String>,
    on_connect: Option<GamepadHandler>,
    on_disconnect: Option<GamepadHandler>,
}

impl fmt::Debug for InputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputState")
            .field("pressed", &self.pressed)
            .field("key_down", &self.key_down.len())
            .field("key_up", &self.key_up.len())
            .field("gamepads", &self.gamepads)
            .finish_non_exhaustive()
    }
}

fn register(
    table: &mut HashMap<Key, KeyHandler>,
    key: Key,
    mode: KeyMode,
    handler: KeyHandler,
) -> Result<(), EngineError> {
    if table.contains_key(&key) {
        return Err(EngineError::Configuration(format!("key {mode:?} handler for {key:?} already registered")));
    }
    table.insert(key, handler);
    Ok(())
}

fn register_gamepad(slot: &mut Option<GamepadHandler>, handler: GamepadHandler, what: &str) -> Result<(), EngineError> {
    if slot.is_some() {
        return Err(EngineError::Configuration(format!("gamepad {what} handler already registered")));
    }
    *slot = Some(handler);
    Ok(())
}

impl InputState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Registration ---

    /// Register the handler for `key` going down.
    ///
    /// # Errors
    ///
    /// [`EngineError::Configuration`] if the key already has a down handler;
    /// the first one stays active.
    pub fn on_key_down(
        &mut self,
        key: impl Into<Key>,
        handler: impl FnMut(&KeyEvent) -> ListenerResult + 'static,
    ) -> Result<(), EngineError> {
        register(&mut self.key_down, key.into(), KeyMode::Down, Box::new(handler))
    }

    /// Register the handler for `key` going up.
    ///
    /// # Errors
    ///
    /// [`EngineError::Configuration`] if the key already has an up handler.
    pub fn on_key_up(
        &mut self,
        key: impl Into<Key>,
        handler: impl FnMut(&KeyEvent) -> ListenerResult + 'static,
    ) -> Result<(), EngineError> {
        register(&mut self.key_up, key.into(), KeyMode::Up, Box::new(handler))
    }

    pub fn remove_key_handler(&mut self, key: &Key, mode: KeyMode) -> bool {
        match mode {
            KeyMode::Down => self.key_down.remove(key).is_some(),
            KeyMode::Up => self.key_up.remove(key).is_some(),
        }
    }

    #[must_use]
    pub fn has_key_handler(&self, key: &Key, mode: KeyMode) -> bool {
        match mode {
            KeyMode::Down => self.key_down.contains_key(key),
            KeyMode::Up => self.key_up.contains_key(key),
        }
    }

    /// # Errors
    ///
    /// [`EngineError::Configuration`] if a connect handler is already registered.
    pub fn on_gamepad_connected(
        &mut self,
        handler: impl FnMut(&GamepadEvent) -> ListenerResult + 'static,
    ) -> Result<(), EngineError> {
        register_gamepad(&mut self.on_connect, Box::new(handler), "connect")
    }

    /// # Errors
    ///
    /// [`EngineError::Configuration`] if a disconnect handler is already registered.
    pub fn on_gamepad_disconnected(
        &mut self,
        handler: impl FnMut(&GamepadEvent) -> ListenerResult + 'static,
    ) -> Result<(), EngineError> {
        register_gamepad(&mut self.on_disconnect, Box::new(handler), "disconnect")
    }

    // --- Host events ---

    /// Update the pressed map and run the matching handler.
    ///
    /// Handler failures are logged. Returns whether a handler ran.
    pub fn handle_key(&mut self, mut event: KeyEvent) -> bool {
        let table = match event.mode {
            KeyMode::Down => {
                event.repeat = !self.pressed.insert(event.key.clone());
                &mut self.key_down
            }
            KeyMode::Up => {
                self.pressed.remove(&event.key);
                &mut self.key_up
            }
        };
        let Some(handler) = table.get_mut(&event.key) else {
            return false;
        };
        if let Err(e) = handler(&event) {
            tracing::warn!(key = %event.key, mode = ?event.mode, error = %e, "key handler failed");
        }
        true
    }

    /// Track a gamepad connecting or disconnecting and run the matching handler.
    pub fn handle_gamepad(&mut self, event: &GamepadEvent) -> bool {
        let slot = if event.connected {
            self.gamepads.insert(event.index, event.id.clone());
            &mut self.on_connect
        } else {
            self.gamepads.remove(&event.index);
            &mut self.on_disconnect
        };
        let Some(handler) = slot.as_mut() else {
            return false;
        };
        if let Err(e) = handler(event) {
            tracing::warn!(index = event.index, connected = event.connected, error = %e, "gamepad handler failed");
        }
        true
    }

    /// Forget every held key, e.g. when the host window loses focus.
    pub fn release_all(&mut self) {
        self.pressed.clear();
    }

    // --- Queries ---

    #[must_use]
    pub fn is_pressed(&self, key: &Key) -> bool {
        self.pressed.contains(key)
    }

    /// Currently held keys, sorted by name.
    #[must_use]
    pub fn pressed_keys(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.pressed.iter().cloned().collect();
        keys.sort();
        keys
    }

    /// Connected gamepads as `(index, id)`, by index.
    #[must_use]
    pub fn gamepads(&self) -> Vec<(u32, &str)> {
        self.gamepads.iter().map(|(i, id)| (*i, id.as_str())).collect()
    }
}
