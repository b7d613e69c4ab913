//! Frame scheduler.
//!
//! The [`Looper`] turns host frame timestamps into [`TickState`]s and runs
//! its update listeners in registration order. It is single-threaded and
//! cooperative: the host calls [`Looper::advance`] once per animation frame,
//! or [`Looper::run`] pulls timestamps from a [`FrameClock`].
//!
//! The first tick after [`Looper::trigger`] has no previous timestamp and
//! reports [`FRAME_SKIP`] as its delta. So do non-increasing timestamps and
//! gaps longer than [`LooperConfig::max_delta_ms`]. Skip ticks still reach
//! listeners; they are expected to do nothing.

#[cfg(test)]
#[path = "looper_test.rs"]
mod looper_test;

use std::cell::Cell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_MAX_DELTA_MS, DEFAULT_SAMPLE_WINDOW, FRAME_SKIP};
use crate::error::{EngineError, ListenerResult};

/// Milliseconds on a monotonic-ish host clock.
#[must_use]
pub fn now_ms() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::sync::OnceLock;
        use std::time::Instant;
        static ORIGIN: OnceLock<Instant> = OnceLock::new();
        ORIGIN.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
    }
}

/// What one tick looks like to a listener.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickState {
    /// Milliseconds since the previous tick, or [`FRAME_SKIP`].
    pub delta_ms: f64,
    pub timestamp_ms: f64,
    /// Ticks since the looper was created, starting at 1.
    pub frame: u64,
}

impl TickState {
    #[must_use]
    pub fn is_skip(&self) -> bool {
        self.delta_ms < 0.0
    }

    /// Delta in seconds, `0.0` on a skip tick.
    #[must_use]
    pub fn delta_secs(&self) -> f64 {
        if self.is_skip() { 0.0 } else { self.delta_ms / 1000.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LooperEvent {
    Update,
}

/// Handle returned by [`Looper::add_event_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Cloneable stop switch, usable from inside listeners.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.set(true);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LooperConfig {
    /// Non-skip deltas averaged by [`Looper::frame_rate`].
    pub sample_window: usize,
    /// Longer gaps are reported as a skip.
    pub max_delta_ms: f64,
}

impl Default for LooperConfig {
    fn default() -> Self {
        Self { sample_window: DEFAULT_SAMPLE_WINDOW, max_delta_ms: DEFAULT_MAX_DELTA_MS }
    }
}

/// Source of frame timestamps for [`Looper::run`].
pub trait FrameClock {
    /// Block until the next frame is due and return its timestamp.
    ///
    /// # Errors
    ///
    /// Any error is fatal to the loop and surfaces as [`EngineError::Scheduler`].
    fn next_frame(&mut self) -> Result<f64, EngineError>;
}

/// Deterministic clock advancing by a fixed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedClock {
    now_ms: f64,
    step_ms: f64,
}

impl FixedClock {
    #[must_use]
    pub fn new(start_ms: f64, step_ms: f64) -> Self {
        Self { now_ms: start_ms, step_ms }
    }

    /// A clock ticking at `fps` from zero.
    #[must_use]
    pub fn at_fps(fps: f64) -> Self {
        Self::new(0.0, 1000.0 / fps)
    }
}

impl FrameClock for FixedClock {
    fn next_frame(&mut self) -> Result<f64, EngineError> {
        let now = self.now_ms;
        self.now_ms += self.step_ms;
        Ok(now)
    }
}

/// Wall-clock pacing to a target frame rate.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct SleepClock {
    frame_ms: f64,
    next_due_ms: Option<f64>,
}

#[cfg(not(target_arch = "wasm32"))]
impl SleepClock {
    /// # Errors
    ///
    /// [`EngineError::Configuration`] unless `fps` is positive and finite.
    pub fn new(fps: f64) -> Result<Self, EngineError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(EngineError::Configuration(format!("invalid target fps: {fps}")));
        }
        Ok(Self { frame_ms: 1000.0 / fps, next_due_ms: None })
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl FrameClock for SleepClock {
    fn next_frame(&mut self) -> Result<f64, EngineError> {
        let now = now_ms();
        let due = self.next_due_ms.unwrap_or(now);
        if due > now {
            std::thread::sleep(std::time::Duration::from_secs_f64((due - now) / 1000.0));
        }
        let stamp = now_ms();
        // Behind schedule: resync rather than bursting to catch up.
        let next = due + self.frame_ms;
        self.next_due_ms = Some(if next < stamp { stamp + self.frame_ms } else { next });
        Ok(stamp)
    }
}

type UpdateListener<C> = Box<dyn FnMut(&mut C, &TickState) -> ListenerResult>;

struct Registered<C> {
    id: ListenerId,
    event: LooperEvent,
    callback: UpdateListener<C>,
}

/// Tick scheduler over a listener context `C`.
pub struct Looper<C> {
    config: LooperConfig,
    listeners: Vec<Registered<C>>,
    next_id: u64,
    stop: StopHandle,
    running: bool,
    last_timestamp_ms: Option<f64>,
    samples: VecDeque<f64>,
    delta_time_ms: f64,
    frame: u64,
}

impl<C> fmt::Debug for Looper<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Looper")
            .field("config", &self.config)
            .field("listeners", &self.listeners.len())
            .field("running", &self.is_running())
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

impl<C> Default for Looper<C> {
    fn default() -> Self {
        Self::new(LooperConfig::default())
    }
}

impl<C> Looper<C> {
    #[must_use]
    pub fn new(config: LooperConfig) -> Self {
        Self {
            config,
            listeners: Vec::new(),
            next_id: 0,
            stop: StopHandle::default(),
            running: false,
            last_timestamp_ms: None,
            samples: VecDeque::with_capacity(config.sample_window),
            delta_time_ms: FRAME_SKIP,
            frame: 0,
        }
    }

    // --- Listeners ---

    pub fn add_event_listener(
        &mut self,
        event: LooperEvent,
        callback: impl FnMut(&mut C, &TickState) -> ListenerResult + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Registered { id, event, callback: Box::new(callback) });
        id
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // --- Lifecycle ---

    /// Start, or restart after a stop. The next tick reports a skip.
    pub fn trigger(&mut self) {
        self.stop.0.set(false);
        self.running = true;
        self.last_timestamp_ms = None;
        tracing::info!(listeners = self.listeners.len(), "looper started");
    }

    pub fn stop(&mut self) {
        self.stop.stop();
        if self.running {
            self.running = false;
            tracing::info!(frame = self.frame, "looper stopped");
        }
    }

    /// Shared switch that stops this looper.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running && !self.stop.is_stopped()
    }

    // --- Metrics ---

    /// Mean frame rate over the last `sample_window` non-skip deltas, `0.0` before any.
    #[must_use]
    pub fn frame_rate(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
        if mean > 0.0 { 1000.0 / mean } else { 0.0 }
    }

    /// Delta of the most recent tick, [`FRAME_SKIP`] if it was a skip.
    #[must_use]
    pub fn delta_time(&self) -> f64 {
        self.delta_time_ms
    }

    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[must_use]
    pub fn config(&self) -> LooperConfig {
        self.config
    }

    // --- Ticking ---

    /// Host frame callback. Returns the tick that ran, `None` while stopped.
    pub fn advance(&mut self, ctx: &mut C, timestamp_ms: f64) -> Option<TickState> {
        if !self.is_running() {
            self.running = false;
            return None;
        }
        let delta_ms = match self.last_timestamp_ms {
            Some(last) if timestamp_ms > last && timestamp_ms - last <= self.config.max_delta_ms => {
                timestamp_ms - last
            }
            _ => FRAME_SKIP,
        };
        self.last_timestamp_ms = Some(timestamp_ms);
        self.frame += 1;
        self.delta_time_ms = delta_ms;
        if delta_ms >= 0.0 {
            self.record_sample(delta_ms);
        }

        let tick = TickState { delta_ms, timestamp_ms, frame: self.frame };
        for listener in &mut self.listeners {
            if self.stop.is_stopped() {
                break;
            }
            if listener.event != LooperEvent::Update {
                continue;
            }
            if let Err(e) = (listener.callback)(ctx, &tick) {
                tracing::warn!(listener = listener.id.0, frame = tick.frame, error = %e, "update listener failed");
            }
        }
        if self.stop.is_stopped() && self.running {
            self.running = false;
            tracing::info!(frame = self.frame, "looper stopped");
        }
        Some(tick)
    }

    /// Start and keep ticking from `clock` until stopped or `max_ticks` ran.
    /// Returns the number of ticks run.
    ///
    /// # Errors
    ///
    /// [`EngineError::Scheduler`] if the clock fails to produce the next frame.
    pub fn run(&mut self, ctx: &mut C, clock: &mut dyn FrameClock, max_ticks: Option<u64>) -> Result<u64, EngineError> {
        self.trigger();
        let mut ticks = 0;
        while self.is_running() && max_ticks.is_none_or(|max| ticks < max) {
            let timestamp = clock.next_frame().map_err(|e| {
                self.running = false;
                match e {
                    EngineError::Scheduler(msg) => EngineError::Scheduler(msg),
                    other => EngineError::Scheduler(other.to_string()),
                }
            })?;
            if self.advance(ctx, timestamp).is_some() {
                ticks += 1;
            }
        }
        Ok(ticks)
    }

    fn record_sample(&mut self, delta_ms: f64) {
        if self.config.sample_window == 0 {
            return;
        }
        if self.samples.len() == self.config.sample_window {
            self.samples.pop_front();
        }
        self.samples.push_back(delta_ms);
    }
}
