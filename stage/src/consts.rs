//! Shared numeric constants for the stage crate.

// ── Scheduling ──────────────────────────────────────────────────

/// Delta reported for a tick that must not be simulated or drawn.
pub const FRAME_SKIP: f64 = -1.0;

/// Number of recent deltas averaged into the looper's frame rate.
pub const DEFAULT_SAMPLE_WINDOW: usize = 60;

/// Deltas above this (ms) are reported as a skip, e.g. after a suspended tab.
pub const DEFAULT_MAX_DELTA_MS: f64 = 1000.0;

// ── Camera ──────────────────────────────────────────────────────

/// Smallest allowed camera zoom.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest allowed camera zoom.
pub const MAX_ZOOM: f64 = 10.0;

// ── Post-processing ─────────────────────────────────────────────

/// Offscreen snapshot scale used when none is configured.
pub const DEFAULT_OFFSCREEN_SCALE: f64 = 0.5;
