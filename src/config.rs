//! Runner configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::str::FromStr;

use serde::Serialize;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;
pub const DEFAULT_TICKS: u64 = 300;
pub const DEFAULT_FPS: f64 = 60.0;
pub const DEFAULT_GRAVITY_Y: f64 = -50.0;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_RECTANGLES: usize = 42;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunConfig {
    pub width: u32,
    pub height: u32,
    /// Ticks to run, including the initial skip tick.
    pub ticks: u64,
    pub fps: f64,
    /// Pace ticks against the wall clock instead of a fixed step.
    pub realtime: bool,
    pub gravity_y: f64,
    pub seed: u64,
    pub rectangles: usize,
    /// Offscreen copy-back scale; `None` disables post-processing.
    pub post_scale: Option<f64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            ticks: DEFAULT_TICKS,
            fps: DEFAULT_FPS,
            realtime: false,
            gravity_y: DEFAULT_GRAVITY_Y,
            seed: DEFAULT_SEED,
            rectangles: DEFAULT_RECTANGLES,
            post_scale: None,
        }
    }
}

impl RunConfig {
    /// Build config from `KINETIC_*` environment variables.
    ///
    /// All optional; unparsable values fall back to the default:
    /// - `KINETIC_WIDTH`, `KINETIC_HEIGHT`: surface size, default 800×600
    /// - `KINETIC_TICKS`: default 300
    /// - `KINETIC_FPS`: default 60
    /// - `KINETIC_REALTIME`: `1`/`true` to sleep between ticks
    /// - `KINETIC_GRAVITY_Y`: default -50
    /// - `KINETIC_SEED`: default 42
    /// - `KINETIC_RECTANGLES`: default 42
    /// - `KINETIC_POST_SCALE`: enables post-processing at this scale
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let width = lookup_parse(&lookup, "KINETIC_WIDTH", defaults.width).max(1);
        let height = lookup_parse(&lookup, "KINETIC_HEIGHT", defaults.height).max(1);
        let fps = lookup_parse(&lookup, "KINETIC_FPS", defaults.fps);
        let post_scale: f64 = lookup_parse(&lookup, "KINETIC_POST_SCALE", 0.0);
        Self {
            width,
            height,
            ticks: lookup_parse(&lookup, "KINETIC_TICKS", defaults.ticks),
            fps: if fps.is_finite() && fps > 0.0 { fps } else { defaults.fps },
            realtime: lookup("KINETIC_REALTIME").is_some_and(|v| parse_flag(&v)),
            gravity_y: lookup_parse(&lookup, "KINETIC_GRAVITY_Y", defaults.gravity_y),
            seed: lookup_parse(&lookup, "KINETIC_SEED", defaults.seed),
            rectangles: lookup_parse(&lookup, "KINETIC_RECTANGLES", defaults.rectangles),
            post_scale: (post_scale.is_finite() && post_scale > 0.0).then_some(post_scale),
        }
    }
}

fn lookup_parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    lookup(key).and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
