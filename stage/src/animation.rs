//! Property animation: named easing curves, tweens, and per-object tween tables.
//!
//! A [`Tween`] is advanced by the tick's delta and sampled exactly once per
//! drawn tick. Each animatable property of a render object holds at most one
//! tween; starting another on the same property replaces it.

#[cfg(test)]
#[path = "animation_test.rs"]
mod animation_test;

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::EngineError;

/// Named easing function mapping progress in `[0, 1]` to eased progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    #[default]
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    EaseInExpo,
    EaseOutExpo,
    EaseInOutExpo,
    /// Overshoots past 1 before settling.
    EaseOutBack,
    EaseOutBounce,
}

impl Easing {
    pub const ALL: [Self; 15] = [
        Self::Linear,
        Self::EaseInQuad,
        Self::EaseOutQuad,
        Self::EaseInOutQuad,
        Self::EaseInCubic,
        Self::EaseOutCubic,
        Self::EaseInOutCubic,
        Self::EaseInSine,
        Self::EaseOutSine,
        Self::EaseInOutSine,
        Self::EaseInExpo,
        Self::EaseOutExpo,
        Self::EaseInOutExpo,
        Self::EaseOutBack,
        Self::EaseOutBounce,
    ];

    /// Kebab-case name, e.g. `"ease-out-expo"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseInQuad => "ease-in-quad",
            Self::EaseOutQuad => "ease-out-quad",
            Self::EaseInOutQuad => "ease-in-out-quad",
            Self::EaseInCubic => "ease-in-cubic",
            Self::EaseOutCubic => "ease-out-cubic",
            Self::EaseInOutCubic => "ease-in-out-cubic",
            Self::EaseInSine => "ease-in-sine",
            Self::EaseOutSine => "ease-out-sine",
            Self::EaseInOutSine => "ease-in-out-sine",
            Self::EaseInExpo => "ease-in-expo",
            Self::EaseOutExpo => "ease-out-expo",
            Self::EaseInOutExpo => "ease-in-out-expo",
            Self::EaseOutBack => "ease-out-back",
            Self::EaseOutBounce => "ease-out-bounce",
        }
    }

    /// Evaluate at progress `t`. Input is clamped to `[0, 1]`; both ends are exact.
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Self::Linear => t,
            Self::EaseInQuad => t * t,
            Self::EaseOutQuad => t * (2.0 - t),
            Self::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    (4.0 - 2.0 * t).mul_add(t, -1.0)
                }
            }
            Self::EaseInCubic => t * t * t,
            Self::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0f64).mul_add(t, 2.0).powi(3) / 2.0
                }
            }
            Self::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            Self::EaseOutSine => (t * PI / 2.0).sin(),
            Self::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Self::EaseInExpo => 2f64.powf(10.0f64.mul_add(t, -10.0)),
            Self::EaseOutExpo => 1.0 - 2f64.powf(-10.0 * t),
            Self::EaseInOutExpo => {
                if t < 0.5 {
                    2f64.powf(20.0f64.mul_add(t, -10.0)) / 2.0
                } else {
                    (2.0 - 2f64.powf((-20.0f64).mul_add(t, 10.0))) / 2.0
                }
            }
            Self::EaseOutBack => {
                const C1: f64 = 1.701_58;
                const C3: f64 = C1 + 1.0;
                let u = t - 1.0;
                C1.mul_add(u * u, C3.mul_add(u * u * u, 1.0))
            }
            Self::EaseOutBounce => bounce_out(t),
        }
    }
}

impl FromStr for Easing {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| EngineError::Configuration(format!("unknown easing: {s}")))
    }
}

fn bounce_out(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let u = t - 1.5 / D1;
        N1.mul_add(u * u, 0.75)
    } else if t < 2.5 / D1 {
        let u = t - 2.25 / D1;
        N1.mul_add(u * u, 0.9375)
    } else {
        let u = t - 2.625 / D1;
        N1.mul_add(u * u, 0.984_375)
    }
}

/// Interpolation of one scalar from `start` to `end` over `duration_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    pub start: f64,
    pub end: f64,
    pub easing: Easing,
    pub duration_ms: f64,
    elapsed_ms: f64,
}

impl Tween {
    #[must_use]
    pub fn new(start: f64, end: f64, duration_ms: f64, easing: Easing) -> Self {
        Self { start, end, easing, duration_ms: duration_ms.max(0.0), elapsed_ms: 0.0 }
    }

    /// Add elapsed time. Negative deltas are ignored.
    pub fn advance(&mut self, delta_ms: f64) {
        if delta_ms > 0.0 {
            self.elapsed_ms += delta_ms;
        }
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// `min(1, elapsed / duration)`. A zero-length tween is immediately complete.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        (self.elapsed_ms / self.duration_ms).min(1.0)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Current eased value. Exactly `end` once complete.
    #[must_use]
    pub fn value(&self) -> f64 {
        let p = self.progress();
        if p >= 1.0 {
            return self.end;
        }
        (self.end - self.start).mul_add(self.easing.apply(p), self.start)
    }
}

/// A property of a render object that can be animated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimatedProperty {
    /// Circle radius.
    Radius,
    /// Rectangle / image width.
    Width,
    /// Rectangle / image height.
    Height,
    Opacity,
    ScaleX,
    ScaleY,
    /// Rotation in radians, counter-clockwise.
    Rotation,
    FillRed,
    FillGreen,
    FillBlue,
    FillAlpha,
    ShadowBlur,
}

/// Active tweens of one object, keyed by property.
///
/// Ordered by property so sampling is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Animations {
    active: BTreeMap<AnimatedProperty, Tween>,
}

impl Animations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a tween, replacing any active one on the same property.
    pub fn start(&mut self, property: AnimatedProperty, tween: Tween) {
        if self.active.insert(property, tween).is_some() {
            tracing::trace!(?property, "replaced active tween");
        }
    }

    /// Start four channel tweens moving the fill from `from` to `to`.
    pub fn animate_color(&mut self, from: Color, to: Color, duration_ms: f64, easing: Easing) {
        let channels = [
            (AnimatedProperty::FillRed, from.r, to.r),
            (AnimatedProperty::FillGreen, from.g, to.g),
            (AnimatedProperty::FillBlue, from.b, to.b),
            (AnimatedProperty::FillAlpha, from.a, to.a),
        ];
        for (property, a, b) in channels {
            self.start(property, Tween::new(f64::from(a), f64::from(b), duration_ms, easing));
        }
    }

    pub fn cancel(&mut self, property: AnimatedProperty) -> Option<Tween> {
        self.active.remove(&property)
    }

    #[must_use]
    pub fn get(&self, property: AnimatedProperty) -> Option<&Tween> {
        self.active.get(&property)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Advance every tween by `delta_ms` and return this tick's values.
    ///
    /// Tweens that reached completion are removed after their final value is
    /// returned.
    pub fn sample(&mut self, delta_ms: f64) -> Vec<(AnimatedProperty, f64)> {
        let mut values = Vec::with_capacity(self.active.len());
        for (property, tween) in &mut self.active {
            tween.advance(delta_ms);
            values.push((*property, tween.value()));
        }
        self.active.retain(|_, t| !t.is_complete());
        values
    }
}
