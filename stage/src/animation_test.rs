#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

// =============================================================
// Easing
// =============================================================

#[test]
fn every_easing_hits_both_endpoints_exactly() {
    for e in Easing::ALL {
        assert_eq!(e.apply(0.0), 0.0, "{e:?} at 0");
        assert_eq!(e.apply(1.0), 1.0, "{e:?} at 1");
    }
}

#[test]
fn easing_clamps_out_of_range_progress() {
    assert_eq!(Easing::EaseOutExpo.apply(-3.0), 0.0);
    assert_eq!(Easing::EaseOutExpo.apply(7.0), 1.0);
}

#[test]
fn linear_is_identity() {
    assert!(approx_eq(Easing::Linear.apply(0.25), 0.25));
}

#[test]
fn ease_out_runs_ahead_of_linear() {
    for e in [Easing::EaseOutQuad, Easing::EaseOutCubic, Easing::EaseOutSine, Easing::EaseOutExpo] {
        assert!(e.apply(0.3) > 0.3, "{e:?}");
    }
}

#[test]
fn ease_in_lags_linear() {
    for e in [Easing::EaseInQuad, Easing::EaseInCubic, Easing::EaseInSine, Easing::EaseInExpo] {
        assert!(e.apply(0.3) < 0.3, "{e:?}");
    }
}

#[test]
fn in_out_curves_are_symmetric_at_midpoint() {
    for e in [Easing::EaseInOutQuad, Easing::EaseInOutCubic, Easing::EaseInOutSine, Easing::EaseInOutExpo] {
        assert!(approx_eq(e.apply(0.5), 0.5), "{e:?}");
    }
}

#[test]
fn ease_out_back_overshoots() {
    let peak = (1..100u8).map(|i| Easing::EaseOutBack.apply(f64::from(i) / 100.0)).fold(0.0, f64::max);
    assert!(peak > 1.0);
}

#[test]
fn easing_parses_kebab_case_names() {
    assert_eq!("ease-out-expo".parse::<Easing>().expect("parse"), Easing::EaseOutExpo);
    assert_eq!("linear".parse::<Easing>().expect("parse"), Easing::Linear);
    for e in Easing::ALL {
        assert_eq!(e.name().parse::<Easing>().expect("round trip"), e);
    }
}

#[test]
fn easing_rejects_unknown_name() {
    assert!(matches!("wobble".parse::<Easing>(), Err(EngineError::Configuration(_))));
}

#[test]
fn easing_serde_uses_kebab_case() {
    let json = serde_json::to_string(&Easing::EaseInOutSine).expect("serialize");
    assert_eq!(json, "\"ease-in-out-sine\"");
}

// =============================================================
// Tween
// =============================================================

#[test]
fn radius_tween_halfway_and_complete() {
    let mut t = Tween::new(0.0, 40.0, 1000.0, Easing::Linear);
    t.advance(500.0);
    assert!(approx_eq(t.progress(), 0.5));
    assert!(approx_eq(t.value(), 20.0));
    assert!(!t.is_complete());

    t.advance(500.0);
    assert_eq!(t.value(), 40.0);
    assert!(t.is_complete());
}

#[test]
fn tween_progress_saturates() {
    let mut t = Tween::new(10.0, 0.0, 100.0, Easing::EaseOutExpo);
    t.advance(5000.0);
    assert_eq!(t.progress(), 1.0);
    assert_eq!(t.value(), 0.0);
}

#[test]
fn tween_ignores_negative_delta() {
    let mut t = Tween::new(0.0, 1.0, 100.0, Easing::Linear);
    t.advance(-1.0);
    assert_eq!(t.elapsed_ms(), 0.0);
}

#[test]
fn zero_duration_tween_is_complete() {
    let t = Tween::new(3.0, 9.0, 0.0, Easing::Linear);
    assert!(t.is_complete());
    assert_eq!(t.value(), 9.0);
}

// =============================================================
// Animations
// =============================================================

#[test]
fn starting_same_property_replaces_previous() {
    let mut a = Animations::new();
    a.start(AnimatedProperty::Radius, Tween::new(0.0, 10.0, 100.0, Easing::Linear));
    a.start(AnimatedProperty::Radius, Tween::new(5.0, 50.0, 100.0, Easing::Linear));
    assert_eq!(a.len(), 1);
    assert_eq!(a.get(AnimatedProperty::Radius).map(|t| t.end), Some(50.0));
}

#[test]
fn sample_returns_values_and_drops_completed() {
    let mut a = Animations::new();
    a.start(AnimatedProperty::Radius, Tween::new(0.0, 40.0, 1000.0, Easing::Linear));
    a.start(AnimatedProperty::Opacity, Tween::new(1.0, 0.0, 100.0, Easing::Linear));

    let values = a.sample(100.0);
    assert_eq!(values.len(), 2);
    assert!(values.contains(&(AnimatedProperty::Opacity, 0.0)));
    assert!(a.get(AnimatedProperty::Opacity).is_none());
    assert!(a.get(AnimatedProperty::Radius).is_some());
}

#[test]
fn animate_color_starts_four_channels() {
    let mut a = Animations::new();
    a.animate_color(Color::rgb(0, 0, 0), Color::rgb(200, 100, 50), 200.0, Easing::Linear);
    assert_eq!(a.len(), 4);
    let values = a.sample(100.0);
    assert!(values.contains(&(AnimatedProperty::FillRed, 100.0)));
    assert!(values.contains(&(AnimatedProperty::FillGreen, 50.0)));
    assert!(values.contains(&(AnimatedProperty::FillBlue, 25.0)));
    assert!(values.contains(&(AnimatedProperty::FillAlpha, 255.0)));
}

#[test]
fn cancel_removes_tween() {
    let mut a = Animations::new();
    a.start(AnimatedProperty::Width, Tween::new(0.0, 1.0, 10.0, Easing::Linear));
    assert!(a.cancel(AnimatedProperty::Width).is_some());
    assert!(a.is_empty());
}
