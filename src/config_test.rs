#![allow(clippy::float_cmp)]

use std::collections::HashMap;

use super::*;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn empty_environment_gives_defaults() {
    assert_eq!(RunConfig::from_lookup(lookup(&[])), RunConfig::default());
}

#[test]
fn values_are_parsed() {
    let cfg = RunConfig::from_lookup(lookup(&[
        ("KINETIC_WIDTH", "320"),
        ("KINETIC_HEIGHT", " 240 "),
        ("KINETIC_TICKS", "10"),
        ("KINETIC_FPS", "30"),
        ("KINETIC_REALTIME", "TRUE"),
        ("KINETIC_GRAVITY_Y", "-9.8"),
        ("KINETIC_SEED", "7"),
        ("KINETIC_RECTANGLES", "5"),
        ("KINETIC_POST_SCALE", "0.25"),
    ]));
    assert_eq!(
        cfg,
        RunConfig {
            width: 320,
            height: 240,
            ticks: 10,
            fps: 30.0,
            realtime: true,
            gravity_y: -9.8,
            seed: 7,
            rectangles: 5,
            post_scale: Some(0.25),
        }
    );
}

#[test]
fn invalid_values_fall_back() {
    let cfg = RunConfig::from_lookup(lookup(&[
        ("KINETIC_WIDTH", "wide"),
        ("KINETIC_TICKS", "-3"),
        ("KINETIC_FPS", "0"),
        ("KINETIC_REALTIME", "maybe"),
        ("KINETIC_POST_SCALE", "-1"),
    ]));
    assert_eq!(cfg.width, DEFAULT_WIDTH);
    assert_eq!(cfg.ticks, DEFAULT_TICKS);
    assert_eq!(cfg.fps, DEFAULT_FPS);
    assert!(!cfg.realtime);
    assert_eq!(cfg.post_scale, None);
}

#[test]
fn zero_size_is_clamped() {
    let cfg = RunConfig::from_lookup(lookup(&[("KINETIC_WIDTH", "0"), ("KINETIC_HEIGHT", "0")]));
    assert_eq!((cfg.width, cfg.height), (1, 1));
}

#[test]
fn flags() {
    for on in ["1", "true", "Yes", "on"] {
        assert!(parse_flag(on), "{on}");
    }
    for off in ["0", "false", "", "nope"] {
        assert!(!parse_flag(off), "{off}");
    }
}
