use super::*;

fn small() -> RunConfig {
    RunConfig { width: 120, height: 90, ticks: 6, rectangles: 6, ..RunConfig::default() }
}

fn lines(out: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(out).lines().map(|l| serde_json::from_str(l).unwrap()).collect()
}

// =============================================================================
// build
// =============================================================================

#[test]
fn build_adds_ground_rects_and_pulse() {
    let stage = build(&small()).unwrap();
    assert_eq!(stage.renderer().len(), 6 + 2);
    // Ground plus every other rectangle.
    assert_eq!(stage.physics.len(), 1 + 3);
    assert_eq!(stage.background, Some(BACKGROUND));
    assert!(stage.post_process().is_none());
}

#[test]
fn build_is_deterministic_per_seed() {
    let a = build(&small()).unwrap();
    let b = build(&small()).unwrap();
    let bounds = |s: &Stage<PixelSurface>| s.renderer().objects().iter().map(RenderObject::world_bounds).collect::<Vec<_>>();
    assert_eq!(bounds(&a), bounds(&b));
}

#[test]
fn post_scale_enables_post_process() {
    let stage = build(&RunConfig { post_scale: Some(0.5), ..small() }).unwrap();
    assert!(stage.post_process().is_some());
}

// =============================================================================
// run
// =============================================================================

#[test]
fn run_writes_one_line_per_drawn_frame_then_summary() {
    let mut out = Vec::new();
    let summary = run(&small(), &mut out).unwrap();

    assert_eq!(summary.ticks, 6);
    assert_eq!(summary.frames_drawn, 5);
    assert_eq!(summary.objects, 8);
    assert!(summary.last_sample.as_deref().is_some_and(|hex| hex.starts_with('#')));

    let lines = lines(&out);
    assert_eq!(lines.len(), 6);
    for (i, report) in lines[..5].iter().enumerate() {
        assert_eq!(report["frame"], serde_json::json!(i + 2));
        assert_eq!(report["skipped"], serde_json::json!(false));
    }
    assert_eq!(lines[5]["frames_drawn"], serde_json::json!(5));
}

#[test]
fn run_with_post_process() {
    let mut out = Vec::new();
    let summary = run(&RunConfig { post_scale: Some(0.25), ..small() }, &mut out).unwrap();
    assert_eq!(summary.frames_drawn, 5);
}

#[test]
fn single_tick_draws_nothing() {
    let mut out = Vec::new();
    let summary = run(&RunConfig { ticks: 1, ..small() }, &mut out).unwrap();
    assert_eq!(summary.frames_drawn, 0);
    assert_eq!(summary.last_sample, None);
    assert_eq!(lines(&out).len(), 1);
}
