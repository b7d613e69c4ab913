//! Headless demo scene: falling boxes over a static ground, color and radius
//! tweens, a sweeping synthetic pointer, and optional post-processing.

#[cfg(test)]
#[path = "demo_test.rs"]
mod demo_test;

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use stage::animation::{AnimatedProperty, Easing};
use stage::color::Color;
use stage::event::EventKind;
use stage::looper::{FixedClock, FrameClock, Looper, LooperEvent, SleepClock};
use stage::math::Vec2;
use stage::object::RenderObject;
use stage::offscreen::OffscreenRenderer;
use stage::physics::BodyKind;
use stage::render::{CompositeOptions, FrameReport};
use stage::surface::PixelSurface;
use stage::{EngineError, Stage};

use crate::config::RunConfig;

const BACKGROUND: Color = Color::rgb(18, 18, 28);
const GROUND: Color = Color::rgb(90, 90, 100);
const GROUND_HEIGHT: f64 = 20.0;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("encode report: {0}")]
    Json(#[from] serde_json::Error),
    #[error("write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Final line of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub frames_drawn: usize,
    pub objects: usize,
    pub bodies: usize,
    pub frame_rate: f64,
    /// Pixel color under the synthetic pointer on its last move.
    pub last_sample: Option<String>,
}

fn random_color(rng: &mut StdRng) -> Color {
    Color::rgb(rng.random_range(60..=255), rng.random_range(60..=255), rng.random_range(60..=255))
}

/// Populate a stage for `config`.
///
/// # Errors
///
/// Body binding or post-process setup failure.
pub fn build(config: &RunConfig) -> Result<Stage<PixelSurface>, EngineError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut stage = Stage::new(PixelSurface::new(config.width, config.height));
    stage.background = Some(BACKGROUND);
    stage.physics.set_gravity(0.0, config.gravity_y);

    let width = f64::from(config.width);
    let ground = stage.add(RenderObject::rect(width, GROUND_HEIGHT).at(width * 0.5, GROUND_HEIGHT * 0.5).fill(GROUND));
    stage.bind_body(ground, 1.0, BodyKind::Static)?;

    for i in 0..config.rectangles {
        let at = stage.scene.random_position(&mut rng);
        let (w, h) = (rng.random_range(20.0..=40.0), rng.random_range(20.0..=40.0));
        let y = at.y.max(GROUND_HEIGHT + h);
        let mut object = RenderObject::rect(w, h).at(at.x, y).fill(random_color(&mut rng));
        if i % 2 == 0 {
            let id = stage.add(object);
            stage.bind_body(id, 1.0, BodyKind::Dynamic)?;
        } else {
            let to = random_color(&mut rng);
            object.animate_fill(to, 2000.0, Easing::EaseInOutSine);
            stage.add(object);
        }
    }

    let center = stage.scene.center();
    let mut pulse = RenderObject::circle(10.0).at(center.x, center.y).fill(Color::rgb(250, 200, 60)).opacity(0.8);
    pulse.animate(AnimatedProperty::Radius, 60.0, 1500.0, Easing::EaseOutBounce);
    stage.add(pulse);

    if let Some(scale) = config.post_scale {
        stage.enable_post_process(OffscreenRenderer::new(scale)?, CompositeOptions { opacity: 0.35, smoothing: true });
    }
    tracing::info!(objects = stage.renderer().len(), bodies = stage.physics.len(), "demo scene built");
    Ok(stage)
}

/// Run the demo and write one JSON line per drawn frame, then the summary.
///
/// # Errors
///
/// Scene setup, clock failure, or output failure.
pub fn run(config: &RunConfig, out: &mut impl Write) -> Result<RunSummary, RunError> {
    let mut stage = build(config)?;

    let last_sample = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&last_sample);
    stage.scene.add_event_listener(EventKind::PointerMove, move |event, ctx| {
        #[allow(clippy::cast_possible_truncation)]
        let sample = ctx.get_image_data(event.viewport.x as i32, event.viewport.y as i32, 1, 1)?;
        tracing::trace!(hex = %sample.hex, target = ?event.target, "pointer sample");
        *sink.borrow_mut() = Some(sample.hex);
        Ok(())
    })?;

    let mut looper = Looper::default();
    let (width, height) = (f64::from(config.width), f64::from(config.height));
    looper.add_event_listener(LooperEvent::Update, move |stage: &mut Stage<PixelSurface>, tick| {
        #[allow(clippy::cast_precision_loss)]
        let x = (tick.frame as f64 * 7.0) % width;
        stage.scene.queue_pointer_move(Vec2::new(x, height * 0.5));
        Ok(())
    });
    Stage::attach(&mut looper);
    let reports: Rc<RefCell<Vec<FrameReport>>> = Rc::new(RefCell::new(Vec::new()));
    let collected = Rc::clone(&reports);
    looper.add_event_listener(LooperEvent::Update, move |stage: &mut Stage<PixelSurface>, tick| {
        if let Some(report) = stage.last_report().filter(|r| !tick.is_skip() && r.frame == tick.frame) {
            collected.borrow_mut().push(report);
        }
        Ok(())
    });

    let mut clock: Box<dyn FrameClock> =
        if config.realtime { Box::new(SleepClock::new(config.fps)?) } else { Box::new(FixedClock::at_fps(config.fps)) };
    let ticks = looper.run(&mut stage, clock.as_mut(), Some(config.ticks))?;

    let reports = reports.take();
    for report in &reports {
        writeln!(out, "{}", serde_json::to_string(report)?)?;
    }
    let summary = RunSummary {
        ticks,
        frames_drawn: reports.len(),
        objects: stage.renderer().len(),
        bodies: stage.physics.len(),
        frame_rate: looper.frame_rate(),
        last_sample: last_sample.take(),
    };
    writeln!(out, "{}", serde_json::to_string(&summary)?)?;
    tracing::info!(ticks, frames = summary.frames_drawn, "demo finished");
    Ok(summary)
}
