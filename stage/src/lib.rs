//! Real-time 2D engine: frame scheduling, scene and camera, a culling draw
//! pipeline with offscreen copy-back, and a small rigid-body integrator.
//!
//! The crate builds for the browser (WebAssembly, painting through
//! [`web::CanvasSurface`]) and natively, where [`surface::PixelSurface`]
//! rasterizes in memory so the whole per-tick pipeline runs in tests and in
//! the headless `kinetic` runner.
//!
//! One tick, as run by [`stage::Stage::frame`]:
//! scheduler → physics step → animation sampling → culling and draw →
//! post-process composite → pointer dispatch.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`stage`] | Owns every part and runs the per-tick pipeline |
//! | [`looper`] | Frame scheduler, tick deltas, frame-rate sampling |
//! | [`render`] | Ordered object list, culling draw pass, pixel readback |
//! | [`offscreen`] | Scaled snapshots for same-tick post-processing |
//! | [`object`] | Render objects, shapes, styles, per-object event handlers |
//! | [`scene`] | Scene bounds, attributes, pointer queue and dispatch |
//! | [`camera`] | Pan/zoom camera and world/viewport conversions |
//! | [`hit`] | Topmost-object hit-testing |
//! | [`physics`] | Rigid bodies, integration, collision against static bodies |
//! | [`animation`] | Easing functions and property tweens |
//! | [`event`] | Event kinds, payloads, one-handler-per-kind tables |
//! | [`input`] | Keyboard and gamepad state, pointer types |
//! | [`resource`] | Asynchronous image requests and loaders |
//! | [`surface`] | Paint surface trait and the software backend |
//! | [`web`] | Browser canvas backend |
//! | [`math`] | Vectors, affine transforms, bounding boxes |
//! | [`color`] | RGBA colors and pixel samples |
//! | [`error`] | Engine error type |
//! | [`consts`] | Shared numeric constants |

pub mod animation;
pub mod camera;
pub mod color;
pub mod consts;
pub mod error;
pub mod event;
pub mod hit;
pub mod input;
pub mod looper;
pub mod math;
pub mod object;
pub mod offscreen;
pub mod physics;
pub mod render;
pub mod resource;
pub mod scene;
pub mod stage;
pub mod surface;
pub mod web;

pub use error::{EngineError, ListenerResult};
pub use looper::{Looper, TickState};
pub use object::{ObjectId, RenderObject};
pub use render::{FrameReport, Renderer};
pub use stage::Stage;
