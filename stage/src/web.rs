//! Browser paint surface backed by a `<canvas>` 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! Every shape call sets the full device transform, fills around the local
//! origin, and restores the context, so no state leaks between objects.

use std::f64::consts::TAU;

use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use crate::error::EngineError;
use crate::math::Transform;
use crate::resource::Image;
use crate::stage::Stage;
use crate::surface::{Paint, Surface, resample, snapshot_size};

fn js_err(e: JsValue) -> EngineError {
    EngineError::Surface(format!("{e:?}"))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, EngineError> {
    let ctx: js_sys::Object = canvas
        .get_context("2d")
        .map_err(js_err)?
        .ok_or_else(|| EngineError::Surface("2d context unavailable".into()))?;
    ctx.dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| EngineError::Surface("context is not CanvasRenderingContext2d".into()))
}

/// Detached canvas holding `image`, for `drawImage` sources.
fn image_canvas(image: &Image) -> Result<HtmlCanvasElement, EngineError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| EngineError::Surface("no document".into()))?;
    let canvas = document
        .create_element("canvas")
        .map_err(js_err)?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| EngineError::Surface("created element is not a canvas".into()))?;
    canvas.set_width(image.width());
    canvas.set_height(image.height());
    let data = ImageData::new_with_u8_clamped_array_and_sh(Clamped(image.as_raw().as_slice()), image.width(), image.height())
        .map_err(js_err)?;
    context_2d(&canvas)?.put_image_data(&data, 0.0, 0.0).map_err(js_err)?;
    Ok(canvas)
}

/// [`Surface`] over an `HtmlCanvasElement`.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Bind to `canvas` and acquire its 2D context.
    ///
    /// # Errors
    ///
    /// [`EngineError::Surface`] if the context can't be acquired.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, EngineError> {
        let ctx = context_2d(&canvas)?;
        Ok(Self { canvas, ctx })
    }

    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn begin(&self, transform: &Transform, paint: &Paint) -> Result<(), EngineError> {
        self.ctx.save();
        self.ctx.set_global_alpha(paint.opacity.clamp(0.0, 1.0));
        self.ctx.set_fill_style_str(&paint.color.to_css());
        if let Some(shadow) = paint.shadow {
            self.ctx.set_shadow_offset_x(shadow.offset.x);
            self.ctx.set_shadow_offset_y(shadow.offset.y);
            self.ctx.set_shadow_blur(shadow.blur);
            self.ctx.set_shadow_color(&shadow.color.to_css());
        }
        self.set_transform(transform)
    }

    fn set_transform(&self, t: &Transform) -> Result<(), EngineError> {
        self.ctx
            .set_transform(t.scale_x, t.skew_y, t.skew_x, t.scale_y, t.translate_x, t.translate_y)
            .map_err(js_err)
    }
}

impl Surface for CanvasSurface {
    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), EngineError> {
        self.set_transform(&Transform::IDENTITY)?;
        self.ctx.clear_rect(0.0, 0.0, f64::from(self.width()), f64::from(self.height()));
        Ok(())
    }

    fn fill_rect(&mut self, transform: &Transform, width: f64, height: f64, paint: &Paint) -> Result<(), EngineError> {
        let begun = self.begin(transform, paint);
        if begun.is_ok() {
            self.ctx.fill_rect(-width * 0.5, -height * 0.5, width, height);
        }
        self.ctx.restore();
        begun
    }

    fn fill_ellipse(&mut self, transform: &Transform, rx: f64, ry: f64, paint: &Paint) -> Result<(), EngineError> {
        if rx <= 0.0 || ry <= 0.0 {
            return Ok(());
        }
        let drawn = self.begin(transform, paint).and_then(|()| {
            self.ctx.begin_path();
            self.ctx.ellipse(0.0, 0.0, rx, ry, 0.0, 0.0, TAU).map_err(js_err)
        });
        if drawn.is_ok() {
            self.ctx.fill();
        }
        self.ctx.restore();
        drawn
    }

    fn draw_image(
        &mut self,
        transform: &Transform,
        image: &Image,
        width: f64,
        height: f64,
        opacity: f64,
    ) -> Result<(), EngineError> {
        let source = image_canvas(image)?;
        self.ctx.save();
        self.ctx.set_global_alpha(opacity.clamp(0.0, 1.0));
        let drawn = self.set_transform(transform).and_then(|()| {
            self.ctx
                .draw_image_with_html_canvas_element_and_dw_and_dh(&source, -width * 0.5, -height * 0.5, width, height)
                .map_err(js_err)
        });
        self.ctx.restore();
        drawn
    }

    fn get_image_data(&self, x: i32, y: i32, width: u32, height: u32) -> Result<Vec<u8>, EngineError> {
        let data = self
            .ctx
            .get_image_data(f64::from(x), f64::from(y), f64::from(width), f64::from(height))
            .map_err(js_err)?;
        Ok(data.data().0)
    }

    fn capture_snapshot(&self, scale: f64) -> Result<Image, EngineError> {
        let (w, h) = snapshot_size(self.width(), self.height(), scale)?;
        let raw = Surface::get_image_data(self, 0, 0, self.width(), self.height())?;
        let full = Image::from_raw(self.width(), self.height(), raw)
            .ok_or_else(|| EngineError::Surface("image data size mismatch".into()))?;
        Ok(resample(&full, w, h, false))
    }

    fn composite_snapshot(&mut self, snapshot: &Image, opacity: f64, smoothing: bool) -> Result<(), EngineError> {
        let source = image_canvas(snapshot)?;
        self.ctx.save();
        self.ctx.set_global_alpha(opacity.clamp(0.0, 1.0));
        self.ctx.set_image_smoothing_enabled(smoothing);
        let (w, h) = (f64::from(self.width()), f64::from(self.height()));
        let drawn = self.set_transform(&Transform::IDENTITY).and_then(|()| {
            self.ctx.draw_image_with_html_canvas_element_and_dw_and_dh(&source, 0.0, 0.0, w, h).map_err(js_err)
        });
        self.ctx.restore();
        drawn
    }
}

/// A [`Stage`] painting into a browser canvas.
pub type CanvasStage = Stage<CanvasSurface>;

/// Bind a new stage to `canvas`.
///
/// # Errors
///
/// [`EngineError::Surface`] if the 2D context can't be acquired.
pub fn canvas_stage(canvas: HtmlCanvasElement) -> Result<CanvasStage, EngineError> {
    Ok(Stage::new(CanvasSurface::new(canvas)?))
}
