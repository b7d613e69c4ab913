//! Offscreen copy-back for post-processing.
//!
//! [`OffscreenRenderer::create_texture`] snapshots the renderer's surface at
//! a reduced scale and tags the copy with the frame of the draw pass it came
//! from. [`crate::render::Renderer::render_copied_texture`] only accepts a
//! texture from the latest draw pass, so a copy can never be composited over
//! a later frame.

#[cfg(test)]
#[path = "offscreen_test.rs"]
mod offscreen_test;

use crate::consts::DEFAULT_OFFSCREEN_SCALE;
use crate::error::EngineError;
use crate::render::Renderer;
use crate::resource::Image;
use crate::surface::Surface;

/// A scaled copy of the surface and the frame it was captured in.
#[derive(Debug, Clone)]
pub struct Texture {
    image: Image,
    frame: u64,
}

impl Texture {
    #[must_use]
    pub fn image(&self) -> &Image {
        &self.image
    }

    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

#[derive(Debug, Clone)]
pub struct OffscreenRenderer {
    scale: f64,
    texture: Option<Texture>,
}

impl Default for OffscreenRenderer {
    fn default() -> Self {
        Self { scale: DEFAULT_OFFSCREEN_SCALE, texture: None }
    }
}

impl OffscreenRenderer {
    /// # Errors
    ///
    /// [`EngineError::Configuration`] unless `scale` is positive and finite.
    pub fn new(scale: f64) -> Result<Self, EngineError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(EngineError::Configuration(format!("invalid offscreen scale: {scale}")));
        }
        Ok(Self { scale, texture: None })
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Capture the renderer's surface as it stands after its latest draw pass.
    ///
    /// # Errors
    ///
    /// [`EngineError::State`] before the first draw pass; surface failures.
    pub fn create_texture<S: Surface>(&mut self, renderer: &Renderer<S>) -> Result<&Texture, EngineError> {
        let frame = renderer
            .drawn_frame()
            .ok_or_else(|| EngineError::State("nothing has been drawn yet".into()))?;
        let image = renderer.surface().capture_snapshot(self.scale)?;
        tracing::trace!(frame, width = image.width(), height = image.height(), "offscreen texture captured");
        Ok(self.texture.insert(Texture { image, frame }))
    }

    #[must_use]
    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    pub fn discard(&mut self) {
        self.texture = None;
    }
}
