//! Paint surface boundary and the software RGBA backend.
//!
//! The renderer talks to pixels only through [`Surface`]. Geometry arrives as
//! a shape centered on the local origin plus a full device transform, the
//! same way the canvas backend calls `setTransform` and then fills around
//! `(0, 0)`. Shadow offsets are in device pixels and ignore the transform,
//! as they do on a 2D canvas.
//!
//! [`PixelSurface`] rasterizes by pixel-center coverage with no anti-aliasing
//! and straight-alpha source-over blending. Shadow blur is not rasterized;
//! the shadow is drawn as a hard offset silhouette.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::EngineError;
use crate::math::{Aabb, Transform, Vec2};
use crate::resource::Image;

/// Drop shadow painted beneath a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    /// Device-space offset in pixels.
    pub offset: Vec2,
    pub blur: f64,
    pub color: Color,
}

/// How a shape is filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Color,
    /// Multiplied into the color's alpha, `0.0..=1.0`.
    pub opacity: f64,
    pub shadow: Option<Shadow>,
}

impl Paint {
    #[must_use]
    pub fn solid(color: Color) -> Self {
        Self { color, opacity: 1.0, shadow: None }
    }
}

/// A 2D paint target.
///
/// Shapes are centered on the local origin; `transform` maps local
/// coordinates to device pixels (y-down).
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Resize the backing store. Contents are cleared.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), EngineError>;

    /// Reset every pixel to transparent.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn clear(&mut self) -> Result<(), EngineError>;

    /// Fill a `width × height` rectangle centered on the local origin.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn fill_rect(&mut self, transform: &Transform, width: f64, height: f64, paint: &Paint) -> Result<(), EngineError>;

    /// Fill an ellipse with radii `rx`, `ry` centered on the local origin.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn fill_ellipse(&mut self, transform: &Transform, rx: f64, ry: f64, paint: &Paint) -> Result<(), EngineError>;

    /// Draw `image` stretched over a `width × height` rectangle centered on the
    /// local origin. Image row 0 lands on the local `-height/2` edge.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn draw_image(
        &mut self,
        transform: &Transform,
        image: &Image,
        width: f64,
        height: f64,
        opacity: f64,
    ) -> Result<(), EngineError>;

    /// Raw RGBA bytes of a device-pixel region. Pixels outside the surface read as zero.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn get_image_data(&self, x: i32, y: i32, width: u32, height: u32) -> Result<Vec<u8>, EngineError>;

    /// Copy the whole surface, resampled by `scale`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Configuration`] for a non-positive or non-finite scale.
    fn capture_snapshot(&self, scale: f64) -> Result<Image, EngineError>;

    /// Stretch `snapshot` over the whole surface and blend it on top.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn composite_snapshot(&mut self, snapshot: &Image, opacity: f64, smoothing: bool) -> Result<(), EngineError>;
}

/// Validate a snapshot scale and return the scaled size (at least 1×1).
pub(crate) fn snapshot_size(width: u32, height: u32, scale: f64) -> Result<(u32, u32), EngineError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(EngineError::Configuration(format!("invalid snapshot scale: {scale}")));
    }
    let dim = |d: u32| to_u32((f64::from(d) * scale).round()).max(1);
    Ok((dim(width), dim(height)))
}

/// Resample `src` to `width × height`, triangle-filtered when `smoothing`.
pub(crate) fn resample(src: &Image, width: u32, height: u32, smoothing: bool) -> Image {
    let filter = if smoothing { FilterType::Triangle } else { FilterType::Nearest };
    imageops::resize(src, width, height, filter)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u32(v: f64) -> u32 {
    v.clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Software RGBA8 surface.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    buffer: RgbaImage,
}

impl PixelSurface {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { buffer: RgbaImage::new(width, height) }
    }

    /// RGBA at a device pixel, `None` outside the surface.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let Rgba([r, g, b, a]) = *self.buffer.get_pixel_checked(x, y)?;
        Some(Color::rgba(r, g, b, a))
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Straight-alpha source-over of `rgb` at coverage `alpha` into one pixel.
    fn blend(&mut self, x: u32, y: u32, rgb: [u8; 3], alpha: f64) {
        if alpha <= 0.0 {
            return;
        }
        let Some(Rgba(dst)) = self.buffer.get_pixel_mut_checked(x, y) else {
            return;
        };
        let a = alpha.min(1.0);
        let da = f64::from(dst[3]) / 255.0;
        let out_a = a + da * (1.0 - a);
        for c in 0..3 {
            let src = f64::from(rgb[c]);
            let d = f64::from(dst[c]);
            dst[c] = to_u8((src * a + d * da * (1.0 - a)) / out_a);
        }
        dst[3] = to_u8(out_a * 255.0);
    }

    /// Pixel-center scan of `local_bounds` through `transform`, filling wherever
    /// `shade(local_point)` yields a color.
    fn fill_with(
        &mut self,
        transform: &Transform,
        local_bounds: Aabb,
        mut shade: impl FnMut(Vec2) -> Option<([u8; 3], f64)>,
    ) {
        let Some(inverse) = transform.invert() else {
            return;
        };
        let device = transform.map_aabb(local_bounds);
        let x0 = to_u32(device.min.x.floor());
        let y0 = to_u32(device.min.y.floor());
        let x1 = to_u32(device.max.x.ceil()).min(self.buffer.width());
        let y1 = to_u32(device.max.y.ceil()).min(self.buffer.height());
        for y in y0..y1 {
            for x in x0..x1 {
                let center = Vec2::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if let Some((rgb, alpha)) = shade(inverse.apply(center)) {
                    self.blend(x, y, rgb, alpha);
                }
            }
        }
    }

    fn fill_solid(
        &mut self,
        transform: &Transform,
        local_bounds: Aabb,
        paint: &Paint,
        inside: impl Fn(Vec2) -> bool,
    ) {
        let opacity = paint.opacity.clamp(0.0, 1.0);
        if let Some(shadow) = paint.shadow {
            let shifted = transform.then(&Transform::translation(shadow.offset.x, shadow.offset.y));
            let rgb = [shadow.color.r, shadow.color.g, shadow.color.b];
            let alpha = f64::from(shadow.color.a) / 255.0 * opacity;
            self.fill_with(&shifted, local_bounds, |p| inside(p).then_some((rgb, alpha)));
        }
        let rgb = [paint.color.r, paint.color.g, paint.color.b];
        let alpha = f64::from(paint.color.a) / 255.0 * opacity;
        self.fill_with(transform, local_bounds, |p| inside(p).then_some((rgb, alpha)));
    }
}

impl Surface for PixelSurface {
    fn width(&self) -> u32 {
        self.buffer.width()
    }

    fn height(&self) -> u32 {
        self.buffer.height()
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        *self = Self::new(width, height);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), EngineError> {
        self.buffer.fill(0);
        Ok(())
    }

    fn fill_rect(&mut self, transform: &Transform, width: f64, height: f64, paint: &Paint) -> Result<(), EngineError> {
        let bounds = Aabb::centered(Vec2::ZERO, width, height);
        self.fill_solid(transform, bounds, paint, |p| {
            p.x >= bounds.min.x && p.x < bounds.max.x && p.y >= bounds.min.y && p.y < bounds.max.y
        });
        Ok(())
    }

    fn fill_ellipse(&mut self, transform: &Transform, rx: f64, ry: f64, paint: &Paint) -> Result<(), EngineError> {
        if rx <= 0.0 || ry <= 0.0 {
            return Ok(());
        }
        let bounds = Aabb::centered(Vec2::ZERO, rx * 2.0, ry * 2.0);
        self.fill_solid(transform, bounds, paint, |p| (p.x / rx).powi(2) + (p.y / ry).powi(2) <= 1.0);
        Ok(())
    }

    fn draw_image(
        &mut self,
        transform: &Transform,
        image: &Image,
        width: f64,
        height: f64,
        opacity: f64,
    ) -> Result<(), EngineError> {
        if width <= 0.0 || height <= 0.0 || image.width() == 0 || image.height() == 0 {
            return Ok(());
        }
        let bounds = Aabb::centered(Vec2::ZERO, width, height);
        let opacity = opacity.clamp(0.0, 1.0);
        let (iw, ih) = (f64::from(image.width()), f64::from(image.height()));
        self.fill_with(transform, bounds, |p| {
            if p.x < bounds.min.x || p.x >= bounds.max.x || p.y < bounds.min.y || p.y >= bounds.max.y {
                return None;
            }
            let u = to_u32(((p.x - bounds.min.x) / width * iw).floor()).min(image.width() - 1);
            let v = to_u32(((p.y - bounds.min.y) / height * ih).floor()).min(image.height() - 1);
            let Rgba([r, g, b, a]) = *image.get_pixel_checked(u, v)?;
            Some(([r, g, b], f64::from(a) / 255.0 * opacity))
        });
        Ok(())
    }

    fn get_image_data(&self, x: i32, y: i32, width: u32, height: u32) -> Result<Vec<u8>, EngineError> {
        let mut out = Vec::with_capacity(width as usize * height as usize * 4);
        for row in 0..height {
            for col in 0..width {
                let sx = i64::from(x) + i64::from(col);
                let sy = i64::from(y) + i64::from(row);
                let px = match (u32::try_from(sx), u32::try_from(sy)) {
                    (Ok(px), Ok(py)) => self.pixel(px, py).map_or([0; 4], Color::channels),
                    _ => [0; 4],
                };
                out.extend_from_slice(&px);
            }
        }
        Ok(out)
    }

    fn capture_snapshot(&self, scale: f64) -> Result<Image, EngineError> {
        let (w, h) = snapshot_size(self.width(), self.height(), scale)?;
        Ok(resample(&self.buffer, w, h, false))
    }

    fn composite_snapshot(&mut self, snapshot: &Image, opacity: f64, smoothing: bool) -> Result<(), EngineError> {
        let (width, height) = self.buffer.dimensions();
        if width == 0 || height == 0 {
            return Ok(());
        }
        let stretched = resample(snapshot, width, height, smoothing);
        let opacity = opacity.clamp(0.0, 1.0);
        for (x, y, &Rgba([r, g, b, a])) in stretched.enumerate_pixels() {
            self.blend(x, y, [r, g, b], f64::from(a) / 255.0 * opacity);
        }
        Ok(())
    }
}
