//! Slice rendering and label compositing.
//!
//! Raster pixel `(x, y)` shows `slice[[x, y]]`: the image is as wide as the
//! slice's first dimension and as tall as its second. Every operation here
//! returns a fresh image and leaves its inputs untouched.

use crate::intensity::{finite_range, normalize_to_u8};
use crate::volume::Slice2D;

use image::{ImageBuffer, Rgba, RgbaImage, imageops};
use thiserror::Error;

pub type RasterImage = RgbaImage;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OverlayError {
    #[error("label slice is {label:?} but the base image is {base:?}")]
    DimensionMismatch {
        base: (u32, u32),
        label: (u32, u32),
    },
}

/// Render a slice as opaque grayscale, stretching its own min..max to 0..255.
pub fn rasterize(slice: &Slice2D<'_, f32>) -> RasterImage {
    let (width, height) = slice.dim();
    let (min, max) = finite_range(slice.iter()).unwrap_or((0.0, 0.0));

    ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        let v = normalize_to_u8(slice[[x as usize, y as usize]], min, max);
        Rgba([v, v, v, u8::MAX])
    })
}

/// Paints every voxel carrying a given label in a single highlight colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelOverlay {
    highlight: Rgba<u8>,
}

impl Default for LabelOverlay {
    fn default() -> Self {
        Self::new(Rgba([255, 0, 0, 255]))
    }
}

impl LabelOverlay {
    pub fn new(highlight: Rgba<u8>) -> Self {
        Self { highlight }
    }

    pub fn highlight(&self) -> Rgba<u8> {
        self.highlight
    }

    /// Copy `base` and recolour the pixels where `labels == target`.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::DimensionMismatch`] when the label slice and
    /// the base image disagree in shape.
    pub fn overlay(
        &self,
        base: &RasterImage,
        labels: &Slice2D<'_, i32>,
        target: i32,
    ) -> Result<RasterImage, OverlayError> {
        let (lw, lh) = labels.dim();
        let label_dim = (lw as u32, lh as u32);
        if base.dimensions() != label_dim {
            return Err(OverlayError::DimensionMismatch {
                base: base.dimensions(),
                label: label_dim,
            });
        }

        let mut composed = base.clone();
        for ((x, y), &label) in labels.indexed_iter() {
            if label == target {
                composed.put_pixel(x as u32, y as u32, self.highlight);
            }
        }
        Ok(composed)
    }
}

/// Mirror left to right for radiological display.
pub fn flip_horizontal(raster: &RasterImage) -> RasterImage {
    imageops::flip_horizontal(raster)
}
