//! Image Insertion - Default Placement for New Images
//!
//! Positions use 2-decimal rounding, not the 3-decimal `round_mm3` used by
//! the wrap math.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::{Canvas, ImageObject, ObjectFrame, PlacementObject};
use crate::geometry::round_mm;

const POSITION_DECIMALS: i32 = 2;

#[derive(Debug, Error, PartialEq)]
pub enum ImageInsertError {
    #[error("Image metadata is incomplete. Width and height are required.")]
    MissingAssetDimensions,

    #[error("Image dimensions must be finite positive numbers.")]
    InvalidImageDimensions,
}

impl ImageInsertError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingAssetDimensions => "MISSING_ASSET_DIMENSIONS",
            Self::InvalidImageDimensions => "INVALID_IMAGE_DIMENSIONS",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInsertRequest {
    pub asset_id: String,
    #[serde(default)]
    pub width_px: Option<f64>,
    #[serde(default)]
    pub height_px: Option<f64>,
    pub canvas: Canvas,
}

/// How large a freshly inserted image is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSizing {
    pub max_width_mm: f64,
    pub canvas_fraction: f64,
}

impl Default for ImageSizing {
    fn default() -> Self {
        Self {
            max_width_mm: 40.0,
            canvas_fraction: 0.4,
        }
    }
}

fn finite_positive(value: f64) -> Result<f64, ImageInsertError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ImageInsertError::InvalidImageDimensions)
    }
}

pub fn build_default_image_placement(request: &ImageInsertRequest) -> Result<PlacementObject, ImageInsertError> {
    build_image_placement_with(request, &ImageSizing::default())
}

/// Centered, aspect-locked image object sized from `sizing`.
pub fn build_image_placement_with(
    request: &ImageInsertRequest,
    sizing: &ImageSizing,
) -> Result<PlacementObject, ImageInsertError> {
    let (width_px, height_px) = match (request.width_px, request.height_px) {
        (Some(w), Some(h)) if w != 0.0 && h != 0.0 => (w, h),
        _ => return Err(ImageInsertError::MissingAssetDimensions),
    };

    let width_px = finite_positive(width_px)?;
    let height_px = finite_positive(height_px)?;
    let canvas = &request.canvas;

    let default_width_mm = sizing.max_width_mm.min(canvas.width_mm * sizing.canvas_fraction);
    let aspect_ratio = height_px / width_px;
    let width_mm = finite_positive(default_width_mm)?;
    let height_mm = finite_positive(default_width_mm * aspect_ratio)?;

    let frame = ObjectFrame::new(
        format!("img-{}", request.asset_id),
        round_mm((canvas.width_mm - width_mm) / 2.0, POSITION_DECIMALS),
        round_mm((canvas.height_mm - height_mm) / 2.0, POSITION_DECIMALS),
        round_mm(width_mm, POSITION_DECIMALS),
        round_mm(height_mm, POSITION_DECIMALS),
    );
    log::debug!("default placement for asset {}: {}x{}mm", request.asset_id, frame.box_width_mm, frame.box_height_mm);

    Ok(PlacementObject::Image(ImageObject {
        frame,
        asset_id: Some(request.asset_id.clone()),
        src: None,
        lock_aspect_ratio: true,
        opacity: 1.0,
    }))
}
