//! Cylinder Geometry - Wrap Math
//!
//! Pure functions shared by the policy engine and preflight. All results are
//! rounded with `round_mm`, whose boundary behavior other modules rely on.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::document::Anchor;

/// Default decimal places for millimeter values.
pub const MM_DECIMALS: i32 = 3;

/// Round to a fixed number of decimals, half away from zero.
pub fn round_mm(value: f64, decimals: i32) -> f64 {
    let precision = 10f64.powi(decimals);
    (value * precision).round() / precision
}

/// `round_mm` at the default 3-decimal precision.
pub fn round_mm3(value: f64) -> f64 {
    round_mm(value, MM_DECIMALS)
}

/// Circumference of a cylinder, which is also its canonical wrap width.
pub fn circumference_mm(diameter_mm: f64) -> f64 {
    round_mm3(PI * diameter_mm)
}

pub fn diameter_to_wrap_width_mm(diameter_mm: f64) -> f64 {
    circumference_mm(diameter_mm)
}

/// Horizontal position on the unwrapped surface as an angle around the cylinder.
pub fn mm_to_degrees(x_mm: f64, wrap_width_mm: f64) -> f64 {
    round_mm3((x_mm / wrap_width_mm) * 360.0)
}

pub fn degrees_to_mm(deg: f64, wrap_width_mm: f64) -> f64 {
    round_mm3((deg / 360.0) * wrap_width_mm)
}

/// Axis-aligned rectangle, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rect {
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.x_mm + self.width_mm
    }

    pub fn bottom(&self) -> f64 {
        self.y_mm + self.height_mm
    }

    /// True when the rectangle leaves `[0, width] x [0, height]` on any edge.
    pub fn exceeds(&self, width_mm: f64, height_mm: f64) -> bool {
        self.x_mm < 0.0 || self.y_mm < 0.0 || self.right() > width_mm || self.bottom() > height_mm
    }
}

/// Resolve an anchored placement into its top-left rectangle.
pub fn resolve_anchored_rect(
    anchor: Anchor,
    offset_x_mm: f64,
    offset_y_mm: f64,
    width_mm: f64,
    height_mm: f64,
) -> Rect {
    let (x_mm, y_mm) = match anchor {
        Anchor::Center => (offset_x_mm - width_mm / 2.0, offset_y_mm - height_mm / 2.0),
        Anchor::TopLeft => (offset_x_mm, offset_y_mm),
        Anchor::TopRight => (offset_x_mm - width_mm, offset_y_mm),
        Anchor::BottomLeft => (offset_x_mm, offset_y_mm - height_mm),
        Anchor::BottomRight => (offset_x_mm - width_mm, offset_y_mm - height_mm),
    };
    Rect { x_mm, y_mm, width_mm, height_mm }
}

/// Axis-aligned bounds of `rect` after rotating it about its center.
pub fn rotate_rect_bounds(rect: &Rect, rotation_deg: f64) -> Rect {
    let radians = (rotation_deg % 360.0).to_radians();
    let (sin, cos) = radians.sin_cos();
    let cx = rect.x_mm + rect.width_mm / 2.0;
    let cy = rect.y_mm + rect.height_mm / 2.0;

    let corners = [
        (rect.x_mm, rect.y_mm),
        (rect.right(), rect.y_mm),
        (rect.x_mm, rect.bottom()),
        (rect.right(), rect.bottom()),
    ];

    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for (x, y) in corners {
        let dx = x - cx;
        let dy = y - cy;
        let rx = cx + dx * cos - dy * sin;
        let ry = cy + dx * sin + dy * cos;
        min_x = min_x.min(rx);
        max_x = max_x.max(rx);
        min_y = min_y.min(ry);
        max_y = max_y.max(ry);
    }

    Rect {
        x_mm: min_x,
        y_mm: min_y,
        width_mm: max_x - min_x,
        height_mm: max_y - min_y,
    }
}

/// Physical cylinder plus its unwrapped surface size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CylinderProfile {
    pub diameter_mm: f64,
    pub unwrap_width_mm: f64,
    pub unwrap_height_mm: f64,
}

impl CylinderProfile {
    pub fn from_diameter(diameter_mm: f64, unwrap_height_mm: f64) -> Self {
        Self {
            diameter_mm,
            unwrap_width_mm: circumference_mm(diameter_mm),
            unwrap_height_mm,
        }
    }
}

/// Texture coordinates in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Uv {
    pub u: f64,
    pub v: f64,
}

/// Map unwrapped mm coordinates to UV; x wraps around the circumference.
pub fn mm_to_uv(x_mm: f64, y_mm: f64, profile: &CylinderProfile) -> Uv {
    let wrapped_x = x_mm.rem_euclid(profile.unwrap_width_mm);
    Uv {
        u: wrapped_x / profile.unwrap_width_mm,
        v: (y_mm / profile.unwrap_height_mm).clamp(0.0, 1.0),
    }
}

pub fn uv_to_mm(u: f64, v: f64, profile: &CylinderProfile) -> (f64, f64) {
    let wrapped_u = u.rem_euclid(1.0);
    (
        wrapped_u * profile.unwrap_width_mm,
        v.clamp(0.0, 1.0) * profile.unwrap_height_mm,
    )
}
