//! Placement Document - Typed Model and Boundary Checks
//!
//! Raw JSON is converted into these types once, at the boundary. Everything
//! past `PlacementDocument::from_value` works on the typed representation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::geometry::{resolve_anchored_rect, Rect};

pub const CURRENT_VERSION: u32 = 3;
pub const SUPPORTED_VERSIONS: [u32; 2] = [2, 3];
pub const DEFAULT_STROKE_THRESHOLD_MM: f64 = 0.1;
pub const LEGACY_SLOT_ID: &str = "legacy-image-slot";

/// Image-insertion payloads use short frame names; the document uses the long ones.
const FRAME_ALIASES: [(&str, &str); 4] = [
    ("xMm", "offsetXMm"),
    ("yMm", "offsetYMm"),
    ("widthMm", "boxWidthMm"),
    ("heightMm", "boxHeightMm"),
];

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Invalid placement document: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("Unsupported placement version {0}")]
    UnsupportedVersion(u32),

    #[error("{field} must be a finite number")]
    NonFinite { field: String },

    #[error("{field} must be greater than zero, got {value}")]
    NonPositive { field: String, value: f64 },

    #[error("{field} is out of range: {detail}")]
    OutOfRange { field: String, detail: String },
}

impl DocumentError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Shape(_) => "INVALID_PLACEMENT",
            Self::UnsupportedVersion(_) => "UNSUPPORTED_VERSION",
            Self::NonFinite { .. } => "NON_FINITE_NUMBER",
            Self::NonPositive { .. } => "NON_POSITIVE_DIMENSION",
            Self::OutOfRange { .. } => "OUT_OF_RANGE",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    Center,
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Canvas {
    pub width_mm: f64,
    pub height_mm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSettings {
    #[serde(default = "default_stroke_threshold")]
    pub stroke_width_warning_threshold_mm: f64,
}

fn default_stroke_threshold() -> f64 { DEFAULT_STROKE_THRESHOLD_MM }

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            stroke_width_warning_threshold_mm: DEFAULT_STROKE_THRESHOLD_MM,
        }
    }
}

/// Cylinder wrap settings. `wrap_width_mm` should equal the circumference of
/// `diameter_mm`; preflight reports a mismatch instead of correcting it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapSettings {
    pub enabled: bool,
    pub diameter_mm: f64,
    pub wrap_width_mm: f64,
    #[serde(rename = "seamXmm")]
    pub seam_x_mm: f64,
    pub seam_safe_margin_mm: f64,
    #[serde(default)]
    pub micro_overlap_mm: f64,
}

/// Fields shared by every object kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectFrame {
    pub id: String,
    #[serde(default)]
    pub rotation_deg: f64,
    #[serde(default)]
    pub anchor: Anchor,
    pub offset_x_mm: f64,
    pub offset_y_mm: f64,
    pub box_width_mm: f64,
    pub box_height_mm: f64,
    #[serde(default)]
    pub mirror_x: bool,
    #[serde(default)]
    pub mirror_y: bool,
    #[serde(default)]
    pub z_index: i64,
}

impl ObjectFrame {
    pub fn new(id: impl Into<String>, offset_x_mm: f64, offset_y_mm: f64, box_width_mm: f64, box_height_mm: f64) -> Self {
        Self {
            id: id.into(),
            rotation_deg: 0.0,
            anchor: Anchor::TopLeft,
            offset_x_mm,
            offset_y_mm,
            box_width_mm,
            box_height_mm,
            mirror_x: false,
            mirror_y: false,
            z_index: 0,
        }
    }

    /// Unrotated box with the anchor applied.
    pub fn anchored_rect(&self) -> Rect {
        resolve_anchored_rect(
            self.anchor,
            self.offset_x_mm,
            self.offset_y_mm,
            self.box_width_mm,
            self.box_height_mm,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    Fill,
    Stroke,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    pub content: String,
    pub font_family: String,
    pub font_weight: u16,
    pub font_style: FontStyle,
    pub font_size_mm: f64,
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    #[serde(default)]
    pub letter_spacing_mm: f64,
    pub horizontal_align: HorizontalAlign,
    pub vertical_align: VerticalAlign,
    pub fill_mode: FillMode,
    #[serde(default)]
    pub stroke_width_mm: f64,
    #[serde(default)]
    pub all_caps: bool,
}

fn default_line_height() -> f64 { 1.2 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    #[serde(flatten)]
    pub frame: ObjectFrame,
    #[serde(flatten)]
    pub typography: Typography,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArcDirection {
    Cw,
    Ccw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineMode {
    Inside,
    Center,
    Outside,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeamWrapMode {
    #[default]
    Disallow,
    Split,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextArc {
    pub radius_mm: f64,
    pub start_angle_deg: f64,
    pub end_angle_deg: f64,
    pub direction: ArcDirection,
    pub baseline_mode: BaselineMode,
    #[serde(default)]
    pub seam_wrap_mode: SeamWrapMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcTextObject {
    #[serde(flatten)]
    pub frame: ObjectFrame,
    #[serde(flatten)]
    pub typography: Typography,
    pub arc: TextArc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorSourceMeta {
    pub font_hash: String,
    pub conversion_timestamp: String,
    pub tolerance_mm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorObject {
    #[serde(flatten)]
    pub frame: ObjectFrame,
    pub path_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text_object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_meta: Option<VectorSourceMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageObject {
    #[serde(flatten)]
    pub frame: ObjectFrame,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default = "default_true")]
    pub lock_aspect_ratio: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_true() -> bool { true }
fn default_opacity() -> f64 { 1.0 }

/// A placed object, discriminated by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlacementObject {
    TextLine(TextObject),
    TextBlock(TextObject),
    TextArc(ArcTextObject),
    Vector(VectorObject),
    Image(ImageObject),
}

impl PlacementObject {
    pub fn frame(&self) -> &ObjectFrame {
        match self {
            Self::TextLine(o) | Self::TextBlock(o) => &o.frame,
            Self::TextArc(o) => &o.frame,
            Self::Vector(o) => &o.frame,
            Self::Image(o) => &o.frame,
        }
    }

    pub fn frame_mut(&mut self) -> &mut ObjectFrame {
        match self {
            Self::TextLine(o) | Self::TextBlock(o) => &mut o.frame,
            Self::TextArc(o) => &mut o.frame,
            Self::Vector(o) => &mut o.frame,
            Self::Image(o) => &mut o.frame,
        }
    }

    pub fn id(&self) -> &str {
        &self.frame().id
    }

    /// Typography for text kinds, `None` otherwise.
    pub fn typography(&self) -> Option<&Typography> {
        match self {
            Self::TextLine(o) | Self::TextBlock(o) => Some(&o.typography),
            Self::TextArc(o) => Some(&o.typography),
            Self::Vector(_) | Self::Image(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::TextLine(_) => "text_line",
            Self::TextBlock(_) => "text_block",
            Self::TextArc(_) => "text_arc",
            Self::Vector(_) => "vector",
            Self::Image(_) => "image",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementDocument {
    pub version: u32,
    pub canvas: Canvas,
    #[serde(default)]
    pub machine: MachineSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap: Option<WrapSettings>,
    #[serde(default)]
    pub objects: Vec<PlacementObject>,
}

impl Default for PlacementDocument {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            canvas: Canvas { width_mm: 50.0, height_mm: 50.0 },
            machine: MachineSettings::default(),
            wrap: None,
            objects: vec![],
        }
    }
}

impl PlacementDocument {
    /// Deserialize and check invariants. Accepts the short image frame names.
    pub fn from_value(raw: &Value) -> Result<Self, DocumentError> {
        let normalized = normalize_frame_aliases(raw);
        let document: PlacementDocument = serde_json::from_value(normalized)?;
        document.validate()?;
        Ok(document)
    }

    /// Wrap settings, only when wrapping is switched on.
    pub fn active_wrap(&self) -> Option<&WrapSettings> {
        self.wrap.as_ref().filter(|w| w.enabled)
    }

    /// Objects in paint order: `zIndex` ascending, then `id` ascending.
    pub fn paint_order(&self) -> Vec<&PlacementObject> {
        let mut ordered: Vec<_> = self.objects.iter().collect();
        ordered.sort_by(|a, b| {
            a.frame().z_index.cmp(&b.frame().z_index)
                .then_with(|| a.id().cmp(b.id()))
        });
        ordered
    }

    /// Check the domain invariants that the type system cannot express.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if !SUPPORTED_VERSIONS.contains(&self.version) {
            return Err(DocumentError::UnsupportedVersion(self.version));
        }

        positive("canvas.widthMm", self.canvas.width_mm)?;
        positive("canvas.heightMm", self.canvas.height_mm)?;
        positive(
            "machine.strokeWidthWarningThresholdMm",
            self.machine.stroke_width_warning_threshold_mm,
        )?;

        if let Some(wrap) = &self.wrap {
            positive("wrap.diameterMm", wrap.diameter_mm)?;
            positive("wrap.wrapWidthMm", wrap.wrap_width_mm)?;
            finite("wrap.seamXmm", wrap.seam_x_mm)?;
            non_negative("wrap.seamSafeMarginMm", wrap.seam_safe_margin_mm)?;
            non_negative("wrap.microOverlapMm", wrap.micro_overlap_mm)?;
        }

        for (index, object) in self.objects.iter().enumerate() {
            validate_object(index, object)?;
        }

        Ok(())
    }

    /// Build a document from a pre-document single placement payload. The
    /// placement becomes one image slot covering the legacy box.
    pub fn from_legacy(legacy: &LegacyPlacement) -> Self {
        let mut frame = ObjectFrame::new(
            LEGACY_SLOT_ID,
            legacy.offset_x_mm,
            legacy.offset_y_mm,
            legacy.width_mm,
            legacy.height_mm,
        );
        frame.rotation_deg = legacy.rotation_deg;
        frame.anchor = legacy.anchor;

        Self {
            version: 2,
            canvas: Canvas {
                width_mm: legacy.width_mm,
                height_mm: legacy.height_mm,
            },
            machine: MachineSettings::default(),
            wrap: None,
            objects: vec![PlacementObject::Image(ImageObject {
                frame,
                asset_id: None,
                src: None,
                lock_aspect_ratio: true,
                opacity: 1.0,
            })],
        }
    }
}

/// Single-rectangle placement payload that predates versioned documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPlacement {
    pub width_mm: f64,
    pub height_mm: f64,
    pub offset_x_mm: f64,
    pub offset_y_mm: f64,
    pub rotation_deg: f64,
    pub anchor: Anchor,
}

/// Parse either a versioned document or a legacy placement payload.
pub fn parse_placement_document(raw: &Value) -> Result<PlacementDocument, DocumentError> {
    let is_versioned = raw.get("version").is_some() || raw.get("objects").is_some();
    if is_versioned {
        return PlacementDocument::from_value(raw);
    }

    let legacy: LegacyPlacement = serde_json::from_value(raw.clone())?;
    let document = PlacementDocument::from_legacy(&legacy);
    document.validate()?;
    Ok(document)
}

/// Bring a document to the current version.
///
/// Serde has already filled `machine` defaults for v2 input and `wrap` stays
/// absent, so only the version changes. A v3 document comes back untouched,
/// which keeps its fingerprint stable.
pub fn upgrade_to_v3(document: &PlacementDocument) -> PlacementDocument {
    let mut upgraded = document.clone();
    if upgraded.version < CURRENT_VERSION {
        log::debug!("upgrading placement document from v{} to v{}", upgraded.version, CURRENT_VERSION);
        upgraded.version = CURRENT_VERSION;
    }
    upgraded
}

fn normalize_frame_aliases(raw: &Value) -> Value {
    let mut normalized = raw.clone();
    if let Some(objects) = normalized.get_mut("objects").and_then(Value::as_array_mut) {
        for object in objects.iter_mut().filter_map(Value::as_object_mut) {
            for (alias, canonical) in FRAME_ALIASES {
                if object.contains_key(canonical) {
                    continue;
                }
                if let Some(value) = object.remove(alias) {
                    object.insert(canonical.to_string(), value);
                }
            }
        }
    }
    normalized
}

fn validate_object(index: usize, object: &PlacementObject) -> Result<(), DocumentError> {
    let path = |name: &str| format!("objects[{}].{}", index, name);
    let frame = object.frame();

    if frame.id.is_empty() {
        return Err(DocumentError::OutOfRange {
            field: path("id"),
            detail: "must not be empty".to_string(),
        });
    }
    finite(&path("rotationDeg"), frame.rotation_deg)?;
    finite(&path("offsetXMm"), frame.offset_x_mm)?;
    finite(&path("offsetYMm"), frame.offset_y_mm)?;
    positive(&path("boxWidthMm"), frame.box_width_mm)?;
    positive(&path("boxHeightMm"), frame.box_height_mm)?;

    if let Some(typography) = object.typography() {
        if !(100..=900).contains(&typography.font_weight) {
            return Err(DocumentError::OutOfRange {
                field: path("fontWeight"),
                detail: format!("{} is not within 100..=900", typography.font_weight),
            });
        }
        positive(&path("fontSizeMm"), typography.font_size_mm)?;
        positive(&path("lineHeight"), typography.line_height)?;
        finite(&path("letterSpacingMm"), typography.letter_spacing_mm)?;
        non_negative(&path("strokeWidthMm"), typography.stroke_width_mm)?;
    }

    match object {
        PlacementObject::TextArc(o) => {
            positive(&path("arc.radiusMm"), o.arc.radius_mm)?;
            finite(&path("arc.startAngleDeg"), o.arc.start_angle_deg)?;
            finite(&path("arc.endAngleDeg"), o.arc.end_angle_deg)?;
        }
        PlacementObject::Vector(o) => {
            if let Some(meta) = &o.source_meta {
                positive(&path("sourceMeta.toleranceMm"), meta.tolerance_mm)?;
            }
        }
        PlacementObject::Image(o) => {
            finite(&path("opacity"), o.opacity)?;
            if !(0.0..=1.0).contains(&o.opacity) {
                return Err(DocumentError::OutOfRange {
                    field: path("opacity"),
                    detail: format!("{} is not within 0..=1", o.opacity),
                });
            }
        }
        PlacementObject::TextLine(_) | PlacementObject::TextBlock(_) => {}
    }

    Ok(())
}

fn finite(field: &str, value: f64) -> Result<(), DocumentError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DocumentError::NonFinite { field: field.to_string() })
    }
}

fn positive(field: &str, value: f64) -> Result<(), DocumentError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(DocumentError::NonPositive { field: field.to_string(), value })
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), DocumentError> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(DocumentError::OutOfRange {
            field: field.to_string(),
            detail: format!("{} is negative", value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_line_json() -> Value {
        json!({
            "id": "txt-1",
            "kind": "text_line",
            "content": "Hello",
            "fontFamily": "Inter",
            "fontWeight": 400,
            "fontStyle": "normal",
            "fontSizeMm": 4,
            "horizontalAlign": "left",
            "verticalAlign": "top",
            "fillMode": "stroke",
            "strokeWidthMm": 0.08,
            "anchor": "top-left",
            "offsetXMm": 1,
            "offsetYMm": 2,
            "boxWidthMm": 20,
            "boxHeightMm": 5,
            "zIndex": 1
        })
    }

    #[test]
    fn test_parses_text_line_with_defaults() {
        let raw = json!({
            "version": 2,
            "canvas": {"widthMm": 100, "heightMm": 50},
            "objects": [text_line_json()]
        });
        let document = PlacementDocument::from_value(&raw).unwrap();

        assert_eq!(document.machine.stroke_width_warning_threshold_mm, 0.1);
        assert!(document.wrap.is_none());
        let typography = document.objects[0].typography().unwrap();
        assert_eq!(typography.line_height, 1.2);
        assert_eq!(typography.fill_mode, FillMode::Stroke);
        assert_eq!(document.objects[0].frame().box_width_mm, 20.0);
        assert!(!document.objects[0].frame().mirror_x);
    }

    #[test]
    fn test_parses_text_arc() {
        let mut arc = text_line_json();
        arc["kind"] = json!("text_arc");
        arc["arc"] = json!({
            "radiusMm": 20,
            "startAngleDeg": -60,
            "endAngleDeg": 60,
            "direction": "cw",
            "baselineMode": "center"
        });
        let raw = json!({
            "version": 2,
            "canvas": {"widthMm": 60, "heightMm": 40},
            "machine": {"strokeWidthWarningThresholdMm": 0.12},
            "objects": [arc]
        });
        let document = PlacementDocument::from_value(&raw).unwrap();
        match &document.objects[0] {
            PlacementObject::TextArc(o) => assert_eq!(o.arc.seam_wrap_mode, SeamWrapMode::Disallow),
            other => panic!("unexpected kind {}", other.kind()),
        }
    }

    #[test]
    fn test_image_accepts_short_frame_names() {
        let raw = json!({
            "version": 2,
            "canvas": {"widthMm": 100, "heightMm": 80},
            "objects": [{
                "id": "img_1",
                "kind": "image",
                "type": "image",
                "assetId": "asset_1",
                "xMm": 10.01,
                "yMm": 20.02,
                "widthMm": 30.03,
                "heightMm": 15.04,
                "rotationDeg": 5,
                "lockAspectRatio": true,
                "opacity": 0.8
            }]
        });
        let document = PlacementDocument::from_value(&raw).unwrap();
        let frame = document.objects[0].frame();
        assert_eq!(frame.offset_x_mm, 10.01);
        assert_eq!(frame.box_height_mm, 15.04);
        assert_eq!(frame.anchor, Anchor::TopLeft);
    }

    #[test]
    fn test_rejects_non_positive_box() {
        let mut object = text_line_json();
        object["boxWidthMm"] = json!(0);
        let raw = json!({
            "version": 3,
            "canvas": {"widthMm": 100, "heightMm": 50},
            "objects": [object]
        });
        let err = PlacementDocument::from_value(&raw).unwrap_err();
        assert_eq!(err.code(), "NON_POSITIVE_DIMENSION");
        assert!(err.to_string().contains("objects[0].boxWidthMm"));
    }

    #[test]
    fn test_rejects_unknown_version_and_kind() {
        let raw = json!({"version": 7, "canvas": {"widthMm": 10, "heightMm": 10}, "objects": []});
        assert_eq!(PlacementDocument::from_value(&raw).unwrap_err().code(), "UNSUPPORTED_VERSION");

        let raw = json!({
            "version": 3,
            "canvas": {"widthMm": 10, "heightMm": 10},
            "objects": [{"id": "x", "kind": "hologram"}]
        });
        assert_eq!(PlacementDocument::from_value(&raw).unwrap_err().code(), "INVALID_PLACEMENT");
    }

    #[test]
    fn test_rejects_non_finite_typed_input() {
        let mut document = PlacementDocument::default();
        document.canvas.width_mm = f64::NAN;
        assert_eq!(document.validate().unwrap_err().code(), "NON_FINITE_NUMBER");
    }

    #[test]
    fn test_legacy_payload_upgrades() {
        let raw = json!({
            "widthMm": 60,
            "heightMm": 40,
            "offsetXMm": 2,
            "offsetYMm": -1,
            "rotationDeg": 5,
            "anchor": "center"
        });
        let document = parse_placement_document(&raw).unwrap();
        assert_eq!(document.version, 2);
        assert_eq!(document.canvas.width_mm, 60.0);
        assert_eq!(document.objects.len(), 1);

        let object = &document.objects[0];
        assert_eq!(object.kind(), "image");
        let frame = object.frame();
        assert_eq!(frame.id, LEGACY_SLOT_ID);
        assert_eq!((frame.offset_x_mm, frame.offset_y_mm), (2.0, -1.0));
        assert_eq!((frame.box_width_mm, frame.box_height_mm), (60.0, 40.0));
        assert_eq!(frame.rotation_deg, 5.0);
        assert_eq!(frame.anchor, Anchor::Center);
        assert!(!frame.mirror_x && !frame.mirror_y);
        assert_eq!(frame.z_index, 0);

        let upgraded = upgrade_to_v3(&document);
        assert_eq!(upgraded.version, 3);
        assert_eq!(upgraded.canvas, document.canvas);
        assert_eq!(upgraded.objects, document.objects);
    }

    #[test]
    fn test_upgrade_leaves_v3_untouched() {
        let document = PlacementDocument::default();
        assert_eq!(upgrade_to_v3(&document), document);
    }

    #[test]
    fn test_paint_order_ties_break_on_id() {
        let mut document = PlacementDocument::default();
        for (id, z) in [("b", 1), ("a", 1), ("c", 0)] {
            let mut frame = ObjectFrame::new(id, 0.0, 0.0, 1.0, 1.0);
            frame.z_index = z;
            document.objects.push(PlacementObject::Vector(VectorObject {
                frame,
                path_data: "M0 0".to_string(),
                source_text_object_id: None,
                source_meta: None,
            }));
        }
        let ids: Vec<_> = document.paint_order().iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_wrap_field_names_round_trip() {
        let raw = json!({
            "version": 3,
            "canvas": {"widthMm": 100, "heightMm": 50},
            "wrap": {
                "enabled": true,
                "diameterMm": 87,
                "wrapWidthMm": 273.319,
                "seamXmm": 0,
                "seamSafeMarginMm": 3,
                "microOverlapMm": 0.9
            },
            "objects": []
        });
        let document = PlacementDocument::from_value(&raw).unwrap();
        assert!(document.active_wrap().is_some());
        let back = serde_json::to_value(&document).unwrap();
        assert_eq!(back["wrap"]["seamXmm"], json!(0.0));
    }
}
