//! Placement Policy - Zone Enforcement and Remapping
//!
//! Policies decide what happens to objects whose box leaves the target zone.
//! Boxes are `offset..offset+size` on each axis; rotation and anchor are not
//! considered here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::document::{ObjectFrame, PlacementDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyMode {
    /// Reject the document if any object leaves the zone.
    Strict,
    /// Translate offending objects back inside the zone.
    Clamp,
    /// Shrink offending objects to fit, then translate them inside.
    ScaleToFit,
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Strict => "STRICT",
            Self::Clamp => "CLAMP",
            Self::ScaleToFit => "SCALE_TO_FIT",
        };
        f.write_str(name)
    }
}

impl FromStr for PolicyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "STRICT" => Ok(Self::Strict),
            "CLAMP" => Ok(Self::Clamp),
            "SCALE_TO_FIT" => Ok(Self::ScaleToFit),
            other => Err(format!("Unknown policy mode: {}", other)),
        }
    }
}

/// Target safe area, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl Zone {
    pub fn new(width_mm: f64, height_mm: f64) -> Self {
        Self { width_mm, height_mm }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyResult {
    pub ok: bool,
    pub document: PlacementDocument,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemapResult {
    pub document: PlacementDocument,
    pub warnings: Vec<String>,
}

fn violates(frame: &ObjectFrame, zone: &Zone) -> bool {
    let left = frame.offset_x_mm;
    let right = left + frame.box_width_mm;
    let top = frame.offset_y_mm;
    let bottom = top + frame.box_height_mm;
    left < 0.0 || right > zone.width_mm || top < 0.0 || bottom > zone.height_mm
}

/// Ids of objects whose box leaves the zone, in document order.
pub fn find_violations<'a>(document: &'a PlacementDocument, zone: &Zone) -> Vec<&'a str> {
    document
        .objects
        .iter()
        .filter(|o| violates(o.frame(), zone))
        .map(|o| o.id())
        .collect()
}

/// Shift the box inside the zone without resizing it: right edge first, then
/// left; bottom edge first, then top.
fn clamp_translate(frame: &mut ObjectFrame, zone: &Zone) {
    let right = frame.offset_x_mm + frame.box_width_mm;
    if right > zone.width_mm {
        frame.offset_x_mm -= right - zone.width_mm;
    }
    if frame.offset_x_mm < 0.0 {
        frame.offset_x_mm = 0.0;
    }

    let bottom = frame.offset_y_mm + frame.box_height_mm;
    if bottom > zone.height_mm {
        frame.offset_y_mm -= bottom - zone.height_mm;
    }
    if frame.offset_y_mm < 0.0 {
        frame.offset_y_mm = 0.0;
    }
}

/// Apply a policy mode against a zone. The input is never modified.
pub fn enforce_policy(document: &PlacementDocument, zone: &Zone, mode: PolicyMode) -> PolicyResult {
    if mode == PolicyMode::Strict {
        let violations = find_violations(document, zone);
        if !violations.is_empty() {
            log::warn!("STRICT policy rejected objects outside zone: {}", violations.join(", "));
        }
        return PolicyResult {
            ok: violations.is_empty(),
            document: document.clone(),
            warnings: vec![],
        };
    }

    let mut adjusted = document.clone();
    let mut warnings = vec![];

    for object in adjusted.objects.iter_mut() {
        let frame = object.frame_mut();
        if !violates(frame, zone) {
            continue;
        }

        if mode == PolicyMode::ScaleToFit {
            let factor = (zone.width_mm / frame.box_width_mm)
                .min(zone.height_mm / frame.box_height_mm)
                .min(1.0);
            frame.box_width_mm *= factor;
            frame.box_height_mm *= factor;
            clamp_translate(frame, zone);
            // Emitted even when factor is 1 and only the position moved.
            warnings.push(format!("Scaled object {} by {:.3}", frame.id, factor));
        } else {
            clamp_translate(frame, zone);
            warnings.push(format!("Clamped object {}", frame.id));
        }
    }

    if !warnings.is_empty() {
        log::warn!("{} policy adjusted {} object(s)", mode, warnings.len());
    }

    PolicyResult {
        ok: true,
        document: adjusted,
        warnings,
    }
}

/// Rescale every object from one zone size to another, each axis on its own.
/// No clamping is performed.
pub fn remap_document_to_profile(document: &PlacementDocument, from: &Zone, to: &Zone) -> RemapResult {
    let fx = to.width_mm / from.width_mm;
    let fy = to.height_mm / from.height_mm;

    let mut remapped = document.clone();
    for object in remapped.objects.iter_mut() {
        let frame = object.frame_mut();
        frame.offset_x_mm *= fx;
        frame.box_width_mm *= fx;
        frame.offset_y_mm *= fy;
        frame.box_height_mm *= fy;
    }
    log::debug!("remapped {} object(s) by {}x{}", remapped.objects.len(), fx, fy);

    RemapResult {
        document: remapped,
        warnings: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ImageObject, PlacementObject};

    fn image(id: &str, x: f64, y: f64, w: f64, h: f64) -> PlacementObject {
        PlacementObject::Image(ImageObject {
            frame: ObjectFrame::new(id, x, y, w, h),
            asset_id: Some("asset".to_string()),
            src: None,
            lock_aspect_ratio: true,
            opacity: 1.0,
        })
    }

    fn doc(objects: Vec<PlacementObject>) -> PlacementDocument {
        PlacementDocument {
            objects,
            ..PlacementDocument::default()
        }
    }

    fn zone() -> Zone {
        Zone::new(100.0, 100.0)
    }

    #[test]
    fn test_strict_rejects_and_returns_input() {
        let input = doc(vec![image("o1", 95.0, 0.0, 10.0, 10.0)]);
        let result = enforce_policy(&input, &zone(), PolicyMode::Strict);
        assert!(!result.ok);
        assert_eq!(result.document, input);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_strict_accepts_fitting_document() {
        let input = doc(vec![image("o1", 0.0, 0.0, 100.0, 100.0)]);
        assert!(enforce_policy(&input, &zone(), PolicyMode::Strict).ok);
    }

    #[test]
    fn test_clamp_translates_without_resizing() {
        let input = doc(vec![image("o1", 95.0, 0.0, 10.0, 10.0)]);
        let result = enforce_policy(&input, &zone(), PolicyMode::Clamp);
        assert!(result.ok);
        let frame = result.document.objects[0].frame();
        assert_eq!(frame.offset_x_mm, 90.0);
        assert_eq!(frame.box_width_mm, 10.0);
        assert_eq!(result.warnings, vec!["Clamped object o1".to_string()]);
        assert_eq!(input.objects[0].frame().offset_x_mm, 95.0);
    }

    #[test]
    fn test_clamp_oversized_pins_left_edge() {
        let input = doc(vec![image("wide", -5.0, 95.0, 150.0, 10.0)]);
        let result = enforce_policy(&input, &zone(), PolicyMode::Clamp);
        let frame = result.document.objects[0].frame();
        assert_eq!(frame.offset_x_mm, 0.0);
        assert_eq!(frame.offset_y_mm, 90.0);
        assert_eq!(frame.box_width_mm, 150.0);
    }

    #[test]
    fn test_scale_to_fit_reports_even_at_unit_factor() {
        let input = doc(vec![image("o1", 95.0, 0.0, 10.0, 10.0)]);
        let result = enforce_policy(&input, &zone(), PolicyMode::ScaleToFit);
        assert!(result.ok);
        let frame = result.document.objects[0].frame();
        assert_eq!(frame.box_width_mm, 10.0);
        assert_eq!(frame.offset_x_mm, 90.0);
        assert!(result.warnings[0].contains("Scaled"));
        assert!(result.warnings[0].contains("o1"));
    }

    #[test]
    fn test_scale_to_fit_shrinks_oversized() {
        let input = doc(vec![image("big", 10.0, 10.0, 200.0, 50.0)]);
        let result = enforce_policy(&input, &zone(), PolicyMode::ScaleToFit);
        let frame = result.document.objects[0].frame();
        assert_eq!(frame.box_width_mm, 100.0);
        assert_eq!(frame.box_height_mm, 25.0);
        assert_eq!(frame.offset_x_mm, 0.0);
        assert_eq!(frame.offset_y_mm, 10.0);
        assert_eq!(result.warnings, vec!["Scaled object big by 0.500".to_string()]);
    }

    #[test]
    fn test_only_violating_objects_are_touched() {
        let input = doc(vec![
            image("inside", 1.0, 1.0, 10.0, 10.0),
            image("outside", 1.0, -3.0, 10.0, 10.0),
        ]);
        let result = enforce_policy(&input, &zone(), PolicyMode::Clamp);
        assert_eq!(result.document.objects[0], input.objects[0]);
        assert_eq!(result.document.objects[1].frame().offset_y_mm, 0.0);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(find_violations(&input, &zone()), vec!["outside"]);
    }

    #[test]
    fn test_warnings_follow_document_order() {
        let input = doc(vec![
            image("z", 95.0, 0.0, 10.0, 10.0),
            image("a", -2.0, 0.0, 10.0, 10.0),
        ]);
        let result = enforce_policy(&input, &zone(), PolicyMode::Clamp);
        assert_eq!(
            result.warnings,
            vec!["Clamped object z".to_string(), "Clamped object a".to_string()]
        );
        assert_eq!(find_violations(&input, &zone()), vec!["z", "a"]);
    }

    #[test]
    fn test_remap_scales_each_axis() {
        let input = doc(vec![image("a", 10.0, 5.0, 20.0, 10.0)]);
        let result = remap_document_to_profile(&input, &Zone::new(100.0, 50.0), &Zone::new(200.0, 100.0));
        let frame = result.document.objects[0].frame();
        assert_eq!(frame.offset_x_mm, 20.0);
        assert_eq!(frame.box_width_mm, 40.0);
        assert_eq!(frame.offset_y_mm, 10.0);
        assert_eq!(frame.box_height_mm, 20.0);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_remap_is_not_uniform() {
        let input = doc(vec![image("a", 10.0, 10.0, 10.0, 10.0)]);
        let result = remap_document_to_profile(&input, &Zone::new(100.0, 100.0), &Zone::new(200.0, 50.0));
        let frame = result.document.objects[0].frame();
        assert_eq!(frame.box_width_mm, 20.0);
        assert_eq!(frame.box_height_mm, 5.0);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("scale-to-fit".parse::<PolicyMode>().unwrap(), PolicyMode::ScaleToFit);
        assert_eq!("STRICT".parse::<PolicyMode>().unwrap(), PolicyMode::Strict);
        assert!("loose".parse::<PolicyMode>().is_err());
        assert_eq!(serde_json::to_string(&PolicyMode::ScaleToFit).unwrap(), "\"SCALE_TO_FIT\"");
    }
}
