//! Preflight - Rule Checks Before Manufacturing
//!
//! Rules produce structured issues. Errors block production, warnings never do.
//! Every rule runs on every call; issue order follows rule order, then the
//! document's object order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::document::{FillMode, PlacementDocument};
use crate::geometry::{circumference_mm, round_mm3};
use crate::profiles::ProductProfile;

pub const DEFAULT_WRAP_TOLERANCE_MM: f64 = 0.01;

pub const EMPTY_DESIGN: &str = "EMPTY_DESIGN";
pub const WRAP_WIDTH_MISMATCH: &str = "WRAP_WIDTH_MISMATCH";
pub const OBJECT_OUT_OF_BOUNDS: &str = "OBJECT_OUT_OF_BOUNDS";
pub const SEAM_RISK: &str = "SEAM_RISK";
pub const MIN_STROKE_WARNING: &str = "MIN_STROKE_WARNING";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreflightIssue {
    pub code: String,
    pub severity: IssueSeverity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

impl PreflightIssue {
    fn error(code: &str, message: String, object_id: Option<&str>) -> Self {
        Self {
            code: code.to_string(),
            severity: IssueSeverity::Error,
            message,
            object_id: object_id.map(str::to_string),
        }
    }

    fn warning(code: &str, message: String, object_id: Option<&str>) -> Self {
        Self {
            code: code.to_string(),
            severity: IssueSeverity::Warning,
            message,
            object_id: object_id.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreflightMetrics {
    pub wrap_width_mm: f64,
    pub seam_risk_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_stroke_mm_observed: Option<f64>,
    /// Occurrences per issue code.
    pub counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreflightResult {
    pub ok: bool,
    pub product_id: String,
    pub warnings: Vec<PreflightIssue>,
    pub errors: Vec<PreflightIssue>,
    pub metrics: PreflightMetrics,
}

impl PreflightResult {
    pub fn has_code(&self, code: &str) -> bool {
        self.errors.iter().chain(&self.warnings).any(|i| i.code == code)
    }
}

/// Preflight rule trait - produces issues
pub trait PreflightRule {
    fn name(&self) -> &'static str;
    fn check(&self, document: &PlacementDocument) -> Vec<PreflightIssue>;
}

// --- Concrete Rules ---

pub struct EmptyDesignRule;

impl PreflightRule for EmptyDesignRule {
    fn name(&self) -> &'static str { "empty_design" }

    fn check(&self, document: &PlacementDocument) -> Vec<PreflightIssue> {
        if document.objects.is_empty() {
            vec![PreflightIssue::warning(EMPTY_DESIGN, "Design has no objects.".to_string(), None)]
        } else {
            vec![]
        }
    }
}

pub struct WrapWidthRule {
    pub tolerance_mm: f64,
}

impl PreflightRule for WrapWidthRule {
    fn name(&self) -> &'static str { "wrap_width" }

    fn check(&self, document: &PlacementDocument) -> Vec<PreflightIssue> {
        let Some(wrap) = document.active_wrap() else {
            return vec![];
        };

        let expected = circumference_mm(wrap.diameter_mm);
        if (wrap.wrap_width_mm - expected).abs() > self.tolerance_mm {
            vec![PreflightIssue::error(
                WRAP_WIDTH_MISMATCH,
                format!(
                    "wrapWidthMm {} does not match circumference of diameter {} ({}).",
                    wrap.wrap_width_mm, wrap.diameter_mm, expected
                ),
                None,
            )]
        } else {
            vec![]
        }
    }
}

pub struct BoundsRule;

impl PreflightRule for BoundsRule {
    fn name(&self) -> &'static str { "bounds" }

    fn check(&self, document: &PlacementDocument) -> Vec<PreflightIssue> {
        let canvas = &document.canvas;
        document
            .objects
            .iter()
            .filter(|o| o.frame().anchored_rect().exceeds(canvas.width_mm, canvas.height_mm))
            .map(|o| {
                PreflightIssue::error(
                    OBJECT_OUT_OF_BOUNDS,
                    format!("Object {} exceeds canvas bounds.", o.id()),
                    Some(o.id()),
                )
            })
            .collect()
    }
}

pub struct SeamRiskRule;

fn intervals_intersect(a_min: f64, a_max: f64, b_min: f64, b_max: f64) -> bool {
    a_min <= b_max && a_max >= b_min
}

impl PreflightRule for SeamRiskRule {
    fn name(&self) -> &'static str { "seam_risk" }

    fn check(&self, document: &PlacementDocument) -> Vec<PreflightIssue> {
        let Some(wrap) = document.active_wrap() else {
            return vec![];
        };

        // The seam repeats every wrap width on the unrolled surface.
        let seams = [
            wrap.seam_x_mm - wrap.wrap_width_mm,
            wrap.seam_x_mm,
            wrap.seam_x_mm + wrap.wrap_width_mm,
        ];
        let margin = wrap.seam_safe_margin_mm;

        document
            .objects
            .iter()
            .filter(|o| {
                let rect = o.frame().anchored_rect();
                seams
                    .iter()
                    .any(|seam| intervals_intersect(rect.x_mm, rect.right(), seam - margin, seam + margin))
            })
            .map(|o| {
                PreflightIssue::warning(
                    SEAM_RISK,
                    format!("Object {} intersects seam safe margin zone.", o.id()),
                    Some(o.id()),
                )
            })
            .collect()
    }
}

pub struct MinStrokeRule;

impl PreflightRule for MinStrokeRule {
    fn name(&self) -> &'static str { "min_stroke" }

    fn check(&self, document: &PlacementDocument) -> Vec<PreflightIssue> {
        let threshold = document.machine.stroke_width_warning_threshold_mm;
        let mut issues = vec![];

        for object in &document.objects {
            let Some(typography) = object.typography() else {
                continue;
            };
            if typography.fill_mode == FillMode::Stroke && typography.stroke_width_mm < threshold {
                issues.push(PreflightIssue::warning(
                    MIN_STROKE_WARNING,
                    format!(
                        "Object {} stroke width {}mm is below threshold {}mm.",
                        object.id(),
                        typography.stroke_width_mm,
                        threshold
                    ),
                    Some(object.id()),
                ));
            }
        }

        issues
    }
}

/// Preflighter orchestrates rules and builds the result
pub struct Preflighter {
    rules: Vec<Box<dyn PreflightRule>>,
}

impl Preflighter {
    pub fn new() -> Self {
        Self::with_tolerance(DEFAULT_WRAP_TOLERANCE_MM)
    }

    pub fn with_tolerance(wrap_tolerance_mm: f64) -> Self {
        Self {
            rules: vec![
                Box::new(EmptyDesignRule),
                Box::new(WrapWidthRule { tolerance_mm: wrap_tolerance_mm }),
                Box::new(BoundsRule),
                Box::new(SeamRiskRule),
                Box::new(MinStrokeRule),
            ],
        }
    }

    pub fn with_rules(rules: Vec<Box<dyn PreflightRule>>) -> Self {
        Self { rules }
    }

    pub fn run(&self, document: &PlacementDocument, product: &ProductProfile) -> PreflightResult {
        let mut errors = vec![];
        let mut warnings = vec![];
        let mut counts = BTreeMap::new();

        for rule in &self.rules {
            let issues = rule.check(document);
            log::trace!("rule {} produced {} issue(s)", rule.name(), issues.len());
            for issue in issues {
                *counts.entry(issue.code.clone()).or_insert(0) += 1;
                match issue.severity {
                    IssueSeverity::Error => errors.push(issue),
                    IssueSeverity::Warning => warnings.push(issue),
                }
            }
        }

        let seam_risk_count = counts.get(SEAM_RISK).copied().unwrap_or(0);
        let wrap_width_mm = document
            .wrap
            .as_ref()
            .map_or(document.canvas.width_mm, |w| w.wrap_width_mm);
        let min_stroke_mm_observed = document
            .objects
            .iter()
            .filter_map(|o| o.typography())
            .filter(|t| t.fill_mode == FillMode::Stroke)
            .map(|t| t.stroke_width_mm)
            .reduce(f64::min)
            .map(round_mm3);

        if !errors.is_empty() {
            log::warn!(
                "preflight for product {} found {} error(s): {}",
                product.id,
                errors.len(),
                errors.iter().map(|e: &PreflightIssue| e.code.as_str()).collect::<Vec<_>>().join(", ")
            );
        }
        log::debug!("preflight for product {}: {} warning(s)", product.id, warnings.len());

        PreflightResult {
            ok: errors.is_empty(),
            product_id: product.id.clone(),
            warnings,
            errors,
            metrics: PreflightMetrics {
                wrap_width_mm: round_mm3(wrap_width_mm),
                seam_risk_count,
                min_stroke_mm_observed,
                counts,
            },
        }
    }
}

impl Default for Preflighter {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the default rule set.
pub fn run_preflight(document: &PlacementDocument, product: &ProductProfile) -> PreflightResult {
    Preflighter::new().run(document, product)
}
