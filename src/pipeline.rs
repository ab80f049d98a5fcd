//! Placement Pipeline - Single Entry Point
//!
//! CRITICAL: prepare MUST run preflight on every document it accepts.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::canonical::{fingerprint, CanonicalError};
use crate::config::EngineConfig;
use crate::document::{parse_placement_document, upgrade_to_v3, DocumentError, PlacementDocument, PlacementObject};
use crate::images::{build_image_placement_with, ImageInsertError, ImageInsertRequest, ImageSizing};
use crate::policy::{enforce_policy, find_violations, remap_document_to_profile, PolicyMode, RemapResult, Zone};
use crate::preflight::{PreflightResult, Preflighter};
use crate::profiles::{ProductProfile, ProfileStore};
use crate::ENGINE_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static PREFLIGHT_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_preflight_call_count() -> u32 {
    PREFLIGHT_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_preflight_call_count() {
    PREFLIGHT_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Product profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Product profile {0} has no placement zone")]
    MissingZone(String),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Canonical(#[from] CanonicalError),

    #[error(transparent)]
    Image(#[from] ImageInsertError),
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ProfileNotFound(_) => "PROFILE_NOT_FOUND",
            Self::MissingZone(_) => "MISSING_ZONE",
            Self::Document(e) => e.code(),
            Self::Canonical(e) => e.code(),
            Self::Image(e) => e.code(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareRequest {
    pub product_id: String,
    pub document: Value,
    #[serde(default)]
    pub policy: Option<PolicyMode>,
}

/// Outcome of `prepare`. A STRICT rejection is reported here, not as an
/// error; preflight and fingerprint are absent in that case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedPlacement {
    pub product_id: String,
    pub engine_version: String,
    pub document: PlacementDocument,
    pub policy_ok: bool,
    pub policy_violations: Vec<String>,
    pub policy_warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preflight: Option<PreflightResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl PreparedPlacement {
    /// True when the policy accepted the document and preflight found no errors.
    pub fn ok(&self) -> bool {
        self.policy_ok && self.preflight.as_ref().map_or(false, |p| p.ok)
    }
}

/// The placement pipeline - parse, enforce, preflight, fingerprint
pub struct PlacementPipeline<S: ProfileStore> {
    config: EngineConfig,
    store: S,
    preflighter: Preflighter,
}

impl<S: ProfileStore> PlacementPipeline<S> {
    pub fn new(config: EngineConfig, store: S) -> Self {
        let preflighter = Preflighter::with_tolerance(config.wrap_width_tolerance_mm);
        Self {
            config,
            store,
            preflighter,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn list_profiles(&self) -> Vec<&ProductProfile> {
        self.store.list()
    }

    fn profile(&self, id: &str) -> Result<&ProductProfile, PipelineError> {
        self.store
            .get(id)
            .ok_or_else(|| PipelineError::ProfileNotFound(id.to_string()))
    }

    fn zone(profile: &ProductProfile) -> Result<Zone, PipelineError> {
        profile
            .zone
            .ok_or_else(|| PipelineError::MissingZone(profile.id.clone()))
    }

    /// Run preflight against a product
    ///
    /// This is the ONLY preflight entry point.
    pub fn preflight(&self, product_id: &str, document: &PlacementDocument) -> Result<PreflightResult, PipelineError> {
        #[cfg(feature = "test-hooks")]
        PREFLIGHT_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        let profile = self.profile(product_id)?;
        Ok(self.preflighter.run(document, profile))
    }

    /// Prepare a document for production.
    ///
    /// Every document that passes the policy step goes through `preflight`.
    /// Errors are reserved for broken input; a rejected policy is a result.
    pub fn prepare(&self, request: &PrepareRequest) -> Result<PreparedPlacement, PipelineError> {
        let profile = self.profile(&request.product_id)?;
        let document = upgrade_to_v3(&parse_placement_document(&request.document)?);

        let (document, policy_warnings) = match request.policy {
            Some(mode) => {
                let zone = Self::zone(profile)?;
                let result = enforce_policy(&document, &zone, mode);
                if !result.ok {
                    let policy_violations = find_violations(&document, &zone)
                        .into_iter()
                        .map(str::to_string)
                        .collect();
                    log::info!("placement for {} rejected by {} policy", profile.id, mode);
                    return Ok(PreparedPlacement {
                        product_id: profile.id.clone(),
                        engine_version: ENGINE_VERSION.to_string(),
                        document: result.document,
                        policy_ok: false,
                        policy_violations,
                        policy_warnings: result.warnings,
                        preflight: None,
                        fingerprint: None,
                    });
                }
                (result.document, result.warnings)
            }
            None => (document, vec![]),
        };

        let preflight = self.preflight(&request.product_id, &document)?;
        let fingerprint = fingerprint(&document, self.config.rounding_precision_mm)?;
        log::info!(
            "prepared placement for {} (ok={}, fingerprint={})",
            profile.id,
            preflight.ok,
            fingerprint
        );

        Ok(PreparedPlacement {
            product_id: profile.id.clone(),
            engine_version: ENGINE_VERSION.to_string(),
            document,
            policy_ok: true,
            policy_violations: vec![],
            policy_warnings,
            preflight: Some(preflight),
            fingerprint: Some(fingerprint),
        })
    }

    /// Move a document from one product's zone to another's.
    pub fn remap(&self, from_product: &str, to_product: &str, document: &PlacementDocument) -> Result<RemapResult, PipelineError> {
        let from = Self::zone(self.profile(from_product)?)?;
        let to = Self::zone(self.profile(to_product)?)?;
        Ok(remap_document_to_profile(document, &from, &to))
    }

    /// Default image object sized by the configured image settings.
    pub fn insert_image(&self, request: &ImageInsertRequest) -> Result<PlacementObject, PipelineError> {
        let sizing = ImageSizing {
            max_width_mm: self.config.default_image_width_mm,
            canvas_fraction: self.config.default_image_canvas_fraction,
        };
        Ok(build_image_placement_with(request, &sizing)?)
    }
}
