//! WrapForge Core - Placement Validation Engine
//!
//! # Guarantees
//! 1. Inputs Are Never Mutated
//! 2. Identical Input, Identical Output
//! 3. Findings Are Data, Contract Breaches Are Errors
//! 4. Fingerprints Ignore Harmless Reordering
//! 5. Preflight Always Runs Every Check

pub mod geometry;
pub mod document;
pub mod canonical;
pub mod compare;
pub mod policy;
pub mod preflight;
pub mod images;
pub mod profiles;
pub mod config;
pub mod pipeline;

pub use geometry::{circumference_mm, degrees_to_mm, diameter_to_wrap_width_mm, mm_to_degrees, round_mm};
pub use document::{parse_placement_document, upgrade_to_v3, DocumentError, PlacementDocument, PlacementObject};
pub use canonical::{canonical_serialize, canonicalize, fingerprint, CanonicalError};
pub use compare::{are_placements_equal, stable_placement_string};
pub use policy::{enforce_policy, remap_document_to_profile, PolicyMode, PolicyResult, Zone};
pub use preflight::{run_preflight, PreflightIssue, PreflightResult, PreflightRule};
pub use images::{build_default_image_placement, ImageInsertError, ImageInsertRequest};
pub use profiles::{ProductProfile, ProfileRegistry, ProfileStore};
pub use config::{ConfigError, EngineConfig};
pub use pipeline::{PlacementPipeline, PipelineError, PrepareRequest, PreparedPlacement};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
