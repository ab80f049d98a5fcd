//! Product Profiles - Zones and Cylinder Data
//!
//! Profiles are owned by the caller's persistence layer; the engine only reads
//! them through `ProfileStore`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::policy::Zone;

pub type ProfileId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductProfile {
    pub id: ProfileId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diameter_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<Zone>,
}

impl ProductProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            diameter_mm: None,
            zone: None,
        }
    }

    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zone = Some(zone);
        self
    }
}

/// Read access to profiles, injected into the pipeline.
pub trait ProfileStore {
    fn get(&self, id: &str) -> Option<&ProductProfile>;
    fn list(&self) -> Vec<&ProductProfile>;
}

/// In-memory profile registry
pub struct ProfileRegistry {
    profiles: BTreeMap<ProfileId, ProductProfile>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self { profiles: BTreeMap::new() }
    }

    pub fn register(&mut self, profile: ProductProfile) {
        self.profiles.insert(profile.id.clone(), profile);
    }

    /// Parse one profile per JSON document and register the valid ones.
    /// Returns the number of documents skipped.
    pub fn register_json<'a, I>(&mut self, documents: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut skipped = 0;
        for content in documents {
            match serde_json::from_str::<ProductProfile>(content) {
                Ok(profile) => self.register(profile),
                Err(e) => {
                    log::warn!("skipping invalid product profile: {}", e);
                    skipped += 1;
                }
            }
        }
        skipped
    }
}

impl ProfileStore for ProfileRegistry {
    fn get(&self, id: &str) -> Option<&ProductProfile> {
        self.profiles.get(id)
    }

    fn list(&self) -> Vec<&ProductProfile> {
        self.profiles.values().collect()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new()
    }
}
