//! Identifiers cached by the identity services daemon.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::{ArtifactRecord, ArtifactTable, ArtifactType, ExtractionError};

pub const HEADERS: &[&str] = &["Number", "ID"];

/// Identity-cache record families, in match precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityCategory {
    ICloudPairing,
    FindMyDevice,
    CloudMessaging,
    Nearby,
}

impl IdentityCategory {
    pub const PRECEDENCE: [IdentityCategory; 4] = [
        IdentityCategory::ICloudPairing,
        IdentityCategory::FindMyDevice,
        IdentityCategory::CloudMessaging,
        IdentityCategory::Nearby,
    ];

    /// Substring that marks a record key as belonging to this category.
    pub fn tag(&self) -> &'static str {
        match self {
            IdentityCategory::ICloudPairing => "icloudpairing",
            IdentityCategory::FindMyDevice => "fmd",
            IdentityCategory::CloudMessaging => "cloudmessaging",
            IdentityCategory::Nearby => "nearby",
        }
    }

    pub fn caption(&self) -> &'static str {
        match self {
            IdentityCategory::ICloudPairing => "User Apple ID",
            IdentityCategory::FindMyDevice => "User family member IDs",
            IdentityCategory::CloudMessaging => "User messaging IDs",
            IdentityCategory::Nearby => "User nearby IDs",
        }
    }

    /// First category (by precedence) whose tag occurs in `key`.
    pub fn classify(key: &str) -> Option<IdentityCategory> {
        Self::PRECEDENCE
            .into_iter()
            .find(|category| key.contains(category.tag()))
    }
}

impl fmt::Display for IdentityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdentityCache {
    pub icloud_pairing: Vec<String>,
    pub find_my_device: Vec<String>,
    pub cloud_messaging: Vec<String>,
    pub nearby: Vec<String>,
}

impl IdentityCache {
    pub fn ids(&self, category: IdentityCategory) -> &[String] {
        match category {
            IdentityCategory::ICloudPairing => &self.icloud_pairing,
            IdentityCategory::FindMyDevice => &self.find_my_device,
            IdentityCategory::CloudMessaging => &self.cloud_messaging,
            IdentityCategory::Nearby => &self.nearby,
        }
    }

    fn ids_mut(&mut self, category: IdentityCategory) -> &mut Vec<String> {
        match category {
            IdentityCategory::ICloudPairing => &mut self.icloud_pairing,
            IdentityCategory::FindMyDevice => &mut self.find_my_device,
            IdentityCategory::CloudMessaging => &mut self.cloud_messaging,
            IdentityCategory::Nearby => &mut self.nearby,
        }
    }

    /// One numbered table per category, always all four.
    pub fn tables(&self) -> Vec<ArtifactTable> {
        IdentityCategory::PRECEDENCE
            .into_iter()
            .map(|category| {
                let records = self
                    .ids(category)
                    .iter()
                    .enumerate()
                    .map(|(idx, id)| ArtifactRecord::new([(idx + 1).to_string(), id.clone()]))
                    .collect();
                ArtifactTable::new(category.caption(), HEADERS, records)
            })
            .collect()
    }
}

/// Groups the nested key sets of every classified top-level record.
///
/// Records whose value is not an object (an empty dictionary renders as a dropped value that
/// repair turns into `""`) contribute nothing.
pub fn extract(doc: &Value) -> Result<IdentityCache, ExtractionError> {
    let records = doc
        .as_object()
        .ok_or(ExtractionError::StructuralMismatch {
            artifact: ArtifactType::IdentityCache,
            expected: "top-level dictionary",
        })?;

    let mut cache = IdentityCache::default();
    for (key, record) in records {
        let Some(category) = IdentityCategory::classify(key) else {
            continue;
        };
        // Every record of a category contributes; a later key never replaces an earlier one.
        if let Some(ids) = record.as_object() {
            cache.ids_mut(category).extend(ids.keys().cloned());
        }
    }
    Ok(cache)
}
