use std::{fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;

use crate::paths;

/// Display value for any field the device did not report.
pub const NOT_AVAILABLE: &str = "Not Available";

/// Forensic data category; selects the repair policy and the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactType {
    WifiHistory,
    IdentityCache,
    LocationHistory,
    InstalledAppsApple,
    InstalledAppsUser,
    TrustPeers,
}

impl ArtifactType {
    pub const ALL: [ArtifactType; 6] = [
        ArtifactType::WifiHistory,
        ArtifactType::IdentityCache,
        ArtifactType::LocationHistory,
        ArtifactType::InstalledAppsApple,
        ArtifactType::InstalledAppsUser,
        ArtifactType::TrustPeers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::WifiHistory => "wifi-history",
            ArtifactType::IdentityCache => "identity-cache",
            ArtifactType::LocationHistory => "location-history",
            ArtifactType::InstalledAppsApple => "installed-apps-apple",
            ArtifactType::InstalledAppsUser => "installed-apps-user",
            ArtifactType::TrustPeers => "trust-peers",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ArtifactType::WifiHistory => "User Wifi information",
            ArtifactType::IdentityCache => "User ID information",
            ArtifactType::LocationHistory => "User Location History",
            ArtifactType::InstalledAppsApple => "Apple Internal Applications",
            ArtifactType::InstalledAppsUser => "User Installed Applications",
            ArtifactType::TrustPeers => "Keychain Trusted Peers",
        }
    }

    /// Only the trust utility emits well-formed JSON; every plist rendering needs repair.
    pub fn requires_repair(&self) -> bool {
        !matches!(self, ArtifactType::TrustPeers)
    }

    /// Property list read for this artifact, if it comes from a single fixed file.
    pub fn source_path(&self) -> Option<&'static str> {
        match self {
            ArtifactType::WifiHistory => Some(paths::WIFI_SYNC_STATE),
            ArtifactType::IdentityCache => Some(paths::IDENTITY_CACHE),
            ArtifactType::LocationHistory => Some(paths::LOCATION_CACHE),
            ArtifactType::InstalledAppsApple
            | ArtifactType::InstalledAppsUser
            | ArtifactType::TrustPeers => None,
        }
    }

    pub fn app_source(&self) -> Option<AppSource> {
        match self {
            ArtifactType::InstalledAppsApple => Some(AppSource::System),
            ArtifactType::InstalledAppsUser => Some(AppSource::User),
            _ => None,
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown artifact type `{0}` (expected one of: wifi-history, identity-cache, location-history, installed-apps-apple, installed-apps-user, trust-peers)")]
pub struct UnknownArtifactType(pub String);

impl FromStr for ArtifactType {
    type Err = UnknownArtifactType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        ArtifactType::ALL
            .into_iter()
            .find(|artifact| artifact.as_str() == wanted)
            .ok_or_else(|| UnknownArtifactType(s.to_string()))
    }
}

/// Where installed applications are discovered, and how their metadata keys are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppSource {
    /// Bundles under `/Applications`, described by `Info.plist`.
    System,
    /// App Store containers, described by `iTunesMetadata.plist`.
    User,
}

impl AppSource {
    pub fn artifact(&self) -> ArtifactType {
        match self {
            AppSource::System => ArtifactType::InstalledAppsApple,
            AppSource::User => ArtifactType::InstalledAppsUser,
        }
    }

    pub fn listing_dir(&self) -> &'static str {
        match self {
            AppSource::System => paths::SYSTEM_APPS_DIR,
            AppSource::User => paths::USER_APPS_DIR,
        }
    }

    pub fn document_path(&self, identifier: &str) -> String {
        match self {
            AppSource::System => paths::fill_template(
                paths::SYSTEM_APP_INFO,
                paths::SYSTEM_APP_PLACEHOLDER,
                identifier,
            ),
            AppSource::User => paths::fill_template(
                paths::USER_APP_METADATA,
                paths::USER_APP_PLACEHOLDER,
                identifier,
            ),
        }
    }

    pub(crate) fn name_key(&self) -> &'static str {
        match self {
            AppSource::System => "CFBundleName",
            AppSource::User => "itemName",
        }
    }

    pub(crate) fn version_key(&self) -> &'static str {
        match self {
            AppSource::System => "CFBundleVersion",
            AppSource::User => "bundleVersion",
        }
    }

    pub(crate) fn bundle_id_key(&self) -> &'static str {
        match self {
            AppSource::System => "CFBundleIdentifier",
            AppSource::User => "softwareVersionBundleId",
        }
    }
}

/// One normalized output row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArtifactRecord(Vec<String>);

impl ArtifactRecord {
    pub fn new(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(fields.into_iter().map(Into::into).collect())
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactTable {
    pub caption: &'static str,
    pub headers: &'static [&'static str],
    pub records: Vec<ArtifactRecord>,
}

impl ArtifactTable {
    pub fn new(
        caption: &'static str,
        headers: &'static [&'static str],
        records: Vec<ArtifactRecord>,
    ) -> Self {
        debug_assert!(records.iter().all(|r| r.len() == headers.len()));
        Self {
            caption,
            headers,
            records,
        }
    }
}

/// A non-fatal anomaly absorbed during collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactReport {
    pub artifact: ArtifactType,
    pub tables: Vec<ArtifactTable>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ArtifactReport {
    pub fn new(artifact: ArtifactType, tables: Vec<ArtifactTable>) -> Self {
        Self {
            artifact,
            tables,
            diagnostics: Vec::new(),
        }
    }

    /// Every row of every table, in table order.
    pub fn records(&self) -> impl Iterator<Item = &ArtifactRecord> {
        self.tables.iter().flat_map(|table| table.records.iter())
    }

    pub fn table(&self, caption: &str) -> Option<&ArtifactTable> {
        self.tables.iter().find(|table| table.caption == caption)
    }
}
