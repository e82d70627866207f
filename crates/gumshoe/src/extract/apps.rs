//! Installed application metadata, one document per bundle or container.

use serde::Serialize;
use serde_json::Value;

use super::field;
use crate::{AppSource, ArtifactRecord, ArtifactTable, ExtractionError};

pub const HEADERS: &[&str] = &["App Name", "App Version", "App Bundle ID"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledApp {
    pub source: AppSource,
    /// Directory entry the document was fetched for.
    pub identifier: String,
    pub name: String,
    pub version: String,
    pub bundle_id: String,
}

pub fn extract(
    source: AppSource,
    identifier: &str,
    doc: &Value,
) -> Result<InstalledApp, ExtractionError> {
    if !doc.is_object() {
        return Err(ExtractionError::StructuralMismatch {
            artifact: source.artifact(),
            expected: "top-level dictionary",
        });
    }
    Ok(InstalledApp {
        source,
        identifier: identifier.to_string(),
        name: field(doc, &[source.name_key()]),
        version: field(doc, &[source.version_key()]),
        bundle_id: field(doc, &[source.bundle_id_key()]),
    })
}

impl From<InstalledApp> for ArtifactRecord {
    fn from(app: InstalledApp) -> Self {
        ArtifactRecord::new([app.name, app.version, app.bundle_id])
    }
}

pub fn caption(source: AppSource) -> &'static str {
    source.artifact().title()
}

pub fn table(source: AppSource, apps: Vec<InstalledApp>) -> ArtifactTable {
    ArtifactTable::new(
        caption(source),
        HEADERS,
        apps.into_iter().map(Into::into).collect(),
    )
}
