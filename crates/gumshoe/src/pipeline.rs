use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    extract::{apps, device_info, identity, location, trust, wifi},
    repair, AppSource, ArtifactReport, ArtifactTable, ArtifactType, DeviceInfo, Diagnostic,
    ExtractionError,
};

const EXCERPT_CHARS: usize = 160;

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

/// Applies the repair policy for `artifact`, then parses.
pub fn parse_document(artifact: ArtifactType, text: &str) -> Result<Value, ExtractionError> {
    if !artifact.requires_repair() {
        return serde_json::from_str(text).map_err(|source| ExtractionError::InvalidJson {
            artifact,
            excerpt: excerpt(text),
            source,
        });
    }

    let repaired = repair::repair_text(text);
    if repaired.rewrites > 0 {
        debug!(%artifact, rewrites = repaired.rewrites, "repaired plist JSON");
    }
    serde_json::from_str(&repaired.text).map_err(|source| ExtractionError::RepairIneffective {
        artifact,
        excerpt: excerpt(&repaired.text),
        source,
    })
}

/// Turns one captured command output into normalized tables.
///
/// For the installed-app artifacts `raw` is a single app's metadata document; use
/// [`collect_installed_apps`] for a whole listing.
pub fn collect(artifact: ArtifactType, raw: &str) -> Result<ArtifactReport, ExtractionError> {
    let doc = parse_document(artifact, raw)?;
    let tables = match artifact {
        ArtifactType::WifiHistory => vec![wifi::table(wifi::extract(&doc)?)],
        ArtifactType::IdentityCache => identity::extract(&doc)?.tables(),
        ArtifactType::LocationHistory => vec![location::table(location::extract(&doc)?)],
        ArtifactType::InstalledAppsApple => single_app(AppSource::System, &doc)?,
        ArtifactType::InstalledAppsUser => single_app(AppSource::User, &doc)?,
        ArtifactType::TrustPeers => trust::extract(&doc)?.tables(),
    };
    Ok(ArtifactReport::new(artifact, tables))
}

fn single_app(source: AppSource, doc: &Value) -> Result<Vec<ArtifactTable>, ExtractionError> {
    let app = apps::extract(source, "", doc)?;
    Ok(vec![apps::table(source, vec![app])])
}

/// Captured output of one remote fetch, or why the fetch failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub identifier: String,
    pub text: Result<String, String>,
}

impl FetchedDocument {
    pub fn ok(identifier: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            text: Ok(text.into()),
        }
    }

    pub fn failed(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            text: Err(reason.into()),
        }
    }
}

/// Second phase of installed-app collection: one metadata document per listed identifier.
///
/// A document that failed to fetch, repair, parse, or extract is skipped with a diagnostic;
/// the rest still produce rows, in input order.
pub fn collect_installed_apps(
    source: AppSource,
    documents: impl IntoIterator<Item = FetchedDocument>,
) -> ArtifactReport {
    let artifact = source.artifact();
    let mut installed = Vec::new();
    let mut diagnostics = Vec::new();

    for document in documents {
        let FetchedDocument { identifier, text } = document;
        let outcome = text.and_then(|raw| {
            parse_document(artifact, &raw)
                .and_then(|doc| apps::extract(source, &identifier, &doc))
                .map_err(|err| err.to_string())
        });
        match outcome {
            Ok(app) => installed.push(app),
            Err(message) => {
                warn!(%artifact, %identifier, %message, "skipping app metadata");
                diagnostics.push(Diagnostic::new(identifier, message));
            }
        }
    }

    ArtifactReport {
        artifact,
        tables: vec![apps::table(source, installed)],
        diagnostics,
    }
}

/// Raw inputs for [`collect_device_info`]; each is fetched independently.
#[derive(Debug, Clone)]
pub struct DeviceDocuments {
    /// `otctl status -j`
    pub trust_status: FetchedDocument,
    pub system_version: FetchedDocument,
    pub tv_settings: FetchedDocument,
    pub app_store: FetchedDocument,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceReport {
    pub info: DeviceInfo,
    pub diagnostics: Vec<Diagnostic>,
}

impl DeviceReport {
    pub fn table(&self) -> ArtifactTable {
        self.info.table()
    }
}

fn lookup_field(
    label: &str,
    document: &FetchedDocument,
    parse: impl FnOnce(&str) -> Result<Value, String>,
    read: impl FnOnce(&Value) -> Option<String>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<String> {
    let outcome = match &document.text {
        Err(reason) => Err(reason.clone()),
        Ok(raw) => parse(raw)
            .and_then(|doc| read(&doc).ok_or_else(|| "field not reported".to_string())),
    };
    match outcome {
        Ok(value) => Some(value),
        Err(message) => {
            warn!(
                field = label,
                document = %document.identifier,
                %message,
                "device info unavailable"
            );
            diagnostics.push(Diagnostic::new(
                label,
                format!("{}: {message}", document.identifier),
            ));
            None
        }
    }
}

/// Builds the device summary; every field falls back to the sentinel on its own.
pub fn collect_device_info(documents: DeviceDocuments) -> DeviceReport {
    let plist = |raw: &str| {
        serde_json::from_str::<Value>(&repair::repair(raw))
            .map_err(|err| format!("not valid JSON after repair: {err}"))
    };
    let trust_json = |raw: &str| {
        serde_json::from_str::<Value>(raw).map_err(|err| format!("not valid JSON: {err}"))
    };

    let mut diagnostics = Vec::new();
    let mut info = DeviceInfo::default();

    if let Some(serial) = lookup_field(
        "Serial Number",
        &documents.trust_status,
        trust_json,
        trust::serial_number,
        &mut diagnostics,
    ) {
        info.serial_number = serial;
    }
    if let Some(model) = lookup_field(
        "HW Model",
        &documents.tv_settings,
        plist,
        device_info::hardware_model,
        &mut diagnostics,
    ) {
        info.hardware_model = model;
    }
    if let Some(version) = lookup_field(
        "OS Version",
        &documents.system_version,
        plist,
        device_info::os_version,
        &mut diagnostics,
    ) {
        info.os_version = version;
    }
    if let Some(build) = lookup_field(
        "OS Build",
        &documents.system_version,
        plist,
        device_info::os_build,
        &mut diagnostics,
    ) {
        info.os_build = build;
    }
    if let Some(id) = lookup_field(
        "Device ID",
        &documents.app_store,
        plist,
        device_info::device_id,
        &mut diagnostics,
    ) {
        info.device_id = id;
    }

    DeviceReport { info, diagnostics }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_truncates_on_char_boundary() {
        let long = "é".repeat(EXCERPT_CHARS + 10);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), EXCERPT_CHARS + 1);
        assert!(cut.ends_with('…'));
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn trust_peers_are_never_repaired() {
        let err = parse_document(ArtifactType::TrustPeers, r#"{"a":,"b":1}"#).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidJson { .. }));
        assert!(parse_document(ArtifactType::WifiHistory, r#"{"a":,"b":1}"#).is_ok());
    }

    #[test]
    fn unrepairable_text_reports_artifact_and_excerpt() {
        let err =
            parse_document(ArtifactType::LocationHistory, "plutil: file not found").unwrap_err();
        match err {
            ExtractionError::RepairIneffective {
                artifact, excerpt, ..
            } => {
                assert_eq!(artifact, ArtifactType::LocationHistory);
                assert_eq!(excerpt, "plutil: file not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn single_app_document_through_collect() {
        let report = collect(
            ArtifactType::InstalledAppsUser,
            r#"{"itemName":"Infuse","bundleVersion":"7.5","softwareVersionBundleId":"com.firecore.infuse","genres":[,]}"#,
        )
        .unwrap();
        let rows: Vec<_> = report.records().map(|r| r.fields().to_vec()).collect();
        assert_eq!(rows, vec![vec!["Infuse", "7.5", "com.firecore.infuse"]]);
    }
}
