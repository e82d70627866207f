//! Known networks from the Wi-Fi sync-state plist.

use serde::Serialize;
use serde_json::Value;

use super::{device_time, display, field, lookup, required_object};
use crate::{ArtifactRecord, ArtifactTable, ArtifactType, ExtractionError};

pub const HEADERS: &[&str] = &["SSID", "ADDED BY", "OS VERSION", "ADDED AT (UTC)"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WifiNetwork {
    pub ssid: String,
    pub added_by: String,
    pub os_version: String,
    pub added_at: String,
}

/// Reads `values.<ssid>.value.{added_by, added_by_os_ver, added_at}`.
///
/// When `added_at` is absent the entry-level `timestamp` is converted instead.
pub fn extract(doc: &Value) -> Result<Vec<WifiNetwork>, ExtractionError> {
    let values = required_object(doc.get("values"), ArtifactType::WifiHistory, "values")?;
    Ok(values
        .iter()
        .map(|(ssid, entry)| WifiNetwork {
            ssid: ssid.clone(),
            added_by: field(entry, &["value", "added_by"]),
            os_version: field(entry, &["value", "added_by_os_ver"]),
            added_at: match lookup(entry, &["value", "added_at"]) {
                Some(value) if !value.is_null() => display(Some(value)),
                _ => device_time(entry.get("timestamp")),
            },
        })
        .collect())
}

impl From<WifiNetwork> for ArtifactRecord {
    fn from(network: WifiNetwork) -> Self {
        ArtifactRecord::new([
            network.ssid,
            network.added_by,
            network.os_version,
            network.added_at,
        ])
    }
}

pub fn table(networks: Vec<WifiNetwork>) -> ArtifactTable {
    ArtifactTable::new(
        "Known Wi-Fi networks",
        HEADERS,
        networks.into_iter().map(Into::into).collect(),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::NOT_AVAILABLE;

    #[test]
    fn explicit_added_at_wins_over_timestamp() {
        let doc = json!({"values": {"Cafe": {
            "value": {"added_by": "AppleTV", "added_at": "2022-03-01"},
            "timestamp": 0
        }}});
        let networks = extract(&doc).unwrap();
        assert_eq!(networks[0].added_at, "2022-03-01");
        assert_eq!(networks[0].os_version, NOT_AVAILABLE);
    }

    #[test]
    fn entries_without_value_resolve_to_sentinels() {
        let doc = json!({"values": {"Bare": {}}});
        let networks = extract(&doc).unwrap();
        assert_eq!(
            networks,
            vec![WifiNetwork {
                ssid: "Bare".to_string(),
                added_by: NOT_AVAILABLE.to_string(),
                os_version: NOT_AVAILABLE.to_string(),
                added_at: NOT_AVAILABLE.to_string(),
            }]
        );
    }

    #[test]
    fn missing_values_is_structural() {
        let err = extract(&json!({"other": {}})).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::StructuralMismatch {
                expected: "values",
                ..
            }
        ));
    }
}
