//! Recent locations synced by CloudRecents (calendar event locations).

use serde::Serialize;
use serde_json::Value;

use super::{device_time, field, required_object};
use crate::{ArtifactRecord, ArtifactTable, ArtifactType, ExtractionError};

pub const HEADERS: &[&str] = &["Name", "Address", "Timestamp (UTC)", "Source"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationEntry {
    pub id: String,
    pub name: String,
    pub address: String,
    pub timestamp: String,
    pub source: String,
}

/// Reads `values.<id>.value.{n, a, S}` plus the entry-level `timestamp`.
pub fn extract(doc: &Value) -> Result<Vec<LocationEntry>, ExtractionError> {
    let values = required_object(doc.get("values"), ArtifactType::LocationHistory, "values")?;
    Ok(values
        .iter()
        .map(|(id, entry)| LocationEntry {
            id: id.clone(),
            name: field(entry, &["value", "n"]),
            address: field(entry, &["value", "a"]),
            timestamp: device_time(entry.get("timestamp")),
            source: field(entry, &["value", "S"]),
        })
        .collect())
}

impl From<LocationEntry> for ArtifactRecord {
    fn from(entry: LocationEntry) -> Self {
        ArtifactRecord::new([entry.name, entry.address, entry.timestamp, entry.source])
    }
}

pub fn table(entries: Vec<LocationEntry>) -> ArtifactTable {
    ArtifactTable::new(
        "Location history",
        HEADERS,
        entries.into_iter().map(Into::into).collect(),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::NOT_AVAILABLE;

    #[test]
    fn extracts_name_address_source_and_time() {
        let doc = json!({"values": {"3F2A": {
            "value": {"n": "Office", "a": "1 Infinite Loop", "S": "com.apple.mobilecal"},
            "timestamp": 631152000.9
        }}});
        let entries = extract(&doc).unwrap();
        assert_eq!(
            ArtifactRecord::from(entries[0].clone()).fields(),
            [
                "Office",
                "1 Infinite Loop",
                "Jan 01 2021 00:00:00  (Estimate)",
                "com.apple.mobilecal"
            ]
        );
    }

    #[test]
    fn missing_leaves_are_sentinels() {
        let doc = json!({"values": {"x": {"value": {"n": "Home"}}}});
        let entry = &extract(&doc).unwrap()[0];
        assert_eq!(entry.name, "Home");
        assert_eq!(entry.address, NOT_AVAILABLE);
        assert_eq!(entry.timestamp, NOT_AVAILABLE);
        assert_eq!(entry.source, NOT_AVAILABLE);
    }
}
