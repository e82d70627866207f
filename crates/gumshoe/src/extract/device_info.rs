//! Device summary assembled from several independent documents.

use serde::Serialize;
use serde_json::Value;

use super::lookup;
use crate::{ArtifactRecord, ArtifactTable, NOT_AVAILABLE};

pub const HEADERS: &[&str] = &["Field", "Value"];
pub const CAPTION: &str = "Device Information";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub serial_number: String,
    pub hardware_model: String,
    pub os_version: String,
    pub os_build: String,
    pub device_id: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            serial_number: NOT_AVAILABLE.to_string(),
            hardware_model: NOT_AVAILABLE.to_string(),
            os_version: NOT_AVAILABLE.to_string(),
            os_build: NOT_AVAILABLE.to_string(),
            device_id: NOT_AVAILABLE.to_string(),
        }
    }
}

impl DeviceInfo {
    pub fn table(&self) -> ArtifactTable {
        let rows = [
            ("Serial Number", &self.serial_number),
            ("HW Model", &self.hardware_model),
            ("OS Version", &self.os_version),
            ("OS Build", &self.os_build),
            ("Device ID", &self.device_id),
        ];
        ArtifactTable::new(
            CAPTION,
            HEADERS,
            rows.into_iter()
                .map(|(label, value)| ArtifactRecord::new([label, value.as_str()]))
                .collect(),
        )
    }
}

fn string_at(doc: &Value, path: &[&str]) -> Option<String> {
    lookup(doc, path)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// `ProductName ProductVersion` from `SystemVersion.plist`, e.g. `Apple TVOS 17.1`.
pub fn os_version(system_version: &Value) -> Option<String> {
    let name = string_at(system_version, &["ProductName"])?;
    let version = string_at(system_version, &["ProductVersion"])?;
    Some(format!("{name} {version}"))
}

pub fn os_build(system_version: &Value) -> Option<String> {
    string_at(system_version, &["ProductBuildVersion"])
}

pub fn hardware_model(tv_settings: &Value) -> Option<String> {
    string_at(tv_settings, &["SSDeviceType", "hardwareModel"])
}

pub fn device_id(app_store: &Value) -> Option<String> {
    string_at(app_store, &["ArcadeDeviceGUID"])
}
