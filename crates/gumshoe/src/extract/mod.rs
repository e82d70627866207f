//! Per-artifact extractors over parsed documents.
//!
//! Each source has its own fixed nested shape, so there is no shared traversal; the helpers
//! below only centralize how an absent or oddly typed leaf becomes a display string.

pub mod apps;
pub mod device_info;
pub mod identity;
pub mod location;
pub mod trust;
pub mod wifi;

use serde_json::{Map, Value};

use crate::{timestamp, ArtifactType, ExtractionError, NOT_AVAILABLE};

pub(crate) fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |node, key| node.get(key))
}

/// Strings render verbatim, other scalars and containers as compact JSON.
pub(crate) fn display(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub(crate) fn field(value: &Value, path: &[&str]) -> String {
    display(lookup(value, path))
}

/// Non-numeric timestamps count as absent.
pub(crate) fn device_time(value: Option<&Value>) -> String {
    timestamp::convert(value.and_then(Value::as_f64))
}

pub(crate) fn required_object<'a>(
    value: Option<&'a Value>,
    artifact: ArtifactType,
    expected: &'static str,
) -> Result<&'a Map<String, Value>, ExtractionError> {
    value
        .and_then(Value::as_object)
        .ok_or(ExtractionError::StructuralMismatch { artifact, expected })
}
