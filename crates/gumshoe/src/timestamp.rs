//! Device-epoch timestamp conversion.
//!
//! The device's native frameworks count seconds from 2001-01-01T00:00:00 UTC.

use time::{
    macros::{datetime, format_description},
    Duration, OffsetDateTime,
};

use crate::NOT_AVAILABLE;

/// Reference instant for device-epoch offsets.
pub const DEVICE_EPOCH: OffsetDateTime = datetime!(2001-01-01 0:00 UTC);

/// Appended to every converted instant; the device clock is not authoritative.
pub const ESTIMATE_SUFFIX: &str = "  (Estimate)";

/// Formats a device-epoch offset as `Mon DD YYYY HH:MM:SS  (Estimate)` in UTC.
///
/// `None` yields [`NOT_AVAILABLE`]. Zero is a real instant (the epoch itself), not absence.
pub fn convert(offset: Option<f64>) -> String {
    offset
        .and_then(device_instant)
        .and_then(|instant| {
            instant
                .format(format_description!(
                    "[month repr:short] [day] [year] [hour]:[minute]:[second]"
                ))
                .ok()
        })
        .map(|formatted| format!("{formatted}{ESTIMATE_SUFFIX}"))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// The instant `offset` seconds after [`DEVICE_EPOCH`], with sub-second precision dropped.
///
/// Returns `None` for non-finite offsets and for instants outside years -9999 through 9999,
/// roughly 2.5e11 seconds either side of the epoch; callers render those as [`NOT_AVAILABLE`].
pub fn device_instant(offset: f64) -> Option<OffsetDateTime> {
    if !offset.is_finite() {
        return None;
    }
    let whole = offset.floor();
    if whole < i64::MIN as f64 || whole >= i64::MAX as f64 {
        return None;
    }
    DEVICE_EPOCH.checked_add(Duration::seconds(whole as i64))
}
