//! Mount options.
//!
//! JS passes a plain object to `mount`; it arrives here as its JSON text.
//! Missing, `null` and `undefined` options all mean "defaults".

use lifeview_core::{Result, ViewerConfig};

/// Parse the JSON form of the mount options.
pub fn from_json(json: Option<&str>) -> Result<ViewerConfig> {
    match json.map(str::trim) {
        None | Some("" | "null" | "undefined") => Ok(ViewerConfig::default()),
        Some(text) => ViewerConfig::from_json_str(text),
    }
}

/// Log filter to install before the options are known to be valid, so that
/// option errors themselves reach the console.
#[must_use]
pub fn log_filter_hint(json: Option<&str>) -> String {
    json.and_then(|text| serde_json::from_str::<serde_json::Value>(text).ok())
        .and_then(|value| value.get("log_filter")?.as_str().map(str::to_owned))
        .unwrap_or_else(|| ViewerConfig::default().log_filter)
}
