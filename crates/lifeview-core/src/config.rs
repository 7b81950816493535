#![forbid(unsafe_code)]

//! Viewer configuration.
//!
//! Every field has a default matching the stock deployment (`/socket`
//! endpoint, `life` topic, 100 ms cadence, 16 px cells), so hosts usually pass
//! nothing or a small JSON object overriding a field or two:
//!
//! ```
//! use lifeview_core::config::ViewerConfig;
//!
//! let cfg = ViewerConfig::from_json_str(r#"{ "tick_interval_ms": 50 }"#).unwrap();
//! assert_eq!(cfg.tick_interval_ms, 50);
//! assert_eq!(cfg.topic, "life");
//! ```

use core::time::Duration;

use serde::Deserialize;

use crate::error::{Result, ViewerError};

/// Host-supplied viewer settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// DOM id of the target canvas.
    pub canvas_id: String,
    /// Socket endpoint passed to the transport.
    pub socket_endpoint: String,
    /// Channel topic to join.
    pub topic: String,
    /// Event name used both for outbound tick requests and inbound pushes.
    pub tick_event: String,
    /// Nominal cadence of outbound ticks.
    pub tick_interval_ms: u64,
    /// Edge length of one cell in CSS pixels.
    pub cell_size: u32,
    /// Fill style applied at calibration.
    pub fill_style: String,
    /// `tracing-subscriber` filter directive for the browser console.
    pub log_filter: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            canvas_id: "canvas".to_owned(),
            socket_endpoint: "/socket".to_owned(),
            topic: "life".to_owned(),
            tick_event: "tick".to_owned(),
            tick_interval_ms: 100,
            cell_size: 16,
            fill_style: "rgb(0, 0, 0)".to_owned(),
            log_filter: "info".to_owned(),
        }
    }
}

impl ViewerConfig {
    /// Parse a JSON object (missing fields take defaults) and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|e| ViewerError::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings the viewer cannot run with.
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("canvas_id", &self.canvas_id),
            ("socket_endpoint", &self.socket_endpoint),
            ("topic", &self.topic),
            ("tick_event", &self.tick_event),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(ViewerError::InvalidConfig(format!("{field} must not be empty")));
            }
        }
        if self.tick_interval_ms == 0 {
            return Err(ViewerError::InvalidConfig(
                "tick_interval_ms must be positive".to_owned(),
            ));
        }
        if self.cell_size == 0 {
            return Err(ViewerError::InvalidConfig(
                "cell_size must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
