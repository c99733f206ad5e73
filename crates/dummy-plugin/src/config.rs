//! Plugin configuration and session open parameters.
//!
//! Both arrive from the host as JSON strings:
//!
//! ```json
//! {"jitter": 10}
//! {"start": 1, "maxEvents": 1000}
//! ```

use crate::error::{PluginError, Result};
use serde::{Deserialize, Serialize};

/// Jitter used when the plugin config does not set one.
pub const DEFAULT_JITTER: u64 = 10;

fn default_jitter() -> u64 {
    DEFAULT_JITTER
}

/// Plugin-wide configuration, fixed at init time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Maximum extra amount added to the base +1 increment of each sample
    #[serde(default = "default_jitter")]
    pub jitter: u64,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            jitter: DEFAULT_JITTER,
        }
    }
}

impl PluginConfig {
    /// Parse the raw plugin config.
    ///
    /// Empty, whitespace-only, `{}` and `null` configs select the defaults.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Option<PluginConfig> =
            serde_json::from_str(raw).map_err(|source| PluginError::InvalidConfig {
                config: raw.to_string(),
                source,
            })?;
        Ok(config.unwrap_or_default())
    }
}

/// Parameters for a single capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpenParams {
    /// Initial sample value; the first event carries a value above it
    pub start: u64,
    /// Number of events to produce before end of stream
    #[serde(rename = "maxEvents")]
    pub max_events: u64,
}

#[derive(Deserialize)]
struct RawOpenParams {
    start: Option<u64>,
    #[serde(rename = "maxEvents")]
    max_events: Option<u64>,
}

impl OpenParams {
    /// Parse the raw open parameters. Both `start` and `maxEvents` are required.
    pub fn parse(raw: &str) -> Result<Self> {
        let parsed: RawOpenParams =
            serde_json::from_str(raw).map_err(|source| PluginError::InvalidParams {
                params: raw.to_string(),
                source,
            })?;
        let start = parsed.start.ok_or_else(|| PluginError::MissingParameter {
            key: "start",
            params: raw.to_string(),
        })?;
        let max_events = parsed
            .max_events
            .ok_or_else(|| PluginError::MissingParameter {
                key: "maxEvents",
                params: raw.to_string(),
            })?;
        Ok(Self { start, max_events })
    }
}
