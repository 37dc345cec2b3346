//! Portal configuration.

use serde::{Deserialize, Serialize};

/// Settings for one portal instance.
///
/// Every field has a default, so a partial JSON object is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Name used in log fields and error messages.
    pub label: String,

    /// Minimum capacity reserved for each entry list snapshot.
    pub capacity_hint: usize,
}

impl PortalConfig {
    /// Create a config with the given label and default capacity.
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Parse a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            label: "portal".to_string(),
            capacity_hint: 4,
        }
    }
}
