use serde::{Deserialize, Serialize};
use stow_core::ArchiveConfig;

/// Configuration for JSON archives.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonConfig {
    /// Indent output text.
    pub pretty: bool,
    /// Decoding limits.
    pub limits: ArchiveConfig,
}

impl JsonConfig {
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Default::default()
        }
    }
}
