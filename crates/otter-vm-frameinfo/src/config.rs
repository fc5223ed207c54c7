//! Frame info decoding configuration

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Environment variable that turns source reference decoding off.
pub const SOURCE_REFERENCES_ENV: &str = "OTTER_FRAMEINFO_SOURCE_REFERENCES";

static SOURCE_REFERENCES_ENABLED: OnceLock<bool> = OnceLock::new();

fn parse_env_truthy(value: &str) -> bool {
    !matches!(value.trim(), "" | "0")
        && !value.trim().eq_ignore_ascii_case("false")
        && !value.trim().eq_ignore_ascii_case("off")
        && !value.trim().eq_ignore_ascii_case("no")
}

/// Check whether uncompressed slices carry source references.
///
/// Enabled by default. Set `OTTER_FRAMEINFO_SOURCE_REFERENCES=0` for images
/// built without symbolic stack trace information. The value is read once.
pub fn source_references_enabled() -> bool {
    *SOURCE_REFERENCES_ENABLED.get_or_init(|| {
        std::env::var(SOURCE_REFERENCES_ENV)
            .map(|v| parse_env_truthy(&v))
            .unwrap_or(true)
    })
}

/// Settings the decoder must share with the encoder that produced an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInfoConfig {
    /// Uncompressed slices carry class/method/line/method-id per frame.
    /// Compressed slices always do.
    /// Default: true
    pub source_references: bool,
}

impl Default for FrameInfoConfig {
    fn default() -> Self {
        Self {
            source_references: true,
        }
    }
}

impl FrameInfoConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config from the process environment.
    pub fn from_env() -> Self {
        Self {
            source_references: source_references_enabled(),
        }
    }

    /// Enable or disable source reference decoding.
    pub fn source_references(mut self, enabled: bool) -> Self {
        self.source_references = enabled;
        self
    }
}
