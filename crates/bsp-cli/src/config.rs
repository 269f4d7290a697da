use std::path::Path;

use anyhow::Context;
use bsp_aggregate::ExclusionConfig;
use bsp_codec::StreamConfig;
use bsp_export::ExportConfig;
use bsp_verify::VerifierConfig;
use serde::{Deserialize, Serialize};

/// Settings file layout. Every table is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub export: ExportConfig,
    pub verify: VerifierConfig,
    pub stream: StreamConfig,
    pub exclusions: ExclusionConfig,
}

impl CliConfig {
    /// Load from `path`, or the defaults when no file was given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
