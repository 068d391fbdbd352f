//! Settings file for the `lux` binary.

use std::path::Path;

use anyhow::{Context, Result};
use lux_renderer::{OctreeConfig, ProgressiveConfig, RenderConfig, TraceSettings};
use serde::{Deserialize, Serialize};

/// Everything tunable from a JSON settings file. Missing sections and
/// fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub trace: TraceSettings,
    pub render: RenderConfig,
    pub progressive: ProgressiveConfig,
    pub octree: OctreeConfig,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
