//! Representation options with TOML preset support.
//!
//! Every tweakable parameter of the representations is consolidated here.
//! Options serialize to/from TOML so callers can keep named presets in a
//! directory, and export a JSON schema for UI generation.

mod backbone;
mod geometry;

use std::path::Path;

pub use backbone::{
    BackboneCylinderOptions, BackboneShift, RADIAL_SEGMENTS_MAX,
    RADIAL_SEGMENTS_MIN, SIZE_FACTOR_MAX, SIZE_FACTOR_MIN,
};
pub use geometry::BaseGeometryOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ReprError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `size_factor`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Polymer backbone cylinder parameters.
    pub backbone_cylinder: BackboneCylinderOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// [`Self::json_schema`] rendered as pretty-printed JSON.
    pub fn json_schema_string() -> Result<String, ReprError> {
        serde_json::to_string_pretty(&Self::json_schema())
            .map_err(|e| ReprError::OptionsParse(e.to_string()))
    }

    /// Load options from a TOML file. Missing fields use defaults; numeric
    /// fields are clamped into range.
    pub fn load(path: &Path) -> Result<Self, ReprError> {
        let content = std::fs::read_to_string(path).map_err(ReprError::Io)?;
        let mut opts: Self = toml::from_str(&content)
            .map_err(|e| ReprError::OptionsParse(e.to_string()))?;
        opts.backbone_cylinder = opts.backbone_cylinder.clamped();
        log::debug!("loaded options from {}", path.display());
        Ok(opts)
    }

    /// Save options to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), ReprError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ReprError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ReprError::Io)?;
        }
        std::fs::write(path, content).map_err(ReprError::Io)
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) =
                        path.file_stem().and_then(|s| s.to_str())
                    {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }
}
