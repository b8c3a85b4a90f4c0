//! Material preset catalog
//!
//! The catalog is built once at startup (built-in presets or a JSON file) and
//! handed to the executor, which only reads from it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Error, Result};

/// Shading attributes of a material preset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialPreset {
    /// Base color as RGBA
    pub base_color: [f32; 4],
    /// Metallic factor, 0.0 to 1.0
    pub metallic: f32,
    /// Roughness factor, 0.0 to 1.0
    pub roughness: f32,
}

impl Default for MaterialPreset {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 0.5,
        }
    }
}

impl MaterialPreset {
    const fn new(base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            base_color,
            metallic,
            roughness,
        }
    }
}

/// Name of the scene material created for a preset
pub fn material_name(preset: &str) -> String {
    format!("AI_{}", preset)
}

/// Read-only mapping from preset name to shading attributes
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialCatalog {
    presets: BTreeMap<String, MaterialPreset>,
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MaterialCatalog {
    /// Catalog with the presets shipped with AI Modeler
    pub fn builtin() -> Self {
        let presets = [
            ("metal_brushed", MaterialPreset::new([0.8, 0.8, 0.82, 1.0], 1.0, 0.35)),
            ("plastic", MaterialPreset::new([0.9, 0.9, 0.9, 1.0], 0.0, 0.4)),
            ("wood", MaterialPreset::new([0.55, 0.35, 0.2, 1.0], 0.0, 0.7)),
            ("glass", MaterialPreset::new([0.95, 0.97, 1.0, 1.0], 0.0, 0.05)),
            ("rubber", MaterialPreset::new([0.05, 0.05, 0.05, 1.0], 0.0, 0.9)),
        ];

        Self {
            presets: presets
                .into_iter()
                .map(|(name, preset)| (name.to_string(), preset))
                .collect(),
        }
    }

    /// Parse a catalog from a JSON object of `name -> attributes`
    ///
    /// Attributes missing from an entry take the white, non-metallic,
    /// mid-roughness defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let presets: BTreeMap<String, MaterialPreset> = serde_json::from_str(json)?;
        Ok(Self { presets })
    }

    /// Load a catalog from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read material presets {}: {}",
                path.display(),
                e
            ))
        })?;
        let catalog = Self::from_json(&contents)?;
        info!(path = %path.display(), presets = ?catalog.names(), "Loaded material presets");
        Ok(catalog)
    }

    /// Look up a preset by name
    pub fn get(&self, name: &str) -> Result<&MaterialPreset> {
        self.presets
            .get(name)
            .ok_or_else(|| Error::UnknownPreset(name.to_string()))
    }

    /// Preset names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }

    /// Iterate over presets in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MaterialPreset)> {
        self.presets.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of presets
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Whether the catalog has no presets
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Restore the built-in presets, dropping anything loaded from a file
    pub fn reset(&mut self) {
        *self = Self::builtin();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_presets() {
        let catalog = MaterialCatalog::builtin();
        for name in ["metal_brushed", "plastic", "wood"] {
            assert!(catalog.get(name).is_ok(), "missing preset {}", name);
        }
        assert_eq!(catalog.get("metal_brushed").unwrap().metallic, 1.0);
    }

    #[test]
    fn test_unknown_preset() {
        let catalog = MaterialCatalog::builtin();
        let err = catalog.get("unobtainium").unwrap_err();
        assert!(matches!(err, Error::UnknownPreset(ref name) if name == "unobtainium"));
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let catalog = MaterialCatalog::from_json(
            r#"{
                "gold": { "base_color": [1.0, 0.8, 0.2, 1.0], "metallic": 1.0 },
                "chalk": {}
            }"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        let gold = catalog.get("gold").unwrap();
        assert_eq!(gold.roughness, 0.5);
        assert_eq!(*catalog.get("chalk").unwrap(), MaterialPreset::default());
    }

    #[test]
    fn test_load_from_file_and_reset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "steel": {{ "metallic": 0.9, "roughness": 0.2 }} }}"#).unwrap();

        let mut catalog = MaterialCatalog::load_from_file(file.path()).unwrap();
        assert_eq!(catalog.names(), vec!["steel"]);
        assert!(catalog.get("wood").is_err());

        catalog.reset();
        assert_eq!(catalog, MaterialCatalog::builtin());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = MaterialCatalog::load_from_file(Path::new("/nonexistent/presets.json"))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_material_name() {
        assert_eq!(material_name("wood"), "AI_wood");
    }
}
