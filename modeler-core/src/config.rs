//! Configuration management for AI Modeler
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (MODELER_*)
//! 3. Config file (~/.config/ai-modeler/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::materials::MaterialCatalog;
use crate::units::Unit;
use crate::{Error, Result};

/// Modeling defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelingConfig {
    /// Unit used when a prompt carries no dimension
    pub default_unit: Unit,
}

/// Remote planner settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Base URL of the planner service; the rules compiler is used when unset
    pub base_url: Option<String>,

    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Total attempts before giving up
    pub max_attempts: u32,

    /// Backoff unit; attempt N waits N times this
    #[serde(with = "humantime_serde")]
    pub backoff: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(15),
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Material catalog settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MaterialsConfig {
    /// JSON preset file replacing the built-in catalog
    pub presets_path: Option<PathBuf>,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Modeling defaults
    pub modeling: ModelingConfig,

    /// Remote planner settings
    pub planner: PlannerConfig,

    /// Material catalog settings
    pub materials: MaterialsConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/ai-modeler/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ai-modeler").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - MODELER_PLANNER_URL: Planner service base URL
    /// - MODELER_DEFAULT_UNIT: Default unit (M, CM, MM)
    /// - MODELER_PRESETS_PATH: Material preset JSON file
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("MODELER_PLANNER_URL") {
            self.planner.base_url = Some(url);
        }

        if let Some(unit) = lookup("MODELER_DEFAULT_UNIT") {
            match unit.parse() {
                Ok(unit) => self.modeling.default_unit = unit,
                Err(_) => warn!(unit = %unit, "Ignoring invalid MODELER_DEFAULT_UNIT"),
            }
        }

        if let Some(path) = lookup("MODELER_PRESETS_PATH") {
            self.materials.presets_path = Some(PathBuf::from(path));
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(
        mut self,
        planner_url: Option<String>,
        default_unit: Option<Unit>,
    ) -> Self {
        if let Some(url) = planner_url {
            self.planner.base_url = Some(url);
        }

        if let Some(unit) = default_unit {
            self.modeling.default_unit = unit;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        planner_url: Option<String>,
        default_unit: Option<Unit>,
    ) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()
            .with_cli_overrides(planner_url, default_unit))
    }

    /// Build the material catalog this configuration points at
    pub fn material_catalog(&self) -> Result<MaterialCatalog> {
        match self.materials.presets_path {
            Some(ref path) => MaterialCatalog::load_from_file(path),
            None => Ok(MaterialCatalog::builtin()),
        }
    }
}
