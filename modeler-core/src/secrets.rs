//! Planner credentials
//!
//! The planner API key never goes in `config.toml`. It comes from
//! `MODELER_API_KEY`, or failing that from `secrets.toml` next to the config
//! file. On Unix that file is only read when no group or other permission
//! bits are set.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Error, Result};

/// Environment variable holding the planner API key
pub const API_KEY_ENV: &str = "MODELER_API_KEY";

const SECRETS_TEMPLATE: &str = "\
# Credentials for the AI Modeler planner service.
# Keep this file private: modeler refuses to read it unless its mode is 0600.

[planner]
api_key = \"\"
";

/// Contents of `secrets.toml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    pub planner: PlannerSecrets,
}

/// `[planner]` table of `secrets.toml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PlannerSecrets {
    /// Sent as `Authorization: Bearer <api_key>`
    pub api_key: Option<String>,
}

impl Secrets {
    /// Read `secrets.toml` from the config directory, or nothing if absent
    pub fn load() -> Result<Self> {
        match Self::default_secrets_path() {
            Some(path) if path.is_file() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Read a secrets file, refusing files other users can access
    pub fn load_from_file(path: &Path) -> Result<Self> {
        ensure_private(path)?;

        let contents = std::fs::read_to_string(path)?;
        let mut secrets: Secrets = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("{} is not valid TOML: {}", path.display(), e))
        })?;

        secrets.planner.api_key = secrets
            .planner
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Ok(secrets)
    }

    /// `<config dir>/ai-modeler/secrets.toml`
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ai-modeler").join("secrets.toml"))
    }

    /// API key for the planner service
    ///
    /// A non-blank `MODELER_API_KEY` wins over the file.
    pub fn planner_api_key(&self) -> Option<String> {
        let from_env = std::env::var(API_KEY_ENV)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        match from_env {
            Some(key) => {
                debug!(source = API_KEY_ENV, "Planner API key found");
                Some(key)
            }
            None => self.file_api_key(),
        }
    }

    fn file_api_key(&self) -> Option<String> {
        let key = self.planner.api_key.as_deref()?.trim();
        if key.is_empty() {
            return None;
        }
        debug!(source = "secrets.toml", "Planner API key found");
        Some(key.to_string())
    }

    /// Write an empty `secrets.toml` in the config directory
    ///
    /// Returns the path written. Fails if the file already exists.
    pub fn create_template() -> Result<PathBuf> {
        let path = Self::default_secrets_path()
            .ok_or_else(|| Error::Config("No config directory on this platform".to_string()))?;
        Self::write_template(&path)?;
        Ok(path)
    }

    fn write_template(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(Error::Config(format!(
                "{} already exists; edit it instead",
                path.display()
            )));
        }
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        std::fs::write(path, SECRETS_TEMPLATE)?;
        restrict_to_owner(path)?;

        info!(path = %path.display(), "Wrote secrets template");
        Ok(())
    }
}

#[cfg(unix)]
fn ensure_private(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)?.permissions().mode() & 0o777;
    if mode & 0o077 != 0 {
        return Err(Error::Config(format!(
            "{} is readable by other users (mode {:o}); run `chmod 600 {}`",
            path.display(),
            mode,
            path.display()
        )));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_private(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> Result<()> {
    Ok(())
}
