use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Default page number printed on the first output page.
///
/// Page 1 is conventionally an un-numbered cover produced outside this tool,
/// so numbering starts at 2.
const fn default_start_page() -> u32 {
    2
}

fn default_watermark_text() -> String {
    "UDKAST".to_string()
}

/// Assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Page number assigned to the very first page of the output
    #[serde(default = "default_start_page")]
    pub start_page: u32,

    /// Text of the generated watermark (ignored when an asset is configured)
    #[serde(default = "default_watermark_text")]
    pub watermark_text: String,

    /// Optional single-page PDF whose first page is used as the watermark
    /// template instead of the generated text
    #[serde(default)]
    pub watermark_asset: Option<PathBuf>,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            start_page: default_start_page(),
            watermark_text: default_watermark_text(),
            watermark_asset: None,
        }
    }
}

impl AssemblyConfig {
    /// Validate the configuration values.
    ///
    /// `start_page` must be positive, and a watermark source must exist:
    /// either non-empty text or an asset path.
    pub fn validate(&self) -> Result<()> {
        if self.start_page == 0 {
            return Err(Error::InvalidStartPage(0));
        }

        if self.watermark_asset.is_none() && self.watermark_text.trim().is_empty() {
            return Err(Error::ConfigInvalid {
                field: "watermark_text".to_string(),
                reason: "must not be empty when no watermark asset is configured".to_string(),
            });
        }

        Ok(())
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations (~/.config/bilagssamler/config.toml, ./bilagssamler.toml)
    pub fn load() -> Self {
        // Try user config
        if let Some(config_dir) = config_dir() {
            let user_config = config_dir.join("bilagssamler").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Try local config
        let local_config = std::path::PathBuf::from("bilagssamler.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./bilagssamler.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./bilagssamler.toml: {}", e);
                }
            }
        }

        // Return defaults
        tracing::debug!("No config file found, using defaults");
        Self::default()
    }
}

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AssemblyConfig::default();
        assert_eq!(config.start_page, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_start_page_rejected() {
        let config = AssemblyConfig {
            start_page: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidStartPage(0))));
    }

    #[test]
    fn test_empty_watermark_without_asset_rejected() {
        let config = AssemblyConfig {
            watermark_text: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_watermark_with_asset_accepted() {
        let config = AssemblyConfig {
            watermark_text: String::new(),
            watermark_asset: Some(PathBuf::from("stamp.pdf")),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "start_page = 5\nwatermark_text = \"FORTROLIGT\"\n").unwrap();

        let config = AssemblyConfig::from_file(&path).unwrap();
        assert_eq!(config.start_page, 5);
        assert_eq!(config.watermark_text, "FORTROLIGT");
    }
}
