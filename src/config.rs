//! Monitor configuration
//!
//! Optional TOML file at `$XDG_CONFIG_HOME/sixaxis/config.toml`. A missing
//! file means defaults; a file that exists but does not parse is an error.
//!
//! ```toml
//! device = "/dev/input/event3"
//! record_layout = "wide"
//!
//! [render]
//! mode = "on_change"
//! interval_ms = 100
//! orientation = "always"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::controller::{
    ControllerSettings, MonitorSettings, OrientationPolicy, RecordLayout, RenderMode,
    RenderOptions,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// evdev node of the controller
    pub device: PathBuf,
    pub record_layout: RecordLayout,
    pub render: RenderConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/input/event0"),
            record_layout: RecordLayout::native(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub mode: RenderMode,
    pub interval_ms: u64,
    pub orientation: OrientationPolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let monitor = MonitorSettings::default();
        Self {
            mode: monitor.mode,
            interval_ms: monitor.interval_ms,
            orientation: monitor.options.orientation,
        }
    }
}

impl MonitorConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sixaxis").join("config.toml"))
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        info!("Loaded config from {}", path.display());
        debug!("Config: {:?}", config);
        Ok(config)
    }

    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No config directory on this platform, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            record_layout: self.record_layout,
        }
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            mode: self.render.mode,
            interval_ms: self.render.interval_ms,
            options: RenderOptions {
                orientation: self.render.orientation,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(MonitorConfig::from_toml("").unwrap(), MonitorConfig::default());
    }

    #[test]
    fn parses_full_config() {
        let config = MonitorConfig::from_toml(
            r#"
            device = "/dev/input/event3"
            record_layout = "compact"

            [render]
            mode = "on_change"
            interval_ms = 250
            orientation = "always"
            "#,
        )
        .unwrap();

        assert_eq!(config.device, PathBuf::from("/dev/input/event3"));
        assert_eq!(config.controller_settings().record_layout, RecordLayout::Compact);

        let monitor = config.monitor_settings();
        assert_eq!(monitor.mode, RenderMode::OnChange);
        assert_eq!(monitor.interval_ms, 250);
        assert_eq!(monitor.options.orientation, OrientationPolicy::Always);
    }

    #[test]
    fn partial_render_section_keeps_other_defaults() {
        let config = MonitorConfig::from_toml("[render]\norientation = \"hidden\"\n").unwrap();
        assert_eq!(config.render.orientation, OrientationPolicy::Hidden);
        assert_eq!(config.render.interval_ms, 100);
        assert_eq!(config.render.mode, RenderMode::Interval);
    }

    #[test]
    fn unknown_layout_is_rejected() {
        let err = MonitorConfig::from_toml("record_layout = \"huge\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("sixaxis-no-such-config.toml");
        assert_eq!(
            MonitorConfig::load_from(&path).unwrap(),
            MonitorConfig::default()
        );
    }
}
