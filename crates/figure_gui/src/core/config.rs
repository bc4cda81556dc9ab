//! # GUI Configuration
//!
//! Settings that steer backend selection, window behaviour and the defaults
//! applied to new figures and registries. Loadable from TOML or RON through
//! the [`Config`] trait.

use crate::config::{Config, ConfigError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backend name that asks for automatic selection
pub const AUTO_BACKEND: &str = "auto";

/// Environment variable that overrides [`GuiConfig::backend`]
pub const BACKEND_ENV_VAR: &str = "FIGURE_GUI_BACKEND";

/// Defaults applied to newly created figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureDefaults {
    /// Width and height in inches
    pub size: (f32, f32),
    /// Dots per inch
    pub dpi: f32,
    /// Background color
    pub facecolor: String,
    /// Border color
    pub edgecolor: String,
    /// Whether the figure frame is drawn
    pub frameon: bool,
    /// Whether stale figures request a redraw in interactive mode
    pub auto_draw: bool,
}

impl Default for FigureDefaults {
    fn default() -> Self {
        Self {
            size: (6.4, 4.8),
            dpi: 100.0,
            facecolor: "white".to_string(),
            edgecolor: "white".to_string(),
            frameon: true,
            auto_draw: true,
        }
    }
}

/// Defaults for figure registries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryDefaults {
    /// Prefix of generated figure labels
    pub prefix: String,
    /// `None` follows interactive mode
    pub block: Option<bool>,
    /// Seconds to wait when blocking, 0 waits until every window closes
    pub timeout_secs: f64,
}

impl RegistryDefaults {
    /// Timeout as a duration
    ///
    /// Anything that is not a positive number a `Duration` can hold means
    /// "forever".
    pub fn timeout(&self) -> Duration {
        match Duration::try_from_secs_f64(self.timeout_secs) {
            Ok(timeout) if self.timeout_secs > 0.0 => timeout,
            _ => Duration::ZERO,
        }
    }
}

impl Default for RegistryDefaults {
    fn default() -> Self {
        Self {
            prefix: "Figure ".to_string(),
            block: None,
            timeout_secs: 0.0,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiConfig {
    /// Backend to use, or `"auto"`
    pub backend: String,
    /// Probe order for `"auto"`
    pub backend_candidates: Vec<String>,
    /// Headless backend used when no candidate loads
    pub fallback_backend: String,
    /// Keys that close a figure window
    pub quit_keys: Vec<String>,
    /// Initial interactive mode
    pub interactive: bool,
    /// Default log filter for binaries
    pub log_level: String,
    /// New figure defaults
    pub figure: FigureDefaults,
    /// New registry defaults
    pub registry: RegistryDefaults,
}

impl GuiConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self {
            backend: AUTO_BACKEND.to_string(),
            backend_candidates: ["macosx", "qt", "gtk4", "gtk3", "tk", "wx", "glfw"]
                .into_iter()
                .map(String::from)
                .collect(),
            fallback_backend: crate::backend::headless::HEADLESS_BACKEND.to_string(),
            quit_keys: vec!["q".to_string(), "ctrl+w".to_string(), "cmd+w".to_string()],
            interactive: false,
            log_level: "info".to_string(),
            figure: FigureDefaults::default(),
            registry: RegistryDefaults::default(),
        }
    }

    /// Set the requested backend
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    /// Set the probe order used by `"auto"`
    pub fn with_backend_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backend_candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    /// Set the headless fallback
    pub fn with_fallback_backend(mut self, backend: impl Into<String>) -> Self {
        self.fallback_backend = backend.into();
        self
    }

    /// Set the quit keys
    pub fn with_quit_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quit_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Set the initial interactive mode
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Set figure defaults
    pub fn with_figure_defaults(mut self, figure: FigureDefaults) -> Self {
        self.figure = figure;
        self
    }

    /// Set registry defaults
    pub fn with_registry_defaults(mut self, registry: RegistryDefaults) -> Self {
        self.registry = registry;
        self
    }

    /// Apply [`BACKEND_ENV_VAR`] if it is set and non-empty
    pub fn with_env_overrides(self) -> Self {
        let requested = std::env::var(BACKEND_ENV_VAR).ok();
        self.with_backend_override(requested)
    }

    fn with_backend_override(mut self, requested: Option<String>) -> Self {
        if let Some(name) = requested.map(|name| name.trim().to_string()).filter(|n| !n.is_empty()) {
            log::debug!("Backend {name:?} requested through {BACKEND_ENV_VAR}");
            self.backend = name;
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.trim().is_empty() {
            return Err(ConfigError::Invalid("backend name cannot be empty".to_string()));
        }
        if self.fallback_backend.trim().is_empty() {
            return Err(ConfigError::Invalid("fallback backend cannot be empty".to_string()));
        }
        if self.fallback_backend.trim().eq_ignore_ascii_case(AUTO_BACKEND) {
            return Err(ConfigError::Invalid(format!("fallback backend cannot be {AUTO_BACKEND:?}")));
        }
        if self.backend_candidates.iter().any(|c| c.trim().eq_ignore_ascii_case(AUTO_BACKEND)) {
            return Err(ConfigError::Invalid(format!("{AUTO_BACKEND:?} cannot be an auto candidate")));
        }
        let (width, height) = self.figure.size;
        if !(width > 0.0 && height > 0.0) {
            return Err(ConfigError::Invalid(format!("figure size must be positive, got {width}x{height}")));
        }
        if !(self.figure.dpi > 0.0) {
            return Err(ConfigError::Invalid(format!("dpi must be positive, got {}", self.figure.dpi)));
        }
        if self.registry.timeout_secs < 0.0 || Duration::try_from_secs_f64(self.registry.timeout_secs).is_err() {
            return Err(ConfigError::Invalid(format!(
                "registry timeout must be a non-negative number of seconds, got {}",
                self.registry.timeout_secs
            )));
        }
        self.log_level
            .parse::<log::LevelFilter>()
            .map_err(|_| ConfigError::Invalid(format!("unknown log level {:?}", self.log_level)))?;
        Ok(())
    }
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for GuiConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_are_valid() {
        let config = GuiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend, AUTO_BACKEND);
        assert_eq!(config.fallback_backend, "headless");
        assert_eq!(config.registry.prefix, "Figure ");
        assert_eq!(config.registry.timeout(), Duration::ZERO);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let text = r#"
            backend = "tk"
            quit_keys = ["escape"]

            [figure]
            dpi = 72.0

            [registry]
            prefix = "Plot "
            block = false
            timeout_secs = 1.5
        "#;
        let config = GuiConfig::from_str_as(text, ConfigFormat::Toml).unwrap();
        assert_eq!(config.backend, "tk");
        assert_eq!(config.quit_keys, vec!["escape".to_string()]);
        assert_relative_eq!(config.figure.dpi, 72.0);
        assert_relative_eq!(config.figure.size.0, 6.4);
        assert_eq!(config.registry.block, Some(false));
        assert_eq!(config.registry.timeout(), Duration::from_millis(1500));
        assert_eq!(config.fallback_backend, "headless");
    }

    #[test]
    fn test_file_round_trip_through_ron() {
        let path = std::env::temp_dir().join(format!("figure_gui_config_{}.ron", std::process::id()));
        let config = GuiConfig::default()
            .with_backend("headless")
            .with_interactive(true)
            .with_quit_keys(["x"]);
        config.save_to_file(&path).unwrap();
        let loaded = GuiConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let bad_dpi = GuiConfig::default().with_figure_defaults(FigureDefaults {
            dpi: 0.0,
            ..FigureDefaults::default()
        });
        assert!(matches!(bad_dpi.validate(), Err(ConfigError::Invalid(_))));

        let bad_timeout = GuiConfig::default().with_registry_defaults(RegistryDefaults {
            timeout_secs: -1.0,
            ..RegistryDefaults::default()
        });
        assert!(bad_timeout.validate().is_err());

        let huge_timeout = GuiConfig::default().with_registry_defaults(RegistryDefaults {
            timeout_secs: 1e20,
            ..RegistryDefaults::default()
        });
        assert!(huge_timeout.validate().is_err());
        assert_eq!(huge_timeout.registry.timeout(), Duration::ZERO);

        let nan_timeout = RegistryDefaults {
            timeout_secs: f64::NAN,
            ..RegistryDefaults::default()
        };
        assert_eq!(nan_timeout.timeout(), Duration::ZERO);

        let mut bad_level = GuiConfig::default();
        bad_level.log_level = "loud".to_string();
        assert!(bad_level.validate().is_err());
    }

    #[test]
    fn test_auto_cannot_resolve_to_itself() {
        let fallback = GuiConfig::default()
            .with_backend_candidates(Vec::<String>::new())
            .with_fallback_backend("auto");
        assert!(matches!(fallback.validate(), Err(ConfigError::Invalid(_))));

        let candidate = GuiConfig::default().with_backend_candidates(["qt", " Auto "]);
        assert!(matches!(candidate.validate(), Err(ConfigError::Invalid(_))));

        // Asking for auto selection itself stays valid.
        assert!(GuiConfig::default().with_backend("auto").validate().is_ok());
    }

    #[test]
    fn test_backend_override_ignores_blank_values() {
        let config = GuiConfig::default().with_backend_override(Some("  ".to_string()));
        assert_eq!(config.backend, AUTO_BACKEND);
        let config = GuiConfig::default().with_backend_override(Some("gtk3".to_string()));
        assert_eq!(config.backend, "gtk3");
    }
}
