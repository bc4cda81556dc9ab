//! # Core Module
//!
//! Process-wide state shared by promotion, show and the figure registries.
//!
//! - **Config**: backend choice, quit keys, figure and registry defaults
//! - **Context**: the installed backend, the promotion counter and the
//!   interactive flag, bundled so they can be injected instead of living in
//!   bare globals

pub mod config;
pub mod context;

pub use config::{FigureDefaults, GuiConfig, RegistryDefaults, AUTO_BACKEND, BACKEND_ENV_VAR};
pub use context::{BackendLoader, GuiContext};
pub use crate::config::{Config, ConfigError, ConfigFormat};
