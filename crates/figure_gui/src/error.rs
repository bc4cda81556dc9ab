//! Error taxonomy for backend selection, promotion and figure registries
//!
//! Configuration problems (a backend that cannot be loaded) and state misuse
//! (re-promoting under another backend, closing something a registry does not
//! own) surface immediately as [`GuiError`]. Non-fatal conditions are reported
//! through `log::warn!` instead and never abort the calling operation.

use crate::backend::EventFramework;
use crate::config::ConfigError;
use crate::figure::layout::LayoutError;
use thiserror::Error;

/// Failures reported by a backend or a backend loader
#[derive(Error, Debug)]
pub enum BackendError {
    /// No loader is registered under this name
    #[error("no backend named {0:?} is registered")]
    NotFound(String),

    /// The loader ran but the toolkit could not be brought up
    #[error("backend {name:?} is unavailable: {reason}")]
    Unavailable {
        /// Requested backend name
        name: String,
        /// Why loading failed
        reason: String,
    },

    /// A call into the native toolkit failed
    #[error("native toolkit error: {0}")]
    Native(String),
}

/// Crate-level errors
#[derive(Error, Debug)]
pub enum GuiError {
    /// Backend could not be loaded or failed while creating a window
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Two different native event frameworks were requested in one process
    #[error(
        "cannot load backend {backend:?} which requires the {required} event framework, \
         as {running} is currently running"
    )]
    FrameworkConflict {
        /// Backend that was requested
        backend: String,
        /// Framework that backend needs
        required: EventFramework,
        /// Framework already active in this process
        running: EventFramework,
    },

    /// The figure is still bound to a window from a different backend
    #[error("figure is bound to a window from backend {bound:?} but the current backend is {current:?}; demote it first")]
    BackendMismatch {
        /// Backend that created the existing window
        bound: String,
        /// Backend currently installed
        current: String,
    },

    /// Close target is not owned by the registry
    #[error("{0} is not tracked by this registry")]
    NotTracked(String),

    /// Invalid subplot grid or mosaic
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Configuration could not be loaded or is invalid
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result alias used throughout the crate
pub type GuiResult<T> = Result<T, GuiError>;
