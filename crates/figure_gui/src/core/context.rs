//! Process-wide GUI context
//!
//! One [`GuiContext`] owns everything that must be unique per process: the
//! current backend, the event framework a native toolkit has started, the
//! loaders that turn backend names into backends, the monotonic promotion
//! counter and the interactive flag. [`GuiContext::global`] is the instance the
//! free functions use; tests and embedders build their own with
//! [`GuiContext::new`].

use crate::backend::{headless::HeadlessBackend, Backend, EventFramework};
use crate::core::config::GuiConfig;
use crate::error::{BackendError, GuiResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

/// Creates a backend on demand from its registered name
pub type BackendLoader = Arc<dyn Fn() -> Result<Arc<dyn Backend>, BackendError> + Send + Sync>;

#[derive(Default)]
pub(crate) struct BackendState {
    pub(crate) current: Option<Arc<dyn Backend>>,
    pub(crate) running_framework: Option<EventFramework>,
    pub(crate) loaders: HashMap<String, BackendLoader>,
}

/// Shared state for backend selection, promotion numbering and interactive mode
pub struct GuiContext {
    config: GuiConfig,
    backends: Mutex<BackendState>,
    figure_count: AtomicU64,
    interactive: AtomicBool,
}

impl GuiContext {
    /// Create a context after validating `config`
    pub fn new(config: GuiConfig) -> GuiResult<Arc<Self>> {
        config.validate()?;
        Ok(Arc::new(Self::build(config)))
    }

    /// The process-wide context
    ///
    /// Built from the default configuration plus environment overrides on
    /// first use. An invalid override is reported and ignored.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<GuiContext>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| {
            let config = GuiConfig::default().with_env_overrides();
            if let Err(err) = config.validate() {
                log::warn!("Ignoring environment overrides: {err}");
                return Arc::new(Self::build(GuiConfig::default()));
            }
            Arc::new(Self::build(config))
        }))
    }

    #[cfg(test)]
    pub(crate) fn build_unchecked(config: GuiConfig) -> Self {
        Self::build(config)
    }

    fn build(config: GuiConfig) -> Self {
        let context = Self {
            interactive: AtomicBool::new(config.interactive),
            config,
            backends: Mutex::new(BackendState::default()),
            figure_count: AtomicU64::new(0),
        };
        context.register_builtin_backends();
        context
    }

    fn register_builtin_backends(&self) {
        self.register_backend(crate::backend::headless::HEADLESS_BACKEND, || {
            Ok(Arc::new(HeadlessBackend::new()) as Arc<dyn Backend>)
        });
        #[cfg(feature = "glfw")]
        self.register_backend(crate::backend::glfw_backend::GLFW_BACKEND, || {
            crate::backend::glfw_backend::GlfwBackend::load().map(|b| Arc::new(b) as Arc<dyn Backend>)
        });
    }

    /// Configuration this context was built from
    pub fn config(&self) -> &GuiConfig {
        &self.config
    }

    /// Draw the next number from the promotion counter
    pub(crate) fn next_figure_number(&self) -> u64 {
        self.figure_count.fetch_add(1, Ordering::Relaxed)
    }

    /// Whether interactive mode is on
    pub fn is_interactive(&self) -> bool {
        self.interactive.load(Ordering::SeqCst)
    }

    /// Switch interactive mode, returning the previous value
    pub fn set_interactive(&self, interactive: bool) -> bool {
        self.interactive.swap(interactive, Ordering::SeqCst)
    }

    pub(crate) fn lock_backends(&self) -> MutexGuard<'_, BackendState> {
        self.backends.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for GuiContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_backends();
        f.debug_struct("GuiContext")
            .field("backend", &state.current.as_ref().map(|b| b.name().to_string()))
            .field("running_framework", &state.running_framework)
            .field("interactive", &self.is_interactive())
            .finish_non_exhaustive()
    }
}
