//! Backend selection
//!
//! Resolves names (or ready-made instances) into the context's current
//! backend. `"auto"` probes the configured candidates in order and falls back
//! to the headless backend; installing a backend that needs a different
//! native event framework than the one already running is refused.
//!
//! Installing a backend never touches figures promoted under the previous
//! one. Those keep their windows; promoting them again reports
//! [`GuiError::BackendMismatch`] until they are demoted.

use super::{Backend, EventFramework};
use crate::core::config::AUTO_BACKEND;
use crate::core::context::GuiContext;
use crate::error::{BackendError, GuiError, GuiResult};
use std::fmt;
use std::sync::Arc;

/// What to install as the current backend
#[derive(Clone)]
pub enum BackendSpec {
    /// Probe the configured candidates, then the headless fallback
    Auto,
    /// Load a registered backend by name (case-insensitive)
    Named(String),
    /// Install this backend as-is
    Instance(Arc<dyn Backend>),
}

impl fmt::Debug for BackendSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("Auto"),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Instance(backend) => f.debug_tuple("Instance").field(&backend.name()).finish(),
        }
    }
}

impl From<&str> for BackendSpec {
    fn from(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case(AUTO_BACKEND) {
            Self::Auto
        } else {
            Self::Named(name.trim().to_ascii_lowercase())
        }
    }
}

impl From<String> for BackendSpec {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<Arc<dyn Backend>> for BackendSpec {
    fn from(backend: Arc<dyn Backend>) -> Self {
        Self::Instance(backend)
    }
}

impl GuiContext {
    /// Make `loader` available under `name` for [`BackendSpec::Named`] and `"auto"`
    ///
    /// Replaces any loader previously registered under the same name.
    pub fn register_backend<F>(&self, name: &str, loader: F)
    where
        F: Fn() -> Result<Arc<dyn Backend>, BackendError> + Send + Sync + 'static,
    {
        self.lock_backends()
            .loaders
            .insert(name.trim().to_ascii_lowercase(), Arc::new(loader));
    }

    /// Names with a registered loader, sorted
    pub fn registered_backends(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock_backends().loaders.keys().cloned().collect();
        names.sort();
        names
    }

    /// Load or accept a backend and install it as the current one
    pub fn select_backend(&self, spec: impl Into<BackendSpec>) -> GuiResult<Arc<dyn Backend>> {
        match spec.into() {
            BackendSpec::Auto => self.select_auto(),
            BackendSpec::Named(name) => self.select_named(&name),
            BackendSpec::Instance(backend) => self.install(backend),
        }
    }

    /// The installed backend, selecting the configured one on first use
    pub fn current_backend(&self) -> GuiResult<Arc<dyn Backend>> {
        if let Some(backend) = self.lock_backends().current.clone() {
            return Ok(backend);
        }
        let requested = self.config().backend.clone();
        log::debug!("No backend selected yet, resolving {requested:?}");
        self.select_backend(requested)
    }

    /// Framework started by a native backend in this process, if any
    pub fn running_framework(&self) -> Option<EventFramework> {
        self.lock_backends().running_framework.clone()
    }

    /// Record that a native framework is now active
    ///
    /// The first framework wins; later calls with another framework are ignored.
    pub(crate) fn mark_framework_running(&self, framework: EventFramework) {
        let mut state = self.lock_backends();
        if state.running_framework.is_none() {
            log::debug!("Event framework {framework} is now running");
            state.running_framework = Some(framework);
        }
    }

    fn select_auto(&self) -> GuiResult<Arc<dyn Backend>> {
        let mut candidates: Vec<String> = Vec::new();
        if let Some(best_guess) = self.running_framework().as_ref().and_then(EventFramework::preferred_backend) {
            candidates.push(best_guess.to_string());
        }
        candidates.extend(self.config().backend_candidates.iter().map(|c| c.to_ascii_lowercase()));

        for candidate in candidates {
            if candidate.trim() == AUTO_BACKEND {
                log::debug!("Skipping {AUTO_BACKEND:?} listed as an auto candidate");
                continue;
            }
            match self.load_named(&candidate) {
                Ok(backend) => return Ok(backend),
                Err(GuiError::Backend(err)) => {
                    log::debug!("Backend candidate {candidate:?} skipped: {err}");
                }
                Err(other) => return Err(other),
            }
        }

        // The headless fallback should always load; if it does not, that is fatal.
        let fallback = self.config().fallback_backend.to_ascii_lowercase();
        self.load_named(&fallback)
    }

    fn select_named(&self, name: &str) -> GuiResult<Arc<dyn Backend>> {
        if name.trim().eq_ignore_ascii_case(AUTO_BACKEND) {
            return self.select_auto();
        }
        self.load_named(name)
    }

    /// Load a backend by its registered name; `"auto"` is never a registered name
    fn load_named(&self, name: &str) -> GuiResult<Arc<dyn Backend>> {
        let name = name.trim().to_ascii_lowercase();
        let loader = {
            let state = self.lock_backends();
            if let Some(current) = state.current.as_ref().filter(|b| b.name().eq_ignore_ascii_case(&name)) {
                return Ok(Arc::clone(current));
            }
            state
                .loaders
                .get(&name)
                .cloned()
                .ok_or_else(|| BackendError::NotFound(name.clone()))?
        };
        let backend = loader()?;
        self.install(backend)
    }

    fn install(&self, backend: Arc<dyn Backend>) -> GuiResult<Arc<dyn Backend>> {
        let mut state = self.lock_backends();
        if let (Some(required), Some(running)) =
            (backend.required_event_framework(), state.running_framework.as_ref())
        {
            if &required != running {
                return Err(GuiError::FrameworkConflict {
                    backend: backend.name().to_string(),
                    required,
                    running: running.clone(),
                });
            }
        }

        log::debug!("Loaded backend {} version {}.", backend.name(), backend.version());
        if let Some(previous) = state.current.replace(Arc::clone(&backend)) {
            if previous.name() != backend.name() {
                log::info!("Switched GUI backend from {} to {}", previous.name(), backend.name());
            }
        }
        Ok(backend)
    }
}

/// Select the backend of the global context
///
/// Accepts `"auto"`, a registered name, or an instance (see [`BackendSpec`]).
pub fn select_backend(spec: impl Into<BackendSpec>) -> GuiResult<Arc<dyn Backend>> {
    GuiContext::global().select_backend(spec)
}

/// Backend of the global context, selected from the configuration on first use
pub fn current_backend() -> GuiResult<Arc<dyn Backend>> {
    GuiContext::global().current_backend()
}
