//! Scoped figure registry
//!
//! ```no_run
//! use figure_gui::{FigureContext, FigureOptions, GuiError, RegistryOptions};
//!
//! FigureContext::new(RegistryOptions::default()).scope(|figures| {
//!     let (_, axes) = figures.subplots(1, 2, FigureOptions::default())?;
//!     axes[(0, 1)].plot([3.0, 1.0, 2.0]);
//!     Ok::<_, GuiError>(())
//! })?;
//! # Ok::<(), GuiError>(())
//! ```

use super::{FigureRegistry, RegistryOptions};
use crate::core::GuiContext;
use crate::error::GuiError;
use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Registry that shows its figures when a scope ends
///
/// A scope that fails (returns `Err` or panics) skips the show, unless
/// [`forgive_failure`](Self::forgive_failure) was set, in which case the
/// figures are shown before the failure is passed on.
#[derive(Debug)]
pub struct FigureContext {
    registry: FigureRegistry,
    forgive_failure: bool,
}

impl FigureContext {
    /// Scoped registry on the global context
    pub fn new(options: RegistryOptions) -> Self {
        Self::from_registry(FigureRegistry::new(options))
    }

    /// Scoped registry on an explicit context
    pub fn with_context(context: Arc<GuiContext>, options: RegistryOptions) -> Self {
        Self::from_registry(FigureRegistry::with_context(context, options))
    }

    fn from_registry(registry: FigureRegistry) -> Self {
        Self { registry, forgive_failure: false }
    }

    /// Show figures even when the scope fails
    pub fn forgive_failure(mut self, forgive: bool) -> Self {
        self.forgive_failure = forgive;
        self
    }

    /// Run `body` with a fresh registry, then show what it created
    ///
    /// Figures registered before the scope starts are forgotten on entry;
    /// their windows are left alone and they are not shown. On success the result of `body` is returned once `show_all` finished;
    /// an error from `show_all` itself is returned instead. Failures of
    /// `body` propagate unchanged, panics included. When a forgiven failure
    /// is shown, an error from that show is logged and the original failure
    /// wins.
    pub fn scope<T, E, F>(self, body: F) -> Result<T, E>
    where
        F: FnOnce(&FigureRegistry) -> Result<T, E>,
        E: From<GuiError>,
    {
        if !self.registry.is_empty() {
            log::debug!("Figure scope starts by forgetting {} figure(s)", self.registry.len());
            self.registry.forget_all();
        }
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&self.registry)));
        match outcome {
            Ok(Ok(value)) => {
                self.registry.show()?;
                Ok(value)
            }
            Ok(Err(err)) => {
                self.show_forgiven();
                Err(err)
            }
            Err(payload) => {
                self.show_forgiven();
                panic::resume_unwind(payload)
            }
        }
    }

    fn show_forgiven(&self) {
        if !self.forgive_failure {
            log::debug!("Figure scope failed; not showing {} figure(s)", self.registry.len());
            return;
        }
        if let Err(err) = self.registry.show() {
            log::warn!("Showing figures of a failed scope failed too: {err}");
        }
    }
}

impl Deref for FigureContext {
    type Target = FigureRegistry;

    fn deref(&self) -> &Self::Target {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::{Figure, FigureOptions};
    use crate::test_support::{recording_canvas, recording_context};
    use std::cell::RefCell;
    use std::time::Duration;

    #[derive(Debug)]
    enum ScopeError {
        Failed,
        Gui(GuiError),
    }

    impl From<GuiError> for ScopeError {
        fn from(err: GuiError) -> Self {
            Self::Gui(err)
        }
    }

    fn timed() -> RegistryOptions {
        RegistryOptions::default().with_block(true).with_timeout(Duration::from_secs(1))
    }

    #[test]
    fn test_scope_shows_on_success() {
        let (context, _) = recording_context();
        let figure = FigureContext::with_context(context, timed())
            .scope(|figures| {
                let figure = figures.figure(FigureOptions::default())?;
                figures.subplots(1, 1, FigureOptions::default())?;
                figures.subplot_mosaic("A\nB", FigureOptions::default())?;
                Ok::<_, GuiError>(figure)
            })
            .unwrap();

        let canvas = figure.canvas().unwrap();
        assert_eq!(*recording_canvas(&canvas).timed_loops.borrow(), vec![Duration::from_secs(1)]);
    }

    #[test]
    fn test_scope_failure_skips_show() {
        for forgiving in [true, false] {
            let (context, backend) = recording_context();
            let created: RefCell<Option<Figure>> = RefCell::new(None);
            let result = FigureContext::with_context(context, RegistryOptions::default().with_block(true))
                .forgive_failure(forgiving)
                .scope(|figures| {
                    created.replace(Some(figures.figure(FigureOptions::default())?));
                    Err::<(), _>(ScopeError::Failed)
                });

            assert!(matches!(result, Err(ScopeError::Failed)));
            let figure = created.into_inner().unwrap();
            assert_eq!(figure.is_bound(), forgiving);
            assert_eq!(backend.blocking_calls(), usize::from(forgiving));
        }
    }

    #[test]
    fn test_forgiven_panic_still_shows() {
        let (context, backend) = recording_context();
        let scoped = FigureContext::with_context(context, RegistryOptions::default().with_block(true))
            .forgive_failure(true);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            scoped.scope(|figures| -> Result<(), GuiError> {
                figures.figure(FigureOptions::default())?;
                panic!("plotting failed");
            })
        }));
        assert!(result.is_err());
        assert_eq!(backend.blocking_calls(), 1);
    }

    #[test]
    fn test_scope_starts_with_an_empty_registry() {
        let (context, backend) = recording_context();
        let scoped = FigureContext::with_context(context, RegistryOptions::default().with_block(false));
        let earlier = scoped.figure(FigureOptions::default()).unwrap();
        assert_eq!(scoped.len(), 1);

        let created = scoped
            .scope(|figures| {
                assert!(figures.is_empty());
                figures.figure(FigureOptions::default())
            })
            .unwrap();

        assert!(!earlier.is_bound());
        assert!(earlier.callbacks().is_empty());
        assert!(created.is_bound());
        let shown: Vec<Vec<u64>> = backend.loop_calls().into_iter().map(|call| call.managers).collect();
        assert_eq!(shown, vec![vec![created.manager().unwrap().num()]]);
    }

    #[test]
    fn test_gui_errors_convert_into_scope_error() {
        let (context, _) = recording_context();
        let result = FigureContext::with_context(context, timed()).scope(|figures| {
            figures.subplots(0, 1, FigureOptions::default())?;
            Ok::<_, ScopeError>(())
        });
        assert!(matches!(result, Err(ScopeError::Gui(GuiError::Layout(_)))));
    }
}
