//! Promotion and demotion
//!
//! Promotion binds a figure to a window from the current backend: a canvas
//! wrapping the figure, a manager wrapping the canvas, and the hooks that tie
//! figure events to the window. Demotion tears the window down again and
//! leaves the figure as plain data, ready to be promoted later.

use crate::backend::{CanvasRef, ManagerRef};
use crate::core::GuiContext;
use crate::error::{GuiError, GuiResult};
use crate::figure::events::{ConnectionId, EventMask, FigureEvent};
use crate::figure::{Figure, WindowBinding};
use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::thread;

impl GuiContext {
    /// Bind `figure` to a window of the current backend
    ///
    /// Returns the existing manager when the figure is already bound to the
    /// current backend. `num` is the manager id to use; without one the next
    /// value of the process-wide counter is taken. The counter only advances
    /// when a new window is created.
    ///
    /// # Errors
    ///
    /// [`GuiError::BackendMismatch`] when the figure is bound to a window of
    /// a backend instance that is no longer current, and any error of backend
    /// selection or window creation. A failed promotion leaves the figure
    /// unbound and releases whatever was created for it.
    pub fn promote(self: &Arc<Self>, figure: &Figure, num: Option<u64>) -> GuiResult<ManagerRef> {
        let backend = self.current_backend()?;

        if let Some(binding) = figure.binding() {
            if !binding.is_from(&backend) {
                return Err(GuiError::BackendMismatch {
                    bound: binding.backend_name().to_string(),
                    current: backend.name().to_string(),
                });
            }
            return Ok(Rc::clone(binding.manager()));
        }

        let framework = backend.required_event_framework();
        if framework.is_some() && off_main_thread() {
            log::warn!(
                "Starting a {} GUI outside of the main thread ({}); native toolkits usually require the main thread",
                backend.name(),
                thread::current().name().unwrap_or("unnamed")
            );
        }

        let canvas = backend.create_canvas(figure)?;
        let num = num.unwrap_or_else(|| self.next_figure_number());
        let manager = match backend.create_manager(Rc::clone(&canvas), num) {
            Ok(manager) => manager,
            Err(err) => {
                canvas.destroy();
                return Err(err.into());
            }
        };

        let label = figure.label();
        if !label.is_empty() {
            manager.set_title(&label);
        }

        let hooks = self.connect_hooks(figure, &canvas);
        figure.attach_binding(WindowBinding {
            canvas: Rc::clone(&canvas),
            manager: Rc::clone(&manager),
            backend: Arc::clone(&backend),
            hooks,
        });
        if let Some(framework) = framework {
            self.mark_framework_running(framework);
        }
        log::debug!("Promoted figure {label:?} to window {num} on {}", backend.name());

        if self.is_interactive() {
            // A window that cannot be shown is torn down again.
            if let Err(err) = manager.show() {
                demote(figure);
                return Err(err.into());
            }
            canvas.draw_idle();
        }
        Ok(manager)
    }

    fn connect_hooks(self: &Arc<Self>, figure: &Figure, canvas: &CanvasRef) -> Vec<ConnectionId> {
        let mut hooks = Vec::with_capacity(3);

        if figure.options().auto_draw {
            let context = Arc::downgrade(self);
            let canvas: Weak<dyn crate::backend::Canvas> = Rc::downgrade(canvas);
            let idle_drawing = Rc::new(Cell::new(false));
            hooks.push(figure.connect(EventMask::STALE, move |_, _| {
                let interactive = context.upgrade().is_some_and(|c| c.is_interactive());
                let Some(canvas) = canvas.upgrade() else { return };
                if !interactive || canvas.is_saving() || idle_drawing.get() {
                    return;
                }
                idle_drawing.set(true);
                canvas.draw_idle();
                idle_drawing.set(false);
            }));
        }

        let quit_keys = self.config().quit_keys.clone();
        hooks.push(figure.connect(EventMask::KEY_PRESS, move |figure, event| {
            if let FigureEvent::KeyPress { key } = event {
                if quit_keys.iter().any(|quit| quit.eq_ignore_ascii_case(key)) {
                    log::debug!("Quit key {key:?} pressed");
                    demote(figure);
                }
            }
        }));

        hooks.push(figure.connect(EventMask::CLOSE_REQUESTED, |figure, _| {
            demote(figure);
        }));

        hooks
    }
}

/// Tear down the window bound to `figure`, keeping its content
///
/// Hooks installed by promotion are disconnected, the manager and canvas are
/// destroyed, the creation dpi is restored and `CLOSED` callbacks are
/// notified. A failing native destroy is logged and the binding is still
/// cleared. Returns `false` when the figure was not bound.
pub fn demote(figure: &Figure) -> bool {
    let Some(binding) = figure.detach_binding() else {
        return false;
    };
    for hook in &binding.hooks {
        figure.disconnect(*hook);
    }

    let num = binding.manager.num();
    if let Err(err) = binding.manager.destroy() {
        log::warn!("Destroying window {num} failed, dropping it anyway: {err}");
    }
    binding.canvas.destroy();
    figure.restore_dpi();
    log::debug!("Demoted figure {:?} from window {num}", figure.label());

    figure.dispatch(&FigureEvent::Closed);
    true
}

fn off_main_thread() -> bool {
    thread::current().name() != Some("main")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendSpec, EventFramework};
    use crate::core::GuiConfig;
    use crate::figure::{FigureOptions, GridSpan};
    use crate::test_support::{context_with, recording_canvas, recording_context, recording_manager, RecordingBackend};
    use approx::assert_relative_eq;

    #[test]
    fn test_promotion_is_idempotent() {
        let (context, _) = recording_context();
        let figure = Figure::new(FigureOptions::labelled("first"));

        let manager = context.promote(&figure, None).unwrap();
        let again = context.promote(&figure, None).unwrap();
        assert!(Rc::ptr_eq(&manager, &again));
        assert_eq!(recording_manager(&manager).title.borrow().as_str(), "first");

        // Only one window was numbered.
        let other = context.promote(&Figure::default(), None).unwrap();
        assert_eq!(other.num(), manager.num() + 1);
    }

    #[test]
    fn test_unlabelled_figure_keeps_backend_title() {
        let (context, _) = recording_context();
        let manager = context.promote(&Figure::default(), Some(12)).unwrap();
        assert_eq!(manager.num(), 12);
        assert!(recording_manager(&manager).title.borrow().is_empty());
    }

    #[test]
    fn test_demotion_preserves_content() {
        let (context, _) = recording_context();
        let figure = Figure::default();
        let axes = figure.add_axes((1, 1), GridSpan::cell(0, 0));
        axes.plot([1.0, 2.0, 3.0]);

        let manager = context.promote(&figure, None).unwrap();
        figure.set_dpi(200.0);
        assert!(demote(&figure));

        assert!(!figure.is_bound());
        assert_eq!(recording_manager(&manager).destroys.get(), 1);
        assert!(manager.canvas().figure().is_none());
        assert_eq!(axes.series_count(), 1);
        assert_relative_eq!(figure.dpi(), FigureOptions::default().dpi);
        assert!(figure.callbacks().is_empty());

        let revived = context.promote(&figure, None).unwrap();
        assert_ne!(revived.num(), manager.num());
        assert!(!demote(&Figure::default()));
    }

    #[test]
    fn test_demote_twice_is_a_no_op() {
        let (context, _) = recording_context();
        let figure = Figure::default();
        let manager = context.promote(&figure, None).unwrap();
        assert!(demote(&figure));
        assert!(!demote(&figure));
        assert_eq!(recording_manager(&manager).destroys.get(), 1);
    }

    #[test]
    fn test_failed_native_destroy_still_unbinds() {
        let backend = Arc::new(RecordingBackend::new("flaky").failing_destroy());
        let context = context_with(GuiConfig::default(), &backend);
        let figure = Figure::default();
        let closed = Rc::new(Cell::new(false));
        {
            let closed = Rc::clone(&closed);
            figure.connect(EventMask::CLOSED, move |_, _| closed.set(true));
        }

        let manager = context.promote(&figure, None).unwrap();
        assert!(demote(&figure));
        assert_eq!(recording_manager(&manager).destroys.get(), 1);
        assert!(!figure.is_bound());
        assert!(closed.get());
    }

    #[test]
    fn test_backend_switch_requires_demotion() {
        let (context, _) = recording_context();
        let figure = Figure::default();
        context.promote(&figure, None).unwrap();

        let other: Arc<dyn crate::backend::Backend> = Arc::new(RecordingBackend::new("other"));
        context.select_backend(BackendSpec::Instance(other)).unwrap();
        let Err(err) = context.promote(&figure, None) else {
            panic!("promotion under a new backend should be refused");
        };
        assert!(matches!(
            err,
            GuiError::BackendMismatch { ref bound, ref current } if bound == "recording" && current == "other"
        ));

        demote(&figure);
        let manager = context.promote(&figure, None).unwrap();
        assert_eq!(figure.binding().unwrap().backend_name(), "other");
        assert!(figure.manager().is_some_and(|m| Rc::ptr_eq(&m, &manager)));
    }

    #[test]
    fn test_same_name_backend_instance_is_a_mismatch() {
        let (context, _) = recording_context();
        let figure = Figure::default();
        context.promote(&figure, None).unwrap();

        let twin: Arc<dyn crate::backend::Backend> = Arc::new(RecordingBackend::new("recording"));
        context.select_backend(BackendSpec::Instance(Arc::clone(&twin))).unwrap();
        let result = context.promote(&figure, None);
        assert!(matches!(result, Err(GuiError::BackendMismatch { .. })));

        demote(&figure);
        context.promote(&figure, None).unwrap();
        assert!(figure.binding().unwrap().is_from(&twin));
    }

    #[test]
    fn test_failed_window_creation_releases_canvas() {
        let backend = Arc::new(RecordingBackend::new("broken").failing_manager());
        let context = context_with(GuiConfig::default(), &backend);
        let figure = Figure::default();

        let result = context.promote(&figure, None);
        assert!(matches!(result, Err(GuiError::Backend(_))));
        assert!(!figure.is_bound());
        assert_eq!(backend.live_canvases(), 0);
    }

    #[test]
    fn test_failed_interactive_show_unbinds() {
        let backend = Arc::new(RecordingBackend::new("unmappable").failing_show());
        let context = context_with(GuiConfig::default().with_interactive(true), &backend);
        let figure = Figure::default();
        let closed = Rc::new(Cell::new(0));
        {
            let closed = Rc::clone(&closed);
            figure.connect(EventMask::CLOSED, move |_, _| closed.set(closed.get() + 1));
        }

        let result = context.promote(&figure, None);
        assert!(matches!(result, Err(GuiError::Backend(_))));
        assert!(!figure.is_bound());
        assert_eq!(backend.live_canvases(), 0);
        assert_eq!(closed.get(), 1);
        assert_eq!(figure.callbacks().len(), 1);
    }

    #[test]
    fn test_quit_key_and_close_request_demote() {
        let (context, _) = recording_context();
        let figure = Figure::default();
        context.promote(&figure, None).unwrap();

        figure.dispatch(&FigureEvent::key("x"));
        assert!(figure.is_bound());
        figure.dispatch(&FigureEvent::key("Q"));
        assert!(!figure.is_bound());

        context.promote(&figure, None).unwrap();
        figure.dispatch(&FigureEvent::CloseRequested);
        assert!(!figure.is_bound());
    }

    #[test]
    fn test_interactive_promotion_shows_and_redraws() {
        let (context, _) = recording_context();
        let _on = context.ion();
        let figure = Figure::default();
        let manager = context.promote(&figure, None).unwrap();
        let canvas = manager.canvas();

        assert_eq!(recording_manager(&manager).shows.get(), 1);
        assert_eq!(recording_canvas(&canvas).draw_requests.get(), 1);

        figure.mark_stale();
        assert_eq!(recording_canvas(&canvas).draw_requests.get(), 2);

        recording_canvas(&canvas).saving.set(true);
        figure.mark_stale();
        assert_eq!(recording_canvas(&canvas).draw_requests.get(), 2);
    }

    #[test]
    fn test_stale_hook_is_idle_when_not_interactive() {
        let (context, _) = recording_context();
        let figure = Figure::default();
        let manager = context.promote(&figure, None).unwrap();
        figure.mark_stale();
        assert_eq!(recording_manager(&manager).shows.get(), 0);
        assert_eq!(recording_canvas(&manager.canvas()).draw_requests.get(), 0);
    }

    #[test]
    fn test_auto_draw_can_be_disabled() {
        let (context, _) = recording_context();
        let _on = context.ion();
        let figure = Figure::new(FigureOptions::default().with_auto_draw(false));
        let manager = context.promote(&figure, None).unwrap();
        figure.mark_stale();
        assert_eq!(recording_canvas(&manager.canvas()).draw_requests.get(), 1);
    }

    #[test]
    fn test_native_promotion_marks_framework_running() {
        let backend = Arc::new(RecordingBackend::new("qtagg").with_framework(EventFramework::Qt));
        let context = context_with(GuiConfig::default(), &backend);
        assert_eq!(context.running_framework(), None);

        // Test threads are not the main thread: this warns and carries on.
        context.promote(&Figure::default(), None).unwrap();
        assert_eq!(context.running_framework(), Some(EventFramework::Qt));
    }

    #[test]
    fn test_off_main_thread_detection() {
        let spawned = thread::Builder::new().name("worker".into()).spawn(off_main_thread).unwrap();
        assert!(spawned.join().unwrap());
    }
}
