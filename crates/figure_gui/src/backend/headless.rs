//! Headless backend
//!
//! Windows are virtual: canvases keep a raster size and count redraw
//! requests, managers track visibility and titles. It has no native event
//! framework, so it is always compatible and always loads, which makes it the
//! fallback of automatic selection.

use super::{Backend, Canvas, CanvasRef, Manager, ManagerRef};
use crate::error::BackendError;
use crate::figure::{Figure, WeakFigure};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Registered name of the headless backend
pub const HEADLESS_BACKEND: &str = "headless";

/// Backend without a display
#[derive(Debug, Default)]
pub struct HeadlessBackend;

impl HeadlessBackend {
    /// Create the backend
    pub fn new() -> Self {
        Self
    }
}

impl Backend for HeadlessBackend {
    fn name(&self) -> &str {
        HEADLESS_BACKEND
    }

    fn create_canvas(&self, figure: &Figure) -> Result<CanvasRef, BackendError> {
        Ok(Rc::new(HeadlessCanvas::new(figure)))
    }

    fn create_manager(&self, canvas: CanvasRef, num: u64) -> Result<ManagerRef, BackendError> {
        Ok(Rc::new(HeadlessManager::new(canvas, num)))
    }

    fn run_event_loop(&self, managers: &[ManagerRef], block: bool) -> Result<(), BackendError> {
        for manager in managers {
            manager.show()?;
        }
        if block && !managers.is_empty() {
            log::warn!(
                "The {HEADLESS_BACKEND} backend is non-interactive; not blocking on {} window(s)",
                managers.len()
            );
        }
        Ok(())
    }
}

/// Off-screen drawing surface
#[derive(Debug)]
pub struct HeadlessCanvas {
    figure: RefCell<WeakFigure>,
    size: (u32, u32),
    pending_draws: Cell<usize>,
}

impl HeadlessCanvas {
    fn new(figure: &Figure) -> Self {
        Self {
            figure: RefCell::new(figure.downgrade()),
            size: figure.pixel_size(),
            pending_draws: Cell::new(0),
        }
    }

    /// Raster size in pixels
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Redraws requested and not yet flushed
    pub fn pending_draws(&self) -> usize {
        self.pending_draws.get()
    }

    /// Perform queued redraws; returns whether anything was pending
    pub fn flush_draws(&self) -> bool {
        if self.pending_draws.replace(0) == 0 {
            return false;
        }
        if let Some(figure) = self.figure() {
            figure.mark_drawn();
        }
        true
    }
}

impl Canvas for HeadlessCanvas {
    fn figure(&self) -> Option<Figure> {
        self.figure.borrow().upgrade()
    }

    fn start_event_loop(&self, timeout: Duration) -> Result<(), BackendError> {
        // Nothing can interrupt a headless loop, so it simply waits.
        log::debug!("Headless event loop idling for {timeout:?}");
        self.flush_draws();
        std::thread::sleep(timeout);
        Ok(())
    }

    fn draw_idle(&self) {
        self.pending_draws.set(self.pending_draws.get() + 1);
    }

    fn destroy(&self) {
        *self.figure.borrow_mut() = WeakFigure::default();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Virtual window
pub struct HeadlessManager {
    num: u64,
    canvas: CanvasRef,
    title: RefCell<String>,
    visible: Cell<bool>,
    destroyed: Cell<bool>,
}

impl HeadlessManager {
    fn new(canvas: CanvasRef, num: u64) -> Self {
        Self {
            num,
            canvas,
            title: RefCell::new(format!("Figure {num}")),
            visible: Cell::new(false),
            destroyed: Cell::new(false),
        }
    }

    /// Whether `show` was called and the window is not destroyed
    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    /// Whether `destroy` was called
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }
}

impl Manager for HeadlessManager {
    fn num(&self) -> u64 {
        self.num
    }

    fn canvas(&self) -> CanvasRef {
        Rc::clone(&self.canvas)
    }

    fn show(&self) -> Result<(), BackendError> {
        if self.destroyed.get() {
            return Err(BackendError::Native(format!("window {} was already destroyed", self.num)));
        }
        self.visible.set(true);
        Ok(())
    }

    fn destroy(&self) -> Result<(), BackendError> {
        self.visible.set(false);
        self.destroyed.set(true);
        self.canvas.destroy();
        Ok(())
    }

    fn set_title(&self, title: &str) {
        *self.title.borrow_mut() = title.to_string();
    }

    fn title(&self) -> String {
        self.title.borrow().clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
