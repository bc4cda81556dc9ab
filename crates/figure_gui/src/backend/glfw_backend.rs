//! Native windows through GLFW
//!
//! GLFW is not thread safe, so the library handle and the list of open
//! canvases live in thread-local storage on the thread that created them.
//! Windows are created hidden and only appear on `show`. Key presses and
//! close requests are forwarded to the figure, where the promotion hooks turn
//! quit keys and close requests into demotion.

use super::{Backend, Canvas, CanvasRef, EventFramework, Manager, ManagerRef};
use crate::error::BackendError;
use crate::figure::events::FigureEvent;
use crate::figure::{Figure, WeakFigure};
use glfw::{Action, Modifiers, WindowEvent};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

/// Registered name of the GLFW backend
pub const GLFW_BACKEND: &str = "glfw";

/// Longest single wait while a blocking loop polls for closed windows
const POLL_INTERVAL: Duration = Duration::from_millis(100);

thread_local! {
    static GLFW: RefCell<Option<glfw::Glfw>> = const { RefCell::new(None) };
    static CANVASES: RefCell<Vec<Weak<GlfwCanvas>>> = const { RefCell::new(Vec::new()) };
}

fn unavailable(reason: impl Into<String>) -> BackendError {
    BackendError::Unavailable {
        name: GLFW_BACKEND.to_string(),
        reason: reason.into(),
    }
}

/// Run `f` with this thread's GLFW handle, initialising it on first use
fn with_glfw<R>(f: impl FnOnce(&mut glfw::Glfw) -> R) -> Result<R, BackendError> {
    GLFW.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_none() {
            let glfw = glfw::init(glfw::fail_on_errors).map_err(|err| unavailable(format!("{err:?}")))?;
            *slot = Some(glfw);
        }
        slot.as_mut().map(f).ok_or_else(|| unavailable("GLFW handle missing"))
    })
}

/// Backend opening one GLFW window per figure
#[derive(Debug)]
pub struct GlfwBackend {
    version: String,
}

impl GlfwBackend {
    /// Initialise GLFW on the calling thread
    ///
    /// # Errors
    ///
    /// [`BackendError::Unavailable`] when the library cannot be initialised,
    /// e.g. without a display.
    pub fn load() -> Result<Self, BackendError> {
        let version = with_glfw(|_| glfw::get_version_string())?;
        Ok(Self { version })
    }
}

impl Backend for GlfwBackend {
    fn name(&self) -> &str {
        GLFW_BACKEND
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn required_event_framework(&self) -> Option<EventFramework> {
        Some(EventFramework::Glfw)
    }

    fn create_canvas(&self, figure: &Figure) -> Result<CanvasRef, BackendError> {
        let (width, height) = figure.pixel_size();
        let label = figure.label();
        let (mut window, events) = with_glfw(|glfw| {
            glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
            glfw.window_hint(glfw::WindowHint::Resizable(true));
            glfw.window_hint(glfw::WindowHint::Visible(false));
            glfw.create_window(width, height, &label, glfw::WindowMode::Windowed)
        })?
        .ok_or_else(|| BackendError::Native("window creation failed".to_string()))?;

        window.set_key_polling(true);
        window.set_close_polling(true);

        let canvas = Rc::new(GlfwCanvas {
            figure: RefCell::new(figure.downgrade()),
            window: RefCell::new(Some(window)),
            events,
            draw_pending: Cell::new(false),
        });
        CANVASES.with(|live| live.borrow_mut().push(Rc::downgrade(&canvas)));
        Ok(canvas)
    }

    fn create_manager(&self, canvas: CanvasRef, num: u64) -> Result<ManagerRef, BackendError> {
        if canvas.as_any().downcast_ref::<GlfwCanvas>().is_none() {
            return Err(BackendError::Native("canvas was not created by the glfw backend".to_string()));
        }
        Ok(Rc::new(GlfwManager {
            num,
            canvas,
            title: RefCell::new(format!("Figure {num}")),
        }))
    }

    fn run_event_loop(&self, managers: &[ManagerRef], block: bool) -> Result<(), BackendError> {
        for manager in managers {
            manager.show()?;
        }
        if !block {
            return pump(None);
        }
        // Runs until every window of this backend is closed, not only `managers`.
        while open_canvases() > 0 {
            pump(Some(POLL_INTERVAL))?;
        }
        Ok(())
    }
}

/// Canvas backed by a hidden-until-shown GLFW window
pub struct GlfwCanvas {
    figure: RefCell<WeakFigure>,
    window: RefCell<Option<glfw::PWindow>>,
    events: glfw::GlfwReceiver<(f64, WindowEvent)>,
    draw_pending: Cell<bool>,
}

impl GlfwCanvas {
    fn is_open(&self) -> bool {
        self.window.borrow().is_some()
    }

    fn with_window(&self, f: impl FnOnce(&mut glfw::PWindow)) {
        if let Some(window) = self.window.borrow_mut().as_mut() {
            f(window);
        }
    }

    /// Forward queued native events to the figure
    fn process_events(&self) {
        let events: Vec<WindowEvent> = glfw::flush_messages(&self.events).map(|(_, event)| event).collect();
        let Some(figure) = self.figure() else { return };

        if self.draw_pending.replace(false) {
            figure.mark_drawn();
        }
        for event in events {
            match event {
                WindowEvent::Key(key, _, Action::Press, mods) => {
                    figure.dispatch(&FigureEvent::key(key_name(key, mods)));
                }
                WindowEvent::Close => {
                    // Closing is the figure's decision, made by its hooks.
                    self.with_window(|window| window.set_should_close(false));
                    figure.dispatch(&FigureEvent::CloseRequested);
                }
                _ => {}
            }
        }
    }
}

impl Canvas for GlfwCanvas {
    fn figure(&self) -> Option<Figure> {
        self.figure.borrow().upgrade()
    }

    fn start_event_loop(&self, timeout: Duration) -> Result<(), BackendError> {
        let deadline = Instant::now() + timeout;
        while self.is_open() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            pump(Some(remaining.min(POLL_INTERVAL)))?;
        }
        Ok(())
    }

    fn draw_idle(&self) {
        // Picked up by the next pump of the event loop.
        self.draw_pending.set(true);
    }

    fn destroy(&self) {
        // Dropping the window closes it.
        self.window.borrow_mut().take();
        *self.figure.borrow_mut() = WeakFigure::default();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Window controller for a [`GlfwCanvas`]
pub struct GlfwManager {
    num: u64,
    canvas: CanvasRef,
    title: RefCell<String>,
}

impl GlfwManager {
    fn glfw_canvas(&self) -> Option<&GlfwCanvas> {
        self.canvas.as_any().downcast_ref()
    }
}

impl Manager for GlfwManager {
    fn num(&self) -> u64 {
        self.num
    }

    fn canvas(&self) -> CanvasRef {
        Rc::clone(&self.canvas)
    }

    fn show(&self) -> Result<(), BackendError> {
        let canvas = self
            .glfw_canvas()
            .filter(|canvas| canvas.is_open())
            .ok_or_else(|| BackendError::Native(format!("window {} is closed", self.num)))?;
        let title = self.title.borrow().clone();
        canvas.with_window(|window| {
            window.set_title(&title);
            window.show();
        });
        Ok(())
    }

    fn destroy(&self) -> Result<(), BackendError> {
        self.canvas.destroy();
        Ok(())
    }

    fn set_title(&self, title: &str) {
        *self.title.borrow_mut() = title.to_string();
        if let Some(canvas) = self.glfw_canvas() {
            canvas.with_window(|window| window.set_title(title));
        }
    }

    fn title(&self) -> String {
        self.title.borrow().clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Wait for native events (or just poll with `None`) and dispatch them
fn pump(wait: Option<Duration>) -> Result<(), BackendError> {
    with_glfw(|glfw| match wait {
        Some(wait) => glfw.wait_events_timeout(wait.as_secs_f64()),
        None => glfw.poll_events(),
    })?;
    // Collect first: handlers may destroy windows and touch the list.
    let live: Vec<Rc<GlfwCanvas>> = CANVASES.with(|canvases| {
        let mut canvases = canvases.borrow_mut();
        canvases.retain(|canvas| canvas.upgrade().is_some_and(|c| c.is_open()));
        canvases.iter().filter_map(Weak::upgrade).collect()
    });
    for canvas in live {
        canvas.process_events();
    }
    Ok(())
}

fn open_canvases() -> usize {
    CANVASES.with(|canvases| {
        canvases
            .borrow()
            .iter()
            .filter(|canvas| canvas.upgrade().is_some_and(|c| c.is_open()))
            .count()
    })
}

/// Key name with modifier prefixes, e.g. `"ctrl+w"`
fn key_name(key: glfw::Key, mods: Modifiers) -> String {
    let mut name = String::new();
    if mods.contains(Modifiers::Control) {
        name.push_str("ctrl+");
    }
    if mods.contains(Modifiers::Super) {
        name.push_str("cmd+");
    }
    if mods.contains(Modifiers::Alt) {
        name.push_str("alt+");
    }
    name.push_str(&format!("{key:?}").to_ascii_lowercase());
    name
}
