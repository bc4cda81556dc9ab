//! GUI backend contract
//!
//! A backend turns a [`Figure`] into a drawing surface ([`Canvas`]) and a
//! window controller ([`Manager`]) for one toolkit, and owns that toolkit's
//! native event loop. Backends are plain strategy objects: the crate ships a
//! [`headless`] backend that never fails to load and, behind the `glfw`
//! feature, a native GLFW backend. Other toolkits plug in by registering a
//! loader on the [`GuiContext`](crate::core::GuiContext).
//!
//! ```text
//! ┌──────────────┐  create_canvas   ┌────────┐  create_manager  ┌─────────┐
//! │   Backend    │ ───────────────► │ Canvas │ ───────────────► │ Manager │
//! │ (per toolkit)│                  └────────┘                  └─────────┘
//! └──────┬───────┘
//!        │ run_event_loop(managers, block)
//!        ▼
//!   native event loop
//! ```

pub mod headless;
pub mod registry;

#[cfg(feature = "glfw")]
pub mod glfw_backend;

use crate::error::BackendError;
use crate::figure::Figure;
use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

pub use registry::BackendSpec;

/// Shared handle to a backend canvas
pub type CanvasRef = Rc<dyn Canvas>;

/// Shared handle to a backend window manager
pub type ManagerRef = Rc<dyn Manager>;

/// Native event framework a backend depends on
///
/// Only one framework can drive the process; see
/// [`GuiContext::select_backend`](crate::core::GuiContext::select_backend).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventFramework {
    /// Qt
    Qt,
    /// GTK 3
    Gtk3,
    /// GTK 4
    Gtk4,
    /// wxWidgets
    Wx,
    /// Tk
    Tk,
    /// Cocoa on macOS
    MacOs,
    /// GLFW
    Glfw,
    /// Any other toolkit
    Custom(String),
}

impl EventFramework {
    /// Backend name that best matches a framework already running
    pub fn preferred_backend(&self) -> Option<&'static str> {
        match self {
            Self::Qt => Some("qt"),
            Self::Gtk3 => Some("gtk3"),
            Self::Gtk4 => Some("gtk4"),
            Self::Wx => Some("wx"),
            Self::Tk => Some("tk"),
            Self::MacOs => Some("macosx"),
            Self::Glfw => Some("glfw"),
            Self::Custom(_) => None,
        }
    }
}

impl fmt::Display for EventFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Qt => f.write_str("qt"),
            Self::Gtk3 => f.write_str("gtk3"),
            Self::Gtk4 => f.write_str("gtk4"),
            Self::Wx => f.write_str("wx"),
            Self::Tk => f.write_str("tk"),
            Self::MacOs => f.write_str("macosx"),
            Self::Glfw => f.write_str("glfw"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

/// Drawing surface bound to one figure at a time
pub trait Canvas {
    /// Figure drawn by this canvas, `None` once destroyed
    fn figure(&self) -> Option<Figure>;

    /// Run a local event loop until `timeout` elapses or the loop is stopped
    fn start_event_loop(&self, timeout: Duration) -> Result<(), BackendError>;

    /// Whether the canvas is currently writing the figure out
    fn is_saving(&self) -> bool {
        false
    }

    /// Queue a redraw for the next time the event loop is idle
    fn draw_idle(&self);

    /// Manager of the window showing this canvas, `None` when not in a window
    fn manager(&self) -> Option<ManagerRef> {
        let manager = self.figure()?.manager()?;
        let shows_self = std::ptr::addr_eq(Rc::as_ptr(&manager.canvas()), self as *const Self);
        shows_self.then_some(manager)
    }

    /// Release native resources and forget the figure
    fn destroy(&self);

    /// Concrete type access for backend-specific code
    fn as_any(&self) -> &dyn Any;
}

/// Controller for one window
pub trait Manager {
    /// Window number, unique within the promotion counter that produced it
    fn num(&self) -> u64;

    /// Canvas shown in this window
    fn canvas(&self) -> CanvasRef;

    /// Make the window visible
    fn show(&self) -> Result<(), BackendError>;

    /// Close the window and release it
    fn destroy(&self) -> Result<(), BackendError>;

    /// Set the window title
    fn set_title(&self, title: &str);

    /// Current window title
    fn title(&self) -> String;

    /// Concrete type access for backend-specific code
    fn as_any(&self) -> &dyn Any;
}

/// Window and event-loop capabilities of one GUI toolkit
pub trait Backend: Send + Sync {
    /// Name the backend is registered under
    fn name(&self) -> &str;

    /// Backend version for diagnostics
    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    /// Native framework this backend drives, `None` for headless backends
    fn required_event_framework(&self) -> Option<EventFramework> {
        None
    }

    /// Wrap a figure in a new canvas
    fn create_canvas(&self, figure: &Figure) -> Result<CanvasRef, BackendError>;

    /// Create a window for `canvas` numbered `num`
    fn create_manager(&self, canvas: CanvasRef, num: u64) -> Result<ManagerRef, BackendError>;

    /// Show `managers`; when `block` is set, run the native loop until every
    /// window this backend knows about has closed
    fn run_event_loop(&self, managers: &[ManagerRef], block: bool) -> Result<(), BackendError>;
}

impl fmt::Debug for dyn Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("name", &self.name())
            .field("version", &self.version())
            .field("framework", &self.required_event_framework())
            .finish()
    }
}

impl fmt::Debug for dyn Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("figure", &self.figure().map(|figure| figure.label()))
            .field("saving", &self.is_saving())
            .finish()
    }
}

impl fmt::Debug for dyn Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("num", &self.num())
            .field("title", &self.title())
            .finish()
    }
}

/// Shorthand for handing a backend instance to `select_backend`
pub fn instance<B: Backend + 'static>(backend: B) -> BackendSpec {
    BackendSpec::Instance(Arc::new(backend))
}
