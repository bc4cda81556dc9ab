//! Figures: plot content plus presentation metadata
//!
//! A [`Figure`] is plain data. It knows nothing about toolkits until the
//! promotion engine attaches a [`WindowBinding`] (canvas, manager and the
//! backend that made them); demotion removes the binding again and leaves the
//! content untouched, so the same figure can be shown any number of times.
//!
//! `Figure` is a cheap, reference-counted handle. Clones refer to the same
//! figure, and equality is identity.

pub mod content;
pub mod events;
pub mod layout;

use crate::backend::{Backend, CanvasRef, ManagerRef};
use crate::core::config::FigureDefaults;
use content::DrawTree;
use events::{CallbackRegistry, ConnectionId, EventMask, FigureEvent};
use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use std::sync::Arc;

pub use content::{Axes, AxesGrid};
pub use layout::{GridSpan, LayoutError, Mosaic};

/// Options for a new figure
#[derive(Debug, Clone, PartialEq)]
pub struct FigureOptions {
    /// Window title; empty lets a registry generate one
    pub label: String,
    /// Width and height in inches
    pub size: (f32, f32),
    /// Dots per inch
    pub dpi: f32,
    /// Background color
    pub facecolor: String,
    /// Border color
    pub edgecolor: String,
    /// Whether the frame is drawn
    pub frameon: bool,
    /// Request redraws automatically in interactive mode
    pub auto_draw: bool,
}

impl FigureOptions {
    /// Options with `label`, everything else from the built-in defaults
    pub fn labelled(label: impl Into<String>) -> Self {
        Self::default().with_label(label)
    }

    /// Set the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the size in inches
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = (width, height);
        self
    }

    /// Set the resolution
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the background color
    pub fn with_facecolor(mut self, color: impl Into<String>) -> Self {
        self.facecolor = color.into();
        self
    }

    /// Enable or disable automatic redraws
    pub fn with_auto_draw(mut self, auto_draw: bool) -> Self {
        self.auto_draw = auto_draw;
        self
    }
}

impl From<&FigureDefaults> for FigureOptions {
    fn from(defaults: &FigureDefaults) -> Self {
        Self {
            label: String::new(),
            size: defaults.size,
            dpi: defaults.dpi,
            facecolor: defaults.facecolor.clone(),
            edgecolor: defaults.edgecolor.clone(),
            frameon: defaults.frameon,
            auto_draw: defaults.auto_draw,
        }
    }
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self::from(&FigureDefaults::default())
    }
}

/// Live window state attached to a promoted figure
pub struct WindowBinding {
    pub(crate) canvas: CanvasRef,
    pub(crate) manager: ManagerRef,
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) hooks: Vec<ConnectionId>,
}

impl WindowBinding {
    /// Drawing surface
    pub fn canvas(&self) -> &CanvasRef {
        &self.canvas
    }

    /// Window controller
    pub fn manager(&self) -> &ManagerRef {
        &self.manager
    }

    /// Backend that created the window
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Name of the backend that created the window
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Whether `backend` is the instance that created the window
    ///
    /// Instances are compared, not names: two backends registered under the
    /// same name are still different backends.
    pub fn is_from(&self, backend: &Arc<dyn Backend>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.backend), Arc::as_ptr(backend))
    }
}

impl fmt::Debug for WindowBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowBinding")
            .field("num", &self.manager.num())
            .field("backend", &self.backend.name())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

struct FigureInner {
    label: RefCell<String>,
    options: FigureOptions,
    dpi: Cell<f32>,
    stale: Cell<bool>,
    content: RefCell<DrawTree>,
    binding: RefCell<Option<WindowBinding>>,
    callbacks: CallbackRegistry,
}

/// Handle to a figure
#[derive(Clone)]
pub struct Figure {
    inner: Rc<FigureInner>,
}

/// Non-owning figure handle, used by canvases and axes
#[derive(Clone, Default)]
pub struct WeakFigure {
    inner: Weak<FigureInner>,
}

impl WeakFigure {
    /// Upgrade to a figure if it is still alive
    pub fn upgrade(&self) -> Option<Figure> {
        self.inner.upgrade().map(|inner| Figure { inner })
    }
}

impl fmt::Debug for WeakFigure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakFigure").field("alive", &(self.inner.strong_count() > 0)).finish()
    }
}

impl Figure {
    /// Create an unbound figure
    pub fn new(options: FigureOptions) -> Self {
        Self {
            inner: Rc::new(FigureInner {
                label: RefCell::new(options.label.clone()),
                dpi: Cell::new(options.dpi),
                stale: Cell::new(true),
                content: RefCell::new(DrawTree::default()),
                binding: RefCell::new(None),
                callbacks: CallbackRegistry::default(),
                options,
            }),
        }
    }

    /// Label, empty when unset
    pub fn label(&self) -> String {
        self.inner.label.borrow().clone()
    }

    /// Change the label
    ///
    /// An already open window keeps its title.
    pub fn set_label(&self, label: impl Into<String>) {
        *self.inner.label.borrow_mut() = label.into();
    }

    /// Options the figure was created with
    pub fn options(&self) -> &FigureOptions {
        &self.inner.options
    }

    /// Current resolution
    pub fn dpi(&self) -> f32 {
        self.inner.dpi.get()
    }

    /// Change the resolution, e.g. for a high-DPI canvas
    pub fn set_dpi(&self, dpi: f32) {
        self.inner.dpi.set(dpi);
        self.mark_stale();
    }

    /// Size in pixels at the current resolution
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn pixel_size(&self) -> (u32, u32) {
        let (width, height) = self.inner.options.size;
        let dpi = self.dpi();
        ((width * dpi).round().max(1.0) as u32, (height * dpi).round().max(1.0) as u32)
    }

    /// Whether a window is currently attached
    pub fn is_bound(&self) -> bool {
        self.inner.binding.borrow().is_some()
    }

    /// Borrow the window binding
    pub fn binding(&self) -> Option<Ref<'_, WindowBinding>> {
        Ref::filter_map(self.inner.binding.borrow(), Option::as_ref).ok()
    }

    /// Manager of the attached window
    pub fn manager(&self) -> Option<ManagerRef> {
        self.inner.binding.borrow().as_ref().map(|b| Rc::clone(&b.manager))
    }

    /// Canvas of the attached window
    pub fn canvas(&self) -> Option<CanvasRef> {
        self.inner.binding.borrow().as_ref().map(|b| Rc::clone(&b.canvas))
    }

    pub(crate) fn attach_binding(&self, binding: WindowBinding) {
        let previous = self.inner.binding.borrow_mut().replace(binding);
        debug_assert!(previous.is_none(), "figure promoted twice without demotion");
    }

    pub(crate) fn detach_binding(&self) -> Option<WindowBinding> {
        self.inner.binding.borrow_mut().take()
    }

    pub(crate) fn restore_dpi(&self) {
        self.inner.dpi.set(self.inner.options.dpi);
    }

    /// Run `f` with read access to the content
    pub fn with_content<R>(&self, f: impl FnOnce(&DrawTree) -> R) -> R {
        f(&*self.inner.content.borrow())
    }

    /// Run `f` with write access to the content
    ///
    /// Does not mark the figure stale; callers decide when a change is
    /// worth a redraw.
    pub fn with_content_mut<R>(&self, f: impl FnOnce(&mut DrawTree) -> R) -> R {
        f(&mut *self.inner.content.borrow_mut())
    }

    /// Whether the content changed since the last draw
    pub fn is_stale(&self) -> bool {
        self.inner.stale.get()
    }

    /// Flag the content as changed and notify `STALE` callbacks
    pub fn mark_stale(&self) {
        self.inner.stale.set(true);
        self.dispatch(&FigureEvent::Stale);
    }

    /// Called by canvases once the content has been drawn
    pub fn mark_drawn(&self) {
        self.inner.stale.set(false);
    }

    /// Callback storage
    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.inner.callbacks
    }

    /// Subscribe to figure events
    pub fn connect<F>(&self, mask: EventMask, callback: F) -> ConnectionId
    where
        F: Fn(&Figure, &FigureEvent) + 'static,
    {
        self.inner.callbacks.connect(mask, callback)
    }

    /// Unsubscribe; returns whether the callback was connected
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.inner.callbacks.disconnect(id)
    }

    /// Deliver an event; backends use this to report native input
    pub fn dispatch(&self, event: &FigureEvent) -> usize {
        self.inner.callbacks.dispatch(self, event)
    }

    /// Non-owning handle
    pub fn downgrade(&self) -> WeakFigure {
        WeakFigure { inner: Rc::downgrade(&self.inner) }
    }

    /// Whether two handles refer to the same figure
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Figure {
    fn default() -> Self {
        Self::new(FigureOptions::default())
    }
}

impl PartialEq for Figure {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Figure {}

impl Hash for Figure {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.inner), state);
    }
}

impl fmt::Debug for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Figure")
            .field("label", &*self.inner.label.borrow())
            .field("binding", &*self.inner.binding.borrow())
            .field("axes", &self.inner.content.borrow().axes.len())
            .finish()
    }
}
