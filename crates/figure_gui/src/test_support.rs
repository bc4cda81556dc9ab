//! Recording backend and isolated contexts for unit tests

use crate::backend::{Backend, BackendSpec, Canvas, CanvasRef, EventFramework, Manager, ManagerRef};
use crate::core::{GuiConfig, GuiContext};
use crate::error::BackendError;
use crate::figure::{Figure, WeakFigure};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One `run_event_loop` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoopCall {
    pub managers: Vec<u64>,
    pub block: bool,
}

/// Backend that records every call instead of opening windows
pub(crate) struct RecordingBackend {
    name: String,
    framework: Option<EventFramework>,
    fail_destroy: bool,
    fail_manager: bool,
    fail_show: bool,
    live_canvases: Arc<AtomicUsize>,
    loop_calls: Mutex<Vec<LoopCall>>,
}

impl RecordingBackend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            framework: None,
            fail_destroy: false,
            fail_manager: false,
            fail_show: false,
            live_canvases: Arc::new(AtomicUsize::new(0)),
            loop_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_framework(mut self, framework: EventFramework) -> Self {
        self.framework = Some(framework);
        self
    }

    /// Managers whose native destroy reports an error
    pub fn failing_destroy(mut self) -> Self {
        self.fail_destroy = true;
        self
    }

    /// Window creation fails after the canvas was made
    pub fn failing_manager(mut self) -> Self {
        self.fail_manager = true;
        self
    }

    /// Managers whose `show` reports an error
    pub fn failing_show(mut self) -> Self {
        self.fail_show = true;
        self
    }

    /// Canvases created and not destroyed yet
    pub fn live_canvases(&self) -> usize {
        self.live_canvases.load(Ordering::SeqCst)
    }

    pub fn loop_calls(&self) -> Vec<LoopCall> {
        self.loop_calls.lock().unwrap().clone()
    }

    pub fn blocking_calls(&self) -> usize {
        self.loop_calls().iter().filter(|call| call.block).count()
    }
}

impl Backend for RecordingBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_event_framework(&self) -> Option<EventFramework> {
        self.framework.clone()
    }

    fn create_canvas(&self, figure: &Figure) -> Result<CanvasRef, BackendError> {
        self.live_canvases.fetch_add(1, Ordering::SeqCst);
        Ok(Rc::new(RecordingCanvas {
            figure: RefCell::new(figure.downgrade()),
            live: Arc::clone(&self.live_canvases),
            destroyed: Cell::new(false),
            timed_loops: RefCell::new(Vec::new()),
            draw_requests: Cell::new(0),
            saving: Cell::new(false),
        }))
    }

    fn create_manager(&self, canvas: CanvasRef, num: u64) -> Result<ManagerRef, BackendError> {
        if self.fail_manager {
            return Err(BackendError::Native("no window for you".to_string()));
        }
        Ok(Rc::new(RecordingManager {
            num,
            canvas,
            shows: Cell::new(0),
            destroys: Cell::new(0),
            title: RefCell::new(String::new()),
            fail_destroy: self.fail_destroy,
            fail_show: self.fail_show,
        }))
    }

    fn run_event_loop(&self, managers: &[ManagerRef], block: bool) -> Result<(), BackendError> {
        for manager in managers {
            manager.show()?;
        }
        self.loop_calls.lock().unwrap().push(LoopCall {
            managers: managers.iter().map(|m| m.num()).collect(),
            block,
        });
        Ok(())
    }
}

pub(crate) struct RecordingCanvas {
    figure: RefCell<WeakFigure>,
    live: Arc<AtomicUsize>,
    destroyed: Cell<bool>,
    pub timed_loops: RefCell<Vec<Duration>>,
    pub draw_requests: Cell<usize>,
    pub saving: Cell<bool>,
}

impl Canvas for RecordingCanvas {
    fn figure(&self) -> Option<Figure> {
        self.figure.borrow().upgrade()
    }

    fn start_event_loop(&self, timeout: Duration) -> Result<(), BackendError> {
        self.timed_loops.borrow_mut().push(timeout);
        Ok(())
    }

    fn is_saving(&self) -> bool {
        self.saving.get()
    }

    fn draw_idle(&self) {
        self.draw_requests.set(self.draw_requests.get() + 1);
    }

    fn destroy(&self) {
        *self.figure.borrow_mut() = WeakFigure::default();
        if !self.destroyed.replace(true) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct RecordingManager {
    num: u64,
    canvas: CanvasRef,
    pub shows: Cell<usize>,
    pub destroys: Cell<usize>,
    pub title: RefCell<String>,
    fail_destroy: bool,
    fail_show: bool,
}

impl Manager for RecordingManager {
    fn num(&self) -> u64 {
        self.num
    }

    fn canvas(&self) -> CanvasRef {
        Rc::clone(&self.canvas)
    }

    fn show(&self) -> Result<(), BackendError> {
        self.shows.set(self.shows.get() + 1);
        if self.fail_show {
            return Err(BackendError::Native("window cannot be mapped".to_string()));
        }
        Ok(())
    }

    fn destroy(&self) -> Result<(), BackendError> {
        self.destroys.set(self.destroys.get() + 1);
        if self.fail_destroy {
            return Err(BackendError::Native("window refused to close".to_string()));
        }
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

pub(crate) fn recording_manager(manager: &ManagerRef) -> &RecordingManager {
    manager.as_any().downcast_ref().expect("manager from RecordingBackend")
}

pub(crate) fn recording_canvas(canvas: &CanvasRef) -> &RecordingCanvas {
    canvas.as_any().downcast_ref().expect("canvas from RecordingBackend")
}

/// Fresh context with `backend` installed
pub(crate) fn context_with(config: GuiConfig, backend: &Arc<RecordingBackend>) -> Arc<GuiContext> {
    let context = GuiContext::new(config).expect("valid test config");
    context
        .select_backend(BackendSpec::Instance(Arc::clone(backend) as Arc<dyn Backend>))
        .expect("recording backend installs");
    context
}

/// Fresh non-interactive context with a recording backend named `"recording"`
pub(crate) fn recording_context() -> (Arc<GuiContext>, Arc<RecordingBackend>) {
    let backend = Arc::new(RecordingBackend::new("recording"));
    (context_with(GuiConfig::default(), &backend), backend)
}
