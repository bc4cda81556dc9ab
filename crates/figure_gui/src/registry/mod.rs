//! Figure registries
//!
//! A [`FigureRegistry`] tracks the figures created through it. Each figure
//! gets a number from the registry's own counter, which is never reused, and
//! unlabelled figures are named `"{prefix}{number}"`. The registry holds its
//! figures strongly until they are closed, either through
//! [`FigureRegistry::close`] or by any other path that demotes them (the user
//! closing the window, a quit key); the latter is noticed through a `CLOSED`
//! callback.
//!
//! [`FigureContext`] adds a scope that shows everything on the way out.

pub mod context;

pub use context::FigureContext;

use crate::core::{GuiContext, RegistryDefaults};
use crate::error::{GuiError, GuiResult};
use crate::figure::events::{ConnectionId, EventMask};
use crate::figure::{Axes, AxesGrid, Figure, FigureOptions};
use crate::promotion::demote;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Duration;

/// What [`FigureRegistry::close`] should close
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseTarget {
    /// Every tracked figure
    All,
    /// The newest tracked figure with this label
    Label(String),
    /// The figure registered under this number
    Number(u64),
    /// This figure
    Figure(Figure),
}

impl From<&str> for CloseTarget {
    /// `"all"` selects every figure, anything else is a label
    fn from(value: &str) -> Self {
        if value == "all" {
            Self::All
        } else {
            Self::Label(value.to_string())
        }
    }
}

impl From<String> for CloseTarget {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<u64> for CloseTarget {
    fn from(number: u64) -> Self {
        Self::Number(number)
    }
}

impl From<Figure> for CloseTarget {
    fn from(figure: Figure) -> Self {
        Self::Figure(figure)
    }
}

impl From<&Figure> for CloseTarget {
    fn from(figure: &Figure) -> Self {
        Self::Figure(figure.clone())
    }
}

/// Defaults used by `show_all` and for generated labels
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryOptions {
    /// Block in `show_all`; `None` follows interactive mode
    pub block: Option<bool>,
    /// Timed-block length for `show_all`; zero waits for every window
    pub timeout: Duration,
    /// Prefix of generated labels
    pub prefix: String,
}

impl RegistryOptions {
    /// Set the default block behaviour
    pub fn with_block(mut self, block: impl Into<Option<bool>>) -> Self {
        self.block = block.into();
        self
    }

    /// Set the default timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the label prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

impl From<&RegistryDefaults> for RegistryOptions {
    fn from(defaults: &RegistryDefaults) -> Self {
        Self {
            block: defaults.block,
            timeout: defaults.timeout(),
            prefix: defaults.prefix.clone(),
        }
    }
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self::from(&RegistryDefaults::default())
    }
}

struct Tracked {
    figure: Figure,
    number: u64,
    close_hook: ConnectionId,
}

#[derive(Default)]
struct RegistryState {
    tracked: Vec<Tracked>,
    next_number: u64,
}

impl RegistryState {
    fn untrack(&mut self, figure: &Figure) -> Option<Tracked> {
        let position = self.tracked.iter().position(|t| t.figure.ptr_eq(figure))?;
        Some(self.tracked.remove(position))
    }
}

/// Owns a set of figures, numbers and labels them, and shows or closes them
/// in batches
pub struct FigureRegistry {
    context: Arc<GuiContext>,
    options: RegistryOptions,
    state: Rc<RefCell<RegistryState>>,
}

impl FigureRegistry {
    /// Registry on the global context
    pub fn new(options: RegistryOptions) -> Self {
        Self::with_context(GuiContext::global(), options)
    }

    /// Registry on an explicit context
    pub fn with_context(context: Arc<GuiContext>, options: RegistryOptions) -> Self {
        Self {
            context,
            options,
            state: Rc::new(RefCell::new(RegistryState::default())),
        }
    }

    /// Context used for promotion and show
    pub fn context(&self) -> &Arc<GuiContext> {
        &self.context
    }

    /// Defaults fixed at construction
    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// Figure options from the context's configured defaults
    pub fn figure_options(&self) -> FigureOptions {
        self.context.figure_options()
    }

    /// Tracked figures in registration order
    pub fn figures(&self) -> Vec<Figure> {
        self.state.borrow().tracked.iter().map(|t| t.figure.clone()).collect()
    }

    /// Number of tracked figures
    pub fn len(&self) -> usize {
        self.state.borrow().tracked.len()
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `figure` is tracked here
    pub fn contains(&self, figure: &Figure) -> bool {
        self.number_of(figure).is_some()
    }

    /// Number assigned to `figure`
    pub fn number_of(&self, figure: &Figure) -> Option<u64> {
        self.state
            .borrow()
            .tracked
            .iter()
            .find(|t| t.figure.ptr_eq(figure))
            .map(|t| t.number)
    }

    /// Create and register an empty figure
    pub fn figure(&self, options: FigureOptions) -> GuiResult<Figure> {
        let figure = crate::creation::figure(options);
        self.register(&figure)?;
        Ok(figure)
    }

    /// Create and register a figure with a grid of axes
    pub fn subplots(&self, nrows: usize, ncols: usize, options: FigureOptions) -> GuiResult<(Figure, AxesGrid)> {
        let (figure, axes) = crate::creation::subplots(nrows, ncols, options)?;
        self.register(&figure)?;
        Ok((figure, axes))
    }

    /// Create and register a figure laid out by a mosaic
    pub fn subplot_mosaic(&self, layout: &str, options: FigureOptions) -> GuiResult<(Figure, IndexMap<char, Axes>)> {
        let (figure, axes) = crate::creation::subplot_mosaic(layout, options)?;
        self.register(&figure)?;
        Ok((figure, axes))
    }

    /// Track a figure created elsewhere and return its number
    ///
    /// Registering a tracked figure again returns its existing number. In
    /// interactive mode the figure is promoted right away under that number;
    /// if that fails the figure stays tracked and the error is returned.
    pub fn register(&self, figure: &Figure) -> GuiResult<u64> {
        if let Some(number) = self.number_of(figure) {
            return Ok(number);
        }

        let number = {
            let mut state = self.state.borrow_mut();
            let number = state.next_number;
            state.next_number += 1;
            number
        };
        if figure.label().is_empty() {
            figure.set_label(format!("{}{number}", self.options.prefix));
        }

        let state = Rc::downgrade(&self.state);
        let close_hook = figure.connect(EventMask::CLOSED, move |figure, _| forget(&state, figure));
        self.state.borrow_mut().tracked.push(Tracked {
            figure: figure.clone(),
            number,
            close_hook,
        });
        log::debug!("Registered figure {:?} as number {number}", figure.label());

        if self.context.is_interactive() {
            self.context.promote(figure, Some(number))?;
        }
        Ok(number)
    }

    /// Labels mapped to figures, computed on each call
    ///
    /// When labels repeat, the newest figure wins and a warning names the
    /// repeated labels.
    pub fn by_label(&self) -> IndexMap<String, Figure> {
        let duplicates = self.duplicate_labels();
        if !duplicates.is_empty() {
            log::warn!(
                "There are repeated labels ({duplicates:?}), but only the newest figure with that label can be returned"
            );
        }
        self.figures().into_iter().map(|figure| (figure.label(), figure)).collect()
    }

    /// Labels shared by more than one tracked figure, with their counts
    pub fn duplicate_labels(&self) -> IndexMap<String, usize> {
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for figure in self.figures() {
            *counts.entry(figure.label()).or_default() += 1;
        }
        counts.retain(|_, count| *count > 1);
        counts
    }

    /// Numbers mapped to figures, promoting every tracked figure first
    pub fn by_number(&self) -> GuiResult<IndexMap<u64, Figure>> {
        self.ensure_promoted()?;
        Ok(self.numbered())
    }

    fn numbered(&self) -> IndexMap<u64, Figure> {
        self.state
            .borrow()
            .tracked
            .iter()
            .map(|t| (t.number, t.figure.clone()))
            .collect()
    }

    fn ensure_promoted(&self) -> GuiResult<()> {
        for (number, figure) in self.numbered() {
            if !figure.is_bound() {
                self.context.promote(&figure, Some(number))?;
            }
        }
        Ok(())
    }

    /// Show every tracked figure
    ///
    /// `None` arguments fall back to the registry's defaults.
    pub fn show_all(&self, block: Option<bool>, timeout: Option<Duration>) -> GuiResult<()> {
        self.ensure_promoted()?;
        let block = block.or(self.options.block);
        let timeout = timeout.unwrap_or(self.options.timeout);
        self.context.show(&self.figures(), block, timeout)
    }

    /// Show every tracked figure with the registry's defaults
    pub fn show(&self) -> GuiResult<()> {
        self.show_all(None, None)
    }

    /// Close figures and stop tracking them
    ///
    /// The window is destroyed and the figure forgotten; a caller still
    /// holding the figure can show it again, untracked.
    ///
    /// # Errors
    ///
    /// [`GuiError::NotTracked`] when the label, number or figure does not
    /// belong to this registry.
    pub fn close(&self, target: impl Into<CloseTarget>) -> GuiResult<()> {
        let figure = match target.into() {
            CloseTarget::All => {
                self.close_all();
                return Ok(());
            }
            CloseTarget::Label(label) => self
                .by_label()
                .shift_remove(&label)
                .ok_or_else(|| GuiError::NotTracked(format!("label {label:?}")))?,
            CloseTarget::Number(number) => self
                .numbered()
                .shift_remove(&number)
                .ok_or_else(|| GuiError::NotTracked(format!("number {number}")))?,
            CloseTarget::Figure(figure) => {
                if !self.contains(&figure) {
                    return Err(GuiError::NotTracked(format!("figure {:?}", figure.label())));
                }
                figure
            }
        };
        self.close_figure(&figure);
        Ok(())
    }

    /// Close every tracked figure
    pub fn close_all(&self) {
        for figure in self.figures() {
            self.close_figure(&figure);
        }
    }

    /// Stop tracking every figure without closing any window
    pub(crate) fn forget_all(&self) {
        let tracked = std::mem::take(&mut self.state.borrow_mut().tracked);
        for entry in tracked {
            entry.figure.disconnect(entry.close_hook);
        }
    }

    fn close_figure(&self, figure: &Figure) {
        let tracked = self.state.borrow_mut().untrack(figure);
        if let Some(tracked) = tracked {
            figure.disconnect(tracked.close_hook);
            log::debug!("Closing figure {:?} (number {})", figure.label(), tracked.number);
        }
        demote(figure);
    }
}

/// `CLOSED` callback: drop a figure that was closed behind the registry's back
fn forget(state: &Weak<RefCell<RegistryState>>, figure: &Figure) {
    let Some(state) = state.upgrade() else { return };
    let tracked = state.borrow_mut().untrack(figure);
    if let Some(tracked) = tracked {
        log::debug!("Figure {:?} (number {}) was closed, no longer tracked", figure.label(), tracked.number);
        figure.disconnect(tracked.close_hook);
    }
}

impl Default for FigureRegistry {
    /// Registry on the global context with its configured defaults
    fn default() -> Self {
        let context = GuiContext::global();
        let options = RegistryOptions::from(&context.config().registry);
        Self::with_context(context, options)
    }
}

impl Drop for FigureRegistry {
    fn drop(&mut self) {
        self.forget_all();
    }
}

impl fmt::Debug for FigureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FigureRegistry")
            .field("options", &self.options)
            .field("figures", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::events::FigureEvent;
    use crate::test_support::{recording_context, recording_manager, RecordingBackend};

    fn registry(options: RegistryOptions) -> (FigureRegistry, Arc<RecordingBackend>) {
        let (context, backend) = recording_context();
        (FigureRegistry::with_context(context, options), backend)
    }

    fn non_blocking() -> RegistryOptions {
        RegistryOptions::default().with_block(false)
    }

    #[test]
    fn test_out_of_range_timeout_means_forever() {
        let defaults = RegistryDefaults {
            timeout_secs: 1e20,
            ..RegistryDefaults::default()
        };
        assert_eq!(RegistryOptions::from(&defaults).timeout, Duration::ZERO);
    }

    #[test]
    fn test_generated_labels_use_prefix() {
        let (registry, _) = registry(non_blocking().with_prefix("Aardvark "));
        for j in 0..5 {
            registry.figure(FigureOptions::default()).unwrap();
            let expected: Vec<String> = (0..=j).map(|k| format!("Aardvark {k}")).collect();
            assert_eq!(registry.by_label().keys().cloned().collect::<Vec<_>>(), expected);
        }
        registry.close_all();
        assert!(registry.by_label().is_empty());

        // Numbers are never reused.
        let figure = registry.figure(FigureOptions::default()).unwrap();
        assert_eq!(figure.label(), "Aardvark 5");
    }

    #[test]
    fn test_label_collision_keeps_newest() {
        let (registry, _) = registry(non_blocking());
        for _ in 0..5 {
            registry.figure(FigureOptions::labelled("aardvark")).unwrap();
        }
        let by_label = registry.by_label();
        assert_eq!(by_label.keys().collect::<Vec<_>>(), vec!["aardvark"]);
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.figures().last(), by_label.get("aardvark"));
        assert_eq!(registry.duplicate_labels().get("aardvark"), Some(&5));

        registry.close_all();
        assert!(registry.by_label().is_empty());
    }

    #[test]
    fn test_by_label_follows_label_changes() {
        let (registry, _) = registry(non_blocking());
        for _ in 0..5 {
            registry.figure(FigureOptions::default()).unwrap();
        }
        let labels: Vec<String> = (0..5).map(|j| format!("Figure {j}")).collect();
        assert_eq!(registry.by_label().keys().cloned().collect::<Vec<_>>(), labels);

        for (j, figure) in registry.by_label().values().enumerate() {
            figure.set_label(format!("aardvark {j}"));
        }
        let renamed: Vec<String> = (0..5).map(|j| format!("aardvark {j}")).collect();
        assert_eq!(registry.by_label().keys().cloned().collect::<Vec<_>>(), renamed);
    }

    #[test]
    fn test_close_one_at_a_time() {
        let (registry, _) = registry(non_blocking());
        let fig1 = registry.figure(FigureOptions::labelled("a")).unwrap();
        let fig2 = registry.figure(FigureOptions::labelled("b")).unwrap();
        let fig3 = registry.figure(FigureOptions::labelled("c")).unwrap();
        registry.figure(FigureOptions::labelled("d")).unwrap();
        assert_eq!(registry.len(), 4);

        registry.close(&fig1).unwrap();
        assert_eq!(registry.len(), 3);
        assert!(!registry.contains(&fig1));

        registry.close(fig2.label()).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(!registry.contains(&fig2));

        registry.show().unwrap();
        let num = fig3.manager().unwrap().num();
        assert_eq!(Some(num), registry.number_of(&fig3));
        registry.close(num).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(!fig3.is_bound());

        registry.close("all").unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_close_untracked_is_an_error() {
        let (registry, _) = registry(non_blocking());
        registry.figure(FigureOptions::labelled("kept")).unwrap();

        assert!(matches!(registry.close("missing"), Err(GuiError::NotTracked(_))));
        assert!(matches!(registry.close(99_u64), Err(GuiError::NotTracked(_))));
        assert!(matches!(registry.close(Figure::default()), Err(GuiError::NotTracked(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_close_all_destroys_each_window_once() {
        let (registry, _) = registry(non_blocking());
        let figure = registry.figure(FigureOptions::default()).unwrap();
        registry.subplots(2, 2, FigureOptions::default()).unwrap();
        registry.show_all(None, None).unwrap();

        let managers: Vec<_> = registry.figures().iter().map(|f| f.manager().unwrap()).collect();
        let canvas = figure.canvas().unwrap();
        registry.close_all();

        assert!(registry.is_empty());
        for manager in &managers {
            assert_eq!(recording_manager(manager).destroys.get(), 1);
        }
        assert!(canvas.figure().is_none());
        assert!(!figure.is_bound());

        // A closed figure can still be shown, untracked.
        registry.context().show(&[figure.clone()], Some(false), Duration::ZERO).unwrap();
        let revived = figure.canvas().unwrap();
        assert!(!Rc::ptr_eq(&revived, &canvas));
        assert!(!registry.contains(&figure));
    }

    #[test]
    fn test_window_closed_elsewhere_is_forgotten() {
        let (registry, _) = registry(non_blocking());
        let figure = registry.figure(FigureOptions::default()).unwrap();
        let other = registry.figure(FigureOptions::default()).unwrap();
        registry.show().unwrap();

        figure.dispatch(&FigureEvent::key("q"));
        assert!(!registry.contains(&figure));
        assert!(registry.contains(&other));
        assert!(figure.callbacks().is_empty());

        other.dispatch(&FigureEvent::CloseRequested);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_by_number_promotes_with_registry_numbers() {
        let (registry, _) = registry(non_blocking());
        registry.figure(FigureOptions::default()).unwrap();
        registry.figure(FigureOptions::default()).unwrap();

        let by_number = registry.by_number().unwrap();
        assert_eq!(by_number.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
        for (number, figure) in &by_number {
            assert_eq!(figure.manager().unwrap().num(), *number);
        }
    }

    #[test]
    fn test_interactive_registration_promotes() {
        let (registry, _) = registry(non_blocking());
        let _on = registry.context().ion();
        let figure = registry.figure(FigureOptions::default()).unwrap();
        let manager = figure.manager().unwrap();
        assert_eq!(manager.num(), 0);
        assert_eq!(recording_manager(&manager).shows.get(), 1);
    }

    #[test]
    fn test_show_all_honours_overrides() {
        let (registry, backend) = registry(RegistryOptions::default().with_block(true));
        registry.figure(FigureOptions::default()).unwrap();

        registry.show_all(None, None).unwrap();
        registry.show_all(Some(false), None).unwrap();
        let blocks: Vec<bool> = backend.loop_calls().iter().map(|call| call.block).collect();
        assert_eq!(blocks, vec![true, false]);

        let timeout = Duration::from_millis(10);
        registry.show_all(None, Some(timeout)).unwrap();
        let canvas = registry.figures()[0].canvas().unwrap();
        assert_eq!(*crate::test_support::recording_canvas(&canvas).timed_loops.borrow(), vec![timeout]);
    }

    #[test]
    fn test_drop_disconnects_close_hooks() {
        let (registry, _) = registry(non_blocking());
        let figure = registry.figure(FigureOptions::default()).unwrap();
        assert_eq!(figure.callbacks().len(), 1);
        drop(registry);
        assert!(figure.callbacks().is_empty());
    }
}
