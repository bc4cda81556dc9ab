//! Module-level figure management
//!
//! A default [`FigureRegistry`] per thread, on the global context, with free
//! functions in front of it. Suited to scripts that just want "make some
//! figures, show them":
//!
//! ```no_run
//! use figure_gui::global_figures as gf;
//! use figure_gui::FigureOptions;
//!
//! let (_, axes) = gf::subplots(2, 1, FigureOptions::default())?;
//! axes[(0, 0)].plot([0.0, 1.0, 4.0]);
//! gf::show()?;
//! # Ok::<(), figure_gui::GuiError>(())
//! ```

use crate::error::GuiResult;
use crate::figure::{Axes, AxesGrid, Figure, FigureOptions};
use crate::registry::{CloseTarget, FigureRegistry};
use indexmap::IndexMap;
use std::time::Duration;

pub use crate::interactive::{ioff, ion, is_interactive};

thread_local! {
    static REGISTRY: FigureRegistry = FigureRegistry::default();
}

fn with_registry<R>(f: impl FnOnce(&FigureRegistry) -> R) -> R {
    REGISTRY.with(f)
}

/// Create and track an empty figure
pub fn figure(options: FigureOptions) -> GuiResult<Figure> {
    with_registry(|registry| registry.figure(options))
}

/// Create and track a figure with a grid of axes
pub fn subplots(nrows: usize, ncols: usize, options: FigureOptions) -> GuiResult<(Figure, AxesGrid)> {
    with_registry(|registry| registry.subplots(nrows, ncols, options))
}

/// Create and track a figure laid out by a mosaic
pub fn subplot_mosaic(layout: &str, options: FigureOptions) -> GuiResult<(Figure, IndexMap<char, Axes>)> {
    with_registry(|registry| registry.subplot_mosaic(layout, options))
}

/// Tracked figures by label
pub fn by_label() -> IndexMap<String, Figure> {
    with_registry(FigureRegistry::by_label)
}

/// Show every tracked figure with the configured defaults
pub fn show() -> GuiResult<()> {
    with_registry(FigureRegistry::show)
}

/// Show every tracked figure, overriding block and timeout
pub fn show_all(block: Option<bool>, timeout: Option<Duration>) -> GuiResult<()> {
    with_registry(|registry| registry.show_all(block, timeout))
}

/// Close a tracked figure by label, number or handle, or `"all"`
pub fn close(target: impl Into<CloseTarget>) -> GuiResult<()> {
    let target = target.into();
    with_registry(|registry| registry.close(target))
}

/// Close every tracked figure
pub fn close_all() {
    with_registry(FigureRegistry::close_all);
}

/// Labels of the tracked figures
pub fn get_figlabels() -> Vec<String> {
    by_label().into_keys().collect()
}

/// Numbers of the tracked figures, ascending
///
/// Promotes any figure that has no window yet.
pub fn get_fignums() -> GuiResult<Vec<u64>> {
    let mut numbers: Vec<u64> = with_registry(FigureRegistry::by_number)?.into_keys().collect();
    numbers.sort_unstable();
    Ok(numbers)
}
