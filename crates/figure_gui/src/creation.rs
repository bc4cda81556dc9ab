//! Figure construction helpers
//!
//! These only build data. Nothing here touches a backend; windows appear when
//! a figure is promoted, usually through [`show`](crate::show()) or a
//! [`FigureRegistry`](crate::FigureRegistry).

use crate::core::GuiContext;
use crate::error::GuiResult;
use crate::figure::layout::{parse_mosaic, validate_grid};
use crate::figure::{Axes, AxesGrid, Figure, FigureOptions};
use indexmap::IndexMap;

impl GuiContext {
    /// Figure options built from this context's configured defaults
    pub fn figure_options(&self) -> FigureOptions {
        FigureOptions::from(&self.config().figure)
    }
}

/// Create an empty figure
pub fn figure(options: FigureOptions) -> Figure {
    Figure::new(options)
}

/// Create a figure with a regular `nrows` x `ncols` grid of axes
///
/// ```
/// use figure_gui::{subplots, FigureOptions};
///
/// let (fig, axes) = subplots(2, 2, FigureOptions::labelled("grid")).unwrap();
/// axes[(1, 0)].plot([1.0, 4.0, 9.0]);
/// assert_eq!(fig.axes().len(), 4);
/// ```
pub fn subplots(nrows: usize, ncols: usize, options: FigureOptions) -> GuiResult<(Figure, AxesGrid)> {
    validate_grid(nrows, ncols)?;
    let figure = Figure::new(options);
    let axes = figure.add_grid(nrows, ncols);
    Ok((figure, axes))
}

/// Create a figure with one axes per label of a mosaic layout
///
/// Rows are separated by newlines or `;`, each character is one cell and `.`
/// leaves a cell empty. Each label must cover a filled rectangle.
pub fn subplot_mosaic(layout: &str, options: FigureOptions) -> GuiResult<(Figure, IndexMap<char, Axes>)> {
    let mosaic = parse_mosaic(layout)?;
    let figure = Figure::new(options);
    let axes = figure.add_mosaic(&mosaic);
    Ok((figure, axes))
}
