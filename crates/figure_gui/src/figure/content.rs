//! Drawable content of a figure
//!
//! Rendering is not this crate's job; the content only records what was
//! added so a canvas can draw it, and marks the figure stale whenever it
//! changes.

use super::layout::{GridSpan, Mosaic};
use super::{Figure, WeakFigure};
use indexmap::IndexMap;
use std::ops::Index;

/// One plotted series
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// X values
    pub x: Vec<f64>,
    /// Y values
    pub y: Vec<f64>,
    /// Line color, backend default when `None`
    pub color: Option<String>,
}

/// Data held for one axes area
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AxesData {
    /// Title drawn above the area
    pub title: String,
    /// Grid the area belongs to, as `(rows, cols)`
    pub grid: (usize, usize),
    /// Placement within that grid
    pub span: GridSpan,
    /// Plotted series
    pub series: Vec<Series>,
}

/// Everything a figure draws
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawTree {
    /// Axes areas in creation order
    pub axes: Vec<AxesData>,
}

impl DrawTree {
    /// Whether nothing has been added yet
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }
}

/// Handle to one axes area of a figure
///
/// Holds the figure weakly; once the figure is dropped every operation is a
/// no-op.
#[derive(Debug, Clone)]
pub struct Axes {
    figure: WeakFigure,
    index: usize,
}

impl Axes {
    pub(crate) fn new(figure: &Figure, index: usize) -> Self {
        Self { figure: figure.downgrade(), index }
    }

    /// Owning figure, if still alive
    pub fn figure(&self) -> Option<Figure> {
        self.figure.upgrade()
    }

    /// Position of this area in the figure's content
    pub fn index(&self) -> usize {
        self.index
    }

    /// Placement in the grid
    pub fn span(&self) -> Option<GridSpan> {
        self.read(|axes| axes.span)
    }

    /// Current title
    pub fn title(&self) -> Option<String> {
        self.read(|axes| axes.title.clone())
    }

    /// Number of plotted series
    pub fn series_count(&self) -> usize {
        self.read(|axes| axes.series.len()).unwrap_or(0)
    }

    /// Set the title
    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.update(|axes| axes.title = title);
    }

    /// Plot `y` against its indices, returning the series index
    pub fn plot(&self, y: impl IntoIterator<Item = f64>) -> Option<usize> {
        let y: Vec<f64> = y.into_iter().collect();
        #[allow(clippy::cast_precision_loss)]
        let x = (0..y.len()).map(|i| i as f64).collect();
        self.update(|axes| {
            axes.series.push(Series { x, y, color: None });
            axes.series.len() - 1
        })
    }

    /// Change a series color; returns whether the series exists
    pub fn set_series_color(&self, series: usize, color: impl Into<String>) -> bool {
        let color = color.into();
        self.update(|axes| match axes.series.get_mut(series) {
            Some(s) => {
                s.color = Some(color);
                true
            }
            None => false,
        })
        .unwrap_or(false)
    }

    fn read<R>(&self, f: impl FnOnce(&AxesData) -> R) -> Option<R> {
        let figure = self.figure.upgrade()?;
        figure.with_content(|tree| tree.axes.get(self.index).map(f))
    }

    fn update<R>(&self, f: impl FnOnce(&mut AxesData) -> R) -> Option<R> {
        let figure = self.figure.upgrade()?;
        let result = figure.with_content_mut(|tree| tree.axes.get_mut(self.index).map(f))?;
        // The content borrow is released before redraw hooks run.
        figure.mark_stale();
        Some(result)
    }
}

/// Axes handles of a regular grid, row-major
#[derive(Debug, Clone)]
pub struct AxesGrid {
    nrows: usize,
    ncols: usize,
    axes: Vec<Axes>,
}

impl AxesGrid {
    /// Grid rows
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Grid columns
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of axes
    pub fn len(&self) -> usize {
        self.axes.len()
    }

    /// Whether the grid holds no axes
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Axes at `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> Option<&Axes> {
        if row < self.nrows && col < self.ncols {
            self.axes.get(row * self.ncols + col)
        } else {
            None
        }
    }

    /// Iterate row-major
    pub fn iter(&self) -> std::slice::Iter<'_, Axes> {
        self.axes.iter()
    }
}

impl Index<(usize, usize)> for AxesGrid {
    type Output = Axes;

    fn index(&self, (row, col): (usize, usize)) -> &Axes {
        match self.get(row, col) {
            Some(axes) => axes,
            None => panic!("axes ({row}, {col}) outside a {}x{} grid", self.nrows, self.ncols),
        }
    }
}

impl<'a> IntoIterator for &'a AxesGrid {
    type Item = &'a Axes;
    type IntoIter = std::slice::Iter<'a, Axes>;

    fn into_iter(self) -> Self::IntoIter {
        self.axes.iter()
    }
}

impl Figure {
    /// Add one axes area covering `span` of a `grid`
    pub fn add_axes(&self, grid: (usize, usize), span: GridSpan) -> Axes {
        let index = self.with_content_mut(|tree| {
            tree.axes.push(AxesData { grid, span, ..AxesData::default() });
            tree.axes.len() - 1
        });
        self.mark_stale();
        Axes::new(self, index)
    }

    /// Fill a regular `nrows` x `ncols` grid with axes
    pub(crate) fn add_grid(&self, nrows: usize, ncols: usize) -> AxesGrid {
        let axes = (0..nrows)
            .flat_map(|row| (0..ncols).map(move |col| GridSpan::cell(row, col)))
            .map(|span| self.add_axes((nrows, ncols), span))
            .collect();
        AxesGrid { nrows, ncols, axes }
    }

    /// Add one axes per mosaic label
    pub(crate) fn add_mosaic(&self, mosaic: &Mosaic) -> IndexMap<char, Axes> {
        mosaic
            .areas
            .iter()
            .map(|(&label, &span)| {
                let axes = self.add_axes((mosaic.nrows, mosaic.ncols), span);
                axes.set_title(label.to_string());
                (label, axes)
            })
            .collect()
    }

    /// Handles to every axes area
    pub fn axes(&self) -> Vec<Axes> {
        let count = self.with_content(|tree| tree.axes.len());
        (0..count).map(|index| Axes::new(self, index)).collect()
    }
}
