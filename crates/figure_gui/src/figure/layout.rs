//! Subplot grid and mosaic layout parsing
//!
//! A mosaic is written one row per line (or separated by `;`), one character
//! per cell. Cells sharing a character form one axes area, which must be a
//! filled rectangle. `.` marks an empty cell.
//!
//! ```text
//! AAB
//! C.B      →  A: row 0, cols 0..2   B: rows 0..2, col 2   C: row 1, col 0
//! ```

use indexmap::IndexMap;
use thiserror::Error;

/// Character that leaves a mosaic cell empty
pub const EMPTY_CELL: char = '.';

/// Invalid grid or mosaic description
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Grid without rows or columns
    #[error("subplot grid needs at least one row and one column, got {nrows}x{ncols}")]
    EmptyGrid {
        /// Requested rows
        nrows: usize,
        /// Requested columns
        ncols: usize,
    },

    /// Mosaic text contained no cells
    #[error("mosaic layout is empty")]
    EmptyMosaic,

    /// Rows of different widths
    #[error("mosaic row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Zero-based row index
        row: usize,
        /// Width of the first row
        expected: usize,
        /// Width of this row
        found: usize,
    },

    /// A label's cells do not form a rectangle
    #[error("mosaic label {label:?} does not form a filled rectangle")]
    NonRectangular {
        /// Offending label
        label: char,
    },
}

/// Placement of an axes area in its grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridSpan {
    /// First row
    pub row: usize,
    /// First column
    pub col: usize,
    /// Rows covered
    pub row_span: usize,
    /// Columns covered
    pub col_span: usize,
}

impl GridSpan {
    /// A single cell
    pub fn cell(row: usize, col: usize) -> Self {
        Self { row, col, row_span: 1, col_span: 1 }
    }

    /// Whether the span covers `(row, col)`
    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.row..self.row + self.row_span).contains(&row)
            && (self.col..self.col + self.col_span).contains(&col)
    }
}

/// Parsed mosaic: grid size plus one span per label in reading order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mosaic {
    /// Grid rows
    pub nrows: usize,
    /// Grid columns
    pub ncols: usize,
    /// Area of each label, in order of first appearance
    pub areas: IndexMap<char, GridSpan>,
}

/// Check a regular grid request
pub fn validate_grid(nrows: usize, ncols: usize) -> Result<(), LayoutError> {
    if nrows == 0 || ncols == 0 {
        return Err(LayoutError::EmptyGrid { nrows, ncols });
    }
    Ok(())
}

/// Parse mosaic text such as `"AB\nCC"` or `"AB;CC"`
pub fn parse_mosaic(layout: &str) -> Result<Mosaic, LayoutError> {
    let rows: Vec<Vec<char>> = layout
        .split(['\n', ';'])
        .map(str::trim)
        .filter(|row| !row.is_empty())
        .map(|row| row.chars().collect())
        .collect();

    let ncols = rows.first().map(Vec::len).ok_or(LayoutError::EmptyMosaic)?;
    for (row, cells) in rows.iter().enumerate() {
        if cells.len() != ncols {
            return Err(LayoutError::RaggedRow { row, expected: ncols, found: cells.len() });
        }
    }

    // Bounding box and cell count per label
    let mut bounds: IndexMap<char, (usize, usize, usize, usize, usize)> = IndexMap::new();
    for (r, cells) in rows.iter().enumerate() {
        for (c, &label) in cells.iter().enumerate() {
            if label == EMPTY_CELL {
                continue;
            }
            let entry = bounds.entry(label).or_insert((r, c, r, c, 0));
            entry.0 = entry.0.min(r);
            entry.1 = entry.1.min(c);
            entry.2 = entry.2.max(r);
            entry.3 = entry.3.max(c);
            entry.4 += 1;
        }
    }

    let mut areas = IndexMap::with_capacity(bounds.len());
    for (label, (top, left, bottom, right, count)) in bounds {
        let span = GridSpan {
            row: top,
            col: left,
            row_span: bottom - top + 1,
            col_span: right - left + 1,
        };
        if span.row_span * span.col_span != count {
            return Err(LayoutError::NonRectangular { label });
        }
        areas.insert(label, span);
    }

    Ok(Mosaic { nrows: rows.len(), ncols, areas })
}
