//! # Figure GUI
//!
//! Binds plain figure data to GUI windows without a hidden "current figure".
//!
//! ## Features
//!
//! - **Backend selection**: named, automatic or caller-supplied backends, with
//!   a guard against mixing native event frameworks
//! - **Promotion**: a figure gets a canvas and window manager exactly once,
//!   and can be demoted and shown again without losing its content
//! - **Show**: blocking, non-blocking and timed display over one shared event
//!   loop
//! - **Registries**: stable numbers and labels, batch show and close, and a
//!   scoped variant that shows on exit
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use figure_gui::prelude::*;
//! use std::time::Duration;
//!
//! fn main() -> Result<(), GuiError> {
//!     let (fig, axes) = subplots(1, 2, FigureOptions::labelled("demo"))?;
//!     axes[(0, 0)].plot([1.0, 2.0, 3.0]);
//!     axes[(0, 1)].plot([3.0, 2.0, 1.0]);
//!
//!     // Blocks until the window is closed, unless interactive mode is on.
//!     show(&[fig], None, Duration::ZERO)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod backend;
pub mod config;
pub mod core;
pub mod error;
pub mod figure;
pub mod foundation;
pub mod global_figures;
pub mod registry;

mod creation;
mod interactive;
mod promotion;
mod show;

#[cfg(test)]
mod test_support;

pub use crate::backend::registry::{current_backend, select_backend};
pub use crate::backend::{Backend, BackendSpec, Canvas, EventFramework, Manager};
pub use crate::core::{GuiConfig, GuiContext};
pub use crate::creation::{figure, subplot_mosaic, subplots};
pub use crate::error::{BackendError, GuiError, GuiResult};
pub use crate::figure::{Axes, AxesGrid, Figure, FigureOptions};
pub use crate::interactive::{ioff, ion, is_interactive, set_interactive, InteractiveGuard};
pub use crate::promotion::demote;
pub use crate::registry::{CloseTarget, FigureContext, FigureRegistry, RegistryOptions};
pub use crate::show::show;

/// Common imports
pub mod prelude {
    pub use crate::{
        figure::events::{EventMask, FigureEvent},
        figure, ioff, ion, is_interactive, select_backend, show, subplot_mosaic, subplots, Axes, AxesGrid,
        Figure, FigureContext, FigureOptions, FigureRegistry, GuiContext, GuiError, GuiResult,
        RegistryOptions,
    };
}
