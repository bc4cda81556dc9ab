//! Showing figures
//!
//! [`GuiContext::show`] promotes every figure that has no window yet and then
//! decides whether to hand control to the backend's event loop:
//!
//! | `block` resolves to | `timeout` | behaviour |
//! |---------------------|-----------|-----------|
//! | `false` | any | windows are shown, the call returns |
//! | `true`  | zero | backend loop runs until every window of the backend closes |
//! | `true`  | `T > 0` | canvases' timed loops run against one deadline `T` from now |
//!
//! `block` defaults to the opposite of interactive mode.

use crate::backend::ManagerRef;
use crate::core::GuiContext;
use crate::error::{BackendError, GuiResult};
use crate::figure::Figure;
use std::sync::Arc;
use std::time::{Duration, Instant};

impl GuiContext {
    /// Promote `figures` as needed and run the event loop
    ///
    /// An empty slice does nothing, not even backend selection.
    pub fn show(self: &Arc<Self>, figures: &[Figure], block: Option<bool>, timeout: Duration) -> GuiResult<()> {
        if figures.is_empty() {
            return Ok(());
        }
        let backend = self.current_backend()?;
        let managers = figures
            .iter()
            .map(|figure| self.promote(figure, None))
            .collect::<GuiResult<Vec<_>>>()?;

        let block = block.unwrap_or_else(|| !self.is_interactive());
        log::debug!(
            "Showing {} figure(s) on {} (block: {block}, timeout: {timeout:?})",
            managers.len(),
            backend.name()
        );

        if !block {
            backend.run_event_loop(&managers, false)?;
        } else if timeout.is_zero() {
            backend.run_event_loop(&managers, true)?;
        } else {
            for manager in &managers {
                manager.show()?;
            }
            wait_until(&managers, timeout)?;
        }
        Ok(())
    }
}

/// Run the canvases' timed loops against one shared deadline
///
/// The first open canvas waits the full `timeout`; later ones only get what
/// is left. Windows closed in the meantime are skipped.
fn wait_until(managers: &[ManagerRef], timeout: Duration) -> Result<(), BackendError> {
    let deadline = Instant::now() + timeout;
    let mut first = true;
    for manager in managers {
        let canvas = manager.canvas();
        if !canvas.figure().is_some_and(|figure| figure.is_bound()) {
            continue;
        }
        let remaining = if first { timeout } else { deadline.saturating_duration_since(Instant::now()) };
        if remaining.is_zero() {
            break;
        }
        first = false;
        canvas.start_event_loop(remaining)?;
    }
    Ok(())
}

/// Show figures through the global context
pub fn show(figures: &[Figure], block: Option<bool>, timeout: Duration) -> GuiResult<()> {
    GuiContext::global().show(figures, block, timeout)
}
