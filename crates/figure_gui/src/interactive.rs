//! Interactive mode
//!
//! While interactive mode is on, promoted windows appear immediately, content
//! changes request a redraw and [`show`](crate::show()) does not block by
//! default. [`ion`] and [`ioff`] return guards that put the previous value
//! back when dropped, so a mode switch can be scoped:
//!
//! ```no_run
//! {
//!     let _interactive = figure_gui::ion();
//!     // windows appear as soon as figures are promoted
//! }
//! // previous mode restored here, also when unwinding
//! ```

use crate::core::GuiContext;
use std::sync::Arc;

/// Restores the interactive flag it replaced when dropped
#[must_use = "the previous interactive mode is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct InteractiveGuard {
    context: Arc<GuiContext>,
    previous: bool,
}

impl InteractiveGuard {
    fn set(context: &Arc<GuiContext>, interactive: bool) -> Self {
        let previous = context.set_interactive(interactive);
        log::debug!("Interactive mode {} (was {})", on_off(interactive), on_off(previous));
        Self { context: Arc::clone(context), previous }
    }

    /// Value that will be restored
    pub fn previous(&self) -> bool {
        self.previous
    }
}

impl Drop for InteractiveGuard {
    fn drop(&mut self) {
        self.context.set_interactive(self.previous);
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

impl GuiContext {
    /// Turn interactive mode on until the guard drops
    pub fn ion(self: &Arc<Self>) -> InteractiveGuard {
        InteractiveGuard::set(self, true)
    }

    /// Turn interactive mode off until the guard drops
    pub fn ioff(self: &Arc<Self>) -> InteractiveGuard {
        InteractiveGuard::set(self, false)
    }
}

/// Whether the global context is in interactive mode
pub fn is_interactive() -> bool {
    GuiContext::global().is_interactive()
}

/// Set interactive mode on the global context without a guard
pub fn set_interactive(interactive: bool) {
    GuiContext::global().set_interactive(interactive);
}

/// Scoped interactive mode on the global context
pub fn ion() -> InteractiveGuard {
    GuiContext::global().ion()
}

/// Scoped non-interactive mode on the global context
pub fn ioff() -> InteractiveGuard {
    GuiContext::global().ioff()
}
