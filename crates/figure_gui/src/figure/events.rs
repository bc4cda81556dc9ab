//! Per-figure event callbacks
//!
//! Callbacks are stored on the figure, not on its canvas, so they survive the
//! figure being demoted and promoted again. Handlers subscribe to an
//! [`EventMask`] and are notified only for matching events.

use super::Figure;
use bitflags::bitflags;
use slotmap::SlotMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

bitflags! {
    /// Event kinds a callback listens to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventMask: u8 {
        /// Key pressed inside the figure window
        const KEY_PRESS = 1;
        /// The user asked the toolkit to close the window
        const CLOSE_REQUESTED = 1 << 1;
        /// The window binding was torn down
        const CLOSED = 1 << 2;
        /// The drawable content changed and needs a redraw
        const STALE = 1 << 3;
    }
}

/// Event delivered to figure callbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FigureEvent {
    /// Key pressed, named like `"q"` or `"ctrl+w"`
    KeyPress {
        /// Key name including modifiers
        key: String,
    },
    /// Window close requested through the toolkit
    CloseRequested,
    /// Window binding destroyed
    Closed,
    /// Content changed
    Stale,
}

impl FigureEvent {
    /// Key press helper
    pub fn key(key: impl Into<String>) -> Self {
        Self::KeyPress { key: key.into() }
    }

    /// Mask bit matching this event
    pub fn mask(&self) -> EventMask {
        match self {
            Self::KeyPress { .. } => EventMask::KEY_PRESS,
            Self::CloseRequested => EventMask::CLOSE_REQUESTED,
            Self::Closed => EventMask::CLOSED,
            Self::Stale => EventMask::STALE,
        }
    }
}

slotmap::new_key_type! {
    /// Identifies one connected callback
    pub struct ConnectionId;
}

type Callback = Rc<dyn Fn(&Figure, &FigureEvent)>;

struct Connection {
    mask: EventMask,
    callback: Callback,
}

/// Callback storage owned by a figure
#[derive(Default)]
pub struct CallbackRegistry {
    connections: RefCell<SlotMap<ConnectionId, Connection>>,
}

impl CallbackRegistry {
    /// Subscribe `callback` to the events in `mask`
    pub fn connect<F>(&self, mask: EventMask, callback: F) -> ConnectionId
    where
        F: Fn(&Figure, &FigureEvent) + 'static,
    {
        self.connections.borrow_mut().insert(Connection {
            mask,
            callback: Rc::new(callback),
        })
    }

    /// Remove a callback; returns whether it was still connected
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.borrow_mut().remove(id).is_some()
    }

    /// Whether `id` is still connected
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.connections.borrow().contains_key(id)
    }

    /// Number of connected callbacks
    pub fn len(&self) -> usize {
        self.connections.borrow().len()
    }

    /// Whether no callback is connected
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notify matching callbacks, returning how many ran
    ///
    /// No borrow is held while a callback runs, so callbacks may connect,
    /// disconnect or dispatch further events. A callback disconnected by an
    /// earlier one in the same round is skipped.
    pub(crate) fn dispatch(&self, figure: &Figure, event: &FigureEvent) -> usize {
        let mask = event.mask();
        let targets: Vec<(ConnectionId, Callback)> = self
            .connections
            .borrow()
            .iter()
            .filter(|(_, connection)| connection.mask.intersects(mask))
            .map(|(id, connection)| (id, Rc::clone(&connection.callback)))
            .collect();

        let mut delivered = 0;
        for (id, callback) in targets {
            if !self.is_connected(id) {
                continue;
            }
            callback(figure, event);
            delivered += 1;
        }
        delivered
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry").field("connections", &self.len()).finish()
    }
}
