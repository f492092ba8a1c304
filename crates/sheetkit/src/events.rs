#![forbid(unsafe_code)]

//! Notifications emitted by the engine.
//!
//! Events are queued in emission order and handed to the host by
//! [`EventQueue::drain`]; the engine never calls back into host code to
//! deliver them.

use std::collections::VecDeque;

use crate::lifecycle::CloseReason;

/// Something the host may want to react to.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum SheetEvent {
    /// `open` was accepted; the entrance has started.
    Open,
    /// The entrance finished; the sheet is at rest and interactive.
    AfterOpen,
    /// The sheet reached `Closed`.
    Close {
        /// Why.
        reason: CloseReason,
    },
    /// A pointer interaction became a sheet drag.
    DragStart,
    /// The sheet followed the pointer.
    Drag {
        /// Raw pointer displacement since the origin (px, downward positive).
        delta_y: f64,
        /// Sheet progress after the sample.
        progress: f64,
    },
    /// The drag ended.
    DragEnd {
        /// The release dismisses the sheet.
        closed: bool,
    },
    /// The sheet was sent to a rest position.
    Snap {
        /// Snap index.
        index: usize,
        /// Progress of that index.
        progress: f64,
    },
}

/// FIFO of pending events.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<SheetEvent>,
}

impl EventQueue {
    /// An empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&mut self, event: SheetEvent) {
        self.events.push_back(event);
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<SheetEvent> {
        self.events.drain(..).collect()
    }

    /// Pending events without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &SheetEvent> {
        self.events.iter()
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// No pending events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_order() {
        let mut q = EventQueue::new();
        q.push(SheetEvent::Open);
        q.push(SheetEvent::AfterOpen);
        q.push(SheetEvent::Close {
            reason: CloseReason::Esc,
        });
        assert_eq!(q.len(), 3);
        assert_eq!(q.iter().next(), Some(&SheetEvent::Open));
        assert_eq!(
            q.drain(),
            vec![
                SheetEvent::Open,
                SheetEvent::AfterOpen,
                SheetEvent::Close {
                    reason: CloseReason::Esc
                }
            ]
        );
        assert!(q.is_empty());
    }
}
