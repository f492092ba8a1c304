#![forbid(unsafe_code)]

//! Collaborator interfaces.
//!
//! The engine never touches a document, a window, or a history stack
//! directly. Everything outside its own state goes through these traits,
//! each call returning a `Result` so the engine can apply a per-call-site
//! policy:
//!
//! | Call | On failure |
//! |------|------------|
//! | `HistoryHost::push_entry` | continue without a history entry |
//! | `HistoryHost::pop_entry` | ignore |
//! | scroll lock, inert, focus, pointer capture, drag lock | log and continue |
//! | `CloseGuard::confirm` → `Failed` | deny the close |

use std::fmt;

use sheetkit_core::geometry::Point;
use sheetkit_core::gesture::ScrollRegion;

use crate::error::HostError;
use crate::lifecycle::{CloseReason, CloseTicket};

/// Identifier of a focusable element inside the sheet.
pub type FocusId = u64;

/// The view layer hosting the sheet.
pub trait ViewHost {
    /// Rendered height of the sheet panel in px.
    fn sheet_height(&self) -> f64;

    /// Scrollable region containing `point`, if any.
    fn scroll_region_at(&self, _point: Point) -> Option<ScrollRegion> {
        None
    }

    /// Capture or release a pointer on the sheet element.
    fn set_pointer_capture(&mut self, _pointer_id: u32, _captured: bool) -> Result<(), HostError> {
        Ok(())
    }

    /// Suppress (or restore) selection highlight and native touch scrolling
    /// while the sheet is being dragged.
    fn set_drag_lock(&mut self, _locked: bool) -> Result<(), HostError> {
        Ok(())
    }

    /// Focusable elements inside the sheet, in tab order.
    fn focus_targets(&self) -> Vec<FocusId> {
        Vec::new()
    }

    /// The element inside the sheet that currently has focus.
    fn focused(&self) -> Option<FocusId> {
        None
    }

    /// Move focus to `target`.
    fn focus(&mut self, _target: FocusId) -> Result<(), HostError> {
        Ok(())
    }
}

/// Navigation history, so back-navigation can dismiss the sheet.
pub trait HistoryHost {
    /// Push an entry representing the open sheet.
    fn push_entry(&mut self) -> Result<(), HostError>;
    /// Pop the entry pushed at open time.
    fn pop_entry(&mut self) -> Result<(), HostError>;
}

/// Background scroll locking.
pub trait ScrollLockHost {
    /// Prevent the page behind the sheet from scrolling.
    fn lock(&mut self) -> Result<(), HostError>;
    /// Undo [`lock`](Self::lock).
    fn unlock(&mut self) -> Result<(), HostError>;
}

/// Marks background content non-interactive.
pub trait InertHost {
    /// Set or clear the inert flag on everything behind the sheet.
    fn set_inert(&mut self, inert: bool) -> Result<(), HostError>;
}

/// Focus save/restore around the sheet's lifetime.
pub trait FocusHost {
    /// Remember the focused element outside the sheet.
    fn capture(&mut self) -> Result<(), HostError>;
    /// Return focus to the remembered element.
    fn restore(&mut self) -> Result<(), HostError>;
}

/// Answer from a [`CloseGuard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// Close now.
    Allow,
    /// Stay open.
    Deny,
    /// Answer later through `Sheet::resolve_close` with the same ticket.
    Pending,
    /// The guard itself failed; treated as a denial.
    Failed(HostError),
}

/// Optional confirmation step before a requested close.
pub trait CloseGuard {
    /// Decide whether the sheet may close for `reason`.
    fn confirm(&mut self, reason: CloseReason, ticket: CloseTicket) -> Confirmation;
}

/// Accepts every call and does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

impl HistoryHost for NoopHost {
    fn push_entry(&mut self) -> Result<(), HostError> {
        Ok(())
    }

    fn pop_entry(&mut self) -> Result<(), HostError> {
        Ok(())
    }
}

impl ScrollLockHost for NoopHost {
    fn lock(&mut self) -> Result<(), HostError> {
        Ok(())
    }

    fn unlock(&mut self) -> Result<(), HostError> {
        Ok(())
    }
}

impl InertHost for NoopHost {
    fn set_inert(&mut self, _inert: bool) -> Result<(), HostError> {
        Ok(())
    }
}

impl FocusHost for NoopHost {
    fn capture(&mut self) -> Result<(), HostError> {
        Ok(())
    }

    fn restore(&mut self) -> Result<(), HostError> {
        Ok(())
    }
}

/// In-memory view with a fixed height and a flat focus list.
///
/// Useful for headless hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticView {
    height: f64,
    focusables: Vec<FocusId>,
    focused: Option<FocusId>,
}

impl StaticView {
    /// A view of the given height with no focusable elements.
    #[must_use]
    pub fn new(height: f64) -> Self {
        Self {
            height,
            ..Self::default()
        }
    }

    /// Set the focusable elements, in tab order.
    #[must_use]
    pub fn with_focusables(mut self, ids: impl IntoIterator<Item = FocusId>) -> Self {
        self.focusables = ids.into_iter().collect();
        self
    }
}

impl ViewHost for StaticView {
    fn sheet_height(&self) -> f64 {
        self.height
    }

    fn focus_targets(&self) -> Vec<FocusId> {
        self.focusables.clone()
    }

    fn focused(&self) -> Option<FocusId> {
        self.focused
    }

    fn focus(&mut self, target: FocusId) -> Result<(), HostError> {
        if !self.focusables.contains(&target) {
            return Err(HostError::failed("view", format!("unknown focus target {target}")));
        }
        self.focused = Some(target);
        Ok(())
    }
}

/// The full set of collaborators handed to an engine.
pub struct SheetHosts {
    /// View layer.
    pub view: Box<dyn ViewHost>,
    /// Navigation history.
    pub history: Box<dyn HistoryHost>,
    /// Background scroll lock.
    pub scroll_lock: Box<dyn ScrollLockHost>,
    /// Background inert marking.
    pub inert: Box<dyn InertHost>,
    /// Focus save/restore.
    pub focus: Box<dyn FocusHost>,
    /// Optional close confirmation.
    pub guard: Option<Box<dyn CloseGuard>>,
}

impl fmt::Debug for SheetHosts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetHosts")
            .field("has_guard", &self.guard.is_some())
            .finish_non_exhaustive()
    }
}

impl SheetHosts {
    /// `view` plus no-op collaborators and no guard.
    pub fn new(view: impl ViewHost + 'static) -> Self {
        Self {
            view: Box::new(view),
            history: Box::new(NoopHost),
            scroll_lock: Box::new(NoopHost),
            inert: Box::new(NoopHost),
            focus: Box::new(NoopHost),
            guard: None,
        }
    }

    /// Use `history` for back-navigation entries.
    #[must_use]
    pub fn with_history(mut self, history: impl HistoryHost + 'static) -> Self {
        self.history = Box::new(history);
        self
    }

    /// Use `lock` for background scroll locking.
    #[must_use]
    pub fn with_scroll_lock(mut self, lock: impl ScrollLockHost + 'static) -> Self {
        self.scroll_lock = Box::new(lock);
        self
    }

    /// Use `inert` for background inert marking.
    #[must_use]
    pub fn with_inert(mut self, inert: impl InertHost + 'static) -> Self {
        self.inert = Box::new(inert);
        self
    }

    /// Use `focus` for focus save/restore.
    #[must_use]
    pub fn with_focus(mut self, focus: impl FocusHost + 'static) -> Self {
        self.focus = Box::new(focus);
        self
    }

    /// Require confirmation before requested closes.
    #[must_use]
    pub fn with_guard(mut self, guard: impl CloseGuard + 'static) -> Self {
        self.guard = Some(Box::new(guard));
        self
    }
}
