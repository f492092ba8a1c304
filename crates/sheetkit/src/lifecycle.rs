#![forbid(unsafe_code)]

//! Open/close lifecycle state machine.
//!
//! ```text
//!          open()            settle            close_animated()
//! Closed ─────────▶ Opening ───────▶ Open ─────────────────────▶ Closing
//!   ▲                  │               │                            │
//!   │                  │ close()       │ close()                    │ transition end
//!   └──────────────────┴───────────────┴────────────────────────────┘ or fallback
//! ```
//!
//! [`Lifecycle`] holds only the phase bookkeeping: the open-session
//! generation, outstanding close-confirmation tickets, and the two pending
//! transitions (opening settle, closing finalize) with their fallback
//! deadlines. Side effects on collaborators live in the engine.
//!
//! # Invariants
//!
//! 1. `close` is reachable from every phase and is idempotent.
//! 2. A pending close is taken exactly once: whichever of transition-end and
//!    the fallback deadline fires first wins, the other sees `None`.
//! 3. A ticket is honoured only within the open session that issued it.

use std::fmt;

use web_time::{Duration, Instant};

use crate::error::SheetError;

/// Extra time past the exit duration before the close fallback fires.
pub const CLOSE_GRACE: Duration = Duration::from_millis(100);

/// Current lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LifecyclePhase {
    /// Not shown; holds no resources.
    #[default]
    Closed,
    /// Shown, entrance animation in flight.
    Opening,
    /// Shown and at rest (or snapping between rest positions).
    Open,
    /// Exit animation in flight; will finalize to `Closed`.
    Closing,
}

impl LifecyclePhase {
    /// Whether the sheet should be rendered.
    #[inline]
    #[must_use]
    pub fn is_visible(self) -> bool {
        !matches!(self, Self::Closed)
    }

    /// Whether an entrance or exit transition is in flight.
    #[inline]
    #[must_use]
    pub fn is_transitioning(self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Closing => "closing",
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the sheet closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CloseReason {
    /// Host code asked for it.
    Programmatic,
    /// Click or tap on the backdrop.
    Backdrop,
    /// Escape key.
    Esc,
    /// Drag or fling past the dismissal threshold.
    Drag,
    /// Engine-internal teardown.
    Internal,
    /// Navigation history went back past the sheet's entry.
    History,
}

impl CloseReason {
    /// Lowercase name, as reported to hosts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Programmatic => "programmatic",
            Self::Backdrop => "backdrop",
            Self::Esc => "esc",
            Self::Drag => "drag",
            Self::Internal => "internal",
            Self::History => "history",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle for a close confirmation that resolves later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloseTicket {
    id: u64,
    session: u64,
    reason: CloseReason,
}

impl CloseTicket {
    /// Unique ticket id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The open session the ticket belongs to.
    #[must_use]
    pub const fn session(&self) -> u64 {
        self.session
    }

    /// The requested close reason.
    #[must_use]
    pub const fn reason(&self) -> CloseReason {
        self.reason
    }
}

/// Result of a close request or confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Closed synchronously.
    Closed,
    /// Exit animation started; `Close` fires when it finalizes.
    Closing,
    /// The guard refused (or failed); nothing changed.
    Denied,
    /// Waiting on the guard; resolve with the ticket.
    Pending(CloseTicket),
    /// The ticket belongs to an earlier session or was already resolved.
    Stale,
    /// Nothing to do (already closed or closing, or the policy disables it).
    Ignored,
}

impl CloseOutcome {
    /// Whether the sheet is closed or on its way out.
    #[must_use]
    pub fn is_closing(self) -> bool {
        matches!(self, Self::Closed | Self::Closing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingOpen {
    /// Snap index to move to on the next frame, after one frame off-target.
    staged: Option<usize>,
    deadline: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingClose {
    reason: CloseReason,
    deadline: Instant,
}

/// Phase bookkeeping for one sheet.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    phase: LifecyclePhase,
    session: u64,
    next_ticket: u64,
    outstanding: Vec<u64>,
    opening: Option<PendingOpen>,
    closing: Option<PendingClose>,
}

impl Lifecycle {
    /// A closed lifecycle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    #[inline]
    #[must_use]
    pub const fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    /// Generation of the current (or last) open session.
    #[inline]
    #[must_use]
    pub const fn session(&self) -> u64 {
        self.session
    }

    /// Number of unresolved close tickets.
    #[must_use]
    pub fn outstanding_tickets(&self) -> usize {
        self.outstanding.len()
    }

    /// `Closed → Opening`. Returns the new session generation.
    pub fn begin_open(&mut self, deadline: Instant) -> Result<u64, SheetError> {
        if self.phase != LifecyclePhase::Closed {
            return Err(SheetError::InvalidTransition {
                action: "open",
                phase: self.phase,
            });
        }
        self.phase = LifecyclePhase::Opening;
        self.session += 1;
        self.opening = Some(PendingOpen {
            staged: None,
            deadline,
        });
        Ok(self.session)
    }

    /// Queue a snap index to move to on the frame after opening.
    pub fn stage_open_target(&mut self, index: usize) {
        if let Some(pending) = self.opening.as_mut() {
            pending.staged = Some(index);
        }
    }

    /// Take the staged open target, if any.
    pub fn take_staged_target(&mut self) -> Option<usize> {
        self.opening.as_mut().and_then(|p| p.staged.take())
    }

    /// Whether a staged target is waiting for the next frame.
    #[must_use]
    pub fn has_staged_target(&self) -> bool {
        self.opening.is_some_and(|p| p.staged.is_some())
    }

    /// Whether the entrance fallback deadline has passed.
    #[must_use]
    pub fn open_deadline_passed(&self, now: Instant) -> bool {
        self.opening.is_some_and(|p| now >= p.deadline)
    }

    /// `Opening → Open`. Returns `false` from any other phase.
    pub fn settle_open(&mut self) -> bool {
        if self.phase != LifecyclePhase::Opening {
            return false;
        }
        self.phase = LifecyclePhase::Open;
        self.opening = None;
        true
    }

    /// `Open → Closing`, arming the fallback deadline.
    pub fn begin_close(&mut self, reason: CloseReason, deadline: Instant) -> Result<(), SheetError> {
        if self.phase != LifecyclePhase::Open {
            return Err(SheetError::InvalidTransition {
                action: "close with animation",
                phase: self.phase,
            });
        }
        self.phase = LifecyclePhase::Closing;
        self.closing = Some(PendingClose { reason, deadline });
        Ok(())
    }

    /// Take the pending close unconditionally (transition-end path).
    pub fn take_pending_close(&mut self) -> Option<CloseReason> {
        self.closing.take().map(|p| p.reason)
    }

    /// Take the pending close if its fallback deadline has passed.
    pub fn take_due_close(&mut self, now: Instant) -> Option<CloseReason> {
        match self.closing {
            Some(p) if now >= p.deadline => self.take_pending_close(),
            _ => None,
        }
    }

    /// Any phase `→ Closed`. Returns `false` if already closed.
    pub fn finish_close(&mut self) -> bool {
        if self.phase == LifecyclePhase::Closed {
            return false;
        }
        self.phase = LifecyclePhase::Closed;
        self.opening = None;
        self.closing = None;
        self.outstanding.clear();
        true
    }

    /// Issue a ticket bound to the current session.
    pub fn issue_ticket(&mut self, reason: CloseReason) -> CloseTicket {
        self.next_ticket += 1;
        self.outstanding.push(self.next_ticket);
        CloseTicket {
            id: self.next_ticket,
            session: self.session,
            reason,
        }
    }

    /// Consume `ticket` if it is still honoured. Returns `false` for stale,
    /// foreign, or already-resolved tickets.
    pub fn redeem(&mut self, ticket: CloseTicket) -> bool {
        if ticket.session != self.session
            || !matches!(self.phase, LifecyclePhase::Opening | LifecyclePhase::Open)
        {
            return false;
        }
        match self.outstanding.iter().position(|&id| id == ticket.id) {
            Some(pos) => {
                self.outstanding.swap_remove(pos);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened(now: Instant) -> Lifecycle {
        let mut lc = Lifecycle::new();
        lc.begin_open(now).unwrap();
        assert!(lc.settle_open());
        lc
    }

    #[test]
    fn open_only_from_closed() {
        let t = Instant::now();
        let mut lc = Lifecycle::new();
        assert_eq!(lc.begin_open(t), Ok(1));
        assert_eq!(lc.phase(), LifecyclePhase::Opening);
        assert!(matches!(
            lc.begin_open(t),
            Err(SheetError::InvalidTransition { action: "open", .. })
        ));
    }

    #[test]
    fn close_animated_only_while_open() {
        let t = Instant::now();
        let mut lc = Lifecycle::new();
        assert!(lc.begin_close(CloseReason::Drag, t).is_err());
        lc.begin_open(t).unwrap();
        assert!(lc.begin_close(CloseReason::Drag, t).is_err());
        lc.settle_open();
        assert!(lc.begin_close(CloseReason::Drag, t).is_ok());
        assert_eq!(lc.phase(), LifecyclePhase::Closing);
    }

    #[test]
    fn pending_close_taken_once() {
        let t = Instant::now();
        let mut lc = opened(t);
        lc.begin_close(CloseReason::Esc, t + Duration::from_millis(350)).unwrap();

        assert_eq!(lc.take_due_close(t + Duration::from_millis(100)), None);
        assert_eq!(lc.take_pending_close(), Some(CloseReason::Esc));
        // Fallback fires afterwards: no-op.
        assert_eq!(lc.take_due_close(t + Duration::from_secs(5)), None);
    }

    #[test]
    fn fallback_wins_when_transition_end_never_arrives() {
        let t = Instant::now();
        let mut lc = opened(t);
        lc.begin_close(CloseReason::Backdrop, t + Duration::from_millis(350)).unwrap();
        assert_eq!(
            lc.take_due_close(t + Duration::from_millis(350)),
            Some(CloseReason::Backdrop)
        );
        assert_eq!(lc.take_pending_close(), None);
    }

    #[test]
    fn finish_close_is_idempotent() {
        let t = Instant::now();
        let mut lc = opened(t);
        assert!(lc.finish_close());
        assert!(!lc.finish_close());
        assert_eq!(lc.phase(), LifecyclePhase::Closed);
    }

    #[test]
    fn tickets_are_single_use_and_session_bound() {
        let t = Instant::now();
        let mut lc = opened(t);
        let a = lc.issue_ticket(CloseReason::Esc);
        let b = lc.issue_ticket(CloseReason::Backdrop);
        assert_eq!(lc.outstanding_tickets(), 2);
        assert!(lc.redeem(b));
        assert!(!lc.redeem(b));

        lc.finish_close();
        lc.begin_open(t).unwrap();
        assert!(!lc.redeem(a), "ticket from a previous session must be stale");
    }

    #[test]
    fn staged_open_target() {
        let t = Instant::now();
        let mut lc = Lifecycle::new();
        lc.begin_open(t + Duration::from_millis(400)).unwrap();
        lc.stage_open_target(2);
        assert!(lc.has_staged_target());
        assert_eq!(lc.take_staged_target(), Some(2));
        assert_eq!(lc.take_staged_target(), None);
        assert!(!lc.open_deadline_passed(t));
        assert!(lc.open_deadline_passed(t + Duration::from_millis(400)));
    }

    #[test]
    fn names() {
        assert_eq!(CloseReason::History.to_string(), "history");
        assert_eq!(LifecyclePhase::Closing.to_string(), "closing");
        assert!(CloseOutcome::Closing.is_closing());
        assert!(!CloseOutcome::Denied.is_closing());
    }
}
