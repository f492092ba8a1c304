#![forbid(unsafe_code)]

//! The bottom-sheet engine.
//!
//! [`Sheet`] owns one sheet's state: lifecycle, position, snap points, the
//! active gesture session, the keydown registry and the event queue. The
//! host drives it with raw input and timestamps and reads back
//! [`SheetStyle`] plus drained [`SheetEvent`]s.
//!
//! # Timing
//!
//! Nothing here reads a clock. Every time-dependent operation takes `now`,
//! and the host is expected to call [`Sheet::frame`] once per animation frame
//! (or [`Sheet::tick`] from a timer) while the sheet is visible, and
//! [`Sheet::transition_end`] when the view finishes a transition.
//!
//! # Invariants
//!
//! 1. At most one gesture session exists; input from other pointers is
//!    ignored until it ends.
//! 2. Every close path releases the stack slot, scroll lock, inert marking,
//!    pointer capture and drag lock, whatever triggered it.
//! 3. `close` is idempotent: a second call emits nothing.
//! 4. A denied, failed or stale close confirmation changes nothing.
//! 5. A closing sheet always finalizes: on transition end, or on the first
//!    tick past `exit_duration + CLOSE_GRACE`.
//!
//! # Example
//!
//! ```
//! use sheetkit::{Sheet, SheetConfig, SheetEvent, SheetHosts, StackingContext, StaticView};
//! use sheetkit::config::OpenAnimation;
//! use web_time::Instant;
//!
//! let config = SheetConfig::default()
//!     .with_snap_points(&[0.0, 0.5, 1.0])
//!     .with_open_animation(OpenAnimation::Instant);
//! let mut sheet = Sheet::new(config, SheetHosts::new(StaticView::new(600.0)), StackingContext::new());
//!
//! let now = Instant::now();
//! sheet.open(now).unwrap();
//! sheet.frame(now);
//! sheet.snap_to_index(1, false);
//! assert_eq!(sheet.style().translate_y_px, 300.0);
//! assert_eq!(
//!     sheet.drain_events(),
//!     vec![
//!         SheetEvent::Open,
//!         SheetEvent::AfterOpen,
//!         SheetEvent::Snap { index: 1, progress: 0.5 },
//!     ]
//! );
//! ```

use sheetkit_core::event::{KeyCode, KeyEvent, PointerEvent, WheelEvent};
use sheetkit_core::geometry::{Point, clamp01};
use sheetkit_core::gesture::{DragFrame, GesturePhase, GestureSession, MoveOutcome, ReleaseDecision};
use sheetkit_core::keydown::KeydownRegistry;
use sheetkit_core::snap::SnapPointSet;
use sheetkit_core::tap::DoubleTapDetector;
use sheetkit_core::wheel::{WheelStep, WheelStepper};
use web_time::Instant;

use crate::LOG_TARGET;
use crate::config::{OpenAnimation, SheetConfig};
use crate::error::{HostError, SheetError};
use crate::events::{EventQueue, SheetEvent};
use crate::focus_trap::{initial_focus, next_focus};
use crate::host::{Confirmation, SheetHosts, ViewHost};
use crate::lifecycle::{CLOSE_GRACE, CloseOutcome, CloseReason, CloseTicket, Lifecycle, LifecyclePhase};
use crate::position::{PositionState, SheetStyle, derive_style, sanitize_height};
use crate::stacking::{StackIndex, StackingContext};

// ---------------------------------------------------------------------------
// Pointer outcomes
// ---------------------------------------------------------------------------

/// Why a pointer event was not acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerIgnore {
    /// The sheet is not open (closed, opening or closing).
    NotInteractive,
    /// Another pointer owns the active session.
    ForeignPointer,
    /// No session is active.
    NoSession,
}

/// What a pointer event did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerOutcome {
    /// Not acted on.
    Ignored(PointerIgnore),
    /// Session live, axis not decided yet.
    Tracking,
    /// The sheet follows the pointer.
    Dragging,
    /// An inner scroll region keeps the gesture.
    Yielded,
    /// Horizontal motion; the session is ignored from now on.
    Aborted,
    /// The press completed a double tap; the sheet expands.
    DoubleTap,
    /// The session ended without a drag.
    Released,
    /// The drag ended on a snap index.
    Snapped(usize),
    /// The drag ended in a dismissal.
    Dismissed {
        /// Velocity, not position, decided it.
        fling: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nav {
    Prev,
    Next,
    First,
    Last,
}

// ---------------------------------------------------------------------------
// Sheet
// ---------------------------------------------------------------------------

/// One bottom sheet.
pub struct Sheet {
    config: SheetConfig,
    hosts: SheetHosts,
    stacking: StackingContext,
    registry: KeydownRegistry,
    lifecycle: Lifecycle,
    position: PositionState,
    height: f64,
    snaps: SnapPointSet,
    current_index: usize,
    remembered_index: usize,
    stack_index: Option<StackIndex>,
    history_pushed: bool,
    session: Option<GestureSession>,
    drag_engaged: bool,
    tap: DoubleTapDetector,
    wheel: WheelStepper,
    snap_deadline: Option<Instant>,
    events: EventQueue,
}

impl std::fmt::Debug for Sheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sheet")
            .field("phase", &self.lifecycle.phase())
            .field("position", &self.position)
            .field("height", &self.height)
            .field("snaps", &self.snaps)
            .field("current_index", &self.current_index)
            .field("stack_index", &self.stack_index)
            .field("dragging", &self.is_dragging())
            .finish_non_exhaustive()
    }
}

impl Sheet {
    /// Create a closed sheet.
    pub fn new(config: SheetConfig, hosts: SheetHosts, stacking: StackingContext) -> Self {
        let config = config.validated();
        let height = sanitize_height(hosts.view.sheet_height());
        let snaps = config.snap_points.clone();
        let initial = snaps.clamp_index(config.initial_index);
        Self {
            config,
            hosts,
            stacking,
            registry: KeydownRegistry::new(),
            lifecycle: Lifecycle::new(),
            position: PositionState::default(),
            height,
            snaps,
            current_index: initial,
            remembered_index: initial,
            stack_index: None,
            history_pushed: false,
            session: None,
            drag_engaged: false,
            tap: DoubleTapDetector::new(),
            wheel: WheelStepper::new(),
            snap_deadline: None,
            events: EventQueue::new(),
        }
    }

    // --- Accessors ---

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> LifecyclePhase {
        self.lifecycle.phase()
    }

    /// Whether the sheet is open and at rest or snapping.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.lifecycle.phase() == LifecyclePhase::Open
    }

    /// Primitive position state.
    #[must_use]
    pub fn position(&self) -> PositionState {
        self.position
    }

    /// Sheet height in px used for progress math.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Current progress in [0, 1].
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.position.progress(self.height)
    }

    /// The snap points.
    #[must_use]
    pub fn snap_points(&self) -> &SnapPointSet {
        &self.snaps
    }

    /// Index of the rest position the sheet is at or heading to.
    #[must_use]
    pub fn current_snap_index(&self) -> usize {
        self.current_index
    }

    /// Stack slot held while visible.
    #[must_use]
    pub fn stack_index(&self) -> Option<StackIndex> {
        self.stack_index
    }

    /// Whether the sheet is following a pointer.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.session.as_ref().is_some_and(GestureSession::is_dragging)
    }

    /// The active gesture session.
    #[must_use]
    pub fn gesture(&self) -> Option<&GestureSession> {
        self.session.as_ref()
    }

    /// Effective configuration.
    #[must_use]
    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    /// The view collaborator.
    #[must_use]
    pub fn view(&self) -> &dyn ViewHost {
        self.hosts.view.as_ref()
    }

    /// Dynamic keydown handlers, consulted before the built-in keys.
    ///
    /// Clone the registry to register handlers from elsewhere.
    #[must_use]
    pub fn keydown_registry(&self) -> &KeydownRegistry {
        &self.registry
    }

    /// Render parameters for the current state.
    #[must_use]
    pub fn style(&self) -> SheetStyle {
        derive_style(
            &self.position,
            self.lifecycle.phase(),
            self.height,
            self.stack_index,
            &self.config,
        )
    }

    /// Take every pending event, oldest first.
    pub fn drain_events(&mut self) -> Vec<SheetEvent> {
        self.events.drain()
    }

    // --- Lifecycle ---

    /// Show the sheet. Only valid while closed.
    pub fn open(&mut self, now: Instant) -> Result<(), SheetError> {
        let deadline = now + self.config.enter_duration + CLOSE_GRACE;
        let session = self.lifecycle.begin_open(deadline)?;
        let _span = tracing::debug_span!(target: LOG_TARGET, "sheet.open", session).entered();

        self.height = sanitize_height(self.hosts.view.sheet_height());
        let slot = self.stacking.acquire();
        self.stack_index = Some(slot);

        // Focus must be captured before the background goes inert.
        warn_on_err("focus capture", self.hosts.focus.capture());
        warn_on_err("scroll lock", self.hosts.scroll_lock.lock());
        warn_on_err("inert", self.hosts.inert.set_inert(true));
        self.history_pushed = self.config.use_history
            && match self.hosts.history.push_entry() {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(target: LOG_TARGET, error = %err, "history push failed; continuing without back-navigation");
                    false
                }
            };

        let initial = self.snaps.clamp_index(self.config.initial_index);
        let animation = if self.config.motion_enabled() {
            self.config.open_animation
        } else {
            OpenAnimation::Instant
        };
        match animation {
            OpenAnimation::Instant => {
                self.place_at(initial, false);
            }
            OpenAnimation::SlideUp => {
                self.position.move_to(1.0, self.height, false);
                self.current_index = initial;
                self.lifecycle.stage_open_target(initial);
            }
            OpenAnimation::SnapToRemembered => {
                // place_at overwrites the remembered index.
                let remembered = self.snaps.clamp_index(self.remembered_index);
                self.place_at(initial, false);
                if remembered != initial {
                    self.lifecycle.stage_open_target(remembered);
                }
            }
        }

        if let Some(target) = initial_focus(&self.hosts.view.focus_targets()) {
            warn_on_err("focus", self.hosts.view.focus(target));
        }
        self.events.push(SheetEvent::Open);
        tracing::debug!(
            target: LOG_TARGET,
            stack = slot.get(),
            height = self.height,
            animation = ?animation,
            history = self.history_pushed,
            "sheet opening"
        );
        Ok(())
    }

    /// Ask to close, consulting the close guard if one is installed.
    pub fn request_close(&mut self, reason: CloseReason, now: Instant) -> CloseOutcome {
        if !matches!(
            self.lifecycle.phase(),
            LifecyclePhase::Opening | LifecyclePhase::Open
        ) {
            return CloseOutcome::Ignored;
        }
        if self.hosts.guard.is_none() {
            return self.approve_close(reason, now);
        }

        let ticket = self.lifecycle.issue_ticket(reason);
        let confirmation = match self.hosts.guard.as_mut() {
            Some(guard) => guard.confirm(reason, ticket),
            None => Confirmation::Allow,
        };
        tracing::debug!(target: LOG_TARGET, %reason, ticket = ticket.id(), ?confirmation, "close requested");
        match confirmation {
            Confirmation::Allow => {
                self.lifecycle.redeem(ticket);
                self.approve_close(reason, now)
            }
            Confirmation::Deny => {
                self.lifecycle.redeem(ticket);
                CloseOutcome::Denied
            }
            Confirmation::Failed(err) => {
                self.lifecycle.redeem(ticket);
                tracing::warn!(target: LOG_TARGET, %reason, error = %err, "close guard failed; staying open");
                CloseOutcome::Denied
            }
            Confirmation::Pending => CloseOutcome::Pending(ticket),
        }
    }

    /// Resolve a confirmation that answered [`Confirmation::Pending`].
    ///
    /// Tickets from an earlier open session, or already resolved, are stale
    /// and change nothing.
    pub fn resolve_close(
        &mut self,
        ticket: CloseTicket,
        answer: Result<bool, HostError>,
        now: Instant,
    ) -> CloseOutcome {
        if !self.lifecycle.redeem(ticket) {
            tracing::debug!(target: LOG_TARGET, ticket = ticket.id(), "stale close confirmation ignored");
            return CloseOutcome::Stale;
        }
        match answer {
            Ok(true) => self.approve_close(ticket.reason(), now),
            Ok(false) => CloseOutcome::Denied,
            Err(err) => {
                tracing::warn!(target: LOG_TARGET, reason = %ticket.reason(), error = %err, "close confirmation failed; staying open");
                CloseOutcome::Denied
            }
        }
    }

    /// Close immediately and unconditionally. Returns `false` if already closed.
    pub fn close(&mut self, reason: CloseReason) -> bool {
        if self.lifecycle.phase() == LifecyclePhase::Closed {
            return false;
        }
        let _span = tracing::debug_span!(target: LOG_TARGET, "sheet.close", %reason).entered();

        self.cancel_gesture();
        self.position.reset();
        self.snap_deadline = None;
        self.current_index = self.snaps.nearest_index(0.0);
        if let Some(slot) = self.stack_index.take() {
            self.stacking.release(slot);
        }
        warn_on_err("scroll unlock", self.hosts.scroll_lock.unlock());
        warn_on_err("inert", self.hosts.inert.set_inert(false));
        warn_on_err("focus restore", self.hosts.focus.restore());
        if std::mem::take(&mut self.history_pushed)
            && reason != CloseReason::History
            && let Err(err) = self.hosts.history.pop_entry()
        {
            tracing::debug!(target: LOG_TARGET, error = %err, "history pop failed; ignored");
        }
        self.lifecycle.finish_close();
        self.tap.reset();
        self.wheel.reset();

        self.events.push(SheetEvent::Close { reason });
        tracing::debug!(target: LOG_TARGET, %reason, "sheet closed");
        true
    }

    /// Slide off-screen, then close. Only valid while open.
    ///
    /// With reduced motion the close is immediate.
    pub fn close_animated(&mut self, reason: CloseReason, now: Instant) -> Result<(), SheetError> {
        if !self.config.motion_enabled() {
            if self.lifecycle.phase() != LifecyclePhase::Open {
                return Err(SheetError::InvalidTransition {
                    action: "close with animation",
                    phase: self.lifecycle.phase(),
                });
            }
            self.close(reason);
            return Ok(());
        }
        let deadline = now + self.config.exit_duration + CLOSE_GRACE;
        self.lifecycle.begin_close(reason, deadline)?;
        self.cancel_gesture();
        self.snap_deadline = None;
        self.position.move_to(1.0, self.height, true);
        tracing::debug!(target: LOG_TARGET, %reason, "sheet closing");
        Ok(())
    }

    /// The navigation history went back past the sheet's entry.
    pub fn on_history_back(&mut self) -> bool {
        self.history_pushed = false;
        self.close(CloseReason::History)
    }

    /// Click or tap on the backdrop.
    pub fn backdrop_click(&mut self, now: Instant) -> CloseOutcome {
        if !self.config.close_on_backdrop {
            return CloseOutcome::Ignored;
        }
        self.request_close(CloseReason::Backdrop, now)
    }

    fn approve_close(&mut self, reason: CloseReason, now: Instant) -> CloseOutcome {
        if self.lifecycle.phase() == LifecyclePhase::Open
            && self.config.motion_enabled()
            && self.close_animated(reason, now).is_ok()
        {
            return CloseOutcome::Closing;
        }
        if self.close(reason) {
            CloseOutcome::Closed
        } else {
            CloseOutcome::Ignored
        }
    }

    // --- Timing ---

    /// Advance time-driven transitions. Call from a timer or every frame.
    pub fn tick(&mut self, now: Instant) {
        match self.lifecycle.phase() {
            LifecyclePhase::Opening => {
                if let Some(index) = self.lifecycle.take_staged_target() {
                    self.place_at(index, true);
                    if !self.position.animating {
                        self.settle_open();
                    }
                } else if !self.position.animating || self.lifecycle.open_deadline_passed(now) {
                    self.position.animating = false;
                    self.settle_open();
                }
            }
            LifecyclePhase::Closing => {
                if let Some(reason) = self.lifecycle.take_due_close(now) {
                    tracing::debug!(target: LOG_TARGET, %reason, "exit transition fallback fired");
                    self.close(reason);
                }
            }
            LifecyclePhase::Open => {
                if self.position.animating {
                    match self.snap_deadline {
                        None => {
                            self.snap_deadline =
                                Some(now + self.config.snap_duration + CLOSE_GRACE);
                        }
                        Some(deadline) if now >= deadline => {
                            self.position.animating = false;
                            self.snap_deadline = None;
                        }
                        Some(_) => {}
                    }
                }
            }
            LifecyclePhase::Closed => {}
        }
    }

    /// Per-frame entry point: [`tick`](Self::tick), then the style to render.
    pub fn frame(&mut self, now: Instant) -> SheetStyle {
        self.tick(now);
        self.style()
    }

    /// The view finished the transition it was asked to run.
    pub fn transition_end(&mut self) {
        match self.lifecycle.phase() {
            LifecyclePhase::Opening => {
                if !self.lifecycle.has_staged_target() {
                    self.position.animating = false;
                    self.settle_open();
                }
            }
            LifecyclePhase::Closing => {
                if let Some(reason) = self.lifecycle.take_pending_close() {
                    self.close(reason);
                }
            }
            LifecyclePhase::Open | LifecyclePhase::Closed => {
                self.position.animating = false;
                self.snap_deadline = None;
            }
        }
    }

    fn settle_open(&mut self) {
        if self.lifecycle.settle_open() {
            self.events.push(SheetEvent::AfterOpen);
            tracing::debug!(target: LOG_TARGET, index = self.current_index, "sheet open");
        }
    }

    // --- Positioning ---

    /// Send the sheet to snap `index` (clamped). Returns the index used.
    ///
    /// While closed this only records the index for the next open.
    pub fn snap_to_index(&mut self, index: usize, animate: bool) -> usize {
        let index = self.snaps.clamp_index(index);
        if !self.lifecycle.phase().is_visible() {
            self.current_index = index;
            if !self.snaps.is_closed_index(index) {
                self.remembered_index = index;
            }
            return index;
        }
        self.lifecycle.take_staged_target();
        self.place_at(index, animate);
        let progress = self.snaps.value(index);
        self.events.push(SheetEvent::Snap { index, progress });
        tracing::debug!(target: LOG_TARGET, index, progress, animate, "snap");
        index
    }

    /// Send the sheet to an arbitrary progress in [0, 1].
    pub fn snap_to(&mut self, progress: f64, animate: bool) {
        let progress = clamp01(progress);
        let index = self.snaps.nearest_index(progress);
        self.current_index = index;
        if !self.snaps.is_closed_index(index) {
            self.remembered_index = index;
        }
        if !self.lifecycle.phase().is_visible() {
            return;
        }
        self.lifecycle.take_staged_target();
        self.move_position(progress, animate);
        self.events.push(SheetEvent::Snap { index, progress });
        tracing::debug!(target: LOG_TARGET, index, progress, animate, "snap to progress");
    }

    /// Replace the snap points, optionally moving to `to_index`.
    pub fn set_snap_points(&mut self, points: &[f64], to_index: Option<usize>) {
        self.snaps.set(points);
        self.remembered_index = self.snaps.clamp_index(self.remembered_index);
        match to_index {
            Some(index) => {
                self.snap_to_index(index, true);
            }
            None if self.lifecycle.phase().is_visible() => {
                self.current_index = self.snaps.nearest_index(self.progress());
            }
            None => {
                self.current_index = self.snaps.clamp_index(self.current_index);
            }
        }
        tracing::debug!(target: LOG_TARGET, points = ?self.snaps.points(), "snap points replaced");
    }

    /// The rendered height changed; keep the relative position.
    pub fn set_sheet_height(&mut self, height: f64) {
        let height = sanitize_height(height);
        self.position.reproject(self.height, height);
        self.height = height;
    }

    fn place_at(&mut self, index: usize, animate: bool) -> usize {
        let index = self.snaps.clamp_index(index);
        self.move_position(self.snaps.value(index), animate);
        self.current_index = index;
        if !self.snaps.is_closed_index(index) {
            self.remembered_index = index;
        }
        index
    }

    fn move_position(&mut self, progress: f64, animate: bool) {
        let animate = animate && self.config.motion_enabled();
        self.position.move_to(progress, self.height, animate);
        self.snap_deadline = None;
    }

    // --- Pointer input ---

    /// Pointer, touch or mouse pressed on the sheet.
    pub fn pointer_down(&mut self, event: &PointerEvent, now: Instant) -> PointerOutcome {
        if self.lifecycle.phase() != LifecyclePhase::Open {
            return PointerOutcome::Ignored(PointerIgnore::NotInteractive);
        }
        if let Some(session) = &self.session {
            return if session.pointer_id() == event.pointer_id {
                PointerOutcome::Tracking
            } else {
                PointerOutcome::Ignored(PointerIgnore::ForeignPointer)
            };
        }

        let origin = event.position();
        if self.tap.press(origin, now, &self.config.gesture) {
            tracing::debug!(target: LOG_TARGET, "double tap; expanding");
            self.snap_to_index(0, true);
            return PointerOutcome::DoubleTap;
        }

        let region = self.hosts.view.scroll_region_at(origin);
        self.session = Some(GestureSession::begin(
            event.pointer_id,
            origin,
            region,
            self.position.offset,
            now,
        ));
        tracing::trace!(
            target: LOG_TARGET,
            pointer = event.pointer_id,
            kind = ?event.kind,
            in_scroll_region = region.is_some(),
            "gesture session started"
        );
        PointerOutcome::Tracking
    }

    /// Pointer moved.
    pub fn pointer_move(&mut self, event: &PointerEvent, now: Instant) -> PointerOutcome {
        let Some(session) = self.session.as_mut() else {
            return PointerOutcome::Ignored(PointerIgnore::NoSession);
        };
        if session.pointer_id() != event.pointer_id {
            return PointerOutcome::Ignored(PointerIgnore::ForeignPointer);
        }

        let view = &self.hosts.view;
        let origin = session.origin();
        let outcome = session.update(
            event.position(),
            now,
            self.height,
            &self.config.gesture,
            || view.scroll_region_at(origin),
        );
        let phase = session.phase();

        match outcome {
            MoveOutcome::Pending => PointerOutcome::Tracking,
            MoveOutcome::Inactive => match phase {
                GesturePhase::Yielded => PointerOutcome::Yielded,
                _ => PointerOutcome::Aborted,
            },
            MoveOutcome::Aborted => {
                tracing::debug!(target: LOG_TARGET, pointer = event.pointer_id, "horizontal motion; gesture ignored");
                PointerOutcome::Aborted
            }
            MoveOutcome::Yielded => {
                tracing::debug!(target: LOG_TARGET, pointer = event.pointer_id, "inner scroll keeps gesture");
                PointerOutcome::Yielded
            }
            MoveOutcome::Began(frame) => {
                self.engage_drag(event.pointer_id);
                self.events.push(SheetEvent::DragStart);
                tracing::debug!(target: LOG_TARGET, pointer = event.pointer_id, "drag started");
                self.apply_frame(frame);
                PointerOutcome::Dragging
            }
            MoveOutcome::Moved(frame) => {
                self.apply_frame(frame);
                PointerOutcome::Dragging
            }
        }
    }

    /// Pointer released.
    pub fn pointer_up(&mut self, event: &PointerEvent, now: Instant) -> PointerOutcome {
        self.finish_gesture(event.pointer_id, Some(event.position()), now)
    }

    /// Pointer interaction interrupted; released at its last position.
    pub fn pointer_cancel(&mut self, pointer_id: u32, now: Instant) -> PointerOutcome {
        self.finish_gesture(pointer_id, None, now)
    }

    /// Wheel over the sheet. Returns the new snap index when it stepped.
    pub fn wheel(&mut self, event: &WheelEvent, now: Instant) -> Option<usize> {
        if self.lifecycle.phase() != LifecyclePhase::Open || self.session.is_some() {
            return None;
        }
        let region = self.hosts.view.scroll_region_at(event.position());
        let step = self
            .wheel
            .on_wheel(event.delta_y, region, now, &self.config.gesture)?;
        let nav = match step {
            WheelStep::TowardOpen => Nav::Prev,
            WheelStep::TowardClosed => Nav::Next,
        };
        let target = self.open_index_target(nav)?;
        Some(self.snap_to_index(target, true))
    }

    fn finish_gesture(&mut self, pointer_id: u32, point: Option<Point>, now: Instant) -> PointerOutcome {
        match &self.session {
            None => return PointerOutcome::Ignored(PointerIgnore::NoSession),
            Some(s) if s.pointer_id() != pointer_id => {
                return PointerOutcome::Ignored(PointerIgnore::ForeignPointer);
            }
            Some(_) => {}
        }
        let Some(mut session) = self.session.take() else {
            return PointerOutcome::Ignored(PointerIgnore::NoSession);
        };
        let velocity = session.velocity_at(now);
        let decision = session.release(point, now, self.height, &self.snaps, &self.config.gesture);
        self.disengage_drag(pointer_id);
        self.position.over_up = 0.0;
        tracing::debug!(target: LOG_TARGET, pointer = pointer_id, velocity, ?decision, "gesture released");

        match decision {
            ReleaseDecision::NotDragging => PointerOutcome::Released,
            ReleaseDecision::Dismiss { fling } => {
                self.events.push(SheetEvent::DragEnd { closed: true });
                if !(self.config.motion_enabled()
                    && self.close_animated(CloseReason::Drag, now).is_ok())
                {
                    self.close(CloseReason::Drag);
                }
                PointerOutcome::Dismissed { fling }
            }
            ReleaseDecision::Snap { index } => {
                self.events.push(SheetEvent::DragEnd { closed: false });
                PointerOutcome::Snapped(self.snap_to_index(index, true))
            }
        }
    }

    fn apply_frame(&mut self, frame: DragFrame) {
        self.position.apply_drag(frame);
        self.snap_deadline = None;
        let progress = self.progress();
        self.events.push(SheetEvent::Drag {
            delta_y: frame.delta_y,
            progress,
        });
        tracing::trace!(
            target: LOG_TARGET,
            delta_y = frame.delta_y,
            offset = frame.offset,
            over_up = frame.over_up,
            progress,
            "drag"
        );
    }

    fn engage_drag(&mut self, pointer_id: u32) {
        warn_on_err("drag lock", self.hosts.view.set_drag_lock(true));
        warn_on_err("pointer capture", self.hosts.view.set_pointer_capture(pointer_id, true));
        self.drag_engaged = true;
    }

    fn disengage_drag(&mut self, pointer_id: u32) {
        if !std::mem::take(&mut self.drag_engaged) {
            return;
        }
        warn_on_err("pointer capture", self.hosts.view.set_pointer_capture(pointer_id, false));
        warn_on_err("drag lock", self.hosts.view.set_drag_lock(false));
    }

    fn cancel_gesture(&mut self) {
        if let Some(session) = self.session.take() {
            self.disengage_drag(session.pointer_id());
            tracing::debug!(target: LOG_TARGET, pointer = session.pointer_id(), "gesture cancelled");
        }
        self.position.over_up = 0.0;
    }

    // --- Keyboard ---

    /// Key pressed while the sheet has focus. Returns `true` when handled.
    ///
    /// Registry handlers run first; the built-ins (Tab trap, Escape, snap
    /// navigation) only see keys no handler consumed.
    pub fn keydown(&mut self, event: &KeyEvent, now: Instant) -> bool {
        if !matches!(
            self.lifecycle.phase(),
            LifecyclePhase::Opening | LifecyclePhase::Open
        ) {
            return false;
        }
        let _span = tracing::debug_span!(target: LOG_TARGET, "sheet.keydown", key = ?event.code).entered();

        let report = self.registry.run(event);
        if report.failed > 0 {
            tracing::warn!(target: LOG_TARGET, failed = report.failed, "keydown handlers failed");
        }
        if report.handled {
            return true;
        }
        self.builtin_key(event, now)
    }

    fn builtin_key(&mut self, event: &KeyEvent, now: Instant) -> bool {
        let nav = match event.code {
            KeyCode::Tab => return self.cycle_focus(event.shift()),
            KeyCode::Escape => {
                if !self.config.close_on_escape {
                    return false;
                }
                self.request_close(CloseReason::Esc, now);
                return true;
            }
            _ if event.has_command_modifier() || !self.is_open() => return false,
            KeyCode::Up => Nav::Prev,
            KeyCode::Down => Nav::Next,
            KeyCode::PageUp | KeyCode::Home => Nav::First,
            KeyCode::PageDown | KeyCode::End => Nav::Last,
            _ => return false,
        };
        match self.open_index_target(nav) {
            Some(target) => {
                self.snap_to_index(target, true);
                true
            }
            None => false,
        }
    }

    fn cycle_focus(&mut self, backwards: bool) -> bool {
        let view = &mut self.hosts.view;
        let Some(next) = next_focus(&view.focus_targets(), view.focused(), backwards) else {
            return false;
        };
        warn_on_err("focus", view.focus(next));
        true
    }

    /// Target open index for a navigation step, or `None` if it would not move.
    fn open_index_target(&self, nav: Nav) -> Option<usize> {
        let open = self.snaps.open_indices();
        let last = open.len().checked_sub(1)?;
        let pos = open
            .iter()
            .position(|&i| i == self.current_index)
            .unwrap_or(last);
        let next = match nav {
            Nav::Prev => pos.checked_sub(1)?,
            Nav::Next => (pos + 1).min(last),
            Nav::First => 0,
            Nav::Last => last,
        };
        let target = open.get(next).copied()?;
        (target != self.current_index).then_some(target)
    }
}

impl Drop for Sheet {
    fn drop(&mut self) {
        self.close(CloseReason::Internal);
    }
}

fn warn_on_err(what: &'static str, result: Result<(), HostError>) {
    if let Err(err) = result {
        tracing::warn!(target: LOG_TARGET, collaborator = what, error = %err, "collaborator call failed; continuing");
    }
}
