//! Shared fixtures: recording collaborators and a pre-wired sheet.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use sheetkit::core::event::PointerEvent;
use sheetkit::core::geometry::Point;
use sheetkit::core::gesture::ScrollRegion;
use sheetkit::{
    CloseGuard, CloseReason, CloseTicket, Confirmation, FocusHost, FocusId, HistoryHost,
    HostError, InertHost, OpenAnimation, PointerOutcome, ScrollLockHost, Sheet, SheetConfig,
    SheetHosts, StackingContext, ViewHost,
};
use web_time::{Duration, Instant};

pub const H: f64 = 600.0;

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Ordered log of collaborator calls shared by every recording host.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Rc<RefCell<Vec<&'static str>>>,
    pub fail_history_push: Rc<Cell<bool>>,
    pub fail_scroll_lock: Rc<Cell<bool>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.borrow().iter().filter(|c| **c == call).count()
    }

    fn push(&self, call: &'static str) {
        self.calls.borrow_mut().push(call);
    }
}

impl HistoryHost for Recorder {
    fn push_entry(&mut self) -> Result<(), HostError> {
        if self.fail_history_push.get() {
            return Err(HostError::unavailable("history"));
        }
        self.push("history.push");
        Ok(())
    }

    fn pop_entry(&mut self) -> Result<(), HostError> {
        self.push("history.pop");
        Ok(())
    }
}

impl ScrollLockHost for Recorder {
    fn lock(&mut self) -> Result<(), HostError> {
        if self.fail_scroll_lock.get() {
            return Err(HostError::failed("scroll lock", "body detached"));
        }
        self.push("scroll.lock");
        Ok(())
    }

    fn unlock(&mut self) -> Result<(), HostError> {
        self.push("scroll.unlock");
        Ok(())
    }
}

impl InertHost for Recorder {
    fn set_inert(&mut self, inert: bool) -> Result<(), HostError> {
        self.push(if inert { "inert.on" } else { "inert.off" });
        Ok(())
    }
}

impl FocusHost for Recorder {
    fn capture(&mut self) -> Result<(), HostError> {
        self.push("focus.capture");
        Ok(())
    }

    fn restore(&mut self) -> Result<(), HostError> {
        self.push("focus.restore");
        Ok(())
    }
}

/// View whose scroll region and focus state tests can poke at.
#[derive(Debug, Clone)]
pub struct TestView {
    pub height: Rc<Cell<f64>>,
    pub region: Rc<Cell<Option<ScrollRegion>>>,
    pub focusables: Rc<RefCell<Vec<FocusId>>>,
    pub focused: Rc<Cell<Option<FocusId>>>,
    rec: Recorder,
}

impl TestView {
    pub fn new(rec: &Recorder) -> Self {
        Self {
            height: Rc::new(Cell::new(H)),
            region: Rc::new(Cell::new(None)),
            focusables: Rc::new(RefCell::new(Vec::new())),
            focused: Rc::new(Cell::new(None)),
            rec: rec.clone(),
        }
    }
}

impl ViewHost for TestView {
    fn sheet_height(&self) -> f64 {
        self.height.get()
    }

    fn scroll_region_at(&self, _point: Point) -> Option<ScrollRegion> {
        self.region.get()
    }

    fn set_pointer_capture(&mut self, _pointer_id: u32, captured: bool) -> Result<(), HostError> {
        self.rec.push(if captured { "capture.on" } else { "capture.off" });
        Ok(())
    }

    fn set_drag_lock(&mut self, locked: bool) -> Result<(), HostError> {
        self.rec.push(if locked { "drag_lock.on" } else { "drag_lock.off" });
        Ok(())
    }

    fn focus_targets(&self) -> Vec<FocusId> {
        self.focusables.borrow().clone()
    }

    fn focused(&self) -> Option<FocusId> {
        self.focused.get()
    }

    fn focus(&mut self, target: FocusId) -> Result<(), HostError> {
        self.focused.set(Some(target));
        Ok(())
    }
}

/// Guard answering from a script; `Allow` once the script runs out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGuard {
    pub answers: Rc<RefCell<VecDeque<Confirmation>>>,
    pub asked: Rc<RefCell<Vec<(CloseReason, CloseTicket)>>>,
}

impl ScriptedGuard {
    pub fn answering(answers: impl IntoIterator<Item = Confirmation>) -> Self {
        let guard = Self::default();
        guard.answers.borrow_mut().extend(answers);
        guard
    }
}

impl CloseGuard for ScriptedGuard {
    fn confirm(&mut self, reason: CloseReason, ticket: CloseTicket) -> Confirmation {
        self.asked.borrow_mut().push((reason, ticket));
        self.answers
            .borrow_mut()
            .pop_front()
            .unwrap_or(Confirmation::Allow)
    }
}

/// A sheet wired to recording collaborators.
pub struct Fixture {
    pub sheet: Sheet,
    pub rec: Recorder,
    pub view: TestView,
    pub stacking: StackingContext,
    pub t0: Instant,
}

impl Fixture {
    pub fn new(config: SheetConfig) -> Self {
        Self::build(config, None, StackingContext::new())
    }

    pub fn with_guard(config: SheetConfig, guard: ScriptedGuard) -> Self {
        Self::build(config, Some(guard), StackingContext::new())
    }

    pub fn with_stacking(config: SheetConfig, stacking: StackingContext) -> Self {
        Self::build(config, None, stacking)
    }

    fn build(config: SheetConfig, guard: Option<ScriptedGuard>, stacking: StackingContext) -> Self {
        let rec = Recorder::default();
        let view = TestView::new(&rec);
        let mut hosts = SheetHosts::new(view.clone())
            .with_history(rec.clone())
            .with_scroll_lock(rec.clone())
            .with_inert(rec.clone())
            .with_focus(rec.clone());
        if let Some(guard) = guard {
            hosts = hosts.with_guard(guard);
        }
        Self {
            sheet: Sheet::new(config, hosts, stacking.clone()),
            rec,
            view,
            stacking,
            t0: Instant::now(),
        }
    }

    /// Open with no entrance animation and settle; clears events and calls.
    pub fn opened(config: SheetConfig) -> Self {
        let mut fx = Self::new(config.with_open_animation(OpenAnimation::Instant));
        fx.open_settled();
        fx
    }

    pub fn open_settled(&mut self) {
        self.sheet.open(self.t0).expect("open from closed");
        self.sheet.frame(self.t0);
        self.sheet.drain_events();
        self.rec.clear();
    }

    pub fn at(&self, millis: u64) -> Instant {
        self.t0 + ms(millis)
    }

    /// Slow vertical drag from `from_y` to `to_y`, starting at `start_ms`.
    /// Leaves the pointer down.
    pub fn slow_drag(&mut self, from_y: f64, to_y: f64, start_ms: u64) -> u64 {
        const STEPS: u64 = 10;
        let pointer = PointerEvent::touch(7, 200.0, from_y);
        self.sheet.pointer_down(&pointer, self.at(start_ms));
        let mut t = start_ms;
        for i in 1..=STEPS {
            t += 60;
            let y = from_y + (to_y - from_y) * (i as f64) / (STEPS as f64);
            self.sheet
                .pointer_move(&PointerEvent::touch(7, 200.0, y), self.at(t));
        }
        t
    }

    /// Release pointer 7 at `y`, well after the last move so velocity is zero.
    pub fn release_still(&mut self, y: f64, last_move_ms: u64) -> PointerOutcome {
        self.sheet
            .pointer_up(&PointerEvent::touch(7, 200.0, y), self.at(last_move_ms + 200))
    }
}
