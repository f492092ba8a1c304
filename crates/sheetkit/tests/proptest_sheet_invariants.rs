//! Property-based invariant tests for the engine.
//!
//! 1. Position and derived style stay finite and within their ranges
//! 2. A sheet holds a stack slot exactly while it is visible
//! 3. Only an open sheet has a gesture session
//! 4. Closing always releases every collaborator acquired along the way
//! 5. Snapping to any valid index lands on that index's value

mod common;

use common::Fixture;
use proptest::prelude::*;
use sheetkit::core::event::{KeyCode, KeyEvent, PointerEvent, WheelEvent};
use sheetkit::core::gesture::GestureConfig;
use sheetkit::{CloseReason, LifecyclePhase, SheetConfig};
use web_time::Duration;

#[derive(Debug, Clone)]
enum Op {
    Open,
    Close,
    RequestClose,
    Backdrop,
    HistoryBack,
    TransitionEnd,
    Tick,
    Down(f64, f64),
    Move(f64, f64),
    Up(f64, f64),
    Cancel,
    Wheel(f64),
    Key(KeyCode),
    Snap(usize),
    SetHeight(f64),
}

fn key_code() -> impl Strategy<Value = KeyCode> {
    prop_oneof![
        Just(KeyCode::Escape),
        Just(KeyCode::Tab),
        Just(KeyCode::Up),
        Just(KeyCode::Down),
        Just(KeyCode::Home),
        Just(KeyCode::End),
        Just(KeyCode::Char('x')),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Open),
        1 => Just(Op::Close),
        1 => Just(Op::RequestClose),
        1 => Just(Op::Backdrop),
        1 => Just(Op::HistoryBack),
        2 => Just(Op::TransitionEnd),
        3 => Just(Op::Tick),
        3 => (0.0f64..400.0, 0.0f64..800.0).prop_map(|(x, y)| Op::Down(x, y)),
        6 => (0.0f64..400.0, -200.0f64..1_200.0).prop_map(|(x, y)| Op::Move(x, y)),
        3 => (0.0f64..400.0, -200.0f64..1_200.0).prop_map(|(x, y)| Op::Up(x, y)),
        1 => Just(Op::Cancel),
        2 => (-80.0f64..80.0).prop_map(Op::Wheel),
        2 => key_code().prop_map(Op::Key),
        2 => (0usize..6).prop_map(Op::Snap),
        1 => prop_oneof![Just(f64::NAN), -10.0f64..1_200.0].prop_map(Op::SetHeight),
    ]
}

fn script() -> impl Strategy<Value = Vec<(Op, u64)>> {
    prop::collection::vec((op(), 0u64..400), 1..80)
}

fn config(points: &[f64], reduced_motion: bool) -> SheetConfig {
    SheetConfig::default()
        .with_snap_points(points)
        .with_reduced_motion(reduced_motion)
        .with_gesture(GestureConfig::default().with_double_tap(Duration::from_millis(200), 10.0))
}

fn apply(fx: &mut Fixture, op: &Op, t: u64) {
    let now = fx.at(t);
    match *op {
        Op::Open => {
            let _ = fx.sheet.open(now);
        }
        Op::Close => {
            fx.sheet.close(CloseReason::Programmatic);
        }
        Op::RequestClose => {
            fx.sheet.request_close(CloseReason::Programmatic, now);
        }
        Op::Backdrop => {
            fx.sheet.backdrop_click(now);
        }
        Op::HistoryBack => {
            fx.sheet.on_history_back();
        }
        Op::TransitionEnd => fx.sheet.transition_end(),
        Op::Tick => {
            fx.sheet.frame(now);
        }
        Op::Down(x, y) => {
            fx.sheet.pointer_down(&PointerEvent::touch(7, x, y), now);
        }
        Op::Move(x, y) => {
            fx.sheet.pointer_move(&PointerEvent::touch(7, x, y), now);
        }
        Op::Up(x, y) => {
            fx.sheet.pointer_up(&PointerEvent::touch(7, x, y), now);
        }
        Op::Cancel => {
            fx.sheet.pointer_cancel(7, now);
        }
        Op::Wheel(dy) => {
            fx.sheet.wheel(&WheelEvent::new(dy, 100.0, 100.0), now);
        }
        Op::Key(code) => {
            fx.sheet.keydown(&KeyEvent::new(code), now);
        }
        Op::Snap(index) => {
            fx.sheet.snap_to_index(index, true);
        }
        Op::SetHeight(h) => fx.sheet.set_sheet_height(h),
    }
}

fn check(fx: &Fixture) -> Result<(), TestCaseError> {
    let sheet = &fx.sheet;
    let pos = sheet.position();
    prop_assert!(pos.offset.is_finite() && pos.offset >= 0.0, "offset {}", pos.offset);
    prop_assert!((0.0..=1.0).contains(&pos.over_up));
    prop_assert!((0.0..=1.0).contains(&sheet.progress()));
    prop_assert!(sheet.current_snap_index() < sheet.snap_points().len());

    let style = sheet.style();
    let min_scale = 1.0 - sheet.config().max_compression;
    prop_assert!(style.scale <= 1.0 && style.scale >= min_scale, "scale {}", style.scale);
    prop_assert!((0.0..=1.0).contains(&style.backdrop_opacity));
    prop_assert!(style.translate_y_px.is_finite());

    let visible = sheet.phase().is_visible();
    prop_assert_eq!(style.visible, visible);
    prop_assert_eq!(sheet.stack_index().is_some(), visible);
    prop_assert_eq!(fx.stacking.depth(), usize::from(visible));
    if sheet.gesture().is_some() {
        prop_assert_eq!(sheet.phase(), LifecyclePhase::Open);
    }
    Ok(())
}

fn balanced(fx: &Fixture, on: &str, off: &str) -> Result<(), TestCaseError> {
    prop_assert_eq!(fx.rec.count(on), fx.rec.count(off), "{} vs {}", on, off);
    Ok(())
}

proptest! {
    #[test]
    fn random_interaction_keeps_invariants(
        points in prop::collection::vec(0.0f64..=1.0, 0..5),
        reduced_motion in any::<bool>(),
        ops in script(),
    ) {
        let mut fx = Fixture::new(config(&points, reduced_motion));
        let mut t = 0;
        for (op, dt) in &ops {
            t += dt;
            apply(&mut fx, op, t);
            check(&fx)?;
        }

        fx.sheet.close(CloseReason::Programmatic);
        prop_assert_eq!(fx.sheet.phase(), LifecyclePhase::Closed);
        prop_assert_eq!(fx.stacking.depth(), 0);
        prop_assert!(fx.sheet.gesture().is_none());
        balanced(&fx, "scroll.lock", "scroll.unlock")?;
        balanced(&fx, "inert.on", "inert.off")?;
        balanced(&fx, "focus.capture", "focus.restore")?;
        balanced(&fx, "capture.on", "capture.off")?;
        balanced(&fx, "drag_lock.on", "drag_lock.off")?;
    }

    #[test]
    fn snapping_to_any_valid_index_round_trips(
        points in prop::collection::vec(0.0f64..=1.0, 0..6),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut fx = Fixture::opened(config(&points, false));
        let index = pick.index(fx.sheet.snap_points().len());
        let expected = fx.sheet.snap_points().value(index);

        prop_assert_eq!(fx.sheet.snap_to_index(index, false), index);
        prop_assert_eq!(fx.sheet.current_snap_index(), index);
        prop_assert!((fx.sheet.progress() - expected).abs() < 1e-9);
    }
}
