#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sheetkit::core::event::{KeyCode, KeyEvent, PointerEvent, WheelEvent};
use sheetkit::{CloseReason, Sheet, SheetConfig, SheetHosts, StackingContext, StaticView};
use web_time::{Duration, Instant};

#[derive(Debug, Arbitrary)]
enum Op {
    Open,
    Close,
    RequestClose,
    HistoryBack,
    TransitionEnd,
    Frame,
    Down { pointer: u8, x: i16, y: i16 },
    Move { pointer: u8, x: i16, y: i16 },
    Up { pointer: u8, x: i16, y: i16 },
    Cancel { pointer: u8 },
    Wheel { delta: i8 },
    Key { code: u8 },
    Snap { index: u8 },
    SetHeight { height: i16 },
}

#[derive(Debug, Arbitrary)]
struct Input {
    snap_points: Vec<u8>,
    reduced_motion: bool,
    ops: Vec<(Op, u8)>,
}

fn key(code: u8) -> KeyCode {
    match code % 8 {
        0 => KeyCode::Escape,
        1 => KeyCode::Tab,
        2 => KeyCode::Up,
        3 => KeyCode::Down,
        4 => KeyCode::Home,
        5 => KeyCode::End,
        6 => KeyCode::Enter,
        _ => KeyCode::Char('k'),
    }
}

fuzz_target!(|input: Input| {
    let points: Vec<f64> = input
        .snap_points
        .iter()
        .map(|&p| f64::from(p) / 200.0)
        .collect();
    let config = SheetConfig::default()
        .with_snap_points(&points)
        .with_reduced_motion(input.reduced_motion);
    let stacking = StackingContext::new();
    let view = StaticView::new(600.0).with_focusables([1, 2, 3]);
    let mut sheet = Sheet::new(config, SheetHosts::new(view), stacking.clone());
    let mut now = Instant::now();

    for (op, dt) in input.ops.iter().take(512) {
        now += Duration::from_millis(u64::from(*dt) * 4);
        match *op {
            Op::Open => {
                let _ = sheet.open(now);
            }
            Op::Close => {
                sheet.close(CloseReason::Programmatic);
            }
            Op::RequestClose => {
                sheet.request_close(CloseReason::Backdrop, now);
            }
            Op::HistoryBack => {
                sheet.on_history_back();
            }
            Op::TransitionEnd => sheet.transition_end(),
            Op::Frame => {
                sheet.frame(now);
            }
            Op::Down { pointer, x, y } => {
                let e = PointerEvent::touch(u32::from(pointer % 3), f64::from(x), f64::from(y));
                sheet.pointer_down(&e, now);
            }
            Op::Move { pointer, x, y } => {
                let e = PointerEvent::touch(u32::from(pointer % 3), f64::from(x), f64::from(y));
                sheet.pointer_move(&e, now);
            }
            Op::Up { pointer, x, y } => {
                let e = PointerEvent::touch(u32::from(pointer % 3), f64::from(x), f64::from(y));
                sheet.pointer_up(&e, now);
            }
            Op::Cancel { pointer } => {
                sheet.pointer_cancel(u32::from(pointer % 3), now);
            }
            Op::Wheel { delta } => {
                sheet.wheel(&WheelEvent::new(f64::from(delta), 0.0, 0.0), now);
            }
            Op::Key { code } => {
                sheet.keydown(&KeyEvent::new(key(code)), now);
            }
            Op::Snap { index } => {
                sheet.snap_to_index(usize::from(index), true);
            }
            Op::SetHeight { height } => sheet.set_sheet_height(f64::from(height)),
        }

        let style = sheet.style();
        assert!(style.translate_y_px.is_finite() && style.translate_y_px >= 0.0);
        assert!((0.0..=1.0).contains(&style.backdrop_opacity));
        assert!(style.scale > 0.0 && style.scale <= 1.0);
        assert_eq!(style.visible, sheet.phase().is_visible());
        assert_eq!(sheet.stack_index().is_some(), style.visible);
        assert!(sheet.current_snap_index() < sheet.snap_points().len());
    }

    sheet.close(CloseReason::Programmatic);
    assert_eq!(stacking.depth(), 0, "stack slot leaked");
});
