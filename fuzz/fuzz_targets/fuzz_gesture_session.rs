#![no_main]

use libfuzzer_sys::fuzz_target;
use sheetkit_core::geometry::Point;
use sheetkit_core::gesture::{
    AxisLock, GestureConfig, GesturePhase, GestureSession, MoveOutcome, ReleaseDecision,
    ScrollRegion,
};
use sheetkit_core::snap::SnapPointSet;
use web_time::{Duration, Instant};

fuzz_target!(|data: &[u8]| {
    // Header: sheet height, scroll region flavour, snap count.
    if data.len() < 3 {
        return;
    }
    let height = f64::from(data[0]) * 4.0;
    let region = match data[1] % 4 {
        0 => None,
        1 => Some(ScrollRegion::new(0.0, 1_000.0, 300.0)),
        2 => Some(ScrollRegion::new(350.0, 1_000.0, 300.0)),
        _ => Some(ScrollRegion::new(700.0, 1_000.0, 300.0)),
    };
    let snaps = SnapPointSet::new(
        &(0..(data[2] % 5))
            .map(|i| f64::from(i) * 0.3)
            .collect::<Vec<_>>(),
    );
    let config = GestureConfig::default();
    let t0 = Instant::now();

    let mut session = GestureSession::begin(1, Point::new(0.0, 0.0), region, 0.0, t0);
    let mut locked: Option<AxisLock> = None;
    let mut t = t0;

    // Remaining bytes: (dx, dy, dt) triples of signed displacement and ms.
    for chunk in data[3..].chunks_exact(3) {
        let dx = f64::from(chunk[0] as i8) * 3.0;
        let dy = f64::from(chunk[1] as i8) * 3.0;
        t += Duration::from_millis(u64::from(chunk[2]));
        let outcome = session.update(Point::new(dx, dy), t, height, &config, || region);

        if let MoveOutcome::Began(frame) | MoveOutcome::Moved(frame) = outcome {
            assert!(frame.offset >= 0.0, "negative offset");
            assert!(frame.offset.is_finite(), "non-finite offset");
            assert!((0.0..=1.0).contains(&frame.over_up), "over_up out of range");
            assert!(
                frame.offset <= height + config.max_overdrag_down + 1e-9,
                "overdrag beyond bound"
            );
        }
        if session.axis() != AxisLock::None {
            match locked {
                Some(axis) => assert_eq!(axis, session.axis(), "axis lock flipped"),
                None => locked = Some(session.axis()),
            }
        }
        if matches!(session.phase(), GesturePhase::Aborted | GesturePhase::Yielded) {
            assert!(!session.is_dragging());
        }
    }

    match session.release(None, t, height, &snaps, &config) {
        ReleaseDecision::Snap { index } => {
            assert!(index < snaps.len());
            assert!(!snaps.is_closed_index(index));
        }
        ReleaseDecision::Dismiss { .. } | ReleaseDecision::NotDragging => {}
    }
});
