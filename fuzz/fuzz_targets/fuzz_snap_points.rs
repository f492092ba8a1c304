#![no_main]

use libfuzzer_sys::fuzz_target;
use sheetkit::config::parse_snap_points;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(snaps) = parse_snap_points(text) else {
        return;
    };

    let points = snaps.points();
    assert!(!points.is_empty(), "empty snap set");
    for w in points.windows(2) {
        assert!(w[0] < w[1], "snap points not ascending: {points:?}");
    }
    for p in points {
        assert!((0.0..=1.0).contains(p), "snap point out of range: {p}");
    }
    assert!(!snaps.open_indices().is_empty());
});
