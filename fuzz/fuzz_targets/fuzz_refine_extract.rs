#![no_main]
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    track: Vec<bool>,
    gap_tolerance: u8,
    min_run_width: u8,
    close_edge_gaps: bool,
}

fuzz_target!(|input: Input| {
    let mut track = input.track;
    let before = track.clone();
    turret_core::refine_track(
        &mut track,
        usize::from(input.gap_tolerance),
        input.close_edge_gaps,
    );
    // Refinement only ever adds detections.
    for (b, a) in before.iter().zip(&track) {
        assert!(!*b || *a);
    }

    let targets = turret_core::extract_track(&track, usize::from(input.min_run_width));
    assert!(targets.windows(2).all(|w| w[0] < w[1]));
    for t in targets {
        assert!(track[t]);
    }
});
