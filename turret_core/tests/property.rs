use proptest::prelude::*;
use turret_core::{detection_runs, extract_track, refine_track};

fn false_runs(track: &[bool]) -> Vec<(usize, usize)> {
    let inverted: Vec<bool> = track.iter().map(|d| !d).collect();
    detection_runs(&inverted)
}

fn track_strategy() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 0..=181)
}

proptest! {
    #[test]
    fn refine_is_idempotent(
        track in track_strategy(),
        tol in 0usize..12,
        edge in any::<bool>(),
    ) {
        let mut once = track.clone();
        refine_track(&mut once, tol, edge);
        let mut twice = once.clone();
        let closed_again = refine_track(&mut twice, tol, edge);
        prop_assert_eq!(closed_again, 0);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn remaining_gaps_are_wide_or_exempt(
        track in track_strategy(),
        tol in 0usize..12,
        edge in any::<bool>(),
    ) {
        let mut out = track.clone();
        refine_track(&mut out, tol, edge);
        let n = out.len();
        let first_hit = out.iter().position(|&d| d).unwrap_or(n);
        for (b, e) in false_runs(&out) {
            let leading = b == 0 && e == first_hit;
            let trailing = e == n && b > 0;
            if leading || (trailing && !edge) {
                continue;
            }
            prop_assert!(e - b >= tol, "gap [{}, {}) shorter than {}", b, e, tol);
        }
    }

    #[test]
    fn refine_only_turns_gaps_on(track in track_strategy(), tol in 0usize..12) {
        let mut out = track.clone();
        refine_track(&mut out, tol, true);
        for (before, after) in track.iter().zip(&out) {
            prop_assert!(!*before || *after);
        }
        let lead_in = track.iter().take_while(|d| !**d).count();
        prop_assert!(out[..lead_in].iter().all(|d| !*d));
    }

    #[test]
    fn extract_never_exceeds_run_count(track in track_strategy(), min in 0usize..8) {
        let targets = extract_track(&track, min);
        prop_assert!(targets.len() <= detection_runs(&track).len());
        prop_assert!(targets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn extract_keeps_exactly_the_wide_runs(track in track_strategy(), min in 0usize..8) {
        let targets = extract_track(&track, min);
        let wide: Vec<usize> = detection_runs(&track)
            .into_iter()
            .filter(|(b, e)| e - b > min)
            .map(|(b, e)| (b + e) / 2)
            .collect();
        prop_assert_eq!(&targets, &wide);
        for t in targets {
            prop_assert!(track[t]);
        }
    }
}
