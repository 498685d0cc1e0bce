//! Gap refinement: bridge short dropouts inside detection runs.
//!
//! Runs are half-open `[begin, end)`. A gap is the `false` run that follows a
//! detection run; it is filled when shorter than the tolerance. A gap before
//! the first detection is never touched; one that reaches the end of the
//! buffer is filled only when edge gaps are enabled.

use crate::buffer::AngularBuffer;
use crate::config::RefineCfg;

/// Close short gaps in `track`; returns the number of gaps closed.
///
/// Applying it a second time with the same arguments changes nothing.
pub fn refine_track(track: &mut [bool], gap_tolerance: usize, close_edge_gaps: bool) -> usize {
    let n = track.len();
    let mut i = track.iter().position(|&d| d).unwrap_or(n);
    let mut closed = 0;
    while i < n {
        while i < n && track[i] {
            i += 1;
        }
        let gap_start = i;
        while i < n && !track[i] {
            i += 1;
        }
        let gap_len = i - gap_start;
        if gap_len == 0 {
            break;
        }
        let at_edge = i == n;
        if gap_len < gap_tolerance && (close_edge_gaps || !at_edge) {
            track[gap_start..i].fill(true);
            closed += 1;
        }
    }
    closed
}

/// Refine the buffer's detection track in place.
pub fn refine(buffer: &mut AngularBuffer, cfg: &RefineCfg) -> usize {
    let closed = refine_track(
        buffer.detected_mut(),
        cfg.gap_tolerance,
        cfg.close_edge_gaps,
    );
    tracing::debug!(closed, tolerance = cfg.gap_tolerance, "gaps refined");
    closed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(s: &str) -> Vec<bool> {
        s.chars().map(|c| c == '#').collect()
    }

    #[test]
    fn interior_gap_below_tolerance_is_closed() {
        let mut t = track("..##..##..");
        assert_eq!(refine_track(&mut t, 3, false), 1);
        assert_eq!(t, track("..######.."));
    }

    #[test]
    fn gap_equal_to_tolerance_stays_open() {
        let mut t = track("#...#");
        assert_eq!(refine_track(&mut t, 3, true), 0);
        assert_eq!(t, track("#...#"));
    }

    #[test]
    fn leading_gap_is_never_closed() {
        let mut t = track(".#");
        assert_eq!(refine_track(&mut t, 5, true), 0);
        assert_eq!(t, track(".#"));
    }

    #[test]
    fn trailing_gap_follows_edge_flag() {
        let mut t = track("##.");
        assert_eq!(refine_track(&mut t, 5, false), 0);
        assert_eq!(refine_track(&mut t, 5, true), 1);
        assert_eq!(t, track("###"));
    }

    #[test]
    fn empty_and_all_false_tracks_are_untouched() {
        let mut empty: Vec<bool> = Vec::new();
        assert_eq!(refine_track(&mut empty, 5, true), 0);
        let mut none = vec![false; 181];
        assert_eq!(refine_track(&mut none, 5, true), 0);
        assert!(none.iter().all(|&d| !d));
    }
}
