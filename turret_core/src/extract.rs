//! Target extraction: one firing angle per sufficiently wide detection run.

use crate::buffer::AngularBuffer;
use crate::config::ExtractCfg;

/// Maximal `true` runs of `track` as half-open `(begin, end)` pairs, ascending.
pub fn detection_runs(track: &[bool]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut begin = None;
    for (i, &d) in track.iter().enumerate() {
        match (d, begin) {
            (true, None) => begin = Some(i),
            (false, Some(b)) => {
                runs.push((b, i));
                begin = None;
            }
            _ => {}
        }
    }
    if let Some(b) = begin {
        runs.push((b, track.len()));
    }
    runs
}

/// Midpoints of runs wider than `min_run_width`, ascending.
pub fn extract_track(track: &[bool], min_run_width: usize) -> Vec<usize> {
    detection_runs(track)
        .into_iter()
        .filter(|&(b, e)| e - b > min_run_width)
        .map(|(b, e)| (b + e) / 2)
        .collect()
}

/// Select targets from the refined detection track and mark them in the buffer.
pub fn extract(buffer: &mut AngularBuffer, cfg: &ExtractCfg) -> Vec<usize> {
    let targets = extract_track(buffer.detected(), cfg.min_run_width);
    buffer.clear_targets();
    for &a in &targets {
        buffer.mark_target(a);
    }
    tracing::debug!(count = targets.len(), ?targets, "targets extracted");
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_are_half_open() {
        let t = [false, true, true, false, true];
        assert_eq!(detection_runs(&t), vec![(1, 3), (4, 5)]);
    }

    #[test]
    fn width_must_exceed_minimum() {
        let t = [true, true, false, true, true, true];
        assert_eq!(extract_track(&t, 2), vec![4]);
        assert_eq!(extract_track(&t, 1), vec![1, 4]);
    }

    #[test]
    fn extract_marks_buffer_targets() {
        let mut b = AngularBuffer::from_detected(vec![false, true, true, true, false]);
        let targets = extract(&mut b, &ExtractCfg { min_run_width: 1 });
        assert_eq!(targets, vec![2]);
        assert!(b.is_target(2));
        assert_eq!(b.targets(), targets);
    }
}
