use rstest::rstest;
use turret_core::{
    AngularBuffer, ExtractCfg, RefineCfg, detection_runs, extract, extract_track, refine,
    refine_track,
};

const F: bool = false;
const T: bool = true;

fn sample_track() -> Vec<bool> {
    vec![F, F, T, T, T, F, F, F, T, T, T, T, F, F]
}

#[rstest]
fn narrow_tolerance_keeps_two_targets() {
    let mut t = sample_track();
    let closed = refine_track(&mut t, 2, true);
    assert_eq!(closed, 0);
    assert_eq!(t, sample_track());
    assert_eq!(extract_track(&t, 1), vec![3, 10]);
}

#[rstest]
#[case::edge_gaps_closed(true, vec![(2, 14)], vec![8])]
#[case::edge_gaps_kept(false, vec![(2, 12)], vec![7])]
fn wide_tolerance_merges_runs(
    #[case] close_edge_gaps: bool,
    #[case] runs: Vec<(usize, usize)>,
    #[case] targets: Vec<usize>,
) {
    let mut t = sample_track();
    refine_track(&mut t, 5, close_edge_gaps);
    assert_eq!(detection_runs(&t), runs);
    assert_eq!(extract_track(&t, 1), targets);
}

#[rstest]
fn all_false_buffer_yields_no_targets() {
    let mut b = AngularBuffer::new(181);
    let closed = refine(&mut b, &RefineCfg::default());
    assert_eq!(closed, 0);
    let targets = extract(&mut b, &ExtractCfg::default());
    assert!(targets.is_empty());
    assert!(b.targets().is_empty());
}

#[rstest]
#[case(1, vec![])]
#[case(0, vec![7])]
fn single_angle_run_needs_width_above_minimum(
    #[case] min_run_width: usize,
    #[case] expected: Vec<usize>,
) {
    let mut t = vec![false; 14];
    t[7] = true;
    assert_eq!(extract_track(&t, min_run_width), expected);
}

#[rstest]
fn run_touching_the_end_is_extracted() {
    let t = [F, F, F, T, T, T];
    assert_eq!(detection_runs(&t), vec![(3, 6)]);
    assert_eq!(extract_track(&t, 1), vec![4]);
}

#[rstest]
fn buffer_pipeline_marks_targets_in_place() {
    let mut b = AngularBuffer::from_detected(sample_track());
    let closed = refine(
        &mut b,
        &RefineCfg {
            gap_tolerance: 5,
            close_edge_gaps: false,
        },
    );
    assert_eq!(closed, 1);
    let targets = extract(&mut b, &ExtractCfg { min_run_width: 1 });
    assert_eq!(targets, vec![7]);
    let marked: Vec<usize> = b.samples().filter(|s| s.target).map(|s| s.angle).collect();
    assert_eq!(marked, vec![7]);
    assert!(b.is_detected(6));
}
