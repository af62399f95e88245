use approx::assert_abs_diff_eq;

use super::*;

fn line_array() -> Vec<[f64; 3]> {
    // antennas on the x axis at 0, 10, 30, 60, 100 m
    [0., 10., 30., 60., 100.].map(|x| [x, 0., 0.]).to_vec()
}

#[test]
fn distances_are_sorted_and_skip_flagged() {
    let pos = line_array();
    let flagged: AntSet = [1].into();
    let dist = ants_dist(&pos, 2, &flagged).unwrap();
    assert_eq!(dist, vec![(30., 0), (30., 3), (70., 4)]);

    let dist = ants_dist(&pos, 0, &AntSet::new()).unwrap();
    assert_eq!(dist.iter().map(|&(_, j)| j).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
}

#[test]
fn three_dimensional_distance() {
    let pos = vec![[0., 0., 0.], [3., 4., 12.]];
    assert_abs_diff_eq!(ants_dist(&pos, 0, &AntSet::new()).unwrap()[0].0, 13.);
}

#[test]
fn nearest_takes_first_n() {
    let pos = line_array();
    let near = nearest_ants(&pos, 0, &AntSet::new(), 2).unwrap();
    assert_eq!(near, AntSet::from([1, 2]));
    // asking for more than exist gives them all
    assert_eq!(nearest_ants(&pos, 0, &AntSet::new(), 10).unwrap().len(), 4);
}

#[test]
fn weights_divide_by_used_distances() {
    let pos = line_array();
    let weighted = weighted_ants(&pos, 0, &AntSet::new(), 3).unwrap();
    // distances 10, 30, 60 -> sum 100
    assert_eq!(weighted.len(), 3);
    assert_abs_diff_eq!(weighted[0].0, 0.1);
    assert_abs_diff_eq!(weighted[1].0, 0.3);
    assert_abs_diff_eq!(weighted[2].0, 0.6);
    let total: f64 = weighted.iter().map(|w| w.0).sum();
    assert_abs_diff_eq!(total, 1., epsilon = 1e-12);
}

#[test]
fn colocated_neighbours_share_weight() {
    let pos = vec![[5., 5., 0.], [5., 5., 0.], [5., 5., 0.]];
    let weighted = weighted_ants(&pos, 0, &AntSet::new(), 2).unwrap();
    assert_eq!(weighted, vec![(0.5, 1), (0.5, 2)]);
}

#[test]
fn distance_cap_and_minimum() {
    let pos = line_array();
    let within = ants_dist_within(&pos, 0, &AntSet::new(), 35.).unwrap();
    assert_eq!(within.len(), 2);

    let weighted = weighted_ants_within(&pos, 0, &AntSet::new(), 3, 35., 2).unwrap();
    assert_eq!(weighted.len(), 2);
    assert_abs_diff_eq!(weighted[0].0, 0.25);
    assert_abs_diff_eq!(weighted[1].0, 0.75);

    assert_eq!(
        weighted_ants_within(&pos, 0, &AntSet::new(), 3, 35., 3),
        Err(DataError::TooFewNeighbours {
            antenna: 0,
            found: 2,
            required: 3
        })
    );
}

#[test]
fn unknown_antenna() {
    assert_eq!(
        ants_dist(&line_array(), 7, &AntSet::new()),
        Err(DataError::NoSuchAntenna {
            antenna: 7,
            num_antennas: 5
        })
    );
}
