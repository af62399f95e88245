use approx::assert_abs_diff_eq;

use super::*;

fn rows(states: &[usize], sources: &[usize]) -> Vec<RowInfo> {
    states
        .iter()
        .zip(sources)
        .enumerate()
        .map(|(i, (&state, &source))| RowInfo {
            time: i as f64,
            el: 0.8,
            az: 0.,
            state,
            field: source,
            source,
        })
        .collect()
}

/// Channel values of antenna `ant` at row `i` are `100 + 10·ant + i + ch/10`.
fn ramp(num_times: usize, num_antennas: usize) -> InterpArrayData {
    let rows = rows(&vec![0; num_times], &vec![0; num_times]);
    let mut store = InterpArrayData::new(&rows, num_antennas);
    for ((i, ant, ch), v) in store.data_mut().indexed_iter_mut() {
        *v = 100. + 10. * ant as f64 + i as f64 + ch as f64 / 10.;
    }
    store
}

#[test]
fn cube_shape_is_checked() {
    let r = rows(&[0, 0], &[0, 0]);
    assert!(InterpArrayData::from_cube(&r, Array3::zeros([2, 3, 4])).is_ok());
    assert!(matches!(
        InterpArrayData::from_cube(&r, Array3::zeros([3, 3, 4])),
        Err(DataError::Shape(_))
    ));
    assert!(matches!(
        InterpArrayData::from_cube(&r, Array3::zeros([2, 3, 2])),
        Err(DataError::Shape(_))
    ));
}

#[test]
fn uniform_interpolation_is_plain_mean() {
    let mut store = ramp(3, 4);
    store.interp_bad_ant(0, &[1, 2, 3].into()).unwrap();
    for i in 0..3 {
        let tobs = store.tobs(i, 0);
        for (ch, t) in tobs.iter().enumerate() {
            // mean of antennas 1..=3
            assert_abs_diff_eq!(*t, 120. + i as f64 + ch as f64 / 10., epsilon = 1e-12);
        }
    }
    // neighbours untouched
    assert_abs_diff_eq!(store.tobs(2, 3)[1], 132.1, epsilon = 1e-12);
}

#[test]
fn weighted_interpolation() {
    let mut store = ramp(2, 3);
    store
        .interp_bad_ant_weighted(2, &vec![(0.25, 0), (0.75, 1)])
        .unwrap();
    assert_abs_diff_eq!(store.tobs(1, 2)[0], 101. + 7.5, epsilon = 1e-12);

    assert!(matches!(
        store.interp_bad_ant_weighted(2, &vec![]),
        Err(DataError::TooFewNeighbours { .. })
    ));
    assert_eq!(
        store.interp_bad_ant(5, &[0].into()),
        Err(DataError::NoSuchAntenna {
            antenna: 5,
            num_antennas: 3
        })
    );
}

#[test]
fn unit_smoothing_is_identity() {
    let mut store = ramp(6, 2);
    let before = store.clone();
    store.smooth(1);
    assert_eq!(store, before);
    assert_eq!(store.num_times(), 6);
}

#[test]
fn odd_smoothing_averages_interior() {
    let r = rows(&[0; 5], &[0; 5]);
    let mut store = InterpArrayData::new(&r, 1);
    for (i, v) in [1., 2., 6., 4., 5.].iter().enumerate() {
        store.set_tobs(i, 0, &[*v; 4]);
    }
    store.smooth(3);
    let smoothed: Vec<f64> = (0..5).map(|i| store.tobs(i, 0)[0]).collect();
    assert_abs_diff_eq!(smoothed[0], 1.);
    assert_abs_diff_eq!(smoothed[1], 3., epsilon = 1e-12);
    assert_abs_diff_eq!(smoothed[2], 4., epsilon = 1e-12);
    assert_abs_diff_eq!(smoothed[3], 5., epsilon = 1e-12);
    assert_abs_diff_eq!(smoothed[4], 5.);
}

#[test]
fn even_smoothing_half_weights_edges() {
    let r = rows(&[0; 3], &[0; 3]);
    let mut store = InterpArrayData::new(&r, 1);
    for (i, v) in [0., 4., 8.].iter().enumerate() {
        store.set_tobs(i, 0, &[*v; 4]);
    }
    store.smooth(2);
    // (0.5·0 + 4 + 0.5·8) / 2
    assert_abs_diff_eq!(store.tobs(1, 0)[2], 4., epsilon = 1e-12);

    let r = rows(&[0; 3], &[0; 3]);
    let mut store = InterpArrayData::new(&r, 1);
    for (i, v) in [0., 0., 8.].iter().enumerate() {
        store.set_tobs(i, 0, &[*v; 4]);
    }
    store.smooth(2);
    assert_abs_diff_eq!(store.tobs(1, 0)[0], 2., epsilon = 1e-12);
}

#[test]
fn smoothing_restarts_at_state_change() {
    let r = rows(&[0, 0, 0, 1, 1, 1], &[0; 6]);
    let mut store = InterpArrayData::new(&r, 1);
    for (i, v) in [1., 2., 3., 100., 200., 300.].iter().enumerate() {
        store.set_tobs(i, 0, &[*v; 4]);
    }
    store.smooth(3);
    let smoothed: Vec<f64> = (0..6).map(|i| store.tobs(i, 0)[0]).collect();
    assert_eq!(smoothed[0], 1.);
    assert_abs_diff_eq!(smoothed[1], 2., epsilon = 1e-12);
    // row 2 is a run end and keeps its raw value
    assert_eq!(smoothed[2], 3.);
    assert_eq!(smoothed[3], 100.);
    assert_abs_diff_eq!(smoothed[4], 200., epsilon = 1e-12);
    assert_eq!(smoothed[5], 300.);
}

#[test]
fn short_runs_are_not_smoothed() {
    let r = rows(&[0, 0, 1, 1], &[0; 4]);
    let mut store = InterpArrayData::new(&r, 1);
    for i in 0..4 {
        store.set_tobs(i, 0, &[i as f64; 4]);
    }
    let before = store.clone();
    store.smooth(3);
    assert_eq!(store, before);
}

#[test]
fn state_filter_keeps_order() {
    let r = rows(&[1, 2, 1, 3, 1], &[0; 5]);
    let mut store = InterpArrayData::new(&r, 2);
    for i in 0..5 {
        store.set_tobs(i, 1, &[i as f64; 4]);
    }
    let filtered = store.filter_state(&[1].into());
    assert_eq!(filtered.num_times(), 3);
    assert_eq!(filtered.num_antennas(), 2);
    assert_eq!(filtered.time(), &[0., 2., 4.]);
    assert_eq!(filtered.tobs(1, 1), [2.; 4]);
    assert_eq!(filtered.tobs(2, 1), [4.; 4]);
    // original untouched
    assert_eq!(store.num_times(), 5);
}

#[test]
fn sentinel_and_offset() {
    let mut store = ramp(3, 2);
    store.set_antenna_value(1, 2.7).unwrap();
    assert_eq!(store.tobs(2, 1), [2.7; 4]);
    assert_ne!(store.tobs(2, 0), [2.7; 4]);

    store.offset_time(10.);
    assert_eq!(store.time(), &[10., 11., 12.]);
}
