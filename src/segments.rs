//! Partition a time series into intervals of constant field or source.


use std::collections::{BTreeMap, BTreeSet};

use crate::error::ConfigError;

/// Inclusive `(start, end)` time interval.
pub type TimeInterval = (f64, f64);

/// One interval per maximal run of constant `ids`.
pub fn field_segments(time: &[f64], ids: &[usize]) -> Vec<TimeInterval> {
    field_segments_tied(time, ids, &[])
}

/// As [`field_segments`], except that a change between two ids of the same
/// tied set does not end the interval.
pub fn field_segments_tied(
    time: &[f64],
    ids: &[usize],
    tied: &[BTreeSet<usize>],
) -> Vec<TimeInterval> {
    let n = time.len().min(ids.len());
    let mut segments = Vec::new();
    if n == 0 {
        return segments;
    }
    let same_group = |a: usize, b: usize| {
        a == b || tied.iter().any(|set| set.contains(&a) && set.contains(&b))
    };

    let mut start = time[0];
    for i in 1..n {
        if !same_group(ids[i - 1], ids[i]) {
            segments.push((start, time[i - 1]));
            start = time[i];
        }
    }
    segments.push((start, time[n - 1]));
    segments
}

/// Intervals during which `field` is one of `selected`, looking only at
/// rows of spectral window `spw`.
///
/// A run still open at the last row is closed there.
pub fn field_times(
    time: &[f64],
    field: &[usize],
    spw: &[usize],
    spw_sel: usize,
    selected: &BTreeSet<usize>,
) -> Vec<TimeInterval> {
    let mut intervals = Vec::new();
    let mut open: Option<TimeInterval> = None;
    let rows = time
        .iter()
        .zip(field)
        .zip(spw)
        .filter(|row| *row.1 == spw_sel)
        .map(|((&t, &f), _)| (t, f));

    for (t, f) in rows {
        let in_selection = selected.contains(&f);
        match open {
            Some((start, _)) if in_selection => open = Some((start, t)),
            None if in_selection => open = Some((t, t)),
            Some(run) => {
                intervals.push(run);
                open = None;
            }
            None => {}
        }
    }
    if let Some(run) = open {
        intervals.push(run);
    }
    intervals
}

/// Resolve groups of source names to groups of source ids.
pub fn tie_sources(
    groups: &[Vec<String>],
    names: &BTreeMap<usize, String>,
) -> Result<Vec<BTreeSet<usize>>, ConfigError> {
    groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|name| {
                    names
                        .iter()
                        .find(|(_, n)| *n == name)
                        .map(|(&id, _)| id)
                        .ok_or_else(|| ConfigError::UnknownSource {
                            name: name.clone(),
                            valid: names.values().cloned().collect(),
                        })
                })
                .collect()
        })
        .collect()
}
