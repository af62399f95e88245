//! Choosing which rows to retrieve.

use std::collections::BTreeSet;

use log::debug;

use crate::{array_data::InterpArrayData, error::DataError, segments::TimeInterval};

use super::AbsInput;

/// Rows whose state is in `states`; every row if `states` is empty.
fn good_rows(data: &InterpArrayData, states: &BTreeSet<usize>) -> Vec<usize> {
    (0..data.num_times())
        .filter(|&i| states.is_empty() || states.contains(&data.state()[i]))
        .collect()
}

fn checked_good_rows(
    data: &InterpArrayData,
    refant: usize,
    states: &BTreeSet<usize>,
) -> Result<Vec<usize>, DataError> {
    if refant >= data.num_antennas() {
        return Err(DataError::NoSuchAntenna {
            antenna: refant,
            num_antennas: data.num_antennas(),
        });
    }
    let rows = good_rows(data, states);
    if rows.is_empty() {
        return Err(DataError::NoGoodStates);
    }
    Ok(rows)
}

fn input_at(data: &InterpArrayData, refant: usize, i: usize) -> AbsInput {
    let row = data.row(i);
    AbsInput {
        antno: refant,
        tobs: data.tobs(i, refant),
        el: row.el,
        time: row.time,
        state: row.state,
        source: row.source,
    }
}

/// One input at the middle good row.
pub fn single_midpoint(
    data: &InterpArrayData,
    refant: usize,
    states: &BTreeSet<usize>,
) -> Result<Vec<AbsInput>, DataError> {
    let rows = checked_good_rows(data, refant, states)?;
    Ok(vec![input_at(data, refant, rows[rows.len() / 2])])
}

/// `n` inputs spread evenly over the good rows, each at the centre of its
/// share.
pub fn multiple_uniform(
    data: &InterpArrayData,
    refant: usize,
    states: &BTreeSet<usize>,
    n: usize,
) -> Result<Vec<AbsInput>, DataError> {
    let rows = checked_good_rows(data, refant, states)?;
    let n = n.clamp(1, rows.len());
    Ok((0..n)
        .map(|i| rows[((2 * i + 1) * rows.len()) / (2 * n)])
        .map(|row| input_at(data, refant, row))
        .collect())
}

/// One input per segment, at the good row nearest the segment's middle.
///
/// Segments without any good row are skipped.
pub fn field_midpoints(
    data: &InterpArrayData,
    refant: usize,
    states: &BTreeSet<usize>,
    segments: &[TimeInterval],
) -> Result<Vec<AbsInput>, DataError> {
    let rows = checked_good_rows(data, refant, states)?;
    let time = data.time();
    let mut inputs = Vec::with_capacity(segments.len());
    for &(start, end) in segments {
        let mid = 0.5 * (start + end);
        let nearest = rows
            .iter()
            .copied()
            .filter(|&i| time[i] >= start && time[i] <= end)
            .min_by(|&a, &b| (time[a] - mid).abs().total_cmp(&(time[b] - mid).abs()));
        match nearest {
            Some(i) => inputs.push(input_at(data, refant, i)),
            None => debug!("segment {start}-{end} has no good rows, skipped"),
        }
    }
    if inputs.is_empty() {
        return Err(DataError::NoGoodStates);
    }
    Ok(inputs)
}
