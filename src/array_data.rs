//! Time series of WVR brightness for the whole array.
//!
//! The store keeps per-row metadata alongside a dense
//! `[num_times][num_antennas][NUM_CHANNELS]` cube so that every cell is
//! addressed by index rather than allocated separately.

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;

use log::debug;
use ndarray::{s, Array3, ArrayView1, ArrayView3, ArrayViewMut3, Axis};

use crate::{
    antennas::{AntSet, AntSetWeight},
    error::DataError,
    NUM_CHANNELS,
};

/// Metadata of one time row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowInfo {
    /// Time, s
    pub time: f64,
    /// Elevation, rad
    pub el: f64,
    /// Azimuth, rad
    pub az: f64,
    /// Observing state id
    pub state: usize,
    /// Field id
    pub field: usize,
    /// Source id
    pub source: usize,
}

/// WVR brightness per time, antenna and channel.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpArrayData {
    time: Vec<f64>,
    el: Vec<f64>,
    az: Vec<f64>,
    state: Vec<usize>,
    field: Vec<usize>,
    source: Vec<usize>,
    data: Array3<f64>,
}

impl InterpArrayData {
    /// A zero-filled store with one row per entry of `rows`.
    pub fn new(rows: &[RowInfo], num_antennas: usize) -> Self {
        Self {
            time: rows.iter().map(|r| r.time).collect(),
            el: rows.iter().map(|r| r.el).collect(),
            az: rows.iter().map(|r| r.az).collect(),
            state: rows.iter().map(|r| r.state).collect(),
            field: rows.iter().map(|r| r.field).collect(),
            source: rows.iter().map(|r| r.source).collect(),
            data: Array3::zeros([rows.len(), num_antennas, NUM_CHANNELS]),
        }
    }

    /// A store from rows and an existing cube.
    pub fn from_cube(rows: &[RowInfo], data: Array3<f64>) -> Result<Self, DataError> {
        let shape = data.dim();
        if shape.0 != rows.len() || shape.2 != NUM_CHANNELS {
            return Err(DataError::Shape(format!(
                "{} rows but cube is {:?}, expected [{}, _, {}]",
                rows.len(),
                shape,
                rows.len(),
                NUM_CHANNELS
            )));
        }
        let mut store = Self::new(rows, shape.1);
        store.data = data;
        Ok(store)
    }

    /// Number of time rows.
    pub fn num_times(&self) -> usize {
        self.time.len()
    }

    /// Number of antennas.
    pub fn num_antennas(&self) -> usize {
        self.data.dim().1
    }

    /// Row times.
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Row elevations, rad.
    pub fn el(&self) -> &[f64] {
        &self.el
    }

    /// Row azimuths, rad.
    pub fn az(&self) -> &[f64] {
        &self.az
    }

    /// Row state ids.
    pub fn state(&self) -> &[usize] {
        &self.state
    }

    /// Row field ids.
    pub fn field(&self) -> &[usize] {
        &self.field
    }

    /// Row source ids.
    pub fn source(&self) -> &[usize] {
        &self.source
    }

    /// Metadata of row `i`.
    pub fn row(&self, i: usize) -> RowInfo {
        RowInfo {
            time: self.time[i],
            el: self.el[i],
            az: self.az[i],
            state: self.state[i],
            field: self.field[i],
            source: self.source[i],
        }
    }

    /// The brightness cube.
    pub fn data(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    /// The brightness cube, mutable.
    pub fn data_mut(&mut self) -> ArrayViewMut3<'_, f64> {
        self.data.view_mut()
    }

    /// The four channels of antenna `ant` at row `i`.
    pub fn tobs(&self, i: usize, ant: usize) -> [f64; NUM_CHANNELS] {
        let mut out = [0.; NUM_CHANNELS];
        for (o, v) in out.iter_mut().zip(self.data.slice(s![i, ant, ..])) {
            *o = *v;
        }
        out
    }

    /// Set the channels of antenna `ant` at row `i`.
    pub fn set_tobs(&mut self, i: usize, ant: usize, tobs: &[f64; NUM_CHANNELS]) {
        self.data
            .slice_mut(s![i, ant, ..])
            .assign(&ArrayView1::from(tobs.as_slice()));
    }

    fn check_antenna(&self, ant: usize) -> Result<(), DataError> {
        if ant < self.num_antennas() {
            Ok(())
        } else {
            Err(DataError::NoSuchAntenna {
                antenna: ant,
                num_antennas: self.num_antennas(),
            })
        }
    }

    /// Overwrite every row and channel of antenna `ant` with `value`.
    pub fn set_antenna_value(&mut self, ant: usize, value: f64) -> Result<(), DataError> {
        self.check_antenna(ant)?;
        self.data.slice_mut(s![.., ant, ..]).fill(value);
        Ok(())
    }

    /// Replace antenna `ant` by the plain mean of `neighbours`.
    pub fn interp_bad_ant(&mut self, ant: usize, neighbours: &AntSet) -> Result<(), DataError> {
        let weighted: AntSetWeight = neighbours
            .iter()
            .map(|&j| (1. / neighbours.len() as f64, j))
            .collect();
        self.interp_bad_ant_weighted(ant, &weighted)
    }

    /// Replace antenna `ant` by the weighted sum of `neighbours`.
    ///
    /// The weights are used as given; they are expected to sum to one.
    pub fn interp_bad_ant_weighted(
        &mut self,
        ant: usize,
        neighbours: &AntSetWeight,
    ) -> Result<(), DataError> {
        self.check_antenna(ant)?;
        if neighbours.is_empty() {
            return Err(DataError::TooFewNeighbours {
                antenna: ant,
                found: 0,
                required: 1,
            });
        }
        for &(_, j) in neighbours {
            self.check_antenna(j)?;
        }
        debug!("interpolating antenna {ant} from {neighbours:?}");

        for mut row in self.data.axis_iter_mut(Axis(0)) {
            let mut sum = [0.; NUM_CHANNELS];
            for &(w, j) in neighbours {
                for (s, v) in sum.iter_mut().zip(row.row(j)) {
                    *s += w * v;
                }
            }
            row.row_mut(ant)
                .assign(&ArrayView1::from(sum.as_slice()));
        }
        Ok(())
    }

    /// Centred moving average of width `nsample` along time.
    ///
    /// The average restarts whenever the source or state changes, leaving
    /// `nsample / 2` raw samples at each end of every run. An even width
    /// gives the two outermost taps half weight. Widths of 0 and 1 leave
    /// the data alone.
    pub fn smooth(&mut self, nsample: usize) {
        if nsample <= 1 {
            return;
        }
        let half = nsample / 2;
        let weights: Vec<f64> = (0..=2 * half)
            .map(|k| {
                if nsample % 2 == 0 && (k == 0 || k == 2 * half) {
                    0.5
                } else {
                    1.
                }
            })
            .collect();

        let raw = self.data.clone();
        for (start, end) in self.runs() {
            if end - start < 2 * half {
                continue;
            }
            for i in start + half..=end - half {
                let window = raw.slice(s![i - half..=i + half, .., ..]);
                let mut out = self.data.index_axis_mut(Axis(0), i);
                out.fill(0.);
                for (w, tap) in weights.iter().zip(window.axis_iter(Axis(0))) {
                    out.scaled_add(*w / nsample as f64, &tap);
                }
            }
        }
    }

    /// Inclusive index ranges of constant source and state.
    fn runs(&self) -> Vec<(usize, usize)> {
        let mut runs = Vec::new();
        if self.num_times() == 0 {
            return runs;
        }
        let mut start = 0;
        for i in 1..self.num_times() {
            if self.source[i] != self.source[i - 1] || self.state[i] != self.state[i - 1] {
                runs.push((start, i - 1));
                start = i;
            }
        }
        runs.push((start, self.num_times() - 1));
        runs
    }

    /// A new store with only the rows whose state is in `allowed`.
    pub fn filter_state(&self, allowed: &BTreeSet<usize>) -> Self {
        let keep: Vec<usize> = (0..self.num_times())
            .filter(|&i| allowed.contains(&self.state[i]))
            .collect();
        let rows: Vec<RowInfo> = keep.iter().map(|&i| self.row(i)).collect();
        let mut out = Self::new(&rows, self.num_antennas());
        for (new, &old) in keep.iter().enumerate() {
            out.data
                .index_axis_mut(Axis(0), new)
                .assign(&self.data.index_axis(Axis(0), old));
        }
        out
    }

    /// Shift every row time by `dt`.
    pub fn offset_time(&mut self, dt: f64) {
        self.time.iter_mut().for_each(|t| *t += dt);
    }
}
