//! Path corrections for every antenna and time, and their statistics.


use std::{collections::BTreeSet, f64::consts::PI};

use log::debug;
use ndarray::{s, Array2, ArrayView1, ArrayView2, ArrayViewMut2, Axis};

use crate::{
    array_data::{InterpArrayData, RowInfo},
    coeffs::{Coeffs, DtdlCoeffs},
    dispersion::DispersionTable,
    error::{DataError, WvrError},
    rtm::C,
    segments::TimeInterval,
    NUM_CHANNELS,
};

/// Thermal noise of each ALMA WVR channel, K.
pub const THERMAL_NOISE: Coeffs = [0.1, 0.08, 0.08, 0.09];

/// Inverse-variance weights of channels with coefficients `c` and the
/// given noise; zero where a coefficient is zero.
pub fn thermal_weights(c: &Coeffs, noise: &Coeffs) -> Coeffs {
    let mut w = [0.; NUM_CHANNELS];
    for ((w, &c), &noise) in w.iter_mut().zip(c).zip(noise) {
        if c != 0. {
            *w = (noise / c).powi(-2);
        }
    }
    let total: f64 = w.iter().sum();
    if total > 0. {
        w.iter_mut().for_each(|w| *w /= total);
    }
    w
}

/// Multipliers turning channel brightness into path, m/K.
pub fn reweight(c: &Coeffs, noise: &Coeffs) -> Coeffs {
    let mut out = thermal_weights(c, noise);
    for (o, &c) in out.iter_mut().zip(c) {
        if c != 0. {
            *o /= c;
        }
    }
    out
}

/// [`reweight`] with [`THERMAL_NOISE`].
pub fn reweight_thermal(c: &Coeffs) -> Coeffs {
    reweight(c, &THERMAL_NOISE)
}

/// `Σ w·T` over channels with positive brightness.
fn weighted_path(w: &Coeffs, tobs: ArrayView1<'_, f64>) -> f64 {
    w.iter()
        .zip(tobs)
        .filter(|&(_, &t)| t > 0.)
        .map(|(w, t)| w * t)
        .sum()
}

/// Population standard deviation; zero for no samples.
fn rms(values: impl Iterator<Item = f64>) -> f64 {
    let (mut n, mut sum, mut sum2) = (0usize, 0., 0.);
    for v in values {
        n += 1;
        sum += v;
        sum2 += v * v;
    }
    if n == 0 {
        return 0.;
    }
    let mean = sum / n as f64;
    let var = sum2 / n as f64 - mean * mean;
    // rounding can leave a tiny negative variance; NaN passes through
    if var < 0. { 0. } else { var.sqrt() }
}

/// Path of each antenna at each time, with the row metadata it was
/// computed for.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayGains {
    time: Vec<f64>,
    el: Vec<f64>,
    state: Vec<usize>,
    field: Vec<usize>,
    source: Vec<usize>,
    path: Array2<f64>,
}

impl ArrayGains {
    /// Zero path for every row of `rows` and `num_antennas` antennas.
    pub fn new(rows: &[RowInfo], num_antennas: usize) -> Self {
        Self {
            time: rows.iter().map(|r| r.time).collect(),
            el: rows.iter().map(|r| r.el).collect(),
            state: rows.iter().map(|r| r.state).collect(),
            field: rows.iter().map(|r| r.field).collect(),
            source: rows.iter().map(|r| r.source).collect(),
            path: Array2::zeros([rows.len(), num_antennas]),
        }
    }

    /// Gains shaped like `data`.
    pub fn for_data(data: &InterpArrayData) -> Self {
        let rows: Vec<RowInfo> = (0..data.num_times()).map(|i| data.row(i)).collect();
        Self::new(&rows, data.num_antennas())
    }

    /// Number of time rows.
    pub fn num_times(&self) -> usize {
        self.time.len()
    }

    /// Number of antennas.
    pub fn num_antennas(&self) -> usize {
        self.path.dim().1
    }

    /// Row times.
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Row elevations, rad.
    pub fn el(&self) -> &[f64] {
        &self.el
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

    /// Path, m, indexed `[time, antenna]`.
    pub fn path(&self) -> ArrayView2<'_, f64> {
        self.path.view()
    }

    /// Path, mutable.
    pub fn path_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.path.view_mut()
    }

    fn check_shape(&self, data: &InterpArrayData) -> Result<(), DataError> {
        if data.num_times() != self.num_times() || data.num_antennas() != self.num_antennas() {
            return Err(DataError::Shape(format!(
                "data is {}x{} but gains are {}x{}",
                data.num_times(),
                data.num_antennas(),
                self.num_times(),
                self.num_antennas()
            )));
        }
        Ok(())
    }

    /// Path from one coefficient vector for every antenna and time,
    /// reweighted by the channel noise.
    pub fn calc_fixed(&mut self, data: &InterpArrayData, c: &Coeffs) -> Result<(), DataError> {
        self.calc_reweighted(data, &reweight_thermal(c))
    }

    /// Path from channel multipliers `w` (m/K) applied directly.
    pub fn calc_reweighted(&mut self, data: &InterpArrayData, w: &Coeffs) -> Result<(), DataError> {
        self.check_shape(data)?;
        let cube = data.data();
        for ((i, ant), path) in self.path.indexed_iter_mut() {
            *path = weighted_path(w, cube.slice(s![i, ant, ..]));
        }
        Ok(())
    }

    /// Path from a second-order expansion about brightness `t_ref`.
    ///
    /// Each channel's path is `ΔT/c - c2·ΔT²/(2c³)`; channels are combined
    /// with the thermal weights of `c`.
    pub fn calc_second_order(
        &mut self,
        data: &InterpArrayData,
        c: &Coeffs,
        c2: &Coeffs,
        t_ref: &Coeffs,
    ) -> Result<(), DataError> {
        self.check_shape(data)?;
        let w = thermal_weights(c, &THERMAL_NOISE);
        let cube = data.data();
        for ((i, ant), path) in self.path.indexed_iter_mut() {
            let tobs = cube.slice(s![i, ant, ..]);
            let mut sum = 0.;
            for ch in 0..NUM_CHANNELS {
                if tobs[ch] <= 0. || c[ch] == 0. {
                    continue;
                }
                let dt = tobs[ch] - t_ref[ch];
                sum += w[ch] * (dt / c[ch] - c2[ch] * dt * dt / (2. * c[ch].powi(3)));
            }
            *path = sum;
        }
        Ok(())
    }

    /// Path from coefficients looked up per antenna and time, each
    /// reweighted by the channel noise.
    pub fn calc_coeffs(
        &mut self,
        data: &InterpArrayData,
        coeffs: &DtdlCoeffs,
    ) -> Result<(), WvrError> {
        self.check_shape(data)?;
        let cube = data.data();
        for ((i, ant), path) in self.path.indexed_iter_mut() {
            let (c, _) = coeffs.get(ant, data.time()[i])?;
            *path = weighted_path(&reweight_thermal(&c), cube.slice(s![i, ant, ..]));
        }
        Ok(())
    }

    /// Zero the path of every row observing one of `sources`.
    pub fn blank_sources(&mut self, sources: &BTreeSet<usize>) {
        for (mut row, source) in self.path.axis_iter_mut(Axis(0)).zip(&self.source) {
            if sources.contains(source) {
                row.fill(0.);
            }
        }
    }

    /// Phase in radians at `freq` GHz, optionally corrected for dispersion.
    pub fn phase(&self, freq: f64, dispersion: Option<&DispersionTable>) -> Array2<f64> {
        let factor = 1. + dispersion.map_or(0., |d| d.lookup(freq));
        let per_m = 2. * PI * freq * 1e9 / C * factor;
        self.path.mapv(|l| l * per_m)
    }

    /// Indices of rows inside the union of `tmask`.
    ///
    /// Masks must be sorted and disjoint. Rows are visited in order and
    /// the mask index only ever advances.
    fn masked_rows(&self, tmask: &[TimeInterval]) -> Result<Vec<usize>, DataError> {
        if tmask.iter().any(|&(lo, hi)| !(lo <= hi))
            || tmask.windows(2).any(|w| w[0].1 > w[1].0)
        {
            return Err(DataError::BadTimeMask);
        }
        let mut rows = Vec::new();
        let mut m = 0;
        for (i, &t) in self.time.iter().enumerate() {
            while m < tmask.len() && t > tmask[m].1 {
                m += 1;
            }
            if m == tmask.len() {
                break;
            }
            if t >= tmask[m].0 {
                rows.push(i);
            }
        }
        Ok(rows)
    }

    /// RMS of `path·sin(el)` for each antenna over the masked rows.
    pub fn path_rms_ant(&self, tmask: &[TimeInterval]) -> Result<Vec<f64>, DataError> {
        let rows = self.masked_rows(tmask)?;
        // rows without pointing can't be projected
        let rows: Vec<usize> = rows.into_iter().filter(|&i| self.el[i].is_finite()).collect();
        Ok((0..self.num_antennas())
            .map(|ant| rms(rows.iter().map(|&i| self.path[[i, ant]] * self.el[i].sin())))
            .collect())
    }

    /// Largest RMS of the path difference over all antenna pairs.
    pub fn greatest_rms_bl(&self, tmask: &[TimeInterval]) -> Result<f64, DataError> {
        let rows = self.masked_rows(tmask)?;
        let mut greatest = 0f64;
        for a in 0..self.num_antennas() {
            for b in a + 1..self.num_antennas() {
                let bl = rms(rows.iter().map(|&i| self.path[[i, a]] - self.path[[i, b]]));
                greatest = greatest.max(bl);
            }
        }
        Ok(greatest)
    }

    /// RMS per antenna of the difference between these gains and `other`.
    pub fn path_disc_ant(
        &self,
        other: &ArrayGains,
        tmask: &[TimeInterval],
    ) -> Result<Vec<f64>, DataError> {
        if other.path.dim() != self.path.dim() {
            return Err(DataError::Shape(format!(
                "comparing gains of shape {:?} with {:?}",
                self.path.dim(),
                other.path.dim()
            )));
        }
        let rows = self.masked_rows(tmask)?;
        debug!("path discrepancy over {} rows", rows.len());
        Ok((0..self.num_antennas())
            .map(|ant| rms(rows.iter().map(|&i| self.path[[i, ant]] - other.path[[i, ant]])))
            .collect())
    }
}
