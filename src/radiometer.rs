//! Channelisation of sky spectra.
//!
//! A [`Radiometer`] maps a spectrum sampled on its frequency grid to one
//! number per channel using a fixed weight vector per channel.


use log::debug;

use crate::error::ModelError;

/// Centre of the ALMA WVR band (the 183.31 GHz water line), GHz.
pub const ALMA_WVR_CENTRE: f64 = 183.31;
/// ALMA WVR channel IF offsets from the line centre, GHz.
pub const ALMA_WVR_IF: [f64; 4] = [0.88, 1.94, 3.175, 5.2];
/// ALMA WVR channel bandwidths, GHz.
pub const ALMA_WVR_BW: [f64; 4] = [0.16, 0.75, 1.25, 2.5];

/// Five-point Gauss-Legendre nodes and weights on [-1, 1].
#[allow(clippy::excessive_precision)]
const GAUSS_LEGENDRE_5: [(f64, f64); 5] = [
    (-0.906_179_845_938_664_0, 0.236_926_885_056_189_1),
    (-0.538_469_310_105_683_1, 0.478_628_670_499_366_5),
    (0., 0.568_888_888_888_888_9),
    (0.538_469_310_105_683_1, 0.478_628_670_499_366_5),
    (0.906_179_845_938_664_0, 0.236_926_885_056_189_1),
];

/// A multi-channel radiometer.
#[derive(Debug, Clone, PartialEq)]
pub struct Radiometer {
    /// Frequency grid in GHz
    freq: Vec<f64>,
    /// One weight per grid point, per channel
    weights: Vec<Vec<f64>>,
}

impl Radiometer {
    /// A radiometer with the given grid and per-channel weights.
    pub fn new(freq: Vec<f64>, weights: Vec<Vec<f64>>) -> Result<Self, ModelError> {
        if freq.is_empty() {
            return Err(ModelError::EmptyGrid);
        }
        if let Some((channel, w)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| w.len() != freq.len())
        {
            return Err(ModelError::WeightLength {
                channel,
                got: w.len(),
                expected: freq.len(),
            });
        }
        Ok(Self { freq, weights })
    }

    /// A single channel sampling the spectrum at exactly `freq`.
    pub fn monochromatic(freq: f64) -> Self {
        Self {
            freq: vec![freq],
            weights: vec![vec![1.]],
        }
    }

    /// Frequency grid in GHz.
    pub fn freq(&self) -> &[f64] {
        &self.freq
    }

    /// Weights of channel `ch`.
    pub fn weights(&self, ch: usize) -> Option<&[f64]> {
        self.weights.get(ch).map(Vec::as_slice)
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.weights.len()
    }

    /// Channel `ch` of `spectrum`: `sum_k weight[ch][k] * spectrum[k]`.
    pub fn eval(&self, spectrum: &[f64], ch: usize) -> Result<f64, ModelError> {
        if spectrum.len() != self.freq.len() {
            return Err(ModelError::SpectrumLength {
                got: spectrum.len(),
                expected: self.freq.len(),
            });
        }
        let weights = self.weights.get(ch).ok_or(ModelError::NoSuchChannel {
            channel: ch,
            num_channels: self.num_channels(),
        })?;
        Ok(weights.iter().zip(spectrum).map(|(w, s)| w * s).sum())
    }

    /// Every channel of `spectrum`.
    pub fn eval_all(&self, spectrum: &[f64]) -> Result<Vec<f64>, ModelError> {
        (0..self.num_channels())
            .map(|ch| self.eval(spectrum, ch))
            .collect()
    }

    /// Every channel of a spectrum already known to be on this grid.
    pub(crate) fn channelise(&self, spectrum: &[f64]) -> Vec<f64> {
        debug_assert_eq!(spectrum.len(), self.freq.len());
        self.weights
            .iter()
            .map(|w| w.iter().zip(spectrum).map(|(w, s)| w * s).sum())
            .collect()
    }

    /// The only channel of a single-channel radiometer.
    pub fn eval_single(&self, spectrum: &[f64]) -> Result<f64, ModelError> {
        if self.num_channels() != 1 {
            return Err(ModelError::NotSingleChannel(self.num_channels()));
        }
        self.eval(spectrum, 0)
    }
}

/// Double-sideband channel sampled directly at `f0 ± f_if`.
pub fn dsb_radiometer(f0: f64, f_if: f64) -> Radiometer {
    Radiometer {
        freq: vec![f0 - f_if, f0 + f_if],
        weights: vec![vec![0.5, 0.5]],
    }
}

/// Double-sideband channel of bandwidth `bw` centred at `f0 ± f_if`,
/// integrated with five-point Gauss-Legendre quadrature in each sideband.
pub fn dsb_bw_radiometer(f0: f64, f_if: f64, bw: f64) -> Radiometer {
    let (freq, weights): (Vec<f64>, Vec<f64>) = [f0 - f_if, f0 + f_if]
        .iter()
        .flat_map(|&centre| {
            GAUSS_LEGENDRE_5
                .iter()
                .map(move |&(x, w)| (centre + 0.5 * bw * x, 0.25 * w))
        })
        .unzip();
    Radiometer {
        freq,
        weights: vec![weights],
    }
}

/// Merge radiometers into one device.
///
/// The merged grid is every sub-radiometer's grid sorted by frequency. Each
/// grid point still belongs to one sub-radiometer only; the other channels
/// have zero weight there. On exact frequency ties the earlier radiometer
/// comes first. Channels are numbered in merge order.
pub fn merge(radiometers: &[Radiometer]) -> Result<Radiometer, ModelError> {
    if radiometers.is_empty() {
        return Err(ModelError::EmptyGrid);
    }
    Ok(merge_nonempty(radiometers))
}

fn merge_nonempty(radiometers: &[Radiometer]) -> Radiometer {
    // (frequency, radiometer, index in that radiometer's grid)
    let mut slots: Vec<(f64, usize, usize)> = radiometers
        .iter()
        .enumerate()
        .flat_map(|(r, radiometer)| {
            radiometer
                .freq
                .iter()
                .enumerate()
                .map(move |(k, &f)| (f, r, k))
        })
        .collect();
    // stable, so ties keep merge order
    slots.sort_by(|a, b| a.0.total_cmp(&b.0));

    let freq: Vec<f64> = slots.iter().map(|&(f, _, _)| f).collect();
    let owners: &[(f64, usize, usize)] = &slots;
    let weights = radiometers
        .iter()
        .enumerate()
        .flat_map(move |(r, radiometer)| {
            radiometer.weights.iter().map(move |w| {
                owners
                    .iter()
                    .map(|&(_, owner, k)| if owner == r { w[k] } else { 0. })
                    .collect::<Vec<f64>>()
            })
        })
        .collect();

    debug!(
        "merged {} radiometers into a {}-point grid",
        radiometers.len(),
        freq.len()
    );
    Radiometer { freq, weights }
}

/// The four-channel ALMA WVR with finite channel bandwidths.
pub fn alma_wvr() -> Radiometer {
    let channels: Vec<Radiometer> = ALMA_WVR_IF
        .iter()
        .zip(&ALMA_WVR_BW)
        .map(|(&f_if, &bw)| dsb_bw_radiometer(ALMA_WVR_CENTRE, f_if, bw))
        .collect();
    merge_nonempty(&channels)
}

/// The four-channel ALMA WVR sampled at the channel centres only.
pub fn alma_wvr_direct() -> Radiometer {
    let channels: Vec<Radiometer> = ALMA_WVR_IF
        .iter()
        .map(|&f_if| dsb_radiometer(ALMA_WVR_CENTRE, f_if))
        .collect();
    merge_nonempty(&channels)
}
