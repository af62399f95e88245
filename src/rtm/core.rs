//! Core radiative transfer functions.

use std::cell::OnceCell;

use super::{slice::Slice, Column};

/// Planck constant in J s
pub const H: f64 = 6.626_070_15e-34;
/// Boltzmann constant in J/K
pub const K_B: f64 = 1.380_649e-23;
/// Speed of light in m/s
pub const C: f64 = 299_792_458.;
/// Cosmic microwave background temperature in K
pub const T_CMB: f64 = 2.725;

/// Planck spectral radiance.
///
/// For a frequency `freq` in GHz and temperature `t` in K, return the
/// radiance in W m⁻² Hz⁻¹ sr⁻¹.
pub fn planck(freq: f64, t: f64) -> f64 {
    let f = freq * 1e9;
    2. * H * f.powi(3) / C.powi(2) / f64::exp_m1(H * f / (K_B * t))
}

/// Rayleigh-Jeans brightness temperature (K) of radiance `intensity` at
/// `freq` (GHz).
pub fn rj_brightness(freq: f64, intensity: f64) -> f64 {
    let f = freq * 1e9;
    intensity / f.powi(2) * C.powi(2) / (2. * K_B)
}

/// Emergent intensity on a frequency grid.
///
/// The brightness temperature is derived on first use.
#[derive(Debug, Clone)]
pub struct RtResult {
    freq: Vec<f64>,
    intensity: Vec<f64>,
    tb: OnceCell<Vec<f64>>,
}

impl RtResult {
    /// Start from a zero-intensity background.
    pub fn dark(freq: &[f64]) -> Self {
        Self::from_intensity(freq.to_vec(), vec![0.; freq.len()])
    }

    /// Wrap a precomputed intensity spectrum.
    pub fn from_intensity(freq: Vec<f64>, intensity: Vec<f64>) -> Self {
        debug_assert_eq!(freq.len(), intensity.len());
        Self {
            freq,
            intensity,
            tb: OnceCell::new(),
        }
    }

    /// Propagate this result, as background, through `slice`.
    ///
    /// `I = tran I_bg + B(T) (1 - tran)` at every frequency.
    pub fn through(self, slice: &Slice, columns: &[Column]) -> Self {
        let tran = slice.transmission(columns, &self.freq);
        let intensity = self
            .freq
            .iter()
            .zip(&self.intensity)
            .zip(&tran)
            .map(|((&f, &bg), &tran)| tran * bg + planck(f, slice.t) * (1. - tran))
            .collect();
        Self::from_intensity(self.freq, intensity)
    }

    /// Frequency grid in GHz.
    pub fn freq(&self) -> &[f64] {
        &self.freq
    }

    /// Intensity per frequency.
    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    /// Rayleigh-Jeans brightness temperature per frequency.
    pub fn brightness(&self) -> &[f64] {
        self.tb.get_or_init(|| {
            self.freq
                .iter()
                .zip(&self.intensity)
                .map(|(&f, &i)| rj_brightness(f, i))
                .collect()
        })
    }
}
