//! Absorbing/emitting species.
//!
//! A [`Column`] is an amount of one species (its density) together with the
//! law giving its opacity per unit density as a function of frequency,
//! temperature and pressure.

use smallvec::SmallVec;

use super::{
    liquid_cloud::relative_absorption,
    water_vapor::{water_lines, WaterLine, MOLECULES_PER_MM},
};

/// Shape of a pressure-broadened resonant line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineShape {
    /// Lorentzian profile, symmetric about the line centre
    Lorentzian,
    /// Gross (kinetic) profile, which includes the negative-frequency
    /// resonance
    Gross,
}

impl LineShape {
    /// Normalised line profile in 1/GHz at `f` for a line centred at `f0`
    /// with half width `gamma` (all in GHz).
    pub fn profile(self, f: f64, f0: f64, gamma: f64) -> f64 {
        use std::f64::consts::PI;
        match self {
            LineShape::Lorentzian => gamma / (PI * ((f - f0).powi(2) + gamma.powi(2))),
            LineShape::Gross => {
                let num = 4. * f * f0 * gamma;
                let den = (f0.powi(2) - f.powi(2)).powi(2) + 4. * f.powi(2) * gamma.powi(2);
                num / (PI * den)
            }
        }
    }
}

/// A power-law continuum.
///
/// `tau = k (f/f_ref)^freq_exp (300/T)^temp_exp (P/p_ref)^pressure_exp` per
/// unit density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLaw {
    /// Opacity per unit density at the reference point
    pub k: f64,
    /// Reference frequency in GHz
    pub f_ref: f64,
    /// Frequency exponent
    pub freq_exp: f64,
    /// Exponent of `300/T`
    pub temp_exp: f64,
    /// Reference pressure in hPa
    pub p_ref: f64,
    /// Pressure exponent
    pub pressure_exp: f64,
}

impl PowerLaw {
    /// Water vapour continuum, per mm of precipitable water.
    pub fn water_continuum() -> Self {
        Self {
            k: 0.012,
            f_ref: 225.,
            freq_exp: 2.,
            temp_exp: 3.,
            p_ref: 1013.25,
            pressure_exp: 1.,
        }
    }

    /// A grey absorber: the same opacity per unit density everywhere.
    pub fn grey(k: f64) -> Self {
        Self {
            k,
            f_ref: 1.,
            freq_exp: 0.,
            temp_exp: 0.,
            p_ref: 1.,
            pressure_exp: 0.,
        }
    }
}

/// Opacity per unit density of a species.
#[derive(Debug, Clone, PartialEq)]
pub enum OpacityLaw {
    /// Resonant lines; density in mm of precipitable water
    Lines {
        /// profile used for every line
        shape: LineShape,
        /// line parameters
        lines: SmallVec<[WaterLine; 16]>,
    },
    /// Power-law continuum
    Continuum(PowerLaw),
    /// Liquid cloud; density is the opacity at 183.31 GHz
    Cloud,
}

impl OpacityLaw {
    /// All catalogued water lines with the given profile.
    pub fn water_lines(shape: LineShape) -> Self {
        OpacityLaw::Lines {
            shape,
            lines: SmallVec::from_slice(water_lines()),
        }
    }

    /// Opacity per unit density at `freq` (GHz), temperature `t` (K) and
    /// pressure `p` (hPa).
    pub fn opacity(&self, freq: f64, t: f64, p: f64) -> f64 {
        match self {
            OpacityLaw::Lines { shape, lines } => {
                lines
                    .iter()
                    .map(|line| {
                        let gamma = line.half_width(t, p);
                        line.strength(t) * shape.profile(freq, line.f0, gamma)
                    })
                    .sum::<f64>()
                    * MOLECULES_PER_MM
            }
            OpacityLaw::Continuum(law) => {
                law.k
                    * (freq / law.f_ref).powf(law.freq_exp)
                    * (300. / t).powf(law.temp_exp)
                    * (p / law.p_ref).powf(law.pressure_exp)
            }
            OpacityLaw::Cloud => relative_absorption(freq, t),
        }
    }
}

/// A species with its current density.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Density, in the units of the opacity law
    pub n: f64,
    law: OpacityLaw,
}

impl Column {
    /// A column of zero density.
    pub fn new(law: OpacityLaw) -> Self {
        Self { n: 0., law }
    }

    /// The opacity law of this column.
    pub fn law(&self) -> &OpacityLaw {
        &self.law
    }

    /// Opacity at `freq` (GHz) for the current density.
    pub fn tau(&self, freq: f64, t: f64, p: f64) -> f64 {
        if self.n == 0. {
            return 0.;
        }
        self.n * self.law.opacity(freq, t, p)
    }
}
