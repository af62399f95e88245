//! Models wrapping another [`QuantityModel`].
//!
//! Each decorator forwards the wrapped model's parameters and adds its own.

use crate::error::ModelError;

use super::quantity::{Param, QuantityModel};

/// Imperfect sky coupling.
///
/// The radiometer sees `c T_sky + (1 - c) T_term`, so every derivative
/// scales by `c`.
#[derive(Debug, Clone)]
pub struct Coupled<M> {
    inner: M,
    coupling: f64,
    t_term: f64,
}

impl<M: QuantityModel> Coupled<M> {
    /// Couple `inner` to the sky with efficiency `coupling`, the rest
    /// terminating at `t_term` (K).
    pub fn new(inner: M, coupling: f64, t_term: f64) -> Self {
        Self {
            inner,
            coupling,
            t_term,
        }
    }

    /// The wrapped model.
    pub fn inner(&self) -> &M {
        &self.inner
    }
}

impl<M: QuantityModel> QuantityModel for Coupled<M> {
    fn num_channels(&self) -> usize {
        self.inner.num_channels()
    }

    fn params(&self) -> Vec<Param> {
        let mut params = self.inner.params();
        params.extend([Param::Coupling, Param::TermTemp]);
        params
    }

    fn get(&self, param: Param) -> Result<f64, ModelError> {
        match param {
            Param::Coupling => Ok(self.coupling),
            Param::TermTemp => Ok(self.t_term),
            _ => self.inner.get(param),
        }
    }

    fn set(&mut self, param: Param, value: f64) -> Result<(), ModelError> {
        match param {
            Param::Coupling => self.coupling = value,
            Param::TermTemp => self.t_term = value,
            _ => return self.inner.set(param, value),
        }
        Ok(())
    }

    fn eval(&mut self) -> Vec<f64> {
        let (c, t_term) = (self.coupling, self.t_term);
        self.inner
            .eval()
            .into_iter()
            .map(|t| c * t + (1. - c) * t_term)
            .collect()
    }

    fn dtdn(&mut self) -> Vec<f64> {
        let c = self.coupling;
        self.inner.dtdn().into_iter().map(|d| c * d).collect()
    }

    fn dtdn2(&mut self) -> Vec<f64> {
        let c = self.coupling;
        self.inner.dtdn2().into_iter().map(|d| c * d).collect()
    }
}

/// Per-channel absolute calibration, `scale T + zero`.
#[derive(Debug, Clone)]
pub struct AbsCalibrated<M> {
    inner: M,
    scale: Vec<f64>,
    zero: Vec<f64>,
}

impl<M: QuantityModel> AbsCalibrated<M> {
    /// Identity calibration (`scale = 1`, `zero = 0`) on every channel.
    pub fn new(inner: M) -> Self {
        let num_channels = inner.num_channels();
        Self {
            inner,
            scale: vec![1.; num_channels],
            zero: vec![0.; num_channels],
        }
    }

    fn channel(&self, ch: usize) -> Result<usize, ModelError> {
        if ch < self.scale.len() {
            Ok(ch)
        } else {
            Err(ModelError::NoSuchChannel {
                channel: ch,
                num_channels: self.scale.len(),
            })
        }
    }
}

impl<M: QuantityModel> QuantityModel for AbsCalibrated<M> {
    fn num_channels(&self) -> usize {
        self.inner.num_channels()
    }

    fn params(&self) -> Vec<Param> {
        let mut params = self.inner.params();
        let num_channels = self.scale.len();
        params.extend((0..num_channels).map(Param::CalScale));
        params.extend((0..num_channels).map(Param::CalZero));
        params
    }

    fn get(&self, param: Param) -> Result<f64, ModelError> {
        match param {
            Param::CalScale(ch) => Ok(self.scale[self.channel(ch)?]),
            Param::CalZero(ch) => Ok(self.zero[self.channel(ch)?]),
            _ => self.inner.get(param),
        }
    }

    fn set(&mut self, param: Param, value: f64) -> Result<(), ModelError> {
        match param {
            Param::CalScale(ch) => {
                let ch = self.channel(ch)?;
                self.scale[ch] = value;
            }
            Param::CalZero(ch) => {
                let ch = self.channel(ch)?;
                self.zero[ch] = value;
            }
            _ => return self.inner.set(param, value),
        }
        Ok(())
    }

    fn eval(&mut self) -> Vec<f64> {
        self.inner
            .eval()
            .into_iter()
            .zip(self.scale.iter().zip(&self.zero))
            .map(|(t, (scale, zero))| scale * t + zero)
            .collect()
    }

    fn dtdn(&mut self) -> Vec<f64> {
        self.inner
            .dtdn()
            .into_iter()
            .zip(&self.scale)
            .map(|(d, scale)| scale * d)
            .collect()
    }

    fn dtdn2(&mut self) -> Vec<f64> {
        self.inner
            .dtdn2()
            .into_iter()
            .zip(&self.scale)
            .map(|(d, scale)| scale * d)
            .collect()
    }
}

/// Observation away from the zenith.
///
/// The water parameter is the zenith column; the wrapped model sees the
/// line-of-sight column `n / cos(za)`.
#[derive(Debug, Clone)]
pub struct ZenithScaled<M> {
    inner: M,
    za: f64,
    n_zenith: f64,
}

impl<M: QuantityModel> ZenithScaled<M> {
    /// Wrap `inner`, initially looking at zenith angle `za` (rad).
    pub fn new(inner: M, za: f64) -> Result<Self, ModelError> {
        let n_line_of_sight = inner.get(Param::Water)?;
        let mut model = Self {
            inner,
            za,
            n_zenith: n_line_of_sight * za.cos(),
        };
        model.push_water()?;
        Ok(model)
    }

    fn airmass(&self) -> f64 {
        1. / self.za.cos()
    }

    fn push_water(&mut self) -> Result<(), ModelError> {
        let n = self.n_zenith * self.airmass();
        self.inner.set(Param::Water, n)
    }
}

impl<M: QuantityModel> QuantityModel for ZenithScaled<M> {
    fn num_channels(&self) -> usize {
        self.inner.num_channels()
    }

    fn params(&self) -> Vec<Param> {
        let mut params = self.inner.params();
        params.push(Param::ZenithAngle);
        params
    }

    fn get(&self, param: Param) -> Result<f64, ModelError> {
        match param {
            Param::Water => Ok(self.n_zenith),
            Param::ZenithAngle => Ok(self.za),
            _ => self.inner.get(param),
        }
    }

    fn set(&mut self, param: Param, value: f64) -> Result<(), ModelError> {
        match param {
            Param::Water => {
                self.n_zenith = value;
                self.push_water()
            }
            Param::ZenithAngle => {
                self.za = value;
                self.push_water()
            }
            _ => self.inner.set(param, value),
        }
    }

    fn eval(&mut self) -> Vec<f64> {
        self.inner.eval()
    }

    fn dtdn(&mut self) -> Vec<f64> {
        let airmass = self.airmass();
        self.inner.dtdn().into_iter().map(|d| d * airmass).collect()
    }

    fn dtdn2(&mut self) -> Vec<f64> {
        let airmass = self.airmass();
        self.inner
            .dtdn2()
            .into_iter()
            .map(|d| d * airmass.powi(2))
            .collect()
    }
}
