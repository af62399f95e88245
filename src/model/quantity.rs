//! Observable quantities of the atmosphere as seen by a radiometer.

use std::fmt;

use crate::{
    error::ModelError,
    radiometer::Radiometer,
    rtm::water_to_path,
};

use super::{
    column_model::{AtmoState, ColumnModel, Geometry, ModelKind},
    numdiff::{central, Order},
};

/// Finite-difference step for the water column, mm.
pub const WATER_STEP: f64 = 1e-3;
/// Finite-difference step for the cloud opacity.
pub const CLOUD_STEP: f64 = 1e-4;

/// A free parameter of a quantity model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Param {
    /// Water column, mm
    Water,
    /// Temperature, K
    Temperature,
    /// Pressure, hPa
    Pressure,
    /// Cloud opacity at 183.31 GHz
    CloudTau,
    /// Sky coupling coefficient
    Coupling,
    /// Temperature of the non-sky termination, K
    TermTemp,
    /// Zenith angle, rad
    ZenithAngle,
    /// Absolute calibration scale of a channel
    CalScale(usize),
    /// Absolute calibration zero of a channel, K
    CalZero(usize),
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Water => write!(f, "n"),
            Param::Temperature => write!(f, "T"),
            Param::Pressure => write!(f, "P"),
            Param::CloudTau => write!(f, "tau183"),
            Param::Coupling => write!(f, "coupling"),
            Param::TermTemp => write!(f, "TTerm"),
            Param::ZenithAngle => write!(f, "za"),
            Param::CalScale(ch) => write!(f, "scale{ch}"),
            Param::CalZero(ch) => write!(f, "zero{ch}"),
        }
    }
}

/// Brightness observed per channel, with derivatives, for the current
/// parameter values.
pub trait QuantityModel: fmt::Debug + Send {
    /// Number of radiometer channels.
    fn num_channels(&self) -> usize;

    /// Free parameters, in a fixed order.
    fn params(&self) -> Vec<Param>;

    /// Current value of `param`.
    fn get(&self, param: Param) -> Result<f64, ModelError>;

    /// Set `param`.
    fn set(&mut self, param: Param, value: f64) -> Result<(), ModelError>;

    /// Brightness temperature of every channel, K.
    fn eval(&mut self) -> Vec<f64>;

    /// Brightness temperature of channel `ch`, K.
    fn eval_channel(&mut self, ch: usize) -> Result<f64, ModelError> {
        let num_channels = self.num_channels();
        self.eval()
            .get(ch)
            .copied()
            .ok_or(ModelError::NoSuchChannel {
                channel: ch,
                num_channels,
            })
    }

    /// Derivative of each channel with respect to the water column, K/mm.
    fn dtdn(&mut self) -> Vec<f64>;

    /// Second derivative with respect to the water column, K/mm².
    fn dtdn2(&mut self) -> Vec<f64>;

    /// Derivative with respect to non-dispersive path, K/m.
    fn dtdl(&mut self) -> Result<Vec<f64>, ModelError> {
        let per_mm = water_to_path(1., self.get(Param::Temperature)?);
        Ok(self.dtdn().into_iter().map(|d| d / per_mm).collect())
    }

    /// Second derivative with respect to non-dispersive path, K/m².
    fn dtdl2(&mut self) -> Result<Vec<f64>, ModelError> {
        let per_mm = water_to_path(1., self.get(Param::Temperature)?);
        Ok(self
            .dtdn2()
            .into_iter()
            .map(|d| d / per_mm.powi(2))
            .collect())
    }
}

impl<M: QuantityModel + ?Sized> QuantityModel for Box<M> {
    fn num_channels(&self) -> usize {
        (**self).num_channels()
    }

    fn params(&self) -> Vec<Param> {
        (**self).params()
    }

    fn get(&self, param: Param) -> Result<f64, ModelError> {
        (**self).get(param)
    }

    fn set(&mut self, param: Param, value: f64) -> Result<(), ModelError> {
        (**self).set(param, value)
    }

    fn eval(&mut self) -> Vec<f64> {
        (**self).eval()
    }

    fn dtdn(&mut self) -> Vec<f64> {
        (**self).dtdn()
    }

    fn dtdn2(&mut self) -> Vec<f64> {
        (**self).dtdn2()
    }
}

/// Radiometer looking through a water column model.
#[derive(Debug, Clone)]
pub struct WaterModel {
    radiometer: Radiometer,
    atmosphere: ColumnModel,
    state: AtmoState,
}

impl WaterModel {
    /// A model of `kind` seen through `radiometer`.
    pub fn new(radiometer: Radiometer, kind: ModelKind, geometry: Geometry) -> Self {
        let atmosphere = ColumnModel::new(radiometer.freq(), kind, geometry);
        Self {
            radiometer,
            atmosphere,
            state: AtmoState::default(),
        }
    }

    /// The radiometer.
    pub fn radiometer(&self) -> &Radiometer {
        &self.radiometer
    }

    /// Current physical state.
    pub fn state(&self) -> AtmoState {
        self.state
    }

    /// Derivative of each channel with respect to the cloud opacity.
    pub fn dtdtau(&mut self) -> Result<Vec<f64>, ModelError> {
        if self.atmosphere.kind() != ModelKind::CloudyWater {
            return Err(ModelError::UnknownParam(Param::CloudTau));
        }
        let state = self.state;
        Ok(central(Order::First, state.tau183, CLOUD_STEP, |tau183| {
            self.channels_at(AtmoState { tau183, ..state })
        }))
    }

    fn channels_at(&mut self, state: AtmoState) -> Vec<f64> {
        let tb = self.atmosphere.brightness(&state);
        self.radiometer.channelise(&tb)
    }

    fn water_derivative(&mut self, order: Order) -> Vec<f64> {
        let state = self.state;
        central(order, state.n, WATER_STEP, |n| {
            self.channels_at(AtmoState { n, ..state })
        })
    }
}

impl QuantityModel for WaterModel {
    fn num_channels(&self) -> usize {
        self.radiometer.num_channels()
    }

    fn params(&self) -> Vec<Param> {
        let mut params = vec![Param::Water, Param::Temperature, Param::Pressure];
        if self.atmosphere.kind() == ModelKind::CloudyWater {
            params.push(Param::CloudTau);
        }
        params
    }

    fn get(&self, param: Param) -> Result<f64, ModelError> {
        match param {
            Param::Water => Ok(self.state.n),
            Param::Temperature => Ok(self.state.t),
            Param::Pressure => Ok(self.state.p),
            Param::CloudTau if self.atmosphere.kind() == ModelKind::CloudyWater => {
                Ok(self.state.tau183)
            }
            _ => Err(ModelError::UnknownParam(param)),
        }
    }

    fn set(&mut self, param: Param, value: f64) -> Result<(), ModelError> {
        match param {
            Param::Water => self.state.n = value,
            Param::Temperature => self.state.t = value,
            Param::Pressure => self.state.p = value,
            Param::CloudTau if self.atmosphere.kind() == ModelKind::CloudyWater => {
                self.state.tau183 = value
            }
            _ => return Err(ModelError::UnknownParam(param)),
        }
        Ok(())
    }

    fn eval(&mut self) -> Vec<f64> {
        self.channels_at(self.state)
    }

    fn dtdn(&mut self) -> Vec<f64> {
        self.water_derivative(Order::First)
    }

    fn dtdn2(&mut self) -> Vec<f64> {
        self.water_derivative(Order::Second)
    }
}
