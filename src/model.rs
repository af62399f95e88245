//! Forward models of WVR observations.
//!
//! [`ColumnModel`] computes sky brightness spectra; [`WaterModel`] channelises
//! them through a [`Radiometer`](crate::radiometer::Radiometer) and exposes
//! the result as a [`QuantityModel`] with named free parameters and
//! derivatives. The decorators in [`decorators`] adjust a model for coupling,
//! absolute calibration and zenith angle.

mod column_model;
pub mod decorators;
pub mod numdiff;
mod quantity;

#[cfg(test)]
mod tests;

pub use column_model::{AtmoState, ColumnModel, Geometry, ModelKind};
pub use decorators::{AbsCalibrated, Coupled, ZenithScaled};
pub use quantity::{Param, QuantityModel, WaterModel, CLOUD_STEP, WATER_STEP};
