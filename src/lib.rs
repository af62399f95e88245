//! Water vapour radiometer phase correction.
//!
//! A four-channel radiometer next to each antenna measures the sky
//! brightness around the 183 GHz water line. A forward model of that
//! brightness, inverted with a Bayesian sampler, gives the derivative of each
//! channel with respect to the excess path (dT/dL). Those coefficients turn
//! the brightness time series of every antenna into a path correction.
//!
//! The pieces, leaf to root:
//!
//! - [`rtm`]: opacity laws, slabs and radiative transfer
//! - [`radiometer`]: channel weights over a frequency grid
//! - [`model`]: brightness per channel as a function of water column, with
//!   derivatives
//! - [`retrieval`]: likelihood, sampler interface and per-row retrieval
//! - [`coeffs`]: retrieved coefficients as a function of antenna and time
//! - [`array_data`], [`gains`], [`segments`], [`antennas`]: the array time
//!   series and the path computed from it
//! - [`pipeline`]: all of the above for one observation
//!
//! With the `python` feature the crate also builds a Python extension.

pub mod antennas;
pub mod array_data;
pub mod coeffs;
pub mod config;
pub mod dispersion;
pub mod error;
pub mod gains;
pub mod model;
pub mod pipeline;
pub mod radiometer;
pub mod retrieval;
pub mod rtm;
pub mod segments;

#[cfg(feature = "python")]
mod python;

/// Channels of the ALMA WVR.
pub const NUM_CHANNELS: usize = 4;

pub use crate::{
    array_data::{InterpArrayData, RowInfo},
    coeffs::DtdlCoeffs,
    config::WvrConfig,
    error::WvrError,
    gains::ArrayGains,
    pipeline::{run, MeasurementSource, PipelineOutput, ResultSink, WvrObservation, WvrRow},
    retrieval::{GridSampler, Sampler},
};
