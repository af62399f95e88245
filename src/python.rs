//! Python bindings.
//!
//! NOTE: this module is only the interface between Rust and Python. The real
//! work happens in the other modules, and they do not use `pyo3`.

use log::debug;
use numpy::{PyArray2, PyReadonlyArray1, PyReadonlyArray3, ToPyArray};
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::{
    array_data::{InterpArrayData, RowInfo},
    coeffs::Coeffs,
    error::{ConfigError, WvrError},
    gains::ArrayGains,
    segments::TimeInterval,
};

impl From<WvrError> for PyErr {
    fn from(e: WvrError) -> Self {
        match e {
            WvrError::Config(ConfigError::Io(_)) => PyIOError::new_err(e.to_string()),
            _ => PyValueError::new_err(e.to_string()),
        }
    }
}

/// Path in metres from WVR brightness.
///
/// `tobs` is dimensioned as (`num_times`, `num_antennas`, 4) and holds the
/// brightness temperature of each channel in K. Channels at or below zero
/// are treated as missing. `coeffs` are the dT/dL coefficients of the four
/// channels in K/m; they are reweighted by the channel noise before use.
///
/// The returned path has shape (`num_times`, `num_antennas`).
#[pyfunction]
fn compute_path<'py>(
    py: Python<'py>,
    tobs: PyReadonlyArray3<'py, f64>,
    coeffs: Coeffs,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let cube = tobs.as_array().to_owned();
    let rows: Vec<RowInfo> = (0..cube.dim().0)
        .map(|i| RowInfo {
            time: i as f64,
            el: std::f64::consts::FRAC_PI_2,
            az: 0.,
            state: 0,
            field: 0,
            source: 0,
        })
        .collect();
    debug!("computing path for cube of shape {:?}", cube.dim());

    let gains = py.allow_threads(|| -> Result<ArrayGains, WvrError> {
        let data = InterpArrayData::from_cube(&rows, cube)?;
        let mut gains = ArrayGains::for_data(&data);
        gains.calc_fixed(&data, &coeffs)?;
        Ok(gains)
    })?;
    Ok(gains.path().to_pyarray(py))
}

/// Channel multipliers (m/K) for coefficients `coeffs`, weighted by the
/// thermal noise of each channel.
#[pyfunction]
fn reweight_thermal(coeffs: Coeffs) -> Coeffs {
    crate::gains::reweight_thermal(&coeffs)
}

/// `(start, end)` times of each run of constant `ids`.
#[pyfunction]
fn field_segments(time: PyReadonlyArray1<'_, f64>, ids: Vec<usize>) -> PyResult<Vec<TimeInterval>> {
    let time = time.as_slice()?;
    if time.len() != ids.len() {
        return Err(PyValueError::new_err(format!(
            "{} times but {} ids",
            time.len(),
            ids.len()
        )));
    }
    Ok(crate::segments::field_segments(time, &ids))
}

/// A Python module implemented in Rust.
#[pymodule]
fn wvr_phase(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();

    m.add_function(wrap_pyfunction!(compute_path, m)?)?;
    m.add_function(wrap_pyfunction!(reweight_thermal, m)?)?;
    m.add_function(wrap_pyfunction!(field_segments, m)?)?;
    Ok(())
}
