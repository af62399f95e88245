//! Bayesian retrieval of water column and dT/dL from WVR brightness.
//!
//! Each input row is independent: its temperatures are range-checked, a
//! coupled water model is wrapped in a Gaussian likelihood with flat priors,
//! the sampler explores it and the weighted posterior is reduced to means and
//! errors. Rows that fail are set aside as problems; only a batch in which
//! every row fails is an error.

pub mod inputs;
mod likelihood;
pub mod sampler;

#[cfg(test)]
mod tests;

use log::{debug, info, warn};
use rayon::prelude::*;

pub use likelihood::NormalLikelihood;
pub use sampler::{FlatPrior, GridSampler, Posterior, PosteriorPoint, Problem, Sampler};

use crate::{
    coeffs::Coeffs,
    config::RetrievalConfig,
    error::RetrievalError,
    model::{Coupled, ModelKind, Param, QuantityModel, WaterModel},
    radiometer::alma_wvr,
    NUM_CHANNELS,
};

/// Lowest plausible sky brightness, K.
pub const T_MIN: f64 = 2.7;
/// Highest plausible sky brightness, K.
pub const T_MAX: f64 = 350.;

/// Points whose weight is below this fraction of the largest weight are
/// left out of the posterior reduction.
const NEGLIGIBLE_WEIGHT: f64 = 1e-9;

/// One retrieval input: the reference antenna's channels at one time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbsInput {
    /// Antenna index
    pub antno: usize,
    /// Channel brightness, K
    pub tobs: Coeffs,
    /// Elevation, rad
    pub el: f64,
    /// Time, s
    pub time: f64,
    /// State id
    pub state: usize,
    /// Source id
    pub source: usize,
}

/// The reduced posterior of one retrieval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbsResult {
    /// Natural log of the evidence
    pub ev: f64,
    /// Water column, mm
    pub c: f64,
    /// Error of the water column, mm
    pub c_err: f64,
    /// dT/dL, K/m
    pub dtdl: Coeffs,
    /// Error of dT/dL, K/m
    pub dtdl_err: Coeffs,
    /// d²T/dL², K/m²
    pub dtdl2: Coeffs,
    /// Cloud opacity at 183 GHz and its error, for cloudy models
    pub tau183: Option<(f64, f64)>,
}

impl AbsResult {
    /// Why the result can't be used, if it can't.
    fn problem(&self) -> Option<String> {
        if !self.c.is_finite() {
            return Some(format!("water column is {}", self.c));
        }
        self.dtdl
            .iter()
            .enumerate()
            .find(|(_, d)| !d.is_finite() || **d <= 0.)
            .map(|(ch, d)| format!("channel {ch} dT/dL is {d}"))
    }
}

/// Outcome of a batch of retrievals.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalBatch {
    /// Inputs that were retrieved successfully, in input order
    pub inputs: Vec<AbsInput>,
    /// Their results
    pub results: Vec<AbsResult>,
    /// Inputs that failed and why
    pub problems: Vec<(AbsInput, RetrievalError)>,
}

fn check_range(tobs: &Coeffs) -> Result<(), RetrievalError> {
    match tobs
        .iter()
        .enumerate()
        .find(|(_, t)| !(T_MIN..=T_MAX).contains(*t))
    {
        Some((channel, &value)) => Err(RetrievalError::TemperatureRange {
            channel,
            value,
            min: T_MIN,
            max: T_MAX,
        }),
        None => Ok(()),
    }
}

/// Retrieve one row.
pub fn retrieve_row(
    input: &AbsInput,
    config: &RetrievalConfig,
    sampler: &dyn Sampler,
) -> Result<AbsResult, RetrievalError> {
    check_range(&input.tobs)?;

    let model = Coupled::new(
        WaterModel::new(alma_wvr(), config.model, config.geometry),
        config.coupling,
        config.t_term,
    );
    let mut likelihood = NormalLikelihood::new(model, &input.tobs, &config.noise);
    likelihood.add_prior(Param::Water, config.water_prior.0, config.water_prior.1)?;
    likelihood.add_prior(
        Param::Temperature,
        config.temperature_prior.0,
        config.temperature_prior.1,
    )?;
    likelihood.add_prior(
        Param::Pressure,
        config.pressure_prior.0,
        config.pressure_prior.1,
    )?;
    let cloudy = config.model == ModelKind::CloudyWater;
    if cloudy {
        likelihood.add_prior(Param::CloudTau, config.cloud_prior.0, config.cloud_prior.1)?;
    }

    let posterior = sampler.run(&mut likelihood, config.n_live, config.n_samples)?;
    let result = reduce(&mut likelihood, &posterior, cloudy)?;
    match result.problem() {
        Some(reason) => Err(RetrievalError::NotConverged(reason)),
        None => Ok(result),
    }
}

/// Running weighted first and second moments.
#[derive(Debug, Default)]
struct Moments {
    sum: f64,
    sum2: f64,
}

impl Moments {
    fn add(&mut self, w: f64, x: f64) {
        self.sum += w * x;
        self.sum2 += w * x * x;
    }

    /// Mean and standard deviation for total weight `total`.
    fn finish(&self, total: f64) -> (f64, f64) {
        let mean = self.sum / total;
        let var = self.sum2 / total - mean * mean;
        (mean, if var < 0. { 0. } else { var.sqrt() })
    }
}

/// Weighted means and errors of water column, dT/dL and d²T/dL².
///
/// The priors were registered water first, then temperature, pressure and
/// optionally cloud opacity.
fn reduce<M: QuantityModel>(
    likelihood: &mut NormalLikelihood<M>,
    posterior: &Posterior,
    cloudy: bool,
) -> Result<AbsResult, RetrievalError> {
    let max_weight = posterior
        .points
        .iter()
        .map(|p| p.weight)
        .fold(0., f64::max);

    let mut total = 0.;
    let mut water = Moments::default();
    let mut tau = Moments::default();
    let mut dtdl: [Moments; NUM_CHANNELS] = Default::default();
    let mut dtdl2 = [0.; NUM_CHANNELS];
    for point in posterior
        .points
        .iter()
        .filter(|p| p.weight > NEGLIGIBLE_WEIGHT * max_weight)
    {
        likelihood.set_point(&point.params)?;
        let model = likelihood.model_mut();
        let d1 = model.dtdl()?;
        let d2 = model.dtdl2()?;

        let w = point.weight;
        total += w;
        water.add(w, point.params[0]);
        if cloudy {
            tau.add(w, point.params[3]);
        }
        for ch in 0..NUM_CHANNELS {
            dtdl[ch].add(w, d1[ch]);
            dtdl2[ch] += w * d2[ch];
        }
    }

    let (c, c_err) = water.finish(total);
    let mut result = AbsResult {
        ev: posterior.log_evidence,
        c,
        c_err,
        dtdl: [0.; NUM_CHANNELS],
        dtdl_err: [0.; NUM_CHANNELS],
        dtdl2: dtdl2.map(|d| d / total),
        tau183: cloudy.then(|| tau.finish(total)),
    };
    for ch in 0..NUM_CHANNELS {
        (result.dtdl[ch], result.dtdl_err[ch]) = dtdl[ch].finish(total);
    }
    Ok(result)
}

/// Retrieve every input, in parallel.
///
/// Results keep the order of `inputs`. Failed rows are reported in
/// [`RetrievalBatch::problems`]; it is an error only if there are no inputs
/// or none succeed.
pub fn retrieve_all(
    inputs: &[AbsInput],
    config: &RetrievalConfig,
    sampler: &dyn Sampler,
) -> Result<RetrievalBatch, RetrievalError> {
    if inputs.is_empty() {
        return Err(RetrievalError::NoInputs);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.num_threads.unwrap_or(0))
        .build()
        .map_err(|e| RetrievalError::ThreadPool(e.to_string()))?;

    info!("Retrieving {} WVR rows", inputs.len());
    let outcomes: Vec<Result<AbsResult, RetrievalError>> = pool.install(|| {
        inputs
            .par_iter()
            .map(|input| retrieve_row(input, config, sampler))
            .collect()
    });

    let mut batch = RetrievalBatch {
        inputs: Vec::with_capacity(inputs.len()),
        results: Vec::with_capacity(inputs.len()),
        problems: Vec::new(),
    };
    for (input, outcome) in inputs.iter().zip(outcomes) {
        match outcome {
            Ok(result) => {
                debug!(
                    "t={:.1} antenna {}: n={:.3}±{:.3} mm, dT/dL={:?}",
                    input.time, input.antno, result.c, result.c_err, result.dtdl
                );
                batch.inputs.push(*input);
                batch.results.push(result);
            }
            Err(e) => {
                warn!("t={:.1} antenna {}: {e}", input.time, input.antno);
                batch.problems.push((*input, e));
            }
        }
    }

    if batch.results.is_empty() {
        return Err(RetrievalError::AllRowsFailed(inputs.len()));
    }
    if !batch.problems.is_empty() {
        info!(
            "{} of {} retrievals had problems",
            batch.problems.len(),
            inputs.len()
        );
    }
    Ok(batch)
}
