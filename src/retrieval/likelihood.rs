//! Gaussian likelihood of radiometer observations.

use std::f64::consts::PI;

use crate::{
    error::{ModelError, SamplerError},
    model::{Param, QuantityModel},
};

use super::sampler::{FlatPrior, Problem};

/// Independent Gaussian noise on each observed channel, optionally with
/// observed path derivatives.
#[derive(Debug)]
pub struct NormalLikelihood<M> {
    model: M,
    obs: Vec<f64>,
    sigma: Vec<f64>,
    derivs: Option<(Vec<f64>, Vec<f64>)>,
    priors: Vec<FlatPrior>,
}

/// `(obs - model)² / 2σ² + ½ ln(2πσ²)`, summed.
fn gaussian_nll(obs: &[f64], model: &[f64], sigma: &[f64]) -> f64 {
    obs.iter()
        .zip(model)
        .zip(sigma)
        .map(|((o, m), s)| (o - m).powi(2) / (2. * s.powi(2)) + 0.5 * (2. * PI * s.powi(2)).ln())
        .sum()
}

impl<M: QuantityModel> NormalLikelihood<M> {
    /// Observations `obs` with noise `sigma` (K), one per channel.
    pub fn new(model: M, obs: &[f64], sigma: &[f64]) -> Self {
        Self {
            model,
            obs: obs.to_vec(),
            sigma: sigma.to_vec(),
            derivs: None,
            priors: Vec::new(),
        }
    }

    /// Also constrain dT/dL against `obs` (K/m) with errors `sigma`.
    pub fn with_derivatives(mut self, obs: &[f64], sigma: &[f64]) -> Self {
        self.derivs = Some((obs.to_vec(), sigma.to_vec()));
        self
    }

    /// Register a flat prior on `param`.
    pub fn add_prior(&mut self, param: Param, lo: f64, hi: f64) -> Result<(), ModelError> {
        // reject parameters the model doesn't have up front
        self.model.get(param)?;
        self.priors.push(FlatPrior { param, lo, hi });
        Ok(())
    }

    /// The model, with whatever parameters were set last.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Negative log-likelihood at the model's current parameters.
    pub fn nll(&mut self) -> f64 {
        let tb = self.model.eval();
        let mut nll = gaussian_nll(&self.obs, &tb, &self.sigma);
        if let Some((obs, sigma)) = &self.derivs {
            match self.model.dtdl() {
                Ok(dtdl) => nll += gaussian_nll(obs, &dtdl, sigma),
                Err(_) => return f64::INFINITY,
            }
        }
        nll
    }

    /// Set every prior parameter from `point`, in prior order.
    pub fn set_point(&mut self, point: &[f64]) -> Result<(), ModelError> {
        for (prior, &value) in self.priors.iter().zip(point) {
            self.model.set(prior.param, value)?;
        }
        Ok(())
    }
}

impl<M: QuantityModel> Problem for NormalLikelihood<M> {
    fn priors(&self) -> &[FlatPrior] {
        &self.priors
    }

    fn nll_at(&mut self, point: &[f64]) -> Result<f64, SamplerError> {
        if self.set_point(point).is_err() {
            return Ok(f64::INFINITY);
        }
        Ok(self.nll())
    }
}
