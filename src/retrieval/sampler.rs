//! Bayesian sampler interface.
//!
//! The retrieval only needs priors in and a weighted posterior with the
//! evidence out; how the sampler explores the prior is its own business.
//! [`GridSampler`] is a deterministic implementation that integrates the
//! likelihood over a regular grid of the prior box.

use crate::{error::SamplerError, model::Param};

/// A flat prior on one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatPrior {
    /// Parameter
    pub param: Param,
    /// Lower bound
    pub lo: f64,
    /// Upper bound
    pub hi: f64,
}

/// One point of the weighted posterior.
#[derive(Debug, Clone, PartialEq)]
pub struct PosteriorPoint {
    /// Parameter values, in prior order
    pub params: Vec<f64>,
    /// Normalised posterior weight
    pub weight: f64,
    /// Negative log-likelihood at this point
    pub nll: f64,
}

/// Sampler output.
#[derive(Debug, Clone, PartialEq)]
pub struct Posterior {
    /// Natural log of the evidence (prior-averaged likelihood)
    pub log_evidence: f64,
    /// Weighted posterior samples; weights sum to one
    pub points: Vec<PosteriorPoint>,
}

/// Something a sampler can explore: a list of priors and a likelihood.
pub trait Problem {
    /// Registered priors; points are given in this order.
    fn priors(&self) -> &[FlatPrior];

    /// Negative log-likelihood at `point`.
    fn nll_at(&mut self, point: &[f64]) -> Result<f64, SamplerError>;
}

/// A Bayesian sampler.
pub trait Sampler: Sync + std::fmt::Debug {
    /// Sample `problem`'s posterior using `n_live` live points and about
    /// `n_samples` likelihood evaluations.
    fn run(
        &self,
        problem: &mut dyn Problem,
        n_live: usize,
        n_samples: usize,
    ) -> Result<Posterior, SamplerError>;
}

/// Deterministic sampler on a regular grid of cell centres.
///
/// Each axis gets `floor(n_samples^(1/d))` points (at least two) where `d`
/// is the number of priors. There is no live set, so `n_live` is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridSampler;

impl GridSampler {
    fn axis_points(num_dims: usize, n_samples: usize) -> usize {
        let per_axis = (n_samples as f64).powf(1. / num_dims as f64).floor() as usize;
        // guard against powf landing just below an exact integer root
        let per_axis = if (per_axis + 1)
            .checked_pow(num_dims as u32)
            .is_some_and(|n| n <= n_samples)
        {
            per_axis + 1
        } else {
            per_axis
        };
        per_axis.max(2)
    }
}

impl Sampler for GridSampler {
    fn run(
        &self,
        problem: &mut dyn Problem,
        _n_live: usize,
        n_samples: usize,
    ) -> Result<Posterior, SamplerError> {
        let priors = problem.priors().to_vec();
        if priors.is_empty() {
            return Err(SamplerError::NoPriors);
        }
        if let Some(bad) = priors
            .iter()
            .find(|p| !(p.lo.is_finite() && p.hi.is_finite() && p.lo < p.hi))
        {
            return Err(SamplerError::BadPrior {
                param: bad.param,
                lo: bad.lo,
                hi: bad.hi,
            });
        }

        let per_axis = Self::axis_points(priors.len(), n_samples);
        let total = per_axis.pow(priors.len() as u32);

        let mut points = Vec::with_capacity(total);
        let mut index = vec![0usize; priors.len()];
        for _ in 0..total {
            let params: Vec<f64> = priors
                .iter()
                .zip(&index)
                .map(|(p, &i)| p.lo + (i as f64 + 0.5) * (p.hi - p.lo) / per_axis as f64)
                .collect();
            let nll = problem.nll_at(&params)?;
            points.push(PosteriorPoint {
                params,
                weight: 0.,
                nll,
            });

            // odometer increment, first axis fastest
            for i in index.iter_mut() {
                *i += 1;
                if *i < per_axis {
                    break;
                }
                *i = 0;
            }
        }

        let min_nll = points
            .iter()
            .map(|p| p.nll)
            .filter(|nll| nll.is_finite())
            .fold(f64::INFINITY, f64::min);
        if !min_nll.is_finite() {
            return Err(SamplerError::Degenerate);
        }

        let mut sum = 0.;
        for point in points.iter_mut() {
            point.weight = if point.nll.is_finite() {
                f64::exp(min_nll - point.nll)
            } else {
                0.
            };
            sum += point.weight;
        }
        for point in points.iter_mut() {
            point.weight /= sum;
        }

        // Each cell carries prior mass 1/total
        let log_evidence = -min_nll + sum.ln() - (total as f64).ln();

        Ok(Posterior {
            log_evidence,
            points,
        })
    }
}
