//! Run configuration, read from JSON.
//!
//! Every field has a default, so an empty object `{}` is a valid
//! configuration.


use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    coeffs::Coeffs,
    error::ConfigError,
    gains::THERMAL_NOISE,
    model::{Geometry, ModelKind},
    NUM_CHANNELS,
};

/// Settings of the per-row Bayesian retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Species in the model
    pub model: ModelKind,
    /// Vertical distribution of the water
    pub geometry: Geometry,
    /// Sky coupling coefficient
    pub coupling: f64,
    /// Temperature of the non-sky termination, K
    pub t_term: f64,
    /// Water column prior, mm
    pub water_prior: (f64, f64),
    /// Temperature prior, K
    pub temperature_prior: (f64, f64),
    /// Pressure prior, hPa
    pub pressure_prior: (f64, f64),
    /// Cloud opacity prior, cloudy models only
    pub cloud_prior: (f64, f64),
    /// Sampler live points
    pub n_live: usize,
    /// Sampler likelihood evaluations
    pub n_samples: usize,
    /// Noise of each channel in the likelihood, K
    pub noise: Coeffs,
    /// Worker threads; `None` lets rayon choose
    pub num_threads: Option<usize>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Water,
            geometry: Geometry::Slice,
            coupling: 0.98,
            t_term: 275.,
            water_prior: (0.05, 6.),
            temperature_prior: (250., 300.),
            pressure_prior: (500., 650.),
            cloud_prior: (0., 1.),
            n_live: 200,
            n_samples: 20_000,
            noise: THERMAL_NOISE,
            num_threads: None,
        }
    }
}

/// How retrieval rows are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One retrieval at the middle of the observation
    #[default]
    Single,
    /// `n` retrievals spread evenly in time
    Uniform {
        /// number of retrievals
        n: usize,
    },
    /// One retrieval per field segment
    Segments,
}

/// Everything a pipeline run needs besides its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WvrConfig {
    /// Retrieval settings
    pub retrieval: RetrievalConfig,
    /// Row selection for retrieval
    pub strategy: Strategy,
    /// Antenna names to flag
    pub flag: Vec<String>,
    /// Groups of source names treated as one source when segmenting
    pub tie: Vec<Vec<String>>,
    /// Allowed state ids; empty allows all
    pub states: Vec<usize>,
    /// Smoothing width in samples
    pub nsample: usize,
    /// Largest distance to an interpolation neighbour, m
    pub max_interp_distance: f64,
    /// Neighbours used for interpolation
    pub interp_neighbours: usize,
    /// Fewest neighbours that still allow interpolation
    pub min_interp_neighbours: usize,
    /// Reference antenna name; the first usable antenna if absent
    pub refant: Option<String>,
    /// Dispersion table resource
    pub dispersion_table: Option<PathBuf>,
    /// Channels used for the path
    pub channel_mask: [bool; NUM_CHANNELS],
    /// Scale applied to every coefficient
    pub scale: f64,
}

impl Default for WvrConfig {
    fn default() -> Self {
        Self {
            retrieval: RetrievalConfig::default(),
            strategy: Strategy::default(),
            flag: Vec::new(),
            tie: Vec::new(),
            states: Vec::new(),
            nsample: 1,
            max_interp_distance: 500.,
            interp_neighbours: 3,
            min_interp_neighbours: 2,
            refant: None,
            dispersion_table: None,
            channel_mask: [true; NUM_CHANNELS],
            scale: 1.,
        }
    }
}

fn check_range(name: &str, (lo, hi): (f64, f64)) -> Result<(), ConfigError> {
    if lo.is_finite() && hi.is_finite() && lo < hi {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} range [{lo}, {hi}] is empty or not finite"
        )))
    }
}

impl WvrConfig {
    /// Read and validate a JSON configuration.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        debug!("read configuration from {}", path.display());
        Ok(config)
    }

    /// Reject settings that can't work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.retrieval;
        check_range("water prior", r.water_prior)?;
        check_range("temperature prior", r.temperature_prior)?;
        check_range("pressure prior", r.pressure_prior)?;
        if r.model == ModelKind::CloudyWater {
            check_range("cloud prior", r.cloud_prior)?;
        }
        if !(r.coupling > 0. && r.coupling <= 1.) {
            return Err(ConfigError::Invalid(format!(
                "coupling {} must be in (0, 1]",
                r.coupling
            )));
        }
        if r.noise.iter().any(|&s| !(s > 0.)) {
            return Err(ConfigError::Invalid(format!(
                "channel noise {:?} must be positive",
                r.noise
            )));
        }
        if r.n_samples == 0 {
            return Err(ConfigError::Invalid("n_samples must be positive".into()));
        }
        if let Geometry::Layer { p_drop } = r.geometry {
            if !(p_drop >= 0.) {
                return Err(ConfigError::Invalid(format!(
                    "layer pressure drop {p_drop} must be non-negative"
                )));
            }
        }
        if r.num_threads == Some(0) {
            return Err(ConfigError::Invalid(
                "num_threads must be positive, or absent".into(),
            ));
        }
        if let Strategy::Uniform { n: 0 } = self.strategy {
            return Err(ConfigError::Invalid(
                "uniform strategy needs at least one retrieval".into(),
            ));
        }
        if self.nsample == 0 {
            return Err(ConfigError::Invalid("nsample must be at least 1".into()));
        }
        if self.min_interp_neighbours > self.interp_neighbours {
            return Err(ConfigError::Invalid(format!(
                "min_interp_neighbours {} exceeds interp_neighbours {}",
                self.min_interp_neighbours, self.interp_neighbours
            )));
        }
        if !self.scale.is_finite() {
            return Err(ConfigError::Invalid(format!("scale {} is not finite", self.scale)));
        }
        Ok(())
    }
}
