//! Error types.
//!
//! Each concern has its own error enum; [`WvrError`] collects them for the
//! top-level pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::Param;

/// Errors from the forward model and radiometer construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// The frequency grid is empty
    #[error("radiometer frequency grid is empty")]
    EmptyGrid,

    /// Weight vectors don't match the frequency grid
    #[error("channel {channel} has {got} weights but the grid has {expected} frequencies")]
    WeightLength {
        /// offending channel
        channel: usize,
        /// number of weights supplied
        got: usize,
        /// number of grid points
        expected: usize,
    },

    /// A spectrum doesn't have one value per grid frequency
    #[error("spectrum has {got} values but the grid has {expected} frequencies")]
    SpectrumLength {
        /// number of values supplied
        got: usize,
        /// number of grid points
        expected: usize,
    },

    /// The single-channel accessor was used on a multi-channel radiometer
    #[error("radiometer has {0} channels, a channel index is required")]
    NotSingleChannel(usize),

    /// Channel index out of range
    #[error("channel {channel} out of range, radiometer has {num_channels}")]
    NoSuchChannel {
        /// requested channel
        channel: usize,
        /// channels available
        num_channels: usize,
    },

    /// The parameter is not part of this model
    #[error("model has no parameter {0}")]
    UnknownParam(Param),
}

/// Errors from the sampler.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplerError {
    /// No priors were registered
    #[error("no priors registered")]
    NoPriors,

    /// A prior has `lo >= hi` or non-finite bounds
    #[error("invalid prior for {param}: [{lo}, {hi}]")]
    BadPrior {
        /// parameter
        param: Param,
        /// lower bound
        lo: f64,
        /// upper bound
        hi: f64,
    },

    /// Every posterior point has zero likelihood
    #[error("posterior is degenerate, no point has finite likelihood")]
    Degenerate,
}

/// Errors from a single retrieval row, or from a batch of them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetrievalError {
    /// Observed brightness outside the physically allowed range
    #[error("channel {channel} temperature {value} K outside [{min}, {max}] K")]
    TemperatureRange {
        /// channel index
        channel: usize,
        /// observed value in K
        value: f64,
        /// lower bound in K
        min: f64,
        /// upper bound in K
        max: f64,
    },

    /// The model could not be built or evaluated
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The sampler failed
    #[error(transparent)]
    Sampler(#[from] SamplerError),

    /// The posterior reduced to unusable coefficients
    #[error("retrieval did not converge: {0}")]
    NotConverged(String),

    /// No input rows were supplied
    #[error("no retrieval inputs")]
    NoInputs,

    /// Every row failed
    #[error("all {0} retrieval rows failed")]
    AllRowsFailed(usize),

    /// The worker pool couldn't be started
    #[error("could not build retrieval thread pool: {0}")]
    ThreadPool(String),
}

/// Errors from the time-series store, gain arrays and antenna utilities.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    /// Row metadata and cube dimensions disagree
    #[error("inconsistent shapes: {0}")]
    Shape(String),

    /// An antenna index is outside the array
    #[error("antenna {antenna} out of range, array has {num_antennas}")]
    NoSuchAntenna {
        /// requested antenna
        antenna: usize,
        /// antennas in the array
        num_antennas: usize,
    },

    /// No rows carry pointing information
    #[error("no pointing data available for the WVR rows")]
    NoPointing,

    /// No WVR rows at all
    #[error("no WVR data rows found")]
    NoWvrRows,

    /// No state-selected rows remain for the retrieval
    #[error("no rows with an allowed state id")]
    NoGoodStates,

    /// Nothing left to work with
    #[error("all antennas are flagged")]
    AllAntennasFlagged,

    /// Antenna interpolation lacks neighbours
    #[error("antenna {antenna} has {found} usable neighbours, {required} required")]
    TooFewNeighbours {
        /// antenna being interpolated
        antenna: usize,
        /// neighbours inside the distance cap
        found: usize,
        /// minimum required
        required: usize,
    },

    /// Time masks must be sorted and disjoint
    #[error("time masks are not sorted and non-overlapping")]
    BadTimeMask,
}

/// Errors from the coefficient representations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoeffError {
    /// An interpolated set has no snapshots
    #[error("no coefficient snapshots to interpolate")]
    NoSnapshots,

    /// An individual set doesn't cover this antenna
    #[error("no coefficients for antenna {0}")]
    NoSuchAntenna(usize),

    /// Snapshot inputs and results don't pair up
    #[error("{inputs} inputs but {results} results")]
    Mismatch {
        /// number of inputs
        inputs: usize,
        /// number of results
        results: usize,
    },
}

/// Configuration and resource errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An unknown source name was given
    #[error("unknown source {name:?}, valid sources are: {}", valid.join(", "))]
    UnknownSource {
        /// name that wasn't found
        name: String,
        /// valid names
        valid: Vec<String>,
    },

    /// An unknown antenna name was given
    #[error("unknown antenna {name:?}, valid antennas are: {}", valid.join(", "))]
    UnknownAntenna {
        /// name that wasn't found
        name: String,
        /// valid names
        valid: Vec<String>,
    },

    /// A resource file couldn't be parsed
    #[error("malformed resource file {}: {reason}", path.display())]
    MalformedResource {
        /// file
        path: PathBuf,
        /// what went wrong
        reason: String,
    },

    /// A configuration value is outside its allowed range
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// Reading a file failed
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Parsing JSON failed
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Any error from the WVR processing chain.
#[derive(Error, Debug)]
pub enum WvrError {
    /// Forward model error
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Retrieval error
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// Data error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Coefficient error
    #[error(transparent)]
    Coeff(#[from] CoeffError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The result sink rejected the output
    #[error("result sink failed: {0}")]
    Sink(String),
}
