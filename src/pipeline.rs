//! End-to-end processing of one observation.
//!
//! Reads WVR rows from a [`MeasurementSource`], flags and interpolates
//! antennas, retrieves coefficients on a reference antenna, turns them into
//! path for every antenna and hands everything to a [`ResultSink`].

mod report;

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info, warn};

pub use report::{AntennaReport, AntennaStatus};

use crate::{
    antennas::{weighted_ants_within, AntSet},
    array_data::{InterpArrayData, RowInfo},
    coeffs::{Coeffs, DtdlCoeffs},
    config::{Strategy, WvrConfig},
    dispersion::DispersionTable,
    error::{ConfigError, DataError, RetrievalError, WvrError},
    gains::ArrayGains,
    retrieval::{inputs, retrieve_all, RetrievalBatch, Sampler, T_MIN},
    segments::{field_segments_tied, tie_sources, TimeInterval},
};

/// Retrieval runs before giving up on flagging more antennas.
const MAX_ATTEMPTS: usize = 2;

/// One time row of WVR data for the whole array.
#[derive(Debug, Clone, PartialEq)]
pub struct WvrRow {
    /// Time, s
    pub time: f64,
    /// State id
    pub state: usize,
    /// Field id
    pub field: usize,
    /// Elevation, rad; NaN without pointing
    pub el: f64,
    /// Azimuth, rad
    pub az: f64,
    /// Brightness per antenna and channel, K
    pub tobs: Vec<Coeffs>,
    /// Per-antenna flags
    pub flags: Vec<bool>,
}

/// Everything the pipeline reads from a measurement set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WvrObservation {
    /// Antenna names, by index
    pub antenna_names: Vec<String>,
    /// Antenna positions, m
    pub positions: Vec<[f64; 3]>,
    /// Whether each antenna carries a radiometer
    pub has_wvr: Vec<bool>,
    /// WVR rows in any order
    pub rows: Vec<WvrRow>,
    /// Source of each field
    pub field_source: BTreeMap<usize, usize>,
    /// Source names by id
    pub source_names: BTreeMap<usize, String>,
}

impl WvrObservation {
    fn num_antennas(&self) -> usize {
        self.antenna_names.len()
    }

    fn check(&self) -> Result<(), DataError> {
        let n = self.num_antennas();
        if self.positions.len() != n || self.has_wvr.len() != n {
            return Err(DataError::Shape(format!(
                "{n} antenna names, {} positions, {} WVR flags",
                self.positions.len(),
                self.has_wvr.len()
            )));
        }
        if self.rows.is_empty() {
            return Err(DataError::NoWvrRows);
        }
        if let Some(row) = self
            .rows
            .iter()
            .find(|r| r.tobs.len() != n || r.flags.len() != n)
        {
            return Err(DataError::Shape(format!(
                "row at {} has {} antennas and {} flags, expected {n}",
                row.time,
                row.tobs.len(),
                row.flags.len()
            )));
        }
        if self.rows.iter().all(|r| !r.el.is_finite()) {
            return Err(DataError::NoPointing);
        }
        Ok(())
    }

    fn source_of(&self, field: usize) -> usize {
        self.field_source.get(&field).copied().unwrap_or(field)
    }

    /// The time-sorted brightness store. Flagged cells are zero.
    fn store(&self) -> InterpArrayData {
        let mut rows: Vec<&WvrRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| a.time.total_cmp(&b.time));
        let info: Vec<RowInfo> = rows
            .iter()
            .map(|r| RowInfo {
                time: r.time,
                el: r.el,
                az: r.az,
                state: r.state,
                field: r.field,
                source: self.source_of(r.field),
            })
            .collect();
        let mut store = InterpArrayData::new(&info, self.num_antennas());
        for (i, row) in rows.iter().enumerate() {
            for (ant, (tobs, &flag)) in row.tobs.iter().zip(&row.flags).enumerate() {
                if !flag {
                    store.set_tobs(i, ant, tobs);
                }
            }
        }
        store
    }
}

/// Where observations come from.
pub trait MeasurementSource {
    /// Read the observation.
    fn observation(&self) -> Result<WvrObservation, WvrError>;
}

/// Where results go.
pub trait ResultSink {
    /// Take the results of a run.
    fn accept(&mut self, output: &PipelineOutput) -> Result<(), WvrError>;
}

/// Results of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Coefficients applied
    pub coeffs: DtdlCoeffs,
    /// The retrieval they came from
    pub retrieval: RetrievalBatch,
    /// Path per time and antenna
    pub gains: ArrayGains,
    /// RMS of elevation-scaled path per antenna, m
    pub rms: Vec<f64>,
    /// RMS difference from fixed mean coefficients per antenna, m
    pub disc: Vec<f64>,
    /// Reference antenna
    pub refant: usize,
    /// Flagged antennas
    pub flagged: AntSet,
    /// Flagged antennas that couldn't be interpolated
    pub interp_impossible: AntSet,
    /// Dispersion table for converting path to phase
    pub dispersion: Option<DispersionTable>,
    /// Number of retrieval attempts made
    pub attempts: usize,
    /// Human-readable summary
    pub report: AntennaReport,
}

impl PipelineOutput {
    /// Retrieval rows that failed.
    pub fn problem_count(&self) -> usize {
        self.retrieval.problems.len()
    }

    /// Antennas whose retrievals didn't converge.
    fn offending(&self) -> AntSet {
        self.retrieval
            .problems
            .iter()
            .filter(|(_, e)| matches!(e, RetrievalError::NotConverged(_)))
            .map(|(input, _)| input.antno)
            .collect()
    }
}

fn antenna_index(obs: &WvrObservation, name: &str) -> Result<usize, ConfigError> {
    obs.antenna_names
        .iter()
        .position(|n| n == name)
        .ok_or_else(|| ConfigError::UnknownAntenna {
            name: name.to_string(),
            valid: obs.antenna_names.clone(),
        })
}

/// Antennas flagged by configuration, lacking a radiometer or flagged in
/// every row.
fn initial_flags(config: &WvrConfig, obs: &WvrObservation) -> Result<AntSet, WvrError> {
    let mut flagged = AntSet::new();
    for name in &config.flag {
        flagged.insert(antenna_index(obs, name)?);
    }
    for ant in 0..obs.num_antennas() {
        if !obs.has_wvr[ant] {
            debug!("{} has no WVR", obs.antenna_names[ant]);
            flagged.insert(ant);
        } else if obs.rows.iter().all(|r| r.flags[ant]) {
            debug!("{} is flagged in every row", obs.antenna_names[ant]);
            flagged.insert(ant);
        }
    }
    Ok(flagged)
}

fn choose_refant(
    config: &WvrConfig,
    obs: &WvrObservation,
    flagged: &AntSet,
) -> Result<usize, WvrError> {
    let usable = |ant: usize| !flagged.contains(&ant);
    if let Some(name) = &config.refant {
        let ant = antenna_index(obs, name)?;
        if usable(ant) {
            return Ok(ant);
        }
        warn!("reference antenna {name} is flagged, choosing another");
    }
    (0..obs.num_antennas())
        .find(|&ant| usable(ant))
        .ok_or_else(|| DataError::AllAntennasFlagged.into())
}

/// Replace flagged antennas by their neighbours, or by the sentinel when
/// too few neighbours are close enough. Returns the antennas that got the
/// sentinel.
fn interpolate_flagged(
    config: &WvrConfig,
    obs: &WvrObservation,
    store: &mut InterpArrayData,
    flagged: &AntSet,
) -> Result<AntSet, DataError> {
    let mut impossible = AntSet::new();
    for &ant in flagged {
        let found = match weighted_ants_within(
            &obs.positions,
            ant,
            flagged,
            config.interp_neighbours,
            config.max_interp_distance,
            config.min_interp_neighbours,
        ) {
            Ok(neighbours) if !neighbours.is_empty() => {
                store.interp_bad_ant_weighted(ant, &neighbours)?;
                continue;
            }
            // a zero minimum lets an empty neighbour list through
            Ok(_) => 0,
            Err(DataError::TooFewNeighbours { found, .. }) => found,
            Err(e) => return Err(e),
        };
        warn!(
            "cannot interpolate {}: {found} neighbours within {} m",
            obs.antenna_names[ant], config.max_interp_distance
        );
        store.set_antenna_value(ant, T_MIN)?;
        impossible.insert(ant);
    }
    Ok(impossible)
}

#[allow(clippy::too_many_arguments)]
fn run_attempt(
    config: &WvrConfig,
    obs: &WvrObservation,
    base: &InterpArrayData,
    flagged: &AntSet,
    tied: &[BTreeSet<usize>],
    dispersion: Option<&DispersionTable>,
    sampler: &dyn Sampler,
    attempt: usize,
) -> Result<PipelineOutput, WvrError> {
    if flagged.len() >= obs.num_antennas() {
        return Err(DataError::AllAntennasFlagged.into());
    }
    let refant = choose_refant(config, obs, flagged)?;
    info!(
        "Attempt {attempt}: reference antenna {}, {} antennas flagged",
        obs.antenna_names[refant],
        flagged.len()
    );

    let mut store = base.clone();
    let interp_impossible = interpolate_flagged(config, obs, &mut store, flagged)?;
    store.smooth(config.nsample);

    let states: BTreeSet<usize> = config.states.iter().copied().collect();
    let retrieval_inputs = match config.strategy {
        Strategy::Single => inputs::single_midpoint(&store, refant, &states)?,
        Strategy::Uniform { n } => inputs::multiple_uniform(&store, refant, &states, n)?,
        Strategy::Segments => {
            let segments = field_segments_tied(store.time(), store.source(), tied);
            debug!("{} segments", segments.len());
            inputs::field_midpoints(&store, refant, &states, &segments)?
        }
    };
    let retrieval = retrieve_all(&retrieval_inputs, &config.retrieval, sampler)?;

    let coeffs = DtdlCoeffs::from_results(&retrieval.inputs, &retrieval.results)?
        .with_mask(config.channel_mask)
        .with_scale(config.scale);
    if !coeffs.is_finite() {
        warn!("some coefficients are not finite");
    }

    let mut gains = ArrayGains::for_data(&store);
    gains.calc_coeffs(&store, &coeffs)?;

    let tmask: Vec<TimeInterval> = match (store.time().first(), store.time().last()) {
        (Some(&first), Some(&last)) => vec![(first, last)],
        _ => Vec::new(),
    };
    let mut rms = gains.path_rms_ant(&tmask)?;
    let (mean, _) = coeffs.mean()?;
    let mut fixed = ArrayGains::for_data(&store);
    fixed.calc_fixed(&store, &mean)?;
    let mut disc = gains.path_disc_ant(&fixed, &tmask)?;
    for &ant in &interp_impossible {
        rms[ant] = 0.;
        disc[ant] = 0.;
    }

    let report = AntennaReport::new(
        (0..obs.num_antennas())
            .map(|ant| AntennaStatus {
                name: obs.antenna_names[ant].clone(),
                has_wvr: obs.has_wvr[ant],
                flagged: flagged.contains(&ant),
                interp_impossible: interp_impossible.contains(&ant),
                rms: rms[ant],
                disc: disc[ant],
            })
            .collect(),
        retrieval.problems.len(),
    );

    Ok(PipelineOutput {
        coeffs,
        retrieval,
        gains,
        rms,
        disc,
        refant,
        flagged: flagged.clone(),
        interp_impossible,
        dispersion: dispersion.cloned(),
        attempts: attempt,
        report,
    })
}

/// Process one observation and hand the results to `sink`.
///
/// If some retrievals don't converge, their antennas are flagged and the
/// processing is repeated once. A failure of the repeat falls back to the
/// first attempt's results.
pub fn run(
    config: &WvrConfig,
    source: &dyn MeasurementSource,
    sampler: &dyn Sampler,
    sink: &mut dyn ResultSink,
) -> Result<PipelineOutput, WvrError> {
    config.validate()?;
    let obs = source.observation()?;
    obs.check()?;
    debug!(
        "{} antennas, {} WVR rows",
        obs.num_antennas(),
        obs.rows.len()
    );

    let tied = tie_sources(&config.tie, &obs.source_names)?;
    let dispersion = config
        .dispersion_table
        .as_deref()
        .map(DispersionTable::from_file)
        .transpose()?;
    let base = obs.store();
    let mut flagged = initial_flags(config, &obs)?;

    let mut previous: Option<PipelineOutput> = None;
    let mut attempt = 1;
    let output = loop {
        let outcome = run_attempt(
            config,
            &obs,
            &base,
            &flagged,
            &tied,
            dispersion.as_ref(),
            sampler,
            attempt,
        );
        match outcome {
            Ok(output) => {
                let offending = output.offending();
                if offending.is_empty() || attempt == MAX_ATTEMPTS {
                    break output;
                }
                warn!(
                    "retrievals did not converge on antennas {offending:?}, flagging them and retrying"
                );
                flagged.extend(offending);
                previous = Some(output);
                attempt += 1;
            }
            Err(e) => match previous.take() {
                Some(first) => {
                    warn!("retry failed ({e}), keeping the first attempt");
                    break first;
                }
                None => return Err(e),
            },
        }
    };

    info!(
        "WVR processing done after {} attempt(s), {} retrieval problem(s)",
        output.attempts,
        output.problem_count()
    );
    sink.accept(&output)?;
    Ok(output)
}
