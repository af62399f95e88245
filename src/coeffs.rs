//! Retrieved dT/dL coefficients as a function of antenna and time.


use std::fmt;

use crate::{
    error::CoeffError,
    retrieval::{AbsInput, AbsResult},
    NUM_CHANNELS,
};

/// One value per WVR channel.
pub type Coeffs = [f64; NUM_CHANNELS];

/// Coefficients retrieved at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    /// Time, s
    pub time: f64,
    /// dT/dL, K/m
    pub c: Coeffs,
    /// d²T/dL², K/m²
    pub c2: Coeffs,
    /// Error of `c`, K/m
    pub c_err: Coeffs,
}

/// How the coefficients depend on antenna and time.
#[derive(Debug, Clone, PartialEq)]
pub enum CoeffSet {
    /// The same coefficients everywhere
    Single {
        /// first order
        c: Coeffs,
        /// second order
        c2: Coeffs,
    },
    /// Fixed coefficients for each antenna
    Indiv {
        /// first order, per antenna
        c: Vec<Coeffs>,
        /// second order, per antenna
        c2: Vec<Coeffs>,
    },
    /// Time-ordered snapshots, linearly interpolated
    Interpolated(Vec<Snapshot>),
}

/// Coefficients with a channel mask and overall scale applied on lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct DtdlCoeffs {
    set: CoeffSet,
    mask: [bool; NUM_CHANNELS],
    scale: f64,
}

impl DtdlCoeffs {
    fn with_set(set: CoeffSet) -> Self {
        Self {
            set,
            mask: [true; NUM_CHANNELS],
            scale: 1.,
        }
    }

    /// The same coefficients for every antenna and time.
    pub fn single(c: Coeffs, c2: Coeffs) -> Self {
        Self::with_set(CoeffSet::Single { c, c2 })
    }

    /// Per-antenna coefficients, indexed by antenna.
    pub fn indiv(c: Vec<Coeffs>, c2: Vec<Coeffs>) -> Result<Self, CoeffError> {
        if c.len() != c2.len() {
            return Err(CoeffError::Mismatch {
                inputs: c.len(),
                results: c2.len(),
            });
        }
        Ok(Self::with_set(CoeffSet::Indiv { c, c2 }))
    }

    /// Snapshots interpolated in time; they're sorted here.
    pub fn interpolated(mut snapshots: Vec<Snapshot>) -> Self {
        snapshots.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self::with_set(CoeffSet::Interpolated(snapshots))
    }

    /// Interpolated coefficients from paired retrieval inputs and results.
    pub fn from_results(inputs: &[AbsInput], results: &[AbsResult]) -> Result<Self, CoeffError> {
        if inputs.len() != results.len() {
            return Err(CoeffError::Mismatch {
                inputs: inputs.len(),
                results: results.len(),
            });
        }
        Ok(Self::interpolated(
            inputs
                .iter()
                .zip(results)
                .map(|(input, result)| Snapshot {
                    time: input.time,
                    c: result.dtdl,
                    c2: result.dtdl2,
                    c_err: result.dtdl_err,
                })
                .collect(),
        ))
    }

    /// Use only channels whose mask entry is `true`.
    pub fn with_mask(mut self, mask: [bool; NUM_CHANNELS]) -> Self {
        self.mask = mask;
        self
    }

    /// Multiply every coefficient by `scale`.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// The underlying coefficients.
    pub fn set(&self) -> &CoeffSet {
        &self.set
    }

    fn finish(&self, (c, c2): (Coeffs, Coeffs)) -> (Coeffs, Coeffs) {
        let apply = |v: Coeffs| {
            let mut out = [0.; NUM_CHANNELS];
            for ((o, x), &keep) in out.iter_mut().zip(v).zip(&self.mask) {
                if keep {
                    *o = x * self.scale;
                }
            }
            out
        };
        (apply(c), apply(c2))
    }

    /// First- and second-order coefficients for antenna `ant` at `time`.
    pub fn get(&self, ant: usize, time: f64) -> Result<(Coeffs, Coeffs), CoeffError> {
        let raw = match &self.set {
            CoeffSet::Single { c, c2 } => (*c, *c2),
            CoeffSet::Indiv { c, c2 } => c
                .get(ant)
                .zip(c2.get(ant))
                .map(|(c, c2)| (*c, *c2))
                .ok_or(CoeffError::NoSuchAntenna(ant))?,
            CoeffSet::Interpolated(snapshots) => interpolate(snapshots, time)?,
        };
        Ok(self.finish(raw))
    }

    /// Plain mean of all stored coefficients, masked and scaled.
    pub fn mean(&self) -> Result<(Coeffs, Coeffs), CoeffError> {
        let pairs: Vec<(Coeffs, Coeffs)> = match &self.set {
            CoeffSet::Single { c, c2 } => vec![(*c, *c2)],
            CoeffSet::Indiv { c, c2 } => c.iter().copied().zip(c2.iter().copied()).collect(),
            CoeffSet::Interpolated(snapshots) => snapshots.iter().map(|s| (s.c, s.c2)).collect(),
        };
        if pairs.is_empty() {
            return Err(CoeffError::NoSnapshots);
        }
        let n = pairs.len() as f64;
        let mut c = [0.; NUM_CHANNELS];
        let mut c2 = [0.; NUM_CHANNELS];
        for (pc, pc2) in &pairs {
            for ch in 0..NUM_CHANNELS {
                c[ch] += pc[ch] / n;
                c2[ch] += pc2[ch] / n;
            }
        }
        Ok(self.finish((c, c2)))
    }

    /// Whether every stored coefficient is finite.
    pub fn is_finite(&self) -> bool {
        let finite = |v: &Coeffs| v.iter().all(|x| x.is_finite());
        match &self.set {
            CoeffSet::Single { c, c2 } => finite(c) && finite(c2),
            CoeffSet::Indiv { c, c2 } => c.iter().chain(c2).all(finite),
            CoeffSet::Interpolated(snapshots) => {
                snapshots.iter().all(|s| finite(&s.c) && finite(&s.c2))
            }
        }
    }
}

/// Linear interpolation between the snapshots either side of `time`, flat
/// outside the covered range.
fn interpolate(snapshots: &[Snapshot], time: f64) -> Result<(Coeffs, Coeffs), CoeffError> {
    let (first, last) = match (snapshots.first(), snapshots.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(CoeffError::NoSnapshots),
    };
    if time < first.time {
        return Ok((first.c, first.c2));
    }
    if time >= last.time {
        return Ok((last.c, last.c2));
    }

    // first snapshot strictly after `time`; exists and is > 0 given the
    // checks above
    let next = snapshots.partition_point(|s| s.time <= time);
    let (prev, next) = (&snapshots[next - 1], &snapshots[next]);
    let f = (time - next.time) / (prev.time - next.time);
    let mix = |a: &Coeffs, b: &Coeffs| {
        let mut out = [0.; NUM_CHANNELS];
        for ((o, a), b) in out.iter_mut().zip(a).zip(b) {
            *o = f * a + (1. - f) * b;
        }
        out
    };
    Ok((mix(&prev.c, &next.c), mix(&prev.c2, &next.c2)))
}

fn write_coeffs(f: &mut fmt::Formatter<'_>, c: &Coeffs) -> fmt::Result {
    for v in c {
        write!(f, " {v:>10.4}")?;
    }
    Ok(())
}

impl fmt::Display for DtdlCoeffs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.set {
            CoeffSet::Single { c, .. } => {
                write!(f, "dT/dL (K/m), all antennas:")?;
                write_coeffs(f, c)?;
                writeln!(f)?;
            }
            CoeffSet::Indiv { c, .. } => {
                writeln!(f, "dT/dL (K/m) per antenna:")?;
                for (ant, c) in c.iter().enumerate() {
                    write!(f, "{ant:>4}")?;
                    write_coeffs(f, c)?;
                    writeln!(f)?;
                }
            }
            CoeffSet::Interpolated(snapshots) => {
                writeln!(f, "dT/dL (K/m) and errors by time:")?;
                for s in snapshots {
                    write!(f, "{:>14.2}", s.time)?;
                    write_coeffs(f, &s.c)?;
                    write!(f, " |")?;
                    write_coeffs(f, &s.c_err)?;
                    writeln!(f)?;
                }
            }
        }
        if self.mask != [true; NUM_CHANNELS] {
            writeln!(f, "channel mask: {:?}", self.mask)?;
        }
        if self.scale != 1. {
            writeln!(f, "scale: {}", self.scale)?;
        }
        Ok(())
    }
}
