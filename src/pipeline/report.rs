//! Per-antenna summary table.

use std::fmt;

/// State and statistics of one antenna.
#[derive(Debug, Clone, PartialEq)]
pub struct AntennaStatus {
    /// Antenna name
    pub name: String,
    /// Carries a radiometer
    pub has_wvr: bool,
    /// Flagged for this run
    pub flagged: bool,
    /// Flagged and couldn't be interpolated
    pub interp_impossible: bool,
    /// Path RMS, m
    pub rms: f64,
    /// Path discrepancy, m
    pub disc: f64,
}

/// Human-readable antenna report.
#[derive(Debug, Clone, PartialEq)]
pub struct AntennaReport {
    antennas: Vec<AntennaStatus>,
    problems: usize,
}

impl AntennaReport {
    /// A report over `antennas` with `problems` failed retrievals.
    pub fn new(antennas: Vec<AntennaStatus>, problems: usize) -> Self {
        Self { antennas, problems }
    }

    /// Per-antenna rows.
    pub fn antennas(&self) -> &[AntennaStatus] {
        &self.antennas
    }

    /// Number of failed retrievals.
    pub fn problems(&self) -> usize {
        self.problems
    }
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "Yes"
    } else {
        "No"
    }
}

impl fmt::Display for AntennaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .antennas
            .iter()
            .map(|a| a.name.len())
            .max()
            .unwrap_or(0)
            .max("Antenna".len());
        writeln!(
            f,
            "{:<width$}  {:>3}  {:>4}  {:>6}  {:>10}  {:>10}",
            "Antenna", "WVR", "Flag", "Interp", "RMS (um)", "Disc (um)"
        )?;
        for a in &self.antennas {
            let interp = if a.interp_impossible {
                "Failed"
            } else if a.flagged {
                "Yes"
            } else {
                "-"
            };
            writeln!(
                f,
                "{:<width$}  {:>3}  {:>4}  {:>6}  {:>10.1}  {:>10.1}",
                a.name,
                yes_no(a.has_wvr),
                yes_no(a.flagged),
                interp,
                a.rms * 1e6,
                a.disc * 1e6
            )?;
        }
        if self.problems > 0 {
            writeln!(f, "{} retrieval(s) had problems", self.problems)?;
        }
        Ok(())
    }
}
