//! Dispersive correction to the path-to-phase conversion.
//!
//! The table is a two-column text resource, frequency in GHz then the
//! fractional dispersive excess, separated by commas or whitespace. Lines
//! starting with `#` are comments.

#[cfg(test)]
mod tests;

use std::path::Path;

use csv::{ReaderBuilder, Trim};
use log::debug;

use crate::error::ConfigError;

/// Dispersion factor as a function of frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct DispersionTable {
    freq: Vec<f64>,
    factor: Vec<f64>,
}

impl DispersionTable {
    /// A table from `(frequency GHz, factor)` pairs in any order.
    pub fn new(mut rows: Vec<(f64, f64)>) -> Result<Self, String> {
        if rows.is_empty() {
            return Err("no rows".to_string());
        }
        if rows.iter().any(|(f, x)| !f.is_finite() || !x.is_finite()) {
            return Err("non-finite value".to_string());
        }
        rows.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (freq, factor) = rows.into_iter().unzip();
        Ok(Self { freq, factor })
    }

    /// Read a table from `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let malformed = |reason: String| ConfigError::MalformedResource {
            path: path.to_path_buf(),
            reason,
        };

        let text = std::fs::read_to_string(path)?;
        let delimiter = if text.contains(',') { b',' } else { b' ' };
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .trim(Trim::All)
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for (row_no, record) in reader.records().enumerate() {
            let record = record.map_err(|e| malformed(e.to_string()))?;
            // repeated spaces give empty fields
            let fields: Vec<&str> = record.iter().filter(|f| !f.is_empty()).collect();
            if fields.is_empty() {
                continue;
            }
            let [freq, factor] = fields[..] else {
                return Err(malformed(format!(
                    "row {row_no} has {} columns, expected 2",
                    fields.len()
                )));
            };
            let parse = |s: &str| {
                s.parse::<f64>()
                    .map_err(|e| malformed(format!("row {row_no}: {s:?}: {e}")))
            };
            rows.push((parse(freq)?, parse(factor)?));
        }

        let table = Self::new(rows).map_err(malformed)?;
        debug!(
            "read {} dispersion rows from {}",
            table.freq.len(),
            path.display()
        );
        Ok(table)
    }

    /// Linearly interpolated factor at `freq` GHz, flat beyond the table.
    pub fn lookup(&self, freq: f64) -> f64 {
        let n = self.freq.len();
        if freq <= self.freq[0] {
            return self.factor[0];
        }
        if freq >= self.freq[n - 1] {
            return self.factor[n - 1];
        }
        let hi = self.freq.partition_point(|&f| f <= freq);
        let lo = hi - 1;
        let x = (freq - self.freq[lo]) / (self.freq[hi] - self.freq[lo]);
        self.factor[lo] + x * (self.factor[hi] - self.factor[lo])
    }
}
