//! Antenna neighbourhoods for interpolating flagged antennas.

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;

use crate::error::DataError;

/// A set of antenna indices.
pub type AntSet = BTreeSet<usize>;

/// `(weight, antenna)` pairs.
pub type AntSetWeight = Vec<(f64, usize)>;

/// Antenna positions, metres, one `[x, y, z]` per antenna.
pub type AntPositions = [[f64; 3]];

fn check_antenna(pos: &AntPositions, i: usize) -> Result<(), DataError> {
    if i < pos.len() {
        Ok(())
    } else {
        Err(DataError::NoSuchAntenna {
            antenna: i,
            num_antennas: pos.len(),
        })
    }
}

/// Distance from antenna `i` to every other antenna not in `flagged`,
/// nearest first, as `(distance, antenna)`.
pub fn ants_dist(
    pos: &AntPositions,
    i: usize,
    flagged: &AntSet,
) -> Result<Vec<(f64, usize)>, DataError> {
    check_antenna(pos, i)?;
    let [x, y, z] = pos[i];
    let mut dist: Vec<(f64, usize)> = pos
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != i && !flagged.contains(&j))
        .map(|(j, p)| {
            let d = ((p[0] - x).powi(2) + (p[1] - y).powi(2) + (p[2] - z).powi(2)).sqrt();
            (d, j)
        })
        .collect();
    dist.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(dist)
}

/// As [`ants_dist`] but only antennas within `max_dist` metres.
pub fn ants_dist_within(
    pos: &AntPositions,
    i: usize,
    flagged: &AntSet,
    max_dist: f64,
) -> Result<Vec<(f64, usize)>, DataError> {
    let mut dist = ants_dist(pos, i, flagged)?;
    dist.retain(|&(d, _)| d <= max_dist);
    Ok(dist)
}

/// The `n` nearest usable neighbours of antenna `i`.
pub fn nearest_ants(
    pos: &AntPositions,
    i: usize,
    flagged: &AntSet,
    n: usize,
) -> Result<AntSet, DataError> {
    Ok(ants_dist(pos, i, flagged)?
        .into_iter()
        .take(n)
        .map(|(_, j)| j)
        .collect())
}

/// Weights for the first `n` entries of a distance list.
///
/// Each weight is the neighbour's distance over the sum of exactly these
/// distances. Neighbours that all sit on top of antenna `i` share the
/// weight equally.
fn distance_weights(dist: &[(f64, usize)], n: usize) -> AntSetWeight {
    let used = &dist[..n.min(dist.len())];
    let total: f64 = used.iter().map(|&(d, _)| d).sum();
    if total > 0. {
        used.iter().map(|&(d, j)| (d / total, j)).collect()
    } else {
        let uniform = 1. / used.len() as f64;
        used.iter().map(|&(_, j)| (uniform, j)).collect()
    }
}

/// The `n` nearest usable neighbours of antenna `i` with distance weights.
pub fn weighted_ants(
    pos: &AntPositions,
    i: usize,
    flagged: &AntSet,
    n: usize,
) -> Result<AntSetWeight, DataError> {
    Ok(distance_weights(&ants_dist(pos, i, flagged)?, n))
}

/// Distance-weighted neighbours within `max_dist`.
///
/// Fails when fewer than `min_n` neighbours are inside the cap.
pub fn weighted_ants_within(
    pos: &AntPositions,
    i: usize,
    flagged: &AntSet,
    n: usize,
    max_dist: f64,
    min_n: usize,
) -> Result<AntSetWeight, DataError> {
    let dist = ants_dist_within(pos, i, flagged, max_dist)?;
    if dist.len() < min_n {
        return Err(DataError::TooFewNeighbours {
            antenna: i,
            found: dist.len(),
            required: min_n,
        });
    }
    Ok(distance_weights(&dist, n))
}
