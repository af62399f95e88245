//! Water vapor line catalogue.
//!
//! Line parameters follow Rosenkranz, Radio Science v.33, pp.919-928 (1998),
//! restricted to what a slab model needs: the line centre, its integrated
//! strength at 300 K with temperature coefficient, and the air-broadened
//! half-width with its temperature exponent.

use std::sync::OnceLock;

/// Number of lines in the catalogue.
pub(crate) const NLINES: usize = 15;

/// Molecules per m² in 1 mm of precipitable water: `1 kg m⁻² / M_H2O * N_A`.
pub(crate) const MOLECULES_PER_MM: f64 = 3.3428e25;

/// One resonant water line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterLine {
    /// Centre frequency in GHz.
    pub f0: f64,
    /// Integrated line strength at 300 K, in m² GHz per molecule.
    pub s300: f64,
    /// Temperature coefficient of the strength (`b2` in Rosenkranz).
    pub strength_exp: f64,
    /// Air-broadened half width at 300 K, in GHz/kPa.
    pub width: f64,
    /// Temperature exponent of the width.
    pub width_exp: f64,
}

impl WaterLine {
    /// Line strength at temperature `t` (K), in m² GHz per molecule.
    pub fn strength(&self, t: f64) -> f64 {
        let theta = 300. / t;
        self.s300 * theta.powf(2.5) * f64::exp(self.strength_exp * (1. - theta))
    }

    /// Pressure-broadened half width in GHz at temperature `t` (K) and
    /// pressure `p` (hPa).
    pub fn half_width(&self, t: f64, p: f64) -> f64 {
        let theta = 300. / t;
        self.width * (0.1 * p) * theta.powf(self.width_exp)
    }
}

/// The full line catalogue, built once.
pub fn water_lines() -> &'static [WaterLine; NLINES] {
    static LINES: OnceLock<[WaterLine; NLINES]> = OnceLock::new();
    LINES.get_or_init(build_lines)
}

/// Only the 183.31 GHz line, which dominates the WVR band.
pub fn line_183() -> WaterLine {
    water_lines()[1]
}

#[allow(clippy::excessive_precision)]
fn build_lines() -> [WaterLine; NLINES] {
    // centre frequency (GHz), strength at 300 K (Hz cm²), strength
    // t-coefficient, air width (GHz/kPa), width t-exponent
    const TABLE: [(f64, f64, f64, f64, f64); NLINES] = [
        (22.2351, 0.1310e-13, 2.144, 0.0281 / 1.040, 0.69),
        (183.3101, 0.2273e-11, 0.668, 0.0281, 0.64),
        (321.2256, 0.8036e-13, 6.179, 0.0230, 0.67),
        (325.1529, 0.2694e-11, 1.541, 0.0278, 0.68),
        (380.1974, 0.2438e-10, 1.048, 0.0287, 0.54),
        (439.1508, 0.2179e-11, 3.595, 0.0210, 0.63),
        (443.0183, 0.4624e-12, 5.048, 0.0186, 0.60),
        (448.0011, 0.2562e-10, 1.405, 0.0263, 0.66),
        (470.8890, 0.8369e-12, 3.597, 0.0215, 0.66),
        (474.6891, 0.3263e-11, 2.379, 0.0236, 0.65),
        (488.4911, 0.6659e-12, 2.852, 0.0260, 0.69),
        (556.9360, 0.1531e-08, 0.159, 0.0321, 0.69),
        (620.7008, 0.1707e-10, 2.391, 0.0244, 0.71),
        (752.0332, 0.1011e-08, 0.396, 0.0306, 0.68),
        (916.1712, 0.4227e-10, 1.441, 0.0267, 0.70),
    ];

    // Hz cm² -> GHz m²
    const STRENGTH_SCALE: f64 = 1e-4 * 1e-9;

    TABLE.map(|(f0, s, strength_exp, width, width_exp)| WaterLine {
        f0,
        s300: s * STRENGTH_SCALE,
        strength_exp,
        width,
        width_exp,
    })
}
