//! Slabs of atmosphere at fixed temperature and pressure.

use smallvec::SmallVec;

use super::Column;

/// Nominal pressure step between the slices of a [`Layer`], in hPa.
pub const LAYER_STEP: f64 = 5.;

/// Exponent of `P/P_base` giving the temperature for a 6.5 K/km lapse rate,
/// `Γ R_dry / g`.
const LAPSE_EXPONENT: f64 = 0.19;

/// A slab at one temperature and pressure.
///
/// The columns are referenced by index into the column set owned by the
/// enclosing model.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    /// Physical temperature in K
    pub t: f64,
    /// Pressure in hPa
    pub p: f64,
    /// Fraction of each column's density held by this slice
    pub scale: f64,
    columns: SmallVec<[usize; 4]>,
    opaque: bool,
}

impl Slice {
    /// A slab holding the columns at indices `columns`.
    pub fn new(t: f64, p: f64, columns: &[usize]) -> Self {
        Self {
            t,
            p,
            scale: 1.,
            columns: SmallVec::from_slice(columns),
            opaque: false,
        }
    }

    /// A slab that transmits nothing and emits as a black body at `t`.
    pub fn opaque(t: f64) -> Self {
        Self {
            t,
            p: 0.,
            scale: 1.,
            columns: SmallVec::new(),
            opaque: true,
        }
    }

    /// Indices of the columns in this slice.
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    /// Total opacity per frequency.
    pub fn tau(&self, columns: &[Column], freq: &[f64]) -> Vec<f64> {
        freq.iter()
            .map(|&f| {
                self.columns
                    .iter()
                    .map(|&i| columns[i].tau(f, self.t, self.p))
                    .sum::<f64>()
                    * self.scale
            })
            .collect()
    }

    /// Transmission per frequency, `exp(-tau)`.
    pub fn transmission(&self, columns: &[Column], freq: &[f64]) -> Vec<f64> {
        if self.opaque {
            return vec![0.; freq.len()];
        }
        self.tau(columns, freq)
            .into_iter()
            .map(|tau| f64::exp(-tau))
            .collect()
    }
}

/// A stack of slices discretising a pressure drop.
///
/// Slices are ordered far to near: the first one sits at the top of the
/// layer, the last one at the base pressure.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    t_base: f64,
    p_base: f64,
    p_drop: f64,
    columns: SmallVec<[usize; 4]>,
    slices: Vec<Slice>,
}

impl Layer {
    /// A layer from `p_base` up to `p_base - p_drop` (hPa).
    pub fn new(t_base: f64, p_base: f64, p_drop: f64, columns: &[usize]) -> Self {
        let mut layer = Self {
            t_base,
            p_base,
            p_drop,
            columns: SmallVec::from_slice(columns),
            slices: Vec::new(),
        };
        layer.rebuild();
        layer
    }

    /// Move the layer base, re-deriving every slice.
    pub fn set_base(&mut self, t_base: f64, p_base: f64) {
        self.t_base = t_base;
        self.p_base = p_base;
        self.rebuild();
    }

    /// Base temperature in K.
    pub fn t_base(&self) -> f64 {
        self.t_base
    }

    /// Base pressure in hPa.
    pub fn p_base(&self) -> f64 {
        self.p_base
    }

    /// Slices, far to near.
    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    fn rebuild(&mut self) {
        let p_drop = self.p_drop.clamp(0., self.p_base);
        let num_steps = ((p_drop / LAYER_STEP).ceil() as usize).max(1);

        // Walk up from the base, each slice sitting at the mid pressure of
        // its step
        let mut slices: Vec<Slice> = (0..num_steps)
            .map(|i| {
                let bottom = self.p_base - LAYER_STEP * i as f64;
                let step = if i + 1 == num_steps {
                    p_drop - LAYER_STEP * i as f64
                } else {
                    LAYER_STEP
                };
                let p = bottom - 0.5 * step;
                let t = self.t_base * (p / self.p_base).powf(LAPSE_EXPONENT);

                let mut slice = Slice::new(t, p, &self.columns);
                slice.scale = if p_drop > 0. { step / p_drop } else { 1. };
                slice
            })
            .collect();
        slices.reverse();
        self.slices = slices;
    }
}
