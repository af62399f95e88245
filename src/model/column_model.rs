//! Atmospheric column models: brightness temperature spectra as a function
//! of water column, temperature, pressure and (optionally) cloud opacity.

use serde::{Deserialize, Serialize};

use crate::rtm::{
    propagate, Column, Layer, LineShape, OpacityLaw, PowerLaw, RtResult, Slice, T_CMB,
};

/// Index of the water line column.
const WATER_LINES: usize = 0;
/// Index of the water continuum column.
const WATER_CONTINUUM: usize = 1;
/// Index of the cloud column, when present.
const CLOUD: usize = 2;

/// How the water is distributed in pressure.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    /// All water in one slab at the model temperature and pressure
    #[default]
    Slice,
    /// Water spread evenly over a pressure drop (hPa) above the model
    /// pressure, in 5 hPa slices
    Layer {
        /// Pressure drop in hPa
        p_drop: f64,
    },
}

/// Which species the model carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Water vapour lines and continuum
    #[default]
    Water,
    /// Water vapour plus a liquid cloud continuum
    CloudyWater,
}

/// The physical state of the column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtmoState {
    /// Precipitable water column in mm
    pub n: f64,
    /// Temperature in K
    pub t: f64,
    /// Pressure in hPa
    pub p: f64,
    /// Cloud opacity at 183.31 GHz
    pub tau183: f64,
}

impl Default for AtmoState {
    fn default() -> Self {
        Self {
            n: 1.,
            t: 270.,
            p: 550.,
            tau183: 0.,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Body {
    Slice(Slice),
    Layer(Layer),
}

/// A single water-bearing body in front of the cosmic background.
///
/// The model owns its columns; slices refer to them by index. The frequency
/// grid is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnModel {
    kind: ModelKind,
    freq: Vec<f64>,
    columns: Vec<Column>,
    background: Slice,
    body: Body,
}

impl ColumnModel {
    /// A model on `freq` (GHz).
    pub fn new(freq: &[f64], kind: ModelKind, geometry: Geometry) -> Self {
        let mut columns = vec![
            Column::new(OpacityLaw::water_lines(LineShape::Gross)),
            Column::new(OpacityLaw::Continuum(PowerLaw::water_continuum())),
        ];
        if kind == ModelKind::CloudyWater {
            columns.push(Column::new(OpacityLaw::Cloud));
        }
        let indices: Vec<usize> = (0..columns.len()).collect();

        let state = AtmoState::default();
        let body = match geometry {
            Geometry::Slice => Body::Slice(Slice::new(state.t, state.p, &indices)),
            Geometry::Layer { p_drop } => {
                Body::Layer(Layer::new(state.t, state.p, p_drop, &indices))
            }
        };

        Self {
            kind,
            freq: freq.to_vec(),
            columns,
            background: Slice::opaque(T_CMB),
            body,
        }
    }

    /// Species carried.
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Frequency grid in GHz.
    pub fn freq(&self) -> &[f64] {
        &self.freq
    }

    /// Brightness temperature spectrum for `state`.
    pub fn brightness(&mut self, state: &AtmoState) -> Vec<f64> {
        self.set_state(state);
        let background = RtResult::dark(&self.freq).through(&self.background, &self.columns);
        let result = match &self.body {
            Body::Slice(slice) => background.through(slice, &self.columns),
            Body::Layer(layer) => propagate(background, layer.slices(), &self.columns),
        };
        result.brightness().to_vec()
    }

    fn set_state(&mut self, state: &AtmoState) {
        self.columns[WATER_LINES].n = state.n;
        self.columns[WATER_CONTINUUM].n = state.n;
        if let Some(cloud) = self.columns.get_mut(CLOUD) {
            cloud.n = state.tau183;
        }
        match &mut self.body {
            Body::Slice(slice) => {
                slice.t = state.t;
                slice.p = state.p;
            }
            Body::Layer(layer) => layer.set_base(state.t, state.p),
        }
    }
}
