//! Atmospheric radiative transfer for the WVR band.
//!
//! The atmosphere is built from [`Column`]s (one species each) held in
//! [`Slice`]s at fixed temperature and pressure. A [`Layer`] stacks slices
//! over a pressure drop. Propagating an [`RtResult`] through slices, far to
//! near, gives the sky brightness seen from the ground.

mod column;
mod core;
pub mod liquid_cloud;
mod slice;
pub mod water_vapor;

#[cfg(test)]
mod tests;

pub use self::column::{Column, LineShape, OpacityLaw, PowerLaw};
pub use self::core::{planck, rj_brightness, RtResult, C, H, K_B, T_CMB};
pub use self::slice::{Layer, Slice, LAYER_STEP};

/// Propagate `background` through `slices` in order (far to near).
pub fn propagate<'a>(
    background: RtResult,
    slices: impl IntoIterator<Item = &'a Slice>,
    columns: &[Column],
) -> RtResult {
    slices
        .into_iter()
        .fold(background, |result, slice| result.through(slice, columns))
}

/// Conversion from water column to non-dispersive path.
///
/// For a precipitable water column `n` in mm at temperature `t` in K, return
/// the excess path in m, following the wet term of Smith-Weintraub.
pub fn water_to_path(n: f64, t: f64) -> f64 {
    /// Wet refractivity constant giving path in m for 1 mm of water at 1 K
    const WET_PATH: f64 = 1.763;
    WET_PATH * n / t
}
