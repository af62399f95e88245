use approx::{assert_abs_diff_eq, assert_relative_eq};

use super::numdiff::{central, central_scalar, Order};
use super::*;
use crate::{error::ModelError, radiometer::alma_wvr, rtm::water_to_path};

fn water_model() -> WaterModel {
    WaterModel::new(alma_wvr(), ModelKind::Water, Geometry::Slice)
}

#[test]
fn central_difference_orders() {
    let d1 = central_scalar(Order::First, 2., 1e-3, |x| x.powi(3));
    assert_abs_diff_eq!(d1, 12., epsilon = 1e-5);
    let d2 = central_scalar(Order::Second, 2., 1e-3, |x| x.powi(3));
    assert_abs_diff_eq!(d2, 12., epsilon = 1e-4);

    let both = central(Order::First, 1., 1e-4, |x| vec![x.sin(), x.exp()]);
    assert_abs_diff_eq!(both[0], 1f64.cos(), epsilon = 1e-7);
    assert_abs_diff_eq!(both[1], 1f64.exp(), epsilon = 1e-7);
}

#[test]
fn brightness_is_ordered_by_distance_from_line() {
    let mut model = water_model();
    model.set(Param::Water, 1.).unwrap();
    let tb = model.eval();
    assert_eq!(tb.len(), 4);
    assert!(tb.windows(2).all(|w| w[0] > w[1]), "{tb:?}");
    assert!(tb.iter().all(|&t| t > 2.7 && t < 270.));
}

#[test]
fn water_derivative_matches_secant() {
    let mut model = water_model();
    model.set(Param::Water, 1.5).unwrap();
    let dtdn = model.dtdn();

    let delta = 1e-2;
    let base = model.eval();
    model.set(Param::Water, 1.5 + delta).unwrap();
    let bumped = model.eval();
    model.set(Param::Water, 1.5).unwrap();
    let d2 = model.dtdn2();

    for ch in 0..4 {
        assert!(dtdn[ch] > 0.);
        // secant has first-order truncation error 0.5 * d2 * delta
        let secant = (bumped[ch] - base[ch]) / delta;
        let corrected = secant - 0.5 * d2[ch] * delta;
        assert_relative_eq!(dtdn[ch], corrected, max_relative = 1e-3);
        assert_relative_eq!(dtdn[ch], secant, max_relative = 5e-2);
    }
}

#[test]
fn path_derivative_uses_water_conversion() {
    let mut model = water_model();
    model.set(Param::Temperature, 260.).unwrap();
    let dtdn = model.dtdn();
    let dtdl = model.dtdl().unwrap();
    let per_mm = water_to_path(1., 260.);
    for (n, l) in dtdn.iter().zip(&dtdl) {
        assert_relative_eq!(*l, n / per_mm, max_relative = 1e-12);
    }
}

#[test]
fn coupling_scales_brightness_and_derivatives() {
    let mut plain = water_model();
    let tb = plain.eval();
    let dtdn = plain.dtdn();

    let mut coupled = Coupled::new(water_model(), 0.98, 275.);
    let tb_c = coupled.eval();
    let dtdn_c = coupled.dtdn();
    for ch in 0..4 {
        assert_relative_eq!(tb_c[ch], 0.98 * tb[ch] + 0.02 * 275., max_relative = 1e-12);
        assert_relative_eq!(dtdn_c[ch], 0.98 * dtdn[ch], max_relative = 1e-12);
    }

    assert_eq!(
        coupled.params(),
        vec![
            Param::Water,
            Param::Temperature,
            Param::Pressure,
            Param::Coupling,
            Param::TermTemp
        ]
    );
    coupled.set(Param::Coupling, 1.).unwrap();
    assert_relative_eq!(coupled.eval()[2], tb[2], max_relative = 1e-12);
}

#[test]
fn absolute_calibration_is_affine() {
    let mut plain = water_model();
    let tb = plain.eval();
    let dtdn = plain.dtdn();

    let mut cal = AbsCalibrated::new(water_model());
    cal.set(Param::CalScale(1), 1.1).unwrap();
    cal.set(Param::CalZero(1), -2.).unwrap();
    let tb_cal = cal.eval();
    assert_relative_eq!(tb_cal[0], tb[0], max_relative = 1e-12);
    assert_relative_eq!(tb_cal[1], 1.1 * tb[1] - 2., max_relative = 1e-12);
    assert_relative_eq!(cal.dtdn()[1], 1.1 * dtdn[1], max_relative = 1e-12);

    assert_eq!(cal.params().len(), 3 + 8);
    assert_eq!(
        cal.set(Param::CalZero(4), 0.),
        Err(ModelError::NoSuchChannel {
            channel: 4,
            num_channels: 4
        })
    );
}

#[test]
fn zenith_scaling_uses_line_of_sight_column() {
    let za = 60f64.to_radians();
    let mut zenith = ZenithScaled::new(water_model(), za).unwrap();
    zenith.set(Param::Water, 1.).unwrap();
    assert_eq!(zenith.get(Param::Water).unwrap(), 1.);

    let mut plain = water_model();
    plain.set(Param::Water, 2.).unwrap();
    let tb = plain.eval();
    let dtdn = plain.dtdn();

    let tb_z = zenith.eval();
    let dtdn_z = zenith.dtdn();
    for ch in 0..4 {
        assert_relative_eq!(tb_z[ch], tb[ch], max_relative = 1e-9);
        assert_relative_eq!(dtdn_z[ch], 2. * dtdn[ch], max_relative = 1e-6);
    }
    assert_eq!(zenith.params().last(), Some(&Param::ZenithAngle));
}

#[test]
fn cloudy_model_has_cloud_parameter() {
    let mut cloudy = WaterModel::new(alma_wvr(), ModelKind::CloudyWater, Geometry::Slice);
    assert!(cloudy.params().contains(&Param::CloudTau));
    let clear = cloudy.eval();
    cloudy.set(Param::CloudTau, 0.1).unwrap();
    let with_cloud = cloudy.eval();
    assert!(with_cloud.iter().zip(&clear).all(|(c, w)| c > w));
    assert!(cloudy.dtdtau().unwrap().iter().all(|&d| d > 0.));

    let mut plain = water_model();
    assert_eq!(
        plain.set(Param::CloudTau, 0.1),
        Err(ModelError::UnknownParam(Param::CloudTau))
    );
    assert!(plain.dtdtau().is_err());
}

#[test]
fn thin_layer_matches_slice() {
    let mut slice = water_model();
    let mut layer = WaterModel::new(alma_wvr(), ModelKind::Water, Geometry::Layer { p_drop: 0. });
    for (s, l) in slice.eval().iter().zip(layer.eval()) {
        assert_relative_eq!(*s, l, max_relative = 1e-12);
    }

    let mut thick = WaterModel::new(
        alma_wvr(),
        ModelKind::Water,
        Geometry::Layer { p_drop: 100. },
    );
    let tb = thick.eval();
    assert!(tb.iter().all(|t| t.is_finite() && *t < 270.));
    assert_ne!(tb, slice.eval());
}
