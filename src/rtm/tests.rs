use approx::{assert_abs_diff_eq, assert_relative_eq};

use super::*;

fn grids() -> Vec<Vec<f64>> {
    vec![
        vec![183.31],
        vec![22.235, 90., 183.31, 325.15],
        (0..64).map(|i| 175. + 0.25 * i as f64).collect(),
    ]
}

#[test]
fn zero_opacity_reproduces_background() {
    let mut columns = vec![
        Column::new(OpacityLaw::water_lines(LineShape::Gross)),
        Column::new(OpacityLaw::Continuum(PowerLaw::water_continuum())),
    ];
    columns[0].n = 0.;
    columns[1].n = 0.;
    let slice = Slice::new(270., 550., &[0, 1]);

    for freq in grids() {
        let tran = slice.transmission(&columns, &freq);
        assert!(tran.iter().all(|&t| t == 1.));

        let background = RtResult::from_intensity(
            freq.clone(),
            freq.iter().map(|&f| planck(f, 40.)).collect(),
        );
        let expected = background.intensity().to_vec();
        let result = background.through(&slice, &columns);
        assert_eq!(result.intensity(), expected.as_slice());
    }
}

#[test]
fn opaque_slice_emits_black_body() {
    let freq = vec![180., 183.31, 190.];
    let result = RtResult::dark(&freq).through(&Slice::opaque(T_CMB), &[]);
    for (&f, &i) in freq.iter().zip(result.intensity()) {
        assert_relative_eq!(i, planck(f, T_CMB), max_relative = 1e-12);
    }
}

#[test]
fn thick_slab_brightness_near_physical_temperature() {
    let mut columns = vec![Column::new(OpacityLaw::Continuum(PowerLaw::grey(1.)))];
    columns[0].n = 50.;
    let freq = vec![183.31];
    let result = propagate(
        RtResult::dark(&freq),
        [&Slice::opaque(T_CMB), &Slice::new(270., 550., &[0])],
        &columns,
    );
    // Rayleigh-Jeans brightness of a black body is low by about hf/2k
    let offset = H * 183.31e9 / (2. * K_B);
    assert_abs_diff_eq!(result.brightness()[0], 270. - offset, epsilon = 0.05);
}

#[test]
fn lorentzian_is_symmetric() {
    let f0 = 183.3101;
    for df in [0.1, 1., 5.] {
        let lo = LineShape::Lorentzian.profile(f0 - df, f0, 1.5);
        let hi = LineShape::Lorentzian.profile(f0 + df, f0, 1.5);
        assert_relative_eq!(lo, hi, max_relative = 1e-12);
    }
}

#[test]
fn gross_line_symmetric_about_centre() {
    let law = OpacityLaw::Lines {
        shape: LineShape::Gross,
        lines: smallvec::smallvec![water_vapor::line_183()],
    };
    let f0 = water_vapor::line_183().f0;
    for df in [0.05, 0.5, 2.] {
        let lo = law.opacity(f0 - df, 270., 550.);
        let hi = law.opacity(f0 + df, 270., 550.);
        assert_relative_eq!(lo, hi, max_relative = 2e-2);
    }
    // and peaked at the centre
    assert!(law.opacity(f0, 270., 550.) > law.opacity(f0 + 1., 270., 550.));
}

#[test]
fn water_line_opacity_is_realistic() {
    let mut column = Column::new(OpacityLaw::water_lines(LineShape::Gross));
    column.n = 1.;
    let tau = column.tau(183.31, 270., 550.);
    assert!(tau > 0.5 && tau < 10., "tau = {tau}");
    // line wing is much weaker than the centre
    assert!(column.tau(175., 270., 550.) < 0.2 * tau);
}

#[test]
fn layer_scales_cover_the_drop() {
    let layer = Layer::new(270., 550., 22., &[0]);
    let slices = layer.slices();
    assert_eq!(slices.len(), 5);
    let total: f64 = slices.iter().map(|s| s.scale).sum();
    assert_abs_diff_eq!(total, 1., epsilon = 1e-12);
    // far to near: pressure increases and the last slice is nearest the base
    assert!(slices.windows(2).all(|w| w[0].p < w[1].p));
    assert!(slices.last().unwrap().p < 550.);
    assert!(slices[0].t < slices.last().unwrap().t);
}

#[test]
fn cloud_absorption_relative_to_reference() {
    assert_abs_diff_eq!(
        liquid_cloud::relative_absorption(liquid_cloud::CLOUD_REF_FREQ, 270.),
        1.,
        epsilon = 1e-12
    );
    assert!(liquid_cloud::relative_absorption(90., 270.) < 1.);
    assert!(liquid_cloud::rayleigh_absorption(183.31, 270.) > 0.);
}

#[test]
fn water_path_conversion() {
    assert_abs_diff_eq!(water_to_path(1., 270.), 6.53e-3, epsilon = 1e-5);
    assert_eq!(water_to_path(0., 270.), 0.);
}
