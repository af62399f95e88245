use std::collections::BTreeSet;

use approx::assert_abs_diff_eq;

use super::*;
use crate::{
    array_data::{InterpArrayData, RowInfo},
    error::{DataError, ModelError, SamplerError},
    rtm::water_to_path,
};

/// A quick configuration: narrow priors and a 20³ grid.
fn config() -> RetrievalConfig {
    RetrievalConfig {
        water_prior: (0.4, 2.4),
        temperature_prior: (260., 280.),
        pressure_prior: (500., 600.),
        n_samples: 8000,
        num_threads: Some(2),
        ..RetrievalConfig::default()
    }
}

/// What the radiometer sees through `n` mm of water at 270 K and 550 hPa.
fn synthetic_tobs(n: f64) -> Coeffs {
    let config = config();
    let mut model = Coupled::new(
        WaterModel::new(alma_wvr(), config.model, config.geometry),
        config.coupling,
        config.t_term,
    );
    model.set(Param::Water, n).unwrap();
    model.set(Param::Temperature, 270.).unwrap();
    model.set(Param::Pressure, 550.).unwrap();
    let tb = model.eval();
    [tb[0], tb[1], tb[2], tb[3]]
}

fn input(time: f64, tobs: Coeffs) -> AbsInput {
    AbsInput {
        antno: 0,
        tobs,
        el: 1.,
        time,
        state: 0,
        source: 0,
    }
}

#[derive(Debug)]
struct Bump {
    priors: Vec<FlatPrior>,
}

impl Problem for Bump {
    fn priors(&self) -> &[FlatPrior] {
        &self.priors
    }

    fn nll_at(&mut self, point: &[f64]) -> Result<f64, SamplerError> {
        Ok((point[0] - 0.3).powi(2) / (2. * 0.05f64.powi(2)))
    }
}

#[test]
fn grid_sampler_integrates_gaussian() {
    let mut bump = Bump {
        priors: vec![FlatPrior {
            param: Param::Water,
            lo: 0.,
            hi: 1.,
        }],
    };
    let posterior = GridSampler.run(&mut bump, 0, 1000).unwrap();
    assert_eq!(posterior.points.len(), 1000);

    let total: f64 = posterior.points.iter().map(|p| p.weight).sum();
    assert_abs_diff_eq!(total, 1., epsilon = 1e-12);
    let mean: f64 = posterior
        .points
        .iter()
        .map(|p| p.weight * p.params[0])
        .sum();
    assert_abs_diff_eq!(mean, 0.3, epsilon = 1e-6);

    // ∫ exp(-nll) dx over a unit prior = σ√(2π)
    let expected = (0.05 * (2. * std::f64::consts::PI).sqrt()).ln();
    assert_abs_diff_eq!(posterior.log_evidence, expected, epsilon = 1e-3);
}

#[test]
fn grid_sampler_rejects_bad_priors() {
    let mut none = Bump { priors: vec![] };
    assert_eq!(
        GridSampler.run(&mut none, 0, 100),
        Err(SamplerError::NoPriors)
    );

    let mut inverted = Bump {
        priors: vec![FlatPrior {
            param: Param::Water,
            lo: 1.,
            hi: 0.,
        }],
    };
    assert!(matches!(
        GridSampler.run(&mut inverted, 0, 100),
        Err(SamplerError::BadPrior { .. })
    ));
}

/// Brightness linear in the water column, `T_ch = a_ch n`.
#[derive(Debug)]
struct Linear {
    a: Vec<f64>,
    n: f64,
    t: Option<f64>,
}

impl QuantityModel for Linear {
    fn num_channels(&self) -> usize {
        self.a.len()
    }

    fn params(&self) -> Vec<Param> {
        vec![Param::Water]
    }

    fn get(&self, param: Param) -> Result<f64, ModelError> {
        match (param, self.t) {
            (Param::Water, _) => Ok(self.n),
            (Param::Temperature, Some(t)) => Ok(t),
            _ => Err(ModelError::UnknownParam(param)),
        }
    }

    fn set(&mut self, param: Param, value: f64) -> Result<(), ModelError> {
        match param {
            Param::Water => {
                self.n = value;
                Ok(())
            }
            _ => Err(ModelError::UnknownParam(param)),
        }
    }

    fn eval(&mut self) -> Vec<f64> {
        self.a.iter().map(|a| a * self.n).collect()
    }

    fn dtdn(&mut self) -> Vec<f64> {
        self.a.clone()
    }

    fn dtdn2(&mut self) -> Vec<f64> {
        vec![0.; self.a.len()]
    }
}

fn linear_likelihood(t: Option<f64>) -> NormalLikelihood<Linear> {
    let model = Linear {
        a: vec![2., 4.],
        n: 0.,
        t,
    };
    let mut likelihood = NormalLikelihood::new(model, &[3., 5.], &[0.5, 1.]);
    likelihood.add_prior(Param::Water, 0., 5.).unwrap();
    likelihood
}

#[test]
fn likelihood_adds_derivative_term() {
    use std::f64::consts::PI;
    let term =
        |o: f64, m: f64, s: f64| (o - m).powi(2) / (2. * s * s) + 0.5 * (2. * PI * s * s).ln();

    // n = 1 gives T = [2, 4]
    let brightness = term(3., 2., 0.5) + term(5., 4., 1.);
    let mut plain = linear_likelihood(Some(280.));
    assert_abs_diff_eq!(plain.nll_at(&[1.]).unwrap(), brightness, epsilon = 1e-12);

    let per_m = 1. / water_to_path(1., 280.);
    let dtdl = [2. * per_m, 4. * per_m];
    let derivs = term(600., dtdl[0], 100.) + term(700., dtdl[1], 50.);
    let mut both = linear_likelihood(Some(280.)).with_derivatives(&[600., 700.], &[100., 50.]);
    assert_abs_diff_eq!(
        both.nll_at(&[1.]).unwrap(),
        brightness + derivs,
        epsilon = 1e-9
    );
}

#[test]
fn likelihood_without_dtdl_is_infinite() {
    // no temperature, so dT/dL can't be formed
    let mut plain = linear_likelihood(None);
    assert!(plain.nll_at(&[1.]).unwrap().is_finite());

    let mut both = linear_likelihood(None).with_derivatives(&[600., 700.], &[100., 50.]);
    assert_eq!(both.nll_at(&[1.]).unwrap(), f64::INFINITY);
}

#[test]
fn recovers_water_column() {
    let result = retrieve_row(&input(0., synthetic_tobs(1.2)), &config(), &GridSampler).unwrap();
    assert!((result.c - 1.2).abs() < 0.15, "retrieved {}", result.c);
    assert!(result.c_err.is_finite());
    assert!(result.ev.is_finite());
    assert!(result.tau183.is_none());
    for ch in 0..NUM_CHANNELS {
        assert!(result.dtdl[ch] > 0., "{:?}", result.dtdl);
        assert!(result.dtdl_err[ch].is_finite());
        assert!(result.dtdl2[ch].is_finite());
    }
}

#[test]
fn out_of_range_brightness() {
    let mut tobs = synthetic_tobs(1.);
    tobs[2] = 400.;
    assert_eq!(
        retrieve_row(&input(0., tobs), &config(), &GridSampler),
        Err(RetrievalError::TemperatureRange {
            channel: 2,
            value: 400.,
            min: T_MIN,
            max: T_MAX
        })
    );

    tobs[2] = 1.;
    assert!(matches!(
        retrieve_row(&input(0., tobs), &config(), &GridSampler),
        Err(RetrievalError::TemperatureRange { channel: 2, .. })
    ));
}

#[test]
fn batch_keeps_order_and_sets_problems_aside() {
    let inputs = vec![
        input(10., synthetic_tobs(0.8)),
        input(20., [500.; 4]),
        input(30., synthetic_tobs(1.2)),
        input(40., synthetic_tobs(1.6)),
    ];
    let batch = retrieve_all(&inputs, &config(), &GridSampler).unwrap();
    let times: Vec<f64> = batch.inputs.iter().map(|i| i.time).collect();
    assert_eq!(times, vec![10., 30., 40.]);
    assert_eq!(batch.results.len(), 3);
    assert!(batch.results.windows(2).all(|w| w[0].c < w[1].c));
    assert_eq!(batch.problems.len(), 1);
    assert_eq!(batch.problems[0].0.time, 20.);
}

#[test]
fn batch_failures() {
    assert_eq!(
        retrieve_all(&[], &config(), &GridSampler),
        Err(RetrievalError::NoInputs)
    );
    let inputs = vec![input(0., [1.; 4]), input(1., [400.; 4])];
    assert_eq!(
        retrieve_all(&inputs, &config(), &GridSampler),
        Err(RetrievalError::AllRowsFailed(2))
    );
}

fn store() -> InterpArrayData {
    let rows: Vec<RowInfo> = (0..10)
        .map(|i| RowInfo {
            time: i as f64,
            el: 0.9,
            az: 0.,
            state: i % 2,
            field: 0,
            source: 0,
        })
        .collect();
    let mut data = InterpArrayData::new(&rows, 2);
    for i in 0..10 {
        data.set_tobs(i, 1, &[100. + i as f64; 4]);
    }
    data
}

#[test]
fn row_selection() {
    let data = store();
    let even = BTreeSet::from([0]);

    let single = inputs::single_midpoint(&data, 1, &even).unwrap();
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].time, 4.);
    assert_eq!(single[0].tobs, [104.; 4]);
    assert_eq!(single[0].antno, 1);

    let uniform = inputs::multiple_uniform(&data, 1, &even, 2).unwrap();
    let times: Vec<f64> = uniform.iter().map(|i| i.time).collect();
    assert_eq!(times, vec![2., 6.]);

    // asking for more rows than exist gives each good row once
    let uniform = inputs::multiple_uniform(&data, 1, &even, 50).unwrap();
    assert_eq!(uniform.len(), 5);

    let mids =
        inputs::field_midpoints(&data, 1, &BTreeSet::new(), &[(0., 3.), (4., 9.), (20., 30.)])
            .unwrap();
    let times: Vec<f64> = mids.iter().map(|i| i.time).collect();
    assert_eq!(times, vec![1., 6.]);
}

#[test]
fn row_selection_errors() {
    let data = store();
    assert!(matches!(
        inputs::single_midpoint(&data, 2, &BTreeSet::new()),
        Err(DataError::NoSuchAntenna { .. })
    ));
    assert_eq!(
        inputs::single_midpoint(&data, 0, &BTreeSet::from([7])),
        Err(DataError::NoGoodStates)
    );
}
