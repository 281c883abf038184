//! Integration tests for hbvcal-efficiency.

use approx::assert_relative_eq;
use hbvcal_efficiency::{EfficiencyConfig, EfficiencyEngine, EfficiencyError, Metric};

fn hydrograph() -> Vec<f64> {
    (0..120)
        .map(|t| {
            let x = t as f64;
            5.0 + 3.0 * (x / 9.0).sin() + 0.02 * x + if t % 17 == 0 { 6.0 } else { 0.0 }
        })
        .collect()
}

fn all_metrics() -> EfficiencyConfig {
    EfficiencyConfig::new().with_metrics(&Metric::ALL)
}

#[test]
fn identical_simulation_scores_one() {
    let reference = hydrograph();
    let mut engine = EfficiencyEngine::from_series(&reference, all_metrics()).unwrap();
    engine.set_sim_series(&reference).unwrap();

    let all = engine.get_all().unwrap();
    assert_eq!(all.len(), Metric::ALL.len());
    for metric in [Metric::Ns, Metric::Lns, Metric::Kg, Metric::Pc, Metric::Sc, Metric::NsDc] {
        assert_relative_eq!(all[&metric][0], 1.0, epsilon = 1e-12);
    }
    assert_relative_eq!(all[&Metric::Sp][0], 1.0, epsilon = 1e-12);
}

#[test]
fn identical_simulation_with_gaps_scores_one() {
    let mut reference = hydrograph();
    for t in (0..reference.len()).step_by(7) {
        reference[t] = f64::NAN;
    }
    let sim: Vec<f64> = reference
        .iter()
        .map(|&v| if v.is_nan() { 123.0 } else { v })
        .collect();

    let config = EfficiencyConfig::new().with_metrics(&[Metric::Ns, Metric::Pc, Metric::NsDc]);
    let mut engine = EfficiencyEngine::from_series(&reference, config).unwrap();
    engine.set_sim_series(&sim).unwrap();
    for values in engine.get_all().unwrap().values() {
        assert_relative_eq!(values[0], 1.0, epsilon = 1e-12);
    }
}

#[test]
fn constant_reference_is_degenerate_for_ns() {
    let config = EfficiencyConfig::new().with_metric(Metric::Ns);
    let err = EfficiencyEngine::from_series(&[2.0; 30], config).unwrap_err();
    assert!(matches!(
        err,
        EfficiencyError::DegenerateReference {
            metric: Metric::Ns,
            column: 0,
            ..
        }
    ));
}

#[test]
fn constant_reference_is_degenerate_for_kg() {
    let config = EfficiencyConfig::new().with_metric(Metric::Kg);
    assert!(EfficiencyEngine::from_series(&[2.0; 30], config).is_err());
}

#[test]
fn no_metrics_is_configuration_error() {
    let err = EfficiencyEngine::from_series(&hydrograph(), EfficiencyConfig::new()).unwrap_err();
    assert!(matches!(err, EfficiencyError::Configuration { .. }));
}

#[test]
fn unselected_metrics_absent() {
    let config = EfficiencyConfig::new().with_metrics(&[Metric::Ns, Metric::Sc]);
    let mut engine = EfficiencyEngine::from_series(&hydrograph(), config).unwrap();
    engine.set_sim_series(&hydrograph()).unwrap();
    let all = engine.get_all().unwrap();
    assert_eq!(all.keys().copied().collect::<Vec<_>>(), vec![Metric::Ns, Metric::Sc]);
}

#[test]
fn compute_disabled_reports_ones() {
    // A constant reference would be degenerate, but nothing is precomputed.
    let config = EfficiencyConfig::report().with_compute(false);
    let mut engine = EfficiencyEngine::from_series(&[2.0; 10], config).unwrap();
    engine.set_sim_series(&[0.0; 10]).unwrap();
    for values in engine.get_all().unwrap().values() {
        assert_eq!(values, &vec![1.0]);
    }
}

#[test]
fn shape_mismatch_on_set_sim() {
    let config = EfficiencyConfig::new().with_metric(Metric::Ns);
    let mut engine = EfficiencyEngine::from_series(&hydrograph(), config).unwrap();
    let err = engine.set_sim_series(&[1.0; 5]).unwrap_err();
    assert_eq!(
        err,
        EfficiencyError::ShapeMismatch {
            name: "simulation".to_string(),
            expected: (120, 1),
            got: (5, 1),
        }
    );
}

#[test]
fn worse_simulation_scores_lower() {
    let reference = hydrograph();
    let config = EfficiencyConfig::report();
    let mut engine = EfficiencyEngine::from_series(&reference, config).unwrap();

    engine
        .set_sim_series(&reference.iter().map(|v| v * 1.05).collect::<Vec<_>>())
        .unwrap();
    let close = engine.get_all().unwrap();

    engine
        .set_sim_series(&reference.iter().map(|v| v * 0.5 + 1.0).collect::<Vec<_>>())
        .unwrap();
    let far = engine.get_all().unwrap();

    assert!(close[&Metric::Ns][0] > far[&Metric::Ns][0]);
    assert!(close[&Metric::Kg][0] > far[&Metric::Kg][0]);
}

#[test]
fn zero_reference_leaves_lns_undefined() {
    let mut reference = hydrograph();
    reference[10] = 0.0;
    let config = EfficiencyConfig::new().with_metrics(&[Metric::Ns, Metric::Lns]);
    let mut engine = EfficiencyEngine::from_series(&reference, config).unwrap();
    engine.set_sim_series(&reference).unwrap();

    let all = engine.get_all().unwrap();
    assert!(all[&Metric::Lns][0].is_nan());
    assert_relative_eq!(all[&Metric::Ns][0], 1.0, epsilon = 1e-12);
}
