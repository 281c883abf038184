//! The scalar objective minimised during calibration.

use std::collections::BTreeMap;

use hbvcal_efficiency::{EfficiencyConfig, EfficiencyEngine, Metric};
use hbvcal_model::{Forcing, RunMode, SimulationEngine};

use crate::error::CalibrateError;

/// Sums `1 - metric` over every selected metric and column.
///
/// A non-finite LNS is replaced by `lns_penalty` before its term is added,
/// steering the search away from parameter sets that produce zero flow.
///
/// # Errors
///
/// Returns [`CalibrateError::DivergedObjective`] if the sum is still not
/// finite.
pub fn objective_value(
    scores: &BTreeMap<Metric, Vec<f64>>,
    lns_penalty: f64,
) -> Result<f64, CalibrateError> {
    let mut value = 0.0;
    for (&metric, per_column) in scores {
        for &score in per_column {
            let score = if metric == Metric::Lns && !score.is_finite() {
                lns_penalty
            } else {
                score
            };
            value += 1.0 - score;
        }
    }
    if !value.is_finite() {
        return Err(CalibrateError::DivergedObjective { value });
    }
    Ok(value)
}

/// Simulation engine and efficiency engine bundled for repeated evaluation
/// of trial parameter vectors.
///
/// The efficiency engine is seeded once with the full reference, gaps
/// included, and scores the full discharge series of every run. Missing
/// steps are excluded inside the efficiency engine, so the objective uses
/// exactly the metric definitions of the final report. One instance must
/// not be shared between concurrent evaluations.
#[derive(Debug, Clone)]
pub struct ObjectiveFunction {
    engine: SimulationEngine,
    efficiency: EfficiencyEngine,
    lns_penalty: f64,
    evaluations: usize,
}

impl ObjectiveFunction {
    /// Prepares an objective over `forcing` against `reference` discharge
    /// (`NaN` = missing).
    ///
    /// The engine starts in [`RunMode::Reduced`].
    ///
    /// # Errors
    ///
    /// - [`CalibrateError::ShapeMismatch`] if the reference length differs
    ///   from the forcing length.
    /// - [`CalibrateError::Configuration`] if no reference value is observed.
    /// - Model errors for an invalid scaler, efficiency errors for an
    ///   unusable reference.
    pub fn new(
        forcing: Forcing,
        reference: &[f64],
        scaler: f64,
        metrics: &[Metric],
        lns_penalty: f64,
    ) -> Result<Self, CalibrateError> {
        if reference.len() != forcing.len() {
            return Err(CalibrateError::ShapeMismatch {
                name: "reference discharge".to_string(),
                expected: forcing.len(),
                got: reference.len(),
            });
        }
        if reference.iter().all(|v| v.is_nan()) {
            return Err(CalibrateError::configuration(
                "reference discharge",
                "no observed values",
            ));
        }

        let efficiency =
            EfficiencyEngine::from_series(reference, EfficiencyConfig::new().with_metrics(metrics))?;

        let mut engine = SimulationEngine::new();
        engine.set_outputs(forcing.len())?;
        engine.set_forcing(forcing);
        engine.set_discharge_scaler(scaler)?;
        engine.set_mode(RunMode::Reduced);

        Ok(Self {
            engine,
            efficiency,
            lns_penalty,
            evaluations: 0,
        })
    }

    /// Switches between reduced (search) and full (final) model output.
    pub fn set_mode(&mut self, mode: RunMode) {
        self.engine.set_mode(mode);
    }

    /// Evaluates one trial parameter vector (canonical order).
    ///
    /// # Errors
    ///
    /// - Model errors if the vector is invalid.
    /// - [`CalibrateError::DivergedObjective`] if the objective is not
    ///   finite.
    pub fn evaluate(&mut self, trial: &[f64]) -> Result<f64, CalibrateError> {
        self.evaluations += 1;
        self.engine.set_parameters(trial)?;
        self.engine.run()?;

        self.efficiency.set_sim_series(self.engine.discharge())?;
        objective_value(&self.efficiency.get_all()?, self.lns_penalty)
    }

    /// Metric scores of the most recent evaluation.
    ///
    /// # Errors
    ///
    /// Returns an efficiency error before the first evaluation.
    pub fn scores(&self) -> Result<BTreeMap<Metric, Vec<f64>>, CalibrateError> {
        Ok(self.efficiency.get_all()?)
    }

    /// The simulation engine, holding the outputs of the last evaluation.
    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    /// Number of steps with an observed reference value.
    pub fn n_observed(&self) -> usize {
        self.efficiency.n_valid(0)
    }

    /// Number of evaluations so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }
}
