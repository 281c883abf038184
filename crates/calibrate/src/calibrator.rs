//! Calibration driver: global search, optional polish, final full run.

use std::collections::BTreeMap;
use std::time::Instant;

use hbvcal_efficiency::{EfficiencyConfig, EfficiencyEngine};
use hbvcal_model::{Forcing, ModelError, ParameterSpace, Parameters, RunMode};
use tracing::{debug, info};

use crate::config::CalibrateConfig;
use crate::error::CalibrateError;
use crate::minimizer::{DifferentialEvolution, Minimizer};
use crate::objective::ObjectiveFunction;
use crate::polish::polish;
use crate::result::{CalibrationResult, PerformanceReport};

/// Iteration cap of the Nelder-Mead polish.
const POLISH_MAX_ITERS: u64 = 1000;

/// Calibrates the model against a reference discharge series.
///
/// Generic over the search algorithm; [`Calibrator::new`] uses
/// [`DifferentialEvolution`] configured from the [`CalibrateConfig`].
#[derive(Debug, Clone)]
pub struct Calibrator<M = DifferentialEvolution> {
    config: CalibrateConfig,
    minimizer: M,
}

impl Calibrator<DifferentialEvolution> {
    /// Creates a calibrator using differential evolution.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::Configuration`] if `config` is invalid.
    pub fn new(config: CalibrateConfig) -> Result<Self, CalibrateError> {
        let minimizer = DifferentialEvolution::from_config(&config);
        Self::with_minimizer(config, minimizer)
    }
}

impl<M: Minimizer> Calibrator<M> {
    /// Creates a calibrator using a custom search algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::Configuration`] if `config` is invalid.
    pub fn with_minimizer(config: CalibrateConfig, minimizer: M) -> Result<Self, CalibrateError> {
        config.validate()?;
        Ok(Self { config, minimizer })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CalibrateConfig {
        &self.config
    }

    /// Searches `bounds` (parameter name to `(lower, upper)`) for the
    /// parameter set minimising the objective, then runs it once more in
    /// full mode and scores it with the report metrics.
    ///
    /// The value reported for the best parameters is always recomputed by
    /// the same objective used during the search.
    ///
    /// # Errors
    ///
    /// - Model errors if the bound map is incomplete or out of range.
    /// - [`CalibrateError::Configuration`] if any bound is infinite.
    /// - [`CalibrateError::ShapeMismatch`] if reference and forcing lengths
    ///   differ.
    /// - Efficiency errors if the reference cannot support a selected metric.
    /// - [`CalibrateError::DivergedObjective`] if the objective is not finite.
    #[tracing::instrument(skip_all, fields(n_steps = forcing.len()))]
    pub fn calibrate(
        &mut self,
        forcing: Forcing,
        reference: &[f64],
        scaler: f64,
        bounds: &BTreeMap<String, (f64, f64)>,
    ) -> Result<CalibrationResult, CalibrateError> {
        let ordered = ParameterSpace::order_bounds(bounds)?;
        if let Some((j, &(lo, hi))) = ordered
            .iter()
            .enumerate()
            .find(|(_, (lo, hi))| !lo.is_finite() || !hi.is_finite())
        {
            return Err(CalibrateError::configuration(
                ParameterSpace::labels()[j],
                format!("calibration bounds must be finite, got ({lo}, {hi})"),
            ));
        }

        if reference.len() != forcing.len() {
            return Err(CalibrateError::ShapeMismatch {
                name: "reference discharge".to_string(),
                expected: forcing.len(),
                got: reference.len(),
            });
        }

        // Built before the search so a degenerate reference fails fast.
        let mut report_engine = EfficiencyEngine::from_series(
            reference,
            EfficiencyConfig::new().with_metrics(self.config.report_metrics()),
        )?;

        let mut objective = ObjectiveFunction::new(
            forcing,
            reference,
            scaler,
            self.config.objective_metrics(),
            self.config.lns_penalty(),
        )?;

        info!(
            n_observed = objective.n_observed(),
            objective_metrics = ?self.config.objective_metrics(),
            "starting global search"
        );
        let start = Instant::now();
        let outcome = self
            .minimizer
            .minimize(|x| objective.evaluate(x), &ordered)?;
        info!(
            best = outcome.best_value,
            generations = outcome.generations,
            evaluations = outcome.evaluations,
            converged = outcome.converged,
            elapsed_s = start.elapsed().as_secs_f64(),
            "global search finished"
        );

        let (best, best_value) = if self.config.polish() {
            polish(
                |x| objective.evaluate(x),
                &ordered,
                &outcome.best,
                outcome.best_value,
                POLISH_MAX_ITERS,
            )?
        } else {
            (outcome.best, outcome.best_value)
        };

        let start = Instant::now();
        objective.set_mode(RunMode::Full);
        let final_value = objective.evaluate(&best)?;
        info!(
            objective = final_value,
            elapsed_s = start.elapsed().as_secs_f64(),
            "final full run finished"
        );
        if final_value != best_value {
            debug!(search = best_value, final_value, "final objective differs from search");
        }

        let engine = objective.engine();
        let outputs = engine.outputs().cloned().ok_or(ModelError::NotReady {
            missing: "output table",
        })?;
        let discharge = engine.discharge().to_vec();

        report_engine.set_sim_series(&discharge)?;
        let report = PerformanceReport::new(final_value, &report_engine.get_all()?);

        Ok(CalibrationResult {
            parameters: Parameters::from_slice(&best)?,
            generations: outcome.generations,
            evaluations: objective.evaluations(),
            converged: outcome.converged,
            outputs,
            reference: reference.to_vec(),
            discharge,
            report,
        })
    }
}
