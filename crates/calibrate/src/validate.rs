//! Scoring a fixed parameter set on an independent period.

use hbvcal_efficiency::{EfficiencyConfig, EfficiencyEngine};
use hbvcal_model::{Forcing, ModelError, Parameters, RunMode, SimulationEngine};
use tracing::info;

use crate::config::ValidationConfig;
use crate::error::CalibrateError;
use crate::objective::objective_value;
use crate::result::{PerformanceReport, ValidationResult};

/// Runs `params` over `forcing` in full mode and scores the discharge
/// against `reference` after the warm-up period.
///
/// OBJ is the same `sum(1 - metric)` used during calibration, summed over
/// the validation metrics.
///
/// # Errors
///
/// - [`CalibrateError::Configuration`] if `config` is invalid or the warm-up
///   leaves nothing to score.
/// - [`CalibrateError::ShapeMismatch`] if reference and forcing lengths
///   differ.
/// - Model and efficiency errors from the run and the scoring.
#[tracing::instrument(skip_all, fields(n_steps = forcing.len()))]
pub fn validate_run(
    forcing: Forcing,
    reference: &[f64],
    scaler: f64,
    params: &Parameters,
    config: &ValidationConfig,
) -> Result<ValidationResult, CalibrateError> {
    config.validate()?;
    let n_steps = forcing.len();
    if reference.len() != n_steps {
        return Err(CalibrateError::ShapeMismatch {
            name: "reference discharge".to_string(),
            expected: n_steps,
            got: reference.len(),
        });
    }
    let warmup = config.warmup_steps();
    if warmup >= n_steps {
        return Err(CalibrateError::configuration(
            "warmup_steps",
            format!("warm-up of {warmup} steps leaves nothing of {n_steps} steps to score"),
        ));
    }

    let mut engine = SimulationEngine::new();
    engine.set_outputs(n_steps)?;
    engine.set_forcing(forcing);
    engine.set_parameter_set(params.clone());
    engine.set_discharge_scaler(scaler)?;
    engine.set_mode(RunMode::Full);
    engine.run()?;

    let outputs = engine.outputs().cloned().ok_or(ModelError::NotReady {
        missing: "output table",
    })?;
    let reference = reference[warmup..].to_vec();
    let discharge = engine.discharge()[warmup..].to_vec();

    let mut efficiency = EfficiencyEngine::from_series(
        &reference,
        EfficiencyConfig::new().with_metrics(config.metrics()),
    )?;
    efficiency.set_sim_series(&discharge)?;
    let scores = efficiency.get_all()?;
    let objective = objective_value(&scores, config.lns_penalty())?;
    info!(objective, scored_steps = reference.len(), "validation finished");

    Ok(ValidationResult {
        warmup_steps: warmup,
        outputs,
        reference,
        discharge,
        report: PerformanceReport::new(objective, &scores),
    })
}
