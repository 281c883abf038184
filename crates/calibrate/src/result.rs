//! Calibration and validation results.

use std::collections::BTreeMap;

use hbvcal_efficiency::Metric;
use hbvcal_model::{OutputTable, Parameters};
use serde::Serialize;

/// Label of the objective row in a performance report.
pub const OBJECTIVE_LABEL: &str = "OBJ";

/// One labelled value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValue {
    /// Row label.
    pub name: String,
    /// Value (`NaN` serialises as `null`).
    pub value: f64,
}

/// The objective value followed by one score per report metric.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    objective: f64,
    scores: Vec<(Metric, f64)>,
}

impl PerformanceReport {
    /// Builds a report from the first column of `scores`.
    pub fn new(objective: f64, scores: &BTreeMap<Metric, Vec<f64>>) -> Self {
        let scores = scores
            .iter()
            .map(|(&metric, values)| (metric, values.first().copied().unwrap_or(f64::NAN)))
            .collect();
        Self { objective, scores }
    }

    /// The objective value.
    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// Score of `metric`, if reported.
    pub fn score(&self, metric: Metric) -> Option<f64> {
        self.scores
            .iter()
            .find(|(m, _)| *m == metric)
            .map(|&(_, v)| v)
    }

    /// Rows labelled `OBJ`, then the uppercase metric labels.
    pub fn rows(&self) -> Vec<NamedValue> {
        std::iter::once(NamedValue {
            name: OBJECTIVE_LABEL.to_string(),
            value: self.objective,
        })
        .chain(self.scores.iter().map(|&(metric, value)| NamedValue {
            name: metric.label().to_string(),
            value,
        }))
        .collect()
    }
}

/// Serialisable digest of a calibration run.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationSummary {
    /// Calibrated parameters in canonical order.
    pub parameters: Vec<NamedValue>,
    /// Final objective value.
    pub objective: f64,
    /// Generations performed by the global search.
    pub generations: usize,
    /// Objective evaluations, including polishing and the final run.
    pub evaluations: usize,
    /// Whether the global search converged within its budget.
    pub converged: bool,
    /// Final performance report rows.
    pub performance: Vec<NamedValue>,
}

/// Everything produced by a calibration run.
#[derive(Debug, Clone)]
pub struct CalibrationResult {
    pub(crate) parameters: Parameters,
    pub(crate) generations: usize,
    pub(crate) evaluations: usize,
    pub(crate) converged: bool,
    pub(crate) outputs: OutputTable,
    pub(crate) reference: Vec<f64>,
    pub(crate) discharge: Vec<f64>,
    pub(crate) report: PerformanceReport,
}

impl CalibrationResult {
    /// The calibrated parameter set.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Final objective value, from a full-mode run of the best parameters.
    pub fn objective(&self) -> f64 {
        self.report.objective()
    }

    /// Generations performed by the global search.
    pub fn generations(&self) -> usize {
        self.generations
    }

    /// Objective evaluations performed.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Whether the global search converged within its budget.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Full model outputs for the calibrated parameters.
    pub fn outputs(&self) -> &OutputTable {
        &self.outputs
    }

    /// Reference discharge as supplied (`NaN` = missing).
    pub fn reference(&self) -> &[f64] {
        &self.reference
    }

    /// Simulated discharge for the calibrated parameters.
    pub fn discharge(&self) -> &[f64] {
        &self.discharge
    }

    /// Final performance report.
    pub fn report(&self) -> &PerformanceReport {
        &self.report
    }

    /// Serialisable digest of this result.
    pub fn summary(&self) -> CalibrationSummary {
        CalibrationSummary {
            parameters: named(self.parameters.labelled()),
            objective: self.objective(),
            generations: self.generations,
            evaluations: self.evaluations,
            converged: self.converged,
            performance: self.report.rows(),
        }
    }
}

/// Everything produced by a validation run.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub(crate) warmup_steps: usize,
    pub(crate) outputs: OutputTable,
    pub(crate) reference: Vec<f64>,
    pub(crate) discharge: Vec<f64>,
    pub(crate) report: PerformanceReport,
}

impl ValidationResult {
    /// Number of leading steps excluded from scoring.
    pub fn warmup_steps(&self) -> usize {
        self.warmup_steps
    }

    /// Full model outputs over the whole period.
    pub fn outputs(&self) -> &OutputTable {
        &self.outputs
    }

    /// Reference discharge after the warm-up.
    pub fn reference(&self) -> &[f64] {
        &self.reference
    }

    /// Simulated discharge after the warm-up.
    pub fn discharge(&self) -> &[f64] {
        &self.discharge
    }

    /// Performance report over the scored window.
    pub fn report(&self) -> &PerformanceReport {
        &self.report
    }
}

fn named(pairs: Vec<(&'static str, f64)>) -> Vec<NamedValue> {
    pairs
        .into_iter()
        .map(|(name, value)| NamedValue {
            name: name.to_string(),
            value,
        })
        .collect()
}
