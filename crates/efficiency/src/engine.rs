//! The efficiency engine: reference constants plus per-simulation metrics.

use std::collections::BTreeMap;

use hbvcal_stats::{
    average_ranks, masked_cumsum, nan_mean, nan_population_sd, ols_slope, pearson_correlation,
};
use ndarray::{ArrayView2, Axis};
use tracing::debug;

use crate::config::EfficiencyConfig;
use crate::error::EfficiencyError;
use crate::metric::Metric;
use crate::reference::ColumnReference;

/// Value reported for a correlation that is undefined for the current
/// simulation, e.g. because the simulation is constant.
pub const UNDEFINED_CORRELATION: f64 = -1.0;

/// Simulation-side transforms for one column, compacted to the reference's
/// valid entries.
#[derive(Debug, Clone, Default)]
struct SimColumn {
    values: Vec<f64>,
    ln_values: Vec<f64>,
    ranks: Vec<f64>,
    cumulative: Vec<f64>,
}

/// Scores simulated series against a fixed reference.
///
/// The reference is a `(time, column)` array where `NaN` marks a missing
/// observation. Missing entries are excluded pairwise from every metric.
/// Reference-derived constants are computed once in [`new`](Self::new) and
/// reused for every [`set_sim`](Self::set_sim).
///
/// # Example
///
/// ```
/// use hbvcal_efficiency::{EfficiencyConfig, EfficiencyEngine, Metric};
///
/// let reference = [1.0, 3.0, f64::NAN, 2.0, 5.0];
/// let config = EfficiencyConfig::new().with_metric(Metric::Ns);
/// let mut engine = EfficiencyEngine::from_series(&reference, config).unwrap();
///
/// engine.set_sim_series(&[1.0, 3.0, 7.0, 2.0, 5.0]).unwrap();
/// assert_eq!(engine.ns().unwrap(), vec![1.0]);
/// ```
#[derive(Debug, Clone)]
pub struct EfficiencyEngine {
    config: EfficiencyConfig,
    shape: (usize, usize),
    reference: Vec<ColumnReference>,
    sim: Option<Vec<SimColumn>>,
}

impl EfficiencyEngine {
    /// Builds an engine for a `(time, column)` reference array.
    ///
    /// # Errors
    ///
    /// - [`EfficiencyError::Configuration`] if no metric is selected or the
    ///   reference is empty.
    /// - [`EfficiencyError::NonFinite`] if the reference holds an infinity.
    /// - [`EfficiencyError::EmptyReference`] or
    ///   [`EfficiencyError::DegenerateReference`] if a column cannot support
    ///   a selected metric. Skipped when computation is disabled.
    pub fn new(
        reference: ArrayView2<'_, f64>,
        config: EfficiencyConfig,
    ) -> Result<Self, EfficiencyError> {
        config.validate()?;
        let shape = reference.dim();
        if shape.0 == 0 || shape.1 == 0 {
            return Err(EfficiencyError::Configuration {
                reason: format!("reference is empty, shape {shape:?}"),
            });
        }
        if reference.iter().any(|v| v.is_infinite()) {
            return Err(EfficiencyError::NonFinite {
                name: "reference".to_string(),
            });
        }

        let columns = reference
            .axis_iter(Axis(1))
            .enumerate()
            .map(|(j, col)| {
                let col = col.to_vec();
                if config.compute() {
                    ColumnReference::precompute(j, &col, &config)
                } else {
                    Ok(ColumnReference::bare(&col))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            rows = shape.0,
            columns = shape.1,
            metrics = ?config.metrics(),
            compute = config.compute(),
            "efficiency reference prepared"
        );

        Ok(Self {
            config,
            shape,
            reference: columns,
            sim: None,
        })
    }

    /// Builds an engine for a single reference column.
    ///
    /// # Errors
    ///
    /// See [`EfficiencyEngine::new`].
    pub fn from_series(
        reference: &[f64],
        config: EfficiencyConfig,
    ) -> Result<Self, EfficiencyError> {
        let view = ArrayView2::from_shape((reference.len(), 1), reference).map_err(|_| {
            EfficiencyError::Configuration {
                reason: "reference cannot be viewed as a single column".to_string(),
            }
        })?;
        Self::new(view, config)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EfficiencyConfig {
        &self.config
    }

    /// Returns the reference shape `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Returns the number of valid reference entries in a column.
    ///
    /// # Panics
    ///
    /// Panics if `column` is out of range.
    pub fn n_valid(&self, column: usize) -> usize {
        self.reference[column].n_valid()
    }

    /// Returns the validity mask of a reference column.
    ///
    /// # Panics
    ///
    /// Panics if `column` is out of range.
    pub fn valid_mask(&self, column: usize) -> &[bool] {
        &self.reference[column].mask
    }

    /// Sets the simulated series to score, replacing any previous one.
    ///
    /// # Errors
    ///
    /// - [`EfficiencyError::ShapeMismatch`] if the shape differs from the
    ///   reference.
    /// - [`EfficiencyError::NonFinite`] if any value is NaN or infinite.
    pub fn set_sim(&mut self, sim: ArrayView2<'_, f64>) -> Result<(), EfficiencyError> {
        if sim.dim() != self.shape {
            return Err(EfficiencyError::ShapeMismatch {
                name: "simulation".to_string(),
                expected: self.shape,
                got: sim.dim(),
            });
        }
        if sim.iter().any(|v| !v.is_finite()) {
            return Err(EfficiencyError::NonFinite {
                name: "simulation".to_string(),
            });
        }

        let columns: Vec<SimColumn> = sim
            .axis_iter(Axis(1))
            .zip(&self.reference)
            .map(|(col, r)| self.derive_sim(&col.to_vec(), r))
            .collect();
        self.sim = Some(columns);
        Ok(())
    }

    /// Sets a single-column simulated series.
    ///
    /// # Errors
    ///
    /// See [`EfficiencyEngine::set_sim`].
    pub fn set_sim_series(&mut self, sim: &[f64]) -> Result<(), EfficiencyError> {
        let view = ArrayView2::from_shape((sim.len(), 1), sim).map_err(|_| {
            EfficiencyError::ShapeMismatch {
                name: "simulation".to_string(),
                expected: self.shape,
                got: (sim.len(), 1),
            }
        })?;
        self.set_sim(view)
    }

    fn derive_sim(&self, full: &[f64], r: &ColumnReference) -> SimColumn {
        let compact = |data: &[f64]| -> Vec<f64> {
            data.iter()
                .zip(&r.mask)
                .filter(|&(_, &ok)| ok)
                .map(|(&v, _)| v)
                .collect()
        };

        let values = compact(full);
        let mut out = SimColumn::default();
        if self.config.compute() {
            if self.config.is_selected(Metric::Lns) {
                out.ln_values = values.iter().map(|v| v.ln()).collect();
            }
            if self.config.is_selected(Metric::Sc) {
                // Simulated ranks are taken over the whole series, not only
                // the steps with a reference value.
                out.ranks = compact(&average_ranks(full));
            }
            if self.config.is_selected(Metric::NsDc) {
                out.cumulative = compact(&masked_cumsum(full, &r.mask));
            }
        }
        out.values = values;
        out
    }

    fn per_column(
        &self,
        metric: Metric,
        f: impl Fn(&ColumnReference, &SimColumn) -> f64,
    ) -> Result<Vec<f64>, EfficiencyError> {
        if !self.config.is_selected(metric) {
            return Err(EfficiencyError::MetricNotSelected { metric });
        }
        let sim = self.sim.as_ref().ok_or(EfficiencyError::SimulationNotSet)?;
        if !self.config.compute() {
            return Ok(vec![1.0; self.shape.1]);
        }
        Ok(self
            .reference
            .iter()
            .zip(sim)
            .map(|(r, s)| f(r, s))
            .collect())
    }

    /// Nash-Sutcliffe efficiency per column.
    ///
    /// # Errors
    ///
    /// Returns [`EfficiencyError::MetricNotSelected`] or
    /// [`EfficiencyError::SimulationNotSet`].
    pub fn ns(&self) -> Result<Vec<f64>, EfficiencyError> {
        self.per_column(Metric::Ns, |r, s| {
            1.0 - squared_error(&r.values, &s.values) / r.ns_denominator
        })
    }

    /// Log Nash-Sutcliffe efficiency per column.
    ///
    /// A simulated value of zero gives `-inf`, and a column whose reference
    /// holds a non-positive value always gives `NaN`; callers decide how to
    /// treat non-finite results.
    ///
    /// # Errors
    ///
    /// As [`EfficiencyEngine::ns`].
    pub fn lns(&self) -> Result<Vec<f64>, EfficiencyError> {
        self.per_column(Metric::Lns, |r, s| {
            1.0 - squared_error(&r.ln_values, &s.ln_values) / r.lns_denominator
        })
    }

    /// Kling-Gupta efficiency per column.
    ///
    /// An undefined correlation counts as [`UNDEFINED_CORRELATION`].
    ///
    /// # Errors
    ///
    /// As [`EfficiencyEngine::ns`].
    pub fn kg(&self) -> Result<Vec<f64>, EfficiencyError> {
        self.per_column(Metric::Kg, |r, s| {
            let corr = correlation(&r.values, &s.values);
            let bias = nan_mean(&s.values) / r.mean;
            let variability = nan_population_sd(&s.values) / r.sd;
            1.0 - ((corr - 1.0).powi(2) + (bias - 1.0).powi(2) + (variability - 1.0).powi(2)).sqrt()
        })
    }

    /// Pearson correlation per column, [`UNDEFINED_CORRELATION`] when undefined.
    ///
    /// # Errors
    ///
    /// As [`EfficiencyEngine::ns`].
    pub fn pc(&self) -> Result<Vec<f64>, EfficiencyError> {
        self.per_column(Metric::Pc, |r, s| correlation(&r.values, &s.values))
    }

    /// Spearman rank correlation per column, [`UNDEFINED_CORRELATION`] when
    /// undefined.
    ///
    /// # Errors
    ///
    /// As [`EfficiencyEngine::ns`].
    pub fn sc(&self) -> Result<Vec<f64>, EfficiencyError> {
        self.per_column(Metric::Sc, |r, s| correlation(&r.ranks, &s.ranks))
    }

    /// Least-squares slope of simulation on reference per column.
    ///
    /// # Errors
    ///
    /// As [`EfficiencyEngine::ns`].
    pub fn sp(&self) -> Result<Vec<f64>, EfficiencyError> {
        self.per_column(Metric::Sp, |r, s| {
            ols_slope(&r.values, &s.values).unwrap_or(f64::NAN)
        })
    }

    /// Nash-Sutcliffe efficiency of the cumulative series per column.
    ///
    /// # Errors
    ///
    /// As [`EfficiencyEngine::ns`].
    pub fn ns_dc(&self) -> Result<Vec<f64>, EfficiencyError> {
        self.per_column(Metric::NsDc, |r, s| {
            1.0 - squared_error(&r.cumulative, &s.cumulative) / r.ns_dc_denominator
        })
    }

    /// Computes a single metric.
    ///
    /// # Errors
    ///
    /// As [`EfficiencyEngine::ns`].
    pub fn metric(&self, metric: Metric) -> Result<Vec<f64>, EfficiencyError> {
        match metric {
            Metric::Ns => self.ns(),
            Metric::Lns => self.lns(),
            Metric::Kg => self.kg(),
            Metric::Pc => self.pc(),
            Metric::Sc => self.sc(),
            Metric::Sp => self.sp(),
            Metric::NsDc => self.ns_dc(),
        }
    }

    /// Computes every selected metric. Unselected metrics are absent.
    ///
    /// # Errors
    ///
    /// Returns [`EfficiencyError::SimulationNotSet`] before the first
    /// [`set_sim`](Self::set_sim).
    pub fn get_all(&self) -> Result<BTreeMap<Metric, Vec<f64>>, EfficiencyError> {
        self.config
            .metrics()
            .iter()
            .map(|&m| Ok((m, self.metric(m)?)))
            .collect()
    }
}

fn squared_error(reference: &[f64], sim: &[f64]) -> f64 {
    reference
        .iter()
        .zip(sim)
        .map(|(r, s)| (r - s) * (r - s))
        .sum()
}

fn correlation(x: &[f64], y: &[f64]) -> f64 {
    pearson_correlation(x, y).unwrap_or(UNDEFINED_CORRELATION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn engine(reference: &[f64], metrics: &[Metric]) -> EfficiencyEngine {
        EfficiencyEngine::from_series(reference, EfficiencyConfig::new().with_metrics(metrics))
            .unwrap()
    }

    #[test]
    fn ns_known_value() {
        let mut e = engine(&[1.0, 2.0, 3.0], &[Metric::Ns]);
        e.set_sim_series(&[1.0, 2.0, 4.0]).unwrap();
        // 1 - 1 / 2
        assert_relative_eq!(e.ns().unwrap()[0], 0.5);
    }

    #[test]
    fn nan_reference_excluded_pairwise() {
        let mut e = engine(&[1.0, f64::NAN, 3.0], &[Metric::Ns, Metric::Pc]);
        e.set_sim_series(&[1.0, 1000.0, 3.0]).unwrap();
        assert_relative_eq!(e.ns().unwrap()[0], 1.0);
        assert_relative_eq!(e.pc().unwrap()[0], 1.0);
    }

    #[test]
    fn lns_zero_simulation_is_not_finite() {
        let mut e = engine(&[1.0, 2.0, 3.0], &[Metric::Lns]);
        e.set_sim_series(&[0.0, 2.0, 3.0]).unwrap();
        assert!(!e.lns().unwrap()[0].is_finite());
    }

    #[test]
    fn kg_of_scaled_simulation() {
        let mut e = engine(&[1.0, 2.0, 3.0, 4.0], &[Metric::Kg]);
        e.set_sim_series(&[2.0, 4.0, 6.0, 8.0]).unwrap();
        // r = 1, beta = 2, gamma = 2
        assert_relative_eq!(e.kg().unwrap()[0], 1.0 - 2f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn constant_simulation_falls_back() {
        let mut e = engine(&[1.0, 2.0, 3.0], &[Metric::Pc, Metric::Sc]);
        e.set_sim_series(&[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(e.pc().unwrap()[0], UNDEFINED_CORRELATION);
        assert_eq!(e.sc().unwrap()[0], UNDEFINED_CORRELATION);
    }

    #[test]
    fn sp_slope() {
        let mut e = engine(&[1.0, 2.0, 3.0], &[Metric::Sp]);
        e.set_sim_series(&[1.5, 2.5, 3.5]).unwrap();
        assert_relative_eq!(e.sp().unwrap()[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn sc_uses_ranks_over_full_simulation() {
        // Monotone in the valid entries, so rank correlation is perfect
        // regardless of the value at the gap.
        let mut e = engine(&[1.0, f64::NAN, 2.0, 3.0], &[Metric::Sc]);
        e.set_sim_series(&[10.0, 0.0, 20.0, 30.0]).unwrap();
        assert_relative_eq!(e.sc().unwrap()[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn ns_dc_identical_is_one() {
        let mut e = engine(&[1.0, 2.0, 3.0, 4.0], &[Metric::NsDc]);
        e.set_sim_series(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_relative_eq!(e.ns_dc().unwrap()[0], 1.0);
    }

    #[test]
    fn multi_column_reference() {
        let reference = array![[1.0, 10.0], [2.0, f64::NAN], [3.0, 30.0], [4.0, 20.0]];
        let config = EfficiencyConfig::new().with_metric(Metric::Ns);
        let mut e = EfficiencyEngine::new(reference.view(), config).unwrap();
        e.set_sim(reference.mapv(|v| if v.is_nan() { 0.0 } else { v }).view())
            .unwrap();
        let ns = e.ns().unwrap();
        assert_eq!(ns.len(), 2);
        assert_relative_eq!(ns[0], 1.0);
        assert_relative_eq!(ns[1], 1.0);
        assert_eq!(e.n_valid(1), 3);
    }

    #[test]
    fn unselected_metric_errors() {
        let mut e = engine(&[1.0, 2.0], &[Metric::Ns]);
        e.set_sim_series(&[1.0, 2.0]).unwrap();
        assert_eq!(
            e.kg().unwrap_err(),
            EfficiencyError::MetricNotSelected { metric: Metric::Kg }
        );
    }

    #[test]
    fn metrics_before_sim_error() {
        let e = engine(&[1.0, 2.0], &[Metric::Ns]);
        assert_eq!(e.ns().unwrap_err(), EfficiencyError::SimulationNotSet);
    }

    #[test]
    fn set_sim_rejects_nan() {
        let mut e = engine(&[1.0, 2.0], &[Metric::Ns]);
        let err = e.set_sim_series(&[1.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, EfficiencyError::NonFinite { .. }));
    }

    #[test]
    fn infinite_reference_rejected() {
        let err = EfficiencyEngine::from_series(
            &[1.0, f64::INFINITY],
            EfficiencyConfig::new().with_metric(Metric::Pc),
        )
        .unwrap_err();
        assert!(matches!(err, EfficiencyError::NonFinite { .. }));
    }
}
