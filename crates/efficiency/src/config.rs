//! Efficiency engine configuration.

use crate::error::EfficiencyError;
use crate::metric::Metric;

/// Which metrics an [`EfficiencyEngine`](crate::EfficiencyEngine) computes.
///
/// With `compute` disabled the engine skips all reference precomputation
/// and reports 1.0 for every selected metric. Useful for exercising the
/// calibration plumbing without paying for the statistics.
///
/// # Example
///
/// ```
/// use hbvcal_efficiency::{EfficiencyConfig, Metric};
///
/// let config = EfficiencyConfig::new()
///     .with_metric(Metric::Ns)
///     .with_metric(Metric::Kg);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.metrics(), &[Metric::Ns, Metric::Kg]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EfficiencyConfig {
    metrics: Vec<Metric>,
    compute: bool,
}

impl Default for EfficiencyConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EfficiencyConfig {
    /// Creates a configuration with no metrics and computation enabled.
    pub fn new() -> Self {
        Self {
            metrics: Vec::new(),
            compute: true,
        }
    }

    /// Selects the five metrics of the standard performance report:
    /// NS, LNS, KG, PC and SC.
    pub fn report() -> Self {
        Self::new().with_metrics(&[Metric::Ns, Metric::Lns, Metric::Kg, Metric::Pc, Metric::Sc])
    }

    /// Adds a metric. Duplicates are ignored; order is always [`Metric::ALL`].
    pub fn with_metric(mut self, metric: Metric) -> Self {
        if !self.metrics.contains(&metric) {
            self.metrics.push(metric);
            self.metrics.sort();
        }
        self
    }

    /// Adds several metrics.
    pub fn with_metrics(self, metrics: &[Metric]) -> Self {
        metrics.iter().fold(self, |c, &m| c.with_metric(m))
    }

    /// Enables or disables metric computation.
    pub fn with_compute(mut self, compute: bool) -> Self {
        self.compute = compute;
        self
    }

    /// Returns the selected metrics in reporting order.
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Returns `true` if `metric` is selected.
    pub fn is_selected(&self, metric: Metric) -> bool {
        self.metrics.contains(&metric)
    }

    /// Returns whether metrics are actually computed.
    pub fn compute(&self) -> bool {
        self.compute
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EfficiencyError::Configuration`] if no metric is selected.
    pub fn validate(&self) -> Result<(), EfficiencyError> {
        if self.metrics.is_empty() {
            return Err(EfficiencyError::Configuration {
                reason: "at least one metric must be selected".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_is_invalid() {
        let err = EfficiencyConfig::new().validate().unwrap_err();
        assert!(matches!(err, EfficiencyError::Configuration { .. }));
    }

    #[test]
    fn metrics_sorted_and_deduplicated() {
        let config = EfficiencyConfig::new()
            .with_metric(Metric::Sc)
            .with_metric(Metric::Ns)
            .with_metric(Metric::Sc);
        assert_eq!(config.metrics(), &[Metric::Ns, Metric::Sc]);
    }

    #[test]
    fn report_selection() {
        let config = EfficiencyConfig::report();
        assert_eq!(config.metrics().len(), 5);
        assert!(!config.is_selected(Metric::Sp));
        assert!(config.compute());
    }

    #[test]
    fn compute_flag() {
        let config = EfficiencyConfig::report().with_compute(false);
        assert!(!config.compute());
    }
}
