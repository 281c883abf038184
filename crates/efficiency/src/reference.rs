//! Reference-side constants, computed once per reference column.

use hbvcal_stats::{average_ranks, nan_mean, nan_population_sd, sum_sq_dev};
use tracing::warn;

use crate::config::EfficiencyConfig;
use crate::error::EfficiencyError;
use crate::metric::Metric;

/// One reference column and everything derived from it.
///
/// All `Vec` fields except `mask` are compacted to the valid (non-NaN)
/// entries, in time order.
#[derive(Debug, Clone)]
pub(crate) struct ColumnReference {
    pub(crate) mask: Vec<bool>,
    pub(crate) values: Vec<f64>,
    pub(crate) mean: f64,
    pub(crate) ns_denominator: f64,
    pub(crate) ln_values: Vec<f64>,
    pub(crate) lns_denominator: f64,
    pub(crate) sd: f64,
    pub(crate) ranks: Vec<f64>,
    pub(crate) cumulative: Vec<f64>,
    pub(crate) ns_dc_denominator: f64,
}

impl ColumnReference {
    /// Splits a raw column into mask and valid values without precomputing
    /// any metric constants.
    pub(crate) fn bare(column: &[f64]) -> Self {
        let mask: Vec<bool> = column.iter().map(|v| !v.is_nan()).collect();
        let values = column.iter().copied().filter(|v| !v.is_nan()).collect();
        Self {
            mask,
            values,
            mean: f64::NAN,
            ns_denominator: f64::NAN,
            ln_values: Vec::new(),
            lns_denominator: f64::NAN,
            sd: f64::NAN,
            ranks: Vec::new(),
            cumulative: Vec::new(),
            ns_dc_denominator: f64::NAN,
        }
    }

    /// Precomputes the constants every selected metric needs.
    ///
    /// # Errors
    ///
    /// - [`EfficiencyError::EmptyReference`] if the column has no valid entry.
    /// - [`EfficiencyError::DegenerateReference`] if a selected metric's
    ///   denominator is not strictly positive.
    pub(crate) fn precompute(
        index: usize,
        column: &[f64],
        config: &EfficiencyConfig,
    ) -> Result<Self, EfficiencyError> {
        let mut r = Self::bare(column);
        if r.values.is_empty() {
            return Err(EfficiencyError::EmptyReference { column: index });
        }
        let degenerate = |metric: Metric, reason: String| EfficiencyError::DegenerateReference {
            metric,
            column: index,
            reason,
        };

        r.mean = nan_mean(&r.values);

        if config.is_selected(Metric::Ns) {
            r.ns_denominator = sum_sq_dev(&r.values, r.mean);
            if r.ns_denominator <= 0.0 {
                return Err(degenerate(Metric::Ns, "reference has zero variance".into()));
            }
        }

        if config.is_selected(Metric::Lns) {
            r.ln_values = r.values.iter().map(|v| v.ln()).collect();
            if let Some(v) = r.values.iter().find(|&&v| v <= 0.0) {
                // LNS then scores NaN for every simulation of this column.
                warn!(column = index, value = v, "non-positive reference value, LNS undefined");
                r.lns_denominator = f64::NAN;
            } else {
                let ln_mean = nan_mean(&r.ln_values);
                r.lns_denominator = sum_sq_dev(&r.ln_values, ln_mean);
            }
            if r.lns_denominator <= 0.0 {
                return Err(degenerate(
                    Metric::Lns,
                    "log reference has zero variance".into(),
                ));
            }
        }

        if config.is_selected(Metric::Kg) {
            r.sd = nan_population_sd(&r.values);
            if r.sd <= 0.0 {
                return Err(degenerate(Metric::Kg, "reference has zero variance".into()));
            }
            if r.mean == 0.0 {
                return Err(degenerate(Metric::Kg, "reference has zero mean".into()));
            }
        }

        if config.is_selected(Metric::Sc) {
            r.ranks = average_ranks(&r.values);
        }

        if config.is_selected(Metric::Sp) && sum_sq_dev(&r.values, r.mean) <= 0.0 {
            return Err(degenerate(Metric::Sp, "reference has zero variance".into()));
        }

        if config.is_selected(Metric::NsDc) {
            // Missing steps hold the running total; the mean is taken over
            // every step but divided by the valid count.
            let mut acc = 0.0;
            let mut carried_sum = 0.0;
            for (&v, &ok) in column.iter().zip(&r.mask) {
                if ok {
                    acc += v;
                    r.cumulative.push(acc);
                }
                carried_sum += acc;
            }
            let cum_mean = carried_sum / r.values.len() as f64;
            r.ns_dc_denominator = sum_sq_dev(&r.cumulative, cum_mean);
            if r.ns_dc_denominator <= 0.0 {
                return Err(degenerate(
                    Metric::NsDc,
                    "cumulative reference has zero spread".into(),
                ));
            }
        }

        Ok(r)
    }

    /// Number of valid reference entries.
    pub(crate) fn n_valid(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config(metrics: &[Metric]) -> EfficiencyConfig {
        EfficiencyConfig::new().with_metrics(metrics)
    }

    #[test]
    fn mask_and_compaction() {
        let r = ColumnReference::bare(&[1.0, f64::NAN, 3.0]);
        assert_eq!(r.mask, vec![true, false, true]);
        assert_eq!(r.values, vec![1.0, 3.0]);
        assert_eq!(r.n_valid(), 2);
    }

    #[test]
    fn ns_denominator() {
        let r = ColumnReference::precompute(0, &[1.0, 2.0, f64::NAN, 3.0], &config(&[Metric::Ns]))
            .unwrap();
        assert_relative_eq!(r.mean, 2.0);
        assert_relative_eq!(r.ns_denominator, 2.0);
    }

    #[test]
    fn ns_dc_mean_carries_missing_steps() {
        // cumsum with the gap zeroed: [1, 1, 3]; mean = 5 / 2 valid.
        let r = ColumnReference::precompute(0, &[1.0, f64::NAN, 2.0], &config(&[Metric::NsDc]))
            .unwrap();
        assert_eq!(r.cumulative, vec![1.0, 3.0]);
        assert_relative_eq!(r.ns_dc_denominator, 1.5f64.powi(2) + 0.5f64.powi(2));
    }

    #[test]
    fn empty_column_rejected() {
        let err = ColumnReference::precompute(2, &[f64::NAN], &config(&[Metric::Pc])).unwrap_err();
        assert_eq!(err, EfficiencyError::EmptyReference { column: 2 });
    }

    #[test]
    fn lns_undefined_for_zero_reference() {
        let r = ColumnReference::precompute(0, &[0.0, 1.0, 2.0], &config(&[Metric::Lns]))
            .unwrap();
        assert!(r.lns_denominator.is_nan());
        assert_eq!(r.ln_values[0], f64::NEG_INFINITY);
    }

    #[test]
    fn lns_rejects_constant_reference() {
        let err =
            ColumnReference::precompute(0, &[2.0, 2.0, 2.0], &config(&[Metric::Lns])).unwrap_err();
        assert!(matches!(
            err,
            EfficiencyError::DegenerateReference {
                metric: Metric::Lns,
                ..
            }
        ));
    }
}
