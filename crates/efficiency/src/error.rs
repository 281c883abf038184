//! Error types for the hbvcal-efficiency crate.

use crate::metric::Metric;

/// Error type for all fallible operations in the hbvcal-efficiency crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EfficiencyError {
    /// Returned when the engine configuration is invalid.
    #[error("invalid efficiency configuration: {reason}")]
    Configuration {
        /// Description of the failure.
        reason: String,
    },

    /// Returned when an input array has the wrong shape.
    #[error("shape mismatch for {name}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Name of the offending input.
        name: String,
        /// Expected `(rows, columns)`.
        expected: (usize, usize),
        /// Actual `(rows, columns)`.
        got: (usize, usize),
    },

    /// Returned when a value that must be finite is NaN or infinite.
    #[error("non-finite value in {name}")]
    NonFinite {
        /// Name of the input containing the non-finite value.
        name: String,
    },

    /// Returned when the reference cannot support a requested metric.
    #[error("reference column {column} cannot support {metric}: {reason}")]
    DegenerateReference {
        /// The metric that cannot be computed.
        metric: Metric,
        /// Zero-based reference column.
        column: usize,
        /// Description of the degeneracy.
        reason: String,
    },

    /// Returned when a reference column has no valid entries at all.
    #[error("reference column {column} has no valid entries")]
    EmptyReference {
        /// Zero-based reference column.
        column: usize,
    },

    /// Returned when a metric that was not selected at construction is read.
    #[error("metric {metric} was not selected")]
    MetricNotSelected {
        /// The requested metric.
        metric: Metric,
    },

    /// Returned when metrics are read before a simulation was set.
    #[error("no simulation set")]
    SimulationNotSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_degenerate_reference() {
        let e = EfficiencyError::DegenerateReference {
            metric: Metric::Ns,
            column: 0,
            reason: "zero variance".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "reference column 0 cannot support NS: zero variance"
        );
    }

    #[test]
    fn error_shape_mismatch() {
        let e = EfficiencyError::ShapeMismatch {
            name: "simulation".to_string(),
            expected: (10, 1),
            got: (9, 1),
        };
        assert_eq!(
            e.to_string(),
            "shape mismatch for simulation: expected (10, 1), got (9, 1)"
        );
    }

    #[test]
    fn error_metric_not_selected() {
        let e = EfficiencyError::MetricNotSelected { metric: Metric::Sp };
        assert_eq!(e.to_string(), "metric SP was not selected");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<EfficiencyError>();
    }
}
