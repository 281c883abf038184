//! Error types for the hbvcal-calibrate crate.

use hbvcal_efficiency::EfficiencyError;
use hbvcal_model::ModelError;

/// Error type for all fallible operations in the hbvcal-calibrate crate.
#[derive(Debug, thiserror::Error)]
pub enum CalibrateError {
    /// Returned when a calibration or validation setting is invalid.
    #[error("invalid configuration for '{name}': {reason}")]
    Configuration {
        /// Setting that failed validation.
        name: String,
        /// Description of the failure.
        reason: String,
    },

    /// Returned when reference and forcing series disagree in length.
    #[error("shape mismatch for {name}: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Name of the offending input.
        name: String,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// Returned when the objective evaluates to NaN or infinity after the
    /// LNS penalty has been applied.
    #[error("objective function diverged to {value}")]
    DivergedObjective {
        /// The non-finite objective value.
        value: f64,
    },

    /// Returned when the local polishing search fails.
    #[error("polishing failed: {reason}")]
    Polish {
        /// Description of the failure.
        reason: String,
    },

    /// Errors propagated from the simulation engine.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Errors propagated from the efficiency engine.
    #[error(transparent)]
    Efficiency(#[from] EfficiencyError),
}

impl CalibrateError {
    pub(crate) fn configuration(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_diverged_objective() {
        let e = CalibrateError::DivergedObjective { value: f64::NAN };
        assert_eq!(e.to_string(), "objective function diverged to NaN");
    }

    #[test]
    fn error_configuration() {
        let e = CalibrateError::configuration("population_multiplier", "must be at least 1");
        assert_eq!(
            e.to_string(),
            "invalid configuration for 'population_multiplier': must be at least 1"
        );
    }

    #[test]
    fn error_from_model_is_transparent() {
        let inner = ModelError::NotReady {
            missing: "forcing",
        };
        let e: CalibrateError = inner.clone().into();
        assert_eq!(e.to_string(), inner.to_string());
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<CalibrateError>();
    }
}
