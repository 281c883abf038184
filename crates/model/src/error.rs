//! Error types for the hbvcal-model crate.

/// Error type for all fallible operations in the hbvcal-model crate.
///
/// `Configuration` covers bad parameter vectors and bound mappings,
/// `ShapeMismatch` and `NonFinite` cover malformed series, and `NotReady`
/// is returned when the engine is run before every setter has been called.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Returned when a parameter, bound or setting is invalid.
    #[error("invalid configuration for '{name}': {reason}")]
    Configuration {
        /// Parameter or setting that failed validation.
        name: String,
        /// Description of the failure.
        reason: String,
    },

    /// Returned when a series or vector has the wrong length.
    #[error("shape mismatch for {name}: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Name of the offending input.
        name: String,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// Returned when a required input contains NaN or infinity.
    #[error("non-finite value in {name}")]
    NonFinite {
        /// Name of the input containing the non-finite value.
        name: String,
    },

    /// Returned when a forcing series is empty or physically invalid.
    #[error("invalid input '{name}': {reason}")]
    InvalidInput {
        /// Name of the offending input.
        name: String,
        /// Description of the failure.
        reason: String,
    },

    /// Returned when the engine is run before all required setters were called.
    #[error("simulation engine not ready: {missing} not set")]
    NotReady {
        /// The missing piece of engine state.
        missing: &'static str,
    },
}

impl ModelError {
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
    fn error_configuration() {
        let e = ModelError::configuration("sl0_fcy", "lower 5 exceeds upper 1");
        assert_eq!(
            e.to_string(),
            "invalid configuration for 'sl0_fcy': lower 5 exceeds upper 1"
        );
    }

    #[test]
    fn error_shape_mismatch() {
        let e = ModelError::ShapeMismatch {
            name: "forcing".to_string(),
            expected: 10,
            got: 9,
        };
        assert_eq!(e.to_string(), "shape mismatch for forcing: expected 10, got 9");
    }

    #[test]
    fn error_non_finite() {
        let e = ModelError::NonFinite {
            name: "temperature".to_string(),
        };
        assert_eq!(e.to_string(), "non-finite value in temperature");
    }

    #[test]
    fn error_not_ready() {
        let e = ModelError::NotReady {
            missing: "parameters",
        };
        assert_eq!(e.to_string(), "simulation engine not ready: parameters not set");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<ModelError>();
    }
}
