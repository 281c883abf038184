//! Validated meteorological forcing series.

use crate::error::ModelError;

/// Temperature, precipitation and potential evapotranspiration series of
/// equal length. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Forcing {
    temperature: Vec<f64>,
    precipitation: Vec<f64>,
    pet: Vec<f64>,
}

impl Forcing {
    /// Validates and wraps the three forcing series.
    ///
    /// # Errors
    ///
    /// - [`ModelError::InvalidInput`] if the series are empty or precipitation
    ///   or PET contain negative values.
    /// - [`ModelError::ShapeMismatch`] if the lengths differ.
    /// - [`ModelError::NonFinite`] if any value is NaN or infinite.
    pub fn new(
        temperature: Vec<f64>,
        precipitation: Vec<f64>,
        pet: Vec<f64>,
    ) -> Result<Self, ModelError> {
        let n = temperature.len();
        if n == 0 {
            return Err(ModelError::InvalidInput {
                name: "temperature".to_string(),
                reason: "series is empty".to_string(),
            });
        }
        for (name, series) in [("precipitation", &precipitation), ("pet", &pet)] {
            if series.len() != n {
                return Err(ModelError::ShapeMismatch {
                    name: name.to_string(),
                    expected: n,
                    got: series.len(),
                });
            }
        }

        for (name, series) in [
            ("temperature", &temperature),
            ("precipitation", &precipitation),
            ("pet", &pet),
        ] {
            if series.iter().any(|v| !v.is_finite()) {
                return Err(ModelError::NonFinite {
                    name: name.to_string(),
                });
            }
        }
        for (name, series) in [("precipitation", &precipitation), ("pet", &pet)] {
            if let Some(i) = series.iter().position(|&v| v < 0.0) {
                return Err(ModelError::InvalidInput {
                    name: name.to_string(),
                    reason: format!("negative value {} at step {i}", series[i]),
                });
            }
        }

        Ok(Self {
            temperature,
            precipitation,
            pet,
        })
    }

    /// Number of time steps.
    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    /// Always `false`; empty forcing is rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }

    /// Air temperature per step.
    pub fn temperature(&self) -> &[f64] {
        &self.temperature
    }

    /// Precipitation per step.
    pub fn precipitation(&self) -> &[f64] {
        &self.precipitation
    }

    /// Potential evapotranspiration per step.
    pub fn pet(&self) -> &[f64] {
        &self.pet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_series() {
        let f = Forcing::new(vec![-3.0, 4.0], vec![0.0, 1.0], vec![0.5, 0.5]).unwrap();
        assert_eq!(f.len(), 2);
        assert!(!f.is_empty());
        assert_eq!(f.precipitation(), &[0.0, 1.0]);
    }

    #[test]
    fn rejects_empty() {
        let err = Forcing::new(vec![], vec![], vec![]).unwrap_err();
        assert!(matches!(err, ModelError::InvalidInput { .. }));
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = Forcing::new(vec![1.0, 2.0], vec![0.0], vec![0.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::ShapeMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn rejects_nan_temperature() {
        let err = Forcing::new(vec![f64::NAN], vec![0.0], vec![0.0]).unwrap_err();
        assert_eq!(err.to_string(), "non-finite value in temperature");
    }

    #[test]
    fn rejects_negative_precipitation() {
        let err = Forcing::new(vec![1.0, 1.0], vec![0.0, -0.1], vec![0.0, 0.0]).unwrap_err();
        assert!(err.to_string().contains("precipitation"));
    }
}
