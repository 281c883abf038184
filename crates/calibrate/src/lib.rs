//! Calibration and validation of the HBV 012A model.
//!
//! Calibration searches the 23-dimensional parameter box for the set that
//! minimises `OBJ = sum(1 - metric)` over the chosen efficiency metrics,
//! scoring simulated discharge only at steps where the reference is
//! observed. A non-finite LNS is replaced by a fixed penalty.
//!
//! # Pipeline
//!
//! ```text
//!  ┌────────────┐   ┌───────────────┐   ┌──────────────┐   ┌──────────────┐
//!  │  bounds    │──▶│ differential  │──▶│ Nelder-Mead  │──▶│  full run +  │
//!  │ (by name)  │   │  evolution    │   │ (optional)   │   │  report      │
//!  └────────────┘   └───────────────┘   └──────────────┘   └──────────────┘
//!                          │ reduced-mode runs
//!                          ▼
//!                  ┌───────────────┐
//!                  │  objective    │
//!                  └───────────────┘
//! ```
//!
//! [`validate_run`] scores an already calibrated set on another period,
//! excluding a warm-up.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use hbvcal_calibrate::{CalibrateConfig, Calibrator};
//! use hbvcal_model::{Forcing, ParameterSpace};
//!
//! # fn load() -> (Forcing, Vec<f64>) { unimplemented!() }
//! let (forcing, reference) = load();
//! let config = CalibrateConfig::new().with_seed(1).with_max_generations(100);
//! let mut calibrator = Calibrator::new(config).unwrap();
//! let result = calibrator
//!     .calibrate(forcing, &reference, 1.0, &ParameterSpace::default_calibration_bounds())
//!     .unwrap();
//! println!("OBJ = {}", result.objective());
//! ```

pub mod calibrator;
pub mod config;
pub mod error;
pub mod minimizer;
pub mod objective;
mod polish;
pub mod result;
pub mod validate;

pub use calibrator::Calibrator;
pub use config::{CalibrateConfig, LNS_PENALTY_RANGE, ValidationConfig};
pub use error::CalibrateError;
pub use minimizer::{DifferentialEvolution, Minimizer, MinimizerResult};
pub use objective::{ObjectiveFunction, objective_value};
pub use result::{
    CalibrationResult, CalibrationSummary, NamedValue, OBJECTIVE_LABEL, PerformanceReport,
    ValidationResult,
};
pub use validate::validate_run;
