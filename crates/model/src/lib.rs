//! Lumped conceptual HBV rainfall-runoff model, variant 012A.
//!
//! The model keeps five water stores (snow, two soil layers, upper and lower
//! routing reservoirs) and advances them once per time step from
//! temperature, precipitation and potential evapotranspiration. It has 23
//! parameters: 5 initial store values and 18 process constants.
//!
//! # Pipeline
//!
//! ```text
//!  ┌──────────┐     ┌──────────────┐     ┌──────────────┐     ┌─────────────┐
//!  │   snow    │────▶│  soil 0 / 1  │────▶│  reservoirs  │────▶│  discharge  │
//!  │ (melt)    │     │ (infiltrate) │     │  (route)     │     │ (scale)     │
//!  └──────────┘     └──────────────┘     └──────────────┘     └─────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use hbvcal_model::ParameterSpace;
//!
//! let bounds = ParameterSpace::default_calibration_bounds();
//! let ordered = ParameterSpace::order_bounds(&bounds).unwrap();
//! assert_eq!(ordered.len(), 23);
//! ```

pub mod engine;
pub mod error;
pub mod forcing;
pub mod outputs;
pub mod params;
pub mod processes;

pub use engine::{RunMode, SimulationEngine, discharge_scaler};
pub use error::ModelError;
pub use forcing::Forcing;
pub use outputs::{N_OUTPUTS, OutputColumn, OutputTable};
pub use params::{N_PARAMS, Param, ParameterSpace, Parameters};
pub use processes::State;
