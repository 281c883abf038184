//! NaN-aware goodness-of-fit metrics for simulated discharge.
//!
//! An [`EfficiencyEngine`] is built once per reference series and then
//! scores any number of simulations against it. Reference-side constants
//! (means, denominators, log, rank and cumulative transforms) are computed
//! at construction, so a calibration loop only pays for the simulation side.
//!
//! | Metric | Definition |
//! |--------|------------|
//! | `NS` | `1 - Σ(ref-sim)² / Σ(ref-mean(ref))²` |
//! | `LNS` | `NS` of `ln(ref)` and `ln(sim)` |
//! | `KG` | `1 - sqrt((r-1)² + (β-1)² + (γ-1)²)` |
//! | `PC` | Pearson correlation |
//! | `SC` | Spearman correlation (average ranks) |
//! | `SP` | OLS slope of sim on ref |
//! | `NS_DC` | `NS` of the running sums |

pub mod config;
pub mod engine;
pub mod error;
pub mod metric;
mod reference;

pub use config::EfficiencyConfig;
pub use engine::{EfficiencyEngine, UNDEFINED_CORRELATION};
pub use error::EfficiencyError;
pub use metric::Metric;
