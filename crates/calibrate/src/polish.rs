//! Local Nelder-Mead refinement of the global optimum.
//!
//! **Not part of the public API.**

use std::cell::RefCell;

use argmin::core::{CostFunction, Executor};
use argmin::solver::neldermead::NelderMead;
use tracing::{debug, warn};

use crate::error::CalibrateError;

/// Relative size of the initial simplex edges.
const SIMPLEX_STEP: f64 = 0.05;

/// Cost function for argmin. Points outside the box, or where the objective
/// rejects the trial, cost `f64::MAX`. A diverged objective is parked in
/// `diverged` and stops the solver.
struct BoundedCost<'a, F> {
    objective: RefCell<F>,
    bounds: &'a [(f64, f64)],
    diverged: &'a RefCell<Option<CalibrateError>>,
}

impl<F> CostFunction for BoundedCost<'_, F>
where
    F: FnMut(&[f64]) -> Result<f64, CalibrateError>,
{
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        let inside = params
            .iter()
            .zip(self.bounds)
            .all(|(x, &(lo, hi))| (lo..=hi).contains(x));
        if !inside {
            return Ok(f64::MAX);
        }
        match (self.objective.borrow_mut())(params) {
            Ok(value) if value.is_finite() => Ok(value),
            Ok(value) => {
                warn!(value, "non-finite objective during polish, point rejected");
                Ok(f64::MAX)
            }
            Err(e @ CalibrateError::DivergedObjective { .. }) => {
                let reason = e.to_string();
                *self.diverged.borrow_mut() = Some(e);
                Err(argmin::core::Error::msg(reason))
            }
            Err(e) => {
                warn!(error = %e, "objective failed during polish, point rejected");
                Ok(f64::MAX)
            }
        }
    }
}

/// Runs Nelder-Mead from `start` and returns the better of the polished point
/// and the start.
///
/// A [`CalibrateError::DivergedObjective`] raised by the objective is
/// returned as is.
pub(crate) fn polish<F>(
    objective: F,
    bounds: &[(f64, f64)],
    start: &[f64],
    start_value: f64,
    max_iters: u64,
) -> Result<(Vec<f64>, f64), CalibrateError>
where
    F: FnMut(&[f64]) -> Result<f64, CalibrateError>,
{
    let mut simplex = Vec::with_capacity(start.len() + 1);
    simplex.push(start.to_vec());
    for (j, &(lo, hi)) in bounds.iter().enumerate() {
        let step = SIMPLEX_STEP * (hi - lo);
        if step == 0.0 {
            continue;
        }
        let mut vertex = start.to_vec();
        vertex[j] = if start[j] + step <= hi {
            start[j] + step
        } else {
            start[j] - step
        };
        simplex.push(vertex);
    }
    // Nelder-Mead needs at least two vertices; nothing to polish otherwise.
    if simplex.len() < 2 {
        return Ok((start.to_vec(), start_value));
    }

    let diverged = RefCell::new(None);
    let cost = BoundedCost {
        objective: RefCell::new(objective),
        bounds,
        diverged: &diverged,
    };
    let solver = NelderMead::new(simplex)
        .with_sd_tolerance(1e-8)
        .map_err(|e| CalibrateError::Polish {
            reason: e.to_string(),
        })?;
    let run = Executor::new(cost, solver)
        .configure(|state| state.max_iters(max_iters))
        .run();
    if let Some(err) = diverged.borrow_mut().take() {
        return Err(err);
    }
    let result = run.map_err(|e| CalibrateError::Polish {
        reason: e.to_string(),
    })?;

    let state = result.state();
    let polished = state
        .best_param
        .as_ref()
        .ok_or_else(|| CalibrateError::Polish {
            reason: "no best parameter".to_string(),
        })?;
    let polished_value = state.best_cost;
    debug!(start_value, polished_value, "nelder-mead polish finished");

    if polished_value < start_value {
        Ok((polished.clone(), polished_value))
    } else {
        Ok((start.to_vec(), start_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bowl(x: &[f64]) -> Result<f64, CalibrateError> {
        Ok((x[0] - 0.3).powi(2) + 2.0 * (x[1] - 0.7).powi(2))
    }

    #[test]
    fn improves_nearby_start() {
        let bounds = [(0.0, 1.0), (0.0, 1.0)];
        let start = [0.4, 0.6];
        let start_value = bowl(&start).unwrap();
        let (best, value) = polish(bowl, &bounds, &start, start_value, 500).unwrap();
        assert!(value < start_value);
        assert!((best[0] - 0.3).abs() < 1e-3);
        assert!((best[1] - 0.7).abs() < 1e-3);
    }

    #[test]
    fn never_leaves_bounds() {
        // Minimum lies outside the box at x = 0.3 < 0.5.
        let bounds = [(0.5, 1.0), (0.0, 1.0)];
        let start = [0.6, 0.7];
        let (best, _) = polish(bowl, &bounds, &start, bowl(&start).unwrap(), 500).unwrap();
        assert!(best[0] >= 0.5);
    }

    #[test]
    fn rejected_trials_keep_start() {
        let bounds = [(0.0, 1.0)];
        let (best, value) = polish(
            |_| Err(CalibrateError::configuration("trial", "rejected")),
            &bounds,
            &[0.5],
            1.0,
            50,
        )
        .unwrap();
        assert_eq!(best, vec![0.5]);
        assert_eq!(value, 1.0);
    }

    #[test]
    fn diverged_objective_propagates() {
        let bounds = [(0.0, 1.0)];
        let err = polish(
            |_| Err(CalibrateError::DivergedObjective { value: f64::NAN }),
            &bounds,
            &[0.5],
            1.0,
            50,
        )
        .unwrap_err();
        assert!(matches!(err, CalibrateError::DivergedObjective { .. }));
    }
}
