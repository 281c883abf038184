//! Bounded global minimisation.
//!
//! The [`Minimizer`] trait is the seam between calibration and the search
//! algorithm. [`DifferentialEvolution`] is the default implementation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::CalibrateConfig;
use crate::error::CalibrateError;

/// Outcome of a bounded minimisation.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizerResult {
    /// Best point found, within bounds.
    pub best: Vec<f64>,
    /// Objective value at `best`.
    pub best_value: f64,
    /// Generations (or iterations) performed.
    pub generations: usize,
    /// Objective evaluations performed.
    pub evaluations: usize,
    /// Whether the convergence criterion was met before the budget ran out.
    pub converged: bool,
}

/// A bounded, derivative-free minimiser.
pub trait Minimizer {
    /// Minimises `objective` over the box `bounds` (one `(lower, upper)` pair
    /// per dimension).
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::Configuration`] for unusable bounds and
    /// propagates any error returned by `objective`.
    fn minimize<F>(
        &mut self,
        objective: F,
        bounds: &[(f64, f64)],
    ) -> Result<MinimizerResult, CalibrateError>
    where
        F: FnMut(&[f64]) -> Result<f64, CalibrateError>;
}

/// Differential evolution with `best1bin` mutation.
///
/// Members live in the unit hypercube and are scaled onto the bounds for
/// evaluation. The population starts from a Latin hypercube sample. Each
/// generation draws one differential weight uniformly from the mutation
/// range; a trial replaces its parent when it is no worse, and the best
/// member is updated immediately. Trial components that leave the unit
/// interval are redrawn uniformly inside it.
///
/// The search stops when the standard deviation of the population energies
/// falls below `abs_tolerance + tolerance * |mean|`, or after
/// `max_generations`.
///
/// # Example
///
/// ```
/// use hbvcal_calibrate::{DifferentialEvolution, Minimizer};
///
/// let mut de = DifferentialEvolution::new()
///     .with_seed(7)
///     .with_population_multiplier(10)
///     .with_tolerance(0.0)
///     .with_max_generations(300);
/// let result = de
///     .minimize(|x| Ok((x[0] - 1.0).powi(2) + (x[1] + 2.0).powi(2)), &[(-5.0, 5.0), (-5.0, 5.0)])
///     .unwrap();
/// assert!((result.best[0] - 1.0).abs() < 1e-2);
/// assert!((result.best[1] + 2.0).abs() < 1e-2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DifferentialEvolution {
    population_multiplier: usize,
    max_generations: usize,
    tolerance: f64,
    abs_tolerance: f64,
    mutation: (f64, f64),
    recombination: f64,
    seed: Option<u64>,
}

impl Default for DifferentialEvolution {
    fn default() -> Self {
        Self::new()
    }
}

impl DifferentialEvolution {
    /// Creates a minimiser with the same defaults as [`CalibrateConfig`].
    pub fn new() -> Self {
        Self::from_config(&CalibrateConfig::new())
    }

    /// Takes the search settings from a calibration configuration.
    pub fn from_config(config: &CalibrateConfig) -> Self {
        Self {
            population_multiplier: config.population_multiplier(),
            max_generations: config.max_generations(),
            tolerance: config.tolerance(),
            abs_tolerance: config.abs_tolerance(),
            mutation: config.mutation(),
            recombination: config.recombination(),
            seed: config.seed(),
        }
    }

    /// Sets the population size as a multiple of the dimension.
    pub fn with_population_multiplier(mut self, multiplier: usize) -> Self {
        self.population_multiplier = multiplier;
        self
    }

    /// Sets the generation budget.
    pub fn with_max_generations(mut self, generations: usize) -> Self {
        self.max_generations = generations;
        self
    }

    /// Sets the relative convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Fixes the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Population size used for a problem of dimension `dim`.
    pub fn population_size(&self, dim: usize) -> usize {
        (self.population_multiplier * dim).max(5)
    }

    fn scale(unit: &[f64], bounds: &[(f64, f64)], out: &mut [f64]) {
        for ((x, &u), &(lo, hi)) in out.iter_mut().zip(unit).zip(bounds) {
            *x = lo + u * (hi - lo);
        }
    }

    fn latin_hypercube(rng: &mut StdRng, np: usize, dim: usize) -> Vec<Vec<f64>> {
        let mut population = vec![vec![0.0; dim]; np];
        let segment = 1.0 / np as f64;
        let mut order: Vec<usize> = (0..np).collect();
        for j in 0..dim {
            order.shuffle(rng);
            for (member, &k) in population.iter_mut().zip(&order) {
                member[j] = (k as f64 + rng.random::<f64>()) * segment;
            }
        }
        population
    }
}

fn validate_bounds(bounds: &[(f64, f64)]) -> Result<(), CalibrateError> {
    if bounds.is_empty() {
        return Err(CalibrateError::configuration("bounds", "no dimensions to search"));
    }
    for (j, &(lo, hi)) in bounds.iter().enumerate() {
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(CalibrateError::configuration(
                "bounds",
                format!("dimension {j} has unusable bounds ({lo}, {hi})"),
            ));
        }
    }
    Ok(())
}

fn mean_and_sd(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

impl Minimizer for DifferentialEvolution {
    fn minimize<F>(
        &mut self,
        mut objective: F,
        bounds: &[(f64, f64)],
    ) -> Result<MinimizerResult, CalibrateError>
    where
        F: FnMut(&[f64]) -> Result<f64, CalibrateError>,
    {
        validate_bounds(bounds)?;
        let dim = bounds.len();
        let np = self.population_size(dim);
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut population = Self::latin_hypercube(&mut rng, np, dim);
        let mut point = vec![0.0; dim];
        let mut energies = Vec::with_capacity(np);
        for member in &population {
            Self::scale(member, bounds, &mut point);
            energies.push(objective(&point)?);
        }
        let mut evaluations = np;

        let mut best = 0;
        for i in 1..np {
            if energies[i] < energies[best] {
                best = i;
            }
        }

        let (mut_lo, mut_hi) = self.mutation;
        let mut generations = 0;
        let mut converged = false;
        let mut trial = vec![0.0; dim];

        while generations < self.max_generations {
            generations += 1;
            let weight = if mut_hi > mut_lo {
                rng.random_range(mut_lo..mut_hi)
            } else {
                mut_lo
            };

            for i in 0..np {
                let mut r0 = rng.random_range(0..np);
                while r0 == i {
                    r0 = rng.random_range(0..np);
                }
                let mut r1 = rng.random_range(0..np);
                while r1 == i || r1 == r0 {
                    r1 = rng.random_range(0..np);
                }

                let j_rand = rng.random_range(0..dim);
                for j in 0..dim {
                    trial[j] = if j == j_rand || rng.random::<f64>() < self.recombination {
                        population[best][j] + weight * (population[r0][j] - population[r1][j])
                    } else {
                        population[i][j]
                    };
                    if !(0.0..=1.0).contains(&trial[j]) {
                        trial[j] = rng.random::<f64>();
                    }
                }

                Self::scale(&trial, bounds, &mut point);
                let energy = objective(&point)?;
                evaluations += 1;

                if energy <= energies[i] {
                    population[i].copy_from_slice(&trial);
                    energies[i] = energy;
                    if energy < energies[best] {
                        best = i;
                    }
                }
            }

            let (mean, sd) = mean_and_sd(&energies);
            debug!(generation = generations, best = energies[best], sd, "de generation");
            if sd <= self.abs_tolerance + self.tolerance * mean.abs() {
                converged = true;
                break;
            }
        }

        Self::scale(&population[best], bounds, &mut point);
        Ok(MinimizerResult {
            best: point,
            best_value: energies[best],
            generations,
            evaluations,
            converged,
        })
    }
}
