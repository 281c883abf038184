//! Calibration and validation configuration.

use hbvcal_efficiency::Metric;

use crate::error::CalibrateError;

/// Range within which the LNS penalty may be set.
pub const LNS_PENALTY_RANGE: (f64, f64) = (-30.0, -20.0);

/// Configuration for a calibration run.
///
/// Defaults follow a standard differential evolution setup: a population of
/// `3 × 23` members, `best1bin` mutation with dither in `[0.5, 1.0)`,
/// crossover probability `0.7`, at most 1000 generations and a relative
/// convergence tolerance of `0.01`. The objective is `1 - NS`.
///
/// # Example
///
/// ```
/// use hbvcal_calibrate::CalibrateConfig;
/// use hbvcal_efficiency::Metric;
///
/// let config = CalibrateConfig::new()
///     .with_objective_metrics(&[Metric::Ns, Metric::Lns])
///     .with_seed(42)
///     .with_max_generations(200);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrateConfig {
    objective_metrics: Vec<Metric>,
    report_metrics: Vec<Metric>,
    population_multiplier: usize,
    max_generations: usize,
    tolerance: f64,
    abs_tolerance: f64,
    mutation: (f64, f64),
    recombination: f64,
    seed: Option<u64>,
    polish: bool,
    lns_penalty: f64,
}

impl Default for CalibrateConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrateConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self {
            objective_metrics: vec![Metric::Ns],
            report_metrics: vec![Metric::Ns, Metric::Lns, Metric::Kg, Metric::Pc, Metric::Sc],
            population_multiplier: 3,
            max_generations: 1000,
            tolerance: 0.01,
            abs_tolerance: 0.0,
            mutation: (0.5, 1.0),
            recombination: 0.7,
            seed: None,
            polish: false,
            lns_penalty: -25.0,
        }
    }

    /// Sets the metrics summed into the objective.
    pub fn with_objective_metrics(mut self, metrics: &[Metric]) -> Self {
        self.objective_metrics = dedup_sorted(metrics);
        self
    }

    /// Sets the metrics of the final performance report.
    pub fn with_report_metrics(mut self, metrics: &[Metric]) -> Self {
        self.report_metrics = dedup_sorted(metrics);
        self
    }

    /// Sets the population size as a multiple of the parameter count.
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

    /// Sets the absolute convergence tolerance.
    pub fn with_abs_tolerance(mut self, tolerance: f64) -> Self {
        self.abs_tolerance = tolerance;
        self
    }

    /// Sets the dither range of the differential weight.
    pub fn with_mutation(mut self, lower: f64, upper: f64) -> Self {
        self.mutation = (lower, upper);
        self
    }

    /// Sets the crossover probability.
    pub fn with_recombination(mut self, recombination: f64) -> Self {
        self.recombination = recombination;
        self
    }

    /// Fixes the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables a local Nelder-Mead search from the best member.
    pub fn with_polish(mut self, polish: bool) -> Self {
        self.polish = polish;
        self
    }

    /// Sets the value substituted for a non-finite LNS.
    pub fn with_lns_penalty(mut self, penalty: f64) -> Self {
        self.lns_penalty = penalty;
        self
    }

    // --- Accessors ---

    /// Returns the objective metrics.
    pub fn objective_metrics(&self) -> &[Metric] {
        &self.objective_metrics
    }

    /// Returns the report metrics.
    pub fn report_metrics(&self) -> &[Metric] {
        &self.report_metrics
    }

    /// Returns the population multiplier.
    pub fn population_multiplier(&self) -> usize {
        self.population_multiplier
    }

    /// Returns the generation budget.
    pub fn max_generations(&self) -> usize {
        self.max_generations
    }

    /// Returns the relative convergence tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Returns the absolute convergence tolerance.
    pub fn abs_tolerance(&self) -> f64 {
        self.abs_tolerance
    }

    /// Returns the mutation dither range.
    pub fn mutation(&self) -> (f64, f64) {
        self.mutation
    }

    /// Returns the crossover probability.
    pub fn recombination(&self) -> f64 {
        self.recombination
    }

    /// Returns the seed, if fixed.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns whether polishing is enabled.
    pub fn polish(&self) -> bool {
        self.polish
    }

    /// Returns the LNS penalty.
    pub fn lns_penalty(&self) -> f64 {
        self.lns_penalty
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::Configuration`] naming the first invalid
    /// setting.
    pub fn validate(&self) -> Result<(), CalibrateError> {
        if self.objective_metrics.is_empty() {
            return Err(CalibrateError::configuration(
                "objective_metrics",
                "at least one metric must be selected",
            ));
        }
        if self.report_metrics.is_empty() {
            return Err(CalibrateError::configuration(
                "report_metrics",
                "at least one metric must be selected",
            ));
        }
        if self.population_multiplier == 0 {
            return Err(CalibrateError::configuration(
                "population_multiplier",
                "must be at least 1",
            ));
        }
        if self.max_generations == 0 {
            return Err(CalibrateError::configuration(
                "max_generations",
                "must be at least 1",
            ));
        }
        for (name, tol) in [
            ("tolerance", self.tolerance),
            ("abs_tolerance", self.abs_tolerance),
        ] {
            if !tol.is_finite() || tol < 0.0 {
                return Err(CalibrateError::configuration(
                    name,
                    format!("must be finite and non-negative, got {tol}"),
                ));
            }
        }
        let (lo, hi) = self.mutation;
        if !(0.0..2.0).contains(&lo) || !(0.0..2.0).contains(&hi) || lo > hi {
            return Err(CalibrateError::configuration(
                "mutation",
                format!("expected 0 <= lower <= upper < 2, got ({lo}, {hi})"),
            ));
        }
        if !(0.0..=1.0).contains(&self.recombination) {
            return Err(CalibrateError::configuration(
                "recombination",
                format!("must lie in [0, 1], got {}", self.recombination),
            ));
        }
        validate_lns_penalty(self.lns_penalty)
    }
}

/// Configuration for scoring a run with already calibrated parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationConfig {
    warmup_steps: usize,
    metrics: Vec<Metric>,
    lns_penalty: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationConfig {
    /// Creates a configuration with a one-year daily warm-up and the five
    /// report metrics.
    pub fn new() -> Self {
        Self {
            warmup_steps: 365,
            metrics: vec![Metric::Ns, Metric::Lns, Metric::Kg, Metric::Pc, Metric::Sc],
            lns_penalty: -25.0,
        }
    }

    /// Sets the number of leading steps excluded from scoring.
    pub fn with_warmup_steps(mut self, steps: usize) -> Self {
        self.warmup_steps = steps;
        self
    }

    /// Sets the metrics summed into OBJ and reported.
    pub fn with_metrics(mut self, metrics: &[Metric]) -> Self {
        self.metrics = dedup_sorted(metrics);
        self
    }

    /// Sets the value substituted for a non-finite LNS.
    pub fn with_lns_penalty(mut self, penalty: f64) -> Self {
        self.lns_penalty = penalty;
        self
    }

    /// Returns the warm-up length.
    pub fn warmup_steps(&self) -> usize {
        self.warmup_steps
    }

    /// Returns the metrics.
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Returns the LNS penalty.
    pub fn lns_penalty(&self) -> f64 {
        self.lns_penalty
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::Configuration`] if no metric is selected or
    /// the penalty is out of range.
    pub fn validate(&self) -> Result<(), CalibrateError> {
        if self.metrics.is_empty() {
            return Err(CalibrateError::configuration(
                "metrics",
                "at least one metric must be selected",
            ));
        }
        validate_lns_penalty(self.lns_penalty)
    }
}

fn validate_lns_penalty(penalty: f64) -> Result<(), CalibrateError> {
    let (lo, hi) = LNS_PENALTY_RANGE;
    if !(lo..=hi).contains(&penalty) {
        return Err(CalibrateError::configuration(
            "lns_penalty",
            format!("must lie in [{lo}, {hi}], got {penalty}"),
        ));
    }
    Ok(())
}

fn dedup_sorted(metrics: &[Metric]) -> Vec<Metric> {
    let mut out = metrics.to_vec();
    out.sort();
    out.dedup();
    out
}
