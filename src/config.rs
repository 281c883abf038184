use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level hbvcal configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct HbvConfig {
    /// I/O settings.
    #[serde(default)]
    pub io: IoConfig,

    /// Catchment settings used to scale runoff depth to discharge.
    #[serde(default)]
    pub catchment: CatchmentToml,

    /// Global search settings.
    #[serde(default)]
    pub calibration: CalibrationToml,

    /// Objective and report metrics.
    #[serde(default)]
    pub objective: ObjectiveToml,

    /// Validation run settings.
    #[serde(default)]
    pub validation: ValidationToml,

    /// Calibration bounds, parameter name to `[lower, upper]`. Defaults to
    /// the built-in bounds when absent.
    #[serde(default)]
    pub bounds: Option<BTreeMap<String, [f64; 2]>>,
}

/// Reads and parses a TOML configuration file.
pub fn load(path: &Path) -> Result<HbvConfig> {
    let toml_str = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    toml::from_str(&toml_str).context("failed to parse TOML config")
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IoConfig {
    pub calibration_input: Option<PathBuf>,
    pub validation_input: Option<PathBuf>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_temperature_col")]
    pub temperature_col: String,
    #[serde(default = "default_precipitation_col")]
    pub precipitation_col: String,
    #[serde(default = "default_pet_col")]
    pub pet_col: String,
    #[serde(default = "default_reference_col")]
    pub reference_col: String,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            calibration_input: None,
            validation_input: None,
            output_dir: default_output_dir(),
            delimiter: default_delimiter(),
            temperature_col: default_temperature_col(),
            precipitation_col: default_precipitation_col(),
            pet_col: default_pet_col(),
            reference_col: default_reference_col(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_delimiter() -> String {
    ";".to_string()
}
fn default_temperature_col() -> String {
    "tem".to_string()
}
fn default_precipitation_col() -> String {
    "ppt".to_string()
}
fn default_pet_col() -> String {
    "pet".to_string()
}
fn default_reference_col() -> String {
    "dis_ref".to_string()
}

/// Either an explicit discharge scaler, or a catchment area from which one
/// is derived.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatchmentToml {
    #[serde(default)]
    pub area_m2: Option<f64>,
    #[serde(default = "default_seconds_per_step")]
    pub seconds_per_step: f64,
    #[serde(default)]
    pub discharge_scaler: Option<f64>,
}

impl Default for CatchmentToml {
    fn default() -> Self {
        Self {
            area_m2: None,
            seconds_per_step: default_seconds_per_step(),
            discharge_scaler: None,
        }
    }
}

fn default_seconds_per_step() -> f64 {
    86_400.0
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationToml {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_population_multiplier")]
    pub population_multiplier: usize,
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default)]
    pub abs_tolerance: f64,
    #[serde(default = "default_mutation")]
    pub mutation: [f64; 2],
    #[serde(default = "default_recombination")]
    pub recombination: f64,
    #[serde(default)]
    pub polish: bool,
    #[serde(default = "default_calibration_label")]
    pub label: String,
}

impl Default for CalibrationToml {
    fn default() -> Self {
        Self {
            seed: None,
            population_multiplier: default_population_multiplier(),
            max_generations: default_max_generations(),
            tolerance: default_tolerance(),
            abs_tolerance: 0.0,
            mutation: default_mutation(),
            recombination: default_recombination(),
            polish: false,
            label: default_calibration_label(),
        }
    }
}

fn default_population_multiplier() -> usize {
    3
}
fn default_max_generations() -> usize {
    1000
}
fn default_tolerance() -> f64 {
    0.01
}
fn default_mutation() -> [f64; 2] {
    [0.5, 1.0]
}
fn default_recombination() -> f64 {
    0.7
}
fn default_calibration_label() -> String {
    "cal".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectiveToml {
    #[serde(default = "default_objective_metrics")]
    pub metrics: Vec<String>,
    #[serde(default = "default_report_metrics")]
    pub report_metrics: Vec<String>,
    #[serde(default = "default_lns_penalty")]
    pub lns_penalty: f64,
}

impl Default for ObjectiveToml {
    fn default() -> Self {
        Self {
            metrics: default_objective_metrics(),
            report_metrics: default_report_metrics(),
            lns_penalty: default_lns_penalty(),
        }
    }
}

fn default_objective_metrics() -> Vec<String> {
    vec!["ns".to_string()]
}
fn default_report_metrics() -> Vec<String> {
    ["ns", "lns", "kg", "pc", "sc"].map(String::from).to_vec()
}
fn default_lns_penalty() -> f64 {
    -25.0
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationToml {
    #[serde(default = "default_warmup_steps")]
    pub warmup_steps: usize,
    #[serde(default = "default_report_metrics")]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub parameters: Option<PathBuf>,
    #[serde(default = "default_validation_label")]
    pub label: String,
}

impl Default for ValidationToml {
    fn default() -> Self {
        Self {
            warmup_steps: default_warmup_steps(),
            metrics: default_report_metrics(),
            parameters: None,
            label: default_validation_label(),
        }
    }
}

fn default_warmup_steps() -> usize {
    365
}
fn default_validation_label() -> String {
    "val".to_string()
}
