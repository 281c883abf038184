//! Pure conversion functions: TOML config structs -> crate API config types.

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};

use crate::config::*;

use hbvcal_calibrate::{CalibrateConfig, ValidationConfig};
use hbvcal_efficiency::Metric;
use hbvcal_io::ReaderConfig;
use hbvcal_model::{ParameterSpace, discharge_scaler};

/// Parses metric names (`ns`, `lns`, `kg`, `pc`, `sc`, `sp`, `ns_dc`,
/// case-insensitive).
pub fn parse_metrics(names: &[String]) -> Result<Vec<Metric>> {
    names
        .iter()
        .map(|name| {
            Metric::from_name(name).with_context(|| format!("unknown efficiency metric: {name:?}"))
        })
        .collect()
}

/// Parses a single-byte field delimiter.
pub fn parse_delimiter(s: &str) -> Result<u8> {
    match s.as_bytes() {
        [b] => Ok(*b),
        _ => bail!("delimiter must be a single byte, got {s:?}"),
    }
}

/// Builds a [`ReaderConfig`] from the TOML I/O configuration.
pub fn build_reader_config(io: &IoConfig) -> Result<ReaderConfig> {
    let cfg = ReaderConfig::default()
        .with_delimiter(parse_delimiter(&io.delimiter)?)
        .with_temperature_col(&io.temperature_col)
        .with_precipitation_col(&io.precipitation_col)
        .with_pet_col(&io.pet_col)
        .with_reference_col(Some(&io.reference_col));
    cfg.validate().context("invalid [io] configuration")?;
    Ok(cfg)
}

/// Resolves the discharge scaler: an explicit value wins, otherwise it is
/// derived from the catchment area.
pub fn resolve_scaler(catchment: &CatchmentToml) -> Result<f64> {
    match (catchment.discharge_scaler, catchment.area_m2) {
        (Some(scaler), None) => Ok(scaler),
        (None, Some(area)) => discharge_scaler(area, catchment.seconds_per_step)
            .context("invalid [catchment] configuration"),
        (Some(_), Some(_)) => {
            bail!("[catchment] must set exactly one of discharge_scaler or area_m2, got both")
        }
        (None, None) => {
            bail!("[catchment] must set exactly one of discharge_scaler or area_m2, got neither")
        }
    }
}

/// Builds a [`CalibrateConfig`] from the calibration and objective sections.
///
/// An optional seed override takes precedence over the config file.
pub fn build_calibrate_config(
    calibration: &CalibrationToml,
    objective: &ObjectiveToml,
    seed: Option<u64>,
) -> Result<CalibrateConfig> {
    let [mut_lo, mut_hi] = calibration.mutation;
    let mut cfg = CalibrateConfig::new()
        .with_objective_metrics(&parse_metrics(&objective.metrics)?)
        .with_report_metrics(&parse_metrics(&objective.report_metrics)?)
        .with_population_multiplier(calibration.population_multiplier)
        .with_max_generations(calibration.max_generations)
        .with_tolerance(calibration.tolerance)
        .with_abs_tolerance(calibration.abs_tolerance)
        .with_mutation(mut_lo, mut_hi)
        .with_recombination(calibration.recombination)
        .with_polish(calibration.polish)
        .with_lns_penalty(objective.lns_penalty);
    if let Some(s) = seed.or(calibration.seed) {
        cfg = cfg.with_seed(s);
    }
    cfg.validate().context("invalid calibration configuration")?;
    Ok(cfg)
}

/// Builds a [`ValidationConfig`] from the validation and objective sections.
pub fn build_validation_config(
    validation: &ValidationToml,
    objective: &ObjectiveToml,
) -> Result<ValidationConfig> {
    let cfg = ValidationConfig::new()
        .with_warmup_steps(validation.warmup_steps)
        .with_metrics(&parse_metrics(&validation.metrics)?)
        .with_lns_penalty(objective.lns_penalty);
    cfg.validate().context("invalid [validation] configuration")?;
    Ok(cfg)
}

/// Converts the `[bounds]` table, falling back to the built-in bounds.
pub fn build_bounds(bounds: Option<&BTreeMap<String, [f64; 2]>>) -> BTreeMap<String, (f64, f64)> {
    match bounds {
        Some(map) => map
            .iter()
            .map(|(name, &[lo, hi])| (name.clone(), (lo, hi)))
            .collect(),
        None => ParameterSpace::default_calibration_bounds(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_parse_case_insensitive() {
        let names = ["NS".to_string(), "ns_dc".to_string()];
        assert_eq!(parse_metrics(&names).unwrap(), vec![Metric::Ns, Metric::NsDc]);
        assert!(parse_metrics(&["rmse".to_string()]).is_err());
    }

    #[test]
    fn delimiter_must_be_one_byte() {
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("").is_err());
    }

    #[test]
    fn scaler_from_area() {
        let catchment = CatchmentToml {
            area_m2: Some(86_400_000.0),
            ..CatchmentToml::default()
        };
        assert!((resolve_scaler(&catchment).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn scaler_requires_exactly_one_source() {
        assert!(resolve_scaler(&CatchmentToml::default()).is_err());
        let both = CatchmentToml {
            area_m2: Some(1.0),
            discharge_scaler: Some(1.0),
            ..CatchmentToml::default()
        };
        assert!(resolve_scaler(&both).is_err());
    }

    #[test]
    fn seed_override_wins() {
        let calibration = CalibrationToml {
            seed: Some(1),
            ..CalibrationToml::default()
        };
        let cfg = build_calibrate_config(&calibration, &ObjectiveToml::default(), Some(9)).unwrap();
        assert_eq!(cfg.seed(), Some(9));
    }

    #[test]
    fn default_bounds_when_absent() {
        assert_eq!(build_bounds(None).len(), 23);
    }
}
