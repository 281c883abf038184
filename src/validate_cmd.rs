//! Validate command: score calibrated parameters on an independent period.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, info_span};

use hbvcal_calibrate::{NamedValue, validate_run};
use hbvcal_io::{read_forcing, read_parameters, write_discharge, write_outputs};

use crate::cli::ValidateArgs;
use crate::config;
use crate::convert;
use crate::output;

/// Digest written next to the validation tables.
#[derive(Serialize)]
struct ValidationSummary {
    parameters: String,
    warmup_steps: usize,
    scored_steps: usize,
    performance: Vec<NamedValue>,
}

/// Run the validation pipeline.
pub fn run(args: ValidateArgs) -> Result<()> {
    let _cmd = info_span!("validate").entered();
    // 1. Load project TOML
    let config = config::load(&args.config)?;

    // 2. Resolve paths and build configs
    let input = args
        .input
        .as_ref()
        .or(config.io.validation_input.as_ref())
        .ok_or_else(|| {
            anyhow::anyhow!("no input path: set [io].validation_input in config or use --input")
        })?;
    let output_dir = args.output_dir.as_ref().unwrap_or(&config.io.output_dir);
    let parameters_path = args
        .parameters
        .clone()
        .or_else(|| config.validation.parameters.clone())
        .unwrap_or_else(|| output::parameters_path(output_dir, &config.calibration.label));
    let label = &config.validation.label;
    let reader_cfg = convert::build_reader_config(&config.io)?;
    let delimiter = reader_cfg.delimiter();
    let scaler = convert::resolve_scaler(&config.catchment)?;
    let validation_cfg = convert::build_validation_config(&config.validation, &config.objective)?;

    // 3. Read forcing, reference and parameters
    info!(path = %input.display(), "reading forcing table");
    let table = read_forcing(input, &reader_cfg)
        .with_context(|| format!("failed to read forcing: {}", input.display()))?;
    let index_name = table.index_name().to_string();
    let (index, forcing, reference) = table.into_parts();
    let reference = reference.with_context(|| {
        format!(
            "column '{}' is required for validation",
            config.io.reference_col
        )
    })?;

    info!(path = %parameters_path.display(), "reading parameters");
    let params = read_parameters(&parameters_path, delimiter).with_context(|| {
        format!("failed to read parameters: {}", parameters_path.display())
    })?;

    // 4. Validate
    let result = validate_run(forcing, &reference, scaler, &params, &validation_cfg)
        .context("validation run failed")?;

    // 5. Write outputs
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let path = output::outputs_path(output_dir, label);
    write_outputs(&path, &index_name, &index, result.outputs(), delimiter)
        .with_context(|| format!("failed to write outputs: {}", path.display()))?;

    let path = output::discharge_path(output_dir, label);
    let scored_index = &index[result.warmup_steps()..];
    write_discharge(
        &path,
        &index_name,
        scored_index,
        result.reference(),
        result.discharge(),
        delimiter,
    )
    .with_context(|| format!("failed to write discharge: {}", path.display()))?;

    let rows = result.report().rows();
    output::write_performance(&output::performance_path(output_dir, label), &rows, delimiter)?;
    output::write_json(
        &output::summary_path(output_dir, label),
        &ValidationSummary {
            parameters: parameters_path.display().to_string(),
            warmup_steps: result.warmup_steps(),
            scored_steps: result.discharge().len(),
            performance: rows.clone(),
        },
    )?;
    info!(dir = %output_dir.display(), "validation results written");

    for row in rows {
        println!("{:>6}: {:.6}", row.name, row.value);
    }
    Ok(())
}
