//! Calibrate command: search the parameter space and write the results.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use hbvcal_calibrate::Calibrator;
use hbvcal_io::{read_forcing, write_discharge, write_outputs, write_parameters};

use crate::cli::CalibrateArgs;
use crate::config;
use crate::convert;
use crate::output;

/// Run the calibration pipeline.
pub fn run(args: CalibrateArgs) -> Result<()> {
    let _cmd = info_span!("calibrate").entered();
    // 1. Load project TOML
    let config = config::load(&args.config)?;

    // 2. Resolve paths and build configs
    let input = args
        .input
        .as_ref()
        .or(config.io.calibration_input.as_ref())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "no input path: set [io].calibration_input in config or use --input"
            )
        })?;
    let output_dir = args.output_dir.as_ref().unwrap_or(&config.io.output_dir);
    let label = &config.calibration.label;
    let reader_cfg = convert::build_reader_config(&config.io)?;
    let delimiter = reader_cfg.delimiter();
    let scaler = convert::resolve_scaler(&config.catchment)?;
    let calibrate_cfg =
        convert::build_calibrate_config(&config.calibration, &config.objective, args.seed)?;
    let bounds = convert::build_bounds(config.bounds.as_ref());

    // 3. Read forcing and reference
    info!(path = %input.display(), "reading forcing table");
    let table = read_forcing(input, &reader_cfg)
        .with_context(|| format!("failed to read forcing: {}", input.display()))?;
    let index_name = table.index_name().to_string();
    let (index, forcing, reference) = table.into_parts();
    let reference = reference.with_context(|| {
        format!(
            "column '{}' is required for calibration",
            config.io.reference_col
        )
    })?;

    // 4. Calibrate
    let mut calibrator = Calibrator::new(calibrate_cfg).context("invalid calibration setup")?;
    let result = calibrator
        .calibrate(forcing, &reference, scaler, &bounds)
        .context("calibration failed")?;
    info!(
        objective = result.objective(),
        generations = result.generations(),
        converged = result.converged(),
        "calibration complete"
    );

    // 5. Write outputs
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let path = output::outputs_path(output_dir, label);
    write_outputs(&path, &index_name, &index, result.outputs(), delimiter)
        .with_context(|| format!("failed to write outputs: {}", path.display()))?;

    let path = output::discharge_path(output_dir, label);
    write_discharge(
        &path,
        &index_name,
        &index,
        result.reference(),
        result.discharge(),
        delimiter,
    )
    .with_context(|| format!("failed to write discharge: {}", path.display()))?;

    let path = output::parameters_path(output_dir, label);
    write_parameters(&path, result.parameters(), delimiter)
        .with_context(|| format!("failed to write parameters: {}", path.display()))?;

    output::write_performance(
        &output::performance_path(output_dir, label),
        &result.report().rows(),
        delimiter,
    )?;
    output::write_json(&output::summary_path(output_dir, label), &result.summary())?;
    info!(dir = %output_dir.display(), "calibration results written");

    for row in result.report().rows() {
        println!("{:>6}: {:.6}", row.name, row.value);
    }
    Ok(())
}
