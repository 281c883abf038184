//! Writing result tables.
//!
//! Every table has a header row and uses fixed float formats: six decimals
//! for model outputs, parameters and performance rows, one decimal for
//! discharge. `NaN` is written as an empty cell.

use std::path::Path;

use hbvcal_model::{OutputColumn, OutputTable, Parameters};
use tracing::debug;

use crate::error::IoError;

/// Decimals used for outputs, parameters and performance rows.
pub const VALUE_DECIMALS: usize = 6;
/// Decimals used for the discharge comparison table.
pub const DISCHARGE_DECIMALS: usize = 1;

fn format_value(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{value:.decimals$}")
    }
}

fn create(path: &Path, delimiter: u8) -> Result<csv::Writer<std::fs::File>, IoError> {
    csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| IoError::table(path, e))
}

fn check_index(index: &[String], n_rows: usize, name: &str) -> Result<(), IoError> {
    if index.len() != n_rows {
        return Err(IoError::Validation {
            count: 1,
            details: format!("{name} has {n_rows} rows but index has {}", index.len()),
        });
    }
    Ok(())
}

/// Write the full model output table, one column per [`OutputColumn`].
///
/// # Errors
///
/// - [`IoError::Validation`] if `index` length differs from the table.
/// - [`IoError::Table`] if the file cannot be written.
pub fn write_outputs(
    path: &Path,
    index_name: &str,
    index: &[String],
    table: &OutputTable,
    delimiter: u8,
) -> Result<(), IoError> {
    check_index(index, table.n_steps(), "output table")?;
    let mut writer = create(path, delimiter)?;

    let header = std::iter::once(index_name).chain(OutputColumn::ALL.iter().map(|c| c.name()));
    writer
        .write_record(header)
        .map_err(|e| IoError::table(path, e))?;
    for (t, label) in index.iter().enumerate() {
        let row = table.row(t);
        let record = std::iter::once(label.clone())
            .chain(row.iter().map(|&v| format_value(v, VALUE_DECIMALS)));
        writer
            .write_record(record)
            .map_err(|e| IoError::table(path, e))?;
    }
    writer.flush().map_err(|e| IoError::table(path, e.into()))?;
    debug!(path = %path.display(), rows = index.len(), "wrote output table");
    Ok(())
}

/// Write reference and simulated discharge side by side (`ref`, `sim`).
///
/// # Errors
///
/// - [`IoError::Validation`] if the series and index lengths differ.
/// - [`IoError::Table`] if the file cannot be written.
pub fn write_discharge(
    path: &Path,
    index_name: &str,
    index: &[String],
    reference: &[f64],
    simulated: &[f64],
    delimiter: u8,
) -> Result<(), IoError> {
    check_index(index, reference.len(), "reference discharge")?;
    check_index(index, simulated.len(), "simulated discharge")?;
    let mut writer = create(path, delimiter)?;

    writer
        .write_record([index_name, "ref", "sim"])
        .map_err(|e| IoError::table(path, e))?;
    for ((label, &r), &s) in index.iter().zip(reference).zip(simulated) {
        writer
            .write_record([
                label.clone(),
                format_value(r, DISCHARGE_DECIMALS),
                format_value(s, DISCHARGE_DECIMALS),
            ])
            .map_err(|e| IoError::table(path, e))?;
    }
    writer.flush().map_err(|e| IoError::table(path, e.into()))?;
    debug!(path = %path.display(), rows = index.len(), "wrote discharge table");
    Ok(())
}

/// Write labelled values as a two-column `name;value` table.
///
/// # Errors
///
/// Returns [`IoError::Table`] if the file cannot be written.
pub fn write_series<'a, I>(path: &Path, rows: I, delimiter: u8) -> Result<(), IoError>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut writer = create(path, delimiter)?;
    writer
        .write_record(["name", "value"])
        .map_err(|e| IoError::table(path, e))?;
    for (name, value) in rows {
        writer
            .write_record([name.to_string(), format_value(value, VALUE_DECIMALS)])
            .map_err(|e| IoError::table(path, e))?;
    }
    writer.flush().map_err(|e| IoError::table(path, e.into()))?;
    debug!(path = %path.display(), "wrote series");
    Ok(())
}

/// Write a parameter set in canonical order, readable by
/// [`read_parameters`](crate::read_parameters).
///
/// # Errors
///
/// Returns [`IoError::Table`] if the file cannot be written.
pub fn write_parameters(path: &Path, params: &Parameters, delimiter: u8) -> Result<(), IoError> {
    write_series(path, params.labelled(), delimiter)
}
