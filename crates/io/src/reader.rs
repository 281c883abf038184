//! Reading forcing and parameter tables.

use std::collections::BTreeMap;
use std::path::Path;

use hbvcal_model::{Forcing, Parameters};
use tracing::{debug, info};

use crate::error::IoError;

// ---------------------------------------------------------------------------
// ReaderConfig
// ---------------------------------------------------------------------------

/// Configuration for reading a forcing table.
///
/// The table has a header row, an index column first (dates or step
/// labels, kept as text) and one column per series. The [`Default`]
/// implementation matches the `;`-separated layout with columns `tem`,
/// `ppt`, `pet` and `dis_ref`.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Field separator.
    delimiter: u8,
    /// Temperature column name.
    temperature_col: String,
    /// Precipitation column name.
    precipitation_col: String,
    /// Potential evapotranspiration column name.
    pet_col: String,
    /// Reference discharge column name, or `None` to skip it.
    reference_col: Option<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            delimiter: b';',
            temperature_col: "tem".into(),
            precipitation_col: "ppt".into(),
            pet_col: "pet".into(),
            reference_col: Some("dis_ref".into()),
        }
    }
}

impl ReaderConfig {
    /// Set the field separator.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the temperature column name.
    pub fn with_temperature_col(mut self, name: impl Into<String>) -> Self {
        self.temperature_col = name.into();
        self
    }

    /// Set the precipitation column name.
    pub fn with_precipitation_col(mut self, name: impl Into<String>) -> Self {
        self.precipitation_col = name.into();
        self
    }

    /// Set the potential evapotranspiration column name.
    pub fn with_pet_col(mut self, name: impl Into<String>) -> Self {
        self.pet_col = name.into();
        self
    }

    /// Set the reference discharge column name, or `None` to skip it.
    pub fn with_reference_col(mut self, name: Option<impl Into<String>>) -> Self {
        self.reference_col = name.map(Into::into);
        self
    }

    /// Returns the field separator.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Validate that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] if a column name is empty or repeated,
    /// or the delimiter is a quote or line break.
    pub fn validate(&self) -> Result<(), IoError> {
        let mut problems = Vec::new();
        if matches!(self.delimiter, b'"' | b'\n' | b'\r') {
            problems.push(format!("delimiter {:?} is not usable", self.delimiter as char));
        }
        let names = self.column_names();
        for name in &names {
            if name.is_empty() {
                problems.push("column names must not be empty".to_string());
            }
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                problems.push(format!("column '{name}' requested twice"));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(IoError::Validation {
                count: problems.len(),
                details: problems.join("; "),
            })
        }
    }

    fn column_names(&self) -> Vec<&str> {
        let mut names = vec![
            self.temperature_col.as_str(),
            self.precipitation_col.as_str(),
            self.pet_col.as_str(),
        ];
        if let Some(reference) = &self.reference_col {
            names.push(reference);
        }
        names
    }
}

// ---------------------------------------------------------------------------
// ForcingTable
// ---------------------------------------------------------------------------

/// Forcing series and optional reference discharge read from one table.
#[derive(Debug, Clone)]
pub struct ForcingTable {
    index_name: String,
    index: Vec<String>,
    forcing: Forcing,
    reference: Option<Vec<f64>>,
}

impl ForcingTable {
    /// Header of the index column.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Index labels, one per step.
    pub fn index(&self) -> &[String] {
        &self.index
    }

    /// The validated forcing series.
    pub fn forcing(&self) -> &Forcing {
        &self.forcing
    }

    /// Reference discharge (`NaN` = missing), if the column was read.
    pub fn reference(&self) -> Option<&[f64]> {
        self.reference.as_deref()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Splits into index, forcing and reference.
    pub fn into_parts(self) -> (Vec<String>, Forcing, Option<Vec<f64>>) {
        (self.index, self.forcing, self.reference)
    }
}

/// Parses one numeric cell. Empty cells and `nan` read as `NaN`.
fn parse_cell(raw: &str, path: &Path, line: u64, column: &str) -> Result<f64, IoError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(f64::NAN);
    }
    trimmed.parse::<f64>().map_err(|_| IoError::InvalidValue {
        path: path.to_path_buf(),
        line,
        column: column.to_string(),
        value: raw.to_string(),
    })
}

fn open(path: &Path, delimiter: u8) -> Result<csv::Reader<std::fs::File>, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)
        .map_err(|e| IoError::table(path, e))
}

// ---------------------------------------------------------------------------
// read_forcing
// ---------------------------------------------------------------------------

/// Read forcing (and reference discharge) from a delimited table.
///
/// Missing forcing values are rejected by [`Forcing::new`]; missing
/// reference values become `NaN`.
///
/// # Errors
///
/// - [`IoError::FileNotFound`] if `path` does not exist.
/// - [`IoError::MissingColumn`] if a configured column is absent.
/// - [`IoError::InvalidValue`] if a cell is not a number.
/// - [`IoError::Validation`] if the table has no rows.
/// - [`IoError::Model`] if the forcing fails validation.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn read_forcing(path: &Path, config: &ReaderConfig) -> Result<ForcingTable, IoError> {
    config.validate()?;
    let mut reader = open(path, config.delimiter)?;

    let headers = reader.headers().map_err(|e| IoError::table(path, e))?.clone();
    let position = |name: &str| -> Result<usize, IoError> {
        headers
            .iter()
            .skip(1)
            .position(|h| h.trim() == name)
            .map(|i| i + 1)
            .ok_or_else(|| IoError::MissingColumn {
                name: name.to_string(),
                path: path.to_path_buf(),
            })
    };
    let index_name = headers.get(0).unwrap_or_default().trim().to_string();
    let tem_at = position(&config.temperature_col)?;
    let ppt_at = position(&config.precipitation_col)?;
    let pet_at = position(&config.pet_col)?;
    let ref_at = config
        .reference_col
        .as_deref()
        .map(|name| position(name).map(|i| (name, i)))
        .transpose()?;
    debug!(?headers, "resolved forcing columns");

    let mut index = Vec::new();
    let mut tem = Vec::new();
    let mut ppt = Vec::new();
    let mut pet = Vec::new();
    let mut reference = ref_at.map(|_| Vec::new());

    for record in reader.records() {
        let record = record.map_err(|e| IoError::table(path, e))?;
        let line = record.position().map_or(0, |p| p.line());
        let cell = |at: usize| record.get(at).unwrap_or_default();

        index.push(cell(0).trim().to_string());
        tem.push(parse_cell(cell(tem_at), path, line, &config.temperature_col)?);
        ppt.push(parse_cell(cell(ppt_at), path, line, &config.precipitation_col)?);
        pet.push(parse_cell(cell(pet_at), path, line, &config.pet_col)?);
        if let (Some(values), Some((name, at))) = (reference.as_mut(), ref_at) {
            values.push(parse_cell(cell(at), path, line, name)?);
        }
    }

    if index.is_empty() {
        return Err(IoError::Validation {
            count: 1,
            details: format!("{} has no data rows", path.display()),
        });
    }

    let forcing = Forcing::new(tem, ppt, pet)?;
    info!(
        n_steps = index.len(),
        has_reference = reference.is_some(),
        "read forcing table"
    );
    Ok(ForcingTable {
        index_name,
        index,
        forcing,
        reference,
    })
}

// ---------------------------------------------------------------------------
// read_parameters
// ---------------------------------------------------------------------------

/// Read a parameter set from a two-column `name;value` table with a header
/// row, as written by [`write_parameters`](crate::write_parameters).
///
/// # Errors
///
/// - [`IoError::FileNotFound`] if `path` does not exist.
/// - [`IoError::InvalidValue`] if a value is not a number.
/// - [`IoError::Validation`] if a row is short or a name repeats.
/// - [`IoError::Model`] if names are unknown or missing, or values leave
///   their absolute bounds.
pub fn read_parameters(path: &Path, delimiter: u8) -> Result<Parameters, IoError> {
    let mut reader = open(path, delimiter)?;
    let mut named = BTreeMap::new();
    let mut problems = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| IoError::table(path, e))?;
        let line = record.position().map_or(0, |p| p.line());
        let (Some(name), Some(raw)) = (record.get(0), record.get(1)) else {
            problems.push(format!("line {line} has fewer than two fields"));
            continue;
        };
        let name = name.trim().to_string();
        let value = parse_cell(raw, path, line, &name)?;
        if named.insert(name.clone(), value).is_some() {
            problems.push(format!("parameter '{name}' repeated"));
        }
    }
    if !problems.is_empty() {
        return Err(IoError::Validation {
            count: problems.len(),
            details: problems.join("; "),
        });
    }

    let params = Parameters::from_named(&named)?;
    debug!(path = %path.display(), "read parameter set");
    Ok(params)
}
