//! Output file naming and the writers shared by both subcommands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use hbvcal_calibrate::NamedValue;
use hbvcal_io::write_series;

/// Model output table: `sim_{label}_otps_df.csv`.
pub fn outputs_path(dir: &Path, label: &str) -> PathBuf {
    dir.join(format!("sim_{label}_otps_df.csv"))
}

/// Reference/simulated discharge pair: `dis_sim_{label}_df.csv`.
pub fn discharge_path(dir: &Path, label: &str) -> PathBuf {
    dir.join(format!("dis_sim_{label}_df.csv"))
}

/// Parameter series: `prms_{label}_sr.csv`.
pub fn parameters_path(dir: &Path, label: &str) -> PathBuf {
    dir.join(format!("prms_{label}_sr.csv"))
}

/// Performance series: `prf_{label}_sr.csv`.
pub fn performance_path(dir: &Path, label: &str) -> PathBuf {
    dir.join(format!("prf_{label}_sr.csv"))
}

/// JSON summary: `summary_{label}.json`.
pub fn summary_path(dir: &Path, label: &str) -> PathBuf {
    dir.join(format!("summary_{label}.json"))
}

/// Writes `OBJ` and metric rows as a two-column series.
pub fn write_performance(path: &Path, rows: &[NamedValue], delimiter: u8) -> Result<()> {
    write_series(
        path,
        rows.iter().map(|r| (r.name.as_str(), r.value)),
        delimiter,
    )
    .with_context(|| format!("failed to write performance: {}", path.display()))
}

/// Serialises `value` as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialise summary")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write summary: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_carry_label() {
        let dir = Path::new("out");
        assert_eq!(outputs_path(dir, "cal"), PathBuf::from("out/sim_cal_otps_df.csv"));
        assert_eq!(discharge_path(dir, "val"), PathBuf::from("out/dis_sim_val_df.csv"));
        assert_eq!(parameters_path(dir, "cal"), PathBuf::from("out/prms_cal_sr.csv"));
        assert_eq!(performance_path(dir, "cal"), PathBuf::from("out/prf_cal_sr.csv"));
    }
}
