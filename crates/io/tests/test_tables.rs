//! Integration tests: reading forcing tables and writing result tables.

use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use hbvcal_io::{
    IoError, ReaderConfig, read_forcing, read_parameters, write_discharge, write_outputs,
    write_parameters, write_series,
};
use hbvcal_model::{
    N_OUTPUTS, N_PARAMS, Param, ParameterSpace, Parameters, RunMode, SimulationEngine,
};

fn write_text(path: &Path, text: &str) {
    fs::write(path, text).expect("write fixture");
}

const FORCING: &str = "\
date;tem;ppt;pet;dis_ref
2000-01-01;-2.5;4.0;0.1;1.2
2000-01-02;0.5;0.0;0.3;
2000-01-03;3.0;12.5;0.8;nan
2000-01-04;6.0;0.0;1.1;2.4
";

#[test]
fn read_forcing_with_missing_reference() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("forcing.csv");
    write_text(&path, FORCING);

    let table = read_forcing(&path, &ReaderConfig::default()).expect("read succeeds");
    assert_eq!(table.len(), 4);
    assert_eq!(table.index_name(), "date");
    assert_eq!(table.index()[2], "2000-01-03");
    assert_eq!(table.forcing().temperature(), &[-2.5, 0.5, 3.0, 6.0]);
    assert_eq!(table.forcing().precipitation()[2], 12.5);

    let reference = table.reference().expect("reference column read");
    assert_relative_eq!(reference[0], 1.2);
    assert!(reference[1].is_nan());
    assert!(reference[2].is_nan());
    assert_relative_eq!(reference[3], 2.4);
}

#[test]
fn read_forcing_columns_in_any_order() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("forcing.csv");
    write_text(&path, "step;pet;ppt;tem\n0;1.0;2.0;3.0\n1;1.5;0.0;4.0\n");

    let config = ReaderConfig::default().with_reference_col(None::<String>);
    let table = read_forcing(&path, &config).expect("read succeeds");
    assert_eq!(table.forcing().temperature(), &[3.0, 4.0]);
    assert_eq!(table.forcing().pet(), &[1.0, 1.5]);
    assert!(table.reference().is_none());
}

#[test]
fn missing_column_reported() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("forcing.csv");
    write_text(&path, "date;tem;ppt\n1;2.0;3.0\n");

    let err = read_forcing(&path, &ReaderConfig::default()).unwrap_err();
    assert!(matches!(err, IoError::MissingColumn { ref name, .. } if name == "pet"));
}

#[test]
fn missing_forcing_value_rejected_by_model() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("forcing.csv");
    write_text(&path, "date;tem;ppt;pet;dis_ref\n1;;3.0;1.0;1.0\n");

    let err = read_forcing(&path, &ReaderConfig::default()).unwrap_err();
    assert!(matches!(err, IoError::Model(_)));
}

#[test]
fn garbage_cell_reported_with_line() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("forcing.csv");
    write_text(&path, "date;tem;ppt;pet;dis_ref\n1;1.0;3.0;1.0;1.0\n2;1.0;lots;1.0;1.0\n");

    let err = read_forcing(&path, &ReaderConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        IoError::InvalidValue { line: 3, ref column, .. } if column == "ppt"
    ));
}

#[test]
fn file_not_found() {
    let err = read_forcing(Path::new("/nonexistent/forcing.csv"), &ReaderConfig::default())
        .unwrap_err();
    assert!(matches!(err, IoError::FileNotFound { .. }));
}

#[test]
fn parameters_round_trip() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("prms.csv");

    let bounds = ParameterSpace::order_bounds(&ParameterSpace::default_calibration_bounds())
        .expect("default bounds valid");
    let values: Vec<f64> = bounds.iter().map(|&(lo, hi)| 0.25 * lo + 0.75 * hi).collect();
    let params = Parameters::from_slice(&values).expect("valid vector");

    write_parameters(&path, &params, b';').expect("write succeeds");
    let text = fs::read_to_string(&path).expect("read back");
    assert_eq!(text.lines().count(), N_PARAMS + 1);
    assert!(text.starts_with("name;value\nsnw_dth;"));

    let back = read_parameters(&path, b';').expect("read succeeds");
    for param in Param::ALL {
        assert_relative_eq!(back.get(param), params.get(param), epsilon = 1e-6);
    }
}

#[test]
fn repeated_parameter_rejected() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("prms.csv");
    write_text(&path, "name;value\nsnw_dth;1.0\nsnw_dth;2.0\n");

    let err = read_parameters(&path, b';').unwrap_err();
    assert!(matches!(err, IoError::Validation { count: 1, .. }));
}

#[test]
fn incomplete_parameter_set_rejected() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("prms.csv");
    write_text(&path, "name;value\nsnw_dth;1.0\n");

    let err = read_parameters(&path, b';').unwrap_err();
    assert!(matches!(err, IoError::Model(_)));
}

#[test]
fn output_and_discharge_tables() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let n = 5;
    let index: Vec<String> = (0..n).map(|t| format!("d{t}")).collect();

    let mut params = vec![0.2; N_PARAMS];
    params[Param::Sl0Fcy.index()] = 50.0;
    params[Param::Sl1Fcy.index()] = 80.0;
    params[Param::Sl1Pwp.index()] = 20.0;
    let mut engine = SimulationEngine::new();
    engine
        .set_inputs(vec![4.0; n], vec![10.0, 0.0, 5.0, 0.0, 0.0], vec![1.0; n])
        .expect("valid forcing");
    engine.set_outputs(n).expect("valid length");
    engine.set_parameters(&params).expect("valid parameters");
    engine.set_discharge_scaler(1.0).expect("valid scaler");
    engine.set_mode(RunMode::Full);
    engine.run().expect("run succeeds");

    let out_path = dir.path().join("sim_cal_otps_df.csv");
    let table = engine.outputs().expect("full mode keeps outputs");
    write_outputs(&out_path, "date", &index, table, b';').expect("write succeeds");
    let text = fs::read_to_string(&out_path).expect("read back");
    let mut lines = text.lines();
    let header: Vec<&str> = lines.next().expect("header").split(';').collect();
    assert_eq!(header.len(), N_OUTPUTS + 1);
    assert_eq!(header[0], "date");
    assert_eq!(header[N_OUTPUTS], "mod_bal");
    let first: Vec<&str> = lines.next().expect("row").split(';').collect();
    assert_eq!(first[0], "d0");
    assert!(first[1..].iter().all(|c| c.split('.').nth(1).map(str::len) == Some(6)));

    let dis_path = dir.path().join("dis_sim_cal_df.csv");
    let reference = vec![1.04, f64::NAN, 2.0, 3.0, 4.0];
    write_discharge(&dis_path, "date", &index, &reference, engine.discharge(), b';')
        .expect("write succeeds");
    let text = fs::read_to_string(&dis_path).expect("read back");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "date;ref;sim");
    assert!(lines[1].starts_with("d0;1.0;"));
    assert!(lines[2].starts_with("d1;;"));

    let err = write_discharge(&dis_path, "date", &index, &reference[..3], engine.discharge(), b';')
        .unwrap_err();
    assert!(matches!(err, IoError::Validation { .. }));
}

#[test]
fn performance_series() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("prf_cal_sr.csv");
    write_series(&path, [("OBJ", 0.125), ("NS", 0.875)], b';').expect("write succeeds");
    let text = fs::read_to_string(&path).expect("read back");
    assert_eq!(text, "name;value\nOBJ;0.125000\nNS;0.875000\n");
}
