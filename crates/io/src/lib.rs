//! # hbvcal-io
//!
//! Read forcing tables and parameter sets, and write model outputs,
//! discharge comparisons and performance series as delimited text.
//! Bridges files into the slice-based APIs of `hbvcal-model` and
//! `hbvcal-calibrate`.
//!
//! Tables are `;`-separated by default, with a header row and an index
//! column first. Missing values are empty cells (or `nan`) and read as
//! `NaN`.

mod error;
mod reader;
mod writer;

pub use error::IoError;
pub use reader::{ForcingTable, ReaderConfig, read_forcing, read_parameters};
pub use writer::{
    DISCHARGE_DECIMALS, VALUE_DECIMALS, write_discharge, write_outputs, write_parameters,
    write_series,
};
