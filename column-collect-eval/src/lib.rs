//! This crate implements the column extraction benchmark on top of `column-collect-core`, including:
//! - Dataset generation and lookup for the `mvv_<name>` Parquet datasets
//! - Five column extraction strategies over the Arrow/Parquet readers
//! - The benchmark runner and its persisted result records
//! - Reporting over recorded results

pub mod config;
pub mod dataset;
pub mod extract;
pub mod record;
pub mod report;
pub mod runner;
pub mod util;
