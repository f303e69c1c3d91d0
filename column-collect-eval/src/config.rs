//! Benchmark configuration, read from an optional TOML file.
//!
//! ```toml
//! data_dir = "benchmarks/data"
//! results_dir = "benchmarks/results"
//! batch_size = 8192
//!
//! [[datasets]]
//! name = "xsmall"
//! size = 1000
//! min_runtime_seconds = 20.0
//! ```
//!
//! Every key is optional. A `datasets` table, when present, replaces the default table entirely.

use std::{
  collections::HashSet,
  fs,
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::dataset::{self, default_datasets, DatasetSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
  /// Directory holding the `mvv_<name>` datasets
  pub data_dir: PathBuf,
  /// Directory the result records are written to
  pub results_dir: PathBuf,
  /// Rows per record batch when reading
  pub batch_size: usize,
  /// Maximum rows per row group when generating datasets
  pub row_group_size: usize,
  /// Seed for dataset generation
  pub seed: u64,
  pub datasets: Vec<DatasetSpec>,
}

impl Default for BenchConfig {
  fn default() -> Self {
    BenchConfig {
      data_dir: PathBuf::from("benchmarks/data"),
      results_dir: PathBuf::from("benchmarks/results"),
      batch_size: 8192,
      row_group_size: 1024 * 1024,
      seed: 42,
      datasets: default_datasets(),
    }
  }
}

impl BenchConfig {
  pub fn from_toml(content: &str) -> Result<Self> {
    let config: BenchConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
      .with_context(|| format!("failed to read config file {}", path.display()))?;
    Self::from_toml(&content)
      .with_context(|| format!("failed to parse config file {}", path.display()))
  }

  /// Load `path` if given, otherwise fall back to the defaults.
  pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
    match path {
      Some(path) => Self::load(path),
      None => Ok(Self::default()),
    }
  }

  pub fn validate(&self) -> Result<()> {
    ensure!(self.batch_size > 0, "batch_size must be positive");
    ensure!(self.row_group_size > 0, "row_group_size must be positive");

    let mut seen = HashSet::new();
    for dataset in &self.datasets {
      ensure!(!dataset.name.is_empty(), "dataset names must not be empty");
      ensure!(
        seen.insert(dataset.name.as_str()),
        "dataset `{}` is defined twice",
        dataset.name
      );
      ensure!(
        Duration::try_from_secs_f64(dataset.min_runtime_seconds).is_ok(),
        "dataset `{}` has an invalid min_runtime_seconds {}",
        dataset.name,
        dataset.min_runtime_seconds
      );
    }
    Ok(())
  }

  pub fn select_datasets(&self, names: &[String]) -> Result<Vec<&DatasetSpec>> {
    dataset::select(&self.datasets, names)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_toml_is_default() {
    assert_eq!(BenchConfig::default(), BenchConfig::from_toml("").unwrap());
  }

  #[test]
  fn test_partial_toml() {
    let config = BenchConfig::from_toml(
      r#"
      results_dir = "/tmp/results"
      batch_size = 1024

      [[datasets]]
      name = "tiny"
      size = 10
      min_runtime_seconds = 0.5
      "#,
    )
    .unwrap();

    assert_eq!(PathBuf::from("/tmp/results"), config.results_dir);
    assert_eq!(PathBuf::from("benchmarks/data"), config.data_dir);
    assert_eq!(1024, config.batch_size);
    assert_eq!(1, config.datasets.len());
    assert_eq!("tiny", config.datasets[0].name);
    assert_eq!(Duration::from_millis(500), config.datasets[0].min_runtime());
  }

  #[test]
  fn test_rejects_invalid() {
    assert!(BenchConfig::from_toml("batch_size = 0").is_err());
    assert!(BenchConfig::from_toml("batch_size = \"many\"").is_err());

    let duplicated = r#"
      [[datasets]]
      name = "a"
      size = 1
      min_runtime_seconds = 1.0

      [[datasets]]
      name = "a"
      size = 2
      min_runtime_seconds = 1.0
    "#;
    assert!(BenchConfig::from_toml(duplicated).is_err());

    let negative = r#"
      [[datasets]]
      name = "a"
      size = 1
      min_runtime_seconds = -1.0
    "#;
    assert!(BenchConfig::from_toml(negative).is_err());

    let unrepresentable = r#"
      [[datasets]]
      name = "a"
      size = 1
      min_runtime_seconds = 1e20
    "#;
    assert!(BenchConfig::from_toml(unrepresentable).is_err());
  }

  #[test]
  fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.toml");
    fs::write(&path, "seed = 7\n").unwrap();

    let config = BenchConfig::load_or_default(Some(&path)).unwrap();
    assert_eq!(7, config.seed);
    assert!(BenchConfig::load(dir.path().join("missing.toml")).is_err());
  }
}
