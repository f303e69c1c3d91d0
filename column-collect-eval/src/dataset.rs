use std::{
  fs,
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// A named, sized dataset together with the minimum total runtime each of its measurements
/// must reach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSpec {
  pub name: String,
  pub size: usize,
  pub min_runtime_seconds: f64,
}

impl DatasetSpec {
  pub fn new(name: impl Into<String>, size: usize, min_runtime_seconds: f64) -> Self {
    DatasetSpec {
      name: name.into(),
      size,
      min_runtime_seconds,
    }
  }

  /// Thresholds that do not fit a `Duration` are rejected by config validation, they map to zero
  /// here.
  pub fn min_runtime(&self) -> Duration {
    Duration::try_from_secs_f64(self.min_runtime_seconds).unwrap_or(Duration::ZERO)
  }

  /// Location of the dataset under `data_dir`: `<data_dir>/mvv_<name>`.
  pub fn path(&self, data_dir: impl AsRef<Path>) -> PathBuf {
    data_dir.as_ref().join(format!("mvv_{}", self.name))
  }
}

/// The four datasets measured by default, largest first.
pub fn default_datasets() -> Vec<DatasetSpec> {
  vec![
    DatasetSpec::new("large", 100_000_000, 1200.0),
    DatasetSpec::new("medium", 10_000_000, 360.0),
    DatasetSpec::new("small", 100_000, 20.0),
    DatasetSpec::new("xsmall", 1_000, 20.0),
  ]
}

/// Pick datasets by name, keeping the order of `datasets`. An empty selection means all of them.
pub fn select<'a>(datasets: &'a [DatasetSpec], names: &[String]) -> Result<Vec<&'a DatasetSpec>> {
  if names.is_empty() {
    return Ok(datasets.iter().collect());
  }

  for name in names {
    if !datasets.iter().any(|dataset| &dataset.name == name) {
      bail!("unknown dataset `{}`", name);
    }
  }

  Ok(
    datasets
      .iter()
      .filter(|dataset| names.contains(&dataset.name))
      .collect(),
  )
}

/// List the Parquet files backing a dataset path.
///
/// A file stands for itself. A directory stands for every `*.parquet` file directly inside it,
/// in lexical order, the way partitioned writers lay out their part files.
pub fn resolve_files(path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
  let path = path.as_ref();
  let metadata =
    fs::metadata(path).with_context(|| format!("dataset not found at {}", path.display()))?;

  if metadata.is_file() {
    return Ok(vec![path.to_path_buf()]);
  }

  let mut files = Vec::new();
  for entry in fs::read_dir(path).with_context(|| format!("failed to list {}", path.display()))? {
    let entry_path = entry?.path();
    let is_parquet = entry_path
      .extension()
      .map_or(false, |extension| extension == "parquet");
    if is_parquet && entry_path.is_file() {
      files.push(entry_path);
    }
  }
  files.sort();

  ensure!(
    !files.is_empty(),
    "no parquet files found in {}",
    path.display()
  );
  Ok(files)
}
