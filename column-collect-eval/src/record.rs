use std::{
  fs,
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dataset::DatasetSpec;

/// Persisted summary of one (test, dataset) measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
  pub test_name: String,
  pub dataset: String,
  pub dataset_size: usize,
  /// Elapsed seconds, one entry per measured repetition
  pub runtimes: Vec<f64>,
}

impl BenchmarkRecord {
  pub fn new(test_name: impl Into<String>, dataset: &DatasetSpec, runtimes: &[Duration]) -> Self {
    BenchmarkRecord {
      test_name: test_name.into(),
      dataset: dataset.name.clone(),
      dataset_size: dataset.size,
      runtimes: runtimes.iter().map(Duration::as_secs_f64).collect(),
    }
  }

  /// `<test name>_<dataset name>.json`
  pub fn file_name(&self) -> String {
    format!("{}_{}.json", self.test_name, self.dataset)
  }

  /// Pretty JSON with four-space indentation.
  pub fn to_json(&self) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    self.serialize(&mut serializer)?;
    Ok(String::from_utf8(buffer)?)
  }

  /// Write the record into `dir`, creating it if needed, and return the file path.
  pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
      .with_context(|| format!("failed to create results directory {}", dir.display()))?;

    let path = dir.join(self.file_name());
    fs::write(&path, self.to_json()?)
      .with_context(|| format!("failed to write results file {}", path.display()))?;
    Ok(path)
  }

  pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
      .with_context(|| format!("failed to read results file {}", path.display()))?;
    serde_json::from_str(&content)
      .with_context(|| format!("failed to parse results file {}", path.display()))
  }
}

/// Read every `*.json` record in `dir`, in file name order.
pub fn load_all(dir: impl AsRef<Path>) -> Result<Vec<BenchmarkRecord>> {
  let dir = dir.as_ref();
  let mut paths = Vec::new();
  for entry in
    fs::read_dir(dir).with_context(|| format!("failed to list results in {}", dir.display()))?
  {
    let path = entry?.path();
    if path.extension().map_or(false, |extension| extension == "json") {
      paths.push(path);
    }
  }
  paths.sort();

  paths.iter().map(BenchmarkRecord::read_from).collect()
}
