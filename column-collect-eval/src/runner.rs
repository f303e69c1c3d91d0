use std::path::PathBuf;

use anyhow::{ensure, Result};
use column_collect_core::AutoTimer;

use crate::{
  config::BenchConfig,
  dataset::DatasetSpec,
  extract::{Session, Strategy},
  record::BenchmarkRecord,
  util::thousands,
};

/// Time one strategy on one dataset.
///
/// Opening the session is the untimed setup. Every timed run extracts the full column and checks
/// that it holds exactly `dataset.size` values.
pub fn measure(
  config: &BenchConfig,
  strategy: Strategy,
  dataset: &DatasetSpec,
) -> Result<BenchmarkRecord> {
  let path = dataset.path(&config.data_dir);
  let label = format!("{} on {}", strategy, dataset.name);
  let timer = AutoTimer::new(dataset.min_runtime());

  let runtimes = timer.run(
    &label,
    || Session::open(&path, config.batch_size),
    |session| {
      let values = strategy.extract(session)?;
      ensure!(
        values.len() == dataset.size,
        "{} extracted {} values from dataset `{}`, expected {}",
        strategy,
        values.len(),
        dataset.name,
        dataset.size
      );
      Ok(values)
    },
  )?;

  Ok(BenchmarkRecord::new(strategy.name(), dataset, &runtimes))
}

/// Measure every strategy against every dataset, strategies in the outer loop, and write one
/// record per pair into the results directory. Returns the written paths in run order.
pub fn run(
  config: &BenchConfig,
  strategies: &[Strategy],
  datasets: &[&DatasetSpec],
) -> Result<Vec<PathBuf>> {
  let mut written = Vec::with_capacity(strategies.len() * datasets.len());
  for &strategy in strategies {
    println!("======================{}======================", strategy);
    for dataset in datasets {
      println!(
        "TESTING DATASET {} [n={}]",
        dataset.name,
        thousands(dataset.size)
      );
      let record = measure(config, strategy, dataset)?;
      written.push(record.write_to(&config.results_dir)?);
    }
  }
  Ok(written)
}
