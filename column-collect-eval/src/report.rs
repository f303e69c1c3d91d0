//! Summaries of recorded runtimes: a pretty-printed Arrow table and a log-log chart of median
//! runtime against dataset size.

use std::{collections::BTreeMap, path::Path, sync::Arc};

use anyhow::{ensure, Result};
use arrow::{
  array::{ArrayRef, Float64Array, RecordBatch, StringArray, UInt64Array},
  datatypes::{DataType, Field, Schema},
  util::pretty::pretty_format_batches,
};
use plotters::prelude::*;

use crate::record::BenchmarkRecord;

/// Descriptive statistics of one record's runtimes, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
  pub runs: usize,
  pub min: f64,
  pub median: f64,
  pub mean: f64,
  /// Sample standard deviation, zero for a single run
  pub std_dev: f64,
}

impl Summary {
  /// `None` for an empty sample.
  pub fn from_runtimes(runtimes: &[f64]) -> Option<Summary> {
    if runtimes.is_empty() {
      return None;
    }

    let mut sorted = runtimes.to_vec();
    sorted.sort_by(f64::total_cmp);

    let runs = sorted.len();
    let mid = runs / 2;
    let median = if runs % 2 == 0 {
      (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
      sorted[mid]
    };
    let mean = sorted.iter().sum::<f64>() / runs as f64;
    let std_dev = if runs > 1 {
      let variance =
        sorted.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / (runs - 1) as f64;
      variance.sqrt()
    } else {
      0.0
    };

    Some(Summary {
      runs,
      min: sorted[0],
      median,
      mean,
      std_dev,
    })
  }
}

/// One row per record. Statistics are null for records without runtimes.
pub fn summary_batch(records: &[BenchmarkRecord]) -> Result<RecordBatch> {
  let summaries: Vec<Option<Summary>> = records
    .iter()
    .map(|record| Summary::from_runtimes(&record.runtimes))
    .collect();
  let stat = |f: fn(&Summary) -> f64| -> ArrayRef {
    Arc::new(Float64Array::from(
      summaries
        .iter()
        .map(|summary| summary.as_ref().map(f))
        .collect::<Vec<_>>(),
    ))
  };

  let schema = Schema::new(vec![
    Field::new("test_name", DataType::Utf8, false),
    Field::new("dataset", DataType::Utf8, false),
    Field::new("dataset_size", DataType::UInt64, false),
    Field::new("runs", DataType::UInt64, false),
    Field::new("min_s", DataType::Float64, true),
    Field::new("median_s", DataType::Float64, true),
    Field::new("mean_s", DataType::Float64, true),
    Field::new("std_dev_s", DataType::Float64, true),
  ]);
  let columns: Vec<ArrayRef> = vec![
    Arc::new(StringArray::from_iter_values(
      records.iter().map(|record| record.test_name.as_str()),
    )),
    Arc::new(StringArray::from_iter_values(
      records.iter().map(|record| record.dataset.as_str()),
    )),
    Arc::new(UInt64Array::from_iter_values(
      records.iter().map(|record| record.dataset_size as u64),
    )),
    Arc::new(UInt64Array::from_iter_values(
      records.iter().map(|record| record.runtimes.len() as u64),
    )),
    stat(|summary| summary.min),
    stat(|summary| summary.median),
    stat(|summary| summary.mean),
    stat(|summary| summary.std_dev),
  ];

  Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}

pub fn format_summary(records: &[BenchmarkRecord]) -> Result<String> {
  let batch = summary_batch(records)?;
  Ok(pretty_format_batches(&[batch])?.to_string())
}

/// `(dataset size, median seconds)` points per test, sorted by size. Points that cannot be drawn
/// on a log scale are left out.
pub fn median_series(records: &[BenchmarkRecord]) -> BTreeMap<String, Vec<(f64, f64)>> {
  let mut series: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
  for record in records {
    let Some(summary) = Summary::from_runtimes(&record.runtimes) else {
      continue;
    };
    if record.dataset_size == 0 || summary.median <= 0.0 {
      continue;
    }
    series
      .entry(record.test_name.clone())
      .or_default()
      .push((record.dataset_size as f64, summary.median));
  }

  for points in series.values_mut() {
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
  }
  series
}

/// Render the median series as an SVG line chart at `path`.
pub fn plot_medians(records: &[BenchmarkRecord], path: impl AsRef<Path>) -> Result<()> {
  let series = median_series(records);
  let points = || series.values().flatten();
  ensure!(points().next().is_some(), "no runtimes to plot");

  let x_min = points().map(|p| p.0).fold(f64::INFINITY, f64::min) / 2.0;
  let x_max = points().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max) * 2.0;
  let y_min = points().map(|p| p.1).fold(f64::INFINITY, f64::min) / 2.0;
  let y_max = points().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max) * 2.0;

  let root = SVGBackend::new(path.as_ref(), (1024, 768)).into_drawing_area();
  root.fill(&WHITE)?;

  let mut chart = ChartBuilder::on(&root)
    .caption("Median column extraction runtime", ("sans-serif", 28))
    .margin(16)
    .x_label_area_size(48)
    .y_label_area_size(72)
    .build_cartesian_2d((x_min..x_max).log_scale(), (y_min..y_max).log_scale())?;

  chart
    .configure_mesh()
    .x_desc("dataset size (rows)")
    .y_desc("median runtime (s)")
    .draw()?;

  for (idx, (test_name, points)) in series.iter().enumerate() {
    let color = Palette99::pick(idx).mix(0.9);
    chart
      .draw_series(LineSeries::new(
        points.iter().copied(),
        color.stroke_width(2),
      ))?
      .label(test_name.as_str())
      .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    chart.draw_series(
      points
        .iter()
        .map(|&point| Circle::new(point, 3, color.filled())),
    )?;
  }

  chart
    .configure_series_labels()
    .background_style(&WHITE.mix(0.8))
    .border_style(&BLACK)
    .draw()?;

  root.present()?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use arrow::array::Array;

  use super::*;

  fn record(test_name: &str, dataset: &str, size: usize, runtimes: Vec<f64>) -> BenchmarkRecord {
    BenchmarkRecord {
      test_name: test_name.to_string(),
      dataset: dataset.to_string(),
      dataset_size: size,
      runtimes,
    }
  }

  #[test]
  fn test_summary_odd() {
    let summary = Summary::from_runtimes(&[3.0, 1.0, 2.0]).unwrap();
    assert_eq!(3, summary.runs);
    assert_eq!(1.0, summary.min);
    assert_eq!(2.0, summary.median);
    assert_eq!(2.0, summary.mean);
    assert!((summary.std_dev - 1.0).abs() < 1e-12);
  }

  #[test]
  fn test_summary_even_and_single() {
    let summary = Summary::from_runtimes(&[4.0, 1.0, 2.0, 3.0]).unwrap();
    assert_eq!(2.5, summary.median);

    let single = Summary::from_runtimes(&[7.5]).unwrap();
    assert_eq!(7.5, single.median);
    assert_eq!(0.0, single.std_dev);

    assert_eq!(None, Summary::from_runtimes(&[]));
  }

  #[test]
  fn test_summary_batch() {
    let records = vec![
      record("concat", "small", 100_000, vec![0.5, 1.5]),
      record("map", "xsmall", 1_000, vec![]),
    ];
    let batch = summary_batch(&records).unwrap();
    assert_eq!(2, batch.num_rows());
    assert_eq!(8, batch.num_columns());

    let median = batch
      .column_by_name("median_s")
      .unwrap()
      .as_any()
      .downcast_ref::<Float64Array>()
      .unwrap();
    assert_eq!(1.0, median.value(0));
    assert!(median.is_null(1));

    let table = format_summary(&records).unwrap();
    assert!(table.contains("concat"));
    assert!(table.contains("median_s"));
  }

  #[test]
  fn test_median_series() {
    let records = vec![
      record("map", "small", 100_000, vec![2.0]),
      record("map", "xsmall", 1_000, vec![0.1, 0.3, 0.2]),
      record("concat", "xsmall", 1_000, vec![0.0]),
      record("concat", "small", 100_000, vec![0.4]),
      record("flatmap", "small", 100_000, vec![]),
    ];
    let series = median_series(&records);

    assert_eq!(2, series.len());
    assert_eq!(vec![(1_000.0, 0.2), (100_000.0, 2.0)], series["map"]);
    assert_eq!(vec![(100_000.0, 0.4)], series["concat"]);
  }

  #[test]
  fn test_plot_requires_points() {
    let dir = tempfile::tempdir().unwrap();
    let records = vec![record("map", "small", 100_000, vec![])];
    assert!(plot_medians(&records, dir.path().join("chart.svg")).is_err());
  }

  #[test]
  fn test_plot_writes_svg() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chart.svg");
    let records = vec![
      record("map", "xsmall", 1_000, vec![0.02, 0.03]),
      record("map", "small", 100_000, vec![1.5]),
      record("concat", "xsmall", 1_000, vec![0.01]),
      record("concat", "small", 100_000, vec![0.2, 0.3, 0.25]),
    ];

    plot_medians(&records, &path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("<svg"));
  }
}
