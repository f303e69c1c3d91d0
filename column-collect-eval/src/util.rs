use std::{
  fs::{self, File},
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context, Result};
use arrow::{
  array::{ArrayRef, Float64Array, RecordBatch},
  datatypes::{DataType, Field, Schema, SchemaRef},
};
use parquet::{arrow::ArrowWriter, file::properties::WriterProperties};
use rand::{rngs::SmallRng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

use crate::extract::COLUMN;

/// Rows sampled and written per chunk, so that large datasets never sit in memory at once.
const GENERATE_CHUNK_ROWS: usize = 1024 * 1024;

pub fn gen_dataset_normal_seeded(seed: u64, size: usize) -> Vec<f64> {
  let mut rng = SmallRng::seed_from_u64(seed);
  StandardNormal.sample_iter(&mut rng).take(size).collect()
}

/// Schema of every generated dataset: a single non-nullable `mvv` column.
pub fn mvv_schema() -> SchemaRef {
  Arc::new(Schema::new(vec![Field::new(COLUMN, DataType::Float64, false)]))
}

#[derive(Debug, Clone, Copy)]
pub struct GenerateOptions {
  pub seed: u64,
  pub row_group_size: usize,
  pub chunk_rows: usize,
}

impl Default for GenerateOptions {
  fn default() -> Self {
    GenerateOptions {
      seed: 42,
      row_group_size: 1024 * 1024,
      chunk_rows: GENERATE_CHUNK_ROWS,
    }
  }
}

/// Write `size` standard normal values into a single Parquet file at `path`.
///
/// The values are exactly `gen_dataset_normal_seeded(options.seed, size)`, regardless of the
/// chunk and row group sizes.
pub fn write_dataset_file(path: impl AsRef<Path>, size: usize, options: &GenerateOptions) -> Result<()> {
  let path = path.as_ref();
  let schema = mvv_schema();
  let properties = WriterProperties::builder()
    .set_max_row_group_size(options.row_group_size.max(1))
    .build();

  let file =
    File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
  let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(properties))?;

  let mut rng = SmallRng::seed_from_u64(options.seed);
  let chunk_rows = options.chunk_rows.max(1);
  let mut remaining = size;
  while remaining > 0 {
    let rows = remaining.min(chunk_rows);
    let values: Vec<f64> = StandardNormal.sample_iter(&mut rng).take(rows).collect();
    let column: ArrayRef = Arc::new(Float64Array::from(values));
    let batch = RecordBatch::try_new(schema.clone(), vec![column])?;
    writer.write(&batch)?;
    remaining -= rows;
  }

  writer.close()?;
  Ok(())
}

/// Write a dataset as a directory holding one part file, `<dir>/part-00000.parquet`.
pub fn write_dataset_dir(
  dir: impl AsRef<Path>,
  size: usize,
  options: &GenerateOptions,
) -> Result<PathBuf> {
  let dir = dir.as_ref();
  fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
  let part = dir.join("part-00000.parquet");
  write_dataset_file(&part, size, options)?;
  Ok(part)
}

/// Format a count with thousands separators, `100000` -> `100,000`.
pub fn thousands(value: usize) -> String {
  let digits = value.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (idx, ch) in digits.chars().enumerate() {
    if idx > 0 && (digits.len() - idx) % 3 == 0 {
      out.push(',');
    }
    out.push(ch);
  }
  out
}
