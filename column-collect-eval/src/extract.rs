//! Five ways of pulling the `mvv` column of a Parquet dataset into a local `Vec<f64>`.
//!
//! Each strategy mirrors a common way of collecting a single column out of a distributed
//! dataframe:
//! - `concat`: read projected record batches, concatenate them into one array, and copy the
//!   value buffer out in bulk (the columnar conversion path).
//! - `flatmap`: read projected record batches and flatten every batch's values into the output.
//! - `map`: walk the file row by row through the record-level reader and map each row to its
//!   first field.
//! - `collectlist`: materialize every batch first, then index the collected rows one at a time.
//! - `localIterator`: drain an async Parquet stream that fetches one row group at a time.
//!
//! All strategies only decode the `mvv` column and return values in file order.

use std::{
  fmt,
  fs::File,
  path::{Path, PathBuf},
  str::FromStr,
};

use anyhow::{bail, ensure, Context, Result};
use arrow::{
  array::{Array, ArrayRef, AsArray, Float64Array, RecordBatch},
  datatypes::{DataType, Float64Type, Schema},
};
use futures::StreamExt;
use parquet::{
  arrow::{
    arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder},
    ParquetRecordBatchStreamBuilder, ProjectionMask,
  },
  file::reader::{FileReader, SerializedFileReader},
  record::RowAccessor,
  schema::types::{SchemaDescriptor, Type},
};
use tokio::runtime::Runtime;

use crate::dataset::resolve_files;

/// Name of the measured column.
pub const COLUMN: &str = "mvv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
  Concat,
  FlatMap,
  Map,
  CollectList,
  LocalIterator,
}

impl Strategy {
  /// Every strategy, in the order the benchmark runs them.
  pub const ALL: [Strategy; 5] = [
    Strategy::Concat,
    Strategy::FlatMap,
    Strategy::Map,
    Strategy::CollectList,
    Strategy::LocalIterator,
  ];

  /// Test name used in banners and result file names.
  pub fn name(self) -> &'static str {
    match self {
      Strategy::Concat => "concat",
      Strategy::FlatMap => "flatmap",
      Strategy::Map => "map",
      Strategy::CollectList => "collectlist",
      Strategy::LocalIterator => "localIterator",
    }
  }

  /// Pick strategies by name, keeping run order. An empty selection means all of them.
  pub fn select(names: &[String]) -> Result<Vec<Strategy>> {
    if names.is_empty() {
      return Ok(Self::ALL.to_vec());
    }

    let requested = names
      .iter()
      .map(|name| name.parse())
      .collect::<Result<Vec<Strategy>>>()?;
    Ok(
      Self::ALL
        .into_iter()
        .filter(|strategy| requested.contains(strategy))
        .collect(),
    )
  }

  /// Extract the whole `mvv` column of the session's dataset.
  pub fn extract(self, session: &Session) -> Result<Vec<f64>> {
    match self {
      Strategy::Concat => extract_concat(session),
      Strategy::FlatMap => extract_flat_map(session),
      Strategy::Map => extract_row_map(session),
      Strategy::CollectList => extract_collect_list(session),
      Strategy::LocalIterator => session
        .runtime
        .block_on(extract_local_iterator(&session.files, session.batch_size)),
    }
  }
}

impl fmt::Display for Strategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Strategy {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self> {
    match Self::ALL.into_iter().find(|strategy| strategy.name() == s) {
      Some(strategy) => Ok(strategy),
      None => bail!("unknown test `{}`", s),
    }
  }
}

/// Everything an extraction runs against: the dataset's files and the runtime that drives
/// async reads. Building one is the untimed setup of a measurement batch.
#[derive(Debug)]
pub struct Session {
  files: Vec<PathBuf>,
  batch_size: usize,
  runtime: Runtime,
}

impl Session {
  pub fn open(path: impl AsRef<Path>, batch_size: usize) -> Result<Self> {
    ensure!(batch_size > 0, "batch size must be positive");
    let files = resolve_files(path)?;
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    Ok(Session {
      files,
      batch_size,
      runtime,
    })
  }

  pub fn files(&self) -> &[PathBuf] {
    &self.files
  }
}

/// Projection onto the `mvv` root column, checking that it holds doubles.
fn column_mask(schema: &Schema, parquet_schema: &SchemaDescriptor) -> Result<ProjectionMask> {
  let index = schema
    .index_of(COLUMN)
    .with_context(|| format!("dataset has no `{}` column", COLUMN))?;
  let data_type = schema.field(index).data_type();
  ensure!(
    data_type == &DataType::Float64,
    "column `{}` has type {}, expected {}",
    COLUMN,
    data_type,
    DataType::Float64
  );
  Ok(ProjectionMask::roots(parquet_schema, [index]))
}

fn batch_reader(path: &Path, batch_size: usize) -> Result<ParquetRecordBatchReader> {
  let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
  let builder = ParquetRecordBatchReaderBuilder::try_new(file)?.with_batch_size(batch_size);
  let mask = column_mask(builder.schema(), builder.parquet_schema())?;
  Ok(builder.with_projection(mask).build()?)
}

fn float_values(array: &dyn Array) -> Result<&Float64Array> {
  let values = array
    .as_primitive_opt::<Float64Type>()
    .with_context(|| format!("column `{}` is not a Float64 column", COLUMN))?;
  ensure!(
    values.null_count() == 0,
    "column `{}` contains {} nulls",
    COLUMN,
    values.null_count()
  );
  Ok(values)
}

fn extract_concat(session: &Session) -> Result<Vec<f64>> {
  let mut arrays: Vec<ArrayRef> = Vec::new();
  for path in &session.files {
    for batch in batch_reader(path, session.batch_size)? {
      arrays.push(batch?.column(0).clone());
    }
  }

  if arrays.is_empty() {
    return Ok(Vec::new());
  }

  let refs: Vec<&dyn Array> = arrays.iter().map(|array| array.as_ref()).collect();
  let merged = arrow::compute::concat(&refs)?;
  Ok(float_values(merged.as_ref())?.values().to_vec())
}

fn extract_flat_map(session: &Session) -> Result<Vec<f64>> {
  let mut values = Vec::new();
  for path in &session.files {
    for batch in batch_reader(path, session.batch_size)? {
      let batch = batch?;
      values.extend(float_values(batch.column(0).as_ref())?.iter().flatten());
    }
  }
  Ok(values)
}

/// Schema with the root group of `root` reduced to the `mvv` field.
fn row_projection(root: &Type) -> Result<Type> {
  let field = root
    .get_fields()
    .iter()
    .find(|field| field.name() == COLUMN)
    .cloned()
    .with_context(|| format!("dataset has no `{}` column", COLUMN))?;
  Ok(
    Type::group_type_builder(root.name())
      .with_fields(vec![field])
      .build()?,
  )
}

fn extract_row_map(session: &Session) -> Result<Vec<f64>> {
  let mut values = Vec::new();
  for path in &session.files {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = SerializedFileReader::new(file)?;
    let projection = row_projection(reader.metadata().file_metadata().schema())?;
    for row in reader.get_row_iter(Some(projection))? {
      values.push(row?.get_double(0)?);
    }
  }
  Ok(values)
}

fn extract_collect_list(session: &Session) -> Result<Vec<f64>> {
  let mut batches: Vec<RecordBatch> = Vec::new();
  for path in &session.files {
    let reader = batch_reader(path, session.batch_size)?;
    batches.extend(reader.collect::<Result<Vec<_>, _>>()?);
  }

  let total_rows = batches.iter().map(RecordBatch::num_rows).sum();
  let mut values = Vec::with_capacity(total_rows);
  for batch in &batches {
    let column = float_values(batch.column(0).as_ref())?;
    for row in 0..batch.num_rows() {
      values.push(column.value(row));
    }
  }
  Ok(values)
}

/// The stream decodes one row group per fetch, so at most one row group is buffered at a time.
async fn extract_local_iterator(files: &[PathBuf], batch_size: usize) -> Result<Vec<f64>> {
  let mut values = Vec::new();
  for path in files {
    let file = tokio::fs::File::open(path)
      .await
      .with_context(|| format!("failed to open {}", path.display()))?;
    let builder = ParquetRecordBatchStreamBuilder::new(file)
      .await?
      .with_batch_size(batch_size);
    let mask = column_mask(builder.schema(), builder.parquet_schema())?;
    let mut stream = builder.with_projection(mask).build()?;

    while let Some(batch) = stream.next().await {
      let batch = batch?;
      values.extend_from_slice(float_values(batch.column(0).as_ref())?.values());
    }
  }
  Ok(values)
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use arrow::{
    array::{Int64Array, StringArray},
    datatypes::Field,
  };
  use parquet::arrow::ArrowWriter;

  use super::*;

  fn write_batch(path: &Path, batch: &RecordBatch) {
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(batch).unwrap();
    writer.close().unwrap();
  }

  #[test]
  fn test_strategy_names_round_trip() {
    for strategy in Strategy::ALL {
      assert_eq!(strategy, strategy.name().parse().unwrap());
      assert_eq!(strategy.name(), strategy.to_string());
    }
    assert!("toPandas".parse::<Strategy>().is_err());
  }

  #[test]
  fn test_select_strategies() {
    let selected = Strategy::select(&["map".to_string(), "concat".to_string()]).unwrap();
    assert_eq!(vec![Strategy::Concat, Strategy::Map], selected);
    assert_eq!(Strategy::ALL.to_vec(), Strategy::select(&[]).unwrap());
    assert!(Strategy::select(&["nope".to_string()]).is_err());
  }

  #[test]
  fn test_extract_projects_mvv_out_of_wide_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wide.parquet");
    let schema = Arc::new(Schema::new(vec![
      Field::new("id", DataType::Int64, false),
      Field::new("label", DataType::Utf8, false),
      Field::new(COLUMN, DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
      schema,
      vec![
        Arc::new(Int64Array::from(vec![1, 2, 3])),
        Arc::new(StringArray::from(vec!["a", "b", "c"])),
        Arc::new(Float64Array::from(vec![0.5, -1.25, 3.0])),
      ],
    )
    .unwrap();
    write_batch(&path, &batch);

    let session = Session::open(&path, 2).unwrap();
    for strategy in Strategy::ALL {
      assert_eq!(
        vec![0.5, -1.25, 3.0],
        strategy.extract(&session).unwrap(),
        "strategy {}",
        strategy
      );
    }
  }

  #[test]
  fn test_missing_column_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("other.parquet");
    let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
    let batch =
      RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![1, 2]))]).unwrap();
    write_batch(&path, &batch);

    let session = Session::open(&path, 16).unwrap();
    for strategy in Strategy::ALL {
      assert!(strategy.extract(&session).is_err(), "strategy {}", strategy);
    }
  }

  #[test]
  fn test_wrong_type_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ints.parquet");
    let schema = Arc::new(Schema::new(vec![Field::new(COLUMN, DataType::Int64, false)]));
    let batch =
      RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![1, 2]))]).unwrap();
    write_batch(&path, &batch);

    let session = Session::open(&path, 16).unwrap();
    for strategy in Strategy::ALL {
      assert!(strategy.extract(&session).is_err(), "strategy {}", strategy);
    }
  }

  #[test]
  fn test_session_requires_dataset() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Session::open(dir.path().join("mvv_none"), 16).is_err());
    assert!(Session::open(dir.path(), 0).is_err());
  }

  #[tokio::test]
  async fn test_local_iterator_on_caller_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.parquet");
    let schema = Arc::new(Schema::new(vec![Field::new(COLUMN, DataType::Float64, false)]));
    let batch = RecordBatch::try_new(
      schema,
      vec![Arc::new(Float64Array::from(vec![1.0, 2.0, 4.0]))],
    )
    .unwrap();
    write_batch(&path, &batch);

    let values = extract_local_iterator(&[path], 1).await.unwrap();
    assert_eq!(vec![1.0, 2.0, 4.0], values);
  }
}
