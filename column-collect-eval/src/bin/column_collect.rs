use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use column_collect_eval::{
  config::BenchConfig,
  extract::Strategy,
  record, report, runner,
  util::{thousands, write_dataset_dir, GenerateOptions},
};

/// Measures how long it takes to pull a column of a Parquet dataset into memory.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
  #[clap(long, short, global = true, help = "TOML configuration file")]
  config: Option<PathBuf>,
  #[clap(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Write the configured datasets into the data directory
  Generate {
    #[clap(long, value_delimiter = ',', help = "Datasets to generate (default: all)")]
    datasets: Vec<String>,
  },
  /// Time every selected test against every selected dataset
  Run {
    #[clap(long, value_delimiter = ',', help = "Tests to run (default: all)")]
    tests: Vec<String>,
    #[clap(long, value_delimiter = ',', help = "Datasets to test (default: all)")]
    datasets: Vec<String>,
  },
  /// Summarize the recorded results
  Report {
    #[clap(long, help = "Also render an SVG chart of median runtimes to this path")]
    plot: Option<PathBuf>,
  },
}

fn main() -> Result<()> {
  let args = Args::parse();
  let config = BenchConfig::load_or_default(args.config.as_deref())?;

  match args.command {
    Command::Generate { datasets } => {
      let options = GenerateOptions {
        seed: config.seed,
        row_group_size: config.row_group_size,
        ..GenerateOptions::default()
      };
      for dataset in config.select_datasets(&datasets)? {
        let path = dataset.path(&config.data_dir);
        println!(
          "GENERATING DATASET {} [n={}] at {}",
          dataset.name,
          thousands(dataset.size),
          path.display()
        );
        write_dataset_dir(&path, dataset.size, &options)?;
      }
    }
    Command::Run { tests, datasets } => {
      let strategies = Strategy::select(&tests)?;
      let datasets = config.select_datasets(&datasets)?;
      let written = runner::run(&config, &strategies, &datasets)?;
      println!(
        "Wrote {} results to {}",
        written.len(),
        config.results_dir.display()
      );
    }
    Command::Report { plot } => {
      let records = record::load_all(&config.results_dir)?;
      println!("{}", report::format_summary(&records)?);
      if let Some(path) = plot {
        report::plot_medians(&records, &path)?;
        println!("Chart written to {}", path.display());
      }
    }
  }

  Ok(())
}
