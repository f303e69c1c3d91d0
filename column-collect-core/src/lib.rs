//! This crate provides the adaptive repetition timer behind the column extraction benchmark.
//!
//! A measurement runs the statement under test once, and if that single run is shorter than the
//! requested minimum runtime, extrapolates how many repetitions are needed to exceed it and runs
//! them as a fresh batch.

pub mod traits;

use std::time::Duration;

use traits::{Clock, MonotonicClock};

/// Lower bound on the number of repetitions whenever the probe run is below the minimum runtime.
pub const MIN_RUNS: usize = 5;

/// Decide how many repetitions a statement needs after a probe run of `first`.
///
/// Returns `None` when the probe alone already meets `min_runtime`, otherwise
/// `max(min_runs, ceil(min_runtime / first))`. A probe measured as zero (the clock is coarser than
/// the statement) cannot be extrapolated from, so it gets exactly `min_runs` repetitions.
pub fn repetitions_needed(first: Duration, min_runtime: Duration, min_runs: usize) -> Option<usize> {
  if first >= min_runtime {
    return None;
  }

  if first.is_zero() {
    return Some(min_runs);
  }

  let target = min_runtime.as_nanos();
  let probe = first.as_nanos();
  let extrapolated = (target + probe - 1) / probe;
  let extrapolated = usize::try_from(extrapolated).unwrap_or(usize::MAX);

  Some(extrapolated.max(min_runs))
}

/// Times a statement until the total measured runtime exceeds a minimum.
///
/// * `setup`: builds the context the statement runs against. It is never timed, and is called
///   once per batch (once for the probe run, once more for the repetition batch if there is one).
/// * `stmt`: the operation under test. Its output is dropped after the clock stops.
///
/// The first error returned by either closure ends the measurement and is handed back as is.
#[derive(Debug, Clone)]
pub struct AutoTimer<C = MonotonicClock> {
  clock: C,
  min_runtime: Duration,
  min_runs: usize,
}

impl AutoTimer<MonotonicClock> {
  pub fn new(min_runtime: Duration) -> Self {
    AutoTimer {
      clock: MonotonicClock,
      min_runtime,
      min_runs: MIN_RUNS,
    }
  }
}

impl<C: Clock> AutoTimer<C> {
  /// Swap the time source, keeping every other setting.
  pub fn with_clock<D: Clock>(self, clock: D) -> AutoTimer<D> {
    AutoTimer {
      clock,
      min_runtime: self.min_runtime,
      min_runs: self.min_runs,
    }
  }

  /// Override the repetition floor. A floor of zero is treated as one.
  pub fn with_min_runs(mut self, min_runs: usize) -> Self {
    self.min_runs = min_runs.max(1);
    self
  }

  pub fn clock(&self) -> &C {
    &self.clock
  }

  pub fn min_runtime(&self) -> Duration {
    self.min_runtime
  }

  pub fn min_runs(&self) -> usize {
    self.min_runs
  }

  /// Run the adaptive measurement and return one elapsed time per measured repetition.
  ///
  /// The returned vector holds either the single probe sample (when it met the minimum runtime)
  /// or exactly `repetitions_needed(..)` samples from the repetition batch.
  pub fn run<S, R, E, Setup, Stmt>(
    &self,
    label: &str,
    mut setup: Setup,
    mut stmt: Stmt,
  ) -> Result<Vec<Duration>, E>
  where
    Setup: FnMut() -> Result<S, E>,
    Stmt: FnMut(&mut S) -> Result<R, E>,
  {
    println!("Running {} 1 time...", label);
    let mut context = setup()?;
    let first = self.time_once(&mut context, &mut stmt)?;
    println!("First run: {:.2} seconds", first.as_secs_f64());

    let repetitions = match repetitions_needed(first, self.min_runtime, self.min_runs) {
      Some(repetitions) => repetitions,
      None => return Ok(vec![first]),
    };
    drop(context);

    let expected_runtime = first.as_secs_f64() * repetitions as f64;
    println!("Running {} {} times.", label, repetitions);
    println!("Expected runtime: {:.2} seconds...", expected_runtime);

    let mut context = setup()?;
    let mut samples = Vec::new();
    for _ in 0..repetitions {
      samples.push(self.time_once(&mut context, &mut stmt)?);
    }

    Ok(samples)
  }

  fn time_once<S, R, E, Stmt>(&self, context: &mut S, stmt: &mut Stmt) -> Result<Duration, E>
  where
    Stmt: FnMut(&mut S) -> Result<R, E>,
  {
    let mark = self.clock.mark();
    let output = stmt(context)?;
    let elapsed = self.clock.elapsed(mark);
    drop(output);
    Ok(elapsed)
  }
}

/// Shorthand for [`AutoTimer::run`] on the monotonic clock with the default repetition floor.
pub fn auto_time<S, R, E, Setup, Stmt>(
  label: &str,
  min_runtime: Duration,
  setup: Setup,
  stmt: Stmt,
) -> Result<Vec<Duration>, E>
where
  Setup: FnMut() -> Result<S, E>,
  Stmt: FnMut(&mut S) -> Result<R, E>,
{
  AutoTimer::new(min_runtime).run(label, setup, stmt)
}
