use std::{cell::Cell, time::Duration, time::Instant};

/// The [`Clock`] trait is a minimal trait describing a time source that an
/// [`AutoTimer`](crate::AutoTimer) can measure elapsed time with.
pub trait Clock: sealed::Sealed {
  /// Opaque point in time returned by [`Clock::mark`].
  type Mark: Copy;

  fn mark(&self) -> Self::Mark;

  /// Time passed since `mark` was taken.
  fn elapsed(&self, mark: Self::Mark) -> Duration;
}

/// Wall clock backed by [`Instant`]. This is what every real measurement uses.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
  type Mark = Instant;

  fn mark(&self) -> Instant {
    Instant::now()
  }

  fn elapsed(&self, mark: Instant) -> Duration {
    mark.elapsed()
  }
}

/// A clock that only moves when told to.
///
/// Statements under test call [`ManualClock::advance`] to simulate their own cost, which makes
/// the repetition count of a timer run fully deterministic.
#[derive(Debug, Default)]
pub struct ManualClock {
  now: Cell<Duration>,
}

impl ManualClock {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn advance(&self, step: Duration) {
    self.now.set(self.now.get() + step);
  }

  pub fn now(&self) -> Duration {
    self.now.get()
  }
}

impl Clock for ManualClock {
  type Mark = Duration;

  fn mark(&self) -> Duration {
    self.now.get()
  }

  fn elapsed(&self, mark: Duration) -> Duration {
    self.now.get().saturating_sub(mark)
  }
}

mod sealed {
  pub trait Sealed {}

  impl Sealed for super::MonotonicClock {}
  impl Sealed for super::ManualClock {}
}
