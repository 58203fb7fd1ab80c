use std::time::{Duration, Instant};

use thiserror::Error;

/// Raised when a bin's wall-clock budget runs out.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("bin budget of {budget:?} exhausted after {elapsed:?}")]
pub struct DeadlineExceeded {
    pub budget: Duration,
    pub elapsed: Duration,
}

/// Cooperative wall-clock budget for one bin.
///
/// Workers call [`check`](Deadline::check) periodically while scanning the
/// fetch window and again after each molecule; nothing is interrupted
/// mid-molecule, so a molecule is always written whole or not at all.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// # Errors
    ///
    /// Returns `DeadlineExceeded` once the budget has elapsed.
    pub fn check(&self) -> Result<(), DeadlineExceeded> {
        let elapsed = self.elapsed();
        if elapsed >= self.budget {
            Err(DeadlineExceeded {
                budget: self.budget,
                elapsed,
            })
        } else {
            Ok(())
        }
    }
}
