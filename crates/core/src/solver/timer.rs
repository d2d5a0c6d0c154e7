//! RAII timing for engine invocations
use std::time::Instant;
use tracing::debug;

/// Logs the wall time of a scope at debug level when dropped
pub struct SolveTimer {
    start: Instant,
    name: &'static str,
    level: Option<usize>,
}

impl SolveTimer {
    /// Start timing `name`, optionally tagged with the level being solved
    #[must_use]
    pub fn new(name: &'static str, level: Option<usize>) -> Self {
        Self {
            start: Instant::now(),
            name,
            level,
        }
    }

    /// Elapsed time in milliseconds
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for SolveTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        match self.level {
            Some(level) => debug!("{} (level {}) took {:.3} ms", self.name, level, elapsed_ms),
            None => debug!("{} took {:.3} ms", self.name, elapsed_ms),
        }
    }
}
