//! Wall-clock collaborator for the search loop.

use std::time::Instant;

/// Source of "milliseconds elapsed so far this decision".
pub trait Timer {
    fn elapsed_ms(&self) -> u64;
}

/// Real-time timer started when the decision begins.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::start()
    }
}

impl Timer for Stopwatch {
    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
