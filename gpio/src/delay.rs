//! Blocking delay primitives.
//!
//! The LCD timing goes down to sub-microsecond enable pulses, which `thread::sleep` cannot honor
//! (the scheduler wakes up tens of microseconds late at best), so short delays spin instead.

use std::fmt::Debug;
use std::hint::spin_loop;
use std::thread::sleep;
use std::time::{Duration, Instant};

/// Something that can block the caller for a given duration.
pub trait Delay: Debug {
    /// Blocks for at least `duration`.
    fn delay(&mut self, duration: Duration);

    fn delay_us(&mut self, us: u64) {
        self.delay(Duration::from_micros(us))
    }

    fn delay_ms(&mut self, ms: u64) {
        self.delay(Duration::from_millis(ms))
    }
}

/// [Delay] implementation for hosted targets.
///
/// Delays shorter than [StdDelay::spin_threshold] busy-wait on [Instant], longer ones sleep.
#[derive(Debug, Clone, Copy)]
pub struct StdDelay {
    pub spin_threshold: Duration,
}

impl StdDelay {
    pub fn new() -> Self {
        StdDelay {
            spin_threshold: Duration::from_micros(200),
        }
    }

    pub fn with_spin_threshold(mut self, spin_threshold: Duration) -> Self {
        self.spin_threshold = spin_threshold;
        self
    }
}

impl Default for StdDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl Delay for StdDelay {
    fn delay(&mut self, duration: Duration) {
        if duration.is_zero() {
            return;
        }

        if duration < self.spin_threshold {
            let start = Instant::now();
            while start.elapsed() < duration {
                spin_loop();
            }
        } else {
            sleep(duration);
        }
    }
}
