//! Simulation clock and random number stream.
//!
//! Everything that needs the current time or randomness receives a
//! [`SimulationContext`] explicitly; there is no global state.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Fixed-step clock. Time is recomputed from the step count so it does not
/// drift over long runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationClock {
    pub start_time: f64,
    pub end_time: f64,
    pub dt: f64,
    pub step_count: u64,
}

impl SimulationClock {
    pub fn new(start_time: f64, end_time: f64, dt: f64) -> Self {
        Self {
            start_time,
            end_time,
            dt,
            step_count: 0,
        }
    }

    /// Current time in hours.
    pub fn time(&self) -> f64 {
        self.start_time + self.step_count as f64 * self.dt
    }

    pub fn advance(&mut self) {
        self.step_count += 1;
    }

    /// Number of steps from start to end time.
    pub fn total_steps(&self) -> u64 {
        if self.dt <= 0.0 || self.end_time <= self.start_time {
            return 0;
        }
        ((self.end_time - self.start_time) / self.dt).round() as u64
    }

    pub fn is_finished(&self) -> bool {
        self.step_count >= self.total_steps()
    }
}

/// Clock plus seeded RNG, passed to every component that needs either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationContext {
    pub clock: SimulationClock,
    pub rng: ChaCha8Rng,
    seed: u64,
}

impl SimulationContext {
    pub fn new(clock: SimulationClock, seed: u64) -> Self {
        Self {
            clock,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn time(&self) -> f64 {
        self.clock.time()
    }

    pub fn dt(&self) -> f64 {
        self.clock.dt
    }

    /// Restart the random stream from a new seed; the clock is untouched.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Rewind the clock to its start and the RNG to its seed.
    pub fn reset(&mut self) {
        self.clock.step_count = 0;
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }
}
