//! Per-run state: clocks, observed tour times and the tracer

use crate::strategy::tracer::Tracer;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Blocksize -> most recent observed (or extrapolated) tour time in seconds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingTable {
    entries: BTreeMap<usize, f64>,
}

impl TimingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, blocksize: usize, seconds: f64) {
        self.entries.insert(blocksize, seconds);
    }

    pub fn get(&self, blocksize: usize) -> Option<f64> {
        self.entries.get(&blocksize).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Source of elapsed seconds
pub trait Clock: Send {
    fn now(&self) -> f64;
}

/// Wall clock
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        MonotonicClock { origin: Instant::now() }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock advanced by hand; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    seconds: Arc<Mutex<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, seconds: f64) {
        if let Ok(mut t) = self.seconds.lock() {
            *t += seconds;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.seconds.lock().map(|t| *t).unwrap_or(0.0)
    }
}

/// Everything scoped to one attack run
pub struct RunContext {
    pub tracer: Tracer,
    pub timings: TimingTable,
    clock: Box<dyn Clock>,
    wall_start: f64,
    reduction_start: f64,
}

impl RunContext {
    pub fn new(tracer: Tracer) -> Self {
        Self::with_clock(tracer, Box::new(MonotonicClock::default()))
    }

    pub fn with_clock(tracer: Tracer, clock: Box<dyn Clock>) -> Self {
        let now = clock.now();
        RunContext {
            tracer,
            timings: TimingTable::new(),
            clock,
            wall_start: now,
            reduction_start: now,
        }
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Restart both the wall clock and the reduction clock
    pub fn start_clocks(&mut self) {
        let now = self.clock.now();
        self.wall_start = now;
        self.reduction_start = now;
    }

    /// Seconds since the run started
    pub fn wall_elapsed(&self) -> f64 {
        self.clock.now() - self.wall_start
    }

    /// Seconds of reduction since the start or the last search
    pub fn reduction_elapsed(&self) -> f64 {
        self.clock.now() - self.reduction_start
    }

    pub fn reset_reduction_clock(&mut self) {
        self.reduction_start = self.clock.now();
    }
}
