//! Shared parameter and status types

/// Algorithm parameters common to the reduction routines
#[derive(Debug, Clone)]
pub struct AlgorithmParams {
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Tolerance for numerical stability
    pub tolerance: f64,
    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for AlgorithmParams {
    fn default() -> Self {
        AlgorithmParams {
            max_iterations: 1_000_000,
            tolerance: 1e-9,
            verbose: false,
        }
    }
}

/// Outcome of one reduction pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReductionStats {
    /// Number of swaps (LLL) or insertions (BKZ)
    pub changes: usize,
    /// Number of loop iterations / blocks visited
    pub iterations: usize,
    /// Enumeration nodes visited
    pub nodes: u64,
}

impl ReductionStats {
    pub fn absorb(&mut self, other: &ReductionStats) {
        self.changes += other.changes;
        self.iterations += other.iterations;
        self.nodes += other.nodes;
    }
}
