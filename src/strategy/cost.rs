//! Search cost model: 2^(C * (dim - offset)) / threads seconds

use serde::{Deserialize, Serialize};

/// Exponent of the search cost
pub const COST_EXPONENT: f64 = 0.292;

/// Dimension at which a single-threaded search takes one time unit
pub const COST_DIM_OFFSET: f64 = 64.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    pub exponent: f64,
    pub dim_offset: f64,
    pub threads: usize,
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel {
            exponent: COST_EXPONENT,
            dim_offset: COST_DIM_OFFSET,
            threads: 1,
        }
    }
}

impl CostModel {
    pub fn new(exponent: f64, dim_offset: f64, threads: usize) -> Self {
        CostModel {
            exponent,
            dim_offset,
            threads: threads.max(1),
        }
    }

    /// Expected time of a search in dimension `dim`
    pub fn expected_search_time(&self, dim: f64) -> f64 {
        (self.exponent * (dim - self.dim_offset)).exp2() / self.threads as f64
    }

    /// Time ratio between work in dimensions `to` and `from`
    pub fn ratio(&self, to: f64, from: f64) -> f64 {
        (self.exponent * (to - from)).exp2()
    }

    /// Largest dimension whose expected search time fits in `budget`,
    /// clamped at 0. A non-positive budget yields 0.
    pub fn attainable_dim(&self, budget: f64) -> usize {
        if !(budget > 0.0) {
            return 0;
        }
        let dim = self.dim_offset + (budget * self.threads as f64).log2() / self.exponent;
        if dim.is_finite() && dim > 0.0 {
            dim.floor() as usize
        } else {
            0
        }
    }
}
