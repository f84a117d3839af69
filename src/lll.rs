//! LLL (Lenstra-Lenstra-Lovász) lattice reduction, in place on a [`Lattice`]

use crate::core::error::{LatticeError, Result};
use crate::core::lattice::Lattice;
use crate::core::types::{AlgorithmParams, ReductionStats};

/// Parameters for LLL reduction
#[derive(Debug, Clone)]
pub struct LLLParams {
    /// Reduction parameter (0.5 < delta < 1), typically 0.99
    pub delta: f64,
    /// Size-reduction parameter (0.5 <= eta < sqrt(delta)), typically 0.51
    pub eta: f64,
    /// Algorithm parameters
    pub algorithm_params: AlgorithmParams,
}

impl Default for LLLParams {
    fn default() -> Self {
        LLLParams {
            delta: 0.99,
            eta: 0.51,
            algorithm_params: AlgorithmParams::default(),
        }
    }
}

impl LLLParams {
    /// Create new LLL parameters with custom delta and eta
    pub fn new(delta: f64, eta: f64) -> Self {
        LLLParams {
            delta,
            eta,
            algorithm_params: AlgorithmParams::default(),
        }
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        if !(0.25 < self.delta && self.delta < 1.0) {
            return Err(LatticeError::invalid_parameters(format!(
                "Delta must be in (0.25, 1.0), got {}",
                self.delta
            )));
        }

        if !(0.5 <= self.eta && self.eta < self.delta.sqrt()) {
            return Err(LatticeError::invalid_parameters(format!(
                "Eta must be in [0.5, sqrt(delta)), got {}",
                self.eta
            )));
        }

        Ok(())
    }
}

/// LLL reducer implementation
#[derive(Debug, Clone, Default)]
pub struct LLLReducer {
    params: LLLParams,
}

impl LLLReducer {
    /// Create new LLL reducer with default parameters
    pub fn new() -> Self {
        Self::with_params(LLLParams::default())
    }

    /// Create new LLL reducer with custom parameters
    pub fn with_params(params: LLLParams) -> Self {
        LLLReducer { params }
    }

    /// LLL-reduce the whole basis in place
    pub fn reduce(&self, lattice: &mut Lattice) -> Result<ReductionStats> {
        let n = lattice.rank();
        self.reduce_range(lattice, 0, n)
    }

    /// LLL-reduce the vectors `start..end` in place, size-reducing against
    /// everything before them.
    pub fn reduce_range(&self, lattice: &mut Lattice, start: usize, end: usize) -> Result<ReductionStats> {
        self.params.validate()?;
        if end > lattice.rank() || start >= end {
            return Err(LatticeError::invalid_parameters(format!(
                "LLL range {}..{} invalid for rank {}",
                start,
                end,
                lattice.rank()
            )));
        }

        lattice.update_gso()?;
        let mut stats = ReductionStats::default();
        let mut k = start + 1;

        if start > 0 {
            self.size_reduce(lattice, start);
        }

        while k < end {
            if stats.iterations >= self.params.algorithm_params.max_iterations {
                log::warn!("LLL {}..{} reached {} iterations", start, end, stats.iterations);
                return Err(LatticeError::numerical_instability(format!(
                    "LLL did not converge within {} iterations",
                    stats.iterations
                )));
            }
            stats.iterations += 1;
            self.size_reduce(lattice, k);

            let mu = lattice.mu[k][k - 1];
            let lovasz = lattice.r[k] >= (self.params.delta - mu * mu) * lattice.r[k - 1];
            if lovasz {
                k += 1;
            } else {
                self.swap(lattice, k)?;
                stats.changes += 1;
                if k > start + 1 {
                    k -= 1;
                }
            }
        }

        // Drop accumulated floating-point drift
        lattice.update_gso()?;

        if self.params.algorithm_params.verbose {
            log::debug!("LLL {}..{}: swaps={}, iterations={}", start, end, stats.changes, stats.iterations);
        }
        Ok(stats)
    }

    /// Size-reduce b_k against b_0..b_{k-1}
    fn size_reduce(&self, lattice: &mut Lattice, k: usize) {
        for j in (0..k).rev() {
            let mu_kj = lattice.mu[k][j];
            if mu_kj.abs() <= self.params.eta {
                continue;
            }
            let q = mu_kj.round();
            lattice.basis.sub_scaled_row(k, j, q as i64);
            lattice.mu[k][j] -= q;
            for i in 0..j {
                let mu_ji = lattice.mu[j][i];
                lattice.mu[k][i] -= q * mu_ji;
            }
        }
    }

    /// Swap b_{k-1} and b_k and update the Gram-Schmidt data incrementally
    fn swap(&self, lattice: &mut Lattice, k: usize) -> Result<()> {
        let n = lattice.rank();
        lattice.basis.swap_rows(k - 1, k)?;

        let mu = lattice.mu[k][k - 1];
        let big_b = lattice.r[k] + mu * mu * lattice.r[k - 1];
        if !(big_b > 0.0) {
            return Err(LatticeError::numerical_instability("zero Gram-Schmidt length during LLL swap"));
        }
        lattice.mu[k][k - 1] = mu * lattice.r[k - 1] / big_b;
        lattice.r[k] = lattice.r[k - 1] * lattice.r[k] / big_b;
        lattice.r[k - 1] = big_b;

        for j in 0..k - 1 {
            let tmp = lattice.mu[k - 1][j];
            lattice.mu[k - 1][j] = lattice.mu[k][j];
            lattice.mu[k][j] = tmp;
        }
        let new_mu = lattice.mu[k][k - 1];
        for i in k + 1..n {
            let t = lattice.mu[i][k];
            lattice.mu[i][k] = lattice.mu[i][k - 1] - mu * t;
            lattice.mu[i][k - 1] = t + new_mu * lattice.mu[i][k];
        }
        Ok(())
    }

    /// Check size reduction and the Lovász condition on the whole basis
    pub fn is_reduced(&self, lattice: &Lattice) -> bool {
        let tol = self.params.algorithm_params.tolerance;
        for k in 1..lattice.rank() {
            for j in 0..k {
                if lattice.mu[k][j].abs() > self.params.eta + tol {
                    return false;
                }
            }
            let mu = lattice.mu[k][k - 1];
            if lattice.r[k] < (self.params.delta - mu * mu) * lattice.r[k - 1] * (1.0 - tol) {
                return false;
            }
        }
        true
    }
}
