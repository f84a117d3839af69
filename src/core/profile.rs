//! Basis profiles: squared Gram-Schmidt lengths and the quantities derived from them

use crate::core::error::{LatticeError, Result};
use serde::Serialize;
use statrs::function::gamma::ln_gamma;
use std::f64::consts::PI;

/// Read-only snapshot of the squared Gram-Schmidt lengths r[0..d-1] of a basis.
///
/// Profiles handed to the forecaster and the lookahead are plain values: the
/// simulator produces fresh copies, so nothing here aliases the live basis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasisProfile {
    r: Vec<f64>,
}

impl BasisProfile {
    /// Wrap a vector of squared Gram-Schmidt lengths
    pub fn new(r: Vec<f64>) -> Result<Self> {
        if r.is_empty() {
            return Err(LatticeError::invalid_parameters("Basis profile cannot be empty"));
        }
        if let Some(i) = r.iter().position(|x| !x.is_finite() || *x <= 0.0) {
            return Err(LatticeError::numerical_instability(format!(
                "non-positive Gram-Schmidt length r[{}] = {}",
                i, r[i]
            )));
        }
        Ok(BasisProfile { r })
    }

    /// Total lattice dimension d
    pub fn full_dim(&self) -> usize {
        self.r.len()
    }

    pub fn r(&self) -> &[f64] {
        &self.r
    }

    pub fn get(&self, i: usize) -> f64 {
        self.r[i]
    }

    /// The last `k` entries of the profile
    pub fn tail(&self, k: usize) -> &[f64] {
        &self.r[self.r.len() - k.min(self.r.len())..]
    }

    /// Gaussian heuristic (squared) of the projected sublattice spanned by indices start..d
    pub fn suffix_gaussian_heuristic(&self, start: usize) -> f64 {
        gaussian_heuristic(&self.r[start..])
    }

    /// Least-squares slope of ln r_i against i
    pub fn slope(&self) -> f64 {
        let n = self.r.len();
        if n < 2 {
            return 0.0;
        }
        let logs: Vec<f64> = self.r.iter().map(|x| x.ln()).collect();
        let i_mean = (n - 1) as f64 / 2.0;
        let x_mean = logs.iter().sum::<f64>() / n as f64;
        let mut num = 0.0;
        let mut den = 0.0;
        for (i, x) in logs.iter().enumerate() {
            let di = i as f64 - i_mean;
            num += di * (x - x_mean);
            den += di * di;
        }
        num / den
    }
}

/// Natural log of the volume of the unit ball in dimension n
pub fn ball_log_vol(n: usize) -> f64 {
    let n = n as f64;
    (n / 2.0) * PI.ln() - ln_gamma(n / 2.0 + 1.0)
}

/// Expected squared length of a shortest vector in a lattice with squared
/// Gram-Schmidt lengths `r`.
pub fn gaussian_heuristic(r: &[f64]) -> f64 {
    let n = r.len();
    if n == 0 {
        return 0.0;
    }
    let log_vol: f64 = r.iter().map(|x| x.ln()).sum();
    let log_gh = (log_vol - 2.0 * ball_log_vol(n)) / n as f64;
    log_gh.exp()
}
