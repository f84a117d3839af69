//! Baseline (blocksize, search dimension, samples) prediction under the
//! geometric series assumption.

use crate::core::error::{LatticeError, Result};
use crate::core::profile::ball_log_vol;
use serde::Serialize;
use std::f64::consts::{E, PI};

/// Predicted attack parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PredictedParameters {
    /// BKZ blocksize
    pub blocksize: usize,
    /// Dimension of the final search
    pub search_dim: usize,
    /// Number of samples m
    pub samples: usize,
}

pub trait ParameterEstimator: Send + Sync {
    /// Predict parameters for an instance; `decouple` allows a search
    /// dimension larger than the blocksize.
    fn estimate(
        &self,
        n: usize,
        alpha: f64,
        q: i64,
        decouple: bool,
        max_samples: Option<usize>,
    ) -> Result<PredictedParameters>;
}

/// Experimental root-Hermite factors of BKZ for small blocksizes
const SMALL_DELTA: [(usize, f64); 8] = [
    (2, 1.02190),
    (5, 1.01862),
    (10, 1.01616),
    (15, 1.01485),
    (20, 1.01420),
    (25, 1.01342),
    (28, 1.01331),
    (40, 1.01295),
];

/// Root-Hermite factor delta_0 reached by BKZ-k
pub fn delta_0f(k: usize) -> f64 {
    if k <= 40 {
        // piecewise linear between the tabulated points
        let mut prev = SMALL_DELTA[0];
        for &(b, delta) in SMALL_DELTA.iter() {
            if k <= b {
                if b == prev.0 {
                    return delta;
                }
                let t = (k - prev.0) as f64 / (b - prev.0) as f64;
                return prev.1 + t * (delta - prev.1);
            }
            prev = (b, delta);
        }
        return SMALL_DELTA[SMALL_DELTA.len() - 1].1;
    }
    let k = k as f64;
    (k / (2.0 * PI * E) * (PI * k).powf(1.0 / k)).powf(1.0 / (2.0 * (k - 1.0)))
}

/// GSA-based estimator
#[derive(Debug, Clone)]
pub struct GsaEstimator {
    /// Exponent C in the 2^(C * dim) cost of a search
    pub cost_exponent: f64,
    /// Upper bound on the sample counts tried, as a multiple of n
    pub max_sample_factor: usize,
}

impl Default for GsaEstimator {
    fn default() -> Self {
        GsaEstimator {
            cost_exponent: 0.292,
            max_sample_factor: 3,
        }
    }
}

impl GsaEstimator {
    pub fn new(cost_exponent: f64) -> Self {
        GsaEstimator {
            cost_exponent,
            ..Default::default()
        }
    }

    /// Whether a search in the last `s` of `d` dimensions finds the error,
    /// for a BKZ-b reduced q-ary embedding of volume exp(log_vol).
    fn succeeds(log_vol: f64, d: usize, b: usize, s: usize, sigma: f64) -> bool {
        let ln_delta = delta_0f(b).ln();
        let (d_f, s_f) = (d as f64, s as f64);
        let log_vol_s = s_f * log_vol / d_f - s_f * (d_f - s_f) * ln_delta;
        let log_gh_norm = (log_vol_s - ball_log_vol(s)) / s_f;
        sigma * s_f.sqrt() <= log_gh_norm.exp()
    }

    fn log2_cost(&self, d: usize, b: usize, s: usize, decouple: bool) -> f64 {
        let tour = self.cost_exponent * b as f64 + (d as f64).log2();
        if !decouple {
            return tour;
        }
        let search = self.cost_exponent * s as f64;
        let (hi, lo) = if tour > search { (tour, search) } else { (search, tour) };
        hi + (1.0 + (lo - hi).exp2()).log2()
    }
}

impl ParameterEstimator for GsaEstimator {
    fn estimate(
        &self,
        n: usize,
        alpha: f64,
        q: i64,
        decouple: bool,
        max_samples: Option<usize>,
    ) -> Result<PredictedParameters> {
        let infeasible = || LatticeError::InfeasibleParameters { n, alpha, q };
        if n == 0 || q < 2 || !(alpha > 0.0) {
            return Err(infeasible());
        }
        let sigma = alpha * q as f64;
        let m_max = max_samples
            .unwrap_or(usize::MAX)
            .min(self.max_sample_factor * n);

        let mut best: Option<(f64, PredictedParameters)> = None;
        for m in n + 1..=m_max {
            let d = m + 1;
            let log_vol = (m - n) as f64 * (q as f64).ln();
            for b in 2..=d {
                let s = if decouple {
                    // the smallest search dimension that works with BKZ-b
                    match (b..=d).find(|&s| Self::succeeds(log_vol, d, b, s, sigma)) {
                        Some(s) => s,
                        None => continue,
                    }
                } else if Self::succeeds(log_vol, d, b, b, sigma) {
                    b
                } else {
                    continue;
                };
                let cost = self.log2_cost(d, b, s, decouple);
                if best.as_ref().map_or(true, |(c, _)| cost < *c) {
                    best = Some((
                        cost,
                        PredictedParameters {
                            blocksize: b,
                            search_dim: s,
                            samples: m,
                        },
                    ));
                }
                if !decouple {
                    // larger blocksizes only cost more for this m
                    break;
                }
            }
        }

        match best {
            Some((cost, params)) => {
                log::debug!("estimator: {:?} at log2 cost {:.2}", params, cost);
                Ok(params)
            }
            None => Err(infeasible()),
        }
    }
}
