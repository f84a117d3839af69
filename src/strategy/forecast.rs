//! Search-dimension forecasts from elapsed time and basis profiles

use crate::core::error::{LatticeError, Result};
use crate::core::profile::{gaussian_heuristic, BasisProfile};
use crate::strategy::cost::CostModel;

/// Forecaster for one run; `target_norm` and `goal_margin` are fixed per run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forecaster {
    pub cost: CostModel,
    pub target_norm: f64,
    pub goal_margin: f64,
}

impl Forecaster {
    pub fn new(cost: CostModel, target_norm: f64, goal_margin: f64) -> Self {
        Forecaster {
            cost,
            target_norm,
            goal_margin,
        }
    }

    /// Largest search dimension affordable in `time_factor * elapsed` seconds
    pub fn attainable_search_dim(&self, elapsed: f64, time_factor: f64) -> usize {
        self.cost.attainable_dim(time_factor * elapsed)
    }

    /// Smallest k in [2, d) for which the error vector's projection on the
    /// last k dimensions is expected to be the shortest vector there.
    pub fn expected_success_dim(&self, profile: &BasisProfile) -> Result<usize> {
        let d = profile.full_dim();
        let r = profile.r();
        let scaled = self.target_norm / self.goal_margin;
        for k in 2..d {
            let projected = scaled * k as f64 / d as f64;
            if 4.0 / 3.0 * gaussian_heuristic(&r[d - k..]) > projected {
                return Ok(k);
            }
        }
        Err(LatticeError::DegenerateProfile {
            full_dim: d,
            target_norm: self.target_norm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(d: usize, top: f64, slope: f64) -> BasisProfile {
        BasisProfile::new((0..d).map(|i| top * (-slope * i as f64).exp()).collect()).unwrap()
    }

    #[test]
    fn test_attainable_monotone() {
        let f = Forecaster::new(CostModel::default(), 100.0, 1.5);
        let mut last = 0;
        for t in [0.0, 0.1, 1.0, 10.0, 1000.0] {
            let dim = f.attainable_search_dim(t, 1.0);
            assert!(dim >= last);
            last = dim;
        }
        assert!(f.attainable_search_dim(10.0, 2.0) >= f.attainable_search_dim(10.0, 1.0));
        assert_eq!(f.attainable_search_dim(1000.0, 0.0), 0);
    }

    #[test]
    fn test_expected_success_dim_range_and_idempotence() {
        let p = profile(80, 1e4, 0.12);
        let f = Forecaster::new(CostModel::default(), 500.0, 1.5);
        let k = f.expected_success_dim(&p).unwrap();
        assert!((2..80).contains(&k));
        assert_eq!(k, f.expected_success_dim(&p).unwrap());
    }

    #[test]
    fn test_expected_success_dim_monotone_in_target() {
        let p = profile(80, 1e4, 0.12);
        let mut last = 0;
        for target in [10.0, 100.0, 500.0, 2000.0] {
            let f = Forecaster::new(CostModel::default(), target, 1.5);
            if let Ok(k) = f.expected_success_dim(&p) {
                assert!(k >= last);
                last = k;
            }
        }
        assert!(last > 0);
    }

    #[test]
    fn test_degenerate_profile() {
        // every projected sublattice is far shorter than the target
        let p = profile(30, 1.0, 0.0);
        let f = Forecaster::new(CostModel::default(), 1e9, 1.5);
        match f.expected_success_dim(&p) {
            Err(LatticeError::DegenerateProfile { full_dim, .. }) => assert_eq!(full_dim, 30),
            other => panic!("unexpected {:?}", other),
        }
    }
}
