//! Lookahead: is a few more tours cheaper than searching now?

use crate::core::error::{LatticeError, Result};
use crate::core::profile::BasisProfile;
use crate::engine::LatticeEngine;
use crate::strategy::context::TimingTable;
use crate::strategy::cost::CostModel;
use crate::strategy::forecast::Forecaster;

/// One simulated future tour
#[derive(Debug, Clone, PartialEq)]
pub struct LookaheadStep {
    pub blocksize: usize,
    /// Extrapolated duration of this tour
    pub tour_time: f64,
    /// Total extra reduction time up to and including this tour
    pub extra_time: f64,
    pub success_dim: usize,
    pub more_reduction: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LookaheadDecision {
    pub steps: Vec<LookaheadStep>,
}

impl LookaheadDecision {
    /// Keep reducing if any simulated step pays for itself
    pub fn more_reduction(&self) -> bool {
        self.steps.iter().any(|s| s.more_reduction)
    }
}

/// Whether spending `extra_time` on reduction to bring the success dimension
/// from `current_dim` down to `simulated_dim` beats searching now.
pub fn reduction_pays_off(cost: &CostModel, current_dim: usize, simulated_dim: usize, extra_time: f64) -> bool {
    if simulated_dim >= current_dim {
        return false;
    }
    let delta = (current_dim - simulated_dim) as f64;
    let saved = (1.0 - (-cost.exponent * delta).exp2()) * cost.expected_search_time(current_dim as f64);
    extra_time < saved
}

/// Simulate the `upcoming` blocksizes after `current_blocksize`, chaining
/// profiles and extrapolating tour times from `timings`. `timings` is only
/// read; extrapolated entries go to a private copy.
#[allow(clippy::too_many_arguments)]
pub fn look_ahead<E: LatticeEngine>(
    engine: &E,
    forecaster: &Forecaster,
    profile: &BasisProfile,
    timings: &TimingTable,
    current_blocksize: usize,
    current_success_dim: usize,
    upcoming: &[usize],
    tours: usize,
) -> Result<LookaheadDecision> {
    let mut scratch = timings.clone();
    let mut previous = current_blocksize;
    let mut simulated = profile.clone();
    let mut extra_time = 0.0;
    let mut steps = Vec::with_capacity(upcoming.len());

    for &blocksize in upcoming {
        simulated = engine.simulate(&simulated, blocksize, tours)?;

        let previous_time = scratch.get(previous).ok_or_else(|| {
            LatticeError::invalid_parameters(format!("no tour time recorded for blocksize {}", previous))
        })?;
        let tour_time = previous_time * forecaster.cost.ratio(blocksize as f64, previous as f64);
        scratch.record(blocksize, tour_time);
        extra_time += tour_time;

        let success_dim = forecaster.expected_success_dim(&simulated)?;
        let more_reduction = reduction_pays_off(&forecaster.cost, current_success_dim, success_dim, extra_time);
        log::debug!(
            "lookahead bkz-{}: +{:.3}s, success dim {} -> {}, more reduction: {}",
            blocksize,
            extra_time,
            current_success_dim,
            success_dim,
            more_reduction
        );
        steps.push(LookaheadStep {
            blocksize,
            tour_time,
            extra_time,
            success_dim,
            more_reduction,
        });
        previous = blocksize;
    }

    Ok(LookaheadDecision { steps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::profile::gaussian_heuristic;
    use crate::engine::{BasisState, SearchOutcome, SearchWindow, TourKind};

    /// Engine whose simulation flattens the profile by a fixed tilt per
    /// step, preserving the volume.
    struct TiltEngine {
        tilt: f64,
    }

    struct NoBasis;

    impl BasisState for NoBasis {
        fn full_dim(&self) -> usize {
            0
        }
        fn profile(&self) -> Result<BasisProfile> {
            Err(LatticeError::invalid_parameters("no basis"))
        }
        fn r(&self, _i: usize) -> f64 {
            0.0
        }
        fn first_row(&self) -> Vec<i64> {
            Vec::new()
        }
        fn clean(&mut self) -> Result<()> {
            Ok(())
        }
    }

    impl LatticeEngine for TiltEngine {
        type Basis = NoBasis;

        fn load(&mut self, _lattice: crate::core::lattice::Lattice) -> Result<NoBasis> {
            Ok(NoBasis)
        }

        fn tour(&mut self, _basis: &mut NoBasis, _kind: &TourKind) -> Result<()> {
            Ok(())
        }

        fn search(&mut self, _basis: &mut NoBasis, _window: SearchWindow, _goal: f64) -> Result<SearchOutcome> {
            Err(LatticeError::invalid_parameters("no search"))
        }

        fn simulate(&self, profile: &BasisProfile, _blocksize: usize, _tours: usize) -> Result<BasisProfile> {
            let d = profile.full_dim() as f64;
            let r = profile
                .r()
                .iter()
                .enumerate()
                .map(|(i, x)| x * (self.tilt * (i as f64 - (d - 1.0) / 2.0)).exp())
                .collect();
            BasisProfile::new(r)
        }
    }

    fn lll_like_profile(d: usize) -> BasisProfile {
        BasisProfile::new((0..d).map(|i| 1e6 * (-0.2 * i as f64).exp()).collect()).unwrap()
    }

    fn forecaster_for(profile: &BasisProfile) -> Forecaster {
        // target roughly at the Gaussian heuristic of the last 60 dimensions
        let d = profile.full_dim();
        let target = gaussian_heuristic(&profile.r()[d - 60..]) * 1.5;
        Forecaster::new(CostModel::default(), target, 1.5)
    }

    #[test]
    fn test_zero_decrease_never_recommends() {
        let cost = CostModel::default();
        assert!(!reduction_pays_off(&cost, 70, 70, 0.0));
        assert!(!reduction_pays_off(&cost, 70, 72, 0.0));
    }

    #[test]
    fn test_huge_extra_time_never_recommends() {
        let cost = CostModel::default();
        assert!(!reduction_pays_off(&cost, 70, 60, 1e30));
        // the saving is bounded by the current search time
        let bound = cost.expected_search_time(70.0);
        assert!(!reduction_pays_off(&cost, 70, 2, bound));
    }

    #[test]
    fn test_strict_decrease_with_small_time_recommends() {
        let cost = CostModel::default();
        assert!(reduction_pays_off(&cost, 70, 69, 1e-6));
        let saved = (1.0 - (-0.292f64).exp2()) * cost.expected_search_time(70.0);
        assert!(reduction_pays_off(&cost, 70, 69, saved * 0.999));
        assert!(!reduction_pays_off(&cost, 70, 69, saved * 1.001));
    }

    #[test]
    fn test_lookahead_uses_scratch_timings() {
        let profile = lll_like_profile(100);
        let forecaster = forecaster_for(&profile);
        let current = forecaster.expected_success_dim(&profile).unwrap();
        let engine = TiltEngine { tilt: 0.01 };

        let mut timings = TimingTable::new();
        timings.record(60, 2.0);
        let before = timings.clone();

        let decision = look_ahead(&engine, &forecaster, &profile, &timings, 60, current, &[62, 64], 1).unwrap();
        assert_eq!(timings, before);
        assert_eq!(decision.steps.len(), 2);

        let first = &decision.steps[0];
        assert!((first.tour_time - 2.0 * (0.292f64 * 2.0).exp2()).abs() < 1e-9);
        let second = &decision.steps[1];
        assert!((second.tour_time - 2.0 * (0.292f64 * 4.0).exp2()).abs() < 1e-9);
        assert!((second.extra_time - first.tour_time - second.tour_time).abs() < 1e-9);
        // a flatter profile can only lower the success dimension
        assert!(second.success_dim <= first.success_dim);
        assert!(first.success_dim <= current);
    }

    #[test]
    fn test_lookahead_decision() {
        let profile = lll_like_profile(100);
        let forecaster = forecaster_for(&profile);
        let current = forecaster.expected_success_dim(&profile).unwrap();

        let mut timings = TimingTable::new();
        timings.record(60, 1e-9);
        // a strong simulated improvement at almost no cost
        let engine = TiltEngine { tilt: 0.05 };
        let decision = look_ahead(&engine, &forecaster, &profile, &timings, 60, current, &[62, 64], 1).unwrap();
        assert!(decision.more_reduction());

        // the same improvement at an absurd cost
        timings.record(60, 1e40);
        let decision = look_ahead(&engine, &forecaster, &profile, &timings, 60, current, &[62, 64], 1).unwrap();
        assert!(!decision.more_reduction());

        // an unchanged profile
        let flat = TiltEngine { tilt: 0.0 };
        timings.record(60, 1e-9);
        let decision = look_ahead(&flat, &forecaster, &profile, &timings, 60, current, &[62, 64], 1).unwrap();
        assert!(!decision.more_reduction());
    }

    #[test]
    fn test_lookahead_requires_current_timing() {
        let profile = lll_like_profile(100);
        let forecaster = forecaster_for(&profile);
        let engine = TiltEngine { tilt: 0.01 };
        let timings = TimingTable::new();
        assert!(look_ahead(&engine, &forecaster, &profile, &timings, 60, 50, &[62], 1).is_err());
        // nothing upcoming, nothing to decide
        let decision = look_ahead(&engine, &forecaster, &profile, &timings, 60, 50, &[], 1).unwrap();
        assert!(!decision.more_reduction());
    }
}
