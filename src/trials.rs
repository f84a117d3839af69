//! Independent attack trials on a rayon worker pool

use crate::core::error::{ErrorKind, LatticeError, Result};
use crate::strategy::AttackOutcome;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;

/// Which (n, seed) pairs to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialPlan {
    pub lower_bound: usize,
    /// Exclusive; only `lower_bound` when `None`
    pub upper_bound: Option<usize>,
    pub step_size: usize,
    pub trials: usize,
    pub seed: u64,
}

impl TrialPlan {
    pub fn single(n: usize, seed: u64) -> Self {
        TrialPlan {
            lower_bound: n,
            upper_bound: None,
            step_size: 1,
            trials: 1,
            seed,
        }
    }

    /// Every job: n in lower..upper by step, seeds seed..seed+trials
    pub fn jobs(&self) -> Result<Vec<(usize, u64)>> {
        if self.step_size == 0 {
            return Err(LatticeError::invalid_parameters("step size must be at least 1"));
        }
        let upper = self.upper_bound.unwrap_or(self.lower_bound + 1);
        let jobs = (self.lower_bound..upper)
            .step_by(self.step_size)
            .flat_map(|n| (0..self.trials as u64).map(move |t| (n, self.seed + t)))
            .collect();
        Ok(jobs)
    }
}

/// A failed trial, kept as data so the pool carries on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<LatticeError> for TrialFailure {
    fn from(e: LatticeError) -> Self {
        TrialFailure {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialReport {
    pub n: usize,
    pub seed: u64,
    pub result: std::result::Result<AttackOutcome, TrialFailure>,
}

impl TrialReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run `kernel` for every job of `plan` on `workers` threads. Results are
/// ordered by (n, seed) regardless of completion order.
pub fn run_all<F>(plan: &TrialPlan, workers: usize, kernel: F) -> Result<Vec<TrialReport>>
where
    F: Fn(usize, u64) -> Result<AttackOutcome> + Sync,
{
    let jobs = plan.jobs()?;
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| LatticeError::invalid_parameters(format!("worker pool: {}", e)))?;
    log::debug!("running {} trials on {} workers", jobs.len(), workers.max(1));

    let mut reports: Vec<TrialReport> = pool.install(|| {
        jobs.into_par_iter()
            .map(|(n, seed)| {
                let result = kernel(n, seed);
                match &result {
                    Ok(outcome) => log::info!(
                        "n={} seed={}: solved after {} tours, {} searches",
                        n,
                        seed,
                        outcome.tours,
                        outcome.searches
                    ),
                    Err(e) => log::warn!("n={} seed={}: {}", n, seed, e),
                }
                TrialReport {
                    n,
                    seed,
                    result: result.map_err(TrialFailure::from),
                }
            })
            .collect()
    });
    reports.sort_by_key(|r| (r.n, r.seed));
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jobs() {
        let plan = TrialPlan {
            lower_bound: 40,
            upper_bound: Some(50),
            step_size: 5,
            trials: 2,
            seed: 7,
        };
        assert_eq!(plan.jobs().unwrap(), vec![(40, 7), (40, 8), (45, 7), (45, 8)]);
        assert_eq!(TrialPlan::single(40, 3).jobs().unwrap(), vec![(40, 3)]);

        let bad = TrialPlan {
            step_size: 0,
            ..TrialPlan::single(40, 0)
        };
        assert!(bad.jobs().is_err());
    }

    #[test]
    fn test_failures_do_not_abort_pool() {
        let plan = TrialPlan {
            lower_bound: 10,
            upper_bound: Some(13),
            step_size: 1,
            trials: 3,
            seed: 0,
        };
        let reports = run_all(&plan, 4, |n, seed| {
            Err(if seed % 2 == 0 {
                LatticeError::InfeasibleParameters { n, alpha: 0.005, q: 101 }
            } else {
                LatticeError::ScheduleExhausted {
                    n,
                    alpha: 0.005,
                    last_blocksize: 20,
                    tours_run: 11,
                }
            })
        })
        .unwrap();

        assert_eq!(reports.len(), 9);
        let keys: Vec<(usize, u64)> = reports.iter().map(|r| (r.n, r.seed)).collect();
        assert_eq!(keys, plan.jobs().unwrap());
        for report in &reports {
            let failure = report.result.as_ref().unwrap_err();
            let expected = if report.seed % 2 == 0 {
                ErrorKind::InfeasibleParameters
            } else {
                ErrorKind::ScheduleExhausted
            };
            assert_eq!(failure.kind, expected);
            assert!(!report.is_success());
        }
    }
}
