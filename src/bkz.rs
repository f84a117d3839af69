//! BKZ (Block Korkine-Zolotarev) reduction tours

use crate::core::error::{LatticeError, Result};
use crate::core::lattice::Lattice;
use crate::core::types::{AlgorithmParams, ReductionStats};
use crate::lll::{LLLParams, LLLReducer};
use crate::svp::{SVPSolver, SVPSolverParams};

/// Parameters for BKZ reduction
#[derive(Debug, Clone, Default)]
pub struct BKZParams {
    /// LLL parameters for the cleanup after each insertion
    pub lll_params: LLLParams,
    /// SVP solver parameters
    pub svp_params: SVPSolverParams,
    /// Algorithm parameters
    pub algorithm_params: AlgorithmParams,
}

impl BKZParams {
    /// Validate BKZ parameters
    pub fn validate(&self) -> Result<()> {
        self.lll_params.validate()?;
        self.svp_params.validate()?;
        Ok(())
    }
}

/// Shape of one jumping tour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpingTour {
    pub blocksize: usize,
    pub jump: usize,
    /// Free dimensions of each window
    pub dim4free: usize,
    /// Extra dimensions each window is extended by towards index 0
    pub extra_dim4free: usize,
    /// Stop as soon as r[0] drops to this squared length
    pub goal: f64,
}

impl JumpingTour {
    /// Windows (kappa, length, free) visited by the tour on a basis of dimension d
    pub fn windows(&self, d: usize) -> Vec<(usize, usize, usize)> {
        let blocksize = (self.blocksize + self.extra_dim4free).min(d);
        let dim4free = (self.dim4free + self.extra_dim4free).min(blocksize.saturating_sub(2));
        let jump = self.jump.max(1);

        let mut windows = Vec::new();
        for i in (0..dim4free).step_by(jump) {
            windows.push((0, blocksize - dim4free + i, i));
        }
        for kappa in (0..d - blocksize).step_by(jump) {
            windows.push((kappa, blocksize, dim4free));
        }
        for i in (0..dim4free).step_by(jump) {
            windows.push((d - blocksize + i, blocksize - i, dim4free - i));
        }
        windows
    }
}

/// BKZ reducer implementation
#[derive(Debug, Clone, Default)]
pub struct BKZReducer {
    params: BKZParams,
    lll_reducer: LLLReducer,
    svp_solver: SVPSolver,
}

impl BKZReducer {
    /// Create new BKZ reducer with default parameters
    pub fn new() -> Self {
        Self::with_params(BKZParams::default())
    }

    /// Create new BKZ reducer with custom parameters
    pub fn with_params(params: BKZParams) -> Self {
        let lll_reducer = LLLReducer::with_params(params.lll_params.clone());
        let svp_solver = SVPSolver::with_params(params.svp_params.clone());

        BKZReducer {
            params,
            lll_reducer,
            svp_solver,
        }
    }

    pub fn svp_solver(&self) -> &SVPSolver {
        &self.svp_solver
    }

    pub fn lll_reducer(&self) -> &LLLReducer {
        &self.lll_reducer
    }

    /// One BKZ tour: block SVP by enumeration at every index
    pub fn enumeration_tour(&self, lattice: &mut Lattice, beta: usize) -> Result<ReductionStats> {
        self.params.validate()?;
        if beta < 2 {
            return Err(LatticeError::invalid_parameters(format!(
                "Block size must be at least 2, got {}",
                beta
            )));
        }

        let d = lattice.rank();
        let mut stats = ReductionStats::default();
        self.lll_reducer.reduce(lattice)?;

        for kappa in 0..d.saturating_sub(1) {
            let end = (kappa + beta).min(d);
            let (improved, nodes) = self.svp_solver.improve_block(lattice, kappa, end)?;
            stats.iterations += 1;
            stats.nodes += nodes;
            if improved {
                stats.changes += 1;
                self.lll_reducer.reduce_range(lattice, kappa, end)?;
            }
        }

        if self.params.algorithm_params.verbose {
            log::debug!(
                "BKZ-{} tour: {} insertions, {} nodes",
                beta,
                stats.changes,
                stats.nodes
            );
        }
        Ok(stats)
    }

    /// One jumping tour: window searches with dimensions for free whose start
    /// advances by `jump`, returning early once r[0] reaches the goal.
    pub fn jumping_tour(&self, lattice: &mut Lattice, tour: &JumpingTour) -> Result<ReductionStats> {
        self.params.validate()?;
        if tour.blocksize < 2 {
            return Err(LatticeError::invalid_parameters(format!(
                "Block size must be at least 2, got {}",
                tour.blocksize
            )));
        }

        let d = lattice.rank();
        let mut stats = ReductionStats::default();
        self.lll_reducer.reduce(lattice)?;

        for (kappa, len, free) in tour.windows(d) {
            let result = self.svp_solver.search_window(lattice, kappa, len, free, kappa, tour.goal)?;
            stats.iterations += 1;
            stats.nodes += result.nodes;
            if result.inserted_at.is_some() {
                stats.changes += 1;
                self.lll_reducer.reduce_range(lattice, 0, kappa + len)?;
            }
            if lattice.r(0) <= tour.goal {
                log::debug!("jumping tour reached the goal at kappa={}", kappa);
                break;
            }
        }

        self.lll_reducer.reduce(lattice)?;
        if self.params.algorithm_params.verbose {
            log::debug!(
                "jumping tour b={} jump={}: {} insertions, {} nodes",
                tour.blocksize,
                tour.jump,
                stats.changes,
                stats.nodes
            );
        }
        Ok(stats)
    }
}
