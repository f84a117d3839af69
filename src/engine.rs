//! Engine seam between the scheduler and the lattice algorithms.
//!
//! The scheduler only ever sees a [`BasisState`] (dimension, profile, first
//! row, cleanup) and a [`LatticeEngine`] that runs tours and searches on it
//! and simulates profiles. [`ReferenceEngine`] implements both on top of the
//! in-crate LLL/BKZ/SVP code.

use crate::bkz::{BKZParams, BKZReducer, JumpingTour};
use crate::config::Dim4FreeFun;
use crate::core::error::Result;
use crate::core::lattice::Lattice;
use crate::core::profile::BasisProfile;
use crate::core::types::ReductionStats;
use crate::lll::LLLReducer;
use crate::simulator::BkzSimulator;

/// Read access to a basis plus the LLL cleanup the driver applies between steps
pub trait BasisState {
    /// Lattice dimension d
    fn full_dim(&self) -> usize;

    /// Snapshot of the squared Gram-Schmidt lengths
    fn profile(&self) -> Result<BasisProfile>;

    /// Squared Gram-Schmidt length of b*_i
    fn r(&self, i: usize) -> f64;

    fn first_row(&self) -> Vec<i64>;

    /// LLL-reduce the whole basis
    fn clean(&mut self) -> Result<()>;
}

/// Which reduction tour to run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TourKind {
    /// Enumeration BKZ tour, used below the crossover blocksize
    Enumeration { blocksize: usize },
    /// Jumping tour with dimensions for free
    Jumping {
        blocksize: usize,
        jump: usize,
        extra_dim4free: usize,
        dim4free_fun: Dim4FreeFun,
        goal: f64,
    },
}

impl TourKind {
    pub fn blocksize(&self) -> usize {
        match *self {
            TourKind::Enumeration { blocksize } | TourKind::Jumping { blocksize, .. } => blocksize,
        }
    }
}

/// Search window: indices `llb..llb+len`, of which the first `free` are
/// recovered by lifting rather than searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub llb: usize,
    pub len: usize,
    pub free: usize,
}

/// What a search reports back
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Shortest projected squared length found at the window start
    pub projected_norm: f64,
    pub inserted: bool,
    pub reached_goal: bool,
}

/// Reduction engine, search engine and profile simulator behind one trait
pub trait LatticeEngine {
    type Basis: BasisState;

    /// Take ownership of a freshly built integer basis
    fn load(&mut self, lattice: Lattice) -> Result<Self::Basis>;

    /// Run one reduction tour in place
    fn tour(&mut self, basis: &mut Self::Basis, kind: &TourKind) -> Result<()>;

    /// Search a window for a vector whose projection at `window.llb` is at most `goal`
    fn search(&mut self, basis: &mut Self::Basis, window: SearchWindow, goal: f64) -> Result<SearchOutcome>;

    /// Predict the profile after `tours` tours at `blocksize`
    fn simulate(&self, profile: &BasisProfile, blocksize: usize, tours: usize) -> Result<BasisProfile>;
}

impl BasisState for Lattice {
    fn full_dim(&self) -> usize {
        self.rank()
    }

    fn profile(&self) -> Result<BasisProfile> {
        Lattice::profile(self)
    }

    fn r(&self, i: usize) -> f64 {
        Lattice::r(self, i)
    }

    fn first_row(&self) -> Vec<i64> {
        Lattice::first_row(self)
    }

    fn clean(&mut self) -> Result<()> {
        LLLReducer::new().reduce(self)?;
        Ok(())
    }
}

/// Engine backed by the in-crate enumeration code and Chen-Nguyen simulator
#[derive(Debug, Clone, Default)]
pub struct ReferenceEngine {
    bkz: BKZReducer,
    simulator: BkzSimulator,
    stats: ReductionStats,
}

impl ReferenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: BKZParams) -> Self {
        ReferenceEngine {
            bkz: BKZReducer::with_params(params),
            simulator: BkzSimulator::new(),
            stats: ReductionStats::default(),
        }
    }

    /// Totals over every tour and search run so far
    pub fn stats(&self) -> &ReductionStats {
        &self.stats
    }
}

impl LatticeEngine for ReferenceEngine {
    type Basis = Lattice;

    fn load(&mut self, lattice: Lattice) -> Result<Lattice> {
        Ok(lattice)
    }

    fn tour(&mut self, basis: &mut Lattice, kind: &TourKind) -> Result<()> {
        let stats = match *kind {
            TourKind::Enumeration { blocksize } => self.bkz.enumeration_tour(basis, blocksize)?,
            TourKind::Jumping {
                blocksize,
                jump,
                extra_dim4free,
                dim4free_fun,
                goal,
            } => {
                let tour = JumpingTour {
                    blocksize,
                    jump,
                    dim4free: dim4free_fun.free_dims(blocksize),
                    extra_dim4free,
                    goal,
                };
                self.bkz.jumping_tour(basis, &tour)?
            }
        };
        self.stats.absorb(&stats);
        Ok(())
    }

    fn search(&mut self, basis: &mut Lattice, window: SearchWindow, goal: f64) -> Result<SearchOutcome> {
        let d = basis.rank();
        let len = window.len.min(d - window.llb.min(d));
        let free = window.free.min(len.saturating_sub(2));
        if len != window.len || free != window.free {
            log::warn!(
                "search window {:?} clamped to len={} free={} for dimension {}",
                window,
                len,
                free,
                d
            );
        }

        let result = self
            .bkz
            .svp_solver()
            .search_window(basis, window.llb, len, free, window.llb, goal)?;
        self.stats.iterations += 1;
        self.stats.nodes += result.nodes;
        if result.inserted_at.is_some() {
            self.stats.changes += 1;
        }
        Ok(SearchOutcome {
            projected_norm: result.best_projected,
            inserted: result.inserted_at.is_some(),
            reached_goal: result.reached_goal,
        })
    }

    fn simulate(&self, profile: &BasisProfile, blocksize: usize, tours: usize) -> Result<BasisProfile> {
        self.simulator.simulate(profile, blocksize, tours)
    }
}
