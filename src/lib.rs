//! Adaptive primal attack on LWE challenges
//!
//! This crate decides at runtime how much lattice reduction to spend on the
//! Kannan embedding of an LWE instance before switching to a search for the
//! error vector:
//! - blocksize schedules built from a baseline prediction or an explicit range
//! - a cost model and forecasts of the attainable and needed search dimensions
//! - lookahead over simulated basis profiles
//! - the reduce/evaluate/search driver and its solution artifact
//!
//! The lattice algorithms sit behind [`engine::LatticeEngine`]; the
//! reference engine runs LLL, enumeration BKZ, jumping tours with
//! dimensions for free and a Chen-Nguyen simulator, all in this crate.
//!
//! # Examples
//!
//! Attack a generated instance:
//! ```rust,no_run
//! use lwe_primal::{Attack, AttackParams, GsaEstimator, ReferenceEngine, SyntheticInstances};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let params = AttackParams {
//!     samples: Some(30),
//!     ..AttackParams::default()
//! };
//! let source = SyntheticInstances::new();
//! let estimator = GsaEstimator::default();
//! let attack = Attack::new(&params, &source, &estimator);
//! let outcome = attack.run(&mut ReferenceEngine::new(), 10, 0)?;
//! println!("solved with blocksize {}", outcome.final_blocksize);
//! # Ok(())
//! # }
//! ```
//!
//! Default blocksize schedule around a predicted blocksize:
//! ```rust
//! use lwe_primal::BlocksizeSchedule;
//!
//! let schedule = BlocksizeSchedule::default_for(100);
//! assert_eq!(schedule.as_slice()[0], 10);
//! assert_eq!(schedule.upcoming(87, 2), &[89, 91]);
//! ```

pub mod bkz;
pub mod config;
pub mod core;
pub mod engine;
pub mod lll;
pub mod lwe;
pub mod simulator;
pub mod strategy;
pub mod svp;
pub mod trials;

pub use crate::core::error::{ErrorKind, LatticeError, Result};
pub use crate::core::lattice::Lattice;
pub use crate::core::profile::{gaussian_heuristic, BasisProfile};
pub use bkz::{BKZParams, BKZReducer, JumpingTour};
pub use config::{AttackParams, Dim4FreeFun};
pub use engine::{BasisState, LatticeEngine, ReferenceEngine, SearchOutcome, SearchWindow, TourKind};
pub use lll::{LLLParams, LLLReducer};
pub use lwe::{
    primal_lattice_basis, ChallengeDirectory, GsaEstimator, InstanceSource, LweInstance, LweInstanceParams,
    ParameterEstimator, PredictedParameters, SyntheticInstances,
};
pub use simulator::BkzSimulator;
pub use strategy::{
    Attack, AttackOutcome, BlocksizeSchedule, CostModel, Forecaster, RunContext, TraceReport, Tracer,
};
pub use svp::{SVPSolver, SVPSolverParams};
pub use trials::{run_all, TrialFailure, TrialPlan, TrialReport};
