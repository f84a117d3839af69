//! The adaptive reduce-or-search control loop of one attack.
//!
//! A run walks the blocksize schedule one tour at a time. After each tour it
//! compares the search dimension affordable in the time spent so far with
//! the dimension the current profile needs. When the search is affordable
//! and the lookahead does not promise a cheaper path through more
//! reduction, it searches a window at the end of the basis.

use crate::config::AttackParams;
use crate::core::error::{LatticeError, Result};
use crate::core::lattice::Lattice;
use crate::core::profile::BasisProfile;
use crate::engine::{BasisState, LatticeEngine, SearchOutcome, SearchWindow, TourKind};
use crate::lwe::{primal_lattice_basis, InstanceSource, LweInstanceParams, ParameterEstimator, PredictedParameters};
use crate::strategy::context::RunContext;
use crate::strategy::cost::CostModel;
use crate::strategy::finalize::{exhausted, format_solution, write_solution, AttackOutcome};
use crate::strategy::forecast::Forecaster;
use crate::strategy::lookahead::look_ahead;
use crate::strategy::schedule::BlocksizeSchedule;
use crate::strategy::tracer::Tracer;
use std::fmt;

/// Squared norm below which a basis vector is accepted as the solution
pub fn target_norm(goal_margin: f64, alpha: f64, q: i64, m: usize) -> f64 {
    let sigma = alpha * q as f64;
    goal_margin * sigma * sigma * m as f64 + 1.0
}

/// Search window for a search granted `max_dim` dimensions after a tour at
/// `blocksize`: start at d - blocksize and extend towards the front while
/// the projected sublattice is still expected to be shorter than the
/// projected target.
pub fn search_window(profile: &BasisProfile, blocksize: usize, target_norm: f64, max_dim: usize) -> SearchWindow {
    let d = profile.full_dim();
    let mut llb = d.saturating_sub(blocksize);
    while llb > 0 && profile.suffix_gaussian_heuristic(llb) < target_norm * (d - llb) as f64 / d as f64 {
        llb -= 1;
    }
    let len = d - llb;
    SearchWindow {
        llb,
        len,
        free: len.saturating_sub(max_dim),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Reduce,
    Evaluate,
    Search,
    Done,
    Exhausted,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverState::Reduce => "reduce",
            DriverState::Evaluate => "evaluate",
            DriverState::Search => "search",
            DriverState::Done => "done",
            DriverState::Exhausted => "exhausted",
        };
        f.write_str(name)
    }
}

/// Where the loop stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub state: DriverState,
    pub last_blocksize: usize,
    pub tours: usize,
    pub searches: usize,
}

impl Default for Progress {
    fn default() -> Self {
        Progress {
            state: DriverState::Reduce,
            last_blocksize: 0,
            tours: 0,
            searches: 0,
        }
    }
}

impl Progress {
    fn enter(&mut self, next: DriverState, ctx: &mut RunContext) {
        if self.state == next {
            return;
        }
        log::debug!("{} -> {}", self.state, next);
        ctx.tracer.count(&format!("state-{}", next));
        self.state = next;
    }
}

/// Everything fixed before the first engine call
#[derive(Debug, Clone)]
pub struct AttackSetup {
    pub instance: LweInstanceParams,
    pub predicted: PredictedParameters,
    pub target_norm: f64,
    pub schedule: BlocksizeSchedule,
    pub basis: Lattice,
}

/// One attack configuration bound to its instance source and estimator
pub struct Attack<'a> {
    params: &'a AttackParams,
    source: &'a dyn InstanceSource,
    estimator: &'a dyn ParameterEstimator,
}

impl<'a> Attack<'a> {
    pub fn new(params: &'a AttackParams, source: &'a dyn InstanceSource, estimator: &'a dyn ParameterEstimator) -> Self {
        Attack {
            params,
            source,
            estimator,
        }
    }

    pub fn params(&self) -> &AttackParams {
        self.params
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel::new(self.params.cost_exponent, self.params.cost_dim_offset, self.params.threads)
    }

    /// Load the instance, predict parameters and build the schedule and the
    /// embedding. No engine is involved.
    pub fn prepare(&self, n: usize, seed: u64) -> Result<AttackSetup> {
        let params = self.params;
        params.validate()?;

        let instance = self.source.load(n, params.alpha, seed)?;
        log::info!("Primal attack, LWE challenge n={}, alpha={:.4}", instance.n, instance.alpha);

        let decouple = params.svp_bkz_time_factor > 0.0;
        let predicted = self.estimator.estimate(
            instance.n,
            instance.alpha,
            instance.q,
            decouple,
            Some(instance.samples()),
        )?;
        let m = params.samples.unwrap_or(predicted.samples);
        let lwe = instance.params(m)?;
        log::info!(
            "Chose {} samples. Predict solution at bkz-{} + svp-{}",
            m,
            predicted.blocksize,
            predicted.search_dim
        );

        let target_norm = target_norm(params.goal_margin, lwe.alpha, lwe.q, m);
        let schedule = BlocksizeSchedule::build(params.blocksizes.as_deref(), predicted.blocksize)?;
        if schedule.is_empty() {
            return Err(LatticeError::invalid_parameters("blocksize schedule is empty"));
        }
        log::debug!("target norm {:.3}, {} scheduled blocksizes", target_norm, schedule.len());

        let basis = primal_lattice_basis(&instance, m)?;
        Ok(AttackSetup {
            instance: lwe,
            predicted,
            target_norm,
            schedule,
            basis,
        })
    }

    /// Run the attack on instance (n, seed) with a fresh context
    pub fn run<E: LatticeEngine>(&self, engine: &mut E, n: usize, seed: u64) -> Result<AttackOutcome> {
        let ctx = RunContext::new(Tracer::new(self.params.dummy_tracer, "lwe"));
        self.run_with_context(engine, n, seed, ctx)
    }

    pub fn run_with_context<E: LatticeEngine>(
        &self,
        engine: &mut E,
        n: usize,
        seed: u64,
        mut ctx: RunContext,
    ) -> Result<AttackOutcome> {
        let AttackSetup {
            instance,
            predicted,
            target_norm,
            schedule,
            basis,
        } = self.prepare(n, seed)?;

        let mut basis = engine.load(basis)?;
        basis.clean()?;
        let slope = basis.profile()?.slope();
        log::info!("Initial slope = {:.5}", slope);
        ctx.tracer.note("lwe", "initial_slope", slope);
        ctx.start_clocks();

        let progress = self.drive(engine, &mut basis, &schedule, target_norm, &mut ctx)?;
        if progress.state != DriverState::Done {
            return Err(exhausted(&instance, progress.last_blocksize, progress.tours));
        }

        let wall_seconds = ctx.wall_elapsed();
        let solution = basis.first_row();
        log::info!("Finished! TT={:.2} sec", wall_seconds);
        log::info!("{}", format_solution(&solution));
        let artifact = write_solution(&self.params.solution_dir, instance.n, instance.alpha, &solution)?;

        Ok(AttackOutcome {
            params: instance,
            predicted,
            final_blocksize: progress.last_blocksize,
            tours: progress.tours,
            searches: progress.searches,
            wall_seconds,
            solution,
            artifact,
            trace: ctx.tracer.report(),
        })
    }

    /// Walk the schedule until the goal is met or every tour is spent
    pub fn drive<E: LatticeEngine>(
        &self,
        engine: &mut E,
        basis: &mut E::Basis,
        schedule: &BlocksizeSchedule,
        target_norm: f64,
        ctx: &mut RunContext,
    ) -> Result<Progress> {
        let params = self.params;
        let forecaster = Forecaster::new(self.cost_model(), target_norm, params.goal_margin);
        let mut progress = Progress::default();
        let mut cursor = schedule.cursor();

        'schedule: while let Some(blocksize) = cursor.next() {
            progress.last_blocksize = blocksize;
            for _ in 0..params.tours {
                progress.enter(DriverState::Reduce, ctx);
                let reduction_time = self.reduce(engine, basis, blocksize, target_norm, ctx)?;
                progress.tours += 1;
                if basis.r(0) <= target_norm {
                    progress.enter(DriverState::Done, ctx);
                    break 'schedule;
                }

                progress.enter(DriverState::Evaluate, ctx);
                let max_dim = forecaster.attainable_search_dim(reduction_time, params.svp_bkz_time_factor);
                let profile = basis.profile()?;
                let expected_dim = forecaster.expected_success_dim(&profile)?;
                log::info!(
                    "Without otf, would expect solution at search-{}. n_max={} in the given time.",
                    expected_dim,
                    max_dim
                );
                if expected_dim + 1 >= max_dim {
                    continue;
                }

                let upcoming = schedule.upcoming(blocksize, params.lookahead_steps);
                let decision = look_ahead(
                    &*engine,
                    &forecaster,
                    &profile,
                    &ctx.timings,
                    blocksize,
                    expected_dim,
                    upcoming,
                    1,
                )?;
                if decision.more_reduction() {
                    continue;
                }

                progress.enter(DriverState::Search, ctx);
                let max_dim = max_dim + params.search_dim_margin;
                let window = search_window(&profile, blocksize, target_norm, max_dim);
                if params.verbose {
                    log::info!(
                        "Starting search {{{}, {}, {}}}, n_max = {}, Tmax = {:.2} sec",
                        window.llb,
                        window.len,
                        window.free,
                        max_dim,
                        params.svp_bkz_time_factor * reduction_time
                    );
                }
                let goal = target_norm * window.len as f64 / profile.full_dim() as f64;
                self.search(engine, basis, window, goal, ctx)?;
                progress.searches += 1;
                if basis.r(0) <= target_norm {
                    progress.enter(DriverState::Done, ctx);
                    break 'schedule;
                }
            }
        }

        if progress.state != DriverState::Done {
            progress.enter(DriverState::Exhausted, ctx);
        }
        Ok(progress)
    }

    /// One tour at `blocksize`, then cleanup. Returns the reduction time
    /// since the start or the last search, measured before the cleanup.
    fn reduce<E: LatticeEngine>(
        &self,
        engine: &mut E,
        basis: &mut E::Basis,
        blocksize: usize,
        target_norm: f64,
        ctx: &mut RunContext,
    ) -> Result<f64> {
        let params = self.params;
        let (kind, label) = if blocksize < params.enum_crossover {
            (TourKind::Enumeration { blocksize }, format!("bkz-{}", blocksize))
        } else {
            (
                TourKind::Jumping {
                    blocksize,
                    jump: params.jump,
                    extra_dim4free: params.extra_dim4free,
                    dim4free_fun: params.dim4free_fun,
                    goal: target_norm,
                },
                format!("jump-bkz-{}", blocksize),
            )
        };
        if params.verbose {
            log::info!("Starting a {} tour.", label);
        }

        let start = ctx.now();
        {
            let _span = ctx.tracer.span(label.as_str());
            engine.tour(basis, &kind)?;
        }
        let reduction_time = ctx.reduction_elapsed();
        let tour_time = ctx.now() - start;
        ctx.timings.record(blocksize, tour_time);

        if params.verbose {
            let slope = basis.profile()?.slope();
            ctx.tracer.note(&label, "slope", slope);
            log::info!("slope: {:.5}, walltime: {:.3} sec", slope, ctx.wall_elapsed());
        }
        log::debug!("{} took {:.3} sec", label, tour_time);

        basis.clean()?;
        Ok(reduction_time)
    }

    fn search<E: LatticeEngine>(
        &self,
        engine: &mut E,
        basis: &mut E::Basis,
        window: SearchWindow,
        goal: f64,
        ctx: &mut RunContext,
    ) -> Result<SearchOutcome> {
        let outcome = {
            let _span = ctx.tracer.span(format!("search-{}", window.len));
            engine.search(basis, window, goal)?
        };
        log::debug!(
            "search {:?}: projected norm {:.3} (goal {:.3}), inserted: {}",
            window,
            outcome.projected_norm,
            goal,
            outcome.inserted
        );

        if self.params.verbose {
            let slope = basis.profile()?.slope();
            log::info!("slope: {:.5}, walltime: {:.3} sec", slope, ctx.wall_elapsed());
        }

        basis.clean()?;
        ctx.reset_reduction_clock();
        Ok(outcome)
    }
}
