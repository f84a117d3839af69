//! End-to-end runs of the attack driver
use lwe_primal::lwe::instance::format_challenge;
use lwe_primal::strategy::{DriverState, ManualClock, RunContext};
use lwe_primal::*;
use tempfile::TempDir;

/// Basis whose profile is fixed by the test and whose first vector becomes
/// the solution once the engine says so.
struct ScriptedBasis {
    r: Vec<f64>,
    solved: bool,
    solved_norm: f64,
}

impl BasisState for ScriptedBasis {
    fn full_dim(&self) -> usize {
        self.r.len()
    }

    fn profile(&self) -> Result<BasisProfile> {
        BasisProfile::new(self.r.clone())
    }

    fn r(&self, i: usize) -> f64 {
        if self.solved && i == 0 {
            self.solved_norm
        } else {
            self.r[i]
        }
    }

    fn first_row(&self) -> Vec<i64> {
        let mut row = vec![0; self.r.len()];
        if self.solved {
            row[0] = 1;
            row[self.r.len() - 1] = -1;
        }
        row
    }

    fn clean(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Halve every log-length's distance from the geometric mean
fn flatten(profile: &BasisProfile) -> BasisProfile {
    let logs: Vec<f64> = profile.r().iter().map(|x| x.ln()).collect();
    let mean = logs.iter().sum::<f64>() / logs.len() as f64;
    BasisProfile::new(logs.iter().map(|l| (mean + (l - mean) / 2.0).exp()).collect()).unwrap()
}

/// Engine that spends `tour_seconds` of manual time per tour, solves at a
/// given blocksize or on the first search, and logs every call. Simulated
/// tours up to `flatten_through` flatten the profile; later ones leave it
/// unchanged.
struct ScriptedEngine {
    clock: ManualClock,
    target_norm: f64,
    tour_seconds: f64,
    solve_at: Option<usize>,
    search_solves: bool,
    flatten_through: Option<usize>,
    loads: usize,
    tours: Vec<usize>,
    searches: Vec<(SearchWindow, f64)>,
}

impl ScriptedEngine {
    fn new(clock: ManualClock, target_norm: f64, tour_seconds: f64) -> Self {
        ScriptedEngine {
            clock,
            target_norm,
            tour_seconds,
            solve_at: None,
            search_solves: false,
            flatten_through: None,
            loads: 0,
            tours: Vec::new(),
            searches: Vec::new(),
        }
    }

    fn calls(&self) -> usize {
        self.loads + self.tours.len() + self.searches.len()
    }
}

impl LatticeEngine for ScriptedEngine {
    type Basis = ScriptedBasis;

    fn load(&mut self, lattice: Lattice) -> Result<ScriptedBasis> {
        self.loads += 1;
        let d = lattice.rank();
        let shape: Vec<f64> = (0..d).map(|i| (-0.05 * i as f64).exp()).collect();
        // a profile whose full lattice sits well above the target
        let scale = 8.0 * self.target_norm / gaussian_heuristic(&shape);
        Ok(ScriptedBasis {
            r: shape.iter().map(|x| x * scale).collect(),
            solved: false,
            solved_norm: self.target_norm / 2.0,
        })
    }

    fn tour(&mut self, basis: &mut ScriptedBasis, kind: &TourKind) -> Result<()> {
        self.tours.push(kind.blocksize());
        self.clock.advance(self.tour_seconds);
        if self.solve_at.map_or(false, |b| kind.blocksize() >= b) {
            basis.solved = true;
        }
        Ok(())
    }

    fn search(&mut self, basis: &mut ScriptedBasis, window: SearchWindow, goal: f64) -> Result<SearchOutcome> {
        self.searches.push((window, goal));
        basis.solved = self.search_solves;
        Ok(SearchOutcome {
            projected_norm: goal,
            inserted: self.search_solves,
            reached_goal: self.search_solves,
        })
    }

    fn simulate(&self, profile: &BasisProfile, blocksize: usize, _tours: usize) -> Result<BasisProfile> {
        if self.flatten_through.map_or(false, |b| blocksize <= b) {
            Ok(flatten(profile))
        } else {
            Ok(profile.clone())
        }
    }
}

struct FailingEstimator;

impl ParameterEstimator for FailingEstimator {
    fn estimate(
        &self,
        n: usize,
        alpha: f64,
        q: i64,
        _decouple: bool,
        _max_samples: Option<usize>,
    ) -> Result<PredictedParameters> {
        Err(LatticeError::InfeasibleParameters { n, alpha, q })
    }
}

fn params_in(dir: &TempDir) -> AttackParams {
    AttackParams {
        solution_dir: dir.path().join("lwechallenge"),
        dummy_tracer: false,
        ..AttackParams::default()
    }
}

#[test]
fn test_scenario_a_solves_within_schedule() {
    let tmp = TempDir::new().unwrap();
    let params = params_in(&tmp);
    let source = SyntheticInstances::new();
    let estimator = GsaEstimator::default();
    let attack = Attack::new(&params, &source, &estimator);

    let setup = attack.prepare(40, 0).unwrap();
    assert_eq!(setup.instance.n, 40);
    assert!(setup.target_norm > 0.0);
    let schedule_len = setup.schedule.len();

    let clock = ManualClock::new();
    let mut engine = ScriptedEngine::new(clock.clone(), setup.target_norm, 1e-9);
    engine.solve_at = Some(30);
    let ctx = RunContext::with_clock(Tracer::new(false, "lwe"), Box::new(clock));
    let outcome = attack.run_with_context(&mut engine, 40, 0, ctx).unwrap();

    // searches are never affordable at a nanosecond per tour
    assert!(engine.searches.is_empty());
    assert_eq!(engine.tours, (10..=30).collect::<Vec<_>>());
    assert!(engine.tours.len() <= schedule_len * params.tours);
    assert_eq!(outcome.tours, 21);
    assert_eq!(outcome.final_blocksize, 30);
    assert_eq!(outcome.searches, 0);
    assert_eq!(outcome.predicted, setup.predicted);

    assert!(outcome.artifact.ends_with("040-005-solution.txt"));
    let text = std::fs::read_to_string(&outcome.artifact).unwrap();
    assert!(text.starts_with("(1, 0, "));
    assert!(text.ends_with(", -1)"));

    let trace = outcome.trace.unwrap();
    assert_eq!(trace.entries["bkz-10"].calls, 1);
    assert_eq!(trace.entries["state-evaluate"].calls, 20);
    assert_eq!(trace.entries["state-done"].calls, 1);
}

#[test]
fn test_exhausted_schedule_reports_last_blocksize() {
    let tmp = TempDir::new().unwrap();
    let params = AttackParams {
        blocksizes: Some("40:44".to_string()),
        tours: 2,
        ..params_in(&tmp)
    };
    let source = SyntheticInstances::new();
    let estimator = GsaEstimator::default();
    let attack = Attack::new(&params, &source, &estimator);
    let target = attack.prepare(40, 0).unwrap().target_norm;

    let clock = ManualClock::new();
    let mut engine = ScriptedEngine::new(clock.clone(), target, 1e-9);
    let ctx = RunContext::with_clock(Tracer::new(true, "lwe"), Box::new(clock));
    let err = attack.run_with_context(&mut engine, 40, 0, ctx).unwrap_err();

    match err {
        LatticeError::ScheduleExhausted {
            n,
            last_blocksize,
            tours_run,
            ..
        } => {
            assert_eq!(n, 40);
            assert_eq!(last_blocksize, 43);
            assert_eq!(tours_run, (30 + 4) * 2);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(engine.tours.len(), 68);
    assert!(!params.solution_dir.exists());
}

#[test]
fn test_affordable_search_is_triggered() {
    let tmp = TempDir::new().unwrap();
    let params = params_in(&tmp);
    let source = SyntheticInstances::new();
    let estimator = GsaEstimator::default();
    let attack = Attack::new(&params, &source, &estimator);
    let setup = attack.prepare(40, 0).unwrap();
    let d = setup.basis.rank();

    let clock = ManualClock::new();
    // a million seconds of reduction buys a search beyond the full dimension
    let mut engine = ScriptedEngine::new(clock.clone(), setup.target_norm, 1e6);
    engine.search_solves = true;
    let ctx = RunContext::with_clock(Tracer::new(false, "lwe"), Box::new(clock));
    let outcome = attack.run_with_context(&mut engine, 40, 0, ctx).unwrap();

    assert_eq!(engine.tours, vec![10]);
    assert_eq!(engine.searches.len(), 1);
    let (window, goal) = engine.searches[0];
    assert_eq!(window.llb + window.len, d);
    assert!(window.len >= 10);
    assert_eq!(window.free, 0);
    let expected_goal = setup.target_norm * window.len as f64 / d as f64;
    assert!((goal - expected_goal).abs() < 1e-9 * expected_goal);

    assert_eq!(outcome.searches, 1);
    assert_eq!(outcome.tours, 1);
    assert!(outcome.trace.unwrap().entries.contains_key(&format!("search-{}", window.len)));
}

#[test]
fn test_lookahead_defers_affordable_search() {
    let tmp = TempDir::new().unwrap();
    let params = AttackParams {
        svp_bkz_time_factor: 100.0,
        ..params_in(&tmp)
    };
    let source = SyntheticInstances::new();
    let estimator = GsaEstimator::default();
    let attack = Attack::new(&params, &source, &estimator);
    let cost = attack.cost_model();

    // steep profile, first vector far above the target
    let target = 1000.0;
    let r: Vec<f64> = (0..80).map(|i| 64.0 * target * (-0.1 * i as f64).exp()).collect();
    let profile = BasisProfile::new(r.clone()).unwrap();
    let forecaster = Forecaster::new(cost, target, params.goal_margin);
    let expected = forecaster.expected_success_dim(&profile).unwrap();
    assert!(expected > 2);
    assert!(forecaster.expected_success_dim(&flatten(&profile)).unwrap() < expected);

    // a single tour already buys a search two dimensions past the expected one
    let tour_seconds = cost.expected_search_time(expected as f64 + 2.5) / params.svp_bkz_time_factor;
    let clock = ManualClock::new();
    let mut engine = ScriptedEngine::new(clock.clone(), target, tour_seconds);
    engine.search_solves = true;
    engine.flatten_through = Some(13);
    let mut basis = ScriptedBasis {
        r,
        solved: false,
        solved_norm: target / 2.0,
    };
    let schedule = BlocksizeSchedule::explicit("40:44").unwrap();
    let mut ctx = RunContext::with_clock(Tracer::new(false, "lwe"), Box::new(clock));
    ctx.start_clocks();
    let progress = attack.drive(&mut engine, &mut basis, &schedule, target, &mut ctx).unwrap();

    // lookahead from 10, 11 and 12 still sees a flatter profile at 13;
    // from 13 it sees no gain and the search runs
    assert_eq!(engine.tours, vec![10, 11, 12, 13]);
    assert_eq!(engine.searches.len(), 1);
    assert_eq!(progress.state, DriverState::Done);
    assert_eq!(progress.tours, 4);
    assert_eq!(progress.searches, 1);
    assert_eq!(progress.last_blocksize, 13);

    let trace = ctx.tracer.report().unwrap();
    assert_eq!(trace.entries["state-evaluate"].calls, 4);
    assert_eq!(trace.entries["state-search"].calls, 1);
    let recorded = ctx.timings.get(13).unwrap();
    assert!((recorded - tour_seconds).abs() < 1e-9 * tour_seconds);
}

#[test]
fn test_zero_time_factor_never_searches() {
    let tmp = TempDir::new().unwrap();
    let params = AttackParams {
        svp_bkz_time_factor: 0.0,
        blocksizes: Some("40:42".to_string()),
        ..params_in(&tmp)
    };
    let source = SyntheticInstances::new();
    let estimator = GsaEstimator::default();
    let attack = Attack::new(&params, &source, &estimator);
    let target = attack.prepare(40, 0).unwrap().target_norm;

    let clock = ManualClock::new();
    let mut engine = ScriptedEngine::new(clock.clone(), target, 1e6);
    engine.search_solves = true;
    let ctx = RunContext::with_clock(Tracer::new(true, "lwe"), Box::new(clock));
    let err = attack.run_with_context(&mut engine, 40, 0, ctx).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ScheduleExhausted);
    assert!(engine.searches.is_empty());
    assert_eq!(engine.tours.len(), 32);
}

#[test]
fn test_scenario_b_failing_estimator_makes_no_engine_calls() {
    let tmp = TempDir::new().unwrap();
    let params = params_in(&tmp);
    let source = SyntheticInstances::new();
    let attack = Attack::new(&params, &source, &FailingEstimator);

    let clock = ManualClock::new();
    let mut engine = ScriptedEngine::new(clock.clone(), 1.0, 1.0);
    let ctx = RunContext::with_clock(Tracer::new(true, "lwe"), Box::new(clock));
    let err = attack.run_with_context(&mut engine, 40, 0, ctx).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InfeasibleParameters);
    assert_eq!(engine.calls(), 0);
}

#[test]
fn test_missing_challenge_makes_no_engine_calls() {
    let tmp = TempDir::new().unwrap();
    let params = params_in(&tmp);
    let source = ChallengeDirectory::new(tmp.path());
    let estimator = GsaEstimator::default();
    let attack = Attack::new(&params, &source, &estimator);

    let mut engine = ScriptedEngine::new(ManualClock::new(), 1.0, 1.0);
    let err = attack.run(&mut engine, 40, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InstanceNotFound);
    assert_eq!(engine.calls(), 0);
}

#[test]
fn test_reference_engine_solves_small_challenge_file() {
    let tmp = TempDir::new().unwrap();
    let instance = SyntheticInstances::new().generate(10, 0.005, 1).unwrap();
    let challenges = tmp.path().join("challenges");
    std::fs::create_dir_all(&challenges).unwrap();
    std::fs::write(challenges.join("010-005-challenge.txt"), format_challenge(&instance)).unwrap();

    let params = AttackParams {
        samples: Some(30),
        goal_margin: 3.0,
        verbose: false,
        ..params_in(&tmp)
    };
    let source = ChallengeDirectory::new(&challenges);
    let estimator = GsaEstimator::default();
    let attack = Attack::new(&params, &source, &estimator);
    let outcome = attack.run(&mut ReferenceEngine::new(), 10, 0).unwrap();

    assert_eq!(outcome.params.m, 30);
    assert_eq!(outcome.params.q, 101);
    assert_eq!(outcome.solution.len(), 31);
    let norm: i64 = outcome.solution.iter().map(|x| x * x).sum();
    let target = strategy::target_norm(3.0, 0.005, 101, 30);
    assert!((norm as f64) <= target);
    // the embedding coefficient of the error vector
    assert_eq!(outcome.solution[30].abs(), 1);
    assert!(outcome.artifact.exists());
}

#[test]
fn test_trials_over_synthetic_instances() {
    let tmp = TempDir::new().unwrap();
    let params = AttackParams {
        samples: Some(30),
        goal_margin: 3.0,
        verbose: false,
        ..params_in(&tmp)
    };
    let source = SyntheticInstances::new();
    let estimator = GsaEstimator::default();
    let attack = Attack::new(&params, &source, &estimator);
    let plan = TrialPlan {
        lower_bound: 10,
        upper_bound: None,
        step_size: 1,
        trials: 2,
        seed: 5,
    };

    let reports = run_all(&plan, 2, |n, seed| attack.run(&mut ReferenceEngine::new(), n, seed)).unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!((reports[0].n, reports[0].seed), (10, 5));
    assert_eq!((reports[1].n, reports[1].seed), (10, 6));
    assert!(reports.iter().all(TrialReport::is_success));
    let json = serde_json::to_string(&reports).unwrap();
    assert!(json.contains("\"seed\":5"));
}
