//! Command-line interface for the adaptive primal attack

use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

use lwe_primal::{
    run_all, Attack, AttackParams, ChallengeDirectory, Dim4FreeFun, GsaEstimator, InstanceSource, ReferenceEngine,
    SyntheticInstances, TrialPlan, TrialReport,
};

/// Primal attack on LWE challenge instances with adaptive BKZ/search scheduling
#[derive(Parser, Debug)]
#[clap(name = "lwe-primal")]
#[clap(version)]
struct Args {
    /// Secret dimension n (lower bound when a range is given)
    lower_bound: usize,

    /// Exclusive upper bound on n
    #[clap(long)]
    upper_bound: Option<usize>,

    /// Increment of n between lower and upper bound
    #[clap(long, default_value = "1")]
    step_size: usize,

    /// Trials per n
    #[clap(long, default_value = "1")]
    trials: usize,

    /// Parallel trials
    #[clap(long, default_value = "1")]
    workers: usize,

    /// Seed of the first trial
    #[clap(long, default_value = "0")]
    seed: u64,

    /// Directory holding NNN-AAA-challenge.txt files
    #[clap(long, default_value = "lwechallenge")]
    challenge_dir: PathBuf,

    /// Generate instances instead of reading challenge files
    #[clap(long)]
    synthetic: bool,

    /// Load attack parameters from a JSON file; attack flags are then ignored
    #[clap(long)]
    params: Option<PathBuf>,

    /// Set logging level (error, warn, info, debug, trace)
    #[clap(long, default_value = "info")]
    log_level: String,

    /// Output format
    #[clap(long, value_enum, default_value = "plain")]
    format: OutputFormat,

    #[clap(flatten)]
    attack: AttackArgs,
}

/// Attack parameters; unset flags keep their defaults
#[derive(clap::Args, Debug)]
struct AttackArgs {
    /// Noise rate
    #[clap(long)]
    alpha: Option<f64>,

    /// Fixed number of samples m
    #[clap(long)]
    samples: Option<usize>,

    /// Margin on the target norm
    #[clap(long)]
    goal_margin: Option<f64>,

    /// Search budget as a multiple of the reduction time (0 disables searches)
    #[clap(long)]
    svp_bkz_time_factor: Option<f64>,

    /// Explicit blocksizes "high", "low:high" or "low:high:inc"
    #[clap(long)]
    blocksizes: Option<String>,

    /// Tours per blocksize
    #[clap(long)]
    tours: Option<usize>,

    #[clap(long)]
    jump: Option<usize>,

    #[clap(long)]
    extra_dim4free: Option<usize>,

    /// Blocksizes below this use enumeration tours
    #[clap(long)]
    enum_crossover: Option<usize>,

    /// default, ducas18 or linear:A:B
    #[clap(long)]
    dim4free_fun: Option<Dim4FreeFun>,

    /// Skip statistics collection
    #[clap(long, action = ArgAction::Set)]
    dummy_tracer: Option<bool>,

    /// Per-tour progress lines
    #[clap(long, action = ArgAction::Set)]
    verbose: Option<bool>,

    /// Engine threads, divides the search cost
    #[clap(long)]
    threads: Option<usize>,

    #[clap(long)]
    lookahead_steps: Option<usize>,

    #[clap(long)]
    search_dim_margin: Option<usize>,

    #[clap(long)]
    cost_exponent: Option<f64>,

    #[clap(long)]
    cost_dim_offset: Option<f64>,

    /// Where solutions are written
    #[clap(long)]
    solution_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Plain,
    Json,
}

impl AttackArgs {
    fn apply(&self, mut params: AttackParams) -> AttackParams {
        macro_rules! set {
            ($($field:ident),*) => {
                $(if let Some(v) = &self.$field {
                    params.$field = v.clone();
                })*
            };
        }
        set!(
            alpha,
            goal_margin,
            svp_bkz_time_factor,
            tours,
            jump,
            extra_dim4free,
            enum_crossover,
            dim4free_fun,
            dummy_tracer,
            verbose,
            threads,
            lookahead_steps,
            search_dim_margin,
            cost_exponent,
            cost_dim_offset,
            solution_dir
        );
        if self.samples.is_some() {
            params.samples = self.samples;
        }
        if self.blocksizes.is_some() {
            params.blocksizes = self.blocksizes.clone();
        }
        params
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_logging(&args)?;

    let params = match &args.params {
        Some(path) => {
            log::info!("Loading parameters from {}", path.display());
            AttackParams::from_json_file(path)?
        }
        None => args.attack.apply(AttackParams::default()),
    };
    params.validate()?;
    log::debug!("{:?}", params);

    let source: Box<dyn InstanceSource> = if args.synthetic {
        Box::new(SyntheticInstances::new())
    } else {
        Box::new(ChallengeDirectory::new(&args.challenge_dir))
    };
    let estimator = GsaEstimator::new(params.cost_exponent);

    let plan = TrialPlan {
        lower_bound: args.lower_bound,
        upper_bound: args.upper_bound,
        step_size: args.step_size,
        trials: args.trials,
        seed: args.seed,
    };

    let attack = Attack::new(&params, source.as_ref(), &estimator);
    let reports = run_all(&plan, args.workers, |n, seed| {
        attack.run(&mut ReferenceEngine::new(), n, seed)
    })?;

    println!("{}", format_reports(&reports, args.format)?);

    if !reports.iter().any(TrialReport::is_success) {
        return Err("no trial found a solution".into());
    }
    Ok(())
}

fn setup_logging(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    use env_logger::Builder;
    use log::LevelFilter;

    let level_filter = match args.log_level.as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        other => return Err(format!("unknown log level '{}'", other).into()),
    };

    let mut builder = Builder::from_default_env();
    builder.filter_level(level_filter);
    builder.try_init()?;

    Ok(())
}

fn format_reports(reports: &[TrialReport], format: OutputFormat) -> Result<String, Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Plain => {
            let mut output = String::new();
            for report in reports {
                match &report.result {
                    Ok(outcome) => output.push_str(&format!(
                        "n={} seed={}: solved (m={}, bkz-{}, {} tours, {} searches, {:.2} sec) -> {}\n",
                        report.n,
                        report.seed,
                        outcome.params.m,
                        outcome.final_blocksize,
                        outcome.tours,
                        outcome.searches,
                        outcome.wall_seconds,
                        outcome.artifact.display()
                    )),
                    Err(failure) => output.push_str(&format!(
                        "n={} seed={}: {:?}: {}\n",
                        report.n, report.seed, failure.kind, failure.message
                    )),
                }
            }
            Ok(output.trim_end().to_string())
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(reports)?),
    }
}
