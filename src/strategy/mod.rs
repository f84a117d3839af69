//! Adaptive scheduling of reduction tours and searches

pub mod context;
pub mod cost;
pub mod driver;
pub mod finalize;
pub mod forecast;
pub mod lookahead;
pub mod schedule;
pub mod tracer;

pub use context::{Clock, ManualClock, MonotonicClock, RunContext, TimingTable};
pub use cost::{CostModel, COST_DIM_OFFSET, COST_EXPONENT};
pub use driver::{search_window, target_norm, Attack, AttackSetup, DriverState, Progress};
pub use finalize::{solution_path, write_solution, AttackOutcome};
pub use forecast::Forecaster;
pub use lookahead::{look_ahead, reduction_pays_off, LookaheadDecision, LookaheadStep};
pub use schedule::{BlocksizeSchedule, ScheduleCursor};
pub use tracer::{TraceReport, Tracer};
