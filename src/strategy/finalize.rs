//! Goal detection results: the solution artifact and the outcome report

use crate::core::error::{LatticeError, Result};
use crate::lwe::instance::alpha_code;
use crate::lwe::{LweInstanceParams, PredictedParameters};
use crate::strategy::tracer::TraceReport;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Report of a solved trial
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttackOutcome {
    #[serde(flatten)]
    pub params: LweInstanceParams,
    pub predicted: PredictedParameters,
    /// Blocksize of the last tour run
    pub final_blocksize: usize,
    pub tours: usize,
    pub searches: usize,
    pub wall_seconds: f64,
    /// First basis row, the embedded error vector up to sign
    pub solution: Vec<i64>,
    pub artifact: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<TraceReport>,
}

/// `<dir>/NNN-AAA-solution.txt`
pub fn solution_path(dir: &Path, n: usize, alpha: f64) -> PathBuf {
    dir.join(format!("{:03}-{:03}-solution.txt", n, alpha_code(alpha)))
}

/// "(x0, x1, ...)"
pub fn format_solution(solution: &[i64]) -> String {
    let body = solution
        .iter()
        .map(|x| x.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("({})", body)
}

/// Write the solution artifact, creating `dir` if needed
pub fn write_solution(dir: &Path, n: usize, alpha: f64, solution: &[i64]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = solution_path(dir, n, alpha);
    std::fs::write(&path, format_solution(solution))?;
    log::debug!("wrote {}", path.display());
    Ok(path)
}

/// Error for a run that spent its whole schedule
pub fn exhausted(params: &LweInstanceParams, last_blocksize: usize, tours_run: usize) -> LatticeError {
    LatticeError::ScheduleExhausted {
        n: params.n,
        alpha: params.alpha,
        last_blocksize,
        tours_run,
    }
}
