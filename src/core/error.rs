//! Core error types for the primal attack

use serde::Serialize;
use thiserror::Error;

/// Error types for instance loading, basis reduction and scheduling
#[derive(Debug, Clone, Error)]
pub enum LatticeError {
    /// The estimator found no viable (blocksize, search dimension) pair
    #[error("No winning parameters for n={n}, alpha={alpha:.4}, q={q}")]
    InfeasibleParameters { n: usize, alpha: f64, q: i64 },

    /// Every scheduled blocksize and tour was spent without reaching the goal
    #[error(
        "No solution found for n={n}, alpha={alpha:.4}: schedule exhausted at blocksize {last_blocksize} \
         after {tours_run} tours (try more or larger blocksizes)"
    )]
    ScheduleExhausted {
        n: usize,
        alpha: f64,
        last_blocksize: usize,
        tours_run: usize,
    },

    /// The success-dimension scan ran off the end of the lattice
    #[error("Degenerate basis profile: no search dimension below {full_dim} reaches target norm {target_norm:.3}")]
    DegenerateProfile { full_dim: usize, target_norm: f64 },

    /// No instance file or generator for the requested parameters
    #[error("LWE instance n={n}, alpha={alpha:.4} not found: {reason}")]
    InstanceNotFound { n: usize, alpha: f64, reason: String },

    /// Invalid matrix dimensions
    #[error("Invalid dimensions: expected {expected:?}, found {found:?}")]
    InvalidDimensions {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Numerical instability detected
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    /// Malformed input text
    #[error("Parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Coarse classification reported by failed trials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InfeasibleParameters,
    ScheduleExhausted,
    DegenerateProfile,
    InstanceNotFound,
    InvalidInput,
    Numerical,
    Io,
}

impl From<std::io::Error> for LatticeError {
    fn from(e: std::io::Error) -> Self {
        LatticeError::io_error(format!("I/O Error: {}", e))
    }
}

impl From<serde_json::Error> for LatticeError {
    fn from(e: serde_json::Error) -> Self {
        LatticeError::parse(format!("JSON: {}", e))
    }
}

/// Result type for lattice operations
pub type Result<T> = std::result::Result<T, LatticeError>;

impl LatticeError {
    /// Create an invalid dimensions error
    pub fn invalid_dimensions(expected: (usize, usize), found: (usize, usize)) -> Self {
        LatticeError::InvalidDimensions { expected, found }
    }

    /// Create an invalid parameters error
    pub fn invalid_parameters(msg: impl Into<String>) -> Self {
        LatticeError::InvalidParameters(msg.into())
    }

    /// Create a numerical instability error
    pub fn numerical_instability(msg: impl Into<String>) -> Self {
        LatticeError::NumericalInstability(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        LatticeError::Parse(msg.into())
    }

    /// Create an I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        LatticeError::IoError(msg.into())
    }

    pub fn instance_not_found(n: usize, alpha: f64, reason: impl Into<String>) -> Self {
        LatticeError::InstanceNotFound {
            n,
            alpha,
            reason: reason.into(),
        }
    }

    /// Which kind of failure this is, for trial reports
    pub fn kind(&self) -> ErrorKind {
        match self {
            LatticeError::InfeasibleParameters { .. } => ErrorKind::InfeasibleParameters,
            LatticeError::ScheduleExhausted { .. } => ErrorKind::ScheduleExhausted,
            LatticeError::DegenerateProfile { .. } => ErrorKind::DegenerateProfile,
            LatticeError::InstanceNotFound { .. } => ErrorKind::InstanceNotFound,
            LatticeError::InvalidDimensions { .. }
            | LatticeError::InvalidParameters(_)
            | LatticeError::Parse(_) => ErrorKind::InvalidInput,
            LatticeError::NumericalInstability(_) => ErrorKind::Numerical,
            LatticeError::IoError(_) => ErrorKind::Io,
        }
    }
}
