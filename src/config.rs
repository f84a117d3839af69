//! Attack configuration

use crate::core::error::{LatticeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Number of dimensions a jumping tour gets for free at a given blocksize
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Dim4FreeFun {
    /// floor(11.5 + 0.075 * blocksize)
    #[default]
    Default,
    /// Asymptotic estimate floor(b * ln(4/3) / ln(b / (2 pi e)))
    Ducas18,
    /// floor(intercept + slope * blocksize)
    Linear { intercept: f64, slope: f64 },
}

impl Dim4FreeFun {
    /// Free dimensions for `blocksize`, never negative
    pub fn free_dims(&self, blocksize: usize) -> usize {
        let b = blocksize as f64;
        let f = match *self {
            Dim4FreeFun::Default => 11.5 + 0.075 * b,
            Dim4FreeFun::Ducas18 => {
                let denom = (b / (2.0 * std::f64::consts::PI * std::f64::consts::E)).ln();
                if denom > 0.0 {
                    b * (4.0f64 / 3.0).ln() / denom
                } else {
                    0.0
                }
            }
            Dim4FreeFun::Linear { intercept, slope } => intercept + slope * b,
        };
        if f.is_finite() && f > 0.0 {
            f.floor() as usize
        } else {
            0
        }
    }
}

impl FromStr for Dim4FreeFun {
    type Err = LatticeError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s {
            "default" | "default_dim4free_fun" => return Ok(Dim4FreeFun::Default),
            "ducas18" | "theo_dim4free_fun1" => return Ok(Dim4FreeFun::Ducas18),
            _ => {}
        }
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() == 3 && parts[0] == "linear" {
            let intercept = parts[1]
                .parse::<f64>()
                .map_err(|e| LatticeError::parse(format!("dim4free intercept '{}': {}", parts[1], e)))?;
            let slope = parts[2]
                .parse::<f64>()
                .map_err(|e| LatticeError::parse(format!("dim4free slope '{}': {}", parts[2], e)))?;
            return Ok(Dim4FreeFun::Linear { intercept, slope });
        }
        Err(LatticeError::invalid_parameters(format!(
            "unknown dim4free function '{}' (expected default, ducas18 or linear:A:B)",
            s
        )))
    }
}

impl fmt::Display for Dim4FreeFun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim4FreeFun::Default => write!(f, "default"),
            Dim4FreeFun::Ducas18 => write!(f, "ducas18"),
            Dim4FreeFun::Linear { intercept, slope } => write!(f, "linear:{}:{}", intercept, slope),
        }
    }
}

/// Everything one attack run reads. Built once per trial and never mutated
/// by the driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackParams {
    /// Noise rate of the instance
    pub alpha: f64,
    /// Fixed sample count; the estimator's choice when `None`
    pub samples: Option<usize>,
    /// Margin on the target norm
    pub goal_margin: f64,
    /// Search budget as a multiple of the last reduction time; 0 disables searches
    pub svp_bkz_time_factor: f64,
    /// Explicit blocksize range "low:high:inc"
    pub blocksizes: Option<String>,
    /// Tours per blocksize
    pub tours: usize,
    pub jump: usize,
    /// Lift this many indices before each jumping-tour window
    pub extra_dim4free: usize,
    /// Blocksizes below this use the enumeration tour
    pub enum_crossover: usize,
    pub dim4free_fun: Dim4FreeFun,
    /// Skip statistics collection
    pub dummy_tracer: bool,
    pub verbose: bool,
    /// Engine thread count, divides the search cost
    pub threads: usize,
    pub lookahead_steps: usize,
    /// Extra search dimensions granted once a search is triggered
    pub search_dim_margin: usize,
    pub cost_exponent: f64,
    pub cost_dim_offset: f64,
    /// Where solutions are written
    pub solution_dir: PathBuf,
}

impl Default for AttackParams {
    fn default() -> Self {
        AttackParams {
            alpha: 0.005,
            samples: None,
            goal_margin: 1.5,
            svp_bkz_time_factor: 1.0,
            blocksizes: None,
            tours: 1,
            jump: 1,
            extra_dim4free: 12,
            enum_crossover: 51,
            dim4free_fun: Dim4FreeFun::Default,
            dummy_tracer: true,
            verbose: true,
            threads: 1,
            lookahead_steps: 2,
            search_dim_margin: 1,
            cost_exponent: 0.292,
            cost_dim_offset: 64.0,
            solution_dir: PathBuf::from("lwechallenge"),
        }
    }
}

impl AttackParams {
    /// Load parameters from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let params: AttackParams = serde_json::from_str(&text)?;
        params.validate()?;
        Ok(params)
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(LatticeError::invalid_parameters(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if !(self.goal_margin > 0.0) || !self.goal_margin.is_finite() {
            return Err(LatticeError::invalid_parameters(format!(
                "goal_margin must be positive, got {}",
                self.goal_margin
            )));
        }
        if !(self.svp_bkz_time_factor >= 0.0) || !self.svp_bkz_time_factor.is_finite() {
            return Err(LatticeError::invalid_parameters(format!(
                "svp_bkz_time_factor must be non-negative, got {}",
                self.svp_bkz_time_factor
            )));
        }
        if self.tours == 0 {
            return Err(LatticeError::invalid_parameters("tours must be at least 1"));
        }
        if self.jump == 0 {
            return Err(LatticeError::invalid_parameters("jump must be at least 1"));
        }
        if self.threads == 0 {
            return Err(LatticeError::invalid_parameters("threads must be at least 1"));
        }
        if !(self.cost_exponent > 0.0) || !self.cost_exponent.is_finite() {
            return Err(LatticeError::invalid_parameters(format!(
                "cost_exponent must be positive, got {}",
                self.cost_exponent
            )));
        }
        if let Some(m) = self.samples {
            if m == 0 {
                return Err(LatticeError::invalid_parameters("samples must be positive"));
            }
        }
        Ok(())
    }
}
