//! SVP (Shortest Vector Problem) search: Schnorr-Euchner enumeration over a
//! projected block, and windowed search with dimensions for free.

use crate::core::error::{LatticeError, Result};
use crate::core::lattice::Lattice;
use crate::core::types::AlgorithmParams;

/// Parameters for SVP solver
#[derive(Debug, Clone)]
pub struct SVPSolverParams {
    /// Abort an enumeration after visiting this many nodes
    pub max_nodes: u64,
    /// Number of short candidates kept for lifting
    pub max_candidates: usize,
    /// Block SVP succeeds only below radius_factor * r[start]
    pub radius_factor: f64,
    /// Algorithm parameters
    pub algorithm_params: AlgorithmParams,
}

impl Default for SVPSolverParams {
    fn default() -> Self {
        SVPSolverParams {
            max_nodes: 20_000_000,
            max_candidates: 64,
            radius_factor: 0.99,
            algorithm_params: AlgorithmParams::default(),
        }
    }
}

impl SVPSolverParams {
    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_nodes == 0 {
            return Err(LatticeError::invalid_parameters("max_nodes must be positive"));
        }
        if self.max_candidates == 0 {
            return Err(LatticeError::invalid_parameters("max_candidates must be positive"));
        }
        if !(self.radius_factor > 0.0 && self.radius_factor <= 1.0) {
            return Err(LatticeError::invalid_parameters(format!(
                "Radius factor must be in (0, 1], got {}",
                self.radius_factor
            )));
        }
        Ok(())
    }
}

/// A coefficient vector over a block together with its projected squared length
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub coefficients: Vec<i64>,
    pub norm_squared: f64,
}

/// Result of enumerating one projected block
#[derive(Debug, Clone)]
pub struct EnumerationResult {
    /// Shortest vectors found, best last
    pub candidates: Vec<Candidate>,
    /// Number of nodes visited
    pub nodes: u64,
    /// Whether the node budget cut the enumeration short
    pub truncated: bool,
}

impl EnumerationResult {
    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.last()
    }
}

/// Result of a windowed search
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSearchResult {
    /// Projected squared length at the lift index of the best lifted vector
    pub best_projected: f64,
    /// Index at which a vector was inserted, if any
    pub inserted_at: Option<usize>,
    /// The lifted vector reached the goal length
    pub reached_goal: bool,
    pub nodes: u64,
}

/// SVP solver implementation
#[derive(Debug, Clone, Default)]
pub struct SVPSolver {
    params: SVPSolverParams,
}

struct EnumState<'a> {
    lattice: &'a Lattice,
    start: usize,
    coeffs: Vec<i64>,
    radius_sq: f64,
    candidates: Vec<Candidate>,
    max_candidates: usize,
    nodes: u64,
    max_nodes: u64,
}

impl SVPSolver {
    /// Create new SVP solver with default parameters
    pub fn new() -> Self {
        Self::with_params(SVPSolverParams::default())
    }

    /// Create new SVP solver with custom parameters
    pub fn with_params(params: SVPSolverParams) -> Self {
        SVPSolver { params }
    }

    pub fn params(&self) -> &SVPSolverParams {
        &self.params
    }

    /// Enumerate non-zero vectors of the projected sublattice
    /// pi_start(b_start, ..., b_{end-1}) shorter than `radius_sq`.
    pub fn enumerate(&self, lattice: &Lattice, start: usize, end: usize, radius_sq: f64) -> Result<EnumerationResult> {
        self.params.validate()?;
        if start >= end || end > lattice.rank() {
            return Err(LatticeError::invalid_parameters(format!(
                "enumeration block {}..{} invalid for rank {}",
                start,
                end,
                lattice.rank()
            )));
        }

        let n = end - start;
        let mut state = EnumState {
            lattice,
            start,
            coeffs: vec![0; n],
            radius_sq,
            candidates: Vec::new(),
            max_candidates: self.params.max_candidates,
            nodes: 0,
            max_nodes: self.params.max_nodes,
        };
        state.descend(n - 1, 0.0, true);

        let truncated = state.nodes >= state.max_nodes;
        if truncated {
            log::debug!("enumeration {}..{} hit the node budget ({})", start, end, state.max_nodes);
        }
        Ok(EnumerationResult {
            candidates: state.candidates,
            nodes: state.nodes,
            truncated,
        })
    }

    /// Block SVP for a BKZ step: find a vector of pi_start(block) shorter than
    /// radius_factor * r[start] and insert it at `start`.
    pub fn improve_block(&self, lattice: &mut Lattice, start: usize, end: usize) -> Result<(bool, u64)> {
        let radius = self.params.radius_factor * lattice.r(start);
        let result = self.enumerate(lattice, start, end, radius)?;
        match result.best() {
            Some(best) => {
                let coefficients = best.coefficients.clone();
                lattice.insert_combination(start, &coefficients)?;
                Ok((true, result.nodes))
            }
            None => Ok((false, result.nodes)),
        }
    }

    /// Search the window `llb..llb+window`, enumerating only its last
    /// `window - free` vectors and lifting the candidates by nearest-plane
    /// rounding down to `lift_to` (<= llb) and to index 0.
    ///
    /// A candidate whose full lift beats r[0] is inserted at 0; otherwise the
    /// best lift beating r[lift_to] is inserted at `lift_to`.
    pub fn search_window(
        &self,
        lattice: &mut Lattice,
        llb: usize,
        window: usize,
        free: usize,
        lift_to: usize,
        goal: f64,
    ) -> Result<WindowSearchResult> {
        let end = llb + window;
        if end > lattice.rank() || lift_to > llb || free + 2 > window {
            return Err(LatticeError::invalid_parameters(format!(
                "search window llb={} len={} free={} lift_to={} invalid for rank {}",
                llb,
                window,
                free,
                lift_to,
                lattice.rank()
            )));
        }
        let start = llb + free;
        // include b_start itself, whose lift may already be useful
        let radius = lattice.r(start) * (1.0 + 1e-9);
        let result = self.enumerate(lattice, start, end, radius)?;

        let mut best_local: Option<(Vec<i64>, f64)> = None;
        let mut best_full: Option<(Vec<i64>, f64)> = None;
        for candidate in result.candidates.iter() {
            let (full, norms) = babai_lift(lattice, start, &candidate.coefficients, candidate.norm_squared);
            // norms[j] = projected length at index j, for j in 0..=start
            let local = norms[lift_to];
            if best_local.as_ref().map_or(true, |(_, n)| local < *n) {
                best_local = Some((full[lift_to..].to_vec(), local));
            }
            if best_full.as_ref().map_or(true, |(_, n)| norms[0] < *n) {
                best_full = Some((full.clone(), norms[0]));
            }
        }

        let mut outcome = WindowSearchResult {
            best_projected: f64::INFINITY,
            inserted_at: None,
            reached_goal: false,
            nodes: result.nodes,
        };

        if let Some((coeffs, norm)) = best_full {
            if norm > 0.5 && norm < lattice.r(0) * (1.0 - 1e-9) && coeffs.iter().any(|&x| x != 0) {
                lattice.insert_combination(0, &coeffs[..end])?;
                outcome.inserted_at = Some(0);
            }
        }
        if let Some((coeffs, norm)) = best_local {
            outcome.best_projected = norm;
            outcome.reached_goal = norm <= goal;
            if outcome.inserted_at.is_none() && norm < lattice.r(lift_to) * (1.0 - 1e-9) {
                lattice.insert_combination(lift_to, &coeffs[..end - lift_to])?;
                outcome.inserted_at = Some(lift_to);
            }
        }
        Ok(outcome)
    }
}

impl<'a> EnumState<'a> {
    /// Visit level `i` (local index) given the partial squared length of the
    /// levels above it. `top` is true while every coefficient above is zero,
    /// which fixes the sign of the last non-zero coefficient.
    fn descend(&mut self, i: usize, above: f64, top: bool) {
        if self.nodes >= self.max_nodes {
            return;
        }
        let n = self.coeffs.len();
        let k = self.start + i;
        let r_k = self.lattice.r(k);

        let mut center = 0.0;
        for j in i + 1..n {
            center -= self.coeffs[j] as f64 * self.lattice.mu(self.start + j, k);
        }
        let x0 = center.round();
        let dir = if center >= x0 { 1.0 } else { -1.0 };

        let mut t = 0i64;
        loop {
            let options: [Option<f64>; 2] = if t == 0 {
                [Some(x0), None]
            } else if top {
                [Some(x0 + t as f64), None]
            } else {
                [Some(x0 + dir * t as f64), Some(x0 - dir * t as f64)]
            };

            let mut any_inside = false;
            for x in options.into_iter().flatten() {
                let diff = x - center;
                let partial = above + diff * diff * r_k;
                if partial >= self.radius_sq {
                    continue;
                }
                any_inside = true;
                self.nodes += 1;
                self.coeffs[i] = x as i64;
                let still_zero = top && x == 0.0;
                if i == 0 {
                    if !still_zero && partial > 0.0 {
                        self.record(partial);
                    }
                } else {
                    self.descend(i - 1, partial, still_zero);
                }
                if self.nodes >= self.max_nodes {
                    self.coeffs[i] = 0;
                    return;
                }
            }
            self.coeffs[i] = 0;
            if !any_inside {
                break;
            }
            t += 1;
        }
    }

    fn record(&mut self, norm_squared: f64) {
        self.candidates.push(Candidate {
            coefficients: self.coeffs.clone(),
            norm_squared,
        });
        if self.candidates.len() > self.max_candidates {
            self.candidates.remove(0);
        }
        self.radius_sq = norm_squared;
    }
}

/// Extend a coefficient vector over `start..start+len` to `0..start+len` by
/// nearest-plane rounding. Returns the full coefficient vector and the
/// projected squared length at every index 0..=start.
pub fn babai_lift(lattice: &Lattice, start: usize, coefficients: &[i64], norm_at_start: f64) -> (Vec<i64>, Vec<f64>) {
    let end = start + coefficients.len();
    let mut full = vec![0i64; end];
    full[start..].copy_from_slice(coefficients);
    let mut norms = vec![0.0; start + 1];
    norms[start] = norm_at_start;

    for j in (0..start).rev() {
        let mut y = 0.0;
        for i in j + 1..end {
            if full[i] != 0 {
                y += full[i] as f64 * lattice.mu(i, j);
            }
        }
        let x = (-y).round();
        full[j] = x as i64;
        let residual = x + y;
        norms[j] = norms[j + 1] + residual * residual * lattice.r(j);
    }
    (full, norms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lll::LLLReducer;

    fn skewed_lattice() -> Lattice {
        Lattice::from_matrix(vec![
            vec![31, 0, 0, 0, 0],
            vec![17, 1, 0, 0, 0],
            vec![5, 0, 1, 0, 0],
            vec![29, 0, 0, 1, 0],
            vec![11, 0, 0, 0, 1],
        ])
        .unwrap()
    }

    #[test]
    fn test_svp_params_validation() {
        assert!(SVPSolverParams::default().validate().is_ok());
        let mut params = SVPSolverParams::default();
        params.radius_factor = 1.5;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_enumeration_finds_shortest_vector() {
        let mut lattice = skewed_lattice();
        LLLReducer::new().reduce(&mut lattice).unwrap();
        let solver = SVPSolver::new();
        let result = solver.enumerate(&lattice, 0, 5, lattice.r(0) * 1.0001).unwrap();
        let best = result.best().unwrap();

        // brute force: the first coordinate is fixed mod 31 by the others
        let mut shortest = f64::INFINITY;
        for b in -4i64..=4 {
            for c in -4i64..=4 {
                for d in -4i64..=4 {
                    for e in -4i64..=4 {
                        if b == 0 && c == 0 && d == 0 && e == 0 {
                            continue;
                        }
                        let first = (17 * b + 5 * c + 29 * d + 11 * e).rem_euclid(31);
                        let first = first.min(31 - first);
                        let n = (first * first + b * b + c * c + d * d + e * e) as f64;
                        shortest = shortest.min(n);
                    }
                }
            }
        }
        assert!((best.norm_squared - shortest).abs() < 1e-6);
        assert!(!result.truncated);
    }

    #[test]
    fn test_improve_block_inserts_shorter_vector() {
        let mut lattice = skewed_lattice();
        let before = lattice.r(0);
        let (improved, nodes) = SVPSolver::new().improve_block(&mut lattice, 0, 5).unwrap();
        assert!(improved);
        assert!(nodes > 0);
        assert!(lattice.r(0) < before);
    }

    #[test]
    fn test_babai_lift_matches_full_norm() {
        let mut lattice = skewed_lattice();
        LLLReducer::new().reduce(&mut lattice).unwrap();
        let coeffs = vec![1, -1];
        // projected length at index 3 of b_3 - b_4
        let mut proj = 0.0;
        let x = [1.0, -1.0];
        for (jj, j) in (3..5).enumerate() {
            let mut s = x[jj];
            for (ii, i) in (3..5).enumerate() {
                if i > j {
                    s += x[ii] * lattice.mu(i, j);
                }
            }
            proj += s * s * lattice.r(j);
        }
        let (full, norms) = babai_lift(&lattice, 3, &coeffs, proj);
        let basis = lattice.basis().to_vec();
        let mut v = vec![0i64; 5];
        for (k, row) in basis.iter().enumerate() {
            for col in 0..5 {
                v[col] += full[k] * row[col];
            }
        }
        let n: f64 = v.iter().map(|&t| (t * t) as f64).sum();
        assert!((norms[0] - n).abs() < 1e-6);
        assert!(norms.windows(2).all(|w| w[0] >= w[1] - 1e-9));
    }

    #[test]
    fn test_node_budget_truncates() {
        let lattice = skewed_lattice();
        let mut params = SVPSolverParams::default();
        params.max_nodes = 3;
        let result = SVPSolver::with_params(params).enumerate(&lattice, 0, 5, 1e9).unwrap();
        assert!(result.truncated);
        assert!(result.nodes <= 3);
    }

    #[test]
    fn test_search_window_rejects_bad_geometry() {
        let mut lattice = skewed_lattice();
        let solver = SVPSolver::new();
        assert!(solver.search_window(&mut lattice, 2, 4, 0, 0, 1.0).is_err());
        assert!(solver.search_window(&mut lattice, 0, 5, 4, 0, 1.0).is_err());
    }
}
