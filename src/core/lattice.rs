//! Integer lattice bases with a cached floating-point Gram-Schmidt decomposition

use crate::core::error::{LatticeError, Result};
use crate::core::matrix::Matrix;
use crate::core::profile::BasisProfile;

/// A lattice represented by its basis matrix (rows are basis vectors) plus
/// the Gram-Schmidt data the reduction routines work on.
///
/// `mu[i][j]` for j < i are the projection coefficients, `r[i]` the squared
/// Gram-Schmidt lengths. Both are kept in sync with `basis` by every
/// operation in this crate; `update_gso` recomputes them from scratch.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    pub(crate) basis: Matrix,
    pub(crate) mu: Vec<Vec<f64>>,
    pub(crate) r: Vec<f64>,
}

impl Lattice {
    /// Create a new lattice from a basis matrix
    pub fn new(basis: Matrix) -> Result<Self> {
        let rows = basis.rows();
        let cols = basis.cols();
        if rows == 0 || cols == 0 {
            return Err(LatticeError::invalid_parameters("Basis matrix cannot be empty"));
        }
        if rows > cols {
            return Err(LatticeError::invalid_dimensions((cols, cols), (rows, cols)));
        }

        let mut lattice = Lattice {
            basis,
            mu: vec![vec![0.0; rows]; rows],
            r: vec![0.0; rows],
        };
        lattice.update_gso()?;
        Ok(lattice)
    }

    /// Create a lattice from a 2D vector representation
    pub fn from_matrix(data: Vec<Vec<i64>>) -> Result<Self> {
        Lattice::new(Matrix::new(data)?)
    }

    /// Number of basis vectors
    pub fn rank(&self) -> usize {
        self.basis.rows()
    }

    /// Dimension of the ambient space
    pub fn ambient_dimension(&self) -> usize {
        self.basis.cols()
    }

    pub fn basis(&self) -> &Matrix {
        &self.basis
    }

    /// Squared Gram-Schmidt length of b*_i
    pub fn r(&self, i: usize) -> f64 {
        self.r[i]
    }

    pub fn mu(&self, i: usize, j: usize) -> f64 {
        self.mu[i][j]
    }

    /// Snapshot of the current basis profile
    pub fn profile(&self) -> Result<BasisProfile> {
        BasisProfile::new(self.r.clone())
    }

    /// Recompute mu and r from the integer basis (Cholesky-style, from inner products)
    pub fn update_gso(&mut self) -> Result<()> {
        let n = self.rank();
        for i in 0..n {
            for j in 0..i {
                let mut s = dot_i64(self.basis.row(i), self.basis.row(j));
                for k in 0..j {
                    s -= self.mu[j][k] * self.mu[i][k] * self.r[k];
                }
                self.mu[i][j] = s / self.r[j];
            }
            let mut s = dot_i64(self.basis.row(i), self.basis.row(i));
            for k in 0..i {
                s -= self.mu[i][k] * self.mu[i][k] * self.r[k];
            }
            if !(s > 0.0) || !s.is_finite() {
                return Err(LatticeError::numerical_instability(format!(
                    "Gram-Schmidt length r[{}] = {} (dependent basis?)",
                    i, s
                )));
            }
            self.r[i] = s;
            self.mu[i][i] = 1.0;
        }
        Ok(())
    }

    /// Replace the vectors at `start..start+coefficients.len()` by a unimodular
    /// transform whose first vector is sum_i coefficients[i] * b_{start+i}.
    ///
    /// The coefficient vector must be non-zero. When it is not primitive the
    /// inserted vector is the primitive one along the same direction. The
    /// Gram-Schmidt data is recomputed afterwards.
    pub fn insert_combination(&mut self, start: usize, coefficients: &[i64]) -> Result<()> {
        let end = start + coefficients.len();
        if end > self.rank() {
            return Err(LatticeError::invalid_dimensions(
                (self.rank(), self.ambient_dimension()),
                (end, self.ambient_dimension()),
            ));
        }

        let mut nonzero = coefficients
            .iter()
            .enumerate()
            .filter(|(_, &x)| x != 0)
            .map(|(i, &x)| (start + i, x))
            .rev();
        let (mut acc, mut g) = nonzero
            .next()
            .ok_or_else(|| LatticeError::invalid_parameters("cannot insert the zero vector"))?;

        // Fold each row into the accumulator with a 2x2 unimodular transform:
        // x_i b_i + g b_acc = h * (new b_i) where h = gcd(x_i, g).
        for (i, x) in nonzero {
            let (h, s, t) = ext_gcd(x, g);
            self.basis.combine_rows(i, acc, [x / h, g / h, -t, s]);
            acc = i;
            g = h;
        }
        if g < 0 {
            for col in 0..self.ambient_dimension() {
                let v = self.basis.row(acc)[col];
                self.basis.set(acc, col, -v)?;
            }
        }

        self.basis.rotate_row_up(acc, start);
        self.update_gso()
    }

    /// First basis vector
    pub fn first_row(&self) -> Vec<i64> {
        self.basis.row(0).to_vec()
    }
}

impl std::fmt::Display for Lattice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.basis)
    }
}

fn dot_i64(a: &[i64], b: &[i64]) -> f64 {
    a.iter().zip(b.iter()).map(|(&x, &y)| (x as f64) * (y as f64)).sum()
}

/// Extended Euclid: returns (g, s, t) with s*a + t*b = g > 0
pub(crate) fn ext_gcd(a: i64, b: i64) -> (i64, i64, i64) {
    let (mut old_r, mut r) = (a, b);
    let (mut old_s, mut s) = (1i64, 0i64);
    let (mut old_t, mut t) = (0i64, 1i64);
    while r != 0 {
        let q = old_r / r;
        (old_r, r) = (r, old_r - q * r);
        (old_s, s) = (s, old_s - q * s);
        (old_t, t) = (t, old_t - q * t);
    }
    if old_r < 0 {
        (-old_r, -old_s, -old_t)
    } else {
        (old_r, old_s, old_t)
    }
}
