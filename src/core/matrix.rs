//! Integer matrix storage and the row operations used by reduction

use crate::core::error::{LatticeError, Result};

/// Matrix represented as a vector of vectors (row-major)
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<Vec<i64>>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Create a new matrix from 2D vector
    pub fn new(data: Vec<Vec<i64>>) -> Result<Self> {
        if data.is_empty() {
            return Err(LatticeError::invalid_parameters("Matrix cannot be empty"));
        }

        let rows = data.len();
        let cols = data[0].len();

        // Verify all rows have the same length
        for (i, row) in data.iter().enumerate() {
            if row.len() != cols {
                return Err(LatticeError::invalid_dimensions(
                    (rows, cols),
                    (i + 1, row.len()),
                ));
            }
        }

        Ok(Matrix { data, rows, cols })
    }

    /// Get the number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Get a reference to a specific element
    pub fn get(&self, row: usize, col: usize) -> Option<&i64> {
        self.data.get(row)?.get(col)
    }

    /// Set a specific element
    pub fn set(&mut self, row: usize, col: usize, value: i64) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(LatticeError::invalid_dimensions(
                (self.rows, self.cols),
                (row + 1, col + 1),
            ));
        }

        self.data[row][col] = value;
        Ok(())
    }

    /// Borrow a row
    pub fn row(&self, row: usize) -> &[i64] {
        &self.data[row]
    }

    /// Swap two rows
    pub fn swap_rows(&mut self, i: usize, j: usize) -> Result<()> {
        if i >= self.rows || j >= self.rows {
            return Err(LatticeError::invalid_dimensions(
                (self.rows, self.cols),
                (i.max(j) + 1, self.cols),
            ));
        }
        self.data.swap(i, j);
        Ok(())
    }

    /// b_target -= coefficient * b_source
    pub fn sub_scaled_row(&mut self, target: usize, source: usize, coefficient: i64) {
        if coefficient == 0 || target == source {
            return;
        }
        let (t, s) = if target < source {
            let (lo, hi) = self.data.split_at_mut(source);
            (&mut lo[target], &hi[0])
        } else {
            let (lo, hi) = self.data.split_at_mut(target);
            (&mut hi[0], &lo[source])
        };
        for (x, y) in t.iter_mut().zip(s.iter()) {
            *x -= coefficient * *y;
        }
    }

    /// Replace rows (i, j) by (a*b_i + b*b_j, c*b_i + d*b_j)
    pub fn combine_rows(&mut self, i: usize, j: usize, [a, b, c, d]: [i64; 4]) {
        for col in 0..self.cols {
            let x = self.data[i][col];
            let y = self.data[j][col];
            self.data[i][col] = a * x + b * y;
            self.data[j][col] = c * x + d * y;
        }
    }

    /// Move row `from` to position `to` (from >= to), shifting the rows in between down
    pub fn rotate_row_up(&mut self, from: usize, to: usize) {
        if from > to {
            self.data[to..=from].rotate_right(1);
        }
    }

    /// Convert to Vec<Vec<i64>>
    pub fn to_vec(&self) -> Vec<Vec<i64>> {
        self.data.clone()
    }

    /// Squared Euclidean norm of a row
    pub fn row_norm_squared(&self, row: usize) -> f64 {
        self.data[row].iter().map(|&x| (x as f64) * (x as f64)).sum()
    }
}

impl std::fmt::Display for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "[")?;
        for row in &self.data {
            writeln!(
                f,
                "[{}]",
                row.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(" ")
            )?;
        }
        write!(f, "]")
    }
}
