//! Kannan embedding of an LWE instance into a q-ary lattice

use crate::core::error::{LatticeError, Result};
use crate::core::lattice::{ext_gcd, Lattice};
use crate::lwe::instance::LweInstance;

fn mod_inverse(a: i64, q: i64) -> Option<i64> {
    let (g, s, _) = ext_gcd(a.rem_euclid(q), q);
    if g == 1 {
        Some(s.rem_euclid(q))
    } else {
        None
    }
}

fn centered(x: i64, q: i64) -> i64 {
    let x = x.rem_euclid(q);
    if x > q / 2 {
        x - q
    } else {
        x
    }
}

/// Column-reduce the first `m` rows of A mod q until n of them form the
/// identity. Returns the reduced m x n matrix and the pivot rows.
fn hermite_columns(a: &[Vec<i64>], n: usize, q: i64) -> Result<(Vec<Vec<i64>>, Vec<usize>)> {
    let mut mat: Vec<Vec<i64>> = a
        .iter()
        .map(|row| row.iter().map(|x| x.rem_euclid(q)).collect())
        .collect();
    let mut pivots = Vec::with_capacity(n);
    let mut col = 0;

    for row in 0..mat.len() {
        if col == n {
            break;
        }
        let found = (col..n).find_map(|p| mod_inverse(mat[row][p], q).map(|inv| (p, inv)));
        let (p, inv) = match found {
            Some(x) => x,
            None => continue,
        };
        for r in mat.iter_mut() {
            r.swap(p, col);
            r[col] = r[col] * inv % q;
        }
        for k in 0..n {
            if k == col {
                continue;
            }
            let factor = mat[row][k];
            if factor == 0 {
                continue;
            }
            for r in mat.iter_mut() {
                r[k] = (r[k] - factor * r[col]).rem_euclid(q);
            }
        }
        pivots.push(row);
        col += 1;
    }

    if col < n {
        return Err(LatticeError::invalid_parameters(format!(
            "the {} samples contain no invertible {}x{} subsystem mod {}",
            mat.len(),
            n,
            n,
            q
        )));
    }
    Ok((mat, pivots))
}

/// Square basis of dimension m+1 for the Kannan embedding of the first `m`
/// samples: the q-ary lattice {x = A s mod q} in Hermite form plus the row
/// (c, 1). The error vector (e, 1) is a short vector of this lattice.
pub fn primal_lattice_basis(instance: &LweInstance, m: usize) -> Result<Lattice> {
    let n = instance.n;
    let q = instance.q;
    if m > instance.samples() {
        return Err(LatticeError::invalid_parameters(format!(
            "Only m={} samples available.",
            instance.samples()
        )));
    }
    if m <= n {
        return Err(LatticeError::invalid_parameters(format!(
            "embedding needs more samples than secret coordinates (m={}, n={})",
            m, n
        )));
    }

    let (mat, pivots) = hermite_columns(&instance.a[..m], n, q)?;
    let mut is_pivot = vec![false; m];
    for &p in &pivots {
        is_pivot[p] = true;
    }

    let d = m + 1;
    let mut data = Vec::with_capacity(d);
    for i in (0..m).filter(|&i| !is_pivot[i]) {
        let mut row = vec![0i64; d];
        row[i] = q;
        data.push(row);
    }
    for j in 0..n {
        let mut row: Vec<i64> = (0..m).map(|i| centered(mat[i][j], q)).collect();
        row.push(0);
        data.push(row);
    }
    let mut last: Vec<i64> = instance.c[..m].iter().map(|&x| centered(x, q)).collect();
    last.push(1);
    data.push(last);

    log::debug!("Kannan embedding: d={}, {} q-vectors, pivots {:?}", d, m - n, pivots);
    Lattice::from_matrix(data)
}
