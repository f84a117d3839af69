//! LWE instances: the Darmstadt challenge text format and a seeded generator

use crate::core::error::{LatticeError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Public parameters of an attack on one instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LweInstanceParams {
    pub n: usize,
    pub alpha: f64,
    pub q: i64,
    /// Samples used by the embedding
    pub m: usize,
}

/// An LWE instance: c = A s + e mod q, with A of size m_available x n
#[derive(Debug, Clone, PartialEq)]
pub struct LweInstance {
    pub n: usize,
    pub q: i64,
    pub alpha: f64,
    pub a: Vec<Vec<i64>>,
    pub c: Vec<i64>,
    /// Known only for generated instances
    pub secret: Option<Vec<i64>>,
}

impl LweInstance {
    /// Number of samples available
    pub fn samples(&self) -> usize {
        self.c.len()
    }

    /// Parameters for an attack using the first `m` samples
    pub fn params(&self, m: usize) -> Result<LweInstanceParams> {
        if m == 0 || m > self.samples() {
            return Err(LatticeError::invalid_parameters(format!(
                "Only m={} samples available, {} requested",
                self.samples(),
                m
            )));
        }
        Ok(LweInstanceParams {
            n: self.n,
            alpha: self.alpha,
            q: self.q,
            m,
        })
    }

    /// Standard deviation of the error, alpha * q
    pub fn sigma(&self) -> f64 {
        self.alpha * self.q as f64
    }

    fn validate(&self) -> Result<()> {
        if self.q < 2 {
            return Err(LatticeError::parse(format!("modulus q={} too small", self.q)));
        }
        if self.a.len() != self.c.len() {
            return Err(LatticeError::invalid_dimensions(
                (self.c.len(), self.n),
                (self.a.len(), self.n),
            ));
        }
        if let Some(row) = self.a.iter().find(|row| row.len() != self.n) {
            return Err(LatticeError::invalid_dimensions((self.c.len(), self.n), (self.a.len(), row.len())));
        }
        Ok(())
    }
}

/// Three-digit code of alpha used in challenge and solution file names
pub fn alpha_code(alpha: f64) -> u32 {
    (alpha * 1000.0).round() as u32
}

/// Where instances come from
pub trait InstanceSource: Send + Sync {
    fn load(&self, n: usize, alpha: f64, seed: u64) -> Result<LweInstance>;
}

/// Challenge files `NNN-AAA-challenge.txt` in a local directory
#[derive(Debug, Clone)]
pub struct ChallengeDirectory {
    dir: PathBuf,
}

impl ChallengeDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ChallengeDirectory { dir: dir.into() }
    }

    pub fn path_for(&self, n: usize, alpha: f64) -> PathBuf {
        self.dir
            .join(format!("{:03}-{:03}-challenge.txt", n, alpha_code(alpha)))
    }
}

impl InstanceSource for ChallengeDirectory {
    fn load(&self, n: usize, alpha: f64, _seed: u64) -> Result<LweInstance> {
        let path = self.path_for(n, alpha);
        if !path.exists() {
            return Err(LatticeError::instance_not_found(
                n,
                alpha,
                format!("{} does not exist", path.display()),
            ));
        }
        let instance = read_challenge(&path, alpha)?;
        if instance.n != n {
            return Err(LatticeError::instance_not_found(
                n,
                alpha,
                format!("{} holds an instance with n={}", path.display(), instance.n),
            ));
        }
        Ok(instance)
    }
}

/// Read a challenge file; `alpha` is used when the file has no alpha line
pub fn read_challenge(path: &Path, alpha: f64) -> Result<LweInstance> {
    let text = std::fs::read_to_string(path)?;
    parse_challenge(&text, alpha)
}

/// Parse the challenge text format:
///
/// ```text
/// n
/// m
/// q
/// [alpha]
/// [c_0 c_1 ... c_{m-1}]
/// [a_00 a_01 ... a_0(n-1)]
/// ...
/// ```
pub fn parse_challenge(text: &str, alpha: f64) -> Result<LweInstance> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let mut header = |name: &str| -> Result<i64> {
        let line = lines
            .next()
            .ok_or_else(|| LatticeError::parse(format!("missing {} line", name)))?;
        line.parse::<i64>()
            .map_err(|e| LatticeError::parse(format!("{} line '{}': {}", name, line, e)))
    };
    let n = header("n")?;
    let m = header("m")?;
    let q = header("q")?;
    if n <= 0 || m <= 0 {
        return Err(LatticeError::parse(format!("invalid sizes n={} m={}", n, m)));
    }

    let mut alpha = alpha;
    let mut next = lines.next().ok_or_else(|| LatticeError::parse("missing c vector"))?;
    if !next.starts_with('[') {
        alpha = next
            .parse::<f64>()
            .map_err(|e| LatticeError::parse(format!("alpha line '{}': {}", next, e)))?;
        next = lines.next().ok_or_else(|| LatticeError::parse("missing c vector"))?;
    }
    let c = parse_vector(next)?;
    let a = lines.map(parse_vector).collect::<Result<Vec<_>>>()?;

    let instance = LweInstance {
        n: n as usize,
        q,
        alpha,
        a,
        c,
        secret: None,
    };
    instance.validate()?;
    if instance.samples() != m as usize {
        return Err(LatticeError::parse(format!(
            "header announces m={} samples, file holds {}",
            m,
            instance.samples()
        )));
    }
    Ok(instance)
}

fn parse_vector(line: &str) -> Result<Vec<i64>> {
    let inner = line
        .strip_prefix('[')
        .and_then(|l| l.strip_suffix(']'))
        .ok_or_else(|| LatticeError::parse(format!("expected a bracketed vector, got '{}'", line)))?;
    inner
        .split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<i64>()
                .map_err(|e| LatticeError::parse(format!("entry '{}': {}", t, e)))
        })
        .collect()
}

/// Render an instance in the challenge text format
pub fn format_challenge(instance: &LweInstance) -> String {
    let join = |v: &[i64]| v.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(" ");
    let mut out = format!(
        "{}\n{}\n{}\n{}\n[{}]\n",
        instance.n,
        instance.samples(),
        instance.q,
        instance.alpha,
        join(&instance.c)
    );
    for row in &instance.a {
        out.push_str(&format!("[{}]\n", join(row)));
    }
    out
}

/// Seeded generator of challenge-shaped instances: q the smallest prime at
/// least n^2, m = n^2 samples, uniform secret, rounded Gaussian error of
/// standard deviation alpha * q.
#[derive(Debug, Clone, Default)]
pub struct SyntheticInstances {
    /// Override for the number of generated samples
    pub samples: Option<usize>,
}

impl SyntheticInstances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(&self, n: usize, alpha: f64, seed: u64) -> Result<LweInstance> {
        if n < 2 {
            return Err(LatticeError::invalid_parameters(format!("n={} too small", n)));
        }
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(LatticeError::invalid_parameters(format!("alpha={} out of range", alpha)));
        }
        let q = next_prime((n * n) as i64);
        let m = self.samples.unwrap_or(n * n);
        let sigma = alpha * q as f64;
        let normal = Normal::new(0.0, sigma)
            .map_err(|e| LatticeError::invalid_parameters(format!("error distribution: {}", e)))?;

        let mut rng = StdRng::seed_from_u64(seed ^ ((n as u64) << 32));
        let secret: Vec<i64> = (0..n).map(|_| rng.random_range(0..q)).collect();
        let mut a = Vec::with_capacity(m);
        let mut c = Vec::with_capacity(m);
        for _ in 0..m {
            let row: Vec<i64> = (0..n).map(|_| rng.random_range(0..q)).collect();
            let e = normal.sample(&mut rng).round() as i64;
            let dot = row
                .iter()
                .zip(secret.iter())
                .fold(0i64, |acc, (x, s)| (acc + x * s) % q);
            c.push((dot + e).rem_euclid(q));
            a.push(row);
        }

        Ok(LweInstance {
            n,
            q,
            alpha,
            a,
            c,
            secret: Some(secret),
        })
    }
}

impl InstanceSource for SyntheticInstances {
    fn load(&self, n: usize, alpha: f64, seed: u64) -> Result<LweInstance> {
        self.generate(n, alpha, seed)
    }
}

pub fn is_prime(x: i64) -> bool {
    if x < 2 {
        return false;
    }
    let mut d = 2;
    while d * d <= x {
        if x % d == 0 {
            return false;
        }
        d += 1;
    }
    true
}

/// Smallest prime >= x
pub fn next_prime(x: i64) -> i64 {
    let mut p = x.max(2);
    while !is_prime(p) {
        p += 1;
    }
    p
}
