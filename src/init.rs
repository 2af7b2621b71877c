//! Matrix initialization.
//!
//! An [`Initializer`] owns a single random generator for its whole lifetime. Create it once
//! (from a seed or from OS entropy) and pass it by `&mut` to whatever needs fresh matrices;
//! it is never reseeded per call.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;

use crate::{Error, Matrix, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Fill strategy for [`Initializer::init`].
pub enum Init {
    /// Independent draws from U(0, 1).
    Uniform,
    /// Zero-mean normal with standard deviation `1 / sqrt(rows * cols)`.
    #[default]
    Normal,
    Zeros,
    Ones,
}

#[derive(Debug, Clone)]
pub struct Initializer {
    rng: StdRng,
}

impl Initializer {
    /// Deterministic initializer.
    pub fn new(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    /// Initializer seeded once from OS entropy.
    pub fn from_entropy() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn from_rng(rng: StdRng) -> Self {
        Self { rng }
    }

    /// Access to the underlying generator, e.g. for sampling training data from the same
    /// stream.
    #[inline]
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Build a `(rows, cols)` matrix filled according to `strategy`.
    pub fn init(&mut self, strategy: Init, rows: usize, cols: usize) -> Result<Matrix> {
        match strategy {
            Init::Uniform => Ok(self.uniform(rows, cols)),
            Init::Normal => self.normal(rows, cols),
            Init::Zeros => Ok(self.zeros(rows, cols)),
            Init::Ones => Ok(self.ones(rows, cols)),
        }
    }

    /// Independent draws from U(0, 1).
    pub fn uniform(&mut self, rows: usize, cols: usize) -> Matrix {
        let dist = Uniform::new(0.0_f64, 1.0_f64);
        self.sample(rows, cols, &dist)
    }

    /// Zero-mean normal draws with standard deviation `1 / sqrt(rows * cols)`.
    ///
    /// The scale uses the element count of the matrix being filled, which coincides with
    /// `fan_in * fan_out` for weight matrices.
    pub fn normal(&mut self, rows: usize, cols: usize) -> Result<Matrix> {
        let numel = rows * cols;
        if numel == 0 {
            return Ok(Matrix::new(rows, cols));
        }
        let std_dev = 1.0 / (numel as f64).sqrt();
        let dist = Normal::new(0.0, std_dev).map_err(|e| {
            Error::InvalidShape(format!("normal std_dev {std_dev} for ({rows}, {cols}): {e}"))
        })?;
        Ok(self.sample(rows, cols, &dist))
    }

    #[inline]
    pub fn zeros(&self, rows: usize, cols: usize) -> Matrix {
        Matrix::new(rows, cols)
    }

    #[inline]
    pub fn ones(&self, rows: usize, cols: usize) -> Matrix {
        Matrix::filled(rows, cols, 1.0)
    }

    fn sample<D: Distribution<f64>>(&mut self, rows: usize, cols: usize, dist: &D) -> Matrix {
        let mut out = Matrix::new(rows, cols);
        for v in out.as_mut_slice() {
            *v = self.rng.sample(dist);
        }
        out
    }
}

impl Default for Initializer {
    fn default() -> Self {
        Self::from_entropy()
    }
}
