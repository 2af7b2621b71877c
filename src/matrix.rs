//! Dense row-major matrix.
//!
//! `Matrix` has value semantics: every algebraic operation returns a new, independently
//! owned matrix and leaves its operands untouched. The only in-place primitive is
//! [`Matrix::fill`].
//!
//! Shape-checked operations (`matmul`, `add`, `sub`, `mul_elementwise`) return
//! [`Error::DimensionMismatch`] instead of panicking.

use std::fmt;
use std::ops::{Index, IndexMut, Neg};

use crate::matmul::gemm_f64;
use crate::{Error, Result};

/// Elements with magnitude below this are zeroed by [`Matrix::clip`].
pub const CLIP_THRESHOLD: f64 = 1e-4;

/// Values at or above this are reported by [`Matrix::has_abnormal`].
pub const ABNORMAL_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    /// Row-major, `rows * cols` elements.
    data: Vec<f64>,
}

impl Matrix {
    /// Zero-filled matrix of shape `(rows, cols)`.
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows `usize`. Use [`Matrix::from_vec`] for a checked
    /// constructor.
    #[inline]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Build a matrix from a flat row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        let expected = rows
            .checked_mul(cols)
            .ok_or_else(|| Error::InvalidShape(format!("shape ({rows}, {cols}) overflows")))?;
        if data.len() != expected {
            return Err(Error::InvalidShape(format!(
                "buffer length {} does not match rows * cols ({rows} * {cols})",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Column vector of shape `(values.len(), 1)`.
    pub fn column(values: &[f64]) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values.to_vec(),
        }
    }

    /// Matrix of shape `(rows, cols)` with every element set to `value`.
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows `usize`.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        let Some(len) = rows.checked_mul(cols) else {
            panic!("matrix shape ({rows}, {cols}) overflows usize");
        };
        Self {
            rows,
            cols,
            data: vec![value; len],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major view of the elements.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    #[inline]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Element at `(row, col)`, or `None` when out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// Matrix product `self * rhs`.
    ///
    /// Requires `self.cols() == rhs.rows()`; the result has shape `(self.rows(), rhs.cols())`.
    pub fn matmul(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(Error::DimensionMismatch(format!(
                "matmul lhs {:?} has {} cols, rhs {:?} has {} rows",
                self.shape(),
                self.cols,
                rhs.shape(),
                rhs.rows
            )));
        }

        let mut out = Matrix::new(self.rows, rhs.cols);
        if out.is_empty() || self.cols == 0 {
            return Ok(out);
        }
        gemm_f64(
            self.rows,
            rhs.cols,
            self.cols,
            &self.data,
            &rhs.data,
            &mut out.data,
        );
        Ok(out)
    }

    /// Hadamard (element-wise) product.
    pub fn mul_elementwise(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "mul_elementwise", |a, b| a * b)
    }

    /// Element-wise square, `self ⊙ self`.
    pub fn square(&self) -> Matrix {
        self.map(|v| v * v)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "add", |a, b| a + b)
    }

    /// `self - rhs`, computed as `self + (-rhs)`.
    #[allow(clippy::should_implement_trait)]
    pub fn sub(&self, rhs: &Matrix) -> Result<Matrix> {
        self.add(&rhs.negate())
    }

    pub fn negate(&self) -> Matrix {
        self.map(|v| -v)
    }

    /// Multiply every element by `scalar`.
    pub fn scale(&self, scalar: f64) -> Matrix {
        self.map(|v| v * scalar)
    }

    pub fn transpose(&self) -> Matrix {
        let mut out = Matrix::new(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.data[c * self.rows + r] = self.data[r * self.cols + c];
            }
        }
        out
    }

    /// Apply `f` to every element.
    pub fn map<F>(&self, f: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Zero out elements whose magnitude is below [`CLIP_THRESHOLD`].
    ///
    /// Never applied implicitly; see `Mlp::with_gradient_clipping`.
    pub fn clip(&self) -> Matrix {
        self.map(|v| if v.abs() < CLIP_THRESHOLD { 0.0 } else { v })
    }

    /// Returns true if any element is NaN.
    pub fn has_nan(&self) -> bool {
        self.data.iter().any(|v| v.is_nan())
    }

    /// Returns true if any element is non-normal and nonzero (NaN, infinite, subnormal)
    /// or is at least [`ABNORMAL_THRESHOLD`].
    pub fn has_abnormal(&self) -> bool {
        self.data
            .iter()
            .any(|&v| (!v.is_normal() && v != 0.0) || v >= ABNORMAL_THRESHOLD)
    }

    /// Set every element to `value` in place.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Largest absolute element-wise difference between two same-shaped matrices.
    pub fn max_abs_diff(&self, rhs: &Matrix) -> Result<f64> {
        self.check_same_shape(rhs, "max_abs_diff")?;
        Ok(self
            .data
            .iter()
            .zip(&rhs.data)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max))
    }

    fn zip_with<F>(&self, rhs: &Matrix, op: &str, f: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.check_same_shape(rhs, op)?;
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&rhs.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    fn check_same_shape(&self, rhs: &Matrix, op: &str) -> Result<()> {
        if self.shape() != rhs.shape() {
            return Err(Error::DimensionMismatch(format!(
                "{op} lhs {:?} does not match rhs {:?}",
                self.shape(),
                rhs.shape()
            )));
        }
        Ok(())
    }
}

impl Neg for &Matrix {
    type Output = Matrix;

    fn neg(self) -> Matrix {
        self.negate()
    }
}

impl Neg for Matrix {
    type Output = Matrix;

    fn neg(mut self) -> Matrix {
        self.data.iter_mut().for_each(|v| *v = -*v);
        self
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    /// Panics if `(row, col)` is out of bounds.
    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for shape {:?}",
            self.shape()
        );
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for shape {:?}",
            self.shape()
        );
        &mut self.data[row * self.cols + col]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            let row = &self.data[r * self.cols..(r + 1) * self.cols];
            for (c, v) in row.iter().enumerate() {
                if c > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{v}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
