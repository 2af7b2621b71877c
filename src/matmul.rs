//! GEMM kernel behind `Matrix::matmul`.
//!
//! - default: a plain triple loop
//! - optional: `matrixmultiply::dgemm` via the `matrixmultiply` feature

/// Computes `c = a * b` for row-major buffers.
///
/// Shapes: `a` is `(m, k)`, `b` is `(k, n)`, `c` is `(m, n)` and is overwritten.
/// Callers validate shapes and skip empty products.
#[inline]
pub(crate) fn gemm_f64(m: usize, n: usize, k: usize, a: &[f64], b: &[f64], c: &mut [f64]) {
    debug_assert!(m > 0 && n > 0 && k > 0);
    debug_assert_eq!(a.len(), m * k);
    debug_assert_eq!(b.len(), k * n);
    debug_assert_eq!(c.len(), m * n);

    #[cfg(feature = "matrixmultiply")]
    {
        // Row-major strides: (cols, 1).
        unsafe {
            matrixmultiply::dgemm(
                m,
                k,
                n,
                1.0,
                a.as_ptr(),
                k as isize,
                1,
                b.as_ptr(),
                n as isize,
                1,
                0.0,
                c.as_mut_ptr(),
                n as isize,
                1,
            );
        }
    }

    #[cfg(not(feature = "matrixmultiply"))]
    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0_f64;
            for p in 0..k {
                acc += a[i * k + p] * b[p * n + j];
            }
            c[i * n + j] = acc;
        }
    }
}
