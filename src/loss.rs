//! Loss functions.
//!
//! The network does not compute a loss itself; the training loop calls these on the
//! output of `forward` to monitor progress.

use crate::{Error, Matrix, Result};

/// Sum of squared differences, `sum((target - pred)^2)`.
///
/// For a single-output network this is the per-sample squared error.
pub fn squared_error(pred: &Matrix, target: &Matrix) -> Result<f64> {
    check_shapes(pred, target)?;
    Ok(pred
        .as_slice()
        .iter()
        .zip(target.as_slice())
        .map(|(p, t)| (t - p) * (t - p))
        .sum())
}

/// Mean squared error, `mean((target - pred)^2)`.
///
/// Returns `0.0` for empty matrices.
pub fn mse(pred: &Matrix, target: &Matrix) -> Result<f64> {
    let sum = squared_error(pred, target)?;
    if pred.is_empty() {
        return Ok(0.0);
    }
    Ok(sum / pred.numel() as f64)
}

fn check_shapes(pred: &Matrix, target: &Matrix) -> Result<()> {
    if pred.shape() != target.shape() {
        return Err(Error::DimensionMismatch(format!(
            "pred shape {:?} does not match target shape {:?}",
            pred.shape(),
            target.shape()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_error_and_mse() {
        let pred = Matrix::column(&[0.5, 1.0]);
        let target = Matrix::column(&[1.0, 0.0]);
        assert!((squared_error(&pred, &target).unwrap() - 1.25).abs() < 1e-12);
        assert!((mse(&pred, &target).unwrap() - 0.625).abs() < 1e-12);
    }

    #[test]
    fn empty_mse_is_zero() {
        let e = Matrix::new(0, 1);
        assert_eq!(mse(&e, &e).unwrap(), 0.0);
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let err = mse(&Matrix::new(2, 1), &Matrix::new(1, 1)).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch(_)));
    }
}
