//! Sigmoid nonlinearity.
//!
//! Every layer computes `z = W x + b` and then `y = sigmoid(z)` element-wise.
//! The network caches the post-activation `y`, so backprop takes the derivative
//! from the cached output instead of keeping a separate `z` buffer.

/// Logistic sigmoid: `1 / (1 + exp(-x))`.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// Derivative of the sigmoid expressed in terms of its output `y = sigmoid(x)`.
#[inline]
pub fn sigmoid_grad_from_output(y: f64) -> f64 {
    y * (1.0 - y)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn sigmoid_basic_values() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(10.0) > 0.9999);
        assert!(sigmoid(-10.0) < 0.0001);
        assert!((sigmoid(2.0) - 1.0 / (1.0 + (-2.0_f64).exp())).abs() < 1e-15);
    }

    #[test]
    fn sigmoid_stays_in_open_unit_interval() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let v: f64 = rng.gen_range(-30.0..30.0);
            let y = sigmoid(v);
            assert!(y > 0.0 && y < 1.0, "sigmoid({v}) = {y}");
        }
    }

    #[test]
    fn grad_from_output_matches_closed_form() {
        for v in [-3.0, -0.5, 0.0, 0.25, 4.0] {
            let s = sigmoid(v);
            assert_eq!(sigmoid_grad_from_output(s), s * (1.0 - s));
        }
        assert!((sigmoid_grad_from_output(sigmoid(0.0)) - 0.25).abs() < 1e-12);
    }
}
