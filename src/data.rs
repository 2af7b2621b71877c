//! Synthetic training data.
//!
//! The training loop pulls one `(input, target)` pair per step from a [`Sampler`].
//! Inputs and targets are column matrices sized for the network.

use std::f64::consts::PI;

use rand::seq::SliceRandom;

use crate::{Initializer, Matrix};

/// Source of single training samples.
pub trait Sampler {
    /// Width of the input column.
    fn input_dim(&self) -> usize;

    /// Width of the target column.
    fn target_dim(&self) -> usize;

    /// Draw the next `(input, target)` pair.
    fn sample(&mut self) -> (Matrix, Matrix);
}

/// `x = u * scale` with `u ~ U(0, 1)`, target `y = sin(x)^2`.
///
/// With the default scale of `PI` the inputs cover one full hump of `sin^2`, which stays in
/// `[0, 1]` and is therefore reachable by a sigmoid output.
#[derive(Debug, Clone)]
pub struct SineSquared {
    init: Initializer,
    scale: f64,
}

impl SineSquared {
    pub fn new(init: Initializer) -> Self {
        Self::with_scale(init, PI)
    }

    pub fn with_scale(init: Initializer, scale: f64) -> Self {
        Self { init, scale }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Initializer::new(seed))
    }

    /// The target function.
    #[inline]
    pub fn target_of(x: f64) -> f64 {
        let s = x.sin();
        s * s
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl Sampler for SineSquared {
    fn input_dim(&self) -> usize {
        1
    }

    fn target_dim(&self) -> usize {
        1
    }

    fn sample(&mut self) -> (Matrix, Matrix) {
        let x = self.init.uniform(1, 1).scale(self.scale);
        let y = x.map(Self::target_of);
        (x, y)
    }
}

/// Replays a fixed set of samples in order, cycling forever.
#[derive(Debug, Clone)]
pub struct Cycle {
    samples: Vec<(Matrix, Matrix)>,
    next: usize,
}

impl Cycle {
    /// Returns `None` if `samples` is empty.
    pub fn new(samples: Vec<(Matrix, Matrix)>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        Some(Self { samples, next: 0 })
    }

    /// Same samples, visited in a random order from `init`.
    pub fn shuffled(mut samples: Vec<(Matrix, Matrix)>, init: &mut Initializer) -> Option<Self> {
        samples.shuffle(init.rng_mut());
        Self::new(samples)
    }
}

impl Sampler for Cycle {
    fn input_dim(&self) -> usize {
        self.samples[0].0.rows()
    }

    fn target_dim(&self) -> usize {
        self.samples[0].1.rows()
    }

    fn sample(&mut self) -> (Matrix, Matrix) {
        let pair = self.samples[self.next].clone();
        self.next = (self.next + 1) % self.samples.len();
        pair
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_squared_samples_are_consistent() {
        let mut s = SineSquared::seeded(0);
        for _ in 0..200 {
            let (x, y) = s.sample();
            assert_eq!(x.shape(), (1, 1));
            assert_eq!(y.shape(), (1, 1));
            let xv = x[(0, 0)];
            assert!((0.0..PI).contains(&xv));
            assert_eq!(y[(0, 0)], xv.sin() * xv.sin());
            assert!((0.0..=1.0).contains(&y[(0, 0)]));
        }
    }

    #[test]
    fn cycle_replays_in_order() {
        let samples = vec![
            (Matrix::column(&[0.0]), Matrix::column(&[1.0])),
            (Matrix::column(&[1.0]), Matrix::column(&[0.0])),
        ];
        let mut c = Cycle::new(samples).unwrap();
        assert_eq!(c.sample().0[(0, 0)], 0.0);
        assert_eq!(c.sample().0[(0, 0)], 1.0);
        assert_eq!(c.sample().0[(0, 0)], 0.0);
        assert!(Cycle::new(Vec::new()).is_none());
    }

    #[test]
    fn shuffled_cycle_keeps_every_sample() {
        let samples: Vec<_> = (0..10)
            .map(|i| (Matrix::column(&[i as f64]), Matrix::column(&[0.0])))
            .collect();
        let mut init = Initializer::new(3);
        let mut c = Cycle::shuffled(samples, &mut init).unwrap();
        let mut seen: Vec<f64> = (0..10).map(|_| c.sample().0[(0, 0)]).collect();
        seen.sort_by(f64::total_cmp);
        assert_eq!(seen, (0..10).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn shuffled_cycle_order_follows_the_initializer() {
        let make = || -> Vec<_> {
            (0..16)
                .map(|i| (Matrix::column(&[i as f64]), Matrix::column(&[0.0])))
                .collect()
        };

        let mut expected: Vec<f64> = (0..16).map(|i| i as f64).collect();
        expected.shuffle(Initializer::new(9).rng_mut());

        let mut c = Cycle::shuffled(make(), &mut Initializer::new(9)).unwrap();
        let order: Vec<f64> = (0..16).map(|_| c.sample().0[(0, 0)]).collect();
        assert_eq!(order, expected);

        let mut again = Cycle::shuffled(make(), &mut Initializer::new(9)).unwrap();
        let repeat: Vec<f64> = (0..16).map(|_| again.sample().0[(0, 0)]).collect();
        assert_eq!(repeat, order);
    }
}
